//! Typed view over the loosely-shaped observations capture producers emit.
//!
//! Producers send untyped JSON objects tagged with a `recordType`. Lifting
//! moves the fields each variant knows about into typed slots and keeps
//! everything else, including known fields whose shape does not fit their
//! slot, in the variant's `extra` map. Rendering back with
//! [`Observation::to_map`] emits typed slots first and then the extras, so
//! a lift/render cycle never loses a field.

use crate::error::RecordError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::fmt;

/// An untyped, partially populated record as delivered by a producer.
pub type RawRecord = Map<String, Value>;

pub const RECORD_TYPE_KEY: &str = "recordType";

/// Scope that owns a set of records, typically one monitored browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for SessionId {
    fn from(tab_id: u64) -> Self {
        Self(tab_id.to_string())
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Tab ids arrive as numbers, other scopes as strings.
impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Number(n) => n.into(),
            Repr::Text(s) => s.into(),
        })
    }
}

/// Key under which partial observations of one logical record are merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    Local,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Network,
    Console,
    Event,
    Storage(StorageArea),
    Cookie,
}

impl RecordType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "network" => Some(Self::Network),
            "console" => Some(Self::Console),
            "events" | "event" => Some(Self::Event),
            "local-storage" | "storage" => Some(Self::Storage(StorageArea::Local)),
            "session-storage" => Some(Self::Storage(StorageArea::Session)),
            "cookies" | "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Console => "console",
            Self::Event => "events",
            Self::Storage(StorageArea::Local) => "local-storage",
            Self::Storage(StorageArea::Session) => "session-storage",
            Self::Cookie => "cookies",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Consumes a field map, lifting well-shaped entries into typed slots and
/// remembering the keys whose shape did not fit.
struct Fields {
    map: Map<String, Value>,
    misfits: Vec<String>,
}

impl Fields {
    fn new(map: Map<String, Value>) -> Self {
        Self {
            map,
            misfits: Vec::new(),
        }
    }

    /// Null counts as absent; a value the lift rejects stays in the map.
    fn take<T>(&mut self, key: &str, lift: impl FnOnce(Value) -> Result<T, Value>) -> Option<T> {
        let value = self.map.shift_remove(key)?;
        if value.is_null() {
            return None;
        }
        match lift(value) {
            Ok(typed) => Some(typed),
            Err(original) => {
                self.misfits.push(key.to_string());
                self.map.insert(key.to_string(), original);
                None
            }
        }
    }

    fn take_nested<T>(&mut self, key: &str, lift: impl FnOnce(&mut Fields) -> T) -> Option<T> {
        match self.map.shift_remove(key)? {
            Value::Null => None,
            Value::Object(inner) => {
                let mut nested = Fields::new(inner);
                let typed = lift(&mut nested);
                self.misfits
                    .extend(nested.misfits.into_iter().map(|m| format!("{key}.{m}")));
                Some(typed)
            }
            other => {
                self.misfits.push(key.to_string());
                self.map.insert(key.to_string(), other);
                None
            }
        }
    }

    fn rest(&mut self) -> Map<String, Value> {
        std::mem::take(&mut self.map)
    }
}

fn as_string(value: Value) -> Result<String, Value> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(other),
    }
}

fn as_number(value: Value) -> Result<Number, Value> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(other),
    }
}

fn as_array(value: Value) -> Result<Vec<Value>, Value> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(other),
    }
}

fn as_status(value: Value) -> Result<u16, Value> {
    match value.as_u64().and_then(|n| u16::try_from(n).ok()) {
        Some(status) => Ok(status),
        None => Err(value),
    }
}

fn any(value: Value) -> Result<Value, Value> {
    Ok(value)
}

fn put(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value);
    }
}

fn put_str(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    put(map, key, value.clone().map(Value::String));
}

fn append_extra(map: &mut Map<String, Value>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        map.insert(key.clone(), value.clone());
    }
}

/// Raw request payload bytes, either as byte values or already as text.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkBytes {
    Octets(Vec<u8>),
    Text(String),
}

impl ChunkBytes {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Array(items) => items
                .iter()
                .map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Self::Octets),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Octets(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawChunk {
    pub bytes: Option<ChunkBytes>,
    pub extra: Map<String, Value>,
}

impl RawChunk {
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let bytes = match object.get("bytes") {
            None | Some(Value::Null) => None,
            Some(bytes) => Some(ChunkBytes::from_value(bytes)?),
        };
        let extra = object
            .iter()
            .filter(|(key, _)| key.as_str() != "bytes")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Some(Self { bytes, extra })
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        put(&mut map, "bytes", self.bytes.as_ref().map(ChunkBytes::to_value));
        append_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

fn as_chunks(value: Value) -> Result<Vec<RawChunk>, Value> {
    let chunks = match &value {
        Value::Array(items) => items.iter().map(RawChunk::from_value).collect::<Option<Vec<_>>>(),
        _ => None,
    };
    chunks.ok_or(value)
}

/// Request payload as reported by request-start observation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestBody {
    pub raw: Option<Vec<RawChunk>>,
    /// `Some(Value::Null)` records that there was nothing to decode.
    pub parsed: Option<Value>,
    /// Decoded text of a body that was not JSON.
    pub text: Option<String>,
    pub extra: Map<String, Value>,
}

impl RequestBody {
    fn lift(fields: &mut Fields) -> Self {
        let parsed = fields.map.shift_remove("parsed");
        Self {
            raw: fields.take("raw", as_chunks),
            parsed,
            text: fields.take("text", as_string),
            extra: fields.rest(),
        }
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        put(
            &mut map,
            "raw",
            self.raw
                .as_ref()
                .map(|chunks| Value::Array(chunks.iter().map(RawChunk::to_value).collect())),
        );
        put(&mut map, "parsed", self.parsed.clone());
        put_str(&mut map, "text", &self.text);
        append_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetworkPayload {
    pub url: Option<String>,
    pub method: Option<String>,
    pub request_headers: Option<Value>,
    pub response_headers: Option<Value>,
    pub request_body: Option<RequestBody>,
    pub response_body: Option<Value>,
    pub status: Option<u16>,
    pub extra: Map<String, Value>,
}

impl NetworkPayload {
    fn lift(fields: &mut Fields) -> Self {
        Self {
            url: fields.take("url", as_string),
            method: fields.take("method", as_string),
            request_headers: fields.take("requestHeaders", any),
            response_headers: fields.take("responseHeaders", any),
            request_body: fields.take_nested("requestBody", RequestBody::lift),
            response_body: fields.take("responseBody", any),
            status: fields.take("status", as_status),
            extra: fields.rest(),
        }
    }

    fn write_into(&self, map: &mut Map<String, Value>) {
        put_str(map, "url", &self.url);
        put_str(map, "method", &self.method);
        put(map, "requestHeaders", self.request_headers.clone());
        put(map, "responseHeaders", self.response_headers.clone());
        put(map, "requestBody", self.request_body.as_ref().map(RequestBody::to_value));
        put(map, "responseBody", self.response_body.clone());
        put(map, "status", self.status.map(Value::from));
        append_extra(map, &self.extra);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StackTrace {
    /// Caller location, e.g. `at handler (app.js:10:5)`.
    pub parsed: Option<String>,
    pub raw: Option<String>,
    pub extra: Map<String, Value>,
}

impl StackTrace {
    fn lift(fields: &mut Fields) -> Self {
        Self {
            parsed: fields.take("parsed", as_string),
            raw: fields.take("raw", as_string),
            extra: fields.rest(),
        }
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        put_str(&mut map, "parsed", &self.parsed);
        put_str(&mut map, "raw", &self.raw);
        append_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConsolePayload {
    pub method: Option<String>,
    pub args: Option<Vec<Value>>,
    pub stack_trace: Option<StackTrace>,
    pub page_url: Option<String>,
    pub extra: Map<String, Value>,
}

impl ConsolePayload {
    fn lift(fields: &mut Fields) -> Self {
        Self {
            method: fields.take("method", as_string),
            args: fields.take("args", as_array),
            stack_trace: fields.take_nested("stackTrace", StackTrace::lift),
            page_url: fields.take("pageUrl", as_string),
            extra: fields.rest(),
        }
    }

    fn write_into(&self, map: &mut Map<String, Value>) {
        put_str(map, "method", &self.method);
        put(map, "args", self.args.clone().map(Value::Array));
        put(map, "stackTrace", self.stack_trace.as_ref().map(StackTrace::to_value));
        put_str(map, "pageUrl", &self.page_url);
        append_extra(map, &self.extra);
    }
}

/// Free-form description of a UI interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventPayload {
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotItem {
    pub key: String,
    pub value: Value,
}

impl SnapshotItem {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(pair) => {
                if pair.keys().any(|k| k != "key" && k != "value") {
                    return None;
                }
                let key = pair.get("key")?.as_str()?;
                let value = pair.get("value").cloned().unwrap_or(Value::Null);
                Some(Self::new(key, value))
            }
            Value::Array(pair) => match pair.as_slice() {
                [Value::String(key), value] => Some(Self::new(key.as_str(), value.clone())),
                _ => None,
            },
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("key".to_string(), Value::String(self.key.clone()));
        map.insert("value".to_string(), self.value.clone());
        Value::Object(map)
    }
}

/// Accepts `[{key, value}]`, `[[key, value]]` or a plain `{key: value}` map.
fn as_items(value: Value) -> Result<Vec<SnapshotItem>, Value> {
    let items = match &value {
        Value::Array(items) => items
            .iter()
            .map(SnapshotItem::from_value)
            .collect::<Option<Vec<_>>>(),
        Value::Object(map) => Some(
            map.iter()
                .map(|(key, value)| SnapshotItem::new(key.as_str(), value.clone()))
                .collect(),
        ),
        _ => None,
    };
    items.ok_or(value)
}

fn items_to_value(items: &[SnapshotItem]) -> Value {
    Value::Array(items.iter().map(SnapshotItem::to_value).collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoragePayload {
    pub area: StorageArea,
    pub items: Option<Vec<SnapshotItem>>,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CookiePayload {
    pub items: Option<Vec<SnapshotItem>>,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordBody {
    Network(NetworkPayload),
    Console(ConsolePayload),
    Event(EventPayload),
    Storage(StoragePayload),
    Cookie(CookiePayload),
}

impl RecordBody {
    fn lift(record_type: RecordType, fields: &mut Fields) -> Self {
        match record_type {
            RecordType::Network => Self::Network(NetworkPayload::lift(fields)),
            RecordType::Console => Self::Console(ConsolePayload::lift(fields)),
            RecordType::Event => Self::Event(EventPayload {
                extra: fields.rest(),
            }),
            RecordType::Storage(area) => Self::Storage(StoragePayload {
                area,
                items: fields.take("items", as_items),
                extra: fields.rest(),
            }),
            RecordType::Cookie => Self::Cookie(CookiePayload {
                items: fields.take("items", as_items),
                extra: fields.rest(),
            }),
        }
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            Self::Network(_) => RecordType::Network,
            Self::Console(_) => RecordType::Console,
            Self::Event(_) => RecordType::Event,
            Self::Storage(storage) => RecordType::Storage(storage.area),
            Self::Cookie(_) => RecordType::Cookie,
        }
    }

    fn write_into(&self, map: &mut Map<String, Value>) {
        match self {
            Self::Network(network) => network.write_into(map),
            Self::Console(console) => console.write_into(map),
            Self::Event(event) => append_extra(map, &event.extra),
            Self::Storage(storage) => {
                put(map, "items", storage.items.as_deref().map(items_to_value));
                append_extra(map, &storage.extra);
            }
            Self::Cookie(cookie) => {
                put(map, "items", cookie.items.as_deref().map(items_to_value));
                append_extra(map, &cookie.extra);
            }
        }
    }
}

/// One partial observation of a record, before or after merging.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Producer context that emitted it (`client`, `background`, ...).
    pub source: Option<String>,
    /// Capture time in milliseconds, kept as the producer wrote it.
    pub timestamp: Option<Number>,
    pub body: RecordBody,
}

impl Observation {
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(raw) => Self::from_raw(raw),
            _ => Err(RecordError::NotAnObject),
        }
    }

    pub fn from_raw(mut raw: RawRecord) -> Result<Self, RecordError> {
        let record_type = match raw.shift_remove(RECORD_TYPE_KEY) {
            Some(Value::String(tag)) => {
                RecordType::from_tag(&tag).ok_or(RecordError::UnknownRecordType(tag))?
            }
            Some(Value::Null) | None => return Err(RecordError::MissingRecordType),
            Some(other) => return Err(RecordError::InvalidRecordType(other.to_string())),
        };
        Ok(Self::lift_as(record_type, raw).0)
    }

    /// Lifts `fields` as a `record_type` record, returning the keys that had
    /// to stay untyped. A `recordType` entry in `fields` is ignored.
    pub fn lift_as(record_type: RecordType, fields: Map<String, Value>) -> (Self, Vec<String>) {
        let mut fields = Fields::new(fields);
        fields.map.shift_remove(RECORD_TYPE_KEY);
        let source = fields.take("source", as_string);
        let timestamp = fields.take("timestamp", as_number);
        let body = RecordBody::lift(record_type, &mut fields);
        (
            Self {
                source,
                timestamp,
                body,
            },
            fields.misfits,
        )
    }

    pub fn record_type(&self) -> RecordType {
        self.body.record_type()
    }

    /// Resource URL of a network observation.
    pub fn url(&self) -> Option<&str> {
        match &self.body {
            RecordBody::Network(network) => network.url.as_deref(),
            _ => None,
        }
    }

    /// Caller location of a console observation.
    pub fn stack_location(&self) -> Option<&str> {
        match &self.body {
            RecordBody::Console(console) => console.stack_trace.as_ref()?.parsed.as_deref(),
            _ => None,
        }
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            RECORD_TYPE_KEY.to_string(),
            Value::String(self.record_type().as_tag().to_string()),
        );
        put_str(&mut map, "source", &self.source);
        put(&mut map, "timestamp", self.timestamp.clone().map(Value::Number));
        self.body.write_into(&mut map);
        map
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}

impl Serialize for Observation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Observation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRecord::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

/// A merged record stored under its identity.
///
/// The identity is deliberately absent from the rendered form: for network
/// records it is the raw request URL, which may itself carry secrets.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    identity: Identity,
    pub observation: Observation,
}

impl Record {
    pub fn new(identity: Identity, observation: Observation) -> Self {
        Self {
            identity,
            observation,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn record_type(&self) -> RecordType {
        self.observation.record_type()
    }

    pub fn to_value(&self) -> Value {
        self.observation.to_value()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.observation.serialize(serializer)
    }
}
