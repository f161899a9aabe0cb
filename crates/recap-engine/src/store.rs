use crate::body::decode_request_body;
use crate::redaction::DecisionCache;
use recap_common::{Identity, Observation, Record, RecordBody, RecordType};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

/// Merged records of one session, keyed by identity, remembered in the
/// order each identity was first seen.
#[derive(Debug, Default)]
pub struct SessionStore {
    records: HashMap<Identity, Record>,
    order: Vec<Identity>,
    decisions: DecisionCache,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `incoming` into the record stored under `identity` and returns
    /// the merged result.
    ///
    /// Only network records ever merge. A field is copied from `incoming`
    /// only when the stored record has no value for it, so the first phase
    /// to report a field keeps it.
    pub fn merge(&mut self, identity: Identity, mut incoming: Observation) -> Record {
        let merged = match self.records.get(&identity) {
            Some(stored)
                if stored.record_type() == RecordType::Network
                    && incoming.record_type() == RecordType::Network =>
            {
                let mut fields = stored.observation.to_map();
                fill_absent(&mut fields, incoming.to_map());
                let (mut observation, untyped) = Observation::lift_as(RecordType::Network, fields);
                if !untyped.is_empty() {
                    warn!(%identity, fields = ?untyped, "Merged fields kept untyped");
                }
                decode_body(&mut observation);
                Record::new(identity.clone(), observation)
            }
            _ => {
                decode_body(&mut incoming);
                Record::new(identity.clone(), incoming)
            }
        };
        self.replace(merged.clone());
        merged
    }

    /// Stores `record` under its identity, keeping its first-seen position.
    pub fn replace(&mut self, record: Record) {
        let identity = record.identity().clone();
        if self.records.insert(identity.clone(), record).is_none() {
            self.order.push(identity);
        }
    }

    pub fn get(&self, identity: &Identity) -> Option<&Record> {
        self.records.get(identity)
    }

    /// Records in first-seen order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.order.iter().filter_map(|identity| self.records.get(identity))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn decisions_mut(&mut self) -> &mut DecisionCache {
        &mut self.decisions
    }
}

fn fill_absent(stored: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        if value.is_null() {
            continue;
        }
        match stored.get(&key) {
            Some(existing) if !existing.is_null() => {}
            _ => {
                stored.insert(key, value);
            }
        }
    }
}

fn decode_body(observation: &mut Observation) {
    if let RecordBody::Network(network) = &mut observation.body
        && let Some(body) = network.request_body.as_mut()
    {
        decode_request_body(body);
    }
}
