use crate::record::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unit a transport hands to the pipeline: a record (or a producer batch of
/// records) together with the scope it belongs to and the page it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEnvelope {
    #[serde(default, alias = "sessionId", skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<SessionId>,
    /// URL the redaction policy is evaluated against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_url: Option<String>,
    #[serde(alias = "payload")]
    pub record: Value,
}

impl RecordEnvelope {
    pub fn new(tab_id: impl Into<SessionId>, context_url: impl Into<String>, record: Value) -> Self {
        Self {
            tab_id: Some(tab_id.into()),
            context_url: Some(context_url.into()),
            record,
        }
    }
}
