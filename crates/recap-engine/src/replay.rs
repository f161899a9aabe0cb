//! Replays captured envelopes, one JSON document per line, through a
//! pipeline.

use crate::ingest::Pipeline;
use recap_common::RecordEnvelope;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub ingested: usize,
    pub dropped: usize,
    /// Lines or envelopes that could not be read at all.
    pub malformed: usize,
}

/// Feeds every envelope in `content` to `pipeline`.
///
/// Each non-blank line that does not start with `#` holds either one
/// envelope or a JSON array of envelopes. Unreadable lines are counted and
/// skipped.
pub fn replay(pipeline: &Pipeline, content: &str) -> ReplaySummary {
    let mut summary = ReplaySummary::default();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = index + 1;

        let document: Value = match serde_json::from_str(line) {
            Ok(document) => document,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping line that is not JSON");
                summary.malformed += 1;
                continue;
            }
        };
        let documents = match document {
            Value::Array(items) => items,
            single => vec![single],
        };

        for document in documents {
            let envelope: RecordEnvelope = match serde_json::from_value(document) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(line = line_no, error = %e, "Skipping malformed envelope");
                    summary.malformed += 1;
                    continue;
                }
            };
            for outcome in pipeline.ingest_envelope(envelope) {
                match outcome {
                    Ok(_) => summary.ingested += 1,
                    Err(_) => summary.dropped += 1,
                }
            }
        }
    }

    summary
}
