use crate::config::RecapConfig;
use crate::error::{DropReason, PipelineError};
use crate::filter::DropFilter;
use crate::identity;
use crate::lifecycle::LifecycleManager;
use crate::patterns::{PatternError, PatternLibrary};
use crate::redaction::{KeywordPolicy, RedactionEngine, Redactor};
use crate::state::PipelineState;
use recap_common::{Identity, Observation, RecordEnvelope, SessionId};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub type IngestOutcome = Result<Identity, DropReason>;

/// Single entry point for producers: filter, resolve, merge, sanitize and
/// store, in that order, under the session's lock.
#[derive(Clone)]
pub struct Pipeline {
    state: Arc<PipelineState>,
    filter: DropFilter,
    redaction: RedactionEngine,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(DropFilter::default(), RedactionEngine::default())
    }
}

impl Pipeline {
    pub fn new(filter: DropFilter, redaction: RedactionEngine) -> Self {
        Self {
            state: Arc::new(PipelineState::new()),
            filter,
            redaction,
        }
    }

    pub fn from_config(config: &RecapConfig) -> Result<Self, PipelineError> {
        let mut patterns = PatternLibrary::builtin();
        for key in &config.redaction.sensitive_keys {
            patterns.register_key(key)?;
        }
        for custom in &config.redaction.patterns {
            patterns.register(&custom.pattern, custom.group)?;
        }

        let redactor = Redactor::new(patterns)
            .with_marker(config.redaction.marker.clone())
            .with_max_depth(config.redaction.max_depth);
        let policy = KeywordPolicy::new(config.environment.non_production_markers.iter());
        let filter = DropFilter::new(config.filter.blocklist.iter().cloned());

        Ok(Self::new(filter, RedactionEngine::new(redactor, policy)))
    }

    pub fn redaction(&self) -> &RedactionEngine {
        &self.redaction
    }

    pub fn lifecycle(&self) -> LifecycleManager {
        LifecycleManager::new(Arc::clone(&self.state))
    }

    /// Adds a value pattern for sanitizations from now on.
    pub fn register_pattern(&self, pattern: &str, group: Option<usize>) -> Result<(), PatternError> {
        self.redaction.redactor().register_pattern(pattern, group)
    }

    /// Ingests one raw record. On success returns the identity it was
    /// stored under.
    pub fn ingest(&self, session: Option<&SessionId>, raw: Value, context_url: &str) -> IngestOutcome {
        let outcome = self.try_ingest(session, raw, context_url);
        if let Err(reason) = &outcome {
            match reason {
                DropReason::DroppedByFilter { entry } => {
                    debug!(entry = %entry, "Dropped self-observed record");
                }
                other => warn!(reason = %other, "Dropped record"),
            }
        }
        outcome
    }

    fn try_ingest(&self, session: Option<&SessionId>, raw: Value, context_url: &str) -> IngestOutcome {
        let session = session.ok_or(DropReason::MissingScope)?;
        let observation = Observation::from_value(raw)?;
        if let Some(entry) = self.filter.matched_entry(&observation) {
            return Err(DropReason::DroppedByFilter {
                entry: entry.to_string(),
            });
        }
        let identity = identity::resolve(&observation)?;

        self.state.with_session(session, |store| {
            let merged = store.merge(identity.clone(), observation);
            let sanitized = self.redaction.sanitize(&merged, context_url, store.decisions_mut());
            store.replace(sanitized);
        });
        Ok(identity)
    }

    /// Ingests a producer batch. A JSON array yields one outcome per element;
    /// anything else is treated as a single record.
    pub fn ingest_batch(&self, session: Option<&SessionId>, batch: Value, context_url: &str) -> Vec<IngestOutcome> {
        match batch {
            Value::Array(records) => records
                .into_iter()
                .map(|raw| self.ingest(session, raw, context_url))
                .collect(),
            single => vec![self.ingest(session, single, context_url)],
        }
    }

    pub fn ingest_envelope(&self, envelope: RecordEnvelope) -> Vec<IngestOutcome> {
        let context_url = envelope.context_url.unwrap_or_default();
        self.ingest_batch(envelope.tab_id.as_ref(), envelope.record, &context_url)
    }
}
