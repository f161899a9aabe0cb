pub mod cache;
pub mod policy;
pub mod redactor;

pub use cache::DecisionCache;
pub use policy::{EnvironmentPolicy, KeywordPolicy};
pub use redactor::{DEFAULT_MARKER, DEFAULT_MAX_DEPTH, Redactor};

use recap_common::record::RECORD_TYPE_KEY;
use recap_common::{Observation, Record};
use std::sync::Arc;
use tracing::warn;

/// Applies the environment policy and the redactor to whole records.
#[derive(Clone)]
pub struct RedactionEngine {
    redactor: Arc<Redactor>,
    policy: Arc<dyn EnvironmentPolicy>,
}

impl Default for RedactionEngine {
    fn default() -> Self {
        Self::new(Redactor::default(), KeywordPolicy::default())
    }
}

impl RedactionEngine {
    pub fn new(redactor: Redactor, policy: impl EnvironmentPolicy + 'static) -> Self {
        Self {
            redactor: Arc::new(redactor),
            policy: Arc::new(policy),
        }
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn policy(&self) -> &dyn EnvironmentPolicy {
        self.policy.as_ref()
    }

    /// Returns a sanitized copy of `record`.
    ///
    /// Whether redaction applies at all is decided on first sight of the
    /// record's identity and remembered in `decisions`; later calls reuse
    /// that answer whatever `context_url` they pass.
    pub fn sanitize(
        &self,
        record: &Record,
        context_url: &str,
        decisions: &mut DecisionCache,
    ) -> Record {
        let skip = decisions.decide(record.identity(), || {
            self.policy.is_non_production(context_url)
        });
        if skip {
            return record.clone();
        }
        self.redact_record(record)
    }

    /// Redacts every field except the record type, without consulting policy.
    pub fn redact_record(&self, record: &Record) -> Record {
        let record_type = record.record_type();
        let mut fields = record.observation.to_map();
        fields.shift_remove(RECORD_TYPE_KEY);

        let redacted = self.redactor.redact_map(&fields);
        let (observation, untyped) = Observation::lift_as(record_type, redacted);
        if !untyped.is_empty() {
            warn!(
                identity = %record.identity(),
                fields = ?untyped,
                "Redacted fields changed shape and were kept untyped"
            );
        }
        Record::new(record.identity().clone(), observation)
    }
}
