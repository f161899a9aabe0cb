pub mod body;
pub mod config;
pub mod error;
pub mod filter;
pub mod identity;
pub mod ingest;
pub mod lifecycle;
pub mod patterns;
pub mod redaction;
pub mod replay;
pub mod state;
pub mod store;

pub use config::{ConfigError, ConfigLoader, RecapConfig};
pub use error::{DropReason, PipelineError};
pub use filter::DropFilter;
pub use ingest::{IngestOutcome, Pipeline};
pub use lifecycle::{LifecycleManager, SessionSignal, SessionSnapshot, TabStatus};
pub use patterns::{PatternError, PatternLibrary};
pub use recap_common::{Identity, Observation, Record, RecordEnvelope, RecordType, SessionId};
pub use redaction::{KeywordPolicy, RedactionEngine, Redactor};
pub use replay::{ReplaySummary, replay};
