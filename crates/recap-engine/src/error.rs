use crate::identity::IdentityError;
use crate::patterns::PatternError;
use recap_common::RecordError;
use thiserror::Error;

/// Why a record never reached a session store. Terminal for that record
/// only; other records in the same batch are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("Record has no session scope")]
    MissingScope,
    #[error("Network record has no url to merge on")]
    MissingIdentity,
    #[error("Record matched blocklist entry '{entry}'")]
    DroppedByFilter { entry: String },
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] RecordError),
}

impl From<IdentityError> for DropReason {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::MissingUrl => Self::MissingIdentity,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to build pattern library: {0}")]
    Pattern(#[from] PatternError),
}
