use thiserror::Error;

/// Reasons a raw observation cannot be read as a record at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Record is not a JSON object")]
    NotAnObject,
    #[error("Record has no recordType")]
    MissingRecordType,
    #[error("recordType must be a string, got {0}")]
    InvalidRecordType(String),
    #[error("Unknown recordType: {0}")]
    UnknownRecordType(String),
}
