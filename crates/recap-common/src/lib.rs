pub mod envelope;
pub mod error;
pub mod record;

pub use envelope::RecordEnvelope;
pub use error::RecordError;
pub use record::{
    ChunkBytes, ConsolePayload, CookiePayload, EventPayload, Identity, NetworkPayload,
    Observation, RawChunk, RawRecord, Record, RecordBody, RecordType, RequestBody, SessionId,
    SnapshotItem, StackTrace, StorageArea, StoragePayload,
};
