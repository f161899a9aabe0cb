use recap_common::{Identity, Observation, RecordType};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Network record has no url")]
    MissingUrl,
}

/// Computes the merge key for an incoming observation.
///
/// Network observations are keyed by their URL verbatim, so every lifecycle
/// phase of a request lands on the same record. Everything else is a
/// point-in-time capture and gets a fresh key that nothing will ever merge
/// into.
pub fn resolve(observation: &Observation) -> Result<Identity, IdentityError> {
    match observation.record_type() {
        RecordType::Network => match observation.url() {
            Some(url) if !url.is_empty() => Ok(Identity::new(url)),
            _ => Err(IdentityError::MissingUrl),
        },
        _ => Ok(fresh()),
    }
}

pub fn fresh() -> Identity {
    Identity::new(Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observe(value: serde_json::Value) -> Observation {
        Observation::from_value(value).unwrap()
    }

    #[test]
    fn test_network_identity_is_the_url() {
        let a = observe(json!({ "recordType": "network", "url": "https://api.example.com/Items?page=2" }));
        let b = observe(json!({ "recordType": "network", "url": "https://api.example.com/Items?page=2", "status": 200 }));
        assert_eq!(resolve(&a), resolve(&b));
        assert_eq!(
            resolve(&a).unwrap().as_str(),
            "https://api.example.com/Items?page=2"
        );
    }

    #[test]
    fn test_url_is_case_sensitive() {
        let lower = observe(json!({ "recordType": "network", "url": "https://api.example.com/items" }));
        let upper = observe(json!({ "recordType": "network", "url": "https://api.example.com/Items" }));
        assert_ne!(resolve(&lower), resolve(&upper));
    }

    #[test]
    fn test_network_without_url_fails() {
        let missing = observe(json!({ "recordType": "network", "status": 200 }));
        let empty = observe(json!({ "recordType": "network", "url": "" }));
        assert_eq!(resolve(&missing), Err(IdentityError::MissingUrl));
        assert_eq!(resolve(&empty), Err(IdentityError::MissingUrl));
    }

    #[test]
    fn test_other_records_get_fresh_identities() {
        let log = observe(json!({ "recordType": "console", "method": "log", "args": ["hi"] }));
        assert_ne!(resolve(&log), resolve(&log));
    }
}
