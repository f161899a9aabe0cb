use recap_common::Observation;

/// Substrings that identify the capture tooling itself: the injected
/// instrumentation bundle, the reporting backend and the extension id.
pub fn default_blocklist() -> Vec<String> {
    ["extend.iife", "briehq", "fhfdkpfdkimboffigpggibbgggeimpfd"]
        .iter()
        .map(|entry| entry.to_string())
        .collect()
}

/// Drops records that describe the pipeline's own instrumentation or known
/// noisy internal endpoints.
#[derive(Debug, Clone)]
pub struct DropFilter {
    blocklist: Vec<String>,
}

impl Default for DropFilter {
    fn default() -> Self {
        Self::new(default_blocklist())
    }
}

impl DropFilter {
    pub fn new<I, S>(blocklist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocklist: blocklist
                .into_iter()
                .map(Into::into)
                .filter(|entry: &String| !entry.is_empty())
                .collect(),
        }
    }

    pub fn blocklist(&self) -> &[String] {
        &self.blocklist
    }

    /// The blocklist entry `observation` matches, if any. Network records
    /// are checked by URL, console records by caller location.
    pub fn matched_entry(&self, observation: &Observation) -> Option<&str> {
        let subject = observation
            .url()
            .or_else(|| observation.stack_location())?;
        self.blocklist
            .iter()
            .find(|entry| subject.contains(entry.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_blocklist_catches_own_instrumentation() {
        let filter = DropFilter::default();
        let console = Observation::from_value(json!({
            "recordType": "console",
            "stackTrace": { "parsed": "at capture (chrome-extension://x/extend.iife.js:1:20)" }
        }))
        .unwrap();
        assert_eq!(filter.matched_entry(&console), Some("extend.iife"));

        let network = Observation::from_value(json!({
            "recordType": "network",
            "url": "https://api.briehq.com/v1/slices"
        }))
        .unwrap();
        assert_eq!(filter.matched_entry(&network), Some("briehq"));
    }

    #[test]
    fn test_other_records_are_never_filtered() {
        let filter = DropFilter::new(["click"]);
        let event = Observation::from_value(json!({ "recordType": "events", "event": "click" })).unwrap();
        assert_eq!(filter.matched_entry(&event), None);

        let console = Observation::from_value(json!({ "recordType": "console", "args": ["click"] })).unwrap();
        assert_eq!(filter.matched_entry(&console), None);
    }
}
