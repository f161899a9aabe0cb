/// Decides whether a capture context is a non-production environment, in
/// which case redaction is skipped for records captured there.
pub trait EnvironmentPolicy: Send + Sync {
    fn is_non_production(&self, context_url: &str) -> bool;
}

impl<F> EnvironmentPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_non_production(&self, context_url: &str) -> bool {
        self(context_url)
    }
}

pub fn default_non_production_markers() -> Vec<String> {
    ["localhost", "127.0.0.1", "0.0.0.0", ".local", "staging", "sandbox"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

/// Substring match of lowercase markers against the lowercased context URL.
#[derive(Debug, Clone)]
pub struct KeywordPolicy {
    markers: Vec<String>,
}

impl Default for KeywordPolicy {
    fn default() -> Self {
        Self::new(default_non_production_markers())
    }
}

impl KeywordPolicy {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// A policy that treats every context as production.
    pub fn always_redact() -> Self {
        Self {
            markers: Vec::new(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl EnvironmentPolicy for KeywordPolicy {
    fn is_non_production(&self, context_url: &str) -> bool {
        let url = context_url.to_lowercase();
        self.markers.iter().any(|marker| url.contains(marker.as_str()))
    }
}
