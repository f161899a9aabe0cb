use crate::filter::default_blocklist;
use crate::redaction::policy::default_non_production_markers;
use crate::redaction::{DEFAULT_MARKER, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecapConfig {
    #[serde(default)]
    pub redaction: RedactionConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Extra key-name patterns, added to the built-in ones.
    #[serde(default)]
    pub sensitive_keys: Vec<String>,
    /// Extra value patterns, applied after the built-in ones in list order.
    #[serde(default)]
    pub patterns: Vec<CustomPattern>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            max_depth: default_max_depth(),
            sensitive_keys: Vec::new(),
            patterns: Vec::new(),
        }
    }
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPattern {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Context URLs containing any of these are treated as non-production
    /// and left unredacted.
    #[serde(default = "default_non_production_markers")]
    pub non_production_markers: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            non_production_markers: default_non_production_markers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_blocklist")]
    pub blocklist: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blocklist: default_blocklist(),
        }
    }
}
