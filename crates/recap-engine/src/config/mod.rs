pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader, search_paths};
pub use schema::{CustomPattern, EnvironmentConfig, FilterConfig, RecapConfig, RedactionConfig};
