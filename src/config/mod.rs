mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{AgentConfig, AppConfig, LoggingConfig, StorageConfig, TerminalConfig};
