pub mod args;
pub mod config;
pub mod loader;

pub use args::{Args, OutputFormat};
pub use config::{CacheConfig, ConfigFile, RuleRecord, RuleSetFile};
pub use loader::{InputLoader, Inputs};
