//! keyval-config
//!
//! A minimal `KEY=VALUE` configuration store. Files are parsed line by line
//! into insertion-ordered pairs, values are read and updated by exact key,
//! and the pairs can be written back as `key=value` lines. The `kvc` binary
//! wraps the store in a small command-line tool.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use logging::{LogFormat, LogLevel, Logger};
pub use models::Settings;
pub use store::{ConfigPair, ConfigStore, DuplicateKeys, ParseOptions, ParseReport, StoreState};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Version string shown by `--version` in long form
pub const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")");

/// Build details stamped by build.rs
pub fn build_info() -> String {
    format!(
        "{} v{} (commit {}, target {}, built {})",
        PKG_NAME,
        VERSION,
        option_env!("GIT_COMMIT").unwrap_or("unknown"),
        option_env!("TARGET_TRIPLE").unwrap_or("unknown"),
        env!("BUILD_TIME"),
    )
}

/// Default configuration values
pub mod defaults {
    /// Longest accepted line, in bytes, when nothing else is configured
    pub const DEFAULT_MAX_LINE_LEN: usize = 4096;
    /// Upper bound for a configured line limit
    pub const MAX_LINE_LEN_CEILING: usize = 1 << 20;
    pub const DEFAULT_TRIM_KEYS: bool = false;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
