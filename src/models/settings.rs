//! Settings data model and validation for the `kvc` tool

use crate::{
    error::{AppError, Result},
    logging::LogFormat,
    store::{DuplicateKeys, ParseOptions},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Backing configuration file
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Longest accepted line in bytes; 0 disables the limit
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,

    /// Strip whitespace between key and `=`
    #[serde(default)]
    pub trim_keys: bool,

    /// Duplicate key policy while parsing
    #[serde(default)]
    pub duplicates: DuplicateKeys,

    /// Diagnostic log format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            file: None,
            max_line_len: default_max_line_len(),
            trim_keys: crate::defaults::DEFAULT_TRIM_KEYS,
            duplicates: DuplicateKeys::default(),
            log_format: LogFormat::default(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        match &self.file {
            None => {
                return Err(AppError::config(
                    "No configuration file given (use --file or KVC_FILE)",
                ));
            }
            Some(path) if path.as_os_str().is_empty() => {
                return Err(AppError::config("Configuration file path cannot be empty"));
            }
            Some(_) => {}
        }

        if self.max_line_len > crate::defaults::MAX_LINE_LEN_CEILING {
            return Err(AppError::config(format!(
                "Maximum line length cannot exceed {} bytes",
                crate::defaults::MAX_LINE_LEN_CEILING
            )));
        }

        Ok(())
    }

    /// Parse options for the store
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_line_len: (self.max_line_len > 0).then_some(self.max_line_len),
            trim_keys: self.trim_keys,
            duplicates: self.duplicates,
        }
    }

    /// Merge `KVC_*` environment variables into these settings
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(file) = std::env::var("KVC_FILE") {
            if !file.trim().is_empty() {
                self.file = Some(PathBuf::from(file.trim()));
            }
        }

        if let Ok(max_line_len) = std::env::var("KVC_MAX_LINE_LEN") {
            self.max_line_len = max_line_len.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid KVC_MAX_LINE_LEN value '{}': {}", max_line_len, e)))?;
        }

        if let Ok(trim_keys) = std::env::var("KVC_TRIM_KEYS") {
            self.trim_keys = trim_keys.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid KVC_TRIM_KEYS value '{}': {}", trim_keys, e)))?;
        }

        if let Ok(duplicates) = std::env::var("KVC_DUPLICATES") {
            self.duplicates = duplicates.trim().parse()?;
        }

        if let Ok(log_format) = std::env::var("KVC_LOG_FORMAT") {
            self.log_format = log_format.trim().parse()?;
        }

        if let Ok(enable_color) = std::env::var("KVC_ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid KVC_ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

fn default_max_line_len() -> usize {
    crate::defaults::DEFAULT_MAX_LINE_LEN
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
