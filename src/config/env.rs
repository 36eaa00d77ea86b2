//! Environment variable handling and .env file management

use crate::{
    error::{AppError, Result},
    logging::{LogFormat, Logger},
    store::{ConfigStore, DuplicateKeys},
};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file if it exists; existing variables are not overridden
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)?;

            if debug {
                eprintln!("Loaded settings from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# kvc settings
#
# Values here are used as defaults and can be overridden by KVC_* variables
# already set in the environment or by command-line flags.

# Configuration file to read and write
# KVC_FILE=app.conf

# Longest accepted line in bytes (0 = unlimited)
# KVC_MAX_LINE_LEN=4096

# Strip spaces between a key and '=' (true/false)
# KVC_TRIM_KEYS=false

# Duplicate key policy while parsing: first, last or all
# KVC_DUPLICATES=first

# Diagnostic log format: console, json or compact
# KVC_LOG_FORMAT=console

# Enable colored output (true/false)
# KVC_ENABLE_COLOR=true
"#.to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::io(path, e))
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "KVC_FILE" => {
                if value.is_empty() {
                    return Err(AppError::config("KVC_FILE cannot be empty"));
                }
            }
            "KVC_MAX_LINE_LEN" => {
                let len: usize = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid KVC_MAX_LINE_LEN value '{}': {}", value, e)))?;
                if len > crate::defaults::MAX_LINE_LEN_CEILING {
                    return Err(AppError::config(format!(
                        "KVC_MAX_LINE_LEN must be at most {}, got: {}",
                        crate::defaults::MAX_LINE_LEN_CEILING, len
                    )));
                }
            }
            "KVC_TRIM_KEYS" | "KVC_ENABLE_COLOR" => {
                value.parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "KVC_DUPLICATES" => {
                value.parse::<DuplicateKeys>()?;
            }
            "KVC_LOG_FORMAT" => {
                value.parse::<LogFormat>()?;
            }
            _ => {
                // Not one of ours
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("KVC_FILE", "Configuration file to operate on", "app.conf"),
            ("KVC_MAX_LINE_LEN", "Longest accepted line in bytes (0 = unlimited)", "4096"),
            ("KVC_TRIM_KEYS", "Strip spaces between key and '='", "false"),
            ("KVC_DUPLICATES", "Duplicate key policy (first, last, all)", "first"),
            ("KVC_LOG_FORMAT", "Diagnostic log format (console, json, compact)", "console"),
            ("KVC_ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<18} {}\n", var, description));
            help.push_str(&format!("  {:<18} Example: {}\n\n", "", example));
        }

        help.push_str("Settings Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        let mut warnings = Vec::new();

        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                if let Err(e) = Self::validate_env_var(var_name, &value) {
                    warnings.push(format!("Warning: {}", e));
                }
            }
        }

        warnings
    }

    /// Check an env file's KVC_* entries without loading them.
    ///
    /// Returns `None` when the file does not exist.
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let mut store = ConfigStore::with_path(path)
            .with_logger(Logger::capturing("env".to_string()));
        let report = store.parse()?;

        let mut warnings = Vec::new();
        if report.malformed > 0 {
            warnings.push(format!("{} malformed line(s) in {}", report.malformed, path.display()));
        }

        for pair in &store {
            let key = pair.key_lossy();
            if let Err(e) = Self::validate_env_var(key.trim_end(), &pair.value_lossy()) {
                warnings.push(format!("{}: {}", key, e));
            }
        }

        Ok(Some(warnings))
    }
}
