//! Command-line interface for the kvc tool

use crate::{
    logging::LogFormat,
    store::DuplicateKeys,
};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

/// kvc - read and update KEY=VALUE configuration files
#[derive(Parser, Debug, Clone)]
#[command(name = "kvc")]
#[command(version, long_version = crate::LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Configuration file to operate on
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Longest accepted line in bytes (0 = unlimited)
    #[arg(long, global = true, value_parser = parse_line_len)]
    pub max_line_len: Option<usize>,

    /// Strip spaces between a key and '='
    #[arg(long, global = true)]
    pub trim_keys: bool,

    /// Duplicate key policy while parsing (first, last, all)
    #[arg(long, global = true, value_parser = parse_duplicates)]
    pub duplicates: Option<DuplicateKeys>,

    /// Diagnostic log format (console, json, compact)
    #[arg(long, global = true, value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,

    /// Force colored output
    #[arg(long, global = true)]
    pub color: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations on the configuration file
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the value of a key
    Get {
        key: String,
    },
    /// Set a key and save the file, creating it if needed
    Set {
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Print every pair in file order
    List {
        /// Print a JSON array of {key, value} objects
        #[arg(long)]
        json: bool,
    },
    /// Parse the file and report malformed lines
    Check,
    /// Show supported environment variables
    EnvHelp,
    /// Write an example .env file
    InitEnv {
        #[arg(default_value = ".env")]
        path: PathBuf,
    },
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if let Command::Get { key } | Command::Set { key, .. } = &self.command {
            if key.is_empty() {
                return Err("Key cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Whether the command reads or writes the configuration file
    pub fn needs_file(&self) -> bool {
        !matches!(self.command, Command::EnvHelp | Command::InitEnv { .. })
    }

    /// Check if colors should be enabled, before any settings are loaded
    pub fn use_colors(&self) -> bool {
        self.resolve_color(crate::defaults::DEFAULT_ENABLE_COLOR)
    }

    /// Final color decision: flags win, otherwise the configured value
    /// applies only when the terminal can show colors
    pub fn resolve_color(&self, configured: bool) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            configured && supports_color()
        }
    }
}

fn parse_line_len(s: &str) -> Result<usize, String> {
    if s.starts_with('+') {
        return Err(format!("Invalid line length: {}", s));
    }

    s.parse::<usize>()
        .map_err(|_| format!("Invalid line length: {}", s))
        .and_then(|len| {
            if len > crate::defaults::MAX_LINE_LEN_CEILING {
                Err(format!("Line length cannot exceed {} bytes", crate::defaults::MAX_LINE_LEN_CEILING))
            } else {
                Ok(len)
            }
        })
}

fn parse_duplicates(s: &str) -> Result<DuplicateKeys, String> {
    s.parse().map_err(|e: crate::error::AppError| e.to_string())
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse().map_err(|e: crate::error::AppError| e.to_string())
}

/// Check if the terminal supports color output.
///
/// Diagnostics and errors go to stderr, so that is the stream checked.
pub fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    if !std::io::stderr().is_terminal() {
        return false;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
