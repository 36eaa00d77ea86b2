//! Error handling for the configuration store

use std::collections::TryReserveError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Custom error types for the configuration store
#[derive(Error, Debug)]
pub enum AppError {
    /// No backing file path has been configured
    #[error("No configuration file path configured")]
    NotConfigured,

    /// Open/read/write failure on the backing file
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Memory could not be reserved for a key or value
    #[error("Allocation failure: {0}")]
    Allocation(#[from] TryReserveError),

    /// Key absent from the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Value does not fit the caller's buffer (one byte is reserved for the terminator)
    #[error("Buffer too small: value needs {needed} bytes plus terminator, capacity is {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    /// Non-fatal: a line without a valid `key=value` structure
    #[error("Malformed line {line_number}: {content}")]
    MalformedLine { line_number: usize, content: String },

    /// Save attempted on a store with no pairs
    #[error("Refusing to save an empty store")]
    EmptyStore,

    /// Physical line longer than the configured maximum
    #[error("Line {line_number} exceeds the maximum length of {limit} bytes")]
    LineTooLong { line_number: usize, limit: usize },

    /// Key rejected by `set`
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Value rejected by `set`
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Stored value is not UTF-8; the byte accessors still return it
    #[error("Value of '{0}' is not valid UTF-8")]
    NotUtf8(String),

    /// Settings, environment and CLI errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create a new settings error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a new key-not-found error
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound(key.into())
    }

    /// Create a new malformed-line report
    pub fn malformed_line<S: Into<String>>(line_number: usize, content: S) -> Self {
        Self::MalformedLine {
            line_number,
            content: content.into(),
        }
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::Io { .. } => "IO",
            Self::Allocation(_) => "ALLOC",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BufferTooSmall { .. } => "BUFFER",
            Self::MalformedLine { .. } => "MALFORMED",
            Self::EmptyStore => "EMPTY",
            Self::LineTooLong { .. } => "LINE_TOO_LONG",
            Self::InvalidKey(_) => "INVALID_KEY",
            Self::InvalidValue(_) => "INVALID_VALUE",
            Self::NotUtf8(_) => "ENCODING",
            Self::Config(_) => "CONFIG",
        }
    }

    /// Check if the caller can carry on after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::MalformedLine { .. } | Self::NotFound(_) | Self::BufferTooSmall { .. } => true,
            Self::NotUtf8(_) => true,
            Self::NotConfigured | Self::Io { .. } | Self::Allocation(_) => false,
            Self::EmptyStore | Self::LineTooLong { .. } | Self::InvalidKey(_) | Self::InvalidValue(_) => false,
            Self::Config(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NotConfigured => {
                format!("{}\n\nSuggestion: Pass --file or set KVC_FILE.", self)
            }
            Self::Io { .. } => {
                format!("File operation failed: {}\n\nSuggestion: Check that the file exists and that permissions allow access.", self)
            }
            Self::Allocation(_) => {
                format!("{}\n\nSuggestion: The system is out of memory.", self)
            }
            Self::NotFound(key) => {
                format!("Key '{}' is not present in the configuration file.\n\nSuggestion: Use 'kvc list' to see the available keys.", key)
            }
            Self::BufferTooSmall { .. } => {
                format!("{}\n\nSuggestion: Provide a buffer at least one byte longer than the value.", self)
            }
            Self::MalformedLine { .. } => {
                format!("{}\n\nSuggestion: Every non-comment line must look like KEY=VALUE with a non-empty key.", self)
            }
            Self::EmptyStore => {
                format!("{}\n\nSuggestion: Set at least one key before saving.", self)
            }
            Self::LineTooLong { .. } => {
                format!("{}\n\nSuggestion: Raise the limit with --max-line-len or KVC_MAX_LINE_LEN (0 disables it).", self)
            }
            Self::InvalidKey(_) => {
                format!("{}\n\nSuggestion: Keys must be non-empty, must not start with whitespace or '#', and must not contain '=' or a newline.", self)
            }
            Self::InvalidValue(_) => {
                format!("{}\n\nSuggestion: Values are written on a single line and cannot contain a newline.", self)
            }
            Self::NotUtf8(_) => {
                format!("{}\n\nSuggestion: Read the raw bytes with read_value or get_bytes.", self)
            }
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file, KVC_* variables or command line arguments.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::NotConfigured => 1, // Invalid configuration/usage
            Self::InvalidKey(_) | Self::InvalidValue(_) => 1,
            Self::NotFound(_) => 2,
            Self::MalformedLine { .. } | Self::LineTooLong { .. } | Self::NotUtf8(_) => 3, // Bad file content
            Self::EmptyStore | Self::BufferTooSmall { .. } => 4,
            Self::Io { .. } => 5,
            Self::Allocation(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::NotConfigured | Self::InvalidKey(_) | Self::InvalidValue(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::NotFound(_) | Self::BufferTooSmall { .. } | Self::MalformedLine { .. } | Self::NotUtf8(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::LineTooLong { .. } | Self::EmptyStore => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io { .. } => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Allocation(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

/// Custom Result type for the configuration store
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user feedback on stderr
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.format_error(error));
    }

    /// Render what `report_error` prints
    pub fn format_error(&self, error: &AppError) -> String {
        let mut output = error.format_for_console(self.use_color);

        if self.verbose {
            output.push_str("\n\n");
            output.push_str(&error.user_friendly_message());

            if let Some(source) = std::error::Error::source(error) {
                output.push_str(&format!("\n\nCaused by: {}", source));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let e = AppError::not_found("name");
        assert_eq!(e.to_string(), "Key not found: name");

        let e = AppError::BufferTooSmall { needed: 5, capacity: 5 };
        assert!(e.to_string().contains("capacity is 5"));

        let e = AppError::LineTooLong { line_number: 3, limit: 16 };
        assert!(e.to_string().contains("Line 3"));
        assert!(e.to_string().contains("16 bytes"));
    }

    #[test]
    fn test_io_error_keeps_source_and_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e = AppError::io("/tmp/app.conf", io_err);

        assert!(e.to_string().contains("/tmp/app.conf"));
        assert!(e.to_string().contains("file missing"));
        assert!(e.source().is_some());
        assert_eq!(e.category(), "IO");
    }

    #[test]
    fn test_allocation_error_converts() {
        let reserve_err = Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err();
        let e: AppError = reserve_err.into();
        assert_eq!(e.category(), "ALLOC");
        assert_eq!(e.exit_code(), 99);
    }

    #[test]
    fn test_exit_codes_and_recoverability() {
        assert_eq!(AppError::NotConfigured.exit_code(), 1);
        assert_eq!(AppError::not_found("k").exit_code(), 2);
        assert_eq!(AppError::EmptyStore.exit_code(), 4);

        assert!(AppError::malformed_line(1, "oops").is_recoverable());
        assert!(!AppError::EmptyStore.is_recoverable());
    }

    #[test]
    fn test_format_for_console_plain() {
        let e = AppError::EmptyStore;
        assert_eq!(e.format_for_console(false), "[EMPTY] Refusing to save an empty store");
    }

    #[test]
    fn test_reporter_verbose_includes_suggestion() {
        let reporter = ErrorReporter::new(false, true);
        let output = reporter.format_error(&AppError::not_found("port"));

        assert!(output.starts_with("[NOT_FOUND]"));
        assert!(output.contains("kvc list"));
    }
}
