//! Settings parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::Settings,
};

/// Settings parser that combines CLI arguments with environment variables
pub struct SettingsParser {
    cli: Cli,
}

impl SettingsParser {
    /// Create a new settings parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete settings
    ///
    /// Commands that never touch a configuration file (`env-help`,
    /// `init-env`) carry on past a broken `.env` file or bad `KVC_*` values,
    /// so `env-help` can still report them.
    pub fn parse(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        let from_env = EnvManager::load_env_file(self.cli.debug)
            .and_then(|_| settings.merge_from_env());
        match from_env {
            Err(e) if !self.cli.needs_file() => {
                if self.cli.debug {
                    eprintln!("Ignoring environment settings: {}", e);
                }
            }
            other => other?,
        }
        self.apply_cli_overrides(&mut settings)?;

        if self.cli.needs_file() {
            settings.validate()?;
        }

        Ok(settings)
    }

    /// Apply CLI argument overrides to settings
    fn apply_cli_overrides(&self, settings: &mut Settings) -> Result<()> {
        self.cli.validate().map_err(AppError::config)?;

        if let Some(ref file) = self.cli.file {
            settings.file = Some(file.clone());
        }

        if let Some(max_line_len) = self.cli.max_line_len {
            settings.max_line_len = max_line_len;
        }

        if self.cli.trim_keys {
            settings.trim_keys = true;
        }

        if let Some(duplicates) = self.cli.duplicates {
            settings.duplicates = duplicates;
        }

        if let Some(log_format) = self.cli.log_format {
            settings.log_format = log_format;
        }

        settings.enable_color = self.cli.resolve_color(settings.enable_color);

        settings.verbose = self.cli.verbose;
        settings.debug = self.cli.debug;

        if settings.debug {
            eprintln!("Applied CLI overrides to settings");
            eprintln!("{}", display_settings_summary(settings));
        }

        Ok(())
    }
}

/// Convenience function to load complete settings from CLI arguments
pub fn load_settings(cli: Cli) -> Result<Settings> {
    SettingsParser::new(cli).parse()
}

/// Display settings summary for debug purposes
pub fn display_settings_summary(settings: &Settings) -> String {
    let mut summary = Vec::new();

    let file = settings.file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());
    summary.push(format!("File: {}", file));
    if settings.max_line_len == 0 {
        summary.push("Max Line Length: unlimited".to_string());
    } else {
        summary.push(format!("Max Line Length: {} bytes", settings.max_line_len));
    }
    summary.push(format!("Trim Keys: {}", settings.trim_keys));
    summary.push(format!("Duplicates: {}", settings.duplicates));
    summary.push(format!("Log Format: {}", settings.log_format));
    summary.push(format!("Color Output: {}", settings.enable_color));
    summary.push(format!("Verbose: {}", settings.verbose));
    summary.push(format!("Debug: {}", settings.debug));

    summary.join("\n")
}
