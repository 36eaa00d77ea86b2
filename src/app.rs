//! Application layer: runs one CLI command against a configuration file

use crate::{
    cli::Command,
    config::EnvManager,
    error::{AppError, Result},
    logging::Logger,
    models::Settings,
    store::{ConfigStore, ParseReport},
};
use std::path::Path;

/// Runs commands with resolved settings
pub struct App {
    settings: Settings,
    logger: Logger,
}

impl App {
    /// Create an application logging to the standard streams
    pub fn new(settings: Settings) -> Self {
        let logger = Logger::with_settings("kvc".to_string(), &settings);
        Self { settings, logger }
    }

    /// Create an application with a caller-supplied logger
    pub fn with_logger(settings: Settings, logger: Logger) -> Self {
        Self { settings, logger }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run a command and return the bytes to print on stdout
    pub fn run(&self, command: &Command) -> Result<Vec<u8>> {
        match command {
            Command::Get { key } => {
                let store = self.load_store()?;
                let mut output = store.get_bytes(key)?.to_vec();
                output.push(b'\n');
                Ok(output)
            }
            Command::Set { key, value } => self.set_value(key, value),
            Command::List { json } => {
                let store = self.load_store()?;
                if *json {
                    let pairs: Vec<_> = store.iter().collect();
                    let rendered = serde_json::to_string_pretty(&pairs)
                        .map_err(|e| AppError::config(format!("Failed to serialize pairs: {}", e)))?;
                    Ok(format!("{}\n", rendered).into_bytes())
                } else {
                    Ok(store.render())
                }
            }
            Command::Check => {
                let mut store = self.new_store()?;
                let report = store.parse()?;
                check_report(&report)?;
                Ok(format_report(&report).into_bytes())
            }
            Command::EnvHelp => Ok(self.env_help(Path::new(".env"))?.into_bytes()),
            Command::InitEnv { path } => Ok(init_env(path)?.into_bytes()),
        }
    }

    /// Variable help followed by problems found in the environment and in `env_file`
    fn env_help(&self, env_file: &Path) -> Result<String> {
        let mut help = EnvManager::display_env_help();

        let env_warnings = EnvManager::validate_current_env();
        if !env_warnings.is_empty() {
            help.push_str("\nEnvironment:\n");
            for warning in env_warnings {
                help.push_str(&format!("  {}\n", warning));
            }
        }

        if let Some(file_warnings) = EnvManager::check_env_file(env_file)? {
            help.push_str(&format!("\n{}: ", env_file.display()));
            if file_warnings.is_empty() {
                help.push_str("OK\n");
            } else {
                help.push_str(&format!("{} problem(s)\n", file_warnings.len()));
                for warning in file_warnings {
                    help.push_str(&format!("  {}\n", warning));
                }
            }
        }

        Ok(help)
    }

    fn new_store(&self) -> Result<ConfigStore> {
        let path = self.settings.file.as_ref().ok_or(AppError::NotConfigured)?;
        Ok(ConfigStore::with_path(path)
            .with_options(self.settings.parse_options())
            .with_logger(self.logger.clone()))
    }

    fn load_store(&self) -> Result<ConfigStore> {
        let mut store = self.new_store()?;
        store.parse()?;
        Ok(store)
    }

    /// Parse the file if present, set the key and write everything back
    fn set_value(&self, key: &str, value: &str) -> Result<Vec<u8>> {
        let mut store = self.new_store()?;
        let exists = store.path().is_some_and(Path::exists);
        if exists {
            store.parse()?;
        }

        store.set(key, value)?;
        store.save()?;

        self.logger.info(&format!("Set {} ({} pairs written)", key, store.len()))
            .field("created", !exists)
            .log();

        Ok(Vec::new())
    }
}

fn check_report(report: &ParseReport) -> Result<()> {
    match report.malformed_lines.first() {
        Some((line_number, content)) => Err(AppError::malformed_line(*line_number, content.clone())),
        None => Ok(()),
    }
}

fn format_report(report: &ParseReport) -> String {
    format!(
        "OK: {} lines, {} pairs, {} comments, {} blank, {} duplicates\n",
        report.lines, report.pairs, report.comments, report.blank, report.duplicates
    )
}

fn init_env(path: &Path) -> Result<String> {
    if path.exists() {
        return Err(AppError::config(format!("{} already exists", path.display())));
    }

    EnvManager::save_example_env_file(path)?;
    Ok(format!("Wrote example settings to {}\n", path.display()))
}
