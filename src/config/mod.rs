//! Settings management module

pub mod parser;
pub mod env;

pub use parser::{SettingsParser, load_settings, display_settings_summary};
pub use env::EnvManager;

pub use crate::models::Settings;
