//! Data models for the kvc tool

pub mod settings;

pub use settings::Settings;
