// Configuration loading

pub mod settings;

pub use settings::{ConfigError, LogSettings, MetadataSettings, PathSettings, Settings};
