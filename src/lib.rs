pub mod config;
pub mod core;
pub mod service;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{BridgeConfig, Settings, SettingsProvider, SettingsStore, StaticSettings};
pub use crate::core::*;
pub use service::TtsService;
