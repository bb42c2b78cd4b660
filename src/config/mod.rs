//! Configuration for the bridge
//!
//! Values come from `.env` files, environment variables and an optional YAML
//! file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `settings`: Persisted user settings and their providers
//!
//! # Example
//! ```rust,no_run
//! use volc_tts_bridge::config::BridgeConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = BridgeConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config = BridgeConfig::from_file(&PathBuf::from("config.yaml"))?;
//! println!("Synthesizing through {}", config.endpoint);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
pub mod settings;
mod validation;
mod yaml;

pub use settings::{Settings, SettingsProvider, SettingsStore, StaticSettings};
pub use yaml::YamlConfig;

use crate::core::engine::volcengine::{
    DEFAULT_CLUSTER, DEFAULT_ENDPOINT, DEFAULT_SAMPLE_RATE, VolcengineEngineConfig,
};
use crate::core::orchestrator::SynthesisOptions;
use crate::core::segmenter::DEFAULT_MAX_SEGMENT_CHARS;

/// Bridge configuration
#[derive(Clone)]
pub struct BridgeConfig {
    // Credentials and voice
    pub app_id: Option<String>,
    pub access_token: Option<String>,
    pub speaker_id: Option<String>,
    pub cluster: String,
    pub emotional: bool,

    // Engine transport
    pub endpoint: String,
    pub sample_rate: u32,
    pub connect_timeout_seconds: u64,

    // Orchestration
    pub max_segment_chars: usize,
    pub segment_pause_ms: u64,
    pub segment_timeout_ms: u64,

    /// File holding persisted settings; overrides the credentials above.
    pub settings_path: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            access_token: None,
            speaker_id: None,
            cluster: DEFAULT_CLUSTER.to_string(),
            emotional: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            connect_timeout_seconds: 10,
            max_segment_chars: DEFAULT_MAX_SEGMENT_CHARS,
            segment_pause_ms: 300,
            segment_timeout_ms: 15_000,
            settings_path: None,
        }
    }
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("app_id", &self.app_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("speaker_id", &self.speaker_id)
            .field("cluster", &self.cluster)
            .field("emotional", &self.emotional)
            .field("endpoint", &self.endpoint)
            .field("sample_rate", &self.sample_rate)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .field("max_segment_chars", &self.max_segment_chars)
            .field("segment_pause_ms", &self.segment_pause_ms)
            .field("segment_timeout_ms", &self.segment_timeout_ms)
            .field("settings_path", &self.settings_path)
            .finish()
    }
}

/// Wipe the access token when the configuration is dropped.
impl Drop for BridgeConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut token) = self.access_token {
            token.zeroize();
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment variables
    /// filling whatever the file leaves out.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is loaded in main.rs before this runs
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Settings assembled from the configured credentials.
    ///
    /// `None` when no credential is configured at all; partially filled
    /// settings are returned as-is and rejected at synthesis time.
    pub fn settings(&self) -> Option<Settings> {
        if self.app_id.is_none() && self.access_token.is_none() && self.speaker_id.is_none() {
            return None;
        }
        Some(Settings {
            app_id: self.app_id.clone().unwrap_or_default(),
            access_token: self.access_token.clone().unwrap_or_default(),
            speaker_id: self.speaker_id.clone().unwrap_or_default(),
            cluster: self.cluster.clone(),
            emotional: self.emotional,
        })
    }

    pub fn engine_config(&self) -> VolcengineEngineConfig {
        VolcengineEngineConfig {
            endpoint: self.endpoint.clone(),
            sample_rate: self.sample_rate,
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
            ..Default::default()
        }
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            max_segment_chars: self.max_segment_chars,
            segment_pause: Duration::from_millis(self.segment_pause_ms),
            segment_timeout: Duration::from_millis(self.segment_timeout_ms),
            sample_rate: self.sample_rate,
            ..Default::default()
        }
    }
}
