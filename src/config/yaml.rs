use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// credentials:
///   app_id: "1234567890"
///   access_token: "your-access-token"
///   speaker_id: "BV700_streaming"
///   cluster: "volcano_tts"
///   emotional: false
///
/// engine:
///   endpoint: "wss://openspeech.bytedance.com/api/v1/tts/ws_binary"
///   sample_rate: 24000
///   connect_timeout_seconds: 10
///
/// synthesis:
///   max_segment_chars: 80
///   segment_pause_ms: 300
///   segment_timeout_ms: 15000
///
/// settings_path: "/var/lib/volc-tts-bridge/settings.json"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub credentials: Option<CredentialsYaml>,
    pub engine: Option<EngineYaml>,
    pub synthesis: Option<SynthesisYaml>,
    pub settings_path: Option<String>,
}

/// Account credentials and voice from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CredentialsYaml {
    pub app_id: Option<String>,
    pub access_token: Option<String>,
    pub speaker_id: Option<String>,
    pub cluster: Option<String>,
    pub emotional: Option<bool>,
}

/// Engine transport settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EngineYaml {
    pub endpoint: Option<String>,
    pub sample_rate: Option<u32>,
    pub connect_timeout_seconds: Option<u64>,
}

/// Orchestrator tuning from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SynthesisYaml {
    pub max_segment_chars: Option<usize>,
    pub segment_pause_ms: Option<u64>,
    pub segment_timeout_ms: Option<u64>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
