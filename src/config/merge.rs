use std::path::PathBuf;

use super::BridgeConfig;
use super::env::EnvConfig;
use super::yaml::YamlConfig;

/// Combine YAML, environment and defaults. YAML wins over the environment,
/// which wins over defaults.
pub fn merge_config(yaml: Option<YamlConfig>) -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    let env = EnvConfig::load()?;
    let yaml = yaml.unwrap_or_default();
    let credentials = yaml.credentials.unwrap_or_default();
    let engine = yaml.engine.unwrap_or_default();
    let synthesis = yaml.synthesis.unwrap_or_default();
    let defaults = BridgeConfig::default();

    Ok(BridgeConfig {
        app_id: credentials.app_id.or(env.app_id),
        access_token: credentials.access_token.or(env.access_token),
        speaker_id: credentials.speaker_id.or(env.speaker_id),
        cluster: credentials
            .cluster
            .or(env.cluster)
            .unwrap_or_else(|| defaults.cluster.clone()),
        emotional: credentials
            .emotional
            .or(env.emotional)
            .unwrap_or(defaults.emotional),
        endpoint: engine
            .endpoint
            .or(env.endpoint)
            .unwrap_or_else(|| defaults.endpoint.clone()),
        sample_rate: engine
            .sample_rate
            .or(env.sample_rate)
            .unwrap_or(defaults.sample_rate),
        connect_timeout_seconds: engine
            .connect_timeout_seconds
            .or(env.connect_timeout_seconds)
            .unwrap_or(defaults.connect_timeout_seconds),
        max_segment_chars: synthesis
            .max_segment_chars
            .or(env.max_segment_chars)
            .unwrap_or(defaults.max_segment_chars),
        segment_pause_ms: synthesis
            .segment_pause_ms
            .or(env.segment_pause_ms)
            .unwrap_or(defaults.segment_pause_ms),
        segment_timeout_ms: synthesis
            .segment_timeout_ms
            .or(env.segment_timeout_ms)
            .unwrap_or(defaults.segment_timeout_ms),
        settings_path: yaml
            .settings_path
            .or(env.settings_path)
            .map(PathBuf::from),
    })
}
