use super::BridgeConfig;
use crate::utils::endpoint_validation::validate_endpoint;

/// Check the merged configuration for values the bridge cannot run with.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_endpoint(&config.endpoint)
        .map_err(|e| format!("Invalid engine endpoint '{}': {e}", config.endpoint))?;

    for (name, value) in [
        ("sample_rate", u64::from(config.sample_rate)),
        ("connect_timeout_seconds", config.connect_timeout_seconds),
        ("max_segment_chars", config.max_segment_chars as u64),
        ("segment_timeout_ms", config.segment_timeout_ms),
    ] {
        if value == 0 {
            return Err(format!("{name} must be greater than zero").into());
        }
    }

    if config.cluster.trim().is_empty() {
        return Err("cluster must not be empty".into());
    }

    Ok(())
}
