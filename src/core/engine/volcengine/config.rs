use std::time::Duration;

use crate::core::engine::{EngineError, EngineResult};
use crate::utils::endpoint_validation::validate_endpoint;

/// Public binary-protocol endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://openspeech.bytedance.com/api/v1/tts/ws_binary";

/// Cluster used when the account does not name one.
pub const DEFAULT_CLUSTER: &str = "volcano_tts";

/// Voice name sent alongside the speaker id.
pub const DEFAULT_VOICE: &str = "other";

pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

const SPEED_RANGE: (f32, f32) = (0.2, 3.0);
const VOLUME_RANGE: (f32, f32) = (0.1, 3.0);
const PITCH_RANGE: (f32, f32) = (0.1, 3.0);

/// Transport settings for [`super::VolcengineEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct VolcengineEngineConfig {
    pub endpoint: String,
    pub sample_rate: u32,
    pub voice: String,
    pub connect_timeout: Duration,
    /// Longest gap tolerated between two frames.
    pub idle_timeout: Duration,
}

impl Default for VolcengineEngineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            voice: DEFAULT_VOICE.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl VolcengineEngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        validate_endpoint(&self.endpoint)
            .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))?;
        if self.sample_rate == 0 {
            return Err(EngineError::InvalidConfiguration(
                "sample rate must be positive".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() || self.idle_timeout.is_zero() {
            return Err(EngineError::InvalidConfiguration(
                "timeouts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn ratio(value: Option<u32>, (min, max): (f32, f32)) -> f32 {
    match value {
        Some(v) => (v as f32 / 100.0).clamp(min, max),
        None => 1.0,
    }
}

/// Map an OS speech rate (100 = normal) to the service speed ratio.
pub fn speed_ratio(rate: Option<u32>) -> f32 {
    ratio(rate, SPEED_RANGE)
}

pub fn volume_ratio(volume: Option<u32>) -> f32 {
    ratio(volume, VOLUME_RANGE)
}

/// Map an OS pitch (100 = normal) to the service pitch ratio.
pub fn pitch_ratio(pitch: Option<u32>) -> f32 {
    ratio(pitch, PITCH_RANGE)
}
