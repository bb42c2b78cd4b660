//! Synthesis engine abstraction.
//!
//! An engine runs one streaming session per text segment. It never returns
//! audio directly: everything it produces, including its terminal status,
//! goes through the [`ChunkProducer`] it is handed on `start`.

pub mod volcengine;

use async_trait::async_trait;
use thiserror::Error;
use zeroize::Zeroize;

use crate::core::session::ChunkProducer;

pub use volcengine::{VolcengineEngine, VolcengineEngineConfig};

/// Errors raised by engine adapters
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine is not configured")]
    NotConfigured,

    #[error("Invalid engine configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Provider error {code}: {message}")]
    Provider { code: u32, message: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Account and voice settings applied to an engine before each segment.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct EngineCredentials {
    pub app_id: String,
    pub access_token: String,
    pub speaker_id: String,
    pub cluster: String,
    pub emotional: bool,
}

impl std::fmt::Debug for EngineCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineCredentials")
            .field("app_id", &self.app_id)
            .field("access_token", &"<redacted>")
            .field("speaker_id", &self.speaker_id)
            .field("cluster", &self.cluster)
            .field("emotional", &self.emotional)
            .finish()
    }
}

impl Drop for EngineCredentials {
    fn drop(&mut self) {
        self.access_token.zeroize();
    }
}

/// Prosody requested by the OS. 100 is the neutral value for each field;
/// `None` leaves the service default in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpeechParams {
    pub speech_rate: Option<u32>,
    pub volume: Option<u32>,
    pub pitch: Option<u32>,
}

impl SpeechParams {
    pub fn new(speech_rate: u32, pitch: u32) -> Self {
        Self {
            speech_rate: Some(speech_rate),
            volume: None,
            pitch: Some(pitch),
        }
    }
}

/// One streaming synthesis session at a time.
///
/// The orchestrator pairs every `start` with a `shutdown`, and `shutdown`
/// must tolerate being called with nothing running.
#[async_trait]
pub trait SynthesisEngine: Send {
    /// Apply credentials, replacing any running session.
    async fn configure(&mut self, credentials: EngineCredentials) -> EngineResult<()>;

    /// Begin streaming `text`. Returns once the session is launched.
    async fn start(
        &mut self,
        text: &str,
        params: &SpeechParams,
        producer: ChunkProducer,
    ) -> EngineResult<()>;

    /// Release the session.
    async fn shutdown(&mut self);

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_token() {
        let credentials = EngineCredentials {
            app_id: "app".into(),
            access_token: "secret-token".into(),
            speaker_id: "BV001_streaming".into(),
            cluster: "volcano_tts".into(),
            emotional: false,
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("BV001_streaming"));
    }

    #[test]
    fn test_speech_params_new() {
        let params = SpeechParams::new(150, 90);
        assert_eq!(params.speech_rate, Some(150));
        assert_eq!(params.pitch, Some(90));
        assert_eq!(params.volume, None);
    }

    #[test]
    fn test_provider_error_display() {
        let err = EngineError::Provider {
            code: 3001,
            message: "invalid speaker".into(),
        };
        assert_eq!(err.to_string(), "Provider error 3001: invalid speaker");
    }
}
