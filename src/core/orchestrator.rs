//! Synthesis orchestration.
//!
//! Drives one request from validation to its terminal signal:
//!
//! ```text
//! Idle -> Validating -> (SingleSegment | MultiSegment)
//!      -> { SegmentRunning -> SegmentDraining }* -> Done | Failed
//! ```
//!
//! Every segment gets `configure` + `start` on the engine and is always
//! followed by `shutdown`, whatever the outcome. The output stream sees
//! `begin` once and exactly one of `finish`/`fail`.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::core::engine::{EngineCredentials, EngineError, SpeechParams, SynthesisEngine};
use crate::core::segmenter::{DEFAULT_MAX_SEGMENT_CHARS, segment};
use crate::core::session::{Popped, SessionContext};
use crate::core::sink::{AudioEncoding, OutputStream, SinkError, SynthesisCallback};
use crate::utils::isolation::catch_panic;

/// Errors that end a synthesis request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Segmentation produced no segments")]
    EmptySegmentation,

    #[error("Engine failure: {0}")]
    EngineFailure(String),

    #[error("No end of audio within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// How a request ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// All segments were synthesized.
    Completed { segments: usize, bytes: usize },
    /// Nothing to say; an empty stream was announced.
    Empty,
    /// The caller stopped the request.
    Interrupted,
}

/// Tuning for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOptions {
    /// Longest text sent to the engine in one session, in characters.
    pub max_segment_chars: usize,
    /// Pause between segments.
    pub segment_pause: Duration,
    /// Deadline for one segment to reach end of audio.
    pub segment_timeout: Duration,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            max_segment_chars: DEFAULT_MAX_SEGMENT_CHARS,
            segment_pause: Duration::from_millis(300),
            segment_timeout: Duration::from_secs(15),
            sample_rate: 24000,
            channels: 1,
        }
    }
}

/// One utterance handed over by the OS.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TtsRequest {
    pub text: String,
    pub params: SpeechParams,
}

impl TtsRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: SpeechParams::default(),
        }
    }

    pub fn with_params(mut self, params: SpeechParams) -> Self {
        self.params = params;
        self
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SegmentEnd {
    Drained,
    Interrupted,
}

/// Runs requests against a [`SynthesisEngine`].
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    options: SynthesisOptions,
}

impl Orchestrator {
    pub fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Synthesize `request` into `sink`.
    ///
    /// The sink always receives exactly one terminal signal. Errors are
    /// also returned so the caller can log or report them.
    pub async fn synthesize<E>(
        &self,
        engine: &mut E,
        settings: Option<&Settings>,
        request: &TtsRequest,
        ctx: &SessionContext,
        sink: &mut dyn SynthesisCallback,
    ) -> SynthesisResult<SynthesisOutcome>
    where
        E: SynthesisEngine + ?Sized,
    {
        let mut stream = OutputStream::new(sink);

        let credentials = match validate_settings(settings) {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("Rejecting synthesis request: {}", e);
                stream.fail();
                return Err(e);
            }
        };

        let text = request.text.as_str();
        let char_count = text.chars().count();
        info!(chars = char_count, engine = engine.name(), "Synthesis request received");

        if let Err(e) = stream.begin(self.options.sample_rate, AudioEncoding::Pcm16, self.options.channels) {
            error!("Output sink refused to start: {}", e);
            stream.fail();
            return Err(e.into());
        }

        if text.trim().is_empty() {
            debug!("Blank text, announcing an empty utterance");
            stream.finish()?;
            return Ok(SynthesisOutcome::Empty);
        }

        let segments = if char_count <= self.options.max_segment_chars {
            vec![text.to_string()]
        } else {
            segment(text, self.options.max_segment_chars)
        };
        if segments.is_empty() {
            stream.fail();
            return Err(SynthesisError::EmptySegmentation);
        }
        info!(segments = segments.len(), "Text split for synthesis");

        let total = segments.len();
        let mut interrupted = false;
        for (index, piece) in segments.iter().enumerate() {
            if index > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(self.options.segment_pause) => {}
                    _ = ctx.interrupted() => {}
                }
            }
            if ctx.is_interrupted() {
                interrupted = true;
                break;
            }

            debug!(
                segment = index + 1,
                total,
                chars = piece.chars().count(),
                "Synthesizing segment"
            );
            ctx.reset().await;

            let outcome = catch_panic(self.run_segment(
                &mut *engine,
                &credentials,
                piece,
                &request.params,
                ctx,
                &mut stream,
            ))
            .await;
            engine.shutdown().await;

            let outcome = match outcome {
                Ok(result) => result,
                Err(panic) => Err(SynthesisError::Unexpected(panic)),
            };

            match outcome {
                Ok(SegmentEnd::Drained) => {}
                Ok(SegmentEnd::Interrupted) => {
                    interrupted = true;
                    break;
                }
                Err(e) => {
                    error!(segment = index + 1, total, "Synthesis failed: {}", e);
                    stream.fail();
                    return Err(e);
                }
            }
        }

        let bytes = stream.delivered_bytes();
        if interrupted {
            info!(bytes, "Synthesis interrupted");
            if let Err(e) = stream.finish() {
                warn!("Output sink failed to finish after interruption: {}", e);
            }
            return Ok(SynthesisOutcome::Interrupted);
        }

        stream.finish()?;
        info!(segments = total, bytes, "Synthesis completed");
        Ok(SynthesisOutcome::Completed {
            segments: total,
            bytes,
        })
    }

    /// Start one segment and drain its audio into the stream.
    async fn run_segment<E>(
        &self,
        engine: &mut E,
        credentials: &EngineCredentials,
        text: &str,
        params: &SpeechParams,
        ctx: &SessionContext,
        stream: &mut OutputStream<'_>,
    ) -> SynthesisResult<SegmentEnd>
    where
        E: SynthesisEngine + ?Sized,
    {
        engine.configure(credentials.clone()).await?;
        engine.start(text, params, ctx.producer()).await?;

        let deadline = Instant::now() + self.options.segment_timeout;
        loop {
            match ctx.pop_until(deadline).await {
                Popped::Chunk(chunk) => {
                    debug!(bytes = chunk.len(), "Forwarding audio chunk");
                    stream.deliver_windowed(&chunk)?;
                }
                Popped::Exhausted => {
                    return match ctx.failure_message() {
                        Some(message) => Err(SynthesisError::EngineFailure(message)),
                        None => Ok(SegmentEnd::Drained),
                    };
                }
                Popped::Failed(message) => return Err(SynthesisError::EngineFailure(message)),
                Popped::Timeout => {
                    warn!(timeout = ?self.options.segment_timeout, "Segment timed out");
                    return Err(SynthesisError::Timeout(self.options.segment_timeout));
                }
                Popped::Closed => {
                    return Err(SynthesisError::Unexpected(
                        "session channel closed".to_string(),
                    ));
                }
                Popped::Interrupted => return Ok(SegmentEnd::Interrupted),
            }
        }
    }
}

/// Turn settings into engine credentials, rejecting missing or blank fields.
pub fn validate_settings(settings: Option<&Settings>) -> SynthesisResult<EngineCredentials> {
    let settings = settings.ok_or_else(|| {
        SynthesisError::InvalidSettings("engine settings are missing".to_string())
    })?;
    settings.check().map_err(SynthesisError::InvalidSettings)?;
    Ok(settings.credentials())
}
