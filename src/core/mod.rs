pub mod engine;
pub mod language;
pub mod orchestrator;
pub mod segmenter;
pub mod session;
pub mod sink;

// Re-export commonly used types for convenience
pub use engine::{
    EngineCredentials, EngineError, EngineResult, SpeechParams, SynthesisEngine, VolcengineEngine,
    VolcengineEngineConfig,
};
pub use language::{Language, LanguageAvailability, match_locale, sample_text};
pub use orchestrator::{
    Orchestrator, SynthesisError, SynthesisOptions, SynthesisOutcome, SynthesisResult, TtsRequest,
};
pub use segmenter::segment;
pub use session::{ChunkProducer, Popped, SessionContext};
pub use sink::{AudioEncoding, MemorySink, OutputStream, SinkError, SynthesisCallback, Termination};
