//! Volcengine online TTS over the binary WebSocket protocol.
//!
//! One WebSocket session is opened per text segment. The client sends a
//! single *full client request* frame carrying the JSON request and reads
//! *audio-only* frames until one carries a negative sequence number.
//!
//! - [`config`]: endpoint, sample rate, timeouts and prosody mapping
//! - [`messages`]: frame codec and request payload
//! - [`client`]: the [`VolcengineEngine`] session driver

mod client;
mod config;
mod messages;

pub use client::VolcengineEngine;
pub use config::{
    DEFAULT_CLUSTER, DEFAULT_ENDPOINT, DEFAULT_SAMPLE_RATE, DEFAULT_VOICE, VolcengineEngineConfig,
    pitch_ratio, speed_ratio, volume_ratio,
};
pub use messages::{
    MessageType, ProtocolError, ServerFrame, SynthesisRequest, decode_server_frame,
    encode_client_request, encode_server_audio, encode_server_error,
};
