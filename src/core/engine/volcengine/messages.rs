//! Binary frame codec and request payload for the Volcengine TTS protocol.
//!
//! Every frame starts with a 4-byte header:
//!
//! | byte | high nibble      | low nibble          |
//! |------|------------------|---------------------|
//! | 0    | protocol version | header size (words) |
//! | 1    | message type     | type-specific flags |
//! | 2    | serialization    | compression         |
//! | 3    | reserved         | reserved            |
//!
//! followed by optional header extensions and a type-specific body.

use bytes::Bytes;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::config::{pitch_ratio, speed_ratio, volume_ratio};
use crate::core::engine::{EngineCredentials, SpeechParams};

const PROTOCOL_VERSION: u8 = 0b0001;
const HEADER_WORDS: u8 = 0b0001;
const SERIALIZATION_NONE: u8 = 0b0000;
const SERIALIZATION_JSON: u8 = 0b0001;
const COMPRESSION_NONE: u8 = 0b0000;

/// Flag on audio-only responses that carry a sequence number.
const FLAG_WITH_SEQUENCE: u8 = 0b0001;
/// Flag on the last audio-only response.
const FLAG_LAST_WITH_SEQUENCE: u8 = 0b0011;

/// Errors decoding server frames
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Frame truncated")]
    Truncated,

    #[error("Unsupported message type {0:#x}")]
    UnsupportedMessageType(u8),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    FullClientRequest = 0x1,
    FullServerResponse = 0x9,
    AudioOnlyResponse = 0xB,
    Error = 0xF,
}

impl MessageType {
    fn from_nibble(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0x1 => Ok(Self::FullClientRequest),
            0x9 => Ok(Self::FullServerResponse),
            0xB => Ok(Self::AudioOnlyResponse),
            0xF => Ok(Self::Error),
            other => Err(ProtocolError::UnsupportedMessageType(other)),
        }
    }
}

/// A decoded server frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// Acknowledgement without audio.
    Ack,
    /// PCM payload. A negative sequence marks the final frame.
    Audio { sequence: i32, data: Bytes },
    /// Service-side failure.
    Error { code: u32, message: String },
    /// JSON response, passed through as text.
    Response(String),
}

impl ServerFrame {
    pub fn is_last(&self) -> bool {
        matches!(self, ServerFrame::Audio { sequence, .. } if *sequence < 0)
    }
}

fn header(message_type: MessageType, flags: u8, serialization: u8) -> [u8; 4] {
    [
        (PROTOCOL_VERSION << 4) | HEADER_WORDS,
        ((message_type as u8) << 4) | (flags & 0x0F),
        (serialization << 4) | COMPRESSION_NONE,
        0x00,
    ]
}

/// Wrap a JSON request into a full client request frame.
pub fn encode_client_request(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(8 + payload.len());
    frame.extend_from_slice(&header(MessageType::FullClientRequest, 0, SERIALIZATION_JSON));
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Build an audio-only server frame. Used by local test servers.
pub fn encode_server_audio(sequence: i32, pcm: &[u8]) -> Vec<u8> {
    let flags = if sequence < 0 {
        FLAG_LAST_WITH_SEQUENCE
    } else {
        FLAG_WITH_SEQUENCE
    };
    let mut frame = Vec::with_capacity(12 + pcm.len());
    frame.extend_from_slice(&header(MessageType::AudioOnlyResponse, flags, SERIALIZATION_NONE));
    frame.extend_from_slice(&sequence.to_be_bytes());
    frame.extend_from_slice(&(pcm.len() as u32).to_be_bytes());
    frame.extend_from_slice(pcm);
    frame
}

/// Build an error server frame. Used by local test servers.
pub fn encode_server_error(code: u32, message: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(12 + message.len());
    frame.extend_from_slice(&header(MessageType::Error, 0, SERIALIZATION_JSON));
    frame.extend_from_slice(&code.to_be_bytes());
    frame.extend_from_slice(&(message.len() as u32).to_be_bytes());
    frame.extend_from_slice(message.as_bytes());
    frame
}

fn read_u32(data: &[u8], at: usize) -> Result<u32, ProtocolError> {
    data.get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or(ProtocolError::Truncated)
}

fn read_body(data: &[u8], at: usize, len: u32) -> Result<&[u8], ProtocolError> {
    let end = at
        .checked_add(len as usize)
        .ok_or(ProtocolError::Truncated)?;
    data.get(at..end).ok_or(ProtocolError::Truncated)
}

/// Decode one binary frame received from the service.
pub fn decode_server_frame(data: &[u8]) -> Result<ServerFrame, ProtocolError> {
    if data.len() < 4 {
        return Err(ProtocolError::Truncated);
    }

    let header_len = (data[0] & 0x0F) as usize * 4;
    if header_len < 4 || data.len() < header_len {
        return Err(ProtocolError::Truncated);
    }

    let message_type = MessageType::from_nibble(data[1] >> 4)?;
    let flags = data[1] & 0x0F;
    let body = header_len;

    match message_type {
        MessageType::AudioOnlyResponse => {
            if flags == 0 {
                return Ok(ServerFrame::Ack);
            }
            let sequence = read_u32(data, body)? as i32;
            let size = read_u32(data, body + 4)?;
            let pcm = read_body(data, body + 8, size)?;
            Ok(ServerFrame::Audio {
                sequence,
                data: Bytes::copy_from_slice(pcm),
            })
        }
        MessageType::Error => {
            let code = read_u32(data, body)?;
            let size = read_u32(data, body + 4)?;
            let message = read_body(data, body + 8, size)?;
            Ok(ServerFrame::Error {
                code,
                message: String::from_utf8_lossy(message).into_owned(),
            })
        }
        MessageType::FullServerResponse => {
            let size = read_u32(data, body)?;
            let payload = read_body(data, body + 4, size)?;
            Ok(ServerFrame::Response(
                String::from_utf8_lossy(payload).into_owned(),
            ))
        }
        MessageType::FullClientRequest => Err(ProtocolError::UnsupportedMessageType(0x1)),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppSection {
    pub appid: String,
    pub token: String,
    pub cluster: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSection {
    pub uid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioSection {
    pub voice_type: String,
    pub voice: String,
    pub encoding: String,
    pub rate: u32,
    pub speed_ratio: f32,
    pub volume_ratio: f32,
    pub pitch_ratio: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestSection {
    pub reqid: String,
    pub text: String,
    pub text_type: String,
    pub operation: String,
    pub with_intent: bool,
}

/// JSON body of a synthesis request.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisRequest {
    pub app: AppSection,
    pub user: UserSection,
    pub audio: AudioSection,
    pub request: RequestSection,
}

impl SynthesisRequest {
    pub fn new(
        credentials: &EngineCredentials,
        voice: &str,
        sample_rate: u32,
        text: &str,
        params: &SpeechParams,
    ) -> Self {
        Self {
            app: AppSection {
                appid: credentials.app_id.clone(),
                token: credentials.access_token.clone(),
                cluster: credentials.cluster.clone(),
            },
            user: UserSection {
                uid: user_id(&credentials.access_token),
            },
            audio: AudioSection {
                voice_type: credentials.speaker_id.clone(),
                voice: voice.to_string(),
                encoding: "pcm".to_string(),
                rate: sample_rate,
                speed_ratio: speed_ratio(params.speech_rate),
                volume_ratio: volume_ratio(params.volume),
                pitch_ratio: pitch_ratio(params.pitch),
            },
            request: RequestSection {
                reqid: uuid::Uuid::new_v4().to_string(),
                text: text.to_string(),
                text_type: "plain".to_string(),
                operation: "submit".to_string(),
                with_intent: credentials.emotional,
            },
        }
    }

    pub fn to_frame(&self) -> Result<Vec<u8>, ProtocolError> {
        let payload =
            serde_json::to_vec(self).map_err(|e| ProtocolError::InvalidPayload(e.to_string()))?;
        Ok(encode_client_request(&payload))
    }
}

impl Drop for SynthesisRequest {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.app.token.zeroize();
    }
}

/// Stable user id derived from the access token.
pub fn user_id(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> EngineCredentials {
        EngineCredentials {
            app_id: "app-1".into(),
            access_token: "tok".into(),
            speaker_id: "BV700_streaming".into(),
            cluster: "volcano_tts".into(),
            emotional: true,
        }
    }

    #[test]
    fn test_client_request_header_and_length() {
        let frame = encode_client_request(b"{\"a\":1}");
        assert_eq!(&frame[..4], &[0x11, 0x10, 0x10, 0x00]);
        assert_eq!(u32::from_be_bytes(frame[4..8].try_into().unwrap()), 7);
        assert_eq!(&frame[8..], b"{\"a\":1}");
    }

    #[test]
    fn test_decode_audio_frame() {
        let frame = encode_server_audio(3, &[1, 2, 3, 4]);
        let decoded = decode_server_frame(&frame).unwrap();
        assert_eq!(
            decoded,
            ServerFrame::Audio {
                sequence: 3,
                data: Bytes::from_static(&[1, 2, 3, 4])
            }
        );
        assert!(!decoded.is_last());
    }

    #[test]
    fn test_decode_last_audio_frame() {
        let frame = encode_server_audio(-4, &[9, 9]);
        assert!(decode_server_frame(&frame).unwrap().is_last());
    }

    #[test]
    fn test_decode_ack() {
        let frame = [0x11, 0xB0, 0x00, 0x00];
        assert_eq!(decode_server_frame(&frame).unwrap(), ServerFrame::Ack);
    }

    #[test]
    fn test_decode_error_frame() {
        let frame = encode_server_error(3011, "invalid text");
        assert_eq!(
            decode_server_frame(&frame).unwrap(),
            ServerFrame::Error {
                code: 3011,
                message: "invalid text".into()
            }
        );
    }

    #[test]
    fn test_decode_full_server_response() {
        let mut frame = vec![0x11, 0x90, 0x10, 0x00];
        frame.extend_from_slice(&2u32.to_be_bytes());
        frame.extend_from_slice(b"{}");
        assert_eq!(
            decode_server_frame(&frame).unwrap(),
            ServerFrame::Response("{}".into())
        );
    }

    #[test]
    fn test_decode_honours_header_extensions() {
        // Two header words: four bytes of extension before the body.
        let mut frame = vec![0x12, 0xB1, 0x00, 0x00, 0xAA, 0xAA, 0xAA, 0xAA];
        frame.extend_from_slice(&1i32.to_be_bytes());
        frame.extend_from_slice(&1u32.to_be_bytes());
        frame.push(0x42);
        assert_eq!(
            decode_server_frame(&frame).unwrap(),
            ServerFrame::Audio {
                sequence: 1,
                data: Bytes::from_static(&[0x42])
            }
        );
    }

    #[test]
    fn test_decode_rejects_truncated_frames() {
        assert_eq!(decode_server_frame(&[0x11]), Err(ProtocolError::Truncated));

        let mut frame = encode_server_audio(1, &[1, 2, 3, 4]);
        frame.truncate(frame.len() - 1);
        assert_eq!(decode_server_frame(&frame), Err(ProtocolError::Truncated));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        assert_eq!(
            decode_server_frame(&[0x11, 0x50, 0x00, 0x00]),
            Err(ProtocolError::UnsupportedMessageType(0x5))
        );
    }

    #[test]
    fn test_request_payload_fields() {
        let params = SpeechParams::new(200, 50);
        let request = SynthesisRequest::new(&credentials(), "other", 24000, "你好", &params);
        let json: serde_json::Value =
            serde_json::to_value(&request).unwrap();

        assert_eq!(json["app"]["appid"], "app-1");
        assert_eq!(json["app"]["cluster"], "volcano_tts");
        assert_eq!(json["audio"]["voice_type"], "BV700_streaming");
        assert_eq!(json["audio"]["encoding"], "pcm");
        assert_eq!(json["audio"]["rate"], 24000);
        assert_eq!(json["audio"]["speed_ratio"], 2.0);
        assert_eq!(json["audio"]["pitch_ratio"], 0.5);
        assert_eq!(json["audio"]["volume_ratio"], 1.0);
        assert_eq!(json["request"]["text"], "你好");
        assert_eq!(json["request"]["operation"], "submit");
        assert_eq!(json["request"]["with_intent"], true);
        assert_eq!(json["user"]["uid"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let params = SpeechParams::default();
        let a = SynthesisRequest::new(&credentials(), "other", 24000, "a", &params);
        let b = SynthesisRequest::new(&credentials(), "other", 24000, "a", &params);
        assert_ne!(a.request.reqid, b.request.reqid);
    }

    #[test]
    fn test_user_id_is_stable() {
        assert_eq!(user_id("tok"), user_id("tok"));
        assert_ne!(user_id("tok"), user_id("other"));
    }
}
