//! In-process stand-in for the Volcengine binary TTS WebSocket.
//!
//! Each accepted connection consumes the next scripted [`Reply`]; once the
//! script runs out the last reply is reused. Requests and `Authorization`
//! headers are recorded for assertions.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use volc_tts_bridge::core::engine::volcengine::{encode_server_audio, encode_server_error};

type MockResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// What the server does after reading the client request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Stream the chunks; the last one carries a negative sequence.
    Audio(Vec<Vec<u8>>),
    /// Answer with an error frame.
    Error { code: u32, message: String },
    /// Stream the chunks, then close without a final frame.
    CloseEarly(Vec<Vec<u8>>),
    /// Stream the chunks, then go quiet until the client leaves.
    Stall(Vec<Vec<u8>>),
}

#[derive(Debug, Default)]
pub struct MockState {
    pub requests: Vec<Value>,
    pub auth_headers: Vec<String>,
}

pub struct MockVolcengine {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    handle: JoinHandle<()>,
}

impl MockVolcengine {
    pub async fn start(replies: Vec<Reply>) -> Self {
        assert!(!replies.is_empty(), "mock needs at least one reply");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(MockState::default()));

        let accept_state = state.clone();
        let handle = tokio::spawn(async move {
            let mut index = 0usize;
            while let Ok((stream, _)) = listener.accept().await {
                let reply = replies
                    .get(index)
                    .or_else(|| replies.last())
                    .cloned()
                    .unwrap();
                index += 1;
                let state = accept_state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state, reply).await {
                        eprintln!("mock volcengine connection error: {e}");
                    }
                });
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("ws://{}/api/v1/tts/ws_binary", self.addr)
    }

    pub fn requests(&self) -> Vec<Value> {
        self.state.lock().requests.clone()
    }

    /// Text of every request received, in arrival order.
    pub fn texts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r["request"]["text"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn auth_headers(&self) -> Vec<String> {
        self.state.lock().auth_headers.clone()
    }
}

impl Drop for MockVolcengine {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Pull the JSON body out of a full client request frame.
fn parse_client_request(data: &[u8]) -> Option<Value> {
    let header_len = usize::from(data.first()? & 0x0F) * 4;
    let size_bytes: [u8; 4] = data.get(header_len..header_len + 4)?.try_into().ok()?;
    let size = u32::from_be_bytes(size_bytes) as usize;
    let body = data.get(header_len + 4..header_len + 4 + size)?;
    serde_json::from_slice(body).ok()
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<Mutex<MockState>>,
    reply: Reply,
) -> MockResult {
    let header_state = state.clone();
    let ws_stream = accept_hdr_async(
        stream,
        move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            if let Some(auth) = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
            {
                header_state.lock().auth_headers.push(auth.to_string());
            }
            Ok(resp)
        },
    )
    .await?;
    let (mut write, mut read) = ws_stream.split();

    // The first binary frame is the synthesis request.
    loop {
        match read.next().await {
            Some(Ok(Message::Binary(data))) => {
                let request = parse_client_request(&data).ok_or("malformed client request")?;
                state.lock().requests.push(request);
                break;
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => return Ok(()),
        }
    }

    match reply {
        Reply::Audio(chunks) => {
            let total = chunks.len().max(1);
            for i in 0..total {
                let sequence = (i + 1) as i32;
                let sequence = if i + 1 == total { -sequence } else { sequence };
                let pcm = chunks.get(i).cloned().unwrap_or_default();
                write
                    .send(Message::Binary(encode_server_audio(sequence, &pcm).into()))
                    .await?;
            }
        }
        Reply::Error { code, message } => {
            write
                .send(Message::Binary(encode_server_error(code, &message).into()))
                .await?;
        }
        Reply::CloseEarly(chunks) => {
            for (i, pcm) in chunks.iter().enumerate() {
                write
                    .send(Message::Binary(encode_server_audio(i as i32 + 1, pcm).into()))
                    .await?;
            }
            write.send(Message::Close(None)).await?;
        }
        Reply::Stall(chunks) => {
            for (i, pcm) in chunks.iter().enumerate() {
                write
                    .send(Message::Binary(encode_server_audio(i as i32 + 1, pcm).into()))
                    .await?;
            }
        }
    }

    // Wait for the client to hang up.
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
    Ok(())
}
