use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use http::HeaderValue;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tracing::{debug, error, info, warn};

use super::config::VolcengineEngineConfig;
use super::messages::{ServerFrame, SynthesisRequest, decode_server_frame};
use crate::core::engine::{
    EngineCredentials, EngineError, EngineResult, SpeechParams, SynthesisEngine,
};
use crate::core::session::ChunkProducer;

/// How long `shutdown` waits for the session task before aborting it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// How a session task ended without error.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Completed,
    Cancelled,
}

/// Everything the session task needs, moved into it on spawn.
struct SessionTask {
    endpoint: String,
    access_token: String,
    frame: Vec<u8>,
    connect_timeout: Duration,
    idle_timeout: Duration,
    producer: ChunkProducer,
}

impl Drop for SessionTask {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.access_token.zeroize();
    }
}

/// Streaming engine for the Volcengine online TTS service.
pub struct VolcengineEngine {
    config: VolcengineEngineConfig,
    credentials: Option<EngineCredentials>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    session_handle: Option<JoinHandle<()>>,
}

impl VolcengineEngine {
    pub fn new(config: VolcengineEngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            credentials: None,
            shutdown_tx: None,
            session_handle: None,
        })
    }

    pub fn config(&self) -> &VolcengineEngineConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Whether a session task is still running.
    pub fn is_active(&self) -> bool {
        self.session_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for VolcengineEngine {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(handle) = self.session_handle.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl SynthesisEngine for VolcengineEngine {
    async fn configure(&mut self, credentials: EngineCredentials) -> EngineResult<()> {
        for (name, value) in [
            ("app id", &credentials.app_id),
            ("access token", &credentials.access_token),
            ("speaker id", &credentials.speaker_id),
            ("cluster", &credentials.cluster),
        ] {
            if value.trim().is_empty() {
                return Err(EngineError::InvalidConfiguration(format!(
                    "{name} must not be empty"
                )));
            }
        }

        if self.session_handle.is_some() {
            debug!("Replacing running Volcengine session on configure");
            self.shutdown().await;
        }

        debug!(
            speaker = %credentials.speaker_id,
            cluster = %credentials.cluster,
            emotional = credentials.emotional,
            "Volcengine engine configured"
        );
        self.credentials = Some(credentials);
        Ok(())
    }

    async fn start(
        &mut self,
        text: &str,
        params: &SpeechParams,
        producer: ChunkProducer,
    ) -> EngineResult<()> {
        let credentials = self.credentials.as_ref().ok_or(EngineError::NotConfigured)?;

        let request = SynthesisRequest::new(
            credentials,
            &self.config.voice,
            self.config.sample_rate,
            text,
            params,
        );
        let frame = request
            .to_frame()
            .map_err(|e| EngineError::Protocol(e.to_string()))?;
        let access_token = credentials.access_token.clone();

        if self.session_handle.is_some() {
            self.shutdown().await;
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = SessionTask {
            endpoint: self.config.endpoint.clone(),
            access_token,
            frame,
            connect_timeout: self.config.connect_timeout,
            idle_timeout: self.config.idle_timeout,
            producer,
        };

        debug!(chars = text.chars().count(), "Starting Volcengine session");
        self.shutdown_tx = Some(shutdown_tx);
        self.session_handle = Some(tokio::spawn(run_session(task, shutdown_rx)));
        Ok(())
    }

    async fn shutdown(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Some(mut handle) = self.session_handle.take() {
            if timeout(SHUTDOWN_GRACE, &mut handle).await.is_err() {
                warn!("Volcengine session did not stop in time, aborting");
                handle.abort();
            }
            debug!("Volcengine session released");
        }
    }

    fn name(&self) -> &'static str {
        "volcengine"
    }
}

/// Drive one segment and report its outcome through the producer.
async fn run_session(task: SessionTask, shutdown_rx: oneshot::Receiver<()>) {
    match stream_segment(&task, shutdown_rx).await {
        Ok(SessionEnd::Completed) => {
            debug!("Volcengine session completed");
            task.producer.mark_exhausted();
        }
        Ok(SessionEnd::Cancelled) => {
            debug!("Volcengine session cancelled");
        }
        Err(e) => {
            error!("Volcengine session failed: {}", e);
            task.producer.mark_failed(e.to_string());
            task.producer.mark_exhausted();
        }
    }
}

async fn stream_segment(
    task: &SessionTask,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> EngineResult<SessionEnd> {
    let mut request = task
        .endpoint
        .as_str()
        .into_client_request()
        .map_err(|e| EngineError::ConnectionFailed(format!("Invalid WebSocket URL: {e}")))?;
    let auth = HeaderValue::from_str(&format!("Bearer;{}", task.access_token))
        .map_err(|e| EngineError::InvalidConfiguration(format!("Invalid access token: {e}")))?;
    request.headers_mut().insert("Authorization", auth);

    let connect = timeout(task.connect_timeout, connect_async(request));
    let (ws_stream, _response) = tokio::select! {
        _ = &mut shutdown_rx => return Ok(SessionEnd::Cancelled),
        result = connect => result
            .map_err(|_| EngineError::Timeout(format!(
                "connection not established within {:?}",
                task.connect_timeout
            )))?
            .map_err(|e| EngineError::ConnectionFailed(format!(
                "Failed to connect to Volcengine: {e}"
            )))?,
    };

    info!("Connected to Volcengine TTS WebSocket");
    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    ws_sink
        .send(Message::Binary(task.frame.clone().into()))
        .await
        .map_err(|e| EngineError::ConnectionFailed(format!("Failed to send request: {e}")))?;

    let mut chunks = 0usize;
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                let _ = ws_sink.send(Message::Close(None)).await;
                return Ok(SessionEnd::Cancelled);
            }

            message = timeout(task.idle_timeout, ws_stream.next()) => {
                match message {
                    Ok(Some(Ok(Message::Binary(data)))) => {
                        let frame = decode_server_frame(&data)
                            .map_err(|e| EngineError::Protocol(e.to_string()))?;
                        match frame {
                            ServerFrame::Ack => debug!("Volcengine request acknowledged"),
                            ServerFrame::Audio { sequence, data } => {
                                chunks += 1;
                                debug!(sequence, bytes = data.len(), "Audio frame received");
                                task.producer.push(data);
                                if sequence < 0 {
                                    info!(chunks, "Final audio frame received");
                                    let _ = ws_sink.send(Message::Close(None)).await;
                                    return Ok(SessionEnd::Completed);
                                }
                            }
                            ServerFrame::Error { code, message } => {
                                return Err(EngineError::Provider { code, message });
                            }
                            ServerFrame::Response(body) => {
                                debug!(body = %body, "Volcengine response frame");
                            }
                        }
                    }
                    Ok(Some(Ok(Message::Ping(payload)))) => {
                        if let Err(e) = ws_sink.send(Message::Pong(payload)).await {
                            warn!("Failed to answer ping: {}", e);
                        }
                    }
                    Ok(Some(Ok(Message::Text(text)))) => {
                        debug!(text = %text.as_str(), "Unexpected text frame from Volcengine");
                    }
                    Ok(Some(Ok(Message::Close(frame)))) => {
                        return Err(EngineError::Protocol(format!(
                            "connection closed before the final audio frame: {frame:?}"
                        )));
                    }
                    Ok(Some(Ok(_))) => {}
                    Ok(Some(Err(e))) => {
                        return Err(EngineError::ConnectionFailed(format!("WebSocket error: {e}")));
                    }
                    Ok(None) => {
                        return Err(EngineError::ConnectionFailed(
                            "WebSocket stream ended before the final audio frame".to_string(),
                        ));
                    }
                    Err(_) => {
                        return Err(EngineError::Timeout(format!(
                            "no frame received for {:?}",
                            task.idle_timeout
                        )));
                    }
                }
            }
        }
    }
}
