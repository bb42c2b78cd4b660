//! Per-request synthesis session state.
//!
//! A [`SessionContext`] connects one asynchronous producer (the engine's
//! network task) to one consumer (the orchestrator's drain loop). Audio
//! chunks and terminal signals travel through a single unbounded channel so
//! they reach the consumer in exactly the order the producer emitted them;
//! the flags behind the lock mirror those signals for direct inspection.
//!
//! Every segment runs under a new *generation*. [`SessionContext::reset`]
//! bumps it, and anything tagged with an older generation is dropped on both
//! sides of the channel.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// What the producer sent.
#[derive(Debug)]
enum Signal {
    Audio(Bytes),
    Exhausted,
    Failed,
}

#[derive(Debug)]
struct Envelope {
    generation: u64,
    signal: Signal,
}

#[derive(Debug, Default)]
struct SessionState {
    generation: u64,
    exhausted: bool,
    failure: Option<String>,
}

#[derive(Debug)]
struct Shared {
    tx: Mutex<Option<mpsc::UnboundedSender<Envelope>>>,
    state: Mutex<SessionState>,
    interrupt: CancellationToken,
}

impl Shared {
    fn send(&self, generation: u64, signal: Signal) -> bool {
        match self.tx.lock().as_ref() {
            Some(tx) => tx.send(Envelope { generation, signal }).is_ok(),
            None => false,
        }
    }
}

/// Result of waiting on the chunk channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popped {
    /// Next audio chunk of the current segment.
    Chunk(Bytes),
    /// The producer finished the current segment.
    Exhausted,
    /// The producer reported an engine failure.
    Failed(String),
    /// The deadline passed with nothing to deliver.
    Timeout,
    /// The context was closed.
    Closed,
    /// The request was interrupted.
    Interrupted,
}

/// Shared state for one synthesis request, reused across its segments.
#[derive(Debug)]
pub struct SessionContext {
    shared: Arc<Shared>,
    rx: AsyncMutex<mpsc::UnboundedReceiver<Envelope>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self::with_interrupt(CancellationToken::new())
    }

    /// Create a context whose interruption is driven by an external token.
    pub fn with_interrupt(interrupt: CancellationToken) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                tx: Mutex::new(Some(tx)),
                state: Mutex::new(SessionState::default()),
                interrupt,
            }),
            rx: AsyncMutex::new(rx),
        }
    }

    /// Producer handle pinned to the current segment.
    pub fn producer(&self) -> ChunkProducer {
        ChunkProducer {
            shared: self.shared.clone(),
            generation: self.generation(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.shared.state.lock().generation
    }

    /// Prepare for the next segment: clear the flags, retire outstanding
    /// producers and discard any chunks they left behind.
    pub async fn reset(&self) {
        let generation = {
            let mut state = self.shared.state.lock();
            state.generation += 1;
            state.exhausted = false;
            state.failure = None;
            state.generation
        };

        let mut rx = self.rx.lock().await;
        let mut discarded = 0usize;
        while rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(generation, discarded, "Discarded stale session signals");
        }
    }

    pub fn push(&self, chunk: Bytes) -> bool {
        self.producer().push(chunk)
    }

    pub fn mark_exhausted(&self) {
        self.producer().mark_exhausted();
    }

    pub fn mark_failed(&self, message: impl Into<String>) {
        self.producer().mark_failed(message);
    }

    pub fn is_exhausted(&self) -> bool {
        self.shared.state.lock().exhausted
    }

    pub fn is_failed(&self) -> bool {
        self.shared.state.lock().failure.is_some()
    }

    pub fn failure_message(&self) -> Option<String> {
        self.shared.state.lock().failure.clone()
    }

    /// Wait up to `timeout` for the next signal of the current segment.
    pub async fn pop(&self, timeout: Duration) -> Popped {
        self.pop_until(Instant::now() + timeout).await
    }

    /// Wait until `deadline` for the next signal of the current segment.
    ///
    /// Interruption wins over anything queued.
    pub async fn pop_until(&self, deadline: Instant) -> Popped {
        let mut rx = self.rx.lock().await;
        loop {
            let envelope = tokio::select! {
                biased;
                _ = self.shared.interrupt.cancelled() => return Popped::Interrupted,
                received = tokio::time::timeout_at(deadline, rx.recv()) => match received {
                    Err(_) => return Popped::Timeout,
                    Ok(None) => return Popped::Closed,
                    Ok(Some(envelope)) => envelope,
                },
            };

            let state = self.shared.state.lock();
            if envelope.generation != state.generation {
                trace!(
                    stale = envelope.generation,
                    current = state.generation,
                    "Dropping signal from a previous segment"
                );
                continue;
            }

            return match envelope.signal {
                Signal::Audio(chunk) => Popped::Chunk(chunk),
                Signal::Exhausted => Popped::Exhausted,
                Signal::Failed => Popped::Failed(state.failure.clone().unwrap_or_default()),
            };
        }
    }

    /// Request early termination. Sticky for the rest of the request.
    pub fn interrupt(&self) {
        self.shared.interrupt.cancel();
    }

    pub fn is_interrupted(&self) -> bool {
        self.shared.interrupt.is_cancelled()
    }

    /// Token that interrupts this context when cancelled.
    pub fn interrupt_handle(&self) -> CancellationToken {
        self.shared.interrupt.clone()
    }

    /// Resolves once the request is interrupted.
    pub async fn interrupted(&self) {
        self.shared.interrupt.cancelled().await;
    }

    /// Stop accepting producer writes. Pending signals stay readable.
    pub fn close(&self) {
        self.shared.tx.lock().take();
    }
}

/// Write side of a [`SessionContext`], handed to the engine for one segment.
///
/// Writes are ignored once the segment it was created for has been reset
/// or the request was interrupted.
#[derive(Debug, Clone)]
pub struct ChunkProducer {
    shared: Arc<Shared>,
    generation: u64,
}

impl ChunkProducer {
    /// Whether writes from this handle still reach the consumer.
    pub fn is_current(&self) -> bool {
        !self.shared.interrupt.is_cancelled()
            && self.shared.state.lock().generation == self.generation
    }

    /// Queue an audio chunk. Empty chunks are skipped.
    pub fn push(&self, chunk: Bytes) -> bool {
        if chunk.is_empty() || !self.is_current() {
            return false;
        }
        self.shared.send(self.generation, Signal::Audio(chunk))
    }

    /// Signal that no more chunks follow for this segment.
    pub fn mark_exhausted(&self) {
        if self.shared.interrupt.is_cancelled() {
            return;
        }
        {
            let mut state = self.shared.state.lock();
            if state.generation != self.generation || state.exhausted {
                return;
            }
            state.exhausted = true;
        }
        self.shared.send(self.generation, Signal::Exhausted);
    }

    /// Record an engine failure for this segment.
    pub fn mark_failed(&self, message: impl Into<String>) {
        if self.shared.interrupt.is_cancelled() {
            return;
        }
        {
            let mut state = self.shared.state.lock();
            if state.generation != self.generation || state.failure.is_some() {
                return;
            }
            state.failure = Some(message.into());
        }
        self.shared.send(self.generation, Signal::Failed);
    }
}
