//! Output sink surface.
//!
//! The OS hands every request a streaming callback that accepts audio in
//! windows of bounded size. [`SynthesisCallback`] models that callback and
//! [`OutputStream`] wraps it so the call discipline holds no matter how a
//! request ends: `begin` once before any audio, windows no larger than the
//! sink allows, and exactly one terminal signal.

use thiserror::Error;
use tracing::{debug, warn};

/// Errors reported by an output sink
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Sink rejected the call: {0}")]
    Rejected(String),

    #[error("Sink I/O error: {0}")]
    Io(String),

    #[error("Audio delivered before the stream was started")]
    NotStarted,

    #[error("Output stream already terminated")]
    Closed,
}

/// PCM layout announced to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioEncoding {
    #[default]
    Pcm16,
    Pcm8,
    PcmFloat,
}

impl AudioEncoding {
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            AudioEncoding::Pcm16 => 16,
            AudioEncoding::Pcm8 => 8,
            AudioEncoding::PcmFloat => 32,
        }
    }
}

/// Streaming audio callback supplied by the OS for one request.
pub trait SynthesisCallback: Send {
    /// Largest window `deliver` accepts, in bytes.
    fn max_buffer_size(&self) -> usize;

    fn begin(&mut self, sample_rate: u32, encoding: AudioEncoding, channels: u16)
    -> Result<(), SinkError>;

    /// Accept one window of PCM, never longer than `max_buffer_size`.
    fn deliver(&mut self, window: &[u8]) -> Result<(), SinkError>;

    fn finish(&mut self) -> Result<(), SinkError>;

    fn fail(&mut self);
}

/// Guard around a [`SynthesisCallback`] enforcing begin-once and a single
/// terminal call. Dropping an unterminated stream signals failure.
pub struct OutputStream<'a> {
    sink: &'a mut dyn SynthesisCallback,
    begun: bool,
    terminated: bool,
    delivered_bytes: usize,
}

impl<'a> OutputStream<'a> {
    pub fn new(sink: &'a mut dyn SynthesisCallback) -> Self {
        Self {
            sink,
            begun: false,
            terminated: false,
            delivered_bytes: 0,
        }
    }

    pub fn is_begun(&self) -> bool {
        self.begun
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn delivered_bytes(&self) -> usize {
        self.delivered_bytes
    }

    pub fn begin(
        &mut self,
        sample_rate: u32,
        encoding: AudioEncoding,
        channels: u16,
    ) -> Result<(), SinkError> {
        if self.terminated {
            return Err(SinkError::Closed);
        }
        if self.begun {
            return Err(SinkError::Rejected("stream already started".to_string()));
        }
        self.sink.begin(sample_rate, encoding, channels)?;
        self.begun = true;
        Ok(())
    }

    /// Forward `chunk` in order, split into windows the sink accepts.
    ///
    /// Returns the number of windows delivered.
    pub fn deliver_windowed(&mut self, chunk: &[u8]) -> Result<usize, SinkError> {
        if self.terminated {
            return Err(SinkError::Closed);
        }
        if !self.begun {
            return Err(SinkError::NotStarted);
        }

        let window_size = self.sink.max_buffer_size().max(1);
        let mut windows = 0;
        for window in chunk.chunks(window_size) {
            self.sink.deliver(window)?;
            self.delivered_bytes += window.len();
            windows += 1;
        }
        Ok(windows)
    }

    /// Signal success. No-op once terminated.
    pub fn finish(&mut self) -> Result<(), SinkError> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;
        debug!(bytes = self.delivered_bytes, "Finishing output stream");
        self.sink.finish()
    }

    /// Signal failure. No-op once terminated.
    pub fn fail(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        debug!(bytes = self.delivered_bytes, "Failing output stream");
        self.sink.fail();
    }
}

impl Drop for OutputStream<'_> {
    fn drop(&mut self) {
        if !self.terminated {
            warn!("Output stream dropped without a terminal signal, failing it");
            self.fail();
        }
    }
}

/// Terminal signal observed by a [`MemorySink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Finished,
    Failed,
}

/// Sink that keeps everything in memory.
#[derive(Debug, Clone)]
pub struct MemorySink {
    max_buffer_size: usize,
    pub format: Option<(u32, AudioEncoding, u16)>,
    pub begin_calls: usize,
    pub windows: Vec<Vec<u8>>,
    pub terminations: Vec<Termination>,
}

impl MemorySink {
    pub fn new(max_buffer_size: usize) -> Self {
        Self {
            max_buffer_size,
            format: None,
            begin_calls: 0,
            windows: Vec::new(),
            terminations: Vec::new(),
        }
    }

    /// All delivered bytes, concatenated.
    pub fn audio(&self) -> Vec<u8> {
        self.windows.concat()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.terminations.last().copied()
    }
}

impl SynthesisCallback for MemorySink {
    fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    fn begin(
        &mut self,
        sample_rate: u32,
        encoding: AudioEncoding,
        channels: u16,
    ) -> Result<(), SinkError> {
        self.begin_calls += 1;
        self.format = Some((sample_rate, encoding, channels));
        Ok(())
    }

    fn deliver(&mut self, window: &[u8]) -> Result<(), SinkError> {
        if window.len() > self.max_buffer_size.max(1) {
            return Err(SinkError::Rejected(format!(
                "window of {} bytes exceeds {}",
                window.len(),
                self.max_buffer_size
            )));
        }
        self.windows.push(window.to_vec());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.terminations.push(Termination::Finished);
        Ok(())
    }

    fn fail(&mut self) {
        self.terminations.push(Termination::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_respect_max_buffer_size() {
        let mut sink = MemorySink::new(4);
        {
            let mut stream = OutputStream::new(&mut sink);
            stream.begin(24000, AudioEncoding::Pcm16, 1).unwrap();
            let windows = stream.deliver_windowed(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).unwrap();
            assert_eq!(windows, 3);
            assert_eq!(stream.delivered_bytes(), 10);
            stream.finish().unwrap();
        }
        assert_eq!(sink.windows, vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8], vec![9, 10]]);
        assert_eq!(sink.terminations, vec![Termination::Finished]);
    }

    #[test]
    fn test_zero_max_buffer_still_advances() {
        let mut sink = MemorySink::new(0);
        {
            let mut stream = OutputStream::new(&mut sink);
            stream.begin(16000, AudioEncoding::Pcm16, 1).unwrap();
            assert_eq!(stream.deliver_windowed(&[7, 8, 9]).unwrap(), 3);
            stream.finish().unwrap();
        }
        assert_eq!(sink.audio(), vec![7, 8, 9]);
    }

    #[test]
    fn test_deliver_before_begin_is_rejected() {
        let mut sink = MemorySink::new(16);
        let mut stream = OutputStream::new(&mut sink);
        assert_eq!(stream.deliver_windowed(&[1]), Err(SinkError::NotStarted));
        stream.fail();
    }

    #[test]
    fn test_begin_only_once() {
        let mut sink = MemorySink::new(16);
        {
            let mut stream = OutputStream::new(&mut sink);
            stream.begin(24000, AudioEncoding::Pcm16, 1).unwrap();
            assert!(stream.begin(24000, AudioEncoding::Pcm16, 1).is_err());
            stream.finish().unwrap();
        }
        assert_eq!(sink.begin_calls, 1);
    }

    #[test]
    fn test_single_terminal_signal() {
        let mut sink = MemorySink::new(16);
        {
            let mut stream = OutputStream::new(&mut sink);
            stream.begin(24000, AudioEncoding::Pcm16, 1).unwrap();
            stream.fail();
            stream.finish().unwrap();
            stream.fail();
            assert_eq!(stream.deliver_windowed(&[1]), Err(SinkError::Closed));
        }
        assert_eq!(sink.terminations, vec![Termination::Failed]);
    }

    #[test]
    fn test_drop_without_terminal_fails() {
        let mut sink = MemorySink::new(16);
        {
            let mut stream = OutputStream::new(&mut sink);
            stream.begin(24000, AudioEncoding::Pcm16, 1).unwrap();
        }
        assert_eq!(sink.termination(), Some(Termination::Failed));
    }

    #[test]
    fn test_bits_per_sample() {
        assert_eq!(AudioEncoding::Pcm16.bits_per_sample(), 16);
        assert_eq!(AudioEncoding::Pcm8.bits_per_sample(), 8);
        assert_eq!(AudioEncoding::PcmFloat.bits_per_sample(), 32);
    }
}
