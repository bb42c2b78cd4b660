//! WAV file output sink backed by `hound`.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{info, warn};

use crate::core::sink::{AudioEncoding, SinkError, SynthesisCallback};

/// Window size advertised by [`WavFileSink`].
pub const WAV_SINK_BUFFER_SIZE: usize = 8192;

/// Writes 16-bit little-endian PCM into a WAV file.
///
/// The file is created on `begin` and finalized on either terminal signal,
/// so audio received before a failure is kept.
pub struct WavFileSink {
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
    pending: Option<u8>,
    samples: u64,
    failed: bool,
}

impl WavFileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: None,
            pending: None,
            samples: 0,
            failed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn samples_written(&self) -> u64 {
        self.samples
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.pending.take().is_some() {
            warn!("Dropping trailing odd byte from PCM stream");
        }
        match self.writer.take() {
            Some(writer) => writer
                .finalize()
                .map_err(|e| SinkError::Io(format!("Failed to finalize WAV file: {e}"))),
            None => Ok(()),
        }
    }
}

impl SynthesisCallback for WavFileSink {
    fn max_buffer_size(&self) -> usize {
        WAV_SINK_BUFFER_SIZE
    }

    fn begin(
        &mut self,
        sample_rate: u32,
        encoding: AudioEncoding,
        channels: u16,
    ) -> Result<(), SinkError> {
        if encoding != AudioEncoding::Pcm16 {
            return Err(SinkError::Rejected(format!(
                "WAV sink only supports 16-bit PCM, got {encoding:?}"
            )));
        }

        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: encoding.bits_per_sample(),
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(&self.path, spec).map_err(|e| {
            SinkError::Io(format!("Failed to create {}: {e}", self.path.display()))
        })?;
        self.writer = Some(writer);
        Ok(())
    }

    fn deliver(&mut self, window: &[u8]) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::NotStarted)?;

        let mut bytes = window;
        if let Some(low) = self.pending.take() {
            let Some((&high, rest)) = bytes.split_first() else {
                self.pending = Some(low);
                return Ok(());
            };
            writer
                .write_sample(i16::from_le_bytes([low, high]))
                .map_err(|e| SinkError::Io(e.to_string()))?;
            self.samples += 1;
            bytes = rest;
        }

        let mut pairs = bytes.chunks_exact(2);
        for pair in &mut pairs {
            writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(|e| SinkError::Io(e.to_string()))?;
            self.samples += 1;
        }
        if let [odd] = pairs.remainder() {
            self.pending = Some(*odd);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.close()?;
        info!(path = %self.path.display(), samples = self.samples, "WAV file written");
        Ok(())
    }

    fn fail(&mut self) {
        self.failed = true;
        if let Err(e) = self.close() {
            warn!("{}", e);
        }
    }
}
