//! Module for managing audio recording. There can only be one active capture
//! at a time; the captured clip is handed off to the caller on finish and
//! nothing is persisted here.
//!
//! Chunks flow from the cpal callback into a channel in delivery order. The
//! callback owns the only sender, so dropping the stream closes the channel
//! and draining the receiver to disconnection flushes every in-flight chunk
//! before the clip is finalized. No timed grace period is needed.

use std::io::Cursor;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Host, SampleRate, StreamConfig};
use hound::{SampleFormat, WavSpec, WavWriter};
use thiserror::Error;
use tracing::{error, info};

/// Fixed capture sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Mono capture.
pub const CHANNELS: u16 = 1;

#[derive(Debug, Error)]
pub enum RecorderError {
    /// generic anyhow error
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    /// No recording device available
    #[error("no input device available")]
    NoInputDevice,
    /// The device rejected the fixed capture configuration
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),
    /// Encoding the captured samples failed
    #[error("failed to encode clip: {0}")]
    Encode(#[from] hound::Error),
}

type Result<T> = std::result::Result<T, RecorderError>;

/// A fully materialized recording: mono samples at [`SAMPLE_RATE`], encoded
/// into an in-memory WAV container. Created only by
/// [`CaptureHandle::finish`]; consumed once by the transcription client.
#[derive(Debug, Clone)]
pub struct Clip {
    data: Vec<u8>,
    samples: usize,
}

impl Clip {
    /// Encodes a contiguous mono sample sequence into a WAV container held
    /// fully in memory.
    pub fn from_mono_samples(samples: &[f32]) -> Result<Self> {
        let spec = WavSpec {
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 4));
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        // Finalize so the container carries the proper framing information.
        writer.finalize()?;
        Ok(Self {
            data: cursor.into_inner(),
            samples: samples.len(),
        })
    }

    /// The encoded WAV bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the clip, returning the encoded WAV bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Number of captured samples.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Recorded length.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples as f64 / f64::from(SAMPLE_RATE))
    }
}

pub struct Recorder {
    host: Host,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Opens the default input device at the fixed mono/44.1 kHz
    /// configuration and starts streaming chunks into the returned handle.
    pub fn start(&self) -> Result<CaptureHandle> {
        let device = self
            .host
            .default_input_device()
            .ok_or(RecorderError::NoInputDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "<unknown>".to_owned());

        let config = StreamConfig {
            channels: CHANNELS,
            sample_rate: SampleRate(SAMPLE_RATE),
            buffer_size: BufferSize::Default,
        };

        let (chunk_tx, chunk_rx) = mpsc::channel::<Vec<f32>>();

        let err_fn = move |err| {
            error!("an error occurred on stream: {}", err);
        };

        // The callback owns the only sender; see the module docs for how
        // that drives the drain in `finish`.
        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                chunk_tx.send(data.to_vec()).ok();
            },
            err_fn,
            None,
        )?;

        stream
            .play()
            .map_err(|e| anyhow!("failed to start stream: {e}"))?;

        info!(device = %device_name, sample_rate = SAMPLE_RATE, "Recording from device");

        Ok(CaptureHandle {
            stream,
            chunks: chunk_rx,
        })
    }
}

/// Handle to the active capture. Call [`CaptureHandle::finish`] to stop the
/// stream and receive the clip; dropping the handle discards the recording.
pub struct CaptureHandle {
    stream: cpal::Stream,
    chunks: Receiver<Vec<f32>>,
}

impl CaptureHandle {
    /// Stops the stream, drains every in-flight chunk, and finalizes the
    /// clip. Chunks are concatenated in exact delivery order. Returns
    /// `Ok(None)` when no samples were ever delivered.
    pub fn finish(self) -> Result<Option<Clip>> {
        let CaptureHandle { stream, chunks } = self;
        info!("Ending recording.");
        stream.pause().ok();
        // Tears down the callback and with it the only sender, so the drain
        // below observes a disconnect once every delivered chunk is in.
        drop(stream);

        let samples = drain_chunks(&chunks);
        if samples.is_empty() {
            info!("No audio recorded.");
            return Ok(None);
        }

        let clip = Clip::from_mono_samples(&samples)?;
        info!(
            samples = clip.samples(),
            bytes = clip.data().len(),
            duration = ?clip.duration(),
            "Clip finalized"
        );
        Ok(Some(clip))
    }
}

/// Concatenates capture chunks in delivery order until the channel
/// disconnects.
fn drain_chunks(chunks: &Receiver<Vec<f32>>) -> Vec<f32> {
    let mut samples = Vec::new();
    while let Ok(chunk) = chunks.recv() {
        samples.extend_from_slice(&chunk);
    }
    samples
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn drained_chunks_preserve_delivery_order() {
        let (tx, rx) = mpsc::channel();
        for chunk in [vec![0.1f32, 0.2], vec![0.3], vec![0.4, 0.5, 0.6]] {
            tx.send(chunk).unwrap();
        }
        drop(tx);

        let samples = drain_chunks(&rx);
        assert_eq!(samples, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn drain_with_no_chunks_is_empty() {
        let (tx, rx) = mpsc::channel::<Vec<f32>>();
        drop(tx);
        assert!(drain_chunks(&rx).is_empty());
    }

    #[test]
    fn clip_encodes_mono_wav_at_fixed_rate() {
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 / 1000.0) - 0.5).collect();
        let clip = Clip::from_mono_samples(&samples).unwrap();
        assert_eq!(clip.samples(), 1000);

        let reader = hound::WavReader::new(Cursor::new(clip.data().to_vec())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, CHANNELS);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.sample_format, SampleFormat::Float);

        let decoded: Vec<f32> = reader.into_samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn clip_duration_tracks_sample_count() {
        let samples = vec![0.0f32; SAMPLE_RATE as usize / 2];
        let clip = Clip::from_mono_samples(&samples).unwrap();
        assert_eq!(clip.duration(), Duration::from_millis(500));
    }
}
