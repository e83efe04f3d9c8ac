//! Audio output sink.
//!
//! The render loop sees the blocking [`AudioSink`] trait; [`CpalSink`]
//! is the real device binding. cpal pulls samples from a callback, so a
//! bounded channel bridges the two models: the writer blocks when the
//! channel is full, which is exactly the pacing the render loop needs,
//! and the callback fills underruns with silence.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Bounded backlog between render loop and device, in samples.
///
/// About 46 ms at 22.05 kHz; deep enough to ride out callback jitter,
/// shallow enough to keep the sidetone responsive.
const CHANNEL_CAPACITY: usize = 1024;

/// Errors from the audio output path.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("failed to query output config: {0}")]
    Config(String),
    #[error("failed to open output stream: {0}")]
    Stream(String),
    #[error("audio output stream closed")]
    Closed,
}

/// Blocking audio output.
pub trait AudioSink: Send {
    /// Write one full buffer; blocks until the device has room.
    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError>;
}

/// Owns the cpal output stream.
///
/// `cpal::Stream` is not `Send`, so the stream stays on the thread that
/// opened it while the paired [`CpalWriter`] moves into the render
/// thread. Dropping the sink tears the stream down and fails the writer.
pub struct CpalSink {
    _stream: cpal::Stream,
}

/// The writer half handed to the render loop.
pub struct CpalWriter {
    tx: Sender<i16>,
    failed: Arc<AtomicBool>,
}

impl CpalSink {
    /// Open the default output device at `sample_rate` and start the
    /// stream. Returns the sink (keep it alive) and the writer.
    pub fn open(sample_rate: u32) -> Result<(CpalSink, CpalWriter), SinkError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SinkError::NoDevice)?;
        let channels = device
            .default_output_config()
            .map_err(|e| SinkError::Config(e.to_string()))?
            .channels();

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = crossbeam_channel::bounded::<i16>(CHANNEL_CAPACITY);
        let failed = Arc::new(AtomicBool::new(false));

        let callback_failed = Arc::clone(&failed);
        let num_channels = channels as usize;
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    fill_output(data, num_channels, &rx);
                },
                move |err| {
                    tracing::error!("output stream error: {err}");
                    callback_failed.store(true, Ordering::Relaxed);
                },
                None,
            )
            .map_err(|e| SinkError::Stream(e.to_string()))?;
        stream.play().map_err(|e| SinkError::Stream(e.to_string()))?;

        tracing::info!("audio output open: {} ch @ {} Hz", channels, sample_rate);

        Ok((CpalSink { _stream: stream }, CpalWriter { tx, failed }))
    }
}

/// Pop mono samples into an interleaved frame buffer, duplicating each
/// sample across all channels; underruns become silence.
fn fill_output(data: &mut [f32], num_channels: usize, rx: &Receiver<i16>) {
    for frame in data.chunks_mut(num_channels) {
        let sample = match rx.try_recv() {
            Ok(s) => f32::from(s) / f32::from(i16::MAX),
            Err(_) => 0.0,
        };
        for out in frame.iter_mut() {
            *out = sample;
        }
    }
}

impl AudioSink for CpalWriter {
    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        for &sample in samples {
            if self.failed.load(Ordering::Relaxed) {
                return Err(SinkError::Closed);
            }
            self.tx.send(sample).map_err(|_| SinkError::Closed)?;
        }
        Ok(())
    }
}
