//! Sidetone synthesis.
//!
//! Four waveform buffers (silence, attack, sustain, decay) are computed
//! once at startup; the render loop then does nothing but pick one of
//! them per iteration and write it to the audio sink. The blocking sink
//! write is the loop's only pacing.

pub mod engine;
pub mod envelope;
pub mod sink;
pub mod waveform;

pub use engine::ToneEngine;
pub use envelope::EnvelopeState;
pub use sink::{AudioSink, CpalSink, CpalWriter, SinkError};
pub use waveform::WaveformSet;
