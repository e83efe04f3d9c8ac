//! Netkey - networked CW key-line relay with local sidetone
//!
//! This library relays the on/off state of a hardware keying line (a
//! serial-modem status signal driven by a CW key contact) across a
//! point-to-point UDP link, reproducing the key state at the remote peer
//! while rendering an audible sidetone for the local operator.
//!
//! Two long-lived tasks cooperate through a single shared boolean:
//! - the control loop polls the key line, exchanges timestamped 4-byte
//!   transition messages with the peer, and schedules remote key changes;
//! - the render loop continuously feeds the audio sink with one of four
//!   precomputed waveform buffers, shaping every tone edge through an
//!   attack/decay ramp so the sidetone never clicks.

pub mod audio;
pub mod control;
pub mod key;
pub mod net;

pub use audio::engine::ToneEngine;
pub use audio::envelope::EnvelopeState;
pub use audio::sink::AudioSink;
pub use audio::waveform::WaveformSet;
pub use control::{ControlLoop, RemoteSyncScheduler};
pub use key::line::HardwareLine;
pub use key::monitor::LocalKeyMonitor;
pub use key::state::KeyState;
pub use net::loss::LossDetector;
pub use net::message::{MessageKind, TransitionMessage};
pub use net::socket::DatagramSocket;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render sample rate in Hz (mono, 16-bit)
pub const SAMPLE_RATE: u32 = 22_050;

/// Sidetone frequency used when the requested tone is out of range
pub const DEFAULT_TONE_HZ: u32 = 800;
