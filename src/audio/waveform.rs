//! Waveform precomputation.
//!
//! One buffer holds a whole number of sine cycles lasting close to
//! 10 ms, so consecutive sustain buffers join phase-continuously and the
//! attack/decay ramps span a full buffer. The rendered frequency is
//! renormalized after rounding the sample count, keeping the buffer
//! boundary at a zero crossing.

use std::f64::consts::TAU;

use crate::audio::envelope::EnvelopeState;

/// Target duration of one buffer, in seconds.
const BUFFER_SECONDS: f64 = 0.010;

/// Whether a requested sidetone frequency can be rendered.
///
/// Anything below 20 Hz or above the Nyquist limit for `sample_rate`
/// falls back to the default tone (with a warning) at startup.
pub fn tone_in_range(tone_hz: u32, sample_rate: u32) -> bool {
    tone_hz >= 20 && tone_hz <= sample_rate / 2
}

/// The four immutable sample buffers the render loop cycles through.
#[derive(Debug, Clone)]
pub struct WaveformSet {
    s_len: usize,
    rendered_hz: f64,
    silence: Vec<i16>,
    attack: Vec<i16>,
    sustain: Vec<i16>,
    decay: Vec<i16>,
}

impl WaveformSet {
    /// Precompute the buffers for a sidetone at `tone_hz`.
    ///
    /// `tone_hz` must already be validated with [`tone_in_range`].
    pub fn new(tone_hz: u32, sample_rate: u32) -> Self {
        let period = 1.0 / f64::from(tone_hz);
        let cycles = (BUFFER_SECONDS / period).round().max(1.0);
        let s_len = (f64::from(sample_rate) * period * cycles).round() as usize;
        // Compensate for the integer sample count: render the frequency
        // that fits exactly `cycles` cycles into `s_len` samples.
        let rendered_hz = f64::from(sample_rate) * cycles / s_len as f64;

        let sustain: Vec<i16> = (0..s_len)
            .map(|i| {
                let phase = TAU * rendered_hz * i as f64 / f64::from(sample_rate);
                (phase.sin() * f64::from(i16::MAX)).round() as i16
            })
            .collect();

        let mut attack = Vec::with_capacity(s_len);
        let mut decay = Vec::with_capacity(s_len);
        for (i, &s) in sustain.iter().enumerate() {
            let ramp = i as f64 / s_len as f64;
            let up = (f64::from(s) * ramp).round() as i16;
            attack.push(up);
            // Complement of the attack ramp, so attack + decay == sustain
            // sample for sample.
            decay.push(s - up);
        }

        Self {
            s_len,
            rendered_hz,
            silence: vec![0; s_len],
            attack,
            sustain,
            decay,
        }
    }

    /// Samples per buffer.
    pub fn len(&self) -> usize {
        self.s_len
    }

    pub fn is_empty(&self) -> bool {
        self.s_len == 0
    }

    /// The frequency actually rendered, after sample-count rounding.
    pub fn rendered_hz(&self) -> f64 {
        self.rendered_hz
    }

    /// The buffer to emit for an envelope state.
    pub fn buffer(&self, state: EnvelopeState) -> &[i16] {
        match state {
            EnvelopeState::Silence => &self.silence,
            EnvelopeState::Attack => &self.attack,
            EnvelopeState::Sustain => &self.sustain,
            EnvelopeState::Decay => &self.decay,
        }
    }
}
