//! Envelope state machine.
//!
//! The buffer emitted each iteration depends on the buffer emitted
//! before it, not just on the current key state. Every activation passes
//! through exactly one attack ramp and every release through exactly one
//! decay ramp, however often the key flips between buffer boundaries.

/// Which waveform buffer the render loop last emitted.
///
/// Legal successions are `Silence → Attack → Sustain → Decay → Silence`,
/// with `Sustain` and `Silence` holding while the key state is steady,
/// and `Attack ↔ Decay` reversals when the key flips mid-ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Silence,
    Attack,
    Sustain,
    Decay,
}

impl EnvelopeState {
    /// Advance by one rendered buffer.
    ///
    /// Pure transition function: the returned state is both the new
    /// envelope state and the buffer to emit for this iteration.
    #[must_use]
    pub fn advance(self, should_play: bool) -> Self {
        match (self, should_play) {
            (Self::Silence | Self::Decay, true) => Self::Attack,
            (Self::Attack | Self::Sustain, true) => Self::Sustain,
            (Self::Attack | Self::Sustain, false) => Self::Decay,
            (Self::Silence | Self::Decay, false) => Self::Silence,
        }
    }
}
