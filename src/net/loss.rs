//! Datagram loss accounting.

/// Tracks the inbound sequence byte and reports gaps.
///
/// Loss is purely informational: a gap is reported once and processing
/// continues with whatever arrived. The counter starts at zero, like the
/// peer's sender, so the very first datagram of a session reports a gap
/// only if messages were already lost.
#[derive(Debug, Default)]
pub struct LossDetector {
    last_seen: u8,
}

impl LossDetector {
    pub fn new() -> Self {
        Self { last_seen: 0 }
    }

    /// Record an inbound sequence byte.
    ///
    /// Returns how many messages were skipped since the previous one
    /// (mod 256), `0` when the stream is intact.
    pub fn observe(&mut self, sequence: u8) -> u8 {
        let missed = sequence.wrapping_sub(self.last_seen).wrapping_sub(1);
        self.last_seen = sequence;
        missed
    }
}
