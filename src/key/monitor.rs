//! Local key edge detection.
//!
//! Turns a polled line state into outbound transition messages carrying
//! the elapsed time since the previous local edge, so the peer can
//! replay the transition with the same spacing.

use std::time::{Duration, Instant};

use crate::net::message::{MessageKind, SequenceCounter, TransitionMessage};

/// Longest elapsed time carried in a message.
///
/// Gaps beyond this (or a clock that went backward) are sent as the
/// sentinel period `0`, meaning "no reliable interval".
pub const MAX_PERIOD: Duration = Duration::from_millis(10_000);

/// Detects edges on the local key line and produces outbound messages.
#[derive(Debug)]
pub struct LocalKeyMonitor {
    last_state: bool,
    last_transition: Instant,
}

impl LocalKeyMonitor {
    /// Create a monitor for a line currently at `initial_state`.
    ///
    /// `reference` stands in for the (unknown) instant of the previous
    /// edge; backdating it past [`MAX_PERIOD`] makes the first real
    /// edge carry the sentinel period.
    pub fn new(initial_state: bool, reference: Instant) -> Self {
        Self {
            last_state: initial_state,
            last_transition: reference,
        }
    }

    /// The line state seen on the most recent poll.
    pub fn last_state(&self) -> bool {
        self.last_state
    }

    /// Feed one polled line state.
    ///
    /// Returns the message to send if the state changed since the last
    /// poll, `None` otherwise.
    pub fn poll(
        &mut self,
        new_state: bool,
        now: Instant,
        sequence: &mut SequenceCounter,
    ) -> Option<TransitionMessage> {
        if new_state == self.last_state {
            return None;
        }

        let period_ms = match now.checked_duration_since(self.last_transition) {
            // Clock skew: the stored edge is in our future.
            None => 0,
            Some(elapsed) if elapsed > MAX_PERIOD => 0,
            Some(elapsed) => elapsed.as_millis() as u16,
        };

        self.last_state = new_state;
        self.last_transition = now;

        Some(TransitionMessage {
            sequence: sequence.next(),
            kind: if new_state {
                MessageKind::ToOn
            } else {
                MessageKind::ToOff
            },
            period_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn monitor_at(state: bool, now: Instant) -> LocalKeyMonitor {
        LocalKeyMonitor::new(state, now)
    }

    #[test]
    fn no_edge_no_message() {
        let now = Instant::now();
        let mut seq = SequenceCounter::new();
        let mut monitor = monitor_at(false, now);
        assert!(monitor.poll(false, now, &mut seq).is_none());
        assert!(monitor
            .poll(false, now + Duration::from_millis(5), &mut seq)
            .is_none());
    }

    #[test]
    fn edge_carries_elapsed_milliseconds() {
        let now = Instant::now();
        let mut seq = SequenceCounter::new();
        let mut monitor = monitor_at(false, now);
        let msg = monitor
            .poll(true, now + Duration::from_secs(3), &mut seq)
            .unwrap();
        assert_eq!(msg.kind, MessageKind::ToOn);
        assert_eq!(msg.period_ms, 3000);
    }

    #[test]
    fn gap_over_ten_seconds_is_sentinel() {
        let now = Instant::now();
        let mut seq = SequenceCounter::new();
        let mut monitor = monitor_at(true, now);
        let msg = monitor
            .poll(false, now + Duration::from_secs(11), &mut seq)
            .unwrap();
        assert_eq!(msg.kind, MessageKind::ToOff);
        assert_eq!(msg.period_ms, 0);
    }

    #[test]
    fn backward_clock_is_sentinel() {
        let now = Instant::now();
        let mut seq = SequenceCounter::new();
        // Stored edge one second in the "future" relative to the poll.
        let mut monitor = monitor_at(false, now + Duration::from_secs(1));
        let msg = monitor.poll(true, now, &mut seq).unwrap();
        assert_eq!(msg.period_ms, 0);
    }

    #[test]
    fn period_chains_from_previous_edge() {
        let now = Instant::now();
        let mut seq = SequenceCounter::new();
        let mut monitor = monitor_at(false, now);
        monitor
            .poll(true, now + Duration::from_millis(100), &mut seq)
            .unwrap();
        let msg = monitor
            .poll(false, now + Duration::from_millis(180), &mut seq)
            .unwrap();
        assert_eq!(msg.period_ms, 80);
    }

    #[test]
    fn sequence_increments_per_message() {
        let now = Instant::now();
        let mut seq = SequenceCounter::new();
        let mut monitor = monitor_at(false, now);
        let a = monitor
            .poll(true, now + Duration::from_millis(1), &mut seq)
            .unwrap();
        let b = monitor
            .poll(false, now + Duration::from_millis(2), &mut seq)
            .unwrap();
        assert_eq!(a.sequence, 0);
        assert_eq!(b.sequence, 1);
    }
}
