//! Transition message codec.
//!
//! Wire layout, 4 bytes per datagram:
//!
//! | byte | field     | notes                                        |
//! |------|-----------|----------------------------------------------|
//! | 0    | sequence  | per-sender counter, wraps mod 256            |
//! | 1    | kind      | 0=ToOff 1=ToOn 2=IsOff 3=IsOn 4=Query        |
//! | 2-3  | period_ms | big-endian; meaningful only for ToOff/ToOn   |

use thiserror::Error;

/// Exact length of every datagram.
pub const MESSAGE_LEN: usize = 4;

/// What a message asserts about the sender's key line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    /// The line transitioned to off, `period_ms` after its previous edge.
    ToOff = 0,
    /// The line transitioned to on, `period_ms` after its previous edge.
    ToOn = 1,
    /// The line is off right now; apply immediately.
    IsOff = 2,
    /// The line is on right now; apply immediately.
    IsOn = 3,
    /// Ask the peer for its current line state.
    Query = 4,
}

impl MessageKind {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::ToOff),
            1 => Some(Self::ToOn),
            2 => Some(Self::IsOff),
            3 => Some(Self::IsOn),
            4 => Some(Self::Query),
            _ => None,
        }
    }
}

/// A decoded key-state message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionMessage {
    pub sequence: u8,
    pub kind: MessageKind,
    /// Milliseconds since the sender's previous edge; `0` is the
    /// "no reliable interval" sentinel.
    pub period_ms: u16,
}

/// Errors raised while decoding an inbound datagram.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("short datagram: {0} bytes")]
    ShortDatagram(usize),
    #[error("unknown message kind: {0}")]
    UnknownKind(u8),
}

impl TransitionMessage {
    /// Encode into the 4-byte wire form.
    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        let period = self.period_ms.to_be_bytes();
        [self.sequence, self.kind as u8, period[0], period[1]]
    }

    /// Decode a received datagram.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < MESSAGE_LEN {
            return Err(DecodeError::ShortDatagram(buf.len()));
        }
        let kind = MessageKind::from_u8(buf[1]).ok_or(DecodeError::UnknownKind(buf[1]))?;
        Ok(Self {
            sequence: buf[0],
            kind,
            period_ms: u16::from_be_bytes([buf[2], buf[3]]),
        })
    }
}

/// Outbound sequence numbering, shared by all messages a peer sends.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: u8,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Take the next sequence byte, wrapping mod 256.
    pub fn next(&mut self) -> u8 {
        let seq = self.next;
        self.next = self.next.wrapping_add(1);
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_kinds() {
        for kind in [
            MessageKind::ToOff,
            MessageKind::ToOn,
            MessageKind::IsOff,
            MessageKind::IsOn,
            MessageKind::Query,
        ] {
            let msg = TransitionMessage {
                sequence: 0xA5,
                kind,
                period_ms: 1234,
            };
            assert_eq!(TransitionMessage::decode(&msg.encode()), Ok(msg));
        }
    }

    #[test]
    fn wire_layout_is_big_endian() {
        let msg = TransitionMessage {
            sequence: 7,
            kind: MessageKind::ToOn,
            period_ms: 0x0102,
        };
        assert_eq!(msg.encode(), [7, 1, 0x01, 0x02]);
    }

    #[test]
    fn period_extremes_survive() {
        for period_ms in [0u16, 1, 9_999, u16::MAX] {
            let msg = TransitionMessage {
                sequence: 255,
                kind: MessageKind::ToOff,
                period_ms,
            };
            assert_eq!(TransitionMessage::decode(&msg.encode()), Ok(msg));
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(
            TransitionMessage::decode(&[0, 9, 0, 0]),
            Err(DecodeError::UnknownKind(9))
        );
    }

    #[test]
    fn short_datagram_is_rejected() {
        assert_eq!(
            TransitionMessage::decode(&[0, 1, 0]),
            Err(DecodeError::ShortDatagram(3))
        );
    }

    #[test]
    fn sequence_counter_wraps() {
        let mut seq = SequenceCounter { next: 254 };
        assert_eq!(seq.next(), 254);
        assert_eq!(seq.next(), 255);
        assert_eq!(seq.next(), 0);
    }
}
