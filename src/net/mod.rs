//! Wire protocol and network plumbing.
//!
//! The peers exchange fixed 4-byte UDP datagrams describing key-state
//! transitions, immediate-state assertions, and state queries. Delivery
//! is best effort: lost messages are counted, never retransmitted.

pub mod loss;
pub mod message;
pub mod socket;

pub use loss::LossDetector;
pub use message::{MessageKind, SequenceCounter, TransitionMessage, MESSAGE_LEN};
pub use socket::{DatagramSocket, UdpLink, KEYER_PORT};
