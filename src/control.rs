//! Control loop: local edge propagation and remote transition replay.
//!
//! A single cooperative loop ticks every millisecond. Each tick it
//! (1) polls the key line and sends any local edge, (2) applies a due
//! remote change, and (3) receives at most one datagram, skipped
//! entirely while a remote change is still pending. Only the shared
//! [`KeyState`] boolean leaves this loop; the render thread picks it up
//! within one buffer duration.

use anyhow::{Context, Result};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::key::line::HardwareLine;
use crate::key::monitor::LocalKeyMonitor;
use crate::key::state::KeyState;
use crate::net::loss::LossDetector;
use crate::net::message::{MessageKind, SequenceCounter, TransitionMessage, MESSAGE_LEN};
use crate::net::socket::DatagramSocket;

/// Sleep between control-loop ticks.
const TICK_INTERVAL: Duration = Duration::from_millis(1);

/// How far the edge-reference instants are backdated at startup, so the
/// first edge of a session carries the sentinel period.
const REFERENCE_BACKDATE: Duration = Duration::from_secs(10);

/// A remote transition waiting for its application instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRemoteChange {
    pub target_state: bool,
    pub apply_at: Instant,
}

/// Applies inbound messages to the shared key state, deferring
/// transitions to their computed instant, and answers queries.
///
/// At most one change is outstanding at a time; the control loop does
/// not receive while one is pending, so a transition arriving then is
/// dropped on the wire. `last_remote_transition` is a fixed reference
/// instant, never reassigned after construction (see DESIGN.md for both
/// inherited quirks).
#[derive(Debug)]
pub struct RemoteSyncScheduler {
    last_remote_transition: Instant,
    pending: Option<PendingRemoteChange>,
}

impl RemoteSyncScheduler {
    pub fn new(reference: Instant) -> Self {
        Self {
            last_remote_transition: reference,
            pending: None,
        }
    }

    /// Whether a remote change is waiting to be applied.
    pub fn change_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Process one inbound message.
    ///
    /// `local_line_state` is the last observed state of the local key
    /// line, echoed back for queries. Returns the reply to send, if any.
    pub fn dispatch(
        &mut self,
        msg: TransitionMessage,
        local_line_state: bool,
        key: &KeyState,
        sequence: &mut SequenceCounter,
    ) -> Option<TransitionMessage> {
        match msg.kind {
            MessageKind::ToOff | MessageKind::ToOn => {
                let apply_at =
                    self.last_remote_transition + Duration::from_millis(u64::from(msg.period_ms));
                self.pending = Some(PendingRemoteChange {
                    target_state: msg.kind == MessageKind::ToOn,
                    apply_at,
                });
                None
            }
            MessageKind::IsOff => {
                key.set(false);
                None
            }
            MessageKind::IsOn => {
                key.set(true);
                None
            }
            MessageKind::Query => Some(TransitionMessage {
                sequence: sequence.next(),
                kind: if local_line_state {
                    MessageKind::IsOn
                } else {
                    MessageKind::IsOff
                },
                period_ms: 0,
            }),
        }
    }

    /// Apply the pending change if its instant has arrived.
    ///
    /// Returns true if the key state was written this tick.
    pub fn apply_due(&mut self, now: Instant, key: &KeyState) -> bool {
        if let Some(pending) = self.pending {
            if now >= pending.apply_at {
                key.set(pending.target_state);
                self.pending = None;
                return true;
            }
        }
        false
    }
}

/// The composed control loop over a key line and a datagram socket.
pub struct ControlLoop<L: HardwareLine, S: DatagramSocket> {
    line: L,
    socket: S,
    key: Arc<KeyState>,
    monitor: LocalKeyMonitor,
    scheduler: RemoteSyncScheduler,
    loss: LossDetector,
    sequence: SequenceCounter,
}

impl<L: HardwareLine, S: DatagramSocket> ControlLoop<L, S> {
    /// Read the initial line state and set up the loop.
    ///
    /// Failing to read the line at startup is a setup error and fatal.
    pub fn new(mut line: L, socket: S, key: Arc<KeyState>) -> Result<Self> {
        let initial_state = line.read().context("failed to read initial key line state")?;
        let now = Instant::now();
        let reference = now.checked_sub(REFERENCE_BACKDATE).unwrap_or(now);
        Ok(Self {
            line,
            socket,
            key,
            monitor: LocalKeyMonitor::new(initial_state, reference),
            scheduler: RemoteSyncScheduler::new(reference),
            loss: LossDetector::new(),
            sequence: SequenceCounter::new(),
        })
    }

    /// Run until `running` clears or a fatal socket error occurs.
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        while running.load(Ordering::SeqCst) {
            self.tick(Instant::now())?;
            thread::sleep(TICK_INTERVAL);
        }
        Ok(())
    }

    /// One control-loop iteration at instant `now`.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        // 1. Poll the key line, propagate an edge.
        match self.line.read() {
            Ok(state) => {
                if let Some(msg) = self.monitor.poll(state, now, &mut self.sequence) {
                    debug!(key = state, period_ms = msg.period_ms, "local edge");
                    if let Err(err) = self.socket.send(&msg.encode()) {
                        warn!("failed to send transition: {err}");
                    }
                }
            }
            Err(err) => warn!("key line read failed: {err}"),
        }

        // 2. Apply a remote change whose time is up.
        if self.scheduler.apply_due(now, &self.key) {
            debug!(should_play = self.key.get(), "applied remote transition");
        }

        // 3. Receive, unless a change is still waiting.
        if !self.scheduler.change_pending() {
            self.receive()?;
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<()> {
        let mut buf = [0u8; MESSAGE_LEN];
        match self.socket.try_recv(&mut buf) {
            Ok(len) => {
                let msg = match TransitionMessage::decode(&buf[..len]) {
                    Ok(msg) => msg,
                    Err(err) => {
                        warn!("ignoring datagram: {err}");
                        return Ok(());
                    }
                };
                let missed = self.loss.observe(msg.sequence);
                if missed != 0 {
                    warn!("missed {missed} messages");
                }
                let local_line_state = self.monitor.last_state();
                if let Some(reply) =
                    self.scheduler
                        .dispatch(msg, local_line_state, &self.key, &mut self.sequence)
                {
                    if let Err(err) = self.socket.send(&reply.encode()) {
                        warn!("failed to send query reply: {err}");
                    }
                }
                Ok(())
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::ConnectionRefused
                ) =>
            {
                Ok(())
            }
            Err(err) => Err(err).context("failed to receive from peer"),
        }
    }
}
