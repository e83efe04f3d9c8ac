//! Datagram transport.
//!
//! The control loop talks to the peer through the [`DatagramSocket`]
//! trait; [`UdpLink`] is the real transport, a bound, connected,
//! non-blocking UDP socket. "Would block" and "connection refused" are
//! steady-state outcomes for the receive side, not errors.

use anyhow::{Context, Result};
use std::io;
use std::net::UdpSocket;

/// Fixed UDP port used by both peers.
pub const KEYER_PORT: u16 = 0xC0DE;

/// Point-to-point datagram transport.
pub trait DatagramSocket {
    /// Send one datagram to the peer.
    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Receive one datagram without blocking.
    ///
    /// Returns `ErrorKind::WouldBlock` when nothing is pending.
    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// UDP transport to a single remote keyer.
pub struct UdpLink {
    socket: UdpSocket,
}

impl UdpLink {
    /// Bind to [`KEYER_PORT`] (optionally on a specific local address)
    /// and connect to the remote peer on the same port.
    pub fn open(local: Option<&str>, remote: &str) -> Result<Self> {
        let bind_addr = match local {
            Some(addr) => format!("{addr}:{KEYER_PORT}"),
            None => format!("0.0.0.0:{KEYER_PORT}"),
        };
        let socket =
            UdpSocket::bind(&bind_addr).with_context(|| format!("failed to bind {bind_addr}"))?;
        socket
            .connect((remote, KEYER_PORT))
            .with_context(|| format!("failed to connect to remote {remote}:{KEYER_PORT}"))?;
        socket
            .set_nonblocking(true)
            .context("failed to set socket non-blocking")?;
        Ok(Self { socket })
    }
}

impl DatagramSocket for UdpLink {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send(buf)
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Loopback pair on ephemeral ports; the fixed-port open() path needs
    // two hosts and stays untested here.
    fn loopback_pair() -> (UdpLink, UdpLink) {
        let a = UdpSocket::bind("127.0.0.1:0").unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").unwrap();
        a.connect(b.local_addr().unwrap()).unwrap();
        b.connect(a.local_addr().unwrap()).unwrap();
        a.set_nonblocking(true).unwrap();
        b.set_nonblocking(true).unwrap();
        (UdpLink { socket: a }, UdpLink { socket: b })
    }

    #[test]
    fn try_recv_would_block_when_idle() {
        let (mut a, _b) = loopback_pair();
        let mut buf = [0u8; 4];
        let err = a.try_recv(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn datagram_crosses_the_pair() {
        let (mut a, mut b) = loopback_pair();
        a.send(&[1, 2, 3, 4]).unwrap();
        let mut buf = [0u8; 4];
        // Loopback delivery is fast but not instant.
        for _ in 0..50 {
            match b.try_recv(&mut buf) {
                Ok(len) => {
                    assert_eq!(len, 4);
                    assert_eq!(buf, [1, 2, 3, 4]);
                    return;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(1));
                }
                Err(e) => panic!("recv failed: {e}"),
            }
        }
        panic!("datagram never arrived");
    }
}
