//! Hardware key line access.
//!
//! The key contact is wired to a serial-port modem status input (DSR),
//! with DTR raised at open to supply the contact side. The control loop
//! only ever sees the [`HardwareLine`] trait, so tests can script line
//! states without any hardware.

use anyhow::{Context, Result};
use std::io;
use std::time::Duration;

/// Serial device polled when none is given on the command line.
#[cfg(windows)]
pub const DEFAULT_LINE_PATH: &str = "COM1";
#[cfg(not(windows))]
pub const DEFAULT_LINE_PATH: &str = "/dev/ttyS0";

/// A pollable boolean hardware line.
pub trait HardwareLine {
    /// Read the current line state. Non-blocking.
    fn read(&mut self) -> io::Result<bool>;
}

/// Key line on a serial port's DSR modem status signal.
pub struct SerialLine {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialLine {
    /// Open the serial device and raise DTR.
    ///
    /// The baud rate is irrelevant (no data is transferred, only modem
    /// status), but the serial layer requires one.
    pub fn open(path: &str) -> Result<Self> {
        let mut port = serialport::new(path, 9600)
            .timeout(Duration::from_millis(10))
            .open()
            .with_context(|| format!("failed to open serial port {path}"))?;
        port.write_data_terminal_ready(true)
            .with_context(|| format!("failed to raise DTR on {path}"))?;
        Ok(Self { port })
    }
}

impl HardwareLine for SerialLine {
    fn read(&mut self) -> io::Result<bool> {
        self.port.read_data_set_ready().map_err(io::Error::from)
    }
}
