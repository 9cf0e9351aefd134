use std::io::{self, ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use log::{debug, trace};
use serial_core::prelude::*;

use am03127_core::Channel;

use crate::serial_port::{self, SerialError};

/// An implementation of [`Channel`] that talks to a sign over a serial port.
///
/// Raw traffic is logged at trace level using the [`log`] crate; consuming binaries
/// typically use the [`env_logger`] crate and can be run with `RUST_LOG=trace` to watch it.
///
/// The port is released when the channel is closed or dropped.
///
/// # Examples
///
/// ```no_run
/// use am03127_serial::SerialChannel;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// #
/// let port = serial::open("/dev/ttyUSB0")?;
/// let channel = SerialChannel::try_new(port, am03127_serial::DEFAULT_TIMEOUT)?;
/// // Can now hand the channel to a Sign.
/// #
/// # Ok(()) }
/// ```
///
/// [`log`]: https://crates.io/crates/log
/// [`env_logger`]: https://crates.io/crates/env_logger
#[derive(Debug, Eq, PartialEq, Hash)]
pub struct SerialChannel<P: SerialPort> {
    port: Option<P>,
}

impl<P: SerialPort> SerialChannel<P> {
    /// Creates a new `SerialChannel` that communicates over the specified serial port,
    /// configuring it for the sign with the given initial timeout.
    ///
    /// # Errors
    ///
    /// Returns a [`SerialError`] if the serial port cannot be configured.
    pub fn try_new(mut port: P, timeout: Duration) -> Result<Self, SerialError> {
        serial_port::configure_port(&mut port, timeout)?;
        Ok(SerialChannel { port: Some(port) })
    }

    /// Returns a reference to the underlying serial port, or `None` if the channel has been closed.
    pub fn port(&self) -> Option<&P> {
        self.port.as_ref()
    }

    /// Returns whether the channel still holds its port.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open_port(&mut self) -> io::Result<&mut P> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(ErrorKind::NotConnected, "Serial port has been closed"))
    }
}

impl<P: SerialPort> Channel for SerialChannel<P> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        trace!("Serial write: {}", bytes.escape_ascii());
        let port = self.open_port()?;
        port.write_all(bytes)?;
        port.flush()
    }

    /// Reads until `max_bytes` have arrived or `timeout` has elapsed, whichever comes first.
    fn read(&mut self, max_bytes: usize, timeout: Duration) -> io::Result<Vec<u8>> {
        let port = self.open_port()?;
        let deadline = Instant::now() + timeout;
        let mut buffer = vec![0; max_bytes];
        let mut filled = 0;

        while filled < max_bytes {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            port.set_timeout(remaining)?;

            match port.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(ref e) if e.kind() == ErrorKind::TimedOut => break,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        buffer.truncate(filled);
        trace!("Serial read: {}", buffer.escape_ascii());
        Ok(buffer)
    }

    fn close(&mut self) -> io::Result<()> {
        if self.port.take().is_some() {
            debug!("Closed serial port");
        }
        Ok(())
    }
}
