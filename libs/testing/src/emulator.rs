use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

use serial_core::prelude::*;
use thiserror::Error;

use am03127_core::Channel;
use am03127_serial::SerialError;

use crate::VirtualSign;

/// Errors related to [`Emulator`]s.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EmulatorError {
    /// The serial port could not be configured.
    #[error("Failed to set up serial port")]
    Serial {
        /// The underlying error.
        #[from]
        source: SerialError,
    },

    /// Reading from or writing to the serial port failed.
    #[error("Failed to communicate over serial port")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },
}

/// Presents a [`VirtualSign`] on a real serial port, so that other software (or another
/// machine) can drive it as if it were hardware.
///
/// # Examples
///
/// ```no_run
/// use am03127_core::DeviceId;
/// use am03127_testing::{Emulator, VirtualSign};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// #
/// let sign = VirtualSign::new(DeviceId::try_new(1)?);
/// let port = serial::open("/dev/ttyUSB1")?;
/// let mut emulator = Emulator::try_new(port, sign)?;
/// loop {
///     // Frames arriving on the port are applied to the virtual sign and acknowledged.
///     emulator.process_input()?;
/// }
/// #
/// # Ok(()) }
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct Emulator<P: SerialPort> {
    port: P,
    sign: VirtualSign,
}

impl<P: SerialPort> Emulator<P> {
    /// Creates a new `Emulator` that connects the specified serial port and virtual sign.
    ///
    /// # Errors
    ///
    /// Returns [`EmulatorError::Serial`] if the serial port cannot be configured.
    pub fn try_new(mut port: P, sign: VirtualSign) -> Result<Self, EmulatorError> {
        am03127_serial::configure_port(&mut port, Duration::from_secs(10))?;
        Ok(Emulator { port, sign })
    }

    /// Returns a reference to the underlying serial port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Returns a reference to the emulated sign.
    pub fn sign(&self) -> &VirtualSign {
        &self.sign
    }

    /// Waits for input on the serial port, feeds it to the virtual sign, and writes back
    /// any responses. Returns without error if the port times out with nothing to read.
    ///
    /// # Errors
    ///
    /// Returns [`EmulatorError::Io`] if the serial port fails.
    pub fn process_input(&mut self) -> Result<(), EmulatorError> {
        let mut buffer = [0u8; 256];
        let count = match self.port.read(&mut buffer) {
            Ok(count) => count,
            Err(ref e) if e.kind() == ErrorKind::TimedOut => 0,
            Err(e) => return Err(e.into()),
        };

        if count > 0 {
            self.sign.write(&buffer[..count])?;
        }

        let response = self.sign.read(usize::MAX, Duration::ZERO)?;
        if !response.is_empty() {
            self.port.write_all(&response)?;
            self.port.flush()?;
        }

        Ok(())
    }
}
