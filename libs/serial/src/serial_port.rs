use std::time::Duration;

use log::debug;
use serial_core as serial;
use serial_core::prelude::*;
use thiserror::Error;

/// Errors related to setting up a serial port.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SerialError {
    /// The port rejected the line settings.
    #[error("Couldn't configure serial port")]
    Configure {
        /// The underlying serial error.
        #[source]
        source: serial::Error,
    },

    /// The port rejected the read timeout.
    #[error("Couldn't set serial timeout")]
    Timeout {
        /// The underlying serial error.
        #[source]
        source: serial::Error,
    },
}

/// The read timeout signs are usually driven with.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Configures the given serial port appropriately for use with AM03127 signs.
///
/// Specifically, the signs require 8N1 format at 9600 baud with no flow control. Also sets the provided timeout value.
///
/// # Errors
///
/// Returns [`SerialError::Configure`] or [`SerialError::Timeout`] if the underlying serial port
/// reports an error.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// #
/// let mut port = serial::open("COM3")?;
/// am03127_serial::configure_port(&mut port, Duration::from_secs(1))?;
/// // Now ready for communication with a sign (8N1 9600 baud).
/// #
/// # Ok(()) }
/// ```
pub fn configure_port<P: SerialPort>(port: &mut P, timeout: Duration) -> Result<(), SerialError> {
    port.reconfigure(&|settings| {
        settings.set_baud_rate(serial::Baud9600)?;
        settings.set_char_size(serial::Bits8);
        settings.set_parity(serial::ParityNone);
        settings.set_stop_bits(serial::Stop1);
        settings.set_flow_control(serial::FlowNone);
        Ok(())
    })
    .map_err(|source| SerialError::Configure { source })?;

    port.set_timeout(timeout)
        .map_err(|source| SerialError::Timeout { source })?;

    debug!("Configured serial port for 9600 8N1 with {:?} timeout", timeout);
    Ok(())
}
