//! Tools for communicating with AM03127 LED signs over serial.
//!
//! For the basic task of sign communication, you likely want to use the high-level API
//! in the [`am03127`] crate instead.
//!
//! However, you can use the [`configure_port`] function to configure serial port appropriately
//! if you're doing custom lower-level communication.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! #
//! let mut port = serial::open("COM3")?;
//! am03127_serial::configure_port(&mut port, Duration::from_secs(1))?;
//! // Now ready for communication with a sign (8N1 9600 baud).
//! #
//! # Ok(()) }
//! ```
//!
//! [`am03127`]: https://docs.rs/am03127
#![doc(html_root_url = "https://docs.rs/am03127-serial/0.1.0")]
#![deny(
    missing_copy_implementations,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![warn(
    missing_docs,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]

mod serial_channel;
mod serial_port;

pub use self::serial_channel::SerialChannel;
pub use self::serial_port::{configure_port, SerialError, DEFAULT_TIMEOUT};
