//! Tools for testing and debugging AM03127 LED sign communications.
//!
//! For the basic task of sign communication, you likely want to use the high-level API
//! in the [`am03127`] crate instead.
//!
//! This crate isn't directly related to controlling a real sign, but provides some helpful diagnostic tools.
//! [`VirtualSign`] is a general-purpose mock implementation of a sign that can stand in for a serial
//! [`Channel`](am03127_core::Channel), and [`Emulator`] exposes a virtual sign on a real serial port.
//!
//! # Examples
//!
//! ```no_run
//! use am03127_core::DeviceId;
//! use am03127_testing::{Emulator, VirtualSign};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! #
//! // Pretend to be sign 1 on a null-modem cable.
//! let sign = VirtualSign::new(DeviceId::try_new(1)?);
//! let port = serial::open("COM4")?;
//! let mut emulator = Emulator::try_new(port, sign)?;
//! loop {
//!     emulator.process_input()?;
//! }
//! #
//! # Ok(()) }
//! ```
//!
//! [`am03127`]: https://docs.rs/am03127
#![doc(html_root_url = "https://docs.rs/am03127-testing/0.1.0")]
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

mod emulator;
mod virtual_sign;

pub use self::emulator::{Emulator, EmulatorError};
pub use self::virtual_sign::{ScheduleEntry, VirtualSign};
