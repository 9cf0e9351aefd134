//! A library for driving AM03127-family LED message signs over a serial link.
//!
//! Provides a way to connect to a sign, assign its device ID, set its clock, and send it text, schedules,
//! graphics, and custom glyphs. Each command is framed with the sign's ID and checksum and resent until the
//! sign acknowledges it.
//!
//! # Examples
//!
//! ```no_run
//! use am03127::{DeviceId, PageId, ScheduleId, SerialChannel, Sign};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! #
//! // Open the port the sign is attached to.
//! let port = serial::open("/dev/ttyUSB0")?;
//! let channel = SerialChannel::try_new(port, am03127::serial::DEFAULT_TIMEOUT)?;
//!
//! // Create a session for the sign with ID 1.
//! let mut sign = Sign::new(channel, DeviceId::try_new(1)?);
//! sign.set_clock_now()?;
//!
//! // Put some text on page A, using the "scroll left" effect in and out.
//! sign.send_text("<L1><PA><FE><MA><WD><FE>Grüße!")?;
//!
//! // Show pages A and B in turn, all the time.
//! sign.set_schedule(ScheduleId::try_new('A')?, "AB".parse()?)?;
//! sign.set_default_run_page(PageId::try_new('A')?)?;
//! #
//! # Ok(()) }
//! ```
//!
//! # Sub-crates
//!
//! In addition to the high-level API of [`Sign`], several lower-level components are provided
//! that can be combined for more specialized use-cases.
//!
//! - [`am03127-core`] \(re-exported as `core`\) contains the basic types describing the protocol, and is useful
//!   if you want to implement a custom [`Channel`] or otherwise operate at the level of the raw protocol.
//! - [`am03127-serial`] \(re-exported as `serial`\) contains functions for configuring the serial port,
//!   as well as the implementation of [`SerialChannel`].
//! - [`am03127-testing`] contains tools not directly related to communicating with signs,
//!   but useful for testing and debugging.
//!
//! [`am03127-core`]: https://docs.rs/am03127-core
//! [`am03127-serial`]: https://docs.rs/am03127-serial
//! [`am03127-testing`]: https://docs.rs/am03127-testing
#![doc(html_root_url = "https://docs.rs/am03127/0.1.0")]
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

pub use am03127_core as core;
pub use am03127_serial as serial;

mod sign;

pub use self::sign::{Sign, SignError};

pub use crate::core::{
    Brightness, Channel, Color, Command, DeviceId, FontVariant, Glyph, GraphicsBlock, GraphicsImage, GraphicsPage,
    Line, PageId, PageSchedule, ScheduleId, TransportConfig,
};
pub use crate::serial::SerialChannel;
