//! Core types for describing communication with AM03127-family LED message signs.
//!
//! For the basic task of sign communication, you likely want to use the high-level API
//! in the [`am03127`] crate instead.
//!
//! However, `am03127_core` is useful for crates that want to interact with the sign protocol
//! at a lower level than the `am03127` crate, or who want to provide their own [`Channel`]
//! implementations for use by `am03127`.
//!
//! The pieces fit together in one direction: a [`Command`] built from validated fields
//! (using [`charset`] for text and [`GraphicsImage`] for pixels) becomes a [`Payload`],
//! which a [`Frame`] wraps with the device ID and checksum, which a [`Transport`] writes to
//! a [`Channel`] until the sign acknowledges it.
//!
//! # Examples
//!
//! ```no_run
//! use am03127_core::{Brightness, Channel, Command, DeviceId, Transport, TransportConfig};
//!
//! # fn get_channel() -> Box<dyn Channel> { unimplemented!() }
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! #
//! // Assume we have a helper function to obtain a Channel.
//! let channel = get_channel();
//! let mut transport = Transport::new(channel, TransportConfig::default());
//!
//! // Give the sign on the other end ID 1.
//! let id = DeviceId::try_new(1)?;
//! transport.send(&am03127_core::Frame::AssignId(id))?;
//!
//! // Dim it.
//! let command = Command::SetBrightness(Brightness::try_new('C')?);
//! transport.send(&command.to_frame(id))?;
//! #
//! # Ok(()) }
//! ```
//!
//! [`am03127`]: https://docs.rs/am03127
#![doc(html_root_url = "https://docs.rs/am03127-core/0.1.0")]
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

mod channel;
pub mod charset;
mod command;
mod fields;
mod font;
mod frame;
mod graphics;
mod transport;

pub use self::channel::Channel;
pub use self::charset::EncodingError;
pub use self::command::{Command, SCHEDULE_START, SCHEDULE_STOP};
pub use self::fields::{
    Brightness, DeviceId, GraphicsBlock, GraphicsPage, Line, PageId, PageSchedule, ScheduleId, ValidationError,
};
pub use self::font::{FontVariant, Glyph};
pub use self::frame::{checksum, Frame, FrameError, Payload, ACK};
pub use self::graphics::{Color, GraphicsImage, HEIGHT, PACKED_LEN, PIXELS, WIDTH};
pub use self::transport::{CommunicationError, Delivery, Transport, TransportConfig};
