use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::str;

use lazy_static::lazy_static;
use num_traits::Num;
use regex::bytes::Regex;
use thiserror::Error;

use crate::{DeviceId, ValidationError};

/// The acknowledgement a sign sends after accepting a regular command frame.
pub const ACK: &[u8] = b"ACK";

/// Errors related to parsing [`Frame`]s of data.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FrameError {
    /// Failed to parse data into a [`Frame`].
    #[error("Failed to parse [{}] into a Frame", string_for_error(data))]
    InvalidFrame {
        /// The invalid frame data.
        data: Vec<u8>,
    },

    /// [`Frame`] checksum didn't match declared checksum.
    #[error(
        "Frame checksum for [{}] didn't match declared checksum: Expected 0x{:02X}, got 0x{:02X}",
        string_for_error(data),
        expected,
        actual
    )]
    BadChecksum {
        /// The invalid frame data.
        data: Vec<u8>,

        /// The declared checksum.
        expected: u8,

        /// The actual checksum of the payload.
        actual: u8,
    },

    /// [`Frame`] named a device ID outside the valid range.
    #[error("Frame [{}] names an invalid device ID", string_for_error(data))]
    InvalidDeviceId {
        /// The invalid frame data.
        data: Vec<u8>,

        /// Why the device ID was rejected.
        #[source]
        source: ValidationError,
    },
}

/// A complete frame as written to the wire.
///
/// The sign protocol has two frame shapes. Regular commands carry the target's device ID,
/// the payload, and an XOR checksum of the payload. Device ID assignment is special: it
/// addresses every sign on the line, so it has neither an existing ID nor a checksum.
///
/// # Examples
///
/// ```
/// use am03127_core::{DeviceId, Frame, Payload};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// #
/// let frame = Frame::new(DeviceId::try_new(1)?, Payload::new(&b"AB"[..]));
/// assert_eq!(b"<ID01>AB03<E>", frame.to_bytes().as_slice());
/// assert_eq!(b"ACK", frame.expected_response().as_slice());
///
/// let parsed = Frame::from_bytes(&frame.to_bytes())?;
/// assert_eq!(frame, parsed);
///
/// let assign = Frame::AssignId(DeviceId::try_new(5)?);
/// assert_eq!(b"<ID><05><E>", assign.to_bytes().as_slice());
/// assert_eq!(b"05", assign.expected_response().as_slice());
/// #
/// # Ok(()) }
/// ```
///
/// # Format Details
///
/// ```text
/// ┌───┬───┬───┬───┬───┬───┬ ┄ ┬───┬───┬───┬───┬───┐
/// │ < │ I │ D │  ID   │ > │...│ Chksum│ < │ E │ > │
/// └───┴───┴───┴───┴───┴───┴ ┄ ┴───┴───┴───┴───┴───┘
///                         Payload
///
/// ┌───┬───┬───┬───┬───┬───┬───┬───┬───┬───┬───┐
/// │ < │ I │ D │ > │ < │ New ID│ > │ < │ E │ > │
/// └───┴───┴───┴───┴───┴───┴───┴───┴───┴───┴───┘
/// ```
///
/// IDs and the checksum are two uppercase hex digits. The checksum covers the payload only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Frame<'a> {
    /// A regular command addressed to one sign.
    Command(DeviceId, Payload<'a>),

    /// Assigns a new device ID to the attached sign.
    AssignId(DeviceId),
}

impl<'a> Frame<'a> {
    /// Constructs a regular command frame.
    pub fn new(device_id: DeviceId, payload: Payload<'a>) -> Self {
        Frame::Command(device_id, payload)
    }

    /// Returns the device ID this frame addresses, or the ID being assigned.
    pub fn device_id(&self) -> DeviceId {
        match *self {
            Frame::Command(device_id, _) | Frame::AssignId(device_id) => device_id,
        }
    }

    /// Returns the checksum that will be sent with this frame, if it carries one.
    pub fn checksum(&self) -> Option<u8> {
        match *self {
            Frame::Command(_, ref payload) => Some(checksum(payload.get())),
            Frame::AssignId(_) => None,
        }
    }

    /// Converts the frame to its wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            Frame::Command(device_id, ref payload) => {
                let payload = payload.get();
                let mut output = Vec::<u8>::with_capacity(6 + payload.len() + 5);
                output.extend_from_slice(format!("<ID{:02X}>", device_id).as_bytes());
                output.extend_from_slice(payload);
                output.extend_from_slice(format!("{:02X}<E>", checksum(payload)).as_bytes());
                assert_eq!(output.len(), output.capacity());
                output
            }
            Frame::AssignId(new_id) => format!("<ID><{:02X}><E>", new_id).into_bytes(),
        }
    }

    /// Returns the exact bytes a sign replies with after accepting this frame.
    pub fn expected_response(&self) -> Vec<u8> {
        match *self {
            Frame::Command(..) => ACK.to_vec(),
            Frame::AssignId(new_id) => format!("{:02X}", new_id).into_bytes(),
        }
    }

    /// Parses the wire format into a new `Frame`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * [`FrameError::InvalidFrame`] if the data matches neither frame shape.
    /// * [`FrameError::BadChecksum`] if the declared checksum does not match the payload.
    /// * [`FrameError::InvalidDeviceId`] if the device ID is outside the valid range.
    ///
    /// # Examples
    ///
    /// ```
    /// # use am03127_core::{DeviceId, Frame, Payload};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// #
    /// let frame = Frame::from_bytes(b"<ID02><D*>6C<E>")?;
    /// assert_eq!(Frame::new(DeviceId::try_new(2)?, Payload::new(&b"<D*>"[..])), frame);
    /// #
    /// # Ok(()) }
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Frame<'static>, FrameError> {
        lazy_static! {
            static ref ASSIGN_RE: Regex = Regex::new(r"(?x-u)
                ^<ID>                               # Bare ID marker
                <(?P<id>[[:xdigit:]]{2})>           # 2 hex digits for the new ID
                <E>$                                # Terminator
            ").unwrap(); // Regex is valid so safe to unwrap.

            static ref COMMAND_RE: Regex = Regex::new(r"(?xs-u)
                ^<ID(?P<id>[[:xdigit:]]{2})>        # 2 hex digits for the device ID
                (?P<payload>.*)                     # Payload, which may be binary
                (?P<checksum>[[:xdigit:]]{2})       # 2 hex digits for checksum
                <E>$                                # Terminator
            ").unwrap(); // Regex is valid so safe to unwrap.
        }

        let invalid_id = |source| FrameError::InvalidDeviceId {
            data: bytes.into(),
            source,
        };

        if let Some(captures) = ASSIGN_RE.captures(bytes) {
            // Regex always matches all capture groups so safe to unwrap.
            let id = parse_radix::<u8>(captures.name("id").unwrap().as_bytes(), 16);
            return Ok(Frame::AssignId(DeviceId::try_new(id).map_err(invalid_id)?));
        }

        let captures = COMMAND_RE
            .captures(bytes)
            .ok_or_else(|| FrameError::InvalidFrame { data: bytes.into() })?;

        let id = parse_radix::<u8>(captures.name("id").unwrap().as_bytes(), 16);
        let payload = captures.name("payload").unwrap().as_bytes();
        let provided_checksum = parse_radix::<u8>(captures.name("checksum").unwrap().as_bytes(), 16);

        let computed_checksum = checksum(payload);
        if computed_checksum != provided_checksum {
            return Err(FrameError::BadChecksum {
                data: bytes.into(),
                expected: provided_checksum,
                actual: computed_checksum,
            });
        }

        let device_id = DeviceId::try_new(id).map_err(invalid_id)?;
        Ok(Frame::Command(device_id, Payload::new(payload.to_vec())))
    }
}

impl Display for Frame<'_> {
    /// Formats the frame in a human-readable way.
    ///
    /// Useful for viewing traffic on the line. Binary payload bytes are escaped.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Frame::Command(device_id, ref payload) => {
                write!(f, "ID {:02X} | {}", device_id, payload.get().escape_ascii())
            }
            Frame::AssignId(new_id) => write!(f, "Assign ID {:02X}", new_id),
        }
    }
}

/// Owned or borrowed command bytes to be placed in a [`Frame`].
///
/// # Examples
///
/// ```
/// use am03127_core::Payload;
///
/// let owned = Payload::new(b"<D*>".to_vec());
/// let borrowed = Payload::new(&b"<D*>"[..]);
/// assert_eq!(owned, borrowed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payload<'a>(Cow<'a, [u8]>);

impl<'a> Payload<'a> {
    /// Creates a new `Payload` containing owned or borrowed data.
    pub fn new<T: Into<Cow<'a, [u8]>>>(data: T) -> Self {
        Payload(data.into())
    }

    /// Returns a reference to the inner bytes.
    pub fn get(&self) -> &[u8] {
        &self.0
    }
}

/// Computes the checksum the sign expects: the XOR of every payload byte.
///
/// # Examples
///
/// ```
/// assert_eq!(0x03, am03127_core::checksum(b"AB"));
/// assert_eq!(0x00, am03127_core::checksum(b""));
/// ```
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, &b| acc ^ b)
}

/// Parses a byte slice of ASCII digits in the given radix.
///
/// Assumes that the data has already been validated and panics if it is invalid.
pub(crate) fn parse_radix<T: Num>(bytes: &[u8], radix: u32) -> T
where
    <T as Num>::FromStrRadixErr: 'static + std::error::Error,
{
    // Callers' regexes already determined these are valid digits, so we can just unwrap.
    let string = str::from_utf8(bytes).unwrap();
    T::from_str_radix(string, radix).unwrap()
}

/// Formats supposed frame data for display as part of an error message.
///
/// Escapes non-printable bytes and removes surrounding whitespace.
fn string_for_error(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string().trim().to_string()
}
