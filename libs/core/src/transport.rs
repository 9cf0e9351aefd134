use std::io;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

use crate::{Channel, Frame};

/// Maximum number of bytes read when flushing an unexpected response.
const DRAIN_LIMIT: usize = 1000;

/// Errors related to delivering frames to a sign.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CommunicationError {
    /// The sign never acknowledged the frame.
    #[error(
        "Sign did not acknowledge frame [{}] after {} attempts",
        .frame.escape_ascii(),
        .attempts
    )]
    NotAcknowledged {
        /// The exact bytes that were sent on every attempt.
        frame: Vec<u8>,

        /// How many times the frame was sent.
        attempts: u32,
    },

    /// The channel itself failed.
    #[error("Channel failed")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },
}

/// Timing and retry parameters for a [`Transport`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use am03127_core::TransportConfig;
///
/// let config = TransportConfig {
///     timeout: Duration::from_millis(500),
///     ..TransportConfig::default()
/// };
/// assert_eq!(3, config.max_retry);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TransportConfig {
    /// How long to wait for each acknowledgement (and for each drain read).
    pub timeout: Duration,

    /// Total number of attempts before giving up. Zero sends nothing.
    pub max_retry: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            timeout: Duration::from_secs(1),
            max_retry: 3,
        }
    }
}

/// Result of running a frame through the retry loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// The sign acknowledged the frame on the given attempt.
    Acknowledged {
        /// Attempt number (starting at 1) that was acknowledged.
        attempts: u32,
    },

    /// Every attempt went unacknowledged.
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    Sending { attempt: u32 },
    AwaitingAck { attempt: u32 },
    Retrying { attempt: u32 },
    Done(Delivery),
}

/// Sends frames over a [`Channel`] and waits for the sign to acknowledge them, retrying as needed.
///
/// Each transport exclusively owns its channel. Driving several signs concurrently means one transport
/// per channel, each on its own thread or behind its own lock.
///
/// Sends are logged using the [`log`] crate; run with `RUST_LOG=debug` to see every acknowledgement.
///
/// # Examples
///
/// ```
/// use am03127_core::{Command, DeviceId, Transport, TransportConfig};
/// # use std::io;
/// # use std::time::Duration;
/// # use am03127_core::Channel;
/// # struct Loopback(Vec<u8>);
/// # impl Channel for Loopback {
/// #     fn write(&mut self, _: &[u8]) -> io::Result<()> { self.0.extend_from_slice(b"ACK"); Ok(()) }
/// #     fn read(&mut self, n: usize, _: Duration) -> io::Result<Vec<u8>> {
/// #         let n = n.min(self.0.len());
/// #         Ok(self.0.drain(..n).collect())
/// #     }
/// # }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let channel = Loopback(Vec::new());
/// #
/// let mut transport = Transport::new(channel, TransportConfig::default());
/// let frame = Command::DeleteAll.to_frame(DeviceId::try_new(1)?);
/// let attempts = transport.send(&frame)?;
/// assert_eq!(1, attempts);
/// #
/// # Ok(()) }
/// ```
///
/// [`log`]: https://crates.io/crates/log
#[derive(Debug)]
pub struct Transport<C: Channel> {
    channel: C,
    config: TransportConfig,
}

impl<C: Channel> Transport<C> {
    /// Creates a new `Transport` that takes ownership of `channel`.
    pub fn new(channel: C, config: TransportConfig) -> Self {
        Transport { channel, config }
    }

    /// Returns the transport's configuration.
    pub fn config(&self) -> TransportConfig {
        self.config
    }

    /// Returns a reference to the underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Returns a mutable reference to the underlying channel.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Consumes the transport and returns the channel.
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Closes the underlying channel.
    pub fn close(&mut self) -> io::Result<()> {
        self.channel.close()
    }

    /// Sends `frame` and waits for its acknowledgement, returning how many attempts it took.
    ///
    /// # Errors
    ///
    /// Returns [`CommunicationError::NotAcknowledged`] if the sign did not acknowledge any of
    /// [`TransportConfig::max_retry`] attempts, or [`CommunicationError::Io`] if the channel failed.
    pub fn send(&mut self, frame: &Frame<'_>) -> Result<u32, CommunicationError> {
        match self.deliver(frame)? {
            Delivery::Acknowledged { attempts } => Ok(attempts),
            Delivery::Exhausted { attempts } => Err(CommunicationError::NotAcknowledged {
                frame: frame.to_bytes(),
                attempts,
            }),
        }
    }

    /// Runs `frame` through the retry loop and reports how it ended.
    ///
    /// Unlike [`send`](Self::send), exhausting the retries is not an error here.
    ///
    /// # Errors
    ///
    /// Returns an error only if the channel itself fails, which aborts any remaining attempts.
    pub fn deliver(&mut self, frame: &Frame<'_>) -> io::Result<Delivery> {
        let bytes = frame.to_bytes();
        let expected = frame.expected_response();
        info!("Sending {}", frame);

        // Start as if attempt 0 failed, so `max_retry` bounds the first write too.
        let mut state = State::Retrying { attempt: 0 };
        loop {
            state = match state {
                State::Sending { attempt } => {
                    self.channel.write(&bytes)?;
                    State::AwaitingAck { attempt }
                }

                State::AwaitingAck { attempt } => {
                    let response = self.channel.read(expected.len(), self.config.timeout)?;
                    if response == expected {
                        debug!(" Acknowledged on attempt {}", attempt);
                        State::Done(Delivery::Acknowledged { attempts: attempt })
                    } else {
                        let garbage = self.channel.read(DRAIN_LIMIT, self.config.timeout)?;
                        warn!(
                            "Unexpected response [{}{}] to attempt {} of {}",
                            response.escape_ascii(),
                            garbage.escape_ascii(),
                            attempt,
                            self.config.max_retry
                        );
                        State::Retrying { attempt }
                    }
                }

                State::Retrying { attempt } if attempt < self.config.max_retry => {
                    State::Sending { attempt: attempt + 1 }
                }

                State::Retrying { attempt } => State::Done(Delivery::Exhausted { attempts: attempt }),

                State::Done(delivery) => return Ok(delivery),
            };
        }
    }
}
