use std::fmt::{self, Debug, Formatter};
use std::io;
use std::time::Duration;

/// Abstraction over a byte pipe connected to one or more signs.
///
/// Typically `SerialChannel` from [`am03127-serial`] or `VirtualSign` from [`am03127-testing`] are sufficient,
/// and you do not need to implement this yourself.
///
/// # Examples
///
/// Implementing a custom channel that acknowledges everything:
///
/// ```
/// use std::io;
/// use std::time::Duration;
/// use am03127_core::Channel;
///
/// struct AgreeableChannel {
///     pending: Vec<u8>,
/// }
///
/// impl Channel for AgreeableChannel {
///     fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
///         if bytes.ends_with(b"<E>") {
///             self.pending.extend_from_slice(b"ACK");
///         }
///         Ok(())
///     }
///
///     fn read(&mut self, max_bytes: usize, _timeout: Duration) -> io::Result<Vec<u8>> {
///         let count = max_bytes.min(self.pending.len());
///         Ok(self.pending.drain(..count).collect())
///     }
/// }
/// ```
///
/// [`am03127-serial`]: https://docs.rs/am03127-serial
/// [`am03127-testing`]: https://docs.rs/am03127-testing
pub trait Channel {
    /// Writes all of `bytes` to the channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device fails or the channel has been closed.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads up to `max_bytes`, waiting at most `timeout` in total.
    ///
    /// Returns fewer bytes (possibly none) if the timeout elapses first; that is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device fails or the channel has been closed.
    fn read(&mut self, max_bytes: usize, timeout: Duration) -> io::Result<Vec<u8>>;

    /// Releases the underlying device. Further reads and writes may fail.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn read(&mut self, max_bytes: usize, timeout: Duration) -> io::Result<Vec<u8>> {
        (**self).read(max_bytes, timeout)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn read(&mut self, max_bytes: usize, timeout: Duration) -> io::Result<Vec<u8>> {
        (**self).read(max_bytes, timeout)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

// Provide a Debug representation so types that contain trait objects can derive Debug.
impl Debug for dyn Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<Channel trait>")
    }
}
