use std::io;

use jiff::civil::DateTime;
use jiff::Zoned;
use log::info;
use thiserror::Error;

use crate::core::{
    Brightness, Channel, Command, CommunicationError, DeviceId, EncodingError, FontVariant, Frame, Glyph,
    GraphicsBlock, GraphicsImage, GraphicsPage, Line, PageId, PageSchedule, ScheduleId, Transport, TransportConfig,
};

/// Errors related to [`Sign`]s.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SignError {
    /// The text contains a character the sign cannot show. Nothing was sent.
    #[error("Text cannot be shown on the sign")]
    Encoding {
        /// The underlying encoding error.
        #[from]
        source: EncodingError,
    },

    /// The sign did not acknowledge the command, or the channel failed.
    ///
    /// The sign's state is unknown at this point; reopening the channel may help.
    #[error("Failed to communicate with the sign")]
    Communication {
        /// The underlying communication error.
        #[from]
        source: CommunicationError,
    },
}

/// A single sign at the end of a [`Channel`].
///
/// A `Sign` is a session: it owns the channel for as long as it lives and remembers which
/// device ID to address. Every method blocks until the sign acknowledges the command or the
/// retries run out.
///
/// # Examples
///
/// ```no_run
/// use am03127::{Brightness, DeviceId, SerialChannel, Sign};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// #
/// let port = serial::open("/dev/ttyUSB0")?;
/// let channel = SerialChannel::try_new(port, am03127::serial::DEFAULT_TIMEOUT)?;
///
/// // A fresh sign answers to ID 1; make sure it does, then set its clock.
/// let mut sign = Sign::new(channel, DeviceId::try_new(1)?);
/// sign.assign_device_id(DeviceId::try_new(1)?)?;
/// sign.set_clock_now()?;
///
/// sign.set_brightness(Brightness::try_new('A')?)?;
/// sign.send_text("<L1><PA><FE><MA><WD><FE>Hello")?;
///
/// sign.close()?;
/// #
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Sign<C: Channel> {
    transport: Transport<C>,
    device_id: DeviceId,
}

impl<C: Channel> Sign<C> {
    /// Creates a new `Sign` addressing `device_id` over `channel` with the default timeout and retry count.
    ///
    /// # Examples
    ///
    /// ```
    /// # use am03127::{DeviceId, Sign};
    /// # use am03127_testing::VirtualSign;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// #
    /// let id = DeviceId::try_new(3)?;
    /// let sign = Sign::new(VirtualSign::new(id), id);
    /// assert_eq!(id, sign.device_id());
    /// #
    /// # Ok(()) }
    /// ```
    pub fn new(channel: C, device_id: DeviceId) -> Self {
        Self::with_config(channel, device_id, TransportConfig::default())
    }

    /// Creates a new `Sign` with a custom timeout and retry count.
    pub fn with_config(channel: C, device_id: DeviceId, config: TransportConfig) -> Self {
        Sign {
            transport: Transport::new(channel, config),
            device_id,
        }
    }

    /// Returns the device ID commands are addressed to.
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Returns a reference to the underlying channel.
    pub fn channel(&self) -> &C {
        self.transport.channel()
    }

    /// Consumes the sign and returns the channel without closing it.
    pub fn into_inner(self) -> C {
        self.transport.into_inner()
    }

    /// Assigns a new device ID to the attached sign and addresses it from now on.
    ///
    /// The ID is only updated once the sign echoes it back.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::Communication`] if the sign did not echo the new ID.
    pub fn assign_device_id(&mut self, new_id: DeviceId) -> Result<(), SignError> {
        let _ = self.transport.send(&Frame::AssignId(new_id))?;
        info!("Sign {} is now addressed as {}", self.device_id, new_id);
        self.device_id = new_id;
        Ok(())
    }

    /// Sets the sign's clock.
    pub fn set_clock(&mut self, time: DateTime) -> Result<(), SignError> {
        self.send(&Command::SetClock(time))
    }

    /// Sets the sign's clock to the current local time.
    pub fn set_clock_now(&mut self) -> Result<(), SignError> {
        self.set_clock(Zoned::now().datetime())
    }

    /// Defines a schedule that is always active and cycles through `pages`.
    pub fn set_schedule(&mut self, schedule: ScheduleId, pages: PageSchedule) -> Result<(), SignError> {
        self.send(&Command::schedule(schedule, pages))
    }

    /// Defines a schedule that cycles through `pages` between `start` and `stop`.
    pub fn set_schedule_window(
        &mut self,
        schedule: ScheduleId,
        pages: PageSchedule,
        start: DateTime,
        stop: DateTime,
    ) -> Result<(), SignError> {
        self.send(&Command::SetSchedule {
            schedule,
            pages,
            start,
            stop,
        })
    }

    /// Uploads one block of a graphics page.
    pub fn set_graphics_block(
        &mut self,
        page: GraphicsPage,
        block: GraphicsBlock,
        image: &GraphicsImage,
    ) -> Result<(), SignError> {
        self.send(&Command::SetGraphicsBlock {
            page,
            block,
            image: image.clone(),
        })
    }

    /// Deletes one page of one line.
    pub fn delete_page(&mut self, line: Line, page: PageId) -> Result<(), SignError> {
        self.send(&Command::DeletePage(line, page))
    }

    /// Deletes a schedule.
    pub fn delete_schedule(&mut self, schedule: ScheduleId) -> Result<(), SignError> {
        self.send(&Command::DeleteSchedule(schedule))
    }

    /// Deletes all pages, schedules, and graphics.
    pub fn delete_all(&mut self) -> Result<(), SignError> {
        self.send(&Command::DeleteAll)
    }

    /// Selects the page shown when no schedule is active.
    pub fn set_default_run_page(&mut self, page: PageId) -> Result<(), SignError> {
        self.send(&Command::SetDefaultRunPage(page))
    }

    /// Sets the display brightness.
    pub fn set_brightness(&mut self, brightness: Brightness) -> Result<(), SignError> {
        self.send(&Command::SetBrightness(brightness))
    }

    /// Replaces character `entry` of the `variant` table with a custom glyph.
    pub fn upload_glyph(&mut self, variant: FontVariant, entry: u8, glyph: Glyph) -> Result<(), SignError> {
        self.send(&Command::SetGlyph { variant, entry, glyph })
    }

    /// Restores the factory character tables.
    pub fn recall_default_font(&mut self) -> Result<(), SignError> {
        self.send(&Command::RecallDefaultFont)
    }

    /// Sends page text written in the sign's directive language, such as `<L1><PA><FE><MA><WD><FE>Hello`.
    ///
    /// See [`Command::text`] for the common directives.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::Encoding`] without sending anything if the text contains a character
    /// the sign cannot show, or [`SignError::Communication`] if the sign did not acknowledge it.
    pub fn send_text(&mut self, text: &str) -> Result<(), SignError> {
        let command = Command::text(text)?;
        self.send(&command)
    }

    /// Sends an arbitrary command to the sign and waits for it to be acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::Communication`] if the sign did not acknowledge the command within the
    /// configured number of attempts, or the channel failed.
    pub fn send(&mut self, command: &Command<'_>) -> Result<(), SignError> {
        let _ = self.transport.send(&command.to_frame(self.device_id))?;
        Ok(())
    }

    /// Closes the underlying channel. The sign should not be used afterwards.
    pub fn close(&mut self) -> io::Result<()> {
        self.transport.close()
    }
}
