use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use jiff::civil::DateTime;
use log::{debug, info, warn};

use am03127_core::{
    charset, Brightness, Channel, Command, DeviceId, FontVariant, Frame, FrameError, Glyph, GraphicsBlock,
    GraphicsImage, GraphicsPage, Line, PageId, PageSchedule, ScheduleId, ACK,
};

/// A schedule as stored by a [`VirtualSign`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleEntry {
    /// Pages cycled through while the schedule is active.
    pub pages: PageSchedule,

    /// Start of the active window.
    pub start: DateTime,

    /// End of the active window.
    pub stop: DateTime,
}

/// Mock implementation of a single sign, acting as the far end of a [`Channel`].
///
/// Bytes written to the channel are collected into frames, decoded, and applied to the sign's
/// state, which can then be inspected. Acknowledgements are queued up to be read back, just as a
/// real sign would send them. Frames with a bad checksum or addressed to a different ID are
/// silently ignored.
///
/// While most likely not a 100% accurate implementation of the firmware, it is sufficient
/// for exercising the protocol end to end.
///
/// Commands are logged using the [`log`] crate for debugging purposes. Consuming binaries
/// typically use the [`env_logger`] crate and can be run with the `RUST_LOG=debug` environment variable
/// to watch them go by.
///
/// # Examples
///
/// ```
/// use am03127_core::{Brightness, Command, DeviceId, Transport, TransportConfig};
/// use am03127_testing::VirtualSign;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// #
/// let id = DeviceId::try_new(1)?;
/// let mut transport = Transport::new(VirtualSign::new(id), TransportConfig::default());
///
/// let command = Command::SetBrightness(Brightness::try_new('B')?);
/// transport.send(&command.to_frame(id))?;
///
/// assert_eq!(Some(Brightness::try_new('B')?), transport.channel().brightness());
/// #
/// # Ok(()) }
/// ```
///
/// [`log`]: https://crates.io/crates/log
/// [`env_logger`]: https://crates.io/crates/env_logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualSign {
    device_id: DeviceId,
    clock: Option<DateTime>,
    schedules: BTreeMap<ScheduleId, ScheduleEntry>,
    pages: BTreeMap<(Line, PageId), String>,
    graphics: BTreeMap<(GraphicsPage, GraphicsBlock), GraphicsImage>,
    brightness: Option<Brightness>,
    default_run_page: Option<PageId>,
    glyphs: BTreeMap<(FontVariant, u8), Glyph>,
    frames: Vec<Frame<'static>>,
    incoming: Vec<u8>,
    outgoing: Vec<u8>,
    ignore: u32,
    garble: u32,
}

impl VirtualSign {
    /// Creates a new `VirtualSign` with the specified device ID and no stored content.
    ///
    /// # Examples
    ///
    /// ```
    /// # use am03127_core::DeviceId;
    /// # use am03127_testing::VirtualSign;
    /// let sign = VirtualSign::new(DeviceId::try_new(2).unwrap());
    /// assert_eq!(2, sign.device_id().get());
    /// assert!(sign.pages().is_empty());
    /// ```
    pub fn new(device_id: DeviceId) -> Self {
        VirtualSign {
            device_id,
            clock: None,
            schedules: BTreeMap::new(),
            pages: BTreeMap::new(),
            graphics: BTreeMap::new(),
            brightness: None,
            default_run_page: None,
            glyphs: BTreeMap::new(),
            frames: vec![],
            incoming: vec![],
            outgoing: vec![],
            ignore: 0,
            garble: 0,
        }
    }

    /// Returns the sign's current device ID.
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Returns the last time the clock was set, if ever.
    pub fn clock(&self) -> Option<DateTime> {
        self.clock
    }

    /// Returns the stored schedules.
    pub fn schedules(&self) -> &BTreeMap<ScheduleId, ScheduleEntry> {
        &self.schedules
    }

    /// Returns the stored page text, decoded back to Unicode and keyed by line and page.
    ///
    /// The text still contains any effect directives that followed the line and page selectors.
    pub fn pages(&self) -> &BTreeMap<(Line, PageId), String> {
        &self.pages
    }

    /// Returns the stored graphics blocks.
    pub fn graphics(&self) -> &BTreeMap<(GraphicsPage, GraphicsBlock), GraphicsImage> {
        &self.graphics
    }

    /// Returns the brightness, or `None` if it was never set.
    pub fn brightness(&self) -> Option<Brightness> {
        self.brightness
    }

    /// Returns the default run page, or `None` if it was never set.
    pub fn default_run_page(&self) -> Option<PageId> {
        self.default_run_page
    }

    /// Returns the custom glyphs, keyed by font variant and character code.
    pub fn glyphs(&self) -> &BTreeMap<(FontVariant, u8), Glyph> {
        &self.glyphs
    }

    /// Returns every well-formed frame received so far, including ignored ones.
    pub fn frames(&self) -> &[Frame<'static>] {
        &self.frames
    }

    /// Makes the sign stay silent for the next `count` frames it would otherwise acknowledge.
    ///
    /// The frames are still applied, as if the acknowledgement were lost on the wire.
    ///
    /// # Examples
    ///
    /// ```
    /// use am03127_core::{Command, DeviceId, Transport, TransportConfig};
    /// use am03127_testing::VirtualSign;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// #
    /// let id = DeviceId::try_new(1)?;
    /// let mut sign = VirtualSign::new(id);
    /// sign.ignore_next(2);
    ///
    /// let mut transport = Transport::new(sign, TransportConfig::default());
    /// assert_eq!(3, transport.send(&Command::DeleteAll.to_frame(id))?);
    /// #
    /// # Ok(()) }
    /// ```
    pub fn ignore_next(&mut self, count: u32) {
        self.ignore = count;
    }

    /// Makes the sign answer the next `count` acknowledged frames with garbage instead.
    pub fn garble_next(&mut self, count: u32) {
        self.garble = count;
    }

    /// Handles a single frame, updating our state accordingly, and returns the sign's response.
    ///
    /// # Examples
    ///
    /// ```
    /// # use am03127_core::{DeviceId, Frame};
    /// # use am03127_testing::VirtualSign;
    /// #
    /// let mut sign = VirtualSign::new(DeviceId::try_new(1).unwrap());
    /// let response = sign.process_frame(&Frame::AssignId(DeviceId::try_new(4).unwrap()));
    /// assert_eq!(Some(b"04".to_vec()), response);
    /// assert_eq!(4, sign.device_id().get());
    /// ```
    pub fn process_frame(&mut self, frame: &Frame<'_>) -> Option<Vec<u8>> {
        match *frame {
            Frame::AssignId(new_id) => {
                info!("Vsign {}: Device ID now {}", self.device_id, new_id);
                self.device_id = new_id;
                Some(frame.expected_response())
            }

            Frame::Command(id, ref payload) if id == self.device_id => {
                let command = Command::from_payload(payload.get());
                info!("Vsign {}: {}", self.device_id, command);
                self.apply(command);
                Some(ACK.to_vec())
            }

            Frame::Command(id, _) => {
                debug!("Vsign {}: Ignoring frame for ID {}", self.device_id, id);
                None
            }
        }
    }

    fn apply(&mut self, command: Command<'_>) {
        match command {
            Command::SetClock(time) => self.clock = Some(time),

            Command::SetSchedule {
                schedule,
                pages,
                start,
                stop,
            } => {
                let _ = self.schedules.insert(schedule, ScheduleEntry { pages, start, stop });
            }

            Command::SetGraphicsBlock { page, block, image } => {
                info!("Vsign {} graphics {}{}\n{}", self.device_id, page, block, image);
                let _ = self.graphics.insert((page, block), image);
            }

            Command::DeletePage(line, page) => {
                let _ = self.pages.remove(&(line, page));
            }

            Command::DeleteSchedule(schedule) => {
                let _ = self.schedules.remove(&schedule);
            }

            Command::DeleteAll => {
                self.pages.clear();
                self.schedules.clear();
                self.graphics.clear();
            }

            Command::SetDefaultRunPage(page) => self.default_run_page = Some(page),
            Command::SetBrightness(brightness) => self.brightness = Some(brightness),

            Command::SetGlyph { variant, entry, glyph } => {
                if glyph.exceeds(variant) {
                    warn!("Vsign {}: Glyph {:02X} is wider than {:?} allows", self.device_id, entry, variant);
                }
                let _ = self.glyphs.insert((variant, entry), glyph);
            }

            Command::RecallDefaultFont => self.glyphs.clear(),

            Command::Text(ref payload) => match split_page_address(payload.get()) {
                Some((line, page, body)) => {
                    let _ = self.pages.insert((line, page), charset::decode(body));
                }
                None => warn!("Vsign {}: Text without line and page: {}", self.device_id, command),
            },

            _ => warn!("Vsign {}: Unsupported command {}", self.device_id, command),
        }
    }

    /// Applies one decoded frame and queues the response.
    fn receive(&mut self, frame: Frame<'static>) {
        let response = self.process_frame(&frame);
        self.frames.push(frame);

        if let Some(response) = response {
            if self.ignore > 0 {
                self.ignore -= 1;
                debug!("Vsign {}: Withholding response", self.device_id);
            } else if self.garble > 0 {
                self.garble -= 1;
                self.outgoing.extend_from_slice(b"ERR\r\n");
            } else {
                self.outgoing.extend_from_slice(&response);
            }
        }
    }
}

impl Channel for VirtualSign {
    /// Buffers `bytes` and processes every complete frame.
    ///
    /// Binary payloads may contain a terminator, so a chunk that fails to parse is held until
    /// more data extends it. It is only discarded once another frame starts right after it.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.incoming.extend_from_slice(bytes);

        let mut search = 0;
        while let Some(offset) = find_terminator(&self.incoming[search..]) {
            let end = search + offset + TERMINATOR.len();
            match Frame::from_bytes(&self.incoming[..end]) {
                Ok(frame) => {
                    self.incoming.drain(..end);
                    search = 0;
                    self.receive(frame);
                }
                Err(FrameError::InvalidFrame { .. }) | Err(FrameError::BadChecksum { .. })
                    if !self.incoming[end..].starts_with(FRAME_START) =>
                {
                    search = end;
                }
                Err(e) => {
                    warn!("Vsign {}: Discarding frame: {}", self.device_id, e);
                    self.incoming.drain(..end);
                    search = 0;
                }
            }
        }
        Ok(())
    }

    /// Returns whatever responses are queued; never waits.
    fn read(&mut self, max_bytes: usize, _timeout: Duration) -> io::Result<Vec<u8>> {
        let count = max_bytes.min(self.outgoing.len());
        Ok(self.outgoing.drain(..count).collect())
    }
}

const TERMINATOR: &[u8] = b"<E>";
const FRAME_START: &[u8] = b"<ID";

fn find_terminator(bytes: &[u8]) -> Option<usize> {
    bytes.windows(TERMINATOR.len()).position(|w| w == TERMINATOR)
}

/// Splits `<Ln><Pp>rest` into its line, page, and remainder.
fn split_page_address(text: &[u8]) -> Option<(Line, PageId, &[u8])> {
    match text {
        [b'<', b'L', line, b'>', b'<', b'P', page, b'>', rest @ ..] if line.is_ascii_digit() => {
            let line = Line::try_new(line - b'0').ok()?;
            let page = PageId::try_new(char::from(*page)).ok()?;
            Some((line, page, rest))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn id(value: u8) -> DeviceId {
        DeviceId::try_new(value).unwrap()
    }

    #[test_case(b"<L1><PA>Hi", Some((1, 'A', &b"Hi"[..])) ; "simple")]
    #[test_case(b"<L8><PE>", Some((8, 'E', &b""[..])) ; "empty")]
    #[test_case(b"<L9><PA>x", None ; "bad line")]
    #[test_case(b"<L1><PZ>x", None ; "bad page")]
    #[test_case(b"<L1>x", None ; "no page")]
    fn page_address(text: &[u8], expected: Option<(u8, char, &[u8])>) {
        let parsed = split_page_address(text).map(|(l, p, rest)| (l.get(), p.letter(), rest));
        assert_eq!(expected, parsed);
    }

    #[test]
    fn split_writes_reassembled() {
        let mut sign = VirtualSign::new(id(1));
        sign.write(b"<ID01><BA").unwrap();
        assert!(sign.read(3, Duration::ZERO).unwrap().is_empty());
        sign.write(b">01<E>").unwrap();
        assert_eq!(b"ACK".to_vec(), sign.read(3, Duration::ZERO).unwrap());
    }

    #[test]
    fn terminator_in_payload_waits_for_rest() {
        let mut sign = VirtualSign::new(id(1));
        let bytes = Command::SetGlyph {
            variant: FontVariant::Wide,
            entry: 0x30,
            glyph: Glyph::new([0x3C, 0x45, 0x3E, 0x3C, 0x45, 0x3E, 0x00, 0x00]),
        }
        .to_frame(id(1))
        .to_bytes();

        sign.write(&bytes[..15]).unwrap();
        assert!(sign.read(3, Duration::ZERO).unwrap().is_empty());
        sign.write(&bytes[15..]).unwrap();
        assert_eq!(b"ACK".to_vec(), sign.read(3, Duration::ZERO).unwrap());
        assert_eq!(1, sign.glyphs().len());
    }

    #[test]
    fn bad_frame_dropped_when_next_starts() {
        let mut sign = VirtualSign::new(id(1));
        sign.write(b"<ID01><BA>FF<E>").unwrap();
        sign.write(b"<ID01><BB>02<E>").unwrap();
        assert_eq!(b"ACK".to_vec(), sign.read(100, Duration::ZERO).unwrap());
        assert_eq!(Some(Brightness::try_new('B').unwrap()), sign.brightness());
        assert_eq!(1, sign.frames().len());
    }

    #[test]
    fn bad_checksum_ignored() {
        let mut sign = VirtualSign::new(id(1));
        sign.write(b"<ID01><BA>FF<E>").unwrap();
        assert!(sign.read(100, Duration::ZERO).unwrap().is_empty());
        assert_eq!(None, sign.brightness());
        assert!(sign.frames().is_empty());
    }

    #[test]
    fn other_id_ignored() {
        let mut sign = VirtualSign::new(id(1));
        sign.write(b"<ID02><BA>01<E>").unwrap();
        assert!(sign.read(100, Duration::ZERO).unwrap().is_empty());
        assert_eq!(1, sign.frames().len());
    }

    #[test]
    fn garbled_response() {
        let mut sign = VirtualSign::new(id(1));
        sign.garble_next(1);
        sign.write(b"<ID01><BA>01<E><ID01><BA>01<E>").unwrap();
        assert_eq!(b"ERR\r\nACK".to_vec(), sign.read(100, Duration::ZERO).unwrap());
    }

    #[test]
    fn delete_all_clears_content() {
        let mut sign = VirtualSign::new(id(1));
        for command in [
            Command::text("<L1><PA>Hi").unwrap(),
            Command::schedule(ScheduleId::try_new('A').unwrap(), "A".parse().unwrap()),
            Command::DeleteAll,
        ] {
            let _ = sign.process_frame(&command.to_frame(id(1)));
        }
        assert!(sign.pages().is_empty());
        assert!(sign.schedules().is_empty());
    }
}
