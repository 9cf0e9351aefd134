use std::fmt::{self, Display, Formatter};

use jiff::civil::{self, DateTime};
use lazy_static::lazy_static;
use regex::bytes::{Captures, Regex};

use crate::charset::{self, EncodingError};
use crate::frame::parse_radix;
use crate::{
    Brightness, DeviceId, FontVariant, Frame, Glyph, GraphicsBlock, GraphicsImage, GraphicsPage, Line, PageId,
    PageSchedule, Payload, ScheduleId, PACKED_LEN,
};

/// Default start of a schedule's active window.
pub const SCHEDULE_START: DateTime = civil::datetime(2000, 1, 1, 0, 0, 0, 0);

/// Default end of a schedule's active window.
pub const SCHEDULE_STOP: DateTime = civil::datetime(2099, 12, 31, 23, 59, 59, 0);

/// High-level representation of a command understood by the sign.
///
/// Every field is a validated domain type, so building the payload cannot fail; all
/// validation happens when the fields themselves are constructed.
///
/// # Examples
///
/// ```
/// use am03127_core::{Brightness, Command, DeviceId};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// #
/// let command = Command::SetBrightness(Brightness::try_new('B')?);
/// assert_eq!(b"<BB>".to_vec(), command.payload());
///
/// let frame = command.to_frame(DeviceId::try_new(1)?);
/// assert_eq!(b"<ID01><BB>02<E>".to_vec(), frame.to_bytes());
/// #
/// # Ok(()) }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Command<'a> {
    /// Sets the sign's real-time clock. Sub-second precision is discarded.
    SetClock(DateTime),

    /// Defines when a schedule is active and which pages it cycles through.
    ///
    /// Only minute precision is transmitted for the window boundaries.
    SetSchedule {
        /// The schedule to define.
        schedule: ScheduleId,

        /// Pages shown while the schedule is active.
        pages: PageSchedule,

        /// Start of the active window.
        start: DateTime,

        /// End of the active window.
        stop: DateTime,
    },

    /// Uploads one 7 x 32 block of a graphics page.
    SetGraphicsBlock {
        /// The graphics page to write.
        page: GraphicsPage,

        /// The block within the page.
        block: GraphicsBlock,

        /// The block's pixels.
        image: GraphicsImage,
    },

    /// Deletes one page of one line.
    DeletePage(Line, PageId),

    /// Deletes a schedule.
    DeleteSchedule(ScheduleId),

    /// Deletes all pages, schedules, and graphics.
    DeleteAll,

    /// Selects the page shown when no schedule is active.
    SetDefaultRunPage(PageId),

    /// Sets the display brightness.
    SetBrightness(Brightness),

    /// Replaces one character of a European character table.
    SetGlyph {
        /// Which character table to modify.
        variant: FontVariant,

        /// Character code to replace.
        entry: u8,

        /// The new bitmap.
        glyph: Glyph,
    },

    /// Restores the factory European character tables.
    RecallDefaultFont,

    /// Already-encoded page text in the sign's directive language. See [`Command::text`].
    Text(Payload<'a>),

    /// A payload that matches no known command.
    Unknown(Payload<'a>),
}

impl<'a> Command<'a> {
    /// Creates a [`Command::SetSchedule`] active over the default window
    /// ([`SCHEDULE_START`] to [`SCHEDULE_STOP`]).
    pub fn schedule(schedule: ScheduleId, pages: PageSchedule) -> Self {
        Command::SetSchedule {
            schedule,
            pages,
            start: SCHEDULE_START,
            stop: SCHEDULE_STOP,
        }
    }

    /// Creates a [`Command::Text`] from page text written in the sign's directive language.
    ///
    /// Extended characters are replaced by their escape tokens and the result is checked to be
    /// 7-bit ASCII. The directives themselves are passed through untouched; the most common are:
    ///
    /// | Directive   | Meaning                                                           |
    /// |-------------|-------------------------------------------------------------------|
    /// | `<Ln>`      | Line 1-8                                                          |
    /// | `<Pn>`      | Page A-Z                                                          |
    /// | `<Fx>`      | Leading effect: A immediate, B xopen, C curtain up, D curtain down, E scroll left, F scroll right, G vopen, H hopen, I scroll up, J scroll down, K hold, L snow, M twinkle, N block move, P random, Q-S pen writing |
    /// | `<Mx>`      | Display method while waiting                                      |
    /// | `<Wx>`      | Waiting time                                                      |
    /// | `<Fy>`      | Lagging effect: A-K as for leading                                |
    /// | `<AA>`-`<AF>` | Font: normal 5x7, bold 6x7, narrow 4x7, 7x13 top/bottom, 6x8  |
    /// | `<BA>`-`<BZ>` | Bell, 0.5 s to 13 s                                            |
    /// | `<CA>`-`<CS>` | Foreground/background color combinations                       |
    ///
    /// # Errors
    ///
    /// Returns an [`EncodingError`] if the text contains a character the sign cannot show.
    ///
    /// # Examples
    ///
    /// ```
    /// use am03127_core::Command;
    ///
    /// let command = Command::text("<L1><PA><FE><MA><WD><FE>5 €").unwrap();
    /// assert_eq!(b"<L1><PA><FE><MA><WD><FE>5 <U00>".to_vec(), command.payload());
    ///
    /// assert!(Command::text("café").is_err());
    /// ```
    pub fn text(text: &str) -> Result<Command<'static>, EncodingError> {
        Ok(Command::Text(Payload::new(charset::encode(text)?)))
    }

    /// Builds the payload bytes for this command.
    pub fn payload(&self) -> Vec<u8> {
        match *self {
            Command::SetClock(time) => format!(
                "<SC>{:02}{:02}{:02}{:02}{:02}{:02}{:02}",
                short_year(time),
                time.weekday().to_monday_one_offset(),
                time.month(),
                time.day(),
                time.hour(),
                time.minute(),
                time.second()
            )
            .into_bytes(),

            Command::SetSchedule {
                schedule,
                ref pages,
                start,
                stop,
            } => format!(
                "<T{}>{}{}{}",
                schedule,
                minute_stamp(start),
                minute_stamp(stop),
                pages
            )
            .into_bytes(),

            Command::SetGraphicsBlock { page, block, ref image } => {
                let mut payload = format!("<G{}{}>", page, block).into_bytes();
                payload.extend_from_slice(&image.pack());
                payload
            }

            Command::DeletePage(line, page) => format!("<DL{}P{}>", line, page).into_bytes(),
            Command::DeleteSchedule(schedule) => format!("<DT{}>", schedule).into_bytes(),
            Command::DeleteAll => b"<D*>".to_vec(),
            Command::SetDefaultRunPage(page) => format!("<RP{}>", page).into_bytes(),
            Command::SetBrightness(brightness) => format!("<B{}>", brightness).into_bytes(),

            Command::SetGlyph { variant, entry, glyph } => {
                let mut payload = format!("<F{}{:02X}>", variant.letter(), entry).into_bytes();
                payload.extend_from_slice(glyph.rows());
                payload
            }

            Command::RecallDefaultFont => b"<DU>".to_vec(),

            Command::Text(ref payload) | Command::Unknown(ref payload) => payload.get().to_vec(),
        }
    }

    /// Wraps the command in a [`Frame`] addressed to `device_id`.
    pub fn to_frame(&self, device_id: DeviceId) -> Frame<'static> {
        Frame::new(device_id, Payload::new(self.payload()))
    }

    /// Interprets payload bytes as received by a sign.
    ///
    /// Payloads that are well-formed but carry out-of-range fields are treated as unknown,
    /// just as the sign would ignore them.
    ///
    /// # Examples
    ///
    /// ```
    /// use am03127_core::{Command, Line, PageId};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// #
    /// let command = Command::from_payload(b"<DL2PC>");
    /// assert_eq!(Command::DeletePage(Line::try_new(2)?, PageId::try_new('C')?), command);
    ///
    /// assert!(matches!(Command::from_payload(b"<DL9PC>"), Command::Unknown(_)));
    /// #
    /// # Ok(()) }
    /// ```
    pub fn from_payload(bytes: &[u8]) -> Command<'static> {
        parse_known(bytes).unwrap_or_else(|| {
            if bytes.starts_with(b"<L") {
                Command::Text(Payload::new(bytes.to_vec()))
            } else {
                Command::Unknown(Payload::new(bytes.to_vec()))
            }
        })
    }
}

impl Display for Command<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Command::SetClock(time) => write!(f, "SetClock [{}]", time),
            Command::SetSchedule {
                schedule,
                ref pages,
                start,
                stop,
            } => write!(f, "SetSchedule [{}] {} to {} pages [{}]", schedule, start, stop, pages),
            Command::SetGraphicsBlock { page, block, .. } => write!(f, "SetGraphicsBlock [{}{}]", page, block),
            Command::DeletePage(line, page) => write!(f, "DeletePage [Line {} Page {}]", line, page),
            Command::DeleteSchedule(schedule) => write!(f, "DeleteSchedule [{}]", schedule),
            Command::DeleteAll => write!(f, "DeleteAll"),
            Command::SetDefaultRunPage(page) => write!(f, "SetDefaultRunPage [{}]", page),
            Command::SetBrightness(brightness) => write!(f, "SetBrightness [{}]", brightness),
            Command::SetGlyph { variant, entry, .. } => write!(f, "SetGlyph [{:?} {:02X}]", variant, entry),
            Command::RecallDefaultFont => write!(f, "RecallDefaultFont"),
            Command::Text(ref payload) => write!(f, "Text [{}]", charset::decode(payload.get())),
            Command::Unknown(ref payload) => write!(f, "Unknown [{}]", payload.get().escape_ascii()),
        }
    }
}

fn short_year(time: DateTime) -> i16 {
    time.year().rem_euclid(100)
}

/// Formats the `yyMMddhhmm` stamp used by schedules.
fn minute_stamp(time: DateTime) -> String {
    format!(
        "{:02}{:02}{:02}{:02}{:02}",
        short_year(time),
        time.month(),
        time.day(),
        time.hour(),
        time.minute()
    )
}

/// Parses every command grammar the sign understands, or `None` if none match.
fn parse_known(bytes: &[u8]) -> Option<Command<'static>> {
    // Regexes are valid so safe to unwrap. Field ranges are left to the domain types.
    lazy_static! {
        static ref CLOCK_RE: Regex = Regex::new(r"(?-u)^<SC>(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})$").unwrap();
        static ref SCHEDULE_RE: Regex = Regex::new(r"(?-u)^<T(.)>(\d{10})(\d{10})([A-Z]*)$").unwrap();
        static ref GRAPHICS_RE: Regex = Regex::new(r"(?s-u)^<G(.)(\d)>(.{64})$").unwrap();
        static ref DELETE_PAGE_RE: Regex = Regex::new(r"(?-u)^<DL(\d)P(.)>$").unwrap();
        static ref DELETE_SCHEDULE_RE: Regex = Regex::new(r"(?-u)^<DT(.)>$").unwrap();
        static ref RUN_PAGE_RE: Regex = Regex::new(r"(?-u)^<RP(.)>$").unwrap();
        static ref BRIGHTNESS_RE: Regex = Regex::new(r"(?-u)^<B(.)>$").unwrap();
        static ref GLYPH_RE: Regex = Regex::new(r"(?s-u)^<F(.)([[:xdigit:]]{2})>(.{8})$").unwrap();
    }

    match bytes {
        b"<D*>" => return Some(Command::DeleteAll),
        b"<DU>" => return Some(Command::RecallDefaultFont),
        _ => {}
    }

    if let Some(c) = CLOCK_RE.captures(bytes) {
        // The weekday (group 2) is derived from the date, so it is not checked.
        let time = civil::DateTime::new(
            2000 + decimal(&c, 1) as i16,
            decimal(&c, 3),
            decimal(&c, 4),
            decimal(&c, 5),
            decimal(&c, 6),
            decimal(&c, 7),
            0,
        )
        .ok()?;
        return Some(Command::SetClock(time));
    }

    if let Some(c) = SCHEDULE_RE.captures(bytes) {
        let pages = std::str::from_utf8(&c[4]).ok()?.parse().ok()?;
        return Some(Command::SetSchedule {
            schedule: ScheduleId::try_new(letter(&c, 1)).ok()?,
            pages,
            start: parse_minute_stamp(&c[2])?,
            stop: parse_minute_stamp(&c[3])?,
        });
    }

    if let Some(c) = GRAPHICS_RE.captures(bytes) {
        let mut packed = [0u8; PACKED_LEN];
        packed.copy_from_slice(&c[3]);
        return Some(Command::SetGraphicsBlock {
            page: GraphicsPage::try_new(letter(&c, 1)).ok()?,
            block: GraphicsBlock::try_new(decimal(&c, 2) as u8).ok()?,
            image: GraphicsImage::unpack(&packed),
        });
    }

    if let Some(c) = DELETE_PAGE_RE.captures(bytes) {
        return Some(Command::DeletePage(
            Line::try_new(decimal(&c, 1) as u8).ok()?,
            PageId::try_new(letter(&c, 2)).ok()?,
        ));
    }

    if let Some(c) = DELETE_SCHEDULE_RE.captures(bytes) {
        return Some(Command::DeleteSchedule(ScheduleId::try_new(letter(&c, 1)).ok()?));
    }

    if let Some(c) = RUN_PAGE_RE.captures(bytes) {
        return Some(Command::SetDefaultRunPage(PageId::try_new(letter(&c, 1)).ok()?));
    }

    if let Some(c) = BRIGHTNESS_RE.captures(bytes) {
        return Some(Command::SetBrightness(Brightness::try_new(letter(&c, 1)).ok()?));
    }

    if let Some(c) = GLYPH_RE.captures(bytes) {
        return Some(Command::SetGlyph {
            variant: FontVariant::try_from(letter(&c, 1)).ok()?,
            entry: parse_radix::<u8>(&c[2], 16),
            glyph: Glyph::try_from(&c[3]).ok()?,
        });
    }

    None
}

/// Returns capture group `i`, which must be ASCII decimal digits, as a number.
fn decimal(captures: &Captures<'_>, i: usize) -> i8 {
    parse_radix::<i8>(&captures[i], 10)
}

/// Returns capture group `i`, which must be a single byte, as a character.
fn letter(captures: &Captures<'_>, i: usize) -> char {
    char::from(captures[i][0])
}

fn parse_minute_stamp(digits: &[u8]) -> Option<DateTime> {
    let field = |i: usize| parse_radix::<i8>(&digits[i * 2..i * 2 + 2], 10);
    civil::DateTime::new(2000 + field(0) as i16, field(1), field(2), field(3), field(4), 0, 0).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use test_case::test_case;

    fn page(letter: char) -> PageId {
        PageId::try_new(letter).unwrap()
    }

    #[test]
    fn set_clock() {
        // 2024-03-15 was a Friday, ISO weekday 5.
        let command = Command::SetClock(civil::datetime(2024, 3, 15, 9, 5, 7, 123));
        assert_eq!(b"<SC>24050315090507".to_vec(), command.payload());
    }

    #[test]
    fn set_clock_sunday() {
        let command = Command::SetClock(civil::datetime(2023, 12, 31, 23, 59, 59, 0));
        assert_eq!(b"<SC>23071231235959".to_vec(), command.payload());
    }

    #[test]
    fn default_schedule() {
        let schedule = ScheduleId::try_new('A').unwrap();
        let command = Command::schedule(schedule, "ABC".parse().unwrap());
        assert_eq!(b"<TA>00010100009912312359ABC".to_vec(), command.payload());
    }

    #[test]
    fn custom_schedule() {
        let command = Command::SetSchedule {
            schedule: ScheduleId::try_new('E').unwrap(),
            pages: "E".parse().unwrap(),
            start: civil::datetime(2025, 6, 1, 8, 30, 0, 0),
            stop: civil::datetime(2025, 6, 1, 17, 45, 59, 0),
        };
        assert_eq!(b"<TE>25060108302506011745E".to_vec(), command.payload());
    }

    #[test]
    fn graphics_block() {
        let mut image = GraphicsImage::new();
        image.set_pixel(0, 0, Color::Red);
        image.set_pixel(2, 0, Color::Orange);
        image.set_pixel(3, 0, Color::Red);
        let command = Command::SetGraphicsBlock {
            page: GraphicsPage::try_new('P').unwrap(),
            block: GraphicsBlock::try_new(8).unwrap(),
            image,
        };

        let payload = command.payload();
        assert_eq!(5 + 64, payload.len());
        assert_eq!(b"<GP8>", &payload[..5]);
        assert_eq!(0x8E, payload[5]);
        assert!(payload[6..].iter().all(|&b| b == 0));
    }

    #[test_case(Command::DeletePage(Line::try_new(3).unwrap(), page('B')), b"<DL3PB>" ; "delete page")]
    #[test_case(Command::DeleteSchedule(ScheduleId::try_new('C').unwrap()), b"<DTC>" ; "delete schedule")]
    #[test_case(Command::DeleteAll, b"<D*>" ; "delete all")]
    #[test_case(Command::SetDefaultRunPage(page('D')), b"<RPD>" ; "run page")]
    #[test_case(Command::SetBrightness(Brightness::try_new('A').unwrap()), b"<BA>" ; "brightness")]
    #[test_case(Command::RecallDefaultFont, b"<DU>" ; "recall font")]
    fn simple_payloads(command: Command<'static>, expected: &[u8]) {
        assert_eq!(expected, command.payload().as_slice());
        assert_eq!(command, Command::from_payload(expected));
    }

    #[test]
    fn glyph_upload() {
        let command = Command::SetGlyph {
            variant: FontVariant::Wide,
            entry: 0xC4,
            glyph: Glyph::new([1, 2, 3, 4, 5, 6, 7, 8]),
        };
        let payload = command.payload();
        assert_eq!(b"<FBC4>\x01\x02\x03\x04\x05\x06\x07\x08".to_vec(), payload);
        assert_eq!(command, Command::from_payload(&payload));
    }

    #[test]
    fn parse_clock() {
        let command = Command::from_payload(b"<SC>24050315090507");
        assert_eq!(Command::SetClock(civil::datetime(2024, 3, 15, 9, 5, 7, 0)), command);
    }

    #[test]
    fn parse_invalid_clock() {
        assert!(matches!(Command::from_payload(b"<SC>24051315090507"), Command::Unknown(_)));
    }

    #[test]
    fn parse_schedule() {
        let command = Command::from_payload(b"<TB>24010100002412312359CA");
        assert_eq!(
            Command::SetSchedule {
                schedule: ScheduleId::try_new('B').unwrap(),
                pages: "CA".parse().unwrap(),
                start: civil::datetime(2024, 1, 1, 0, 0, 0, 0),
                stop: civil::datetime(2024, 12, 31, 23, 59, 0, 0),
            },
            command
        );
    }

    #[test]
    fn parse_graphics_roundtrip() {
        let image: GraphicsImage = "RGOB".repeat(56).parse().unwrap();
        let command = Command::SetGraphicsBlock {
            page: GraphicsPage::try_new('A').unwrap(),
            block: GraphicsBlock::try_new(1).unwrap(),
            image,
        };
        assert_eq!(command, Command::from_payload(&command.payload()));
    }

    #[test_case(b"<BE>" ; "brightness out of range")]
    #[test_case(b"<DL0PA>" ; "line out of range")]
    #[test_case(b"<RPZ>" ; "page out of range")]
    #[test_case(b"<XX>" ; "unknown tag")]
    #[test_case(b"<GA9>" ; "short graphics")]
    fn unknown_payloads(bytes: &[u8]) {
        assert_eq!(Command::Unknown(Payload::new(bytes)), Command::from_payload(bytes));
    }

    #[test]
    fn page_text() {
        let command = Command::text("<L1><PA>Ärger").unwrap();
        let payload = command.payload();
        assert_eq!(b"<L1><PA><U44>rger".to_vec(), payload);
        assert_eq!(command, Command::from_payload(&payload));
        assert_eq!("Text [<L1><PA>Ärger]", command.to_string());
    }

    #[test]
    fn text_encoding_error() {
        let error = Command::text("naïve").unwrap_err();
        assert_eq!('ï', error.character);
    }

    #[test]
    fn frame_wrapping() {
        let frame = Command::DeleteAll.to_frame(DeviceId::try_new(4).unwrap());
        assert_eq!(b"<ID04><D*>6C<E>".to_vec(), frame.to_bytes());
    }
}
