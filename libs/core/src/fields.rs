use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use derive_more::{Display, LowerHex, UpperHex};
use thiserror::Error;

/// Errors indicating that a value lies outside the domain the sign protocol accepts.
///
/// These are always raised while building a command, before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// A field value was outside its allowed range.
    #[error("{} is not a valid {}: Expected {}", value, field, valid)]
    OutOfRange {
        /// Name of the field being validated.
        field: &'static str,

        /// The rejected value, formatted for display.
        value: String,

        /// Description of the allowed range.
        valid: &'static str,
    },

    /// A [`PageSchedule`] referenced too many pages.
    #[error("Page schedule may reference at most {} pages, got {}", max, actual)]
    TooManyPages {
        /// The maximum number of pages.
        max: usize,

        /// The number of pages provided.
        actual: usize,
    },

    /// A graphics image did not contain exactly 7 x 32 pixels.
    #[error("Graphics image must contain {} pixels, got {}", expected, actual)]
    WrongPixelCount {
        /// The required number of pixels.
        expected: usize,

        /// The number of pixels provided.
        actual: usize,
    },

    /// A graphics image contained a symbol that is not a known color.
    #[error("Invalid pixel symbol {:?} at index {}", symbol, index)]
    InvalidPixel {
        /// The offending symbol.
        symbol: char,

        /// Position of the symbol in the image data.
        index: usize,
    },

    /// Custom glyph data was not exactly 8 bytes.
    #[error("Glyph data must be {} bytes, got {}", expected, actual)]
    WrongGlyphLength {
        /// The required number of bytes.
        expected: usize,

        /// The number of bytes provided.
        actual: usize,
    },
}

// Every bounded numeric field of the protocol has the same shape: a u8 checked once on
// construction and immutable afterwards.
macro_rules! numeric_field {
    ($(#[$attr:meta])* $name:ident, $field:expr, $min:expr, $max:expr) => {
        $(#[$attr])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, LowerHex, UpperHex)]
        pub struct $name(u8);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "`, which must be in the range ",
                stringify!($min), " to ", stringify!($max), " inclusive.")]
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::OutOfRange`] if the value is out of range.
            pub fn try_new(value: u8) -> Result<Self, ValidationError> {
                if ($min..=$max).contains(&value) {
                    Ok($name(value))
                } else {
                    Err(ValidationError::OutOfRange {
                        field: $field,
                        value: value.to_string(),
                        valid: concat!(stringify!($min), " to ", stringify!($max)),
                    })
                }
            }

            /// Returns the numeric value.
            pub fn get(self) -> u8 {
                self.0
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ValidationError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                Self::try_new(value)
            }
        }
    };
}

// Same as above for the single-letter fields.
macro_rules! letter_field {
    ($(#[$attr:meta])* $name:ident, $field:expr, $first:expr, $last:expr) => {
        $(#[$attr])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
        pub struct $name(char);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "`, which must be an uppercase letter from ",
                stringify!($first), " to ", stringify!($last), " inclusive.")]
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::OutOfRange`] if the letter is out of range.
            pub fn try_new(letter: char) -> Result<Self, ValidationError> {
                if ($first..=$last).contains(&letter) {
                    Ok($name(letter))
                } else {
                    Err(ValidationError::OutOfRange {
                        field: $field,
                        value: format!("{:?}", letter),
                        valid: concat!(stringify!($first), " to ", stringify!($last)),
                    })
                }
            }

            /// Returns the letter.
            pub fn letter(self) -> char {
                self.0
            }

            /// Returns the letter as its single ASCII byte.
            pub fn as_byte(self) -> u8 {
                // Range check on construction guarantees ASCII.
                self.0 as u8
            }
        }

        impl TryFrom<char> for $name {
            type Error = ValidationError;

            fn try_from(letter: char) -> Result<Self, Self::Error> {
                Self::try_new(letter)
            }
        }
    };
}

numeric_field!(
    /// The ID of a sign, used to address it on a shared bus.
    ///
    /// # Examples
    ///
    /// ```
    /// use am03127_core::DeviceId;
    ///
    /// assert_eq!(3, DeviceId::try_new(3).unwrap().get());
    /// assert!(DeviceId::try_new(0).is_err());
    /// assert!(DeviceId::try_new(9).is_err());
    /// ```
    DeviceId, "device ID", 1, 8
);

numeric_field!(
    /// One of the sign's eight independent message lines.
    Line, "line", 1, 8
);

numeric_field!(
    /// Index of a 7 x 32 block within a [`GraphicsPage`].
    GraphicsBlock, "graphics block", 1, 8
);

letter_field!(
    /// A message page stored on the sign.
    ///
    /// # Examples
    ///
    /// ```
    /// use am03127_core::PageId;
    ///
    /// let page = PageId::try_new('C').unwrap();
    /// assert_eq!('C', page.letter());
    /// assert!(PageId::try_new('F').is_err());
    /// ```
    PageId, "page", 'A', 'E'
);

letter_field!(
    /// A timed schedule stored on the sign.
    ScheduleId, "schedule", 'A', 'E'
);

letter_field!(
    /// One of the four display brightness levels, `A` being the brightest.
    Brightness, "brightness", 'A', 'D'
);

letter_field!(
    /// One of the sixteen graphics pages, each holding eight [`GraphicsBlock`]s.
    GraphicsPage, "graphics page", 'A', 'P'
);

/// The ordered list of pages a schedule cycles through.
///
/// # Examples
///
/// ```
/// use am03127_core::PageSchedule;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// #
/// let schedule: PageSchedule = "ABA".parse()?;
/// assert_eq!(3, schedule.pages().len());
/// assert_eq!("ABA", schedule.to_string());
///
/// assert!("AXB".parse::<PageSchedule>().is_err());
/// #
/// # Ok(()) }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PageSchedule(Vec<PageId>);

impl PageSchedule {
    /// The maximum number of pages a schedule may reference.
    pub const MAX_PAGES: usize = 31;

    /// Creates a new `PageSchedule` from a sequence of pages.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TooManyPages`] if more than [`MAX_PAGES`](Self::MAX_PAGES) are given.
    pub fn try_new<I: IntoIterator<Item = PageId>>(pages: I) -> Result<Self, ValidationError> {
        let pages: Vec<PageId> = pages.into_iter().collect();
        if pages.len() > Self::MAX_PAGES {
            return Err(ValidationError::TooManyPages {
                max: Self::MAX_PAGES,
                actual: pages.len(),
            });
        }
        Ok(PageSchedule(pages))
    }

    /// Returns the pages in order.
    pub fn pages(&self) -> &[PageId] {
        &self.0
    }
}

impl FromStr for PageSchedule {
    type Err = ValidationError;

    /// Parses a string of page letters such as `"ABC"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pages = s.chars().map(PageId::try_new).collect::<Result<Vec<_>, _>>()?;
        PageSchedule::try_new(pages)
    }
}

impl Display for PageSchedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for page in &self.0 {
            write!(f, "{}", page)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1 ; "lowest")]
    #[test_case(5 ; "middle")]
    #[test_case(8 ; "highest")]
    fn device_id_accepted(value: u8) {
        let id = DeviceId::try_new(value).unwrap();
        assert_eq!(value, id.get());
        assert_eq!(format!("{:02X}", value), format!("{:02X}", id));
    }

    #[test_case(0 ; "zero")]
    #[test_case(9 ; "just over")]
    #[test_case(255 ; "max")]
    fn device_id_rejected(value: u8) {
        let error = DeviceId::try_new(value).unwrap_err();
        assert!(matches!(error, ValidationError::OutOfRange { field: "device ID", .. }));
    }

    #[test_case('A', true ; "first")]
    #[test_case('E', true ; "last")]
    #[test_case('F', false ; "past end")]
    #[test_case('a', false ; "lowercase")]
    #[test_case('@', false ; "before start")]
    fn page_letters(letter: char, valid: bool) {
        assert_eq!(valid, PageId::try_new(letter).is_ok());
        assert_eq!(valid, ScheduleId::try_new(letter).is_ok());
    }

    #[test]
    fn brightness_range() {
        assert!(Brightness::try_new('A').is_ok());
        assert!(Brightness::try_new('D').is_ok());
        assert!(Brightness::try_new('E').is_err());
    }

    #[test]
    fn graphics_ranges() {
        assert!(GraphicsPage::try_new('P').is_ok());
        assert!(GraphicsPage::try_new('Q').is_err());
        assert!(GraphicsBlock::try_new(8).is_ok());
        assert!(GraphicsBlock::try_new(0).is_err());
        assert!(Line::try_new(9).is_err());
    }

    #[test]
    fn letter_bytes() {
        assert_eq!(b'P', GraphicsPage::try_new('P').unwrap().as_byte());
        assert_eq!("B", Brightness::try_new('B').unwrap().to_string());
    }

    #[test]
    fn page_schedule_limits() {
        let full = "A".repeat(31);
        assert_eq!(31, full.parse::<PageSchedule>().unwrap().pages().len());

        let error = "A".repeat(32).parse::<PageSchedule>().unwrap_err();
        assert_eq!(ValidationError::TooManyPages { max: 31, actual: 32 }, error);

        assert!("".parse::<PageSchedule>().unwrap().pages().is_empty());
    }

    #[test]
    fn page_schedule_rejects_bad_letter() {
        let error = "ABZ".parse::<PageSchedule>().unwrap_err();
        assert!(matches!(error, ValidationError::OutOfRange { field: "page", .. }));
    }
}
