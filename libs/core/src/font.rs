use crate::ValidationError;

/// Which of the sign's three European character tables a custom glyph replaces.
///
/// All glyphs are eight rows of eight bits; the variants differ in how far the
/// sign advances the column pointer after drawing one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontVariant {
    /// Table `A`: 5 pixel glyphs.
    Normal,

    /// Table `B`: 6 pixel glyphs.
    Wide,

    /// Table `C`: 4 pixel glyphs.
    Narrow,
}

impl FontVariant {
    /// Returns the table letter used on the wire.
    pub fn letter(self) -> char {
        match self {
            FontVariant::Normal => 'A',
            FontVariant::Wide => 'B',
            FontVariant::Narrow => 'C',
        }
    }

    /// Returns the number of leftmost bits a glyph conventionally occupies.
    pub fn glyph_width(self) -> u32 {
        match self {
            FontVariant::Normal => 5,
            FontVariant::Wide => 6,
            FontVariant::Narrow => 4,
        }
    }

    /// Returns how many columns the sign advances after each glyph (glyph plus one spacing column).
    pub fn column_advance(self) -> u32 {
        self.glyph_width() + 1
    }
}

impl TryFrom<char> for FontVariant {
    type Error = ValidationError;

    fn try_from(letter: char) -> Result<Self, Self::Error> {
        match letter {
            'A' => Ok(FontVariant::Normal),
            'B' => Ok(FontVariant::Wide),
            'C' => Ok(FontVariant::Narrow),
            _ => Err(ValidationError::OutOfRange {
                field: "font variant",
                value: format!("{:?}", letter),
                valid: "'A' to 'C'",
            }),
        }
    }
}

/// The bitmap of one custom character: eight rows, most significant bit leftmost.
///
/// # Examples
///
/// ```
/// use am03127_core::Glyph;
///
/// let glyph = Glyph::try_from(&[0x70, 0x88, 0x88, 0xF8, 0x88, 0x88, 0x88, 0x00][..]).unwrap();
/// assert_eq!(0xF8, glyph.rows()[3]);
///
/// assert!(Glyph::try_from(&[0x00; 7][..]).is_err());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Glyph([u8; Glyph::ROWS]);

impl Glyph {
    /// Number of rows (and bytes) in a glyph.
    pub const ROWS: usize = 8;

    /// Creates a glyph from its eight row bytes.
    pub fn new(rows: [u8; Glyph::ROWS]) -> Self {
        Glyph(rows)
    }

    /// Returns the row bytes.
    pub fn rows(&self) -> &[u8; Glyph::ROWS] {
        &self.0
    }

    /// Returns whether any row lights pixels beyond the variant's conventional glyph width.
    pub fn exceeds(&self, variant: FontVariant) -> bool {
        let mask = 0xFFu8 >> variant.glyph_width();
        self.0.iter().any(|row| row & mask != 0)
    }
}

impl TryFrom<&[u8]> for Glyph {
    type Error = ValidationError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let rows = <[u8; Glyph::ROWS]>::try_from(bytes).map_err(|_| ValidationError::WrongGlyphLength {
            expected: Glyph::ROWS,
            actual: bytes.len(),
        })?;
        Ok(Glyph(rows))
    }
}
