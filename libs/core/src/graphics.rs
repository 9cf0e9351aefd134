use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::ValidationError;

/// Width of a graphics block in pixels.
pub const WIDTH: usize = 32;

/// Visible height of a graphics block in pixels.
pub const HEIGHT: usize = 7;

/// Number of pixels in a [`GraphicsImage`].
pub const PIXELS: usize = WIDTH * HEIGHT;

/// Length of a packed graphics block on the wire.
pub const PACKED_LEN: usize = 64;

/// The color of a single LED.
///
/// Each color is represented on the wire by two bits: the low bit drives the green
/// element and the high bit drives the red one, so orange is both.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Off.
    #[default]
    Black,

    /// Green element only.
    Green,

    /// Red element only.
    Red,

    /// Both elements.
    Orange,
}

impl Color {
    /// Returns the two-bit wire code for this color.
    ///
    /// # Examples
    ///
    /// ```
    /// use am03127_core::Color;
    ///
    /// assert_eq!(0b00, Color::Black.bits());
    /// assert_eq!(0b01, Color::Green.bits());
    /// assert_eq!(0b10, Color::Red.bits());
    /// assert_eq!(0b11, Color::Orange.bits());
    /// ```
    pub fn bits(self) -> u8 {
        match self {
            Color::Black => 0b00,
            Color::Green => 0b01,
            Color::Red => 0b10,
            Color::Orange => 0b11,
        }
    }

    /// Returns the color for a two-bit wire code. Only the low two bits are considered.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Color::Black,
            0b01 => Color::Green,
            0b10 => Color::Red,
            _ => Color::Orange,
        }
    }

    /// Returns the letter used for this color in textual images.
    pub fn symbol(self) -> char {
        match self {
            Color::Black => 'B',
            Color::Green => 'G',
            Color::Red => 'R',
            Color::Orange => 'O',
        }
    }

    /// Parses a textual image symbol. `.` is accepted as an alias for black.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'B' | '.' => Some(Color::Black),
            'G' => Some(Color::Green),
            'R' => Some(Color::Red),
            'O' => Some(Color::Orange),
            _ => None,
        }
    }
}

/// A 7 x 32 image for one graphics block.
///
/// # Examples
///
/// ```
/// use am03127_core::{Color, GraphicsImage};
///
/// let mut image = GraphicsImage::new();
/// image.set_pixel(0, 0, Color::Red);
/// image.set_pixel(2, 0, Color::Orange);
/// image.set_pixel(3, 0, Color::Red);
///
/// let packed = image.pack();
/// assert_eq!(0x8E, packed[0]);
/// assert_eq!(image, GraphicsImage::unpack(&packed));
/// ```
///
/// # Format Details
///
/// The sign actually receives an 8 x 32 image whose last row is unused. Each packed byte
/// holds four horizontally adjacent pixels, leftmost pixel in the most significant bits.
/// The bytes are laid out in column pairs:
///
/// ```text
///          Columns
///          0-3 4-7  8-11 12-15 16-19 20-23 24-27 28-31
///        ┌────┬────┬────┬────┬────┬────┬────┬────┐
///  Row 0 │  0 │  1 │ 16 │ 17 │ 32 │ 33 │ 48 │ 49 │
///      1 │  2 │  3 │ 18 │ 19 │ 34 │ 35 │ 50 │ 51 │
///     .. │ .. │ .. │ .. │ .. │ .. │ .. │ .. │ .. │
///      6 │ 12 │ 13 │ 28 │ 29 │ 44 │ 45 │ 60 │ 61 │
///      7 │ 14 │ 15 │ 30 │ 31 │ 46 │ 47 │ 62 │ 63 │ <- always black
///        └────┴────┴────┴────┴────┴────┴────┴────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_copy_implementations)]
pub struct GraphicsImage {
    pixels: [Color; PIXELS],
}

impl GraphicsImage {
    /// Creates a new all-black image.
    pub fn new() -> Self {
        GraphicsImage {
            pixels: [Color::Black; PIXELS],
        }
    }

    /// Creates an image from exactly 224 row-major pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::WrongPixelCount`] if the slice has the wrong length.
    pub fn from_pixels(pixels: &[Color]) -> Result<Self, ValidationError> {
        if pixels.len() != PIXELS {
            return Err(ValidationError::WrongPixelCount {
                expected: PIXELS,
                actual: pixels.len(),
            });
        }
        let mut image = GraphicsImage::new();
        image.pixels.copy_from_slice(pixels);
        Ok(image)
    }

    /// Returns the pixels in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Returns the color of the pixel at column `x` and row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is out of bounds.
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        self.pixels[Self::index(x, y)]
    }

    /// Sets the color of the pixel at column `x` and row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is out of bounds.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        self.pixels[Self::index(x, y)] = color;
    }

    /// Packs the image into the 64-byte block format the sign expects.
    pub fn pack(&self) -> [u8; PACKED_LEN] {
        let mut packed = [0u8; PACKED_LEN];
        for (i, byte) in packed.iter_mut().enumerate() {
            let (x, y) = Self::packed_origin(i);
            if y == HEIGHT {
                continue; // Padding row
            }
            *byte = (0..4).fold(0, |acc, k| acc * 4 + self.get_pixel(x + k, y).bits());
        }
        packed
    }

    /// Reverses [`pack`](Self::pack). The unused eighth row is ignored.
    pub fn unpack(packed: &[u8; PACKED_LEN]) -> Self {
        let mut image = GraphicsImage::new();
        for (i, &byte) in packed.iter().enumerate() {
            let (x, y) = Self::packed_origin(i);
            if y == HEIGHT {
                continue;
            }
            for k in 0..4 {
                image.set_pixel(x + k, y, Color::from_bits(byte >> (6 - 2 * k)));
            }
        }
        image
    }

    /// Returns the coordinate of the leftmost pixel stored in packed byte `i`.
    fn packed_origin(i: usize) -> (usize, usize) {
        let column_group = (i % 2) + (i / 16) * 2;
        let row = (i / 2) % 8;
        (4 * column_group, row)
    }

    fn index(x: usize, y: usize) -> usize {
        if x >= WIDTH || y >= HEIGHT {
            panic!(
                "Coordinate ({}, {}) out of bounds for graphics block of size {} x {}",
                x, y, WIDTH, HEIGHT
            );
        }
        y * WIDTH + x
    }
}

impl Default for GraphicsImage {
    fn default() -> Self {
        GraphicsImage::new()
    }
}

impl FromStr for GraphicsImage {
    type Err = ValidationError;

    /// Parses 224 color symbols (`B`, `G`, `R`, `O`, or `.` for black) in row-major order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pixels = s
            .chars()
            .enumerate()
            .map(|(index, symbol)| Color::from_symbol(symbol).ok_or(ValidationError::InvalidPixel { symbol, index }))
            .collect::<Result<Vec<_>, _>>()?;
        GraphicsImage::from_pixels(&pixels)
    }
}

impl Display for GraphicsImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let border = str::repeat("-", WIDTH);
        writeln!(f, "+{}+", border)?;
        for row in self.pixels.chunks(WIDTH) {
            write!(f, "|")?;
            for &color in row {
                let dot = if color == Color::Black { ' ' } else { color.symbol() };
                write!(f, "{}", dot)?;
            }
            writeln!(f, "|")?;
        }
        write!(f, "+{}+", border)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn black_packs_to_zeros() {
        assert_eq!([0u8; PACKED_LEN], GraphicsImage::new().pack());
    }

    #[test]
    fn documented_example() {
        let mut symbols = String::from("RBOR");
        symbols.push_str(&"B".repeat(PIXELS - 4));
        let image: GraphicsImage = symbols.parse().unwrap();
        let packed = image.pack();
        assert_eq!(0x8E, packed[0]);
        assert!(packed[1..].iter().all(|&b| b == 0));
    }

    #[test_case(0, 0, Color::Orange, 0, 0xC0 ; "top left")]
    #[test_case(31, 0, Color::Green, 49, 0x01 ; "top right")]
    #[test_case(0, 6, Color::Orange, 12, 0xC0 ; "bottom left")]
    #[test_case(8, 3, Color::Red, 22, 0x80 ; "second column pair")]
    #[test_case(29, 6, Color::Red, 61, 0x20 ; "bottom right group")]
    fn single_pixel_placement(x: usize, y: usize, color: Color, index: usize, value: u8) {
        let mut image = GraphicsImage::new();
        image.set_pixel(x, y, color);
        let packed = image.pack();
        assert_eq!(value, packed[index]);
        assert_eq!(1, packed.iter().filter(|&&b| b != 0).count());
    }

    #[test]
    fn padding_row_always_zero() {
        let image: GraphicsImage = "O".repeat(PIXELS).parse().unwrap();
        let packed = image.pack();
        for (i, &byte) in packed.iter().enumerate() {
            let expected = if (i / 2) % 8 == 7 { 0x00 } else { 0xFF };
            assert_eq!(expected, byte, "byte {}", i);
        }
    }

    #[test]
    fn unpack_reverses_pack() {
        let mut image = GraphicsImage::new();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                image.set_pixel(x, y, Color::from_bits((x + 3 * y) as u8));
            }
        }
        assert_eq!(image, GraphicsImage::unpack(&image.pack()));
    }

    #[test]
    fn dot_is_black() {
        let image: GraphicsImage = ".".repeat(PIXELS).parse().unwrap();
        assert_eq!(GraphicsImage::new(), image);
    }

    #[test]
    fn wrong_length_rejected() {
        let error = "B".repeat(PIXELS - 1).parse::<GraphicsImage>().unwrap_err();
        assert_eq!(ValidationError::WrongPixelCount { expected: 224, actual: 223 }, error);

        let error = GraphicsImage::from_pixels(&[Color::Red; PIXELS + 1]).unwrap_err();
        assert_eq!(ValidationError::WrongPixelCount { expected: 224, actual: 225 }, error);
    }

    #[test]
    fn bad_symbol_rejected() {
        let mut symbols = "G".repeat(PIXELS);
        symbols.replace_range(10..11, "Y");
        let error = symbols.parse::<GraphicsImage>().unwrap_err();
        assert_eq!(ValidationError::InvalidPixel { symbol: 'Y', index: 10 }, error);
    }

    #[test]
    #[should_panic]
    fn out_of_bounds_row() {
        let mut image = GraphicsImage::new();
        image.set_pixel(0, 7, Color::Red);
    }

    #[test]
    fn display() {
        let mut image = GraphicsImage::new();
        image.set_pixel(0, 0, Color::Red);
        image.set_pixel(31, 6, Color::Green);
        let display = image.to_string();
        let lines: Vec<&str> = display.lines().collect();
        assert_eq!(9, lines.len());
        assert!(lines[1].starts_with("|R "));
        assert!(lines[7].ends_with(" G|"));
    }
}
