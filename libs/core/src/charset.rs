use std::borrow::Cow;

use thiserror::Error;

/// Error indicating that text contains a character the sign cannot display.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("Character {:?} at position {} cannot be encoded for the sign", character, position)]
pub struct EncodingError {
    /// The character that has no device representation.
    pub character: char,

    /// Index of the character (in `char`s, not bytes) within the original text.
    pub position: usize,
}

/// Extended characters and the escape token the sign firmware uses for each.
pub const SUBSTITUTIONS: &[(char, &str)] = &[
    ('€', "<U00>"),
    ('↑', "<U01>"),
    ('↓', "<U02>"),
    ('→', "<U26>"),
    ('←', "<U27>"),
    ('Ä', "<U44>"),
    ('ä', "<U64>"),
    ('Ü', "<U5C>"),
    ('ü', "<U7C>"),
    ('Ö', "<U56>"),
    ('ö', "<U76>"),
    ('ß', "<U5F>"),
];

/// Returns the escape token for a character, if it has one.
pub fn token_for(character: char) -> Option<&'static str> {
    SUBSTITUTIONS
        .iter()
        .find(|&&(c, _)| c == character)
        .map(|&(_, token)| token)
}

/// Replaces every extended character in `text` with its escape token.
///
/// Characters without a token are left alone, so the result is not necessarily encodable.
/// Borrows when nothing needs replacing.
///
/// # Examples
///
/// ```
/// use am03127_core::charset;
///
/// assert_eq!("5 <U00>", charset::substitute("5 €"));
/// assert_eq!("plain", charset::substitute("plain"));
/// ```
pub fn substitute(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| token_for(c).is_some()) {
        return Cow::Borrowed(text);
    }

    let mut output = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match token_for(c) {
            Some(token) => output.push_str(token),
            None => output.push(c),
        }
    }
    Cow::Owned(output)
}

/// Converts text into the bytes the sign understands.
///
/// Extended characters are substituted first, then everything else must be 7-bit ASCII.
///
/// # Errors
///
/// Returns an [`EncodingError`] for the first character that is neither ASCII nor substitutable.
///
/// # Examples
///
/// ```
/// use am03127_core::charset;
///
/// assert_eq!(b"<U5C>ber".to_vec(), charset::encode("Über").unwrap());
///
/// let error = charset::encode("café").unwrap_err();
/// assert_eq!('é', error.character);
/// assert_eq!(3, error.position);
/// ```
pub fn encode(text: &str) -> Result<Vec<u8>, EncodingError> {
    let mut output = Vec::with_capacity(text.len());
    for (position, character) in text.chars().enumerate() {
        if let Some(token) = token_for(character) {
            output.extend_from_slice(token.as_bytes());
        } else if character.is_ascii() {
            output.push(character as u8);
        } else {
            return Err(EncodingError { character, position });
        }
    }
    Ok(output)
}

/// Converts bytes received by a sign back into readable text, restoring extended characters.
///
/// Non-ASCII bytes are shown as the Unicode replacement character.
pub fn decode(bytes: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    for &(character, token) in SUBSTITUTIONS {
        if text.contains(token) {
            text = text.replace(token, character.encode_utf8(&mut [0; 4]));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("€", "<U00>" ; "euro")]
    #[test_case("↑↓", "<U01><U02>" ; "arrows")]
    #[test_case("Größe", "Gr<U76><U5F>e" ; "german")]
    #[test_case("→ÄäÜüÖö←", "<U26><U44><U64><U5C><U7C><U56><U76><U27>" ; "whole table")]
    fn substitutions(input: &str, expected: &str) {
        assert_eq!(expected, substitute(input));
        assert_eq!(expected.as_bytes(), encode(input).unwrap().as_slice());
    }

    #[test]
    fn plain_text_borrowed() {
        assert!(matches!(substitute("<L1>Hello"), Cow::Borrowed("<L1>Hello")));
    }

    #[test]
    fn unmappable_rejected() {
        let error = encode("café").unwrap_err();
        assert_eq!(EncodingError { character: 'é', position: 3 }, error);

        let copied = error;
        assert_eq!(copied, error);
    }

    #[test]
    fn position_counts_chars() {
        let error = encode("€€ñ").unwrap_err();
        assert_eq!(2, error.position);
    }

    #[test]
    fn control_characters_pass_through() {
        assert_eq!(vec![b'a', 0x0D, b'b'], encode("a\rb").unwrap());
    }

    #[test]
    fn decode_restores_table() {
        assert_eq!("Grüße €", decode(b"Gr<U7C><U5F>e <U00>"));
    }
}
