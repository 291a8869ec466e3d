/// Persian digit glyphs, indexed by their Western value
const PERSIAN_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];

/// Maps a single Persian digit glyph to its Western counterpart
pub fn western_digit(c: char) -> Option<char> {
    PERSIAN_DIGITS
        .iter()
        .position(|&d| d == c)
        .and_then(|value| char::from_digit(value as u32, 10))
}

/// Replaces every Persian digit in `text` with the matching Western digit.
///
/// All other characters, including separators and Latin digits, pass through unchanged.
pub fn normalize_digits(text: &str) -> String {
    text.chars().map(|c| western_digit(c).unwrap_or(c)).collect()
}
