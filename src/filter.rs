//! Low-information article filter.

/// Minimum trimmed length, in characters, of an article worth extracting.
pub const DEFAULT_MIN_LENGTH: usize = 200;

/// `true` when `text`, trimmed, is at least `min_length` characters long.
///
/// Length is counted in Unicode scalar values, not bytes.
pub fn is_high_information(text: &str, min_length: usize) -> bool {
    text.trim().chars().count() >= min_length
}
