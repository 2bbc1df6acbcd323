//! Delimiter selection
//!
//! Values are never escaped. Instead the encoder picks the first candidate
//! that occurs in no parameter value.

/// Candidate delimiters, in trial order
pub const DELIMITERS: [char; 9] = [' ', '^', '!', '$', '%', '@', '#', '*', '~'];

/// Delimiter used when there is nothing to separate ambiguously
pub const DEFAULT_DELIMITER: char = ' ';

/// Pick the first candidate absent from every value.
///
/// Returns `None` when every candidate collides with some value. With no
/// values the first candidate is returned.
pub fn select_delimiter<'a, I>(candidates: &[char], values: I) -> Option<char>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: Clone,
{
    let values = values.into_iter();
    candidates
        .iter()
        .copied()
        .find(|&candidate| values.clone().all(|value| !value.contains(candidate)))
}
