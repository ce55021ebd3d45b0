//! Ordinal position phrasing.

/// 1-based ordinal phrase for a zero-based index.
///
/// Standard English suffix rule: a tens digit of 1 forces "th" regardless of
/// the units digit (11th, 12th, 13th, 111th).
pub fn ordinal(index: usize) -> String {
    let position = index + 1;
    let units = position % 10;
    let tens = position % 100;
    let suffix = match units {
        1 if tens != 11 => "st",
        2 if tens != 12 => "nd",
        3 if tens != 13 => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}
