//! Decimal precision helpers
//!
//! Pure string operations. Input arrives straight from form fields, so the
//! helpers never parse to a number: precision is judged on the characters
//! after the decimal point, which keeps binary floating-point artifacts out
//! of the picture.

/// Truncate (never round) the fractional part of `value` to `max_decimals`.
///
/// - integer-only input is returned unchanged
/// - empty input returns empty
/// - non-numeric input is returned unchanged; callers validate separately
/// - `max_decimals == 0` drops the fractional part and the point
pub fn truncate_decimals(value: &str, max_decimals: u32) -> String {
    if value.is_empty() || !is_numeric(value) {
        return value.to_string();
    }

    match value.split_once('.') {
        None => value.to_string(),
        Some((int_part, frac_part)) => {
            let keep = max_decimals as usize;
            if keep == 0 {
                // ".5" collapses to "0", not to an empty string
                if int_part.is_empty() || int_part == "-" {
                    format!("{int_part}0")
                } else {
                    int_part.to_string()
                }
            } else if frac_part.len() <= keep {
                value.to_string()
            } else {
                format!("{}.{}", int_part, &frac_part[..keep])
            }
        }
    }
}

/// Number of significant digits after the decimal point.
///
/// Trailing zeros do not count: `"0.1000"` has one decimal place.
pub fn decimal_places(value: &str) -> u32 {
    match value.trim().split_once('.') {
        None => 0,
        Some((_, frac)) => frac.trim_end_matches('0').len() as u32,
    }
}

/// True for an optionally signed run of digits with at most one decimal point
/// and at least one digit (`"12"`, `"-0.5"`, `".5"`, `"3."`)
pub fn is_numeric(value: &str) -> bool {
    let body = value.strip_prefix('-').unwrap_or(value);
    let mut digits = 0usize;
    let mut points = 0usize;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}
