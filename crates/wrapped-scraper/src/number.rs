//! Free-form numeric text to [`Metric`].
//!
//! Commas are always thousands separators, never decimal separators. Unit
//! suffixes are not understood: `"12.5K"` parses as `12.5`. Malformed input
//! yields `None`, never an error.

use wrapped_core::Metric;

/// Parses dashboard numeric text.
///
/// Every character other than an ASCII digit, `.` or `,` is dropped, then
/// commas are dropped. Text with a period is parsed as a decimal using the
/// longest valid prefix (`"1.2.3"` → `1.2`); otherwise as an integer.
#[must_use]
pub fn parse_number(input: Option<&str>) -> Option<Metric> {
    let cleaned: String = input?
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    if cleaned.contains('.') {
        return parse_decimal_prefix(&cleaned).map(Metric::Float);
    }

    match cleaned.parse::<u64>() {
        Ok(n) => Some(Metric::Int(n)),
        // Too many digits for u64; keep the magnitude as a float.
        Err(_) => cleaned
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Metric::Float),
    }
}

/// Parses the leading `digits[.digits]` of a string made of digits and
/// periods only.
fn parse_decimal_prefix(cleaned: &str) -> Option<f64> {
    let bytes = cleaned.as_bytes();
    let int_end = bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len());
    let int_part = &cleaned[..int_end];

    let frac_part = if int_end < bytes.len() && bytes[int_end] == b'.' {
        let rest = &cleaned[int_end + 1..];
        let frac_end = rest
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..frac_end]
    } else {
        ""
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let literal = if frac_part.is_empty() {
        int_part.to_owned()
    } else {
        format!("{int_part}.{frac_part}")
    };

    literal.parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Returns the first run of digits, commas and periods that contains at
/// least one digit, e.g. `"1,234"` from `"1,234 reactions"`.
#[must_use]
pub fn first_numeric_run(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let len = bytes.len();
    let is_run_byte = |b: u8| b.is_ascii_digit() || b == b',' || b == b'.';
    let mut i = 0usize;

    while i < len {
        if !is_run_byte(bytes[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < len && is_run_byte(bytes[i]) {
            i += 1;
        }
        if bytes[start..i].iter().any(u8::is_ascii_digit) {
            return Some(&s[start..i]);
        }
    }
    None
}
