// 🇲🇲 Myanmar Script - digit transliteration for display
// Only glyphs change. The numeric value behind the text is never touched.

use std::fmt::Display;

use crate::currency::group_thousands;

/// Western Arabic digits, index-aligned with `MYANMAR_DIGITS`
pub const WESTERN_DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Myanmar digits U+1040..=U+1049
pub const MYANMAR_DIGITS: [char; 10] = ['၀', '၁', '၂', '၃', '၄', '၅', '၆', '၇', '၈', '၉'];

/// Fraction digits kept by `format_myanmar_currency`
const MAX_FRACTION_DIGITS: usize = 3;

/// Check if a char is one of the Myanmar digit glyphs
pub fn is_myanmar_digit(c: char) -> bool {
    MYANMAR_DIGITS.contains(&c)
}

/// Check if any Myanmar digit appears in the text
pub fn contains_myanmar_digits(text: &str) -> bool {
    text.chars().any(is_myanmar_digit)
}

/// Replace Western digits with Myanmar digits
///
/// Anything that is not a digit (commas, dots, spaces, suffixes) passes through.
///
/// # Examples:
/// ```
/// use kyatflow::myanmar::to_myanmar_digits;
/// assert_eq!(to_myanmar_digits("1,500"), "၁,၅၀၀");
/// assert_eq!(to_myanmar_digits(42), "၄၂");
/// ```
pub fn to_myanmar_digits<T: Display>(input: T) -> String {
    transliterate(&input.to_string(), &WESTERN_DIGITS, &MYANMAR_DIGITS)
}

/// Replace Myanmar digits with Western digits
pub fn from_myanmar_digits(input: &str) -> String {
    transliterate(input, &MYANMAR_DIGITS, &WESTERN_DIGITS)
}

fn transliterate(input: &str, from: &[char; 10], to: &[char; 10]) -> String {
    input
        .chars()
        .map(|c| match from.iter().position(|&d| d == c) {
            Some(idx) => to[idx],
            None => c,
        })
        .collect()
}

/// Format an amount with thousands grouping, optionally in Myanmar digits
///
/// Up to 3 fraction digits are kept and trailing zeros are trimmed, so whole
/// amounts carry no decimal point.
///
/// # Examples:
/// ```
/// use kyatflow::myanmar::format_myanmar_currency;
/// assert_eq!(format_myanmar_currency(1234567.0, false), "1,234,567");
/// assert_eq!(format_myanmar_currency(1234567.0, true), "၁,၂၃၄,၅၆၇");
/// ```
pub fn format_myanmar_currency(amount: f64, use_myanmar_digits: bool) -> String {
    let grouped = group_locale(amount);

    if use_myanmar_digits {
        to_myanmar_digits(grouped)
    } else {
        grouped
    }
}

fn group_locale(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let text = format!("{:.*}", MAX_FRACTION_DIGITS, amount);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let int_part = if int_part == "-0" && frac_part.is_empty() {
        "0"
    } else {
        int_part
    };

    if frac_part.is_empty() {
        group_thousands(int_part)
    } else {
        format!("{}.{}", group_thousands(int_part), frac_part)
    }
}
