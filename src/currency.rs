// 💱 Currency Formatting - Kyat / Lakh conversion and display
// Amounts are always stored in base units (Kyats). Lakhs exist only at the display edge.

use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Base units (Kyats) per large display unit (Lakh)
pub const KYATS_PER_LAKH: f64 = 100_000.0;

/// Suffix appended to base-unit amounts
pub const KYAT_SUFFIX: &str = "MMK";

/// Suffix appended to large-unit amounts
pub const LAKH_SUFFIX: &str = "Lakhs";

// ============================================================================
// DISPLAY UNIT
// ============================================================================

/// DisplayUnit - Which unit amounts are rendered in
///
/// Exactly one unit is active at a time. The choice is a user preference and is
/// passed into every formatting call (see `preferences::AmountFormatter`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayUnit {
    #[default]
    Kyat,
    Lakh,
}

impl DisplayUnit {
    /// Map the UI toggle ("show in Lakhs") to a unit
    pub fn from_lakh_toggle(use_lakhs: bool) -> Self {
        if use_lakhs {
            DisplayUnit::Lakh
        } else {
            DisplayUnit::Kyat
        }
    }

    /// English suffix for this unit
    pub fn suffix(&self) -> &'static str {
        match self {
            DisplayUnit::Kyat => KYAT_SUFFIX,
            DisplayUnit::Lakh => LAKH_SUFFIX,
        }
    }

    /// Short code for internal use
    pub fn code(&self) -> &'static str {
        match self {
            DisplayUnit::Kyat => "kyat",
            DisplayUnit::Lakh => "lakh",
        }
    }

    /// Convert a base-unit amount into this unit
    pub fn from_kyats(&self, amount: f64) -> f64 {
        match self {
            DisplayUnit::Kyat => amount,
            DisplayUnit::Lakh => to_lakhs(amount),
        }
    }

    /// Convert a value expressed in this unit back to Kyats
    pub fn to_kyats(&self, value: f64) -> f64 {
        match self {
            DisplayUnit::Kyat => value,
            DisplayUnit::Lakh => to_kyats(value),
        }
    }
}

// ============================================================================
// UNIT CONVERTER
// ============================================================================

/// Convert Kyats to Lakhs
///
/// Non-finite input (NaN, ±inf) propagates unchanged; it never panics.
pub fn to_lakhs(amount: f64) -> f64 {
    amount / KYATS_PER_LAKH
}

/// Convert Lakhs to Kyats
pub fn to_kyats(lakhs: f64) -> f64 {
    lakhs * KYATS_PER_LAKH
}

// ============================================================================
// DISPLAY FORMATTER
// ============================================================================

/// Format an amount (in Kyats) for display
///
/// # Rules
/// - `Kyat`: rounded to a whole number, grouped: `1234567` → `"1,234,567"`
/// - `Lakh`: whole Lakhs render without decimals (`200000` → `"2"`), anything
///   else with exactly 2 decimals (`1234567` → `"12.35"`)
/// - With `with_suffix`, `" MMK"` or `" Lakhs"` is appended
///
/// Rounding is half away from zero in both branches.
///
/// # Examples:
/// ```
/// use kyatflow::currency::{format_amount, DisplayUnit};
/// assert_eq!(format_amount(1234567.0, DisplayUnit::Kyat, false), "1,234,567");
/// assert_eq!(format_amount(200000.0, DisplayUnit::Lakh, true), "2 Lakhs");
/// ```
pub fn format_amount(amount: f64, unit: DisplayUnit, with_suffix: bool) -> String {
    let number = format_number(amount, unit);

    if with_suffix {
        format!("{} {}", number, unit.suffix())
    } else {
        number
    }
}

/// Format an amount in the given unit without any suffix
pub fn format_number(amount: f64, unit: DisplayUnit) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    match unit {
        DisplayUnit::Kyat => format_whole(amount.round()),
        DisplayUnit::Lakh => {
            let lakhs = to_lakhs(amount);
            if lakhs.fract() == 0.0 {
                format_whole(lakhs)
            } else {
                format_two_decimals(lakhs)
            }
        }
    }
}

/// Insert a comma every 3 digits from the right
///
/// Expects an integer digit string with an optional leading `-`.
pub fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };

    let len = digits.len();
    let mut grouped = String::with_capacity(sign.len() + len + len / 3);
    grouped.push_str(sign);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    grouped
}

/// Render an integral value, never as "-0"
fn format_whole(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    group_thousands(&format!("{:.0}", value))
}

/// Render with 2 decimals, grouping only the integer portion
fn format_two_decimals(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let text = format!("{:.2}", rounded);

    match text.split_once('.') {
        Some((int_part, frac_part)) => format!("{}.{}", group_thousands(int_part), frac_part),
        None => group_thousands(&text),
    }
}

// ============================================================================
// INPUT PARSING
// ============================================================================

/// Parse user-typed amount text into a number
///
/// Commas and stray characters are dropped; whatever numeric prefix remains is
/// parsed leniently (`"1.2.3"` → `1.2`). Returns `0.0` when nothing numeric is left.
///
/// # Examples:
/// ```
/// use kyatflow::currency::parse_amount_input;
/// assert_eq!(parse_amount_input("1,234.50abc"), 1234.5);
/// assert_eq!(parse_amount_input(""), 0.0);
/// ```
pub fn parse_amount_input(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    leading_number(&cleaned).unwrap_or(0.0)
}

/// Longest `-?digits(.digits)?` prefix, parsed as f64
fn leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;

    if bytes.first() == Some(&b'-') {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }

    if !has_digits {
        return None;
    }

    text[..end].parse::<f64>().ok()
}

/// Reformat integer input as the user types it
///
/// Only digits survive. Empty input stays empty so the field can be cleared.
///
/// # Examples:
/// ```
/// use kyatflow::currency::format_live_input;
/// assert_eq!(format_live_input("1234567"), "1,234,567");
/// assert_eq!(format_live_input("abc"), "");
/// ```
pub fn format_live_input(text: &str) -> String {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return String::new();
    }

    // Grouping the digit string directly keeps arbitrarily long input exact
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        group_thousands(trimmed)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_conversion() {
        for x in [0.0, 150_000.0, -250_000.0, 12_500.0, 1e12] {
            assert_eq!(to_kyats(to_lakhs(x)), x, "kyats→lakhs→kyats for {}", x);
        }
        for x in [1.0, 12.345, -987_654.321] {
            let back = to_kyats(to_lakhs(x));
            assert!((back - x).abs() <= 2.0 * x.abs() * f64::EPSILON, "{} came back as {}", x, back);
        }
        for x in [0.0, 2.0, 0.5, -3.25, 1024.0] {
            assert_eq!(to_lakhs(to_kyats(x)), x, "lakhs→kyats→lakhs for {}", x);
        }
    }

    #[test]
    fn test_conversion_propagates_nan() {
        assert!(to_lakhs(f64::NAN).is_nan());
        assert!(to_kyats(f64::NAN).is_nan());
        assert_eq!(to_lakhs(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_format_kyat_grouping() {
        assert_eq!(format_amount(1234567.0, DisplayUnit::Kyat, false), "1,234,567");
        assert_eq!(format_amount(999.0, DisplayUnit::Kyat, false), "999");
        assert_eq!(format_amount(1000.0, DisplayUnit::Kyat, false), "1,000");
        assert_eq!(format_amount(0.0, DisplayUnit::Kyat, false), "0");
    }

    #[test]
    fn test_format_kyat_rounds_to_whole() {
        assert_eq!(format_amount(1500.4, DisplayUnit::Kyat, false), "1,500");
        assert_eq!(format_amount(1500.5, DisplayUnit::Kyat, false), "1,501");
        assert_eq!(format_amount(-2.5, DisplayUnit::Kyat, false), "-3");
    }

    #[test]
    fn test_format_kyat_suffix() {
        assert_eq!(format_amount(150000.0, DisplayUnit::Kyat, true), "150,000 MMK");
    }

    #[test]
    fn test_format_lakh_fractional() {
        assert_eq!(format_amount(1234567.0, DisplayUnit::Lakh, true), "12.35 Lakhs");
        assert_eq!(format_amount(150000.0, DisplayUnit::Lakh, false), "1.50");
    }

    #[test]
    fn test_format_lakh_exact_multiple() {
        assert_eq!(format_amount(200000.0, DisplayUnit::Lakh, true), "2 Lakhs");
        assert_eq!(format_amount(0.0, DisplayUnit::Lakh, false), "0");
    }

    #[test]
    fn test_format_lakh_groups_integer_part_only() {
        // 123,456.78 Lakhs
        assert_eq!(
            format_amount(12_345_678_000.0, DisplayUnit::Lakh, false),
            "123,456.78"
        );
        assert_eq!(
            format_amount(100_000_000_000.0, DisplayUnit::Lakh, true),
            "1,000,000 Lakhs"
        );
    }

    #[test]
    fn test_negative_amounts_keep_sign() {
        assert_eq!(format_amount(-500.0, DisplayUnit::Kyat, false), "-500");
        assert_eq!(format_amount(-1234567.0, DisplayUnit::Kyat, false), "-1,234,567");
        assert_eq!(format_amount(-250000.0, DisplayUnit::Lakh, true), "-2.50 Lakhs");
    }

    #[test]
    fn test_no_negative_zero() {
        assert_eq!(format_amount(-0.4, DisplayUnit::Kyat, false), "0");
        assert_eq!(format_amount(-100.0, DisplayUnit::Lakh, false), "0.00");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_amount(f64::NAN, DisplayUnit::Kyat, false), "NaN");
        assert_eq!(format_amount(f64::INFINITY, DisplayUnit::Lakh, true), "inf Lakhs");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(""), "");
        assert_eq!(group_thousands("12"), "12");
        assert_eq!(group_thousands("123456"), "123,456");
        assert_eq!(group_thousands("-1234"), "-1,234");
    }

    #[test]
    fn test_parse_input_tolerant() {
        assert_eq!(parse_amount_input("1,234.50abc"), 1234.5);
        assert_eq!(parse_amount_input("150,000"), 150000.0);
        assert_eq!(parse_amount_input("-2,500"), -2500.0);
        assert_eq!(parse_amount_input("K 5,000 MMK"), 5000.0);
    }

    #[test]
    fn test_parse_input_empty_is_zero() {
        assert_eq!(parse_amount_input(""), 0.0);
        assert_eq!(parse_amount_input("abc"), 0.0);
        assert_eq!(parse_amount_input("-"), 0.0);
        assert_eq!(parse_amount_input("."), 0.0);
    }

    #[test]
    fn test_parse_input_lenient_prefix() {
        assert_eq!(parse_amount_input("1.2.3"), 1.2);
        assert_eq!(parse_amount_input(".5"), 0.5);
        assert_eq!(parse_amount_input("12."), 12.0);
        assert_eq!(parse_amount_input("12-3"), 12.0);
    }

    #[test]
    fn test_live_input() {
        assert_eq!(format_live_input("1234567"), "1,234,567");
        assert_eq!(format_live_input("1,2345"), "12,345");
        assert_eq!(format_live_input("12.5"), "125");
        assert_eq!(format_live_input("-300"), "300");
    }

    #[test]
    fn test_live_input_empty_stays_empty() {
        assert_eq!(format_live_input(""), "");
        assert_eq!(format_live_input("abc"), "");
        assert_eq!(format_live_input(","), "");
    }

    #[test]
    fn test_live_input_leading_zeros() {
        assert_eq!(format_live_input("000"), "0");
        assert_eq!(format_live_input("0012000"), "12,000");
        assert_eq!(
            format_live_input("123456789012345678901234"),
            "123,456,789,012,345,678,901,234"
        );
    }

    #[test]
    fn test_display_unit_helpers() {
        assert_eq!(DisplayUnit::from_lakh_toggle(true), DisplayUnit::Lakh);
        assert_eq!(DisplayUnit::from_lakh_toggle(false), DisplayUnit::Kyat);
        assert_eq!(DisplayUnit::Lakh.from_kyats(250000.0), 2.5);
        assert_eq!(DisplayUnit::Lakh.to_kyats(2.5), 250000.0);
        assert_eq!(DisplayUnit::Kyat.to_kyats(42.0), 42.0);
        assert_eq!(DisplayUnit::default(), DisplayUnit::Kyat);
    }
}
