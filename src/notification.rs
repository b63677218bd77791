// 📩 Payment Notification Parser - SMS / push text → structured payment
// Mobile-wallet notifications are semi-structured, so every field except the
// amount is optional and falls back to a default.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::currency::parse_amount_input;

/// Sender used when the text carries no "from ... (" section
pub const UNKNOWN_SENDER: &str = "Unknown";

// ============================================================================
// PATTERNS
// ============================================================================

// The amount token cannot start right after a digit, '.' or ',' so that
// "1,500.50 MMK" is read whole instead of as its "50" tail.
static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^\d.,])(\d[\d,]*(?:\.\d+)?)\s*MMK").expect("amount pattern")
});

static SENDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfrom\s+([^(]+?)\s*\(").expect("sender pattern"));

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d+)\)").expect("phone pattern"));

static TRANSACTION_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bTrans(?:action)?\s*ID\s*:\s*(\w+)").expect("transaction id pattern")
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bon\s+(\d{1,2})/(\d{1,2})/(\d{4})").expect("date pattern")
});

// ============================================================================
// PARSED NOTIFICATION
// ============================================================================

/// ParsedNotification - Payment extracted from notification text
///
/// Only produced when an `<amount> MMK` token exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedNotification {
    /// Amount in Kyats
    pub amount: f64,
    /// Sender name, "Unknown" when absent
    pub sender: String,
    /// Sender phone, empty when absent
    pub phone: String,
    /// Wallet transaction id, empty when absent
    pub transaction_id: String,
    /// Payment date, or the parse time when absent
    pub date: DateTime<Utc>,
}

impl ParsedNotification {
    /// Whether the sender was found in the text
    pub fn has_known_sender(&self) -> bool {
        self.sender != UNKNOWN_SENDER
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Parse a payment notification, dating undated payments at the current time
///
/// # Example:
/// ```
/// use kyatflow::notification::parse_payment_notification;
/// let parsed = parse_payment_notification("Received 5,000 MMK from Ko Ko (0912345)").unwrap();
/// assert_eq!(parsed.amount, 5000.0);
/// assert_eq!(parsed.sender, "Ko Ko");
/// assert!(parse_payment_notification("no amount here").is_none());
/// ```
pub fn parse_payment_notification(text: &str) -> Option<ParsedNotification> {
    parse_payment_notification_at(text, Utc::now())
}

/// Parse a payment notification with an explicit "now" for the date fallback
pub fn parse_payment_notification_at(text: &str, now: DateTime<Utc>) -> Option<ParsedNotification> {
    let amount_caps = match AMOUNT_RE.captures(text) {
        Some(caps) => caps,
        None => {
            tracing::debug!("notification has no MMK amount, skipping");
            return None;
        }
    };
    let amount = parse_amount_input(&amount_caps[1]);

    let sender = SENDER_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

    let phone = PHONE_RE
        .captures(text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    let transaction_id = TRANSACTION_ID_RE
        .captures(text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    let date = extract_date(text).unwrap_or(now);

    tracing::debug!(
        amount,
        sender = %sender,
        has_transaction_id = !transaction_id.is_empty(),
        "parsed payment notification"
    );

    Some(ParsedNotification {
        amount,
        sender,
        phone,
        transaction_id,
        date,
    })
}

/// `on D/M/YYYY` → midnight UTC of that day
fn extract_date(text: &str) -> Option<DateTime<Utc>> {
    let caps = DATE_RE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;

    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
        None => {
            tracing::debug!(day, month, year, "ignoring impossible notification date");
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
