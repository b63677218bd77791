// ⏱️ Relative Time - "5m ago" style labels for activity feeds
// "now" is always passed in: production uses Utc::now(), tests use a fixed instant.

use chrono::{DateTime, Utc};

/// Labels switch to an absolute date at this many days
pub const ABSOLUTE_AFTER_DAYS: i64 = 7;

/// Render how long ago `timestamp` happened relative to `now`
///
/// | elapsed      | output      |
/// |--------------|-------------|
/// | < 1 minute   | `Just now`  |
/// | < 60 minutes | `{N}m ago`  |
/// | < 24 hours   | `{N}h ago`  |
/// | < 7 days     | `{N}d ago`  |
/// | otherwise    | `Jan 12`    |
///
/// Future timestamps (clock skew) count as "Just now".
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);

    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = elapsed.num_days();
    if days < ABSOLUTE_AFTER_DAYS {
        return format!("{}d ago", days);
    }

    short_date(timestamp)
}

/// Absolute short date, e.g. "Jan 12"
pub fn short_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%b %-d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_just_now() {
        let now = fixed_now();
        assert_eq!(relative_time(now, now), "Just now");
        assert_eq!(relative_time(now - Duration::seconds(30), now), "Just now");
        assert_eq!(relative_time(now - Duration::seconds(59), now), "Just now");
    }

    #[test]
    fn test_minutes() {
        let now = fixed_now();
        assert_eq!(relative_time(now - Duration::seconds(60), now), "1m ago");
        assert_eq!(relative_time(now - Duration::seconds(90), now), "1m ago");
        assert_eq!(relative_time(now - Duration::minutes(59), now), "59m ago");
    }

    #[test]
    fn test_hours() {
        let now = fixed_now();
        assert_eq!(relative_time(now - Duration::minutes(60), now), "1h ago");
        assert_eq!(relative_time(now - Duration::minutes(23 * 60 + 59), now), "23h ago");
    }

    #[test]
    fn test_days() {
        let now = fixed_now();
        assert_eq!(relative_time(now - Duration::hours(24), now), "1d ago");
        assert_eq!(relative_time(now - Duration::hours(25), now), "1d ago");
        assert_eq!(relative_time(now - Duration::days(6), now), "6d ago");
    }

    #[test]
    fn test_absolute_after_a_week() {
        let now = fixed_now();
        assert_eq!(relative_time(now - Duration::days(8), now), "Mar 7");
        assert_eq!(relative_time(now - Duration::days(7), now), "Mar 8");

        let jan = Utc.with_ymd_and_hms(2026, 1, 12, 9, 30, 0).unwrap();
        assert_eq!(relative_time(jan, now), "Jan 12");
    }

    #[test]
    fn test_future_timestamp() {
        let now = fixed_now();
        assert_eq!(relative_time(now + Duration::hours(3), now), "Just now");
    }
}
