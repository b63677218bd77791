// KyatFlow - Core Library
// Formatting, parsing and security helpers shared by the CLI and the API server

pub mod currency;
pub mod db;
pub mod error;
pub mod myanmar;
pub mod notification;
pub mod preferences;
pub mod relative_time;
pub mod security;

// Re-export commonly used types
pub use currency::{
    format_amount, format_live_input, format_number, group_thousands, parse_amount_input,
    to_kyats, to_lakhs, DisplayUnit, KYATS_PER_LAKH,
};
pub use db::{
    count_audit_entries, get_recent_audit_entries, insert_audit_entries, insert_audit_entry,
    load_pin_lock, save_pin_lock, setup_database,
};
pub use error::SecurityError;
pub use myanmar::{format_myanmar_currency, from_myanmar_digits, to_myanmar_digits};
pub use notification::{parse_payment_notification, parse_payment_notification_at, ParsedNotification};
pub use preferences::{AmountFormatter, Language, Preferences};
pub use relative_time::relative_time;
pub use security::{AuditAction, AuditEntry, AuditLog, PinLock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
