use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from the PIN lock
///
/// Formatting and parsing never fail, so this is the only typed error in the crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("PIN must be {min}-{max} digits")]
    InvalidPinFormat { min: usize, max: usize },

    #[error("No PIN has been set")]
    PinNotSet,

    #[error("Too many failed attempts, locked until {until}")]
    LockedOut { until: DateTime<Utc> },
}
