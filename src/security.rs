// 🔐 Client Security - PIN lock and audit log
// The PIN never leaves this module in clear text; only a salted SHA-256 is kept.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::io::Write;

use crate::error::SecurityError;

// ============================================================================
// PIN LOCK
// ============================================================================

/// Shortest accepted PIN
pub const MIN_PIN_LENGTH: usize = 4;

/// Longest accepted PIN
pub const MAX_PIN_LENGTH: usize = 6;

/// Consecutive failures before the lock engages
pub const MAX_PIN_ATTEMPTS: u32 = 5;

/// How long the lock holds once engaged
pub const LOCKOUT_MINUTES: i64 = 5;

/// Check a PIN is 4-6 ASCII digits
pub fn validate_pin_format(pin: &str) -> Result<(), SecurityError> {
    let len_ok = (MIN_PIN_LENGTH..=MAX_PIN_LENGTH).contains(&pin.len());

    if len_ok && pin.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(SecurityError::InvalidPinFormat {
            min: MIN_PIN_LENGTH,
            max: MAX_PIN_LENGTH,
        })
    }
}

/// Salted SHA-256 of a PIN, hex encoded
pub fn hash_pin(pin: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", salt, pin));
    format!("{:x}", hasher.finalize())
}

/// PinLock - App lock screen state
///
/// Serializable so the host app can persist it wherever it keeps settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinLock {
    pin_hash: Option<String>,
    salt: String,
    failed_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
}

impl PinLock {
    /// Create a lock with no PIN configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a PIN is configured
    pub fn has_pin(&self) -> bool {
        self.pin_hash.is_some()
    }

    /// Set (or replace) the PIN with a fresh salt, recording `PinSet`
    pub fn set_pin(
        &mut self,
        pin: &str,
        now: DateTime<Utc>,
        log: &mut AuditLog,
    ) -> Result<(), SecurityError> {
        validate_pin_format(pin)?;

        let replaced = self.has_pin();
        self.salt = uuid::Uuid::new_v4().simple().to_string();
        self.pin_hash = Some(hash_pin(pin, &self.salt));
        self.failed_attempts = 0;
        self.locked_until = None;

        let details = if replaced { "PIN changed" } else { "PIN enabled" };
        log.record(AuditAction::PinSet, details, now);
        tracing::info!("PIN updated");
        Ok(())
    }

    /// Remove the PIN and any lockout, recording `PinCleared`
    pub fn clear_pin(&mut self, now: DateTime<Utc>, log: &mut AuditLog) {
        *self = Self::default();
        log.record(AuditAction::PinCleared, "PIN disabled", now);
        tracing::info!("PIN cleared");
    }

    /// Whether the lock is engaged at `now`
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map_or(false, |until| now < until)
    }

    /// Attempts left before the lock engages
    pub fn remaining_attempts(&self) -> u32 {
        MAX_PIN_ATTEMPTS.saturating_sub(self.failed_attempts)
    }

    /// Check a PIN attempt
    ///
    /// Each evaluated attempt lands in `log`: `PinVerified` on a match,
    /// `PinFailed` on a miss, and `PinLockout` for the miss that engages the lock.
    /// Attempts refused by an engaged lock are not recorded.
    ///
    /// # Returns
    /// * `Ok(true)` - PIN matches, failure counter reset
    /// * `Ok(false)` - wrong PIN, attempts remain
    /// * `Err(LockedOut)` - this attempt exhausted the budget, or the lock is still engaged
    /// * `Err(PinNotSet)` - nothing to verify against
    pub fn verify(
        &mut self,
        pin: &str,
        now: DateTime<Utc>,
        log: &mut AuditLog,
    ) -> Result<bool, SecurityError> {
        if let Some(until) = self.locked_until {
            if now < until {
                return Err(SecurityError::LockedOut { until });
            }
            // Lockout expired
            self.locked_until = None;
            self.failed_attempts = 0;
        }

        let expected = self.pin_hash.as_ref().ok_or(SecurityError::PinNotSet)?;

        if hash_pin(pin, &self.salt) == *expected {
            self.failed_attempts = 0;
            log.record(AuditAction::PinVerified, "PIN accepted", now);
            return Ok(true);
        }

        self.failed_attempts += 1;
        tracing::warn!(
            failed_attempts = self.failed_attempts,
            "PIN verification failed"
        );

        if self.failed_attempts >= MAX_PIN_ATTEMPTS {
            let until = now + Duration::minutes(LOCKOUT_MINUTES);
            self.locked_until = Some(until);
            log.record(
                AuditAction::PinLockout,
                &format!("Locked until {}", until.to_rfc3339()),
                now,
            );
            tracing::warn!(%until, "PIN lock engaged");
            return Err(SecurityError::LockedOut { until });
        }

        log.record(
            AuditAction::PinFailed,
            &format!("Wrong PIN, {} attempts left", self.remaining_attempts()),
            now,
        );
        Ok(false)
    }
}

// ============================================================================
// AUDIT LOG
// ============================================================================

/// Default number of entries kept in memory
pub const DEFAULT_AUDIT_CAPACITY: usize = 100;

/// AuditAction - What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PinSet,
    PinCleared,
    PinVerified,
    PinFailed,
    PinLockout,
    TransactionCreated,
    TransactionUpdated,
    TransactionDeleted,
    PartyCreated,
    PartyDeleted,
    SettingsChanged,
    DataExported,
}

impl AuditAction {
    pub const ALL: [AuditAction; 12] = [
        AuditAction::PinSet,
        AuditAction::PinCleared,
        AuditAction::PinVerified,
        AuditAction::PinFailed,
        AuditAction::PinLockout,
        AuditAction::TransactionCreated,
        AuditAction::TransactionUpdated,
        AuditAction::TransactionDeleted,
        AuditAction::PartyCreated,
        AuditAction::PartyDeleted,
        AuditAction::SettingsChanged,
        AuditAction::DataExported,
    ];

    /// Stable code used in storage and exports
    pub fn code(&self) -> &'static str {
        match self {
            AuditAction::PinSet => "pin_set",
            AuditAction::PinCleared => "pin_cleared",
            AuditAction::PinVerified => "pin_verified",
            AuditAction::PinFailed => "pin_failed",
            AuditAction::PinLockout => "pin_lockout",
            AuditAction::TransactionCreated => "transaction_created",
            AuditAction::TransactionUpdated => "transaction_updated",
            AuditAction::TransactionDeleted => "transaction_deleted",
            AuditAction::PartyCreated => "party_created",
            AuditAction::PartyDeleted => "party_deleted",
            AuditAction::SettingsChanged => "settings_changed",
            AuditAction::DataExported => "data_exported",
        }
    }

    /// Inverse of `code()`
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.code() == code)
    }

    /// Security-relevant actions (shown highlighted in the audit view)
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            AuditAction::PinSet
                | AuditAction::PinCleared
                | AuditAction::PinFailed
                | AuditAction::PinLockout
        )
    }
}

/// AuditEntry - One immutable record in the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub action: AuditAction,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, details: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action,
            details: details.to_string(),
            timestamp,
        }
    }
}

/// AuditLog - Bounded in-memory audit trail, newest first
///
/// When full, the oldest entry is evicted. Long-term storage goes through `db`.
#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
    capacity: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }

    /// Log holding at most `capacity` entries (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        AuditLog {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a log from stored entries (any order)
    pub fn from_entries(mut entries: Vec<AuditEntry>, capacity: usize) -> Self {
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let mut log = Self::with_capacity(capacity);
        log.entries = entries.into_iter().take(log.capacity).collect();
        log
    }

    /// Append an entry, evicting the oldest when full
    pub fn record(&mut self, action: AuditAction, details: &str, now: DateTime<Utc>) -> &AuditEntry {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }

        tracing::debug!(action = action.code(), "audit entry recorded");
        self.entries.push_front(AuditEntry::new(action, details, now));
        &self.entries[0]
    }

    /// All entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    /// The `n` most recent entries
    pub fn recent(&self, n: usize) -> Vec<&AuditEntry> {
        self.entries.iter().take(n).collect()
    }

    /// Entries for one action, newest first
    pub fn by_action(&self, action: AuditAction) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.action == action).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Write the log as CSV (`id,timestamp,action,details`), newest first
    ///
    /// Returns the number of rows written (header excluded).
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        export_entries_csv(self.entries.iter(), writer)
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Write audit entries as CSV
pub fn export_entries_csv<'a, I, W>(entries: I, writer: W) -> Result<usize>
where
    I: IntoIterator<Item = &'a AuditEntry>,
    W: Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["id", "timestamp", "action", "details"])
        .context("Failed to write audit CSV header")?;

    let mut rows = 0;
    for entry in entries {
        let timestamp = entry.timestamp.to_rfc3339();
        wtr.write_record([
            entry.id.as_str(),
            timestamp.as_str(),
            entry.action.code(),
            entry.details.as_str(),
        ])
        .with_context(|| format!("Failed to write audit entry {}", entry.id))?;
        rows += 1;
    }

    wtr.flush().context("Failed to flush audit CSV")?;
    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================
