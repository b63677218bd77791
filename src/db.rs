use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::security::{AuditAction, AuditEntry, PinLock};

/// `app_state` key holding the serialized `PinLock`
const PIN_LOCK_KEY: &str = "pin_lock";

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Audit Log Table (append-only)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS audit_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            action TEXT NOT NULL,
            details TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_audit_action ON audit_log(action)",
        [],
    )?;

    // ==========================================================================
    // App State Table (JSON blobs by key)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

/// Insert one audit entry
///
/// Returns false when an entry with the same id is already stored.
pub fn insert_audit_entry(conn: &Connection, entry: &AuditEntry) -> Result<bool> {
    let changed = conn
        .execute(
            "INSERT OR IGNORE INTO audit_log (entry_id, timestamp, action, details)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id,
                entry.timestamp.to_rfc3339(),
                entry.action.code(),
                entry.details,
            ],
        )
        .with_context(|| format!("Failed to insert audit entry {}", entry.id))?;

    Ok(changed == 1)
}

/// Insert many audit entries in one SQLite transaction
pub fn insert_audit_entries(conn: &mut Connection, entries: &[AuditEntry]) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut inserted = 0;
    let mut duplicates = 0;

    for entry in entries {
        if insert_audit_entry(&tx, entry)? {
            inserted += 1;
        } else {
            duplicates += 1;
        }
    }

    tx.commit()?;

    tracing::info!(inserted, duplicates, "audit entries stored");
    Ok(inserted)
}

/// Most recent audit entries, newest first
pub fn get_recent_audit_entries(conn: &Connection, limit: usize) -> Result<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT entry_id, timestamp, action, details
         FROM audit_log
         ORDER BY timestamp DESC, id DESC
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, timestamp, action, details)| -> Result<AuditEntry> {
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .with_context(|| format!("Bad timestamp on audit entry {}", id))?
                .with_timezone(&Utc);
            let action = AuditAction::from_code(&action)
                .with_context(|| format!("Unknown audit action '{}' on entry {}", action, id))?;

            Ok(AuditEntry {
                id,
                action,
                details,
                timestamp,
            })
        })
        .collect()
}

pub fn count_audit_entries(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
    Ok(count)
}

/// Persist the PIN lock state, replacing any stored one
pub fn save_pin_lock(conn: &Connection, lock: &PinLock) -> Result<()> {
    let json = serde_json::to_string(lock).context("Failed to serialize PIN lock")?;

    conn.execute(
        "INSERT INTO app_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        params![PIN_LOCK_KEY, json],
    )
    .context("Failed to store PIN lock")?;

    Ok(())
}

/// Stored PIN lock state, or an empty lock when none was saved
pub fn load_pin_lock(conn: &Connection) -> Result<PinLock> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM app_state WHERE key = ?1",
            params![PIN_LOCK_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        Some(json) => serde_json::from_str(&json).context("Stored PIN lock is corrupt"),
        None => Ok(PinLock::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_audit_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let entry = AuditEntry::new(AuditAction::PinSet, "PIN enabled", fixed_now());
        assert!(insert_audit_entry(&conn, &entry).unwrap());

        let stored = get_recent_audit_entries(&conn, 10).unwrap();
        assert_eq!(stored, vec![entry]);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let now = fixed_now();
        let entries = vec![
            AuditEntry::new(AuditAction::TransactionCreated, "Income 5,000 MMK", now),
            AuditEntry::new(AuditAction::TransactionDeleted, "Expense 800 MMK", now + Duration::minutes(2)),
        ];

        let first = insert_audit_entries(&mut conn, &entries).unwrap();
        let second = insert_audit_entries(&mut conn, &entries).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 0, "Second import should insert 0 entries (all duplicates)");
        assert_eq!(count_audit_entries(&conn).unwrap(), 2);
    }

    #[test]
    fn test_recent_entries_newest_first_with_limit() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let now = fixed_now();
        let entries: Vec<AuditEntry> = (0..5)
            .map(|i| {
                AuditEntry::new(
                    AuditAction::SettingsChanged,
                    &format!("change {}", i),
                    now + Duration::minutes(i),
                )
            })
            .collect();
        insert_audit_entries(&mut conn, &entries).unwrap();

        let recent = get_recent_audit_entries(&conn, 2).unwrap();
        let details: Vec<&str> = recent.iter().map(|e| e.details.as_str()).collect();
        assert_eq!(details, vec!["change 4", "change 3"]);
    }

    #[test]
    fn test_unknown_action_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        conn.execute(
            "INSERT INTO audit_log (entry_id, timestamp, action, details) VALUES ('x', ?1, 'bogus', '')",
            params![fixed_now().to_rfc3339()],
        )
        .unwrap();

        assert!(get_recent_audit_entries(&conn, 10).is_err());
    }

    #[test]
    fn test_pin_lock_round_trip() {
        use crate::security::AuditLog;

        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        // Nothing stored yet
        assert!(!load_pin_lock(&conn).unwrap().has_pin());

        let now = fixed_now();
        let mut log = AuditLog::new();
        let mut lock = PinLock::new();
        lock.set_pin("2468", now, &mut log).unwrap();
        assert_eq!(lock.verify("0000", now, &mut log), Ok(false));
        save_pin_lock(&conn, &lock).unwrap();
        // Saving twice replaces the row
        save_pin_lock(&conn, &lock).unwrap();

        let mut restored = load_pin_lock(&conn).unwrap();
        assert!(restored.has_pin());
        assert_eq!(restored.remaining_attempts(), lock.remaining_attempts());
        assert_eq!(restored.verify("2468", now, &mut log), Ok(true));

        let entries: Vec<AuditEntry> = log.entries().cloned().collect();
        assert_eq!(insert_audit_entries(&mut conn, &entries).unwrap(), 3);
        let stored = get_recent_audit_entries(&conn, 10).unwrap();
        assert!(stored.iter().all(|e| e.action.code().starts_with("pin_")));
    }
}
