use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::env;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use kyatflow::{
    format_live_input, from_myanmar_digits, get_recent_audit_entries, insert_audit_entries,
    insert_audit_entry, load_pin_lock, parse_amount_input, parse_payment_notification,
    relative_time, save_pin_lock, setup_database, to_myanmar_digits, AmountFormatter,
    AuditAction, AuditEntry, AuditLog, DisplayUnit, Language, Preferences, SecurityError,
};

const USAGE: &str = "\
KyatFlow - MMK amount formatting toolkit

Usage:
  kyatflow format <amount> [--lakhs|--kyats] [--suffix|--no-suffix] [--mm|--en]
  kyatflow parse <text>
  kyatflow live <text>
  kyatflow mm <text>
  kyatflow unmm <text>
  kyatflow ago <rfc3339-timestamp>
  kyatflow sms <notification text>
  kyatflow prefs
  kyatflow audit <db_path> [limit]
  kyatflow audit-export <db_path> <csv_path>
  kyatflow pin <db_path> set <pin>
  kyatflow pin <db_path> verify <pin>
  kyatflow pin <db_path> clear

Preferences are read from $KYATFLOW_CONFIG or ./kyatflow.json";

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");
    let rest: &[String] = args.get(2..).unwrap_or(&[]);

    match command {
        "format" => run_format(rest)?,
        "parse" => run_parse(rest)?,
        "live" => println!("{}", format_live_input(&joined(rest))),
        "mm" => println!("{}", to_myanmar_digits(joined(rest))),
        "unmm" => println!("{}", from_myanmar_digits(&joined(rest))),
        "ago" => run_ago(rest)?,
        "sms" => run_sms(rest)?,
        "prefs" => run_prefs()?,
        "audit" => run_audit(rest)?,
        "audit-export" => run_audit_export(rest)?,
        "pin" => run_pin(rest)?,
        "help" | "--help" | "-h" => println!("{}", USAGE),
        other => {
            eprintln!("❌ Unknown command: {}\n", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn init_logging() {
    // RUST_LOG wins over the default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "kyatflow=info".into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn joined(args: &[String]) -> String {
    args.join(" ")
}

fn load_preferences() -> Result<Preferences> {
    let path = Preferences::default_path();
    Preferences::load_or_default(&path)
}

fn run_format(args: &[String]) -> Result<()> {
    let (prefs, amount_text) = parse_format_args(args, load_preferences()?)?;
    let amount = parse_amount_input(&from_myanmar_digits(amount_text));

    let formatter = AmountFormatter::new(prefs);
    println!("{}", formatter.format(amount));
    Ok(())
}

/// Apply `format` flags over the loaded preferences and pick out the single amount
fn parse_format_args(args: &[String], mut prefs: Preferences) -> Result<(Preferences, &str)> {
    let mut amount_text: Option<&str> = None;

    for arg in args {
        match arg.as_str() {
            "--lakhs" => prefs.unit = DisplayUnit::Lakh,
            "--kyats" => prefs.unit = DisplayUnit::Kyat,
            "--suffix" => prefs.show_suffix = true,
            "--no-suffix" => prefs.show_suffix = false,
            "--mm" => prefs.language = Language::Myanmar,
            "--en" => prefs.language = Language::English,
            other => {
                if let Some(first) = amount_text {
                    bail!("format takes one amount, got '{}' and '{}'", first, other);
                }
                amount_text = Some(other);
            }
        }
    }

    let amount_text = amount_text.context("format needs an amount")?;
    Ok((prefs, amount_text))
}

fn run_parse(args: &[String]) -> Result<()> {
    let formatter = AmountFormatter::new(load_preferences()?);
    let text = joined(args);

    println!("value: {}", formatter.parse(&text));
    println!("kyats: {}", formatter.parse_to_kyats(&text));
    Ok(())
}

fn run_ago(args: &[String]) -> Result<()> {
    let raw = args.first().context("ago needs an RFC 3339 timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid timestamp: {}", raw))?
        .with_timezone(&Utc);

    println!("{}", relative_time(timestamp, Utc::now()));
    Ok(())
}

fn run_sms(args: &[String]) -> Result<()> {
    let text = joined(args);

    match parse_payment_notification(&text) {
        Some(parsed) => {
            let formatter = AmountFormatter::new(load_preferences()?);
            println!("✓ Payment detected: {}", formatter.format(parsed.amount));
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            Ok(())
        }
        None => bail!("No MMK amount found in notification text"),
    }
}

fn run_prefs() -> Result<()> {
    let path = Preferences::default_path();
    let prefs = Preferences::load_or_default(&path)?;

    println!("📁 {}", path.display());
    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}

fn open_audit_db(path: &str) -> Result<Connection> {
    let conn = Connection::open(Path::new(path))
        .with_context(|| format!("Failed to open audit database: {}", path))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn run_audit(args: &[String]) -> Result<()> {
    let db_path = args.first().context("audit needs a database path")?;
    let limit = match args.get(1) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("Invalid limit: {}", raw))?,
        None => 20,
    };

    let conn = open_audit_db(db_path)?;
    let entries = get_recent_audit_entries(&conn, limit)?;
    let now = Utc::now();

    if entries.is_empty() {
        println!("(audit log is empty)");
    }

    for entry in &entries {
        let marker = if entry.action.is_security_event() { "🔐" } else { "  " };
        println!(
            "{} {:>10}  {:<20} {}",
            marker,
            relative_time(entry.timestamp, now),
            entry.action.code(),
            entry.details
        );
    }

    Ok(())
}

fn run_audit_export(args: &[String]) -> Result<()> {
    let db_path = args.first().context("audit-export needs a database path")?;
    let csv_path = args.get(1).context("audit-export needs an output CSV path")?;

    let conn = open_audit_db(db_path)?;
    let entries = get_recent_audit_entries(&conn, i64::MAX as usize)?;

    let file = File::create(csv_path)
        .with_context(|| format!("Failed to create CSV file: {}", csv_path))?;
    let rows = kyatflow::security::export_entries_csv(&entries, file)?;

    let details = format!("Exported {} audit entries to {}", rows, csv_path);
    insert_audit_entry(&conn, &AuditEntry::new(AuditAction::DataExported, &details, Utc::now()))?;

    println!("✓ {}", details);
    Ok(())
}

fn run_pin(args: &[String]) -> Result<()> {
    let db_path = args.first().context("pin needs a database path")?;
    let action = args
        .get(1)
        .context("pin needs an action: set, verify or clear")?;

    let mut conn = open_audit_db(db_path)?;
    let mut lock = load_pin_lock(&conn)?;
    let mut log = AuditLog::new();
    let now = Utc::now();

    let outcome = match action.as_str() {
        "set" => {
            let pin = args.get(2).context("pin set needs a PIN")?;
            lock.set_pin(pin, now, &mut log)?;
            "✓ PIN set".to_string()
        }
        "verify" => {
            let pin = args.get(2).context("pin verify needs a PIN")?;
            match lock.verify(pin, now, &mut log) {
                Ok(true) => "✓ PIN accepted".to_string(),
                Ok(false) => format!(
                    "❌ Wrong PIN ({} attempts left)",
                    lock.remaining_attempts()
                ),
                Err(e @ SecurityError::LockedOut { .. }) => format!("🔐 {}", e),
                Err(e) => return Err(e.into()),
            }
        }
        "clear" => {
            lock.clear_pin(now, &mut log);
            "✓ PIN cleared".to_string()
        }
        other => bail!("Unknown pin action: {}", other),
    };

    save_pin_lock(&conn, &lock)?;
    let entries: Vec<AuditEntry> = log.entries().cloned().collect();
    insert_audit_entries(&mut conn, &entries)?;

    println!("{}", outcome);
    Ok(())
}
