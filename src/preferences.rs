// ⚙️ Display Preferences - unit + language configuration for formatting
// Preferences are plain values handed to AmountFormatter. Nothing here reads
// global state except `default_path()`, which only resolves a file location.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::currency::{format_live_input, format_number, parse_amount_input, DisplayUnit};
use crate::myanmar::{from_myanmar_digits, to_myanmar_digits};

/// Environment variable pointing at the preferences file
pub const CONFIG_ENV_VAR: &str = "KYATFLOW_CONFIG";

/// Preferences file used when the env var is not set
pub const DEFAULT_CONFIG_FILE: &str = "kyatflow.json";

// ============================================================================
// LANGUAGE
// ============================================================================

/// Language - UI language, which also decides digit glyphs and suffixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    Myanmar,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Myanmar => "my",
        }
    }

    /// Parse an ISO code or a language name
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "my" | "mm" | "myanmar" | "burmese" => Some(Language::Myanmar),
            _ => None,
        }
    }

    /// Unit suffix in this language
    pub fn unit_suffix(&self, unit: DisplayUnit) -> &'static str {
        match (self, unit) {
            (Language::English, unit) => unit.suffix(),
            (Language::Myanmar, DisplayUnit::Kyat) => "ကျပ်",
            (Language::Myanmar, DisplayUnit::Lakh) => "သိန်း",
        }
    }

    /// Whether digits render in Myanmar script
    pub fn uses_myanmar_digits(&self) -> bool {
        matches!(self, Language::Myanmar)
    }
}

// ============================================================================
// PREFERENCES
// ============================================================================

/// Preferences - What the user picked in Settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Show amounts in Kyats or Lakhs
    pub unit: DisplayUnit,
    /// UI language
    pub language: Language,
    /// Append the unit suffix to amounts
    pub show_suffix: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            unit: DisplayUnit::Kyat,
            language: Language::English,
            show_suffix: true,
        }
    }
}

impl Preferences {
    /// Resolve the preferences file: `$KYATFLOW_CONFIG` or `./kyatflow.json`
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load preferences from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read preferences file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse preferences JSON")
    }

    /// Load preferences, falling back to defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            tracing::debug!(path = ?path.as_ref(), "no preferences file, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Write preferences as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize preferences")?;
        fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write preferences file: {:?}", path.as_ref()))
    }

    /// Builder pattern: set display unit
    pub fn with_unit(mut self, unit: DisplayUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Builder pattern: set language
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Builder pattern: toggle suffix
    pub fn with_suffix(mut self, show_suffix: bool) -> Self {
        self.show_suffix = show_suffix;
        self
    }
}

// ============================================================================
// AMOUNT FORMATTER
// ============================================================================

/// AmountFormatter - Formatting functions bound to one set of preferences
///
/// Callers hold one per render pass; it is cheap to copy around.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountFormatter {
    prefs: Preferences,
}

impl AmountFormatter {
    pub fn new(prefs: Preferences) -> Self {
        AmountFormatter { prefs }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Format a Kyat amount according to the preferences
    pub fn format(&self, amount: f64) -> String {
        let number = self.localize_digits(format_number(amount, self.prefs.unit));

        if self.prefs.show_suffix {
            format!("{} {}", number, self.prefs.language.unit_suffix(self.prefs.unit))
        } else {
            number
        }
    }

    /// Regroup partially typed input; Myanmar digits are accepted as input
    pub fn format_live(&self, text: &str) -> String {
        self.localize_digits(format_live_input(&from_myanmar_digits(text)))
    }

    /// Parse typed text as a value in the display unit
    pub fn parse(&self, text: &str) -> f64 {
        parse_amount_input(&from_myanmar_digits(text))
    }

    /// Parse typed text and convert it to Kyats (Lakh input × 100000)
    pub fn parse_to_kyats(&self, text: &str) -> f64 {
        self.prefs.unit.to_kyats(self.parse(text))
    }

    fn localize_digits(&self, text: String) -> String {
        if self.prefs.language.uses_myanmar_digits() {
            to_myanmar_digits(text)
        } else {
            text
        }
    }
}

impl Default for AmountFormatter {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
