//! # Shift Configuration
//!
//! Configuration management for the shift service.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILL_TERMINAL_ID=register-2                                        │
//! │     TILL_REFRESH_INTERVAL_SECS=15                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/till.toml (Linux)                                    │
//! │     ~/Library/Application Support/com.till.pos/till.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     register-1, 30s refresh, 70% provider share, UTC                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # till.toml
//! [terminal]
//! id = "register-1"
//! name = "Front Counter"
//!
//! [shift]
//! refresh_interval_secs = 30
//! refresh_timeout_secs = 10
//! provider_ratio_bps = 7000
//! utc_offset_minutes = 420
//!
//! [database]
//! path = "/var/lib/till/till.db"
//! ```

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ShiftError, ShiftResult};
use till_core::validation::validate_ratio_bps;
use till_core::{RevenueRatio, SalesAggregator, DEFAULT_PROVIDER_RATIO_BPS, DEFAULT_REFRESH_INTERVAL_SECS};

// =============================================================================
// Terminal Configuration
// =============================================================================

/// Identity of the register this service runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Keys the active shift record. One active shift per terminal id.
    #[serde(default = "default_terminal_id")]
    pub id: String,

    /// Human-readable name (e.g., "Front Counter").
    #[serde(default = "default_terminal_name")]
    pub name: String,
}

fn default_terminal_id() -> String {
    "register-1".to_string()
}

fn default_terminal_name() -> String {
    "POS Terminal".to_string()
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            id: default_terminal_id(),
            name: default_terminal_name(),
        }
    }
}

// =============================================================================
// Shift Settings
// =============================================================================

/// Shift engine behavior settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSettings {
    /// Interval between cash sales refreshes while a shift is active (seconds).
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Upper bound on one ledger read (seconds).
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_secs: u64,

    /// Provider share of cash sales in basis points (7000 = 70%).
    #[serde(default = "default_provider_ratio")]
    pub provider_ratio_bps: u32,

    /// Terminal's offset from UTC, used to decide which sales fall on the
    /// shift's calendar day.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}
fn default_refresh_timeout() -> u64 {
    10
}
fn default_provider_ratio() -> u32 {
    DEFAULT_PROVIDER_RATIO_BPS
}

impl Default for ShiftSettings {
    fn default() -> Self {
        ShiftSettings {
            refresh_interval_secs: default_refresh_interval(),
            refresh_timeout_secs: default_refresh_timeout(),
            provider_ratio_bps: default_provider_ratio(),
            utc_offset_minutes: 0,
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// Where the SQLite database lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to `till.db` in the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Shift Configuration
// =============================================================================

/// Complete shift service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftConfig {
    #[serde(default)]
    pub terminal: TerminalConfig,

    #[serde(default)]
    pub shift: ShiftSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl ShiftConfig {
    /// Creates a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (till.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ShiftResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading shift config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load shift config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ShiftResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ShiftError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Shift config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ShiftResult<()> {
        if self.terminal.id.trim().is_empty() {
            return Err(ShiftError::Config("terminal.id must not be empty".into()));
        }

        if self.shift.refresh_interval_secs == 0 {
            return Err(ShiftError::Config(
                "refresh_interval_secs must be greater than 0".into(),
            ));
        }

        if self.shift.refresh_timeout_secs == 0 {
            return Err(ShiftError::Config(
                "refresh_timeout_secs must be greater than 0".into(),
            ));
        }

        validate_ratio_bps(self.shift.provider_ratio_bps)
            .map_err(|e| ShiftError::Config(e.to_string()))?;

        SalesAggregator::from_offset_minutes(self.shift.utc_offset_minutes)
            .map_err(|e| ShiftError::Config(e.to_string()))?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("TILL_TERMINAL_ID") {
            debug!(terminal_id = %id, "Overriding terminal ID from environment");
            self.terminal.id = id;
        }

        if let Some(name) = lookup("TILL_TERMINAL_NAME") {
            self.terminal.name = name;
        }

        if let Some(secs) = lookup("TILL_REFRESH_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.shift.refresh_interval_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid TILL_REFRESH_INTERVAL_SECS"),
            }
        }

        if let Some(secs) = lookup("TILL_REFRESH_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.shift.refresh_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid TILL_REFRESH_TIMEOUT_SECS"),
            }
        }

        if let Some(bps) = lookup("TILL_PROVIDER_RATIO_BPS") {
            match bps.parse::<u32>() {
                Ok(b) => self.shift.provider_ratio_bps = b,
                Err(_) => warn!(value = %bps, "Ignoring invalid TILL_PROVIDER_RATIO_BPS"),
            }
        }

        if let Some(minutes) = lookup("TILL_UTC_OFFSET_MINUTES") {
            match minutes.parse::<i32>() {
                Ok(m) => self.shift.utc_offset_minutes = m,
                Err(_) => warn!(value = %minutes, "Ignoring invalid TILL_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(path) = lookup("TILL_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "pos")
            .map(|dirs| dirs.config_dir().join("till.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the terminal ID.
    pub fn terminal_id(&self) -> &str {
        &self.terminal.id
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.shift.refresh_interval_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.shift.refresh_timeout_secs)
    }

    pub fn ratio(&self) -> RevenueRatio {
        RevenueRatio::from_bps(self.shift.provider_ratio_bps)
    }

    /// Aggregator for the configured offset. Falls back to UTC for an
    /// offset that `validate` would have rejected.
    pub fn aggregator(&self) -> SalesAggregator {
        SalesAggregator::from_offset_minutes(self.shift.utc_offset_minutes).unwrap_or_else(|e| {
            warn!(error = %e, "Invalid UTC offset, using UTC");
            SalesAggregator::utc()
        })
    }

    pub fn offset(&self) -> FixedOffset {
        self.aggregator().offset()
    }

    /// Configured database path, or `till.db` in the platform data directory.
    pub fn database_path(&self) -> PathBuf {
        self.database.path.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("com", "till", "pos")
                .map(|dirs| dirs.data_dir().join("till.db"))
                .unwrap_or_else(|| PathBuf::from("till.db"))
        })
    }
}
