//! # Report Configuration
//!
//! Configuration for the dashboard service.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TENPO_DB_PATH=/srv/tenpo/tenpo.db                                  │
//! │     TENPO_DEFAULT_SCOPE=brand:menya                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tenpo/report.toml (Linux)                                │
//! │     ~/Library/Application Support/com.tenpo.tenpo/report.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     all stores, monthly, ¥3,500 average spend                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # report.toml
//! [database]
//! path = "/srv/tenpo/tenpo.db"
//! max_connections = 5
//!
//! [dashboard]
//! default_scope = "all"      # all | brand:<id> | store:<id>
//! granularity = "monthly"    # daily | weekly | monthly
//! average_spend = 3500.0
//!
//! [cache]
//! enabled = true
//! max_entries = 256
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use tenpo_core::achievement::DEFAULT_AVERAGE_SPEND;
use tenpo_core::{Granularity, Scope};
use tenpo_db::DbConfig;

use crate::error::{ReportError, ReportResult};

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "tenpo", "tenpo")
        .map(|dirs| dirs.data_dir().join("tenpo.db"))
        .unwrap_or_else(|| PathBuf::from("./tenpo.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Dashboard Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Scope shown when the caller does not pick one (`all`, `brand:x`, `store:x`).
    #[serde(default = "default_scope")]
    pub default_scope: String,

    #[serde(default)]
    pub granularity: Granularity,

    /// Customer spend used for required daily customers when the period
    /// has no customers yet.
    #[serde(default = "default_average_spend")]
    pub average_spend: f64,
}

fn default_scope() -> String {
    Scope::AllStores.to_string()
}

fn default_average_spend() -> f64 {
    DEFAULT_AVERAGE_SPEND
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            default_scope: default_scope(),
            granularity: Granularity::default(),
            average_spend: default_average_spend(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Oldest entries are evicted past this size.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    256
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            enabled: true,
            max_entries: default_max_entries(),
        }
    }
}

// =============================================================================
// Main Report Configuration
// =============================================================================

/// Complete report configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub dashboard: DashboardSettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (report.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ReportResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading report config from file");
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
            warn!("Failed to load report config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ReportResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ReportError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Report config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ReportResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ReportError::InvalidConfig("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ReportError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(ReportError::InvalidConfig(
                "cache.max_entries must be greater than 0 when the cache is enabled".into(),
            ));
        }

        if !self.dashboard.average_spend.is_finite() || self.dashboard.average_spend <= 0.0 {
            return Err(ReportError::InvalidConfig(format!(
                "dashboard.average_spend must be positive, got {}",
                self.dashboard.average_spend
            )));
        }

        self.default_scope()?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("TENPO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("TENPO_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.database.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring non-numeric TENPO_DB_MAX_CONNECTIONS"),
            }
        }

        if let Ok(scope) = std::env::var("TENPO_DEFAULT_SCOPE") {
            debug!(scope = %scope, "Overriding default scope from environment");
            self.dashboard.default_scope = scope;
        }

        if let Ok(granularity) = std::env::var("TENPO_GRANULARITY") {
            match granularity.parse() {
                Ok(parsed) => self.dashboard.granularity = parsed,
                Err(_) => warn!(granularity = %granularity, "Unknown granularity in environment"),
            }
        }

        if let Ok(spend) = std::env::var("TENPO_AVERAGE_SPEND") {
            if let Ok(s) = spend.parse::<f64>() {
                self.dashboard.average_spend = s;
            }
        }

        if let Ok(enabled) = std::env::var("TENPO_CACHE_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.cache.enabled = true,
                "0" | "false" | "no" | "off" => self.cache.enabled = false,
                _ => warn!(value = %enabled, "Unknown TENPO_CACHE_ENABLED value"),
            }
        }

        if let Ok(max) = std::env::var("TENPO_CACHE_MAX_ENTRIES") {
            if let Ok(m) = max.parse::<usize>() {
                self.cache.max_entries = m;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tenpo", "tenpo").map(|dirs| dirs.config_dir().join("report.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Parsed `dashboard.default_scope`.
    pub fn default_scope(&self) -> ReportResult<Scope> {
        self.dashboard
            .default_scope
            .parse()
            .map_err(|e| ReportError::InvalidConfig(format!("dashboard.default_scope: {e}")))
    }

    /// Database settings as a pool configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }
}
