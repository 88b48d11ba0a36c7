//! # Report Error Types
//!
//! Error types for configuration and the dashboard service.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Report Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Storage      │  │     Engine              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Database       │  │  Core                   │ │
//! │  │  ConfigLoad     │  │                 │  │  Validation             │ │
//! │  │  ConfigSave     │  │                 │  │  InvalidRequest         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tenpo_core::{CoreError, ValidationError};
use tenpo_db::DbError;
use thiserror::Error;

/// Result type alias for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid report configuration.
    #[error("Invalid report configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    // =========================================================================
    // Engine Errors
    // =========================================================================
    #[error("Engine error: {0}")]
    Core(#[from] CoreError),

    /// A submitted record failed normalization.
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),

    /// The dashboard request itself is unusable.
    #[error("Invalid dashboard request: {0}")]
    InvalidRequest(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ReportError {
    fn from(err: toml::de::Error) -> Self {
        ReportError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ReportError {
    fn from(err: toml::ser::Error) -> Self {
        ReportError::ConfigSaveFailed(err.to_string())
    }
}

impl ReportError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ReportError::InvalidConfig(_) | ReportError::ConfigLoadFailed(_) | ReportError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if the caller sent bad input rather than hitting a fault.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ReportError::Validation(_) | ReportError::InvalidRequest(_))
    }
}
