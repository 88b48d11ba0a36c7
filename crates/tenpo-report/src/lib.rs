//! # tenpo-report: Dashboard Service for Tenpo
//!
//! The caller layer around the aggregation engine. It owns everything the
//! engine deliberately does not: configuration, I/O and memoisation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tenpo Dashboard Flow                             │
//! │                                                                         │
//! │  Frontend (scope, granularity, date range)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tenpo-report (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌─────────────┐  │   │
//! │  │   │ ReportConfig  │    │ Dashboard      │    │ Dashboard   │  │   │
//! │  │   │ (config.rs)   │───▶│ Service        │◄──▶│ Cache       │  │   │
//! │  │   │ TOML + env    │    │ (service.rs)   │    │ (cache.rs)  │  │   │
//! │  │   └───────────────┘    └───────┬────────┘    └─────────────┘  │   │
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                 ┌─────────────────┴─────────────────┐                   │
//! │                 ▼                                   ▼                   │
//! │          tenpo-db (fetch)                  tenpo-core (compute)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tenpo_core::{Granularity, Scope};
//! use tenpo_report::{DashboardRequest, DashboardService, ReportConfig};
//!
//! let config = ReportConfig::load_or_default(None);
//! let service = DashboardService::from_config(&config).await?;
//!
//! let request = DashboardRequest::month_to_date(config.default_scope()?, today, Granularity::Daily);
//! let view = service.dashboard(request).await?;
//! println!("{} / {:?}", view.kpi.total_sales, view.achievement);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod config;
pub mod error;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{CacheKey, DashboardCache};
pub use config::ReportConfig;
pub use error::{ReportError, ReportResult};
pub use service::{DashboardRequest, DashboardService, DashboardView};
