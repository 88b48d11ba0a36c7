//! # tenpo-db: Database Layer for Tenpo
//!
//! SQLite storage for daily records, expense baselines, targets and the
//! store/brand directory, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tenpo Data Flow                                  │
//! │                                                                         │
//! │  DashboardService (tenpo-report)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tenpo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌─────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │ Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │ (embedded)  │  │   │
//! │  │   │               │    │ RecordRepo     │    │             │  │   │
//! │  │   │ SqlitePool    │◄───│ BaselineRepo   │    │ 001_init    │  │   │
//! │  │   │ WAL, FKs on   │    │ TargetRepo     │    │             │  │   │
//! │  │   │               │    │ StoreRepo      │    │             │  │   │
//! │  │   └───────────────┘    └────────────────┘    └─────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tenpo_core::{DateRange, Scope, ScopeFilter};
//! use tenpo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tenpo.db")).await?;
//!
//! let filter = ScopeFilter::for_scope(&Scope::AllStores, DateRange::unbounded());
//! let records = db.records().list_records(&filter).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::baselines::BaselineRepository;
pub use repository::records::RecordRepository;
pub use repository::stores::{Brand, Store, StoreRepository};
pub use repository::targets::{TargetFilter, TargetRepository};
