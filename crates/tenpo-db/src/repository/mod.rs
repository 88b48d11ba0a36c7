//! # Repository Module
//!
//! Database repository implementations for Tenpo.
//!
//! ## Read Paths Used by the Dashboard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  DashboardService                                                      │
//! │       │                                                                 │
//! │       │  db.records().list_records(&filter)                            │
//! │       │  db.baselines().book_between(from, to)                         │
//! │       │  db.targets().list_targets(&TargetFilter)                      │
//! │       │  db.stores().brand_directory()                                 │
//! │       ▼                                                                 │
//! │  RecordRepository ─── daily_records (re-normalized on read)            │
//! │  BaselineRepository ─ expense_baselines                                │
//! │  TargetRepository ─── targets, daily_targets                           │
//! │  StoreRepository ──── stores, brands                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`records::RecordRepository`] - Daily record CRUD and filtered reads
//! - [`baselines::BaselineRepository`] - Monthly overhead baselines
//! - [`targets::TargetRepository`] - Monthly and daily targets
//! - [`stores::StoreRepository`] - Stores, brands and the brand directory

pub mod baselines;
pub mod records;
pub mod stores;
pub mod targets;
