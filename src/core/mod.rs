//! Core business logic - framework-agnostic catalog, ledger, alerting and reporting.
//!
//! Every function takes the storage handle explicitly; [`stockroom::Stockroom`] bundles
//! the handle with the catalog settings for callers that prefer an object.

/// Item and movement date parsing and storage formats
pub mod timestamp;

/// Item catalog: registration, edits, deletion and seeding
pub mod catalog;

/// Stock transaction engine: receipts, withdrawals and ledger queries
pub mod movement;

/// Low-stock, near-expiry and name search views
pub mod alerts;

/// Movement report and CSV export
pub mod report;

/// Bulk item import with per-row failure reporting
pub mod import;

/// Settings persisted inside the catalog
pub mod meta;

/// Catalog facade holding the storage handle
pub mod stockroom;
