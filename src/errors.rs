//! Unified error type for the stockroom ledger.
//!
//! Validation errors (`InvalidQuantity`, `InvalidTimestamp`, `InvalidItem`) are raised
//! before any storage access. `InsufficientStock` is raised inside the transaction that
//! would have performed the write, which is then rolled back. `Storage` wraps every
//! persistence fault.

use thiserror::Error;

/// Every failure the catalog, ledger and reporting layers can surface to callers.
#[derive(Debug, Error)]
pub enum Error {
    /// The item identity does not resolve to a catalog entry
    #[error("Item not found: {key}")]
    ItemNotFound {
        /// Display form of the identity that was looked up
        key: String,
    },

    /// Quantity is zero, negative, non-numeric or would overflow
    #[error("Invalid quantity: {value}")]
    InvalidQuantity {
        /// The rejected value as received
        value: String,
    },

    /// Date text did not match the accepted calendar formats
    #[error("Invalid timestamp '{input}': expected DD/MM/YYYY")]
    InvalidTimestamp {
        /// The rejected input
        input: String,
    },

    /// A withdrawal asked for more than is on hand
    #[error("Insufficient stock: {on_hand} on hand, {requested} requested")]
    InsufficientStock {
        /// Quantity on hand when the withdrawal was evaluated
        on_hand: i64,
        /// Quantity the withdrawal asked for
        requested: i64,
    },

    /// Another item already uses this identity
    #[error("Duplicate item identity: {identity}")]
    DuplicateIdentity {
        /// The conflicting identity
        identity: String,
    },

    /// A required item field is missing or malformed
    #[error("Invalid item: {message}")]
    InvalidItem {
        /// What was wrong with the item
        message: String,
    },

    /// Any fault raised by the underlying store
    #[error("Storage failure: {0}")]
    Storage(#[from] sea_orm::DbErr),

    /// Settings could not be read, parsed, or conflict with the stored catalog
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// I/O error while reading or writing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// True for errors caused by the caller's input rather than by stock levels or
    /// storage. Most are raised before storage is touched; receipt overflow is detected
    /// inside the transaction.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuantity { .. } | Self::InvalidTimestamp { .. } | Self::InvalidItem { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
