//! `Stockroom` - one catalog and its ledger behind an owned storage handle.
//!
//! Holds the database connection and the catalog settings so callers (the binary,
//! a form layer) do not have to thread them through every call. Each method is a thin
//! delegation to the framework-agnostic functions in [`crate::core`].

use crate::{
    config::stockroom::{AlertSettings, Config},
    core::{
        alerts::{self, ExpiryAlert},
        catalog::{self, IdentityScheme, ItemChanges, ItemKey, NewItem},
        import::{self, ImportReport, ImportRow},
        meta,
        movement::{self, StockReconciliation},
        report::{self, MovementReportRow},
    },
    entities::{item, movement as movement_entity},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::io::{Read, Write};
use tracing::info;

/// A stockroom catalog bound to its storage.
#[derive(Debug)]
pub struct Stockroom {
    database: DatabaseConnection,
    scheme: IdentityScheme,
    alerts: AlertSettings,
}

impl Stockroom {
    /// Opens a catalog on an initialised database, checks its identity scheme and
    /// registers any missing seed items from `config`.
    pub async fn open(database: DatabaseConnection, config: &Config) -> Result<Self> {
        let scheme = prepare_catalog(&database, config).await?;
        Ok(Self {
            database,
            scheme,
            alerts: config.alerts,
        })
    }

    /// The catalog's identity scheme.
    #[must_use]
    pub const fn scheme(&self) -> IdentityScheme {
        self.scheme
    }

    /// Records a receipt; returns the new on-hand quantity.
    pub async fn receive(&self, key: &ItemKey, quantity: i64, timestamp: &str) -> Result<i64> {
        movement::apply_receipt(&self.database, key, quantity, timestamp).await
    }

    /// Records a withdrawal; returns the new on-hand quantity.
    pub async fn withdraw(&self, key: &ItemKey, quantity: i64, timestamp: &str) -> Result<i64> {
        movement::apply_withdrawal(&self.database, key, quantity, timestamp).await
    }

    /// Registers a new item.
    pub async fn register(&self, new_item: NewItem) -> Result<ItemKey> {
        catalog::register_item(&self.database, self.scheme, new_item).await
    }

    /// Edits an item in place. Quantity changes here are not ledgered.
    pub async fn edit(&self, key: &ItemKey, changes: ItemChanges) -> Result<item::Model> {
        catalog::edit_item(&self.database, key, changes).await
    }

    /// Deletes an item, keeping its movements.
    pub async fn delete(&self, key: &ItemKey) -> Result<()> {
        catalog::delete_item(&self.database, key).await
    }

    /// Looks an item up.
    pub async fn item(&self, key: &ItemKey) -> Result<Option<item::Model>> {
        catalog::get_item(&self.database, key).await
    }

    /// Every item in storage order.
    pub async fn items(&self) -> Result<Vec<item::Model>> {
        catalog::list_items(&self.database).await
    }

    /// Ledger history of one item, newest first.
    pub async fn history(&self, key: &ItemKey) -> Result<Vec<movement_entity::Model>> {
        movement::movements_for_item(&self.database, key).await
    }

    /// Compares on-hand stock with baseline plus ledger.
    pub async fn reconcile(&self, key: &ItemKey) -> Result<StockReconciliation> {
        movement::reconcile_item(&self.database, key).await
    }

    /// Items at or below their threshold.
    pub async fn low_stock(&self) -> Result<Vec<item::Model>> {
        alerts::low_stock(&self.database).await
    }

    /// Expired and near-expiry items using the configured horizon.
    pub async fn expiring_soon(&self, as_of: NaiveDate) -> Result<Vec<ExpiryAlert>> {
        alerts::expiring_soon(&self.database, as_of, self.alerts.expiry_horizon_days).await
    }

    /// Case-insensitive name search.
    pub async fn search(&self, needle: &str) -> Result<Vec<item::Model>> {
        alerts::search_by_name(&self.database, needle).await
    }

    /// Chronological movement report.
    pub async fn movement_report(&self) -> Result<Vec<MovementReportRow>> {
        report::movement_report(&self.database).await
    }

    /// Writes the movement report as CSV.
    pub async fn export_movements<W: Write>(&self, writer: W) -> Result<usize> {
        let rows = self.movement_report().await?;
        report::export_movements_csv(&rows, writer)?;
        Ok(rows.len())
    }

    /// Writes the current stock list as CSV.
    pub async fn export_stock<W: Write>(&self, writer: W) -> Result<usize> {
        let items = self.items().await?;
        report::export_stock_csv(&items, writer)?;
        Ok(items.len())
    }

    /// Registers items from CSV, skipping bad rows.
    pub async fn import_csv<R: Read>(&self, reader: R) -> Result<ImportReport> {
        import::import_csv(&self.database, self.scheme, reader).await
    }

    /// Registers items from already tabulated rows, skipping bad rows.
    pub async fn import_rows<I>(&self, rows: I) -> ImportReport
    where
        I: IntoIterator<Item = ImportRow>,
    {
        import::import_rows(&self.database, self.scheme, rows).await
    }
}

async fn prepare_catalog(database: &DatabaseConnection, config: &Config) -> Result<IdentityScheme> {
    let scheme = config.catalog.identity;
    meta::ensure_identity_scheme(database, scheme).await?;
    let seeded = catalog::seed_items(database, scheme, &config.items).await?;
    if seeded > 0 {
        info!(seeded, "Seed items registered");
    }
    Ok(scheme)
}
