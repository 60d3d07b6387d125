//! Bulk item import from tabular data.
//!
//! Each row is registered on its own, in its own transaction. A row that fails to
//! parse or register is logged, recorded in the [`ImportReport`] and skipped; the rest
//! of the batch carries on.

use crate::{
    core::{
        catalog::{IdentityScheme, ItemKey, ItemMetadata, NewItem, parse_quantity, register_item},
        timestamp::parse_expiry_text,
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::io::Read;
use tracing::{info, instrument, warn};

/// One row of import data, as text. Column names match the field names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportRow {
    /// External code (code catalogs only)
    pub code: Option<String>,
    /// Item name
    pub name: String,
    /// Initial quantity
    pub quantity: String,
    /// Low-stock threshold
    pub minimum_threshold: String,
    /// Supply category
    pub category: Option<String>,
    /// Unit of measure
    pub unit: Option<String>,
    /// Supplier name
    pub supplier: Option<String>,
    /// Storage location
    pub location: Option<String>,
    /// Free-text note
    pub note: Option<String>,
    /// Expiry date, `DD/MM/YYYY` or `YYYY-MM-DD`; blank means undetermined
    pub expiry: Option<String>,
}

impl ImportRow {
    fn into_new_item(self) -> Result<NewItem> {
        let quantity = parse_quantity(&self.quantity)?;
        let minimum_threshold = parse_quantity(&self.minimum_threshold)?;
        let expiry = self
            .expiry
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(parse_expiry_text)
            .transpose()?;

        Ok(NewItem {
            code: self.code,
            name: self.name,
            quantity,
            minimum_threshold,
            metadata: ItemMetadata {
                category: self.category,
                unit: self.unit,
                supplier: self.supplier,
                location: self.location,
                note: self.note,
                expiry,
            },
        })
    }
}

/// A row that was skipped.
#[derive(Debug)]
pub struct RowFailure {
    /// 1-based data row number (the header is not counted)
    pub row: usize,
    /// Why the row was rejected
    pub error: Error,
}

/// Outcome of an import batch.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Identities of the items registered, in row order
    pub registered: Vec<ItemKey>,
    /// Rows that were skipped
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    /// Number of rows processed, successful or not.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.registered.len() + self.failures.len()
    }

    /// Whether every row was registered.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, row: usize, error: Error) {
        warn!(row, %error, "Skipping import row");
        self.failures.push(RowFailure { row, error });
    }
}

/// Registers every row, skipping and reporting the ones that fail.
#[instrument(skip(db, rows))]
pub async fn import_rows<I>(
    db: &DatabaseConnection,
    scheme: IdentityScheme,
    rows: I,
) -> ImportReport
where
    I: IntoIterator<Item = ImportRow>,
{
    let mut report = ImportReport::default();
    let numbered = rows.into_iter().enumerate().map(|(index, row)| (index + 1, row));
    register_rows(db, scheme, numbered, &mut report).await;

    info!(
        registered = report.registered.len(),
        skipped = report.failures.len(),
        "Import finished"
    );
    report
}

async fn register_rows<I>(
    db: &DatabaseConnection,
    scheme: IdentityScheme,
    rows: I,
    report: &mut ImportReport,
) where
    I: IntoIterator<Item = (usize, ImportRow)>,
{
    for (row_number, row) in rows {
        let outcome = match row.into_new_item() {
            Ok(new_item) => register_item(db, scheme, new_item).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(key) => report.registered.push(key),
            Err(e) => report.record_failure(row_number, e),
        }
    }
}

/// Reads CSV with a header row and registers every data row.
///
/// # Errors
/// Fails as a whole only if the header cannot be read or has no `name` column;
/// individual bad rows are reported in the returned [`ImportReport`].
#[instrument(skip(db, reader))]
pub async fn import_csv<R: Read>(
    db: &DatabaseConnection,
    scheme: IdentityScheme,
    reader: R,
) -> Result<ImportReport> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    if !rdr.headers()?.iter().any(|header| header == "name") {
        return Err(Error::InvalidItem {
            message: "Import data has no 'name' column".to_string(),
        });
    }

    let mut parsed = Vec::new();
    let mut report = ImportReport::default();
    for (index, record) in rdr.deserialize::<ImportRow>().enumerate() {
        match record {
            Ok(row) => parsed.push((index + 1, row)),
            Err(e) => report.record_failure(index + 1, Error::Csv(e)),
        }
    }

    register_rows(db, scheme, parsed, &mut report).await;
    report.failures.sort_by_key(|failure| failure.row);

    info!(
        registered = report.registered.len(),
        skipped = report.failures.len(),
        "CSV import finished"
    );
    Ok(report)
}
