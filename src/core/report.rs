//! Report generation business logic.
//!
//! Produces the ordered movement history consumed by exporters and renders it, or the
//! current stock list, as CSV. Movements whose item has since been deleted are kept
//! and labelled, so exported history is never truncated by a deletion.

use crate::{
    core::{catalog::list_items, movement::all_movements},
    entities::{MovementKind, item},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// One line of the movement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementReportRow {
    /// Item name, or a placeholder naming the sequence id of a deleted item
    #[serde(rename = "Item")]
    pub item_name: String,
    /// Receipt or withdrawal
    #[serde(rename = "Kind")]
    pub kind: MovementKind,
    /// Units moved
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    /// Movement date as stored
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    /// Whether the item no longer exists in the catalog
    #[serde(skip)]
    pub item_deleted: bool,
}

#[derive(Debug, Serialize)]
struct StockRow<'a> {
    #[serde(rename = "Identity")]
    identity: String,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Quantity")]
    quantity: i64,
    #[serde(rename = "Minimum")]
    minimum: i64,
    #[serde(rename = "Unit")]
    unit: &'a str,
    #[serde(rename = "Expiry")]
    expiry: &'a str,
    #[serde(rename = "Low stock")]
    low_stock: &'static str,
}

/// Builds the movement report in chronological order.
pub async fn movement_report(db: &DatabaseConnection) -> Result<Vec<MovementReportRow>> {
    let names: HashMap<i64, String> = list_items(db)
        .await?
        .into_iter()
        .map(|item| (item.id, item.name))
        .collect();

    let rows = all_movements(db)
        .await?
        .into_iter()
        .map(|entry| {
            let name = names.get(&entry.item_id).cloned();
            MovementReportRow {
                item_deleted: name.is_none(),
                item_name: name.unwrap_or_else(|| format!("(deleted item #{})", entry.item_id)),
                kind: entry.kind,
                quantity: entry.quantity,
                timestamp: entry.timestamp,
            }
        })
        .collect();
    Ok(rows)
}

/// Writes movement report rows as CSV with an `Item,Kind,Quantity,Timestamp` header.
pub fn export_movements_csv<W: Write>(rows: &[MovementReportRow], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(["Item", "Kind", "Quantity", "Timestamp"])?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the current stock list as CSV, one row per item.
pub fn export_stock_csv<W: Write>(items: &[item::Model], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for item in items {
        wtr.serialize(StockRow {
            identity: item.display_identity(),
            name: &item.name,
            quantity: item.quantity,
            minimum: item.minimum_threshold,
            unit: item.unit.as_deref().unwrap_or(""),
            expiry: item.expiry.as_deref().unwrap_or(""),
            low_stock: if item.is_low_stock() { "yes" } else { "no" },
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// One-line stock summary, e.g. `GLV-M | Gloves (M) | 3 box (min 5) | LOW STOCK`.
#[must_use]
pub fn format_stock_line(item: &item::Model) -> String {
    let unit = item
        .unit
        .as_deref()
        .map(|unit| format!(" {unit}"))
        .unwrap_or_default();
    let mut line = format!(
        "{} | {} | {}{unit} (min {})",
        item.display_identity(),
        item.name,
        item.quantity,
        item.minimum_threshold
    );
    if item.is_low_stock() {
        line.push_str(" | LOW STOCK");
    }
    line
}

/// One-line movement summary, e.g. `2024-01-02 | Withdrawal | -3 | Gauze`.
#[must_use]
pub fn format_movement_line(row: &MovementReportRow) -> String {
    let signed = row.kind.signed(row.quantity);
    format!("{} | {} | {signed:+} | {}", row.timestamp, row.kind, row.item_name)
}
