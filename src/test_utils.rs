//! Shared test utilities for the stockroom ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and registering test items with sensible defaults.

use crate::{
    core::catalog::{self, IdentityScheme, ItemKey, NewItem},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers a test item in a sequence-identity catalog.
///
/// # Arguments
/// * `db` - Database connection
/// * `name` - Item name
/// * `quantity` - Initial quantity
/// * `minimum_threshold` - Low-stock threshold
pub async fn create_test_item(
    db: &DatabaseConnection,
    name: &str,
    quantity: i64,
    minimum_threshold: i64,
) -> Result<ItemKey> {
    catalog::register_item(
        db,
        IdentityScheme::Sequence,
        NewItem {
            name: name.to_string(),
            quantity,
            minimum_threshold,
            ..Default::default()
        },
    )
    .await
}

/// Registers a test item in a code-identity catalog.
pub async fn create_coded_item(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    quantity: i64,
    minimum_threshold: i64,
) -> Result<ItemKey> {
    catalog::register_item(
        db,
        IdentityScheme::Code,
        NewItem {
            code: Some(code.to_string()),
            name: name.to_string(),
            quantity,
            minimum_threshold,
            ..Default::default()
        },
    )
    .await
}

/// Sets up a database holding one item: "Gauze", quantity 10, threshold 5.
/// Returns (db, item key) for common test scenarios.
pub async fn setup_with_item() -> Result<(DatabaseConnection, ItemKey)> {
    let db = setup_test_db().await?;
    let key = create_test_item(&db, "Gauze", 10, 5).await?;
    Ok((db, key))
}
