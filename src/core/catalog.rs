//! Item catalog business logic - registration, lookup, direct edits and deletion.
//!
//! Registration records the initial quantity as a baseline, not as a movement.
//! [`edit_item`] may overwrite the quantity directly; that path does not touch the
//! movement ledger and is the only way on-hand stock can diverge from
//! `baseline_quantity + ledger net` (see [`crate::core::movement::reconcile_item`]).
//! Deleting an item never touches its movements.

use crate::{
    config::stockroom::ItemSeed,
    core::timestamp::{format_storage_date, parse_expiry_text},
    entities::{Item, item},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument, warn};

/// How items are identified within one catalog. A catalog never mixes the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityScheme {
    /// The store assigns a sequence number on registration
    #[default]
    Sequence,
    /// Callers supply a unique external code on registration
    Code,
}

impl IdentityScheme {
    /// Stable text form used in settings and catalog metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Code => "code",
        }
    }
}

impl fmt::Display for IdentityScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sequence" => Ok(Self::Sequence),
            "code" => Ok(Self::Code),
            other => Err(Error::Config {
                message: format!("Unknown identity scheme: {other}"),
            }),
        }
    }
}

/// A resolved item identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    /// Store-assigned sequence number
    Id(i64),
    /// External code
    Code(String),
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Code(code) => f.write_str(code),
        }
    }
}

impl From<i64> for ItemKey {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ItemKey {
    fn from(code: &str) -> Self {
        Self::Code(code.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(code: String) -> Self {
        Self::Code(code)
    }
}

impl ItemKey {
    /// The identity under which `item` is known in a catalog using `scheme`.
    #[must_use]
    pub fn for_item(scheme: IdentityScheme, item: &item::Model) -> Self {
        match (scheme, &item.code) {
            (IdentityScheme::Code, Some(code)) => Self::Code(code.clone()),
            _ => Self::Id(item.id),
        }
    }
}

/// Descriptive item fields. Blank strings are stored as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMetadata {
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
    /// Expiry date, None when undetermined
    pub expiry: Option<NaiveDate>,
}

/// Input for [`register_item`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItem {
    /// External code; must be set for code catalogs and absent for sequence catalogs
    pub code: Option<String>,
    /// Display name
    pub name: String,
    /// Initial quantity on hand
    pub quantity: i64,
    /// Low-stock threshold
    pub minimum_threshold: i64,
    /// Descriptive fields
    pub metadata: ItemMetadata,
}

/// Field updates for [`edit_item`]. `None` leaves a field untouched; for optional
/// metadata, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    /// New display name
    pub name: Option<String>,
    /// New quantity on hand, written without a ledger movement
    pub quantity: Option<i64>,
    /// New low-stock threshold
    pub minimum_threshold: Option<i64>,
    /// New category
    pub category: Option<Option<String>>,
    /// New unit of measure
    pub unit: Option<Option<String>>,
    /// New supplier
    pub supplier: Option<Option<String>>,
    /// New storage location
    pub location: Option<Option<String>>,
    /// New note
    pub note: Option<Option<String>>,
    /// New expiry date
    pub expiry: Option<Option<NaiveDate>>,
}

/// Parses a quantity typed into a form or read from imported data.
/// Accepts non-negative whole numbers only.
pub fn parse_quantity(text: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .ok()
        .filter(|quantity| *quantity >= 0)
        .ok_or_else(|| Error::InvalidQuantity {
            value: text.to_string(),
        })
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidItem {
            message: "Item name cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn validate_non_negative(value: i64) -> Result<i64> {
    if value < 0 {
        return Err(Error::InvalidQuantity {
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn map_unique_violation(err: DbErr, identity: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateIdentity {
            identity: identity.to_string(),
        },
        _ => Error::Storage(err),
    }
}

/// Looks an item up by identity.
pub async fn find_item<C>(db: &C, key: &ItemKey) -> Result<Option<item::Model>>
where
    C: ConnectionTrait,
{
    let found = match key {
        ItemKey::Id(id) => Item::find_by_id(*id).one(db).await?,
        ItemKey::Code(code) => {
            Item::find()
                .filter(item::Column::Code.eq(code.as_str()))
                .one(db)
                .await?
        }
    };
    Ok(found)
}

/// Looks an item up by identity, failing with `ItemNotFound` when absent.
pub async fn require_item<C>(db: &C, key: &ItemKey) -> Result<item::Model>
where
    C: ConnectionTrait,
{
    find_item(db, key).await?.ok_or_else(|| Error::ItemNotFound {
        key: key.to_string(),
    })
}

/// Retrieves an item by identity, returning None if it does not exist.
pub async fn get_item(db: &DatabaseConnection, key: &ItemKey) -> Result<Option<item::Model>> {
    find_item(db, key).await
}

/// Retrieves every item in storage (registration) order.
pub async fn list_items(db: &DatabaseConnection) -> Result<Vec<item::Model>> {
    Item::find()
        .order_by_asc(item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Registers a new item and returns its identity.
///
/// The initial quantity becomes the item's baseline; no movement is recorded for it.
///
/// # Errors
/// - `InvalidItem` if the name is blank, or the code does not fit the identity scheme
/// - `InvalidQuantity` if the quantity or threshold is negative
/// - `DuplicateIdentity` if the code is already in use
#[instrument(skip(db, new_item), fields(name = %new_item.name))]
pub async fn register_item(
    db: &DatabaseConnection,
    scheme: IdentityScheme,
    new_item: NewItem,
) -> Result<ItemKey> {
    let name = validate_name(&new_item.name)?;
    let quantity = validate_non_negative(new_item.quantity)?;
    let minimum_threshold = validate_non_negative(new_item.minimum_threshold)?;
    let code = clean(new_item.code);

    match (scheme, &code) {
        (IdentityScheme::Sequence, Some(code)) => {
            return Err(Error::InvalidItem {
                message: format!("Catalog assigns sequence identities; code '{code}' not accepted"),
            });
        }
        (IdentityScheme::Code, None) => {
            return Err(Error::InvalidItem {
                message: "Catalog requires an item code".to_string(),
            });
        }
        _ => {}
    }

    let metadata = new_item.metadata;
    let txn = db.begin().await?;

    if let Some(code) = &code {
        let existing = find_item(&txn, &ItemKey::Code(code.clone())).await?;
        if existing.is_some() {
            return Err(Error::DuplicateIdentity {
                identity: code.clone(),
            });
        }
    }

    let now = chrono::Utc::now().naive_utc();
    let model = item::ActiveModel {
        code: Set(code.clone()),
        name: Set(name),
        quantity: Set(quantity),
        minimum_threshold: Set(minimum_threshold),
        baseline_quantity: Set(quantity),
        category: Set(clean(metadata.category)),
        unit: Set(clean(metadata.unit)),
        supplier: Set(clean(metadata.supplier)),
        location: Set(clean(metadata.location)),
        note: Set(clean(metadata.note)),
        expiry: Set(metadata.expiry.map(format_storage_date)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let identity = code.clone().unwrap_or_default();
    let created = model
        .insert(&txn)
        .await
        .map_err(|e| map_unique_violation(e, &identity))?;

    txn.commit().await?;

    let key = ItemKey::for_item(scheme, &created);
    info!(item = %key, quantity, "Registered item");
    Ok(key)
}

/// Edits an item in place.
///
/// A quantity given here overwrites the on-hand quantity without recording a
/// movement. Receipts and withdrawals belong in
/// [`crate::core::movement::apply_receipt`] and
/// [`crate::core::movement::apply_withdrawal`]; this path exists for corrections.
#[instrument(skip(db, changes))]
pub async fn edit_item(
    db: &DatabaseConnection,
    key: &ItemKey,
    changes: ItemChanges,
) -> Result<item::Model> {
    let name = changes.name.as_deref().map(validate_name).transpose()?;
    let quantity = changes.quantity.map(validate_non_negative).transpose()?;
    let minimum_threshold = changes
        .minimum_threshold
        .map(validate_non_negative)
        .transpose()?;

    let txn = db.begin().await?;
    let existing = require_item(&txn, key).await?;
    let previous_quantity = existing.quantity;

    let mut active: item::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(quantity) = quantity {
        if quantity != previous_quantity {
            warn!(
                item = %key,
                from = previous_quantity,
                to = quantity,
                "Direct quantity edit; no movement recorded"
            );
        }
        active.quantity = Set(quantity);
    }
    if let Some(threshold) = minimum_threshold {
        active.minimum_threshold = Set(threshold);
    }
    if let Some(category) = changes.category {
        active.category = Set(clean(category));
    }
    if let Some(unit) = changes.unit {
        active.unit = Set(clean(unit));
    }
    if let Some(supplier) = changes.supplier {
        active.supplier = Set(clean(supplier));
    }
    if let Some(location) = changes.location {
        active.location = Set(clean(location));
    }
    if let Some(note) = changes.note {
        active.note = Set(clean(note));
    }
    if let Some(expiry) = changes.expiry {
        active.expiry = Set(expiry.map(format_storage_date));
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Deletes an item. Its movements stay in the ledger.
#[instrument(skip(db))]
pub async fn delete_item(db: &DatabaseConnection, key: &ItemKey) -> Result<()> {
    let txn = db.begin().await?;
    let existing = require_item(&txn, key).await?;
    existing.delete(&txn).await?;
    txn.commit().await?;
    info!(item = %key, "Deleted item; movement history retained");
    Ok(())
}

/// Registers configured seed items that are not in the catalog yet.
///
/// Code catalogs match seeds by code; sequence catalogs match by name.
/// Returns how many items were registered.
#[instrument(skip(db, seeds), fields(count = seeds.len()))]
pub async fn seed_items(
    db: &DatabaseConnection,
    scheme: IdentityScheme,
    seeds: &[ItemSeed],
) -> Result<usize> {
    let mut registered = 0;
    for seed in seeds {
        let existing = match (scheme, &seed.code) {
            (IdentityScheme::Code, Some(code)) => {
                find_item(db, &ItemKey::Code(code.trim().to_string())).await?
            }
            _ => {
                Item::find()
                    .filter(item::Column::Name.eq(seed.name.trim()))
                    .one(db)
                    .await?
            }
        };
        if existing.is_some() {
            info!("Seed item '{}' already present. Skipping.", seed.name);
            continue;
        }

        let expiry = seed.expiry.as_deref().map(parse_expiry_text).transpose()?;
        let new_item = NewItem {
            code: seed.code.clone(),
            name: seed.name.clone(),
            quantity: seed.quantity,
            minimum_threshold: seed.minimum_threshold,
            metadata: ItemMetadata {
                category: seed.category.clone(),
                unit: seed.unit.clone(),
                supplier: seed.supplier.clone(),
                location: seed.location.clone(),
                note: seed.note.clone(),
                expiry,
            },
        };
        register_item(db, scheme, new_item).await?;
        registered += 1;
    }
    Ok(registered)
}
