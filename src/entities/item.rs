//! Item entity - One row per tracked supply type.
//!
//! `id` is the store-assigned sequence identity. `code` is the externally supplied
//! identity used by catalogs running under the code scheme; it is unique when present.
//! `quantity` is only ever changed by the stock transaction engine, except for the
//! direct (unledgered) edit path.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// Store-assigned sequence identity
    #[sea_orm(primary_key)]
    pub id: i64,
    /// External identity (code scheme only)
    #[sea_orm(unique)]
    pub code: Option<String>,
    /// Display name, never empty
    pub name: String,
    /// Quantity on hand, never negative
    pub quantity: i64,
    /// Low-stock threshold; the item is flagged when `quantity <= minimum_threshold`
    pub minimum_threshold: i64,
    /// Quantity recorded at registration, the baseline the ledger is applied to
    pub baseline_quantity: i64,
    /// Supply category (e.g. "consumables")
    pub category: Option<String>,
    /// Unit of measure (e.g. "box", "pair")
    pub unit: Option<String>,
    /// Supplier name
    pub supplier: Option<String>,
    /// Storage location inside the stockroom
    pub location: Option<String>,
    /// Free-text note
    pub note: Option<String>,
    /// Expiry date as `YYYY-MM-DD`, None when undetermined
    pub expiry: Option<String>,
    /// When the item was registered
    pub created_at: DateTime,
    /// When the item row was last modified
    pub updated_at: DateTime,
}

/// Items do not own their movements; the ledger references them by id only.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the item is at or below its minimum threshold.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.quantity <= self.minimum_threshold
    }

    /// Identity shown to users: the external code if present, otherwise `#id`.
    #[must_use]
    pub fn display_identity(&self) -> String {
        self.code
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}
