//! Movement entity - Immutable ledger entries for receipts and withdrawals.
//!
//! `item_id` is a weak reference: there is no foreign key, so deleting an item leaves
//! its movements in place. `timestamp` is the caller-supplied movement date stored as
//! `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`; `recorded_at` is when the row was written.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a stock movement
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum MovementKind {
    /// Stock received into the stockroom
    #[sea_orm(string_value = "Receipt")]
    Receipt,
    /// Stock taken out of the stockroom
    #[sea_orm(string_value = "Withdrawal")]
    Withdrawal,
}

impl MovementKind {
    /// Applies the direction to a positive quantity.
    #[must_use]
    pub const fn signed(self, quantity: i64) -> i64 {
        match self {
            Self::Receipt => quantity,
            Self::Withdrawal => -quantity,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receipt => f.write_str("Receipt"),
            Self::Withdrawal => f.write_str("Withdrawal"),
        }
    }
}

/// Movement database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    /// Monotonically increasing sequence number
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sequence identity of the item this movement applied to
    pub item_id: i64,
    /// Receipt or withdrawal
    pub kind: MovementKind,
    /// Positive quantity moved
    pub quantity: i64,
    /// Movement date, `YYYY-MM-DD[ HH:MM:SS]`
    pub timestamp: String,
    /// When the movement was written
    pub recorded_at: DateTimeUtc,
}

/// Movements reference items by id without a declared relation (no cascading).
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
