//! Stock transaction engine - applies receipts and withdrawals to the catalog.
//!
//! Every successful call changes the item's on-hand quantity and appends exactly one
//! movement, inside one database transaction. Inputs are validated before the
//! transaction opens. The withdrawal sufficiency check and the decrement run in the
//! same transaction, and the decrement itself is guarded
//! (`quantity = quantity - q WHERE quantity >= q`), so a concurrent writer can never
//! drive stock negative. Any early return drops the transaction, which rolls it back.

use crate::{
    core::{
        catalog::{ItemKey, require_item},
        timestamp::MovementTime,
    },
    entities::{Item, Movement, MovementKind, item, movement},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

/// On-hand quantity compared with what the ledger accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockReconciliation {
    /// Sequence identity of the item
    pub item_id: i64,
    /// Quantity on hand
    pub on_hand: i64,
    /// Quantity recorded at registration
    pub baseline: i64,
    /// Signed sum of the item's movements
    pub ledger_net: i64,
}

impl StockReconciliation {
    /// On-hand minus what baseline plus ledger predicts. Non-zero only after direct
    /// quantity edits.
    #[must_use]
    pub const fn drift(&self) -> i64 {
        self.on_hand - (self.baseline + self.ledger_net)
    }

    /// Whether the ledger fully explains the on-hand quantity.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.drift() == 0
    }
}

fn validate_movement_quantity(quantity: i64) -> Result<i64> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity {
            value: quantity.to_string(),
        });
    }
    Ok(quantity)
}

/// Records stock received into the stockroom and returns the new on-hand quantity.
///
/// # Arguments
/// * `db` - Database connection
/// * `key` - Identity of an existing item
/// * `quantity` - Positive number of units received
/// * `timestamp` - Movement date as `DD/MM/YYYY` (optionally with `HH:MM[:SS]`);
///   past dates are accepted
///
/// # Errors
/// `InvalidQuantity`, `InvalidTimestamp`, `ItemNotFound`, or `Storage`.
pub async fn apply_receipt(
    db: &DatabaseConnection,
    key: &ItemKey,
    quantity: i64,
    timestamp: &str,
) -> Result<i64> {
    apply_movement(db, key, MovementKind::Receipt, quantity, timestamp).await
}

/// Records stock taken out of the stockroom and returns the new on-hand quantity.
///
/// # Errors
/// As [`apply_receipt`], plus `InsufficientStock` when `quantity` exceeds the quantity
/// on hand. The catalog and ledger are left unchanged in that case.
pub async fn apply_withdrawal(
    db: &DatabaseConnection,
    key: &ItemKey,
    quantity: i64,
    timestamp: &str,
) -> Result<i64> {
    apply_movement(db, key, MovementKind::Withdrawal, quantity, timestamp).await
}

/// Applies one movement of either direction. See [`apply_receipt`] and
/// [`apply_withdrawal`].
pub async fn apply_movement(
    db: &DatabaseConnection,
    key: &ItemKey,
    kind: MovementKind,
    quantity: i64,
    timestamp: &str,
) -> Result<i64> {
    let quantity = validate_movement_quantity(quantity)?;
    let time = MovementTime::parse_entry(timestamp)?;
    apply_movement_at(db, key, kind, quantity, time).await
}

/// Applies one movement with an already parsed movement time.
#[instrument(skip(db))]
pub async fn apply_movement_at(
    db: &DatabaseConnection,
    key: &ItemKey,
    kind: MovementKind,
    quantity: i64,
    time: MovementTime,
) -> Result<i64> {
    let quantity = validate_movement_quantity(quantity)?;

    let txn = db.begin().await?;
    let current = require_item(&txn, key).await?;

    match kind {
        MovementKind::Receipt => {
            if current.quantity.checked_add(quantity).is_none() {
                return Err(Error::InvalidQuantity {
                    value: quantity.to_string(),
                });
            }
            Item::update_many()
                .col_expr(
                    item::Column::Quantity,
                    Expr::col(item::Column::Quantity).add(quantity),
                )
                .filter(item::Column::Id.eq(current.id))
                .exec(&txn)
                .await?;
        }
        MovementKind::Withdrawal => {
            if quantity > current.quantity {
                return Err(Error::InsufficientStock {
                    on_hand: current.quantity,
                    requested: quantity,
                });
            }
            let result = Item::update_many()
                .col_expr(
                    item::Column::Quantity,
                    Expr::col(item::Column::Quantity).sub(quantity),
                )
                .filter(item::Column::Id.eq(current.id))
                .filter(item::Column::Quantity.gte(quantity))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                let on_hand = require_item(&txn, key).await?.quantity;
                return Err(Error::InsufficientStock {
                    on_hand,
                    requested: quantity,
                });
            }
        }
    }

    let entry = movement::ActiveModel {
        item_id: Set(current.id),
        kind: Set(kind),
        quantity: Set(quantity),
        timestamp: Set(time.to_storage_string()),
        recorded_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let entry = entry.insert(&txn).await?;

    let on_hand = require_item(&txn, key).await?.quantity;
    txn.commit().await?;

    info!(
        item = %key,
        movement = entry.id,
        %kind,
        quantity,
        on_hand,
        "Movement applied"
    );
    Ok(on_hand)
}

/// Retrieves the ledger for one item, newest movement first.
///
/// Works for deleted items when addressed by sequence id.
pub async fn movements_for_item(
    db: &DatabaseConnection,
    key: &ItemKey,
) -> Result<Vec<movement::Model>> {
    let item_id = match key {
        ItemKey::Id(id) => *id,
        ItemKey::Code(_) => require_item(db, key).await?.id,
    };
    Movement::find()
        .filter(movement::Column::ItemId.eq(item_id))
        .order_by_desc(movement::Column::Timestamp)
        .order_by_desc(movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the whole ledger in chronological order (ties broken by sequence).
pub async fn all_movements(db: &DatabaseConnection) -> Result<Vec<movement::Model>> {
    Movement::find()
        .order_by_asc(movement::Column::Timestamp)
        .order_by_asc(movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Signed sum of every movement recorded against an item.
pub async fn ledger_net_quantity<C>(db: &C, item_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let entries = Movement::find()
        .filter(movement::Column::ItemId.eq(item_id))
        .all(db)
        .await?;
    debug!(item_id, entries = entries.len(), "Summing ledger");
    Ok(entries
        .iter()
        .map(|entry| entry.kind.signed(entry.quantity))
        .sum())
}

/// Compares an item's on-hand quantity with its baseline plus ledger net.
pub async fn reconcile_item(
    db: &DatabaseConnection,
    key: &ItemKey,
) -> Result<StockReconciliation> {
    let txn = db.begin().await?;
    let current = require_item(&txn, key).await?;
    let ledger_net = ledger_net_quantity(&txn, current.id).await?;
    txn.commit().await?;

    Ok(StockReconciliation {
        item_id: current.id,
        on_hand: current.quantity,
        baseline: current.baseline_quantity,
        ledger_net,
    })
}
