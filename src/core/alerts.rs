//! Alerting and query layer - read-only views over the catalog.
//!
//! Every call queries current state; nothing is cached between calls.

use crate::{
    core::timestamp::parse_stored_date,
    entities::{Item, item},
    errors::Result,
};
use chrono::{Days, NaiveDate};
use sea_orm::{QueryOrder, prelude::*, sea_query::Expr};

/// Why an item shows up in the expiry view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// Expiry date is before the reference date
    Expired,
    /// Expiry date falls within the horizon
    ExpiringSoon,
}

/// An item flagged by [`expiring_soon`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryAlert {
    /// The flagged item
    pub item: item::Model,
    /// Parsed expiry date
    pub expiry: NaiveDate,
    /// Expired or expiring soon
    pub status: ExpiryStatus,
    /// Days from the reference date to expiry; negative once expired
    pub days_remaining: i64,
}

/// Items whose quantity on hand is at or below their minimum threshold,
/// in storage order.
pub async fn low_stock(db: &DatabaseConnection) -> Result<Vec<item::Model>> {
    Item::find()
        .filter(Expr::col(item::Column::Quantity).lte(Expr::col(item::Column::MinimumThreshold)))
        .order_by_asc(item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Items that have expired before `as_of`, or expire on or before
/// `as_of + horizon_days`, soonest first.
///
/// Items without an expiry date, or with one that cannot be parsed, are never
/// included.
pub async fn expiring_soon(
    db: &DatabaseConnection,
    as_of: NaiveDate,
    horizon_days: u32,
) -> Result<Vec<ExpiryAlert>> {
    let limit = as_of
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .unwrap_or(NaiveDate::MAX);

    let candidates = Item::find()
        .filter(item::Column::Expiry.is_not_null())
        .order_by_asc(item::Column::Id)
        .all(db)
        .await?;

    let mut alerts: Vec<ExpiryAlert> = candidates
        .into_iter()
        .filter_map(|item| {
            let expiry = item.expiry.as_deref().and_then(parse_stored_date)?;
            classify_expiry(expiry, as_of, limit).map(|status| ExpiryAlert {
                days_remaining: (expiry - as_of).num_days(),
                item,
                expiry,
                status,
            })
        })
        .collect();

    alerts.sort_by(|a, b| a.expiry.cmp(&b.expiry).then(a.item.id.cmp(&b.item.id)));
    Ok(alerts)
}

fn classify_expiry(expiry: NaiveDate, as_of: NaiveDate, limit: NaiveDate) -> Option<ExpiryStatus> {
    if expiry < as_of {
        Some(ExpiryStatus::Expired)
    } else if expiry <= limit {
        Some(ExpiryStatus::ExpiringSoon)
    } else {
        None
    }
}

/// Items whose name contains `needle`, ignoring case, in storage order.
/// An empty needle matches every item.
pub async fn search_by_name(db: &DatabaseConnection, needle: &str) -> Result<Vec<item::Model>> {
    let needle = needle.trim().to_lowercase();
    let items = Item::find()
        .order_by_asc(item::Column::Id)
        .all(db)
        .await?;

    Ok(items
        .into_iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::catalog::{
        IdentityScheme, ItemChanges, ItemMetadata, NewItem, edit_item, register_item,
    };
    use crate::core::movement::apply_withdrawal;
    use crate::test_utils::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn register_expiring(
        db: &DatabaseConnection,
        name: &str,
        expiry: Option<NaiveDate>,
    ) -> Result<crate::core::catalog::ItemKey> {
        register_item(
            db,
            IdentityScheme::Sequence,
            NewItem {
                name: name.to_string(),
                quantity: 5,
                minimum_threshold: 1,
                metadata: ItemMetadata {
                    expiry,
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
    }

    #[tokio::test]
    async fn test_low_stock_threshold_is_inclusive() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_item(&db, "Below", 2, 5).await?;
        create_test_item(&db, "Equal", 5, 5).await?;
        create_test_item(&db, "Above", 6, 5).await?;

        let names: Vec<String> = low_stock(&db).await?.into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Below", "Equal"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_low_stock_reflects_current_state() -> Result<()> {
        let (db, key) = setup_with_item().await?;
        assert!(low_stock(&db).await?.is_empty());

        apply_withdrawal(&db, &key, 6, "01/01/2024").await?;
        let flagged = low_stock(&db).await?;
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].quantity, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_queries_are_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_item(&db, "Gauze pads", 1, 3).await?;
        create_test_item(&db, "Gloves", 9, 3).await?;

        let first_low = low_stock(&db).await?;
        let second_low = low_stock(&db).await?;
        assert_eq!(first_low, second_low);

        let first_search = search_by_name(&db, "g").await?;
        let second_search = search_by_name(&db, "g").await?;
        assert_eq!(first_search, second_search);
        assert_eq!(first_search.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_expiring_soon_example() -> Result<()> {
        let db = setup_test_db().await?;
        register_expiring(&db, "Soon", Some(date(2024, 1, 20))).await?;
        register_expiring(&db, "Later", Some(date(2024, 3, 1))).await?;
        register_expiring(&db, "Unknown", None).await?;

        let alerts = expiring_soon(&db, date(2024, 1, 1), 30).await?;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].item.name, "Soon");
        assert_eq!(alerts[0].status, ExpiryStatus::ExpiringSoon);
        assert_eq!(alerts[0].days_remaining, 19);
        Ok(())
    }

    #[tokio::test]
    async fn test_expiring_soon_boundaries() -> Result<()> {
        let db = setup_test_db().await?;
        register_expiring(&db, "Expired", Some(date(2023, 12, 31))).await?;
        register_expiring(&db, "Today", Some(date(2024, 1, 1))).await?;
        register_expiring(&db, "Horizon edge", Some(date(2024, 1, 31))).await?;
        register_expiring(&db, "Past horizon", Some(date(2024, 2, 1))).await?;

        let alerts = expiring_soon(&db, date(2024, 1, 1), 30).await?;
        let flagged: Vec<(&str, ExpiryStatus)> = alerts
            .iter()
            .map(|a| (a.item.name.as_str(), a.status))
            .collect();
        assert_eq!(
            flagged,
            vec![
                ("Expired", ExpiryStatus::Expired),
                ("Today", ExpiryStatus::ExpiringSoon),
                ("Horizon edge", ExpiryStatus::ExpiringSoon),
            ]
        );
        assert_eq!(alerts[0].days_remaining, -1);
        Ok(())
    }

    #[tokio::test]
    async fn test_expiring_soon_zero_horizon_only_expired_and_today() -> Result<()> {
        let db = setup_test_db().await?;
        register_expiring(&db, "Expired", Some(date(2023, 6, 1))).await?;
        register_expiring(&db, "Tomorrow", Some(date(2024, 1, 2))).await?;

        let alerts = expiring_soon(&db, date(2024, 1, 1), 0).await?;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].status, ExpiryStatus::Expired);
        Ok(())
    }

    #[tokio::test]
    async fn test_expiring_soon_follows_edits() -> Result<()> {
        let db = setup_test_db().await?;
        let key = register_expiring(&db, "Resin", Some(date(2024, 1, 10))).await?;
        assert_eq!(expiring_soon(&db, date(2024, 1, 1), 30).await?.len(), 1);

        edit_item(
            &db,
            &key,
            ItemChanges {
                expiry: Some(None),
                ..Default::default()
            },
        )
        .await?;
        assert!(expiring_soon(&db, date(2024, 1, 1), 30).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_search_by_name_case_insensitive() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_item(&db, "Luva de Procedimento", 1, 0).await?;
        create_test_item(&db, "Máscara", 1, 0).await?;
        create_test_item(&db, "LUVA Cirúrgica", 1, 0).await?;

        let names: Vec<String> = search_by_name(&db, "luva")
            .await?
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Luva de Procedimento", "LUVA Cirúrgica"]);

        let accented = search_by_name(&db, "MÁSC").await?;
        assert_eq!(accented.len(), 1);

        assert_eq!(search_by_name(&db, "").await?.len(), 3);
        assert!(search_by_name(&db, "syringe").await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_classify_expiry() {
        let as_of = date(2024, 1, 1);
        let limit = date(2024, 1, 31);
        assert_eq!(
            classify_expiry(date(2023, 12, 31), as_of, limit),
            Some(ExpiryStatus::Expired)
        );
        assert_eq!(
            classify_expiry(date(2024, 1, 31), as_of, limit),
            Some(ExpiryStatus::ExpiringSoon)
        );
        assert_eq!(classify_expiry(date(2024, 2, 1), as_of, limit), None);
    }
}
