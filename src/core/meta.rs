//! Catalog metadata - settings stored in the catalog itself.
//!
//! The identity scheme is written on first open and checked on every later open,
//! so a catalog file created with sequence identities cannot later be driven with
//! external codes (or the other way round).

use crate::{
    core::catalog::IdentityScheme,
    entities::{CatalogMeta, catalog_meta},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::info;

const IDENTITY_SCHEME_KEY: &str = "identity_scheme";

/// Reads a metadata value by key.
pub async fn get_meta_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let row = CatalogMeta::find()
        .filter(catalog_meta::Column::Key.eq(key))
        .one(db)
        .await?;
    Ok(row.map(|r| r.value))
}

/// Inserts or replaces a metadata value.
pub async fn set_meta_value<C>(db: &C, key: &str, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    let existing = CatalogMeta::find()
        .filter(catalog_meta::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(row) = existing {
        let mut active: catalog_meta::ActiveModel = row.into();
        active.value = Set(value.to_string());
        active.updated_at = Set(now);
        active.update(db).await?;
    } else {
        let row = catalog_meta::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        row.insert(db).await?;
    }
    Ok(())
}

/// Records `scheme` for a new catalog, or checks it against the recorded one.
///
/// # Errors
/// `Config` if the catalog was created with a different identity scheme.
pub async fn ensure_identity_scheme(db: &DatabaseConnection, scheme: IdentityScheme) -> Result<()> {
    let txn = db.begin().await?;
    match get_meta_value(&txn, IDENTITY_SCHEME_KEY).await? {
        Some(stored) => {
            let stored: IdentityScheme = stored.parse()?;
            if stored != scheme {
                return Err(Error::Config {
                    message: format!(
                        "Catalog uses {stored} identities but settings request {scheme}"
                    ),
                });
            }
        }
        None => {
            set_meta_value(&txn, IDENTITY_SCHEME_KEY, scheme.as_str()).await?;
            info!(%scheme, "Recorded catalog identity scheme");
        }
    }
    txn.commit().await?;
    Ok(())
}
