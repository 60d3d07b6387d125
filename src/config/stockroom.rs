//! Stockroom settings loading from stockroom.toml
//!
//! The settings file chooses the catalog identity scheme, the near-expiry horizon and
//! optional seed items registered on start-up. A missing file is not an error: the
//! defaults describe a sequence-identity catalog with a 30-day horizon and no seeds.

use crate::core::catalog::IdentityScheme;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default near-expiry horizon, in days.
pub const DEFAULT_EXPIRY_HORIZON_DAYS: u32 = 30;

/// Default settings file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "stockroom.toml";

/// Configuration structure representing the entire stockroom.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Catalog-wide settings
    #[serde(default)]
    pub catalog: CatalogSettings,
    /// Alerting settings
    #[serde(default)]
    pub alerts: AlertSettings,
    /// Items to register on start-up when missing
    #[serde(default)]
    pub items: Vec<ItemSeed>,
}

/// Catalog-wide settings
#[derive(Debug, Default, Deserialize, Clone, Copy)]
pub struct CatalogSettings {
    /// How items are identified in this catalog
    #[serde(default)]
    pub identity: IdentityScheme,
}

/// Alerting settings
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct AlertSettings {
    /// Days ahead of the reference date within which an expiry is flagged
    #[serde(default = "default_expiry_horizon_days")]
    pub expiry_horizon_days: u32,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            expiry_horizon_days: DEFAULT_EXPIRY_HORIZON_DAYS,
        }
    }
}

const fn default_expiry_horizon_days() -> u32 {
    DEFAULT_EXPIRY_HORIZON_DAYS
}

/// Configuration for a single seed item
#[derive(Debug, Deserialize, Clone)]
pub struct ItemSeed {
    /// External code, required when the catalog uses code identities
    pub code: Option<String>,
    /// Display name
    pub name: String,
    /// Initial quantity on hand
    #[serde(default)]
    pub quantity: i64,
    /// Low-stock threshold
    #[serde(default)]
    pub minimum_threshold: i64,
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
    /// Expiry date, `YYYY-MM-DD` or `DD/MM/YYYY`
    pub expiry: Option<String>,
}

/// Loads stockroom settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type or an unknown identity scheme
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse stockroom.toml: {e}"),
    })
}

/// Loads settings from `STOCKROOM_CONFIG`, or ./stockroom.toml, falling back to
/// defaults when the file does not exist.
pub fn load_default_config() -> Result<Config> {
    let path =
        std::env::var("STOCKROOM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        info!("No settings file at {}, using defaults.", path);
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [catalog]
            identity = "code"

            [alerts]
            expiry_horizon_days = 45

            [[items]]
            code = "GLV-M"
            name = "Nitrile gloves (M)"
            quantity = 100
            minimum_threshold = 20
            unit = "box"

            [[items]]
            code = "ANS-01"
            name = "Lidocaine cartridges"
            quantity = 50
            minimum_threshold = 10
            expiry = "2025-06-30"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.catalog.identity, IdentityScheme::Code);
        assert_eq!(config.alerts.expiry_horizon_days, 45);
        assert_eq!(config.items.len(), 2);
        assert_eq!(config.items[0].code.as_deref(), Some("GLV-M"));
        assert_eq!(config.items[0].unit.as_deref(), Some("box"));
        assert_eq!(config.items[1].expiry.as_deref(), Some("2025-06-30"));
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.catalog.identity, IdentityScheme::Sequence);
        assert_eq!(
            config.alerts.expiry_horizon_days,
            DEFAULT_EXPIRY_HORIZON_DAYS
        );
        assert!(config.items.is_empty());
    }

    #[test]
    fn test_seed_item_defaults() {
        let config = parse_config(
            r#"
            [[items]]
            name = "Gauze"
        "#,
        )
        .unwrap();
        assert_eq!(config.items[0].quantity, 0);
        assert_eq!(config.items[0].minimum_threshold, 0);
        assert!(config.items[0].code.is_none());
    }

    #[test]
    fn test_rejects_unknown_identity_scheme() {
        let result = parse_config(
            r#"
            [catalog]
            identity = "uuid"
        "#,
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_negative_horizon() {
        let result = parse_config(
            r#"
            [alerts]
            expiry_horizon_days = -1
        "#,
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/definitely/not/here/stockroom.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
