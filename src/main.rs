use chrono::Local;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::{fs::File, io::BufWriter, path::PathBuf, process::ExitCode};
use stockroom::{
    config::{database, stockroom::load_default_config},
    core::{
        catalog::{IdentityScheme, ItemKey},
        report::{format_movement_line, format_stock_line},
        stockroom::Stockroom,
        timestamp::MovementTime,
    },
    errors::{Error, Result},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(about = "Clinical stockroom inventory ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List current stock
    Items,
    /// Items at or below their minimum threshold
    LowStock,
    /// Expired and near-expiry items
    Expiring {
        /// Reference date, DD/MM/YYYY (default: today)
        date: Option<String>,
    },
    /// Items whose name contains the given text
    Search { text: String },
    /// Record a receipt
    Receive {
        /// Item number, or code in a code catalog
        item: String,
        quantity: u64,
        /// Movement date, DD/MM/YYYY [HH:MM[:SS]]
        date: String,
    },
    /// Record a withdrawal
    Withdraw {
        /// Item number, or code in a code catalog
        item: String,
        quantity: u64,
        /// Movement date, DD/MM/YYYY [HH:MM[:SS]]
        date: String,
    },
    /// Movements of one item, newest first
    History { item: String },
    /// Compare stock on hand with baseline plus ledger
    Reconcile { item: String },
    /// All movements, oldest first
    Report,
    /// Register items from a CSV file
    Import { path: PathBuf },
    /// Write the movement report as CSV
    ExportMovements { path: PathBuf },
    /// Write the current stock list as CSV
    ExportStock { path: PathBuf },
}

fn parse_key(scheme: IdentityScheme, raw: &str) -> Result<ItemKey> {
    let trimmed = raw.trim();
    match scheme {
        IdentityScheme::Code => Ok(ItemKey::Code(trimmed.to_string())),
        IdentityScheme::Sequence => trimmed
            .trim_start_matches('#')
            .parse::<i64>()
            .map(ItemKey::Id)
            .map_err(|_| Error::InvalidItem {
                message: format!("'{raw}' is not an item number"),
            }),
    }
}

fn to_quantity(quantity: u64) -> Result<i64> {
    i64::try_from(quantity).map_err(|_| Error::InvalidQuantity {
        value: quantity.to_string(),
    })
}

/// Exit status for a failed command: 2 for bad input, 1 for everything else.
fn exit_code_for(err: &Error) -> ExitCode {
    if err.is_validation() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    let cli = Cli::parse();
    match start(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            exit_code_for(&e)
        }
    }
}

async fn start(command: Commands) -> Result<()> {
    // 3. Load settings and open the catalog
    let config = load_default_config()?;
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to open database: {}", e))?;
    database::create_tables(&db).await?;
    let stockroom = Stockroom::open(db, &config).await?;
    info!(scheme = %stockroom.scheme(), "Catalog ready");

    run(&stockroom, command).await
}

async fn run(stockroom: &Stockroom, command: Commands) -> Result<()> {
    let scheme = stockroom.scheme();
    match command {
        Commands::Items => {
            for item in stockroom.items().await? {
                println!("{}", format_stock_line(&item));
            }
        }
        Commands::LowStock => {
            for item in stockroom.low_stock().await? {
                println!("{}", format_stock_line(&item));
            }
        }
        Commands::Expiring { date } => {
            let as_of = match date {
                Some(text) => MovementTime::parse_entry(&text)?.date(),
                None => Local::now().date_naive(),
            };
            for alert in stockroom.expiring_soon(as_of).await? {
                println!(
                    "{} | {} | expires {} ({} days) | {:?}",
                    alert.item.display_identity(),
                    alert.item.name,
                    alert.expiry,
                    alert.days_remaining,
                    alert.status
                );
            }
        }
        Commands::Search { text } => {
            for item in stockroom.search(&text).await? {
                println!("{}", format_stock_line(&item));
            }
        }
        Commands::Receive {
            item,
            quantity,
            date,
        } => {
            let key = parse_key(scheme, &item)?;
            let on_hand = stockroom
                .receive(&key, to_quantity(quantity)?, &date)
                .await?;
            println!("{key}: {on_hand} on hand");
        }
        Commands::Withdraw {
            item,
            quantity,
            date,
        } => {
            let key = parse_key(scheme, &item)?;
            let on_hand = stockroom
                .withdraw(&key, to_quantity(quantity)?, &date)
                .await?;
            println!("{key}: {on_hand} on hand");
        }
        Commands::History { item } => {
            let key = parse_key(scheme, &item)?;
            for entry in stockroom.history(&key).await? {
                println!(
                    "{} | {} | {} | {}",
                    entry.id, entry.timestamp, entry.kind, entry.quantity
                );
            }
        }
        Commands::Reconcile { item } => {
            let key = parse_key(scheme, &item)?;
            let r = stockroom.reconcile(&key).await?;
            println!(
                "{key}: on hand {}, baseline {}, ledger net {:+}, drift {:+}",
                r.on_hand,
                r.baseline,
                r.ledger_net,
                r.drift()
            );
        }
        Commands::Report => {
            for row in stockroom.movement_report().await? {
                println!("{}", format_movement_line(&row));
            }
        }
        Commands::Import { path } => {
            let report = stockroom.import_csv(File::open(&path)?).await?;
            println!(
                "Registered {} of {} rows",
                report.registered.len(),
                report.total_rows()
            );
            for failure in &report.failures {
                println!("  row {}: {}", failure.row, failure.error);
            }
        }
        Commands::ExportMovements { path } => {
            let count = stockroom
                .export_movements(BufWriter::new(File::create(&path)?))
                .await?;
            println!("Wrote {count} movements to {}", path.display());
        }
        Commands::ExportStock { path } => {
            let count = stockroom
                .export_stock(BufWriter::new(File::create(&path)?))
                .await?;
            println!("Wrote {count} items to {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_cli_parses_movement_commands() {
        let cli = Cli::try_parse_from(["stockroom", "receive", "GLV-M", "5", "01/01/2024"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Receive { ref item, quantity: 5, ref date }
                if item == "GLV-M" && date == "01/01/2024"
        ));

        let cli = Cli::try_parse_from(["stockroom", "expiring"]).unwrap();
        assert!(matches!(cli.command, Commands::Expiring { date: None }));

        let cli = Cli::try_parse_from(["stockroom", "export-stock", "stock.csv"]).unwrap();
        assert!(matches!(cli.command, Commands::ExportStock { .. }));
    }

    #[test]
    fn test_cli_rejects_malformed_arguments() {
        assert!(Cli::try_parse_from(["stockroom", "items", "extra"]).is_err());
        assert!(Cli::try_parse_from(["stockroom", "withdraw", "3", "lots", "01/01/2024"]).is_err());
        assert!(Cli::try_parse_from(["stockroom", "withdraw", "3", "-2", "01/01/2024"]).is_err());
        assert!(Cli::try_parse_from(["stockroom", "receive", "3", "5"]).is_err());
        assert!(Cli::try_parse_from(["stockroom"]).is_err());
    }

    #[test]
    fn test_parse_key_by_scheme() {
        assert_eq!(
            parse_key(IdentityScheme::Sequence, "#12").unwrap(),
            ItemKey::Id(12)
        );
        assert_eq!(
            parse_key(IdentityScheme::Code, " ALG-1 ").unwrap(),
            ItemKey::Code("ALG-1".to_string())
        );

        let err = parse_key(IdentityScheme::Sequence, "abc").unwrap_err();
        assert!(matches!(err, Error::InvalidItem { .. }));
        assert_eq!(exit_code_for(&err), ExitCode::from(2));
    }

    #[test]
    fn test_quantity_out_of_range() {
        assert_eq!(to_quantity(7).unwrap(), 7);
        let err = to_quantity(u64::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidQuantity { .. }));
        assert_eq!(
            exit_code_for(&Error::ItemNotFound {
                key: "#1".to_string()
            }),
            ExitCode::FAILURE
        );
    }
}
