/// Database configuration and connection management
pub mod database;

/// Stockroom settings and seed items loaded from stockroom.toml
pub mod stockroom;
