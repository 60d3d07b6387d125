//! Entity module - SeaORM entity definitions for the stockroom database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod catalog_meta;
pub mod item;
pub mod movement;

pub use catalog_meta::{
    Column as CatalogMetaColumn, Entity as CatalogMeta, Model as CatalogMetaModel,
};
pub use item::{Column as ItemColumn, Entity as Item, Model as ItemModel};
pub use movement::{
    Column as MovementColumn, Entity as Movement, Model as MovementModel, MovementKind,
};
