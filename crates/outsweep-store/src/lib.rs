pub mod catalog;
pub mod error;
pub mod memory;
pub mod repository;
pub mod sqlite;

pub use catalog::{CatalogSnapshot, ItemCatalog};
pub use error::StoreError;
pub use memory::CachedCatalog;
pub use repository::{CatalogSource, CooldownStore, OutboundRepository, SqliteRepository};
pub use sqlite::SqliteStore;
