pub mod catalog;
pub mod memory;
pub mod postgres;

pub use catalog::{CatalogStore, CatalogTx};
pub use memory::{MemoryStore, MemoryTx};
pub use postgres::{PgCatalogStore, PgCatalogTx};
