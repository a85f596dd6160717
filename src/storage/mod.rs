pub mod catalog;
pub mod persistence;
pub mod query_cache;
pub mod table;

pub use catalog::{Catalog, CatalogEntry};
pub use persistence::{DEFAULT_METADATA_FILE, JsonStore};
pub use query_cache::QueryCache;
pub use table::{Table, TableInfo, UpdateOutcome};
