// ============================================================================
// tabstore Library
// ============================================================================

pub mod config;
pub mod core;
pub mod facade;
pub mod result;
pub mod storage;

// Re-export main types for convenience
pub use config::Config;
pub use core::{Clause, DataType, DbError, IdentifierPolicy, Result, Value};
pub use facade::Database;
pub use result::QueryResult;
pub use storage::{Catalog, QueryCache, Table, TableInfo, UpdateOutcome};
