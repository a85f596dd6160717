pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result};
pub use types::{Clause, ID_COLUMN, IdentifierPolicy, Row, TableSchema, is_identifier_name};
pub use value::{DataType, Value};
