use super::DataType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Table '{0}' already exists")]
    DuplicateName(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: String },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Invalid type '{type_name}' for column '{column}'. Allowed types: str, int, bool")]
    InvalidColumnType { column: String, type_name: String },

    #[error("Invalid column definition: {0}")]
    InvalidColumnFormat(String),

    #[error("Expected {expected} values, got {got}")]
    ColumnCountMismatch { expected: usize, got: usize },

    #[error("Type mismatch: column '{column}' expects {expected}, got {got}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        got: DataType,
    },

    #[error("Stored data is corrupt: {0}")]
    StoredDataTypeMismatch(String),

    #[error("Identifier column '{0}' cannot be modified")]
    IdentifierImmutable(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
