use super::{DataType, DbError, Result, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered column name -> value mapping.
pub type Row = IndexMap<String, Value>;

/// Name the identifier column gets when it is synthesized or normalized.
pub const ID_COLUMN: &str = "ID";

/// Single-column equality condition, also used as the `set` pair of an update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clause {
    pub column: String,
    pub value: Value,
}

impl Clause {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Build a clause from a raw token, coercing it to a typed value.
    pub fn from_token(column: impl Into<String>, token: &str) -> Self {
        Self {
            column: column.into(),
            value: Value::coerce(token),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

/// How column names are normalized when a table is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierPolicy {
    /// Every column whose name contains "id" (any case) is upper-cased,
    /// so `guid` is stored as `GUID`.
    #[default]
    Legacy,
    /// Only the identifier column itself is normalized to `ID`.
    Strict,
}

impl IdentifierPolicy {
    pub fn normalize(&self, name: &str) -> String {
        let is_identifier = is_identifier_name(name);
        let upper = match self {
            Self::Legacy => name.to_ascii_lowercase().contains("id"),
            Self::Strict => is_identifier,
        };
        if upper {
            name.to_ascii_uppercase()
        } else {
            name.to_string()
        }
    }
}

impl std::str::FromStr for IdentifierPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown identifier policy '{}'", other)),
        }
    }
}

pub fn is_identifier_name(name: &str) -> bool {
    name.eq_ignore_ascii_case("id")
}

/// Column layout of a table plus its designated identifier column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTableSchema")]
pub struct TableSchema {
    columns: IndexMap<String, DataType>,
    id_column: String,
}

#[derive(Deserialize)]
struct RawTableSchema {
    columns: IndexMap<String, DataType>,
    #[serde(default)]
    id_column: Option<String>,
}

impl TryFrom<RawTableSchema> for TableSchema {
    type Error = String;

    fn try_from(raw: RawTableSchema) -> std::result::Result<Self, Self::Error> {
        // Files written before the identifier was stored explicitly.
        let id_column = match raw.id_column {
            Some(name) => name,
            None => raw
                .columns
                .keys()
                .find(|name| is_identifier_name(name))
                .cloned()
                .ok_or_else(|| "table has no identifier column".to_string())?,
        };
        match raw.columns.get(&id_column) {
            Some(DataType::Integer) => Ok(Self {
                columns: raw.columns,
                id_column,
            }),
            Some(other) => Err(format!(
                "identifier column '{}' has type {}, expected int",
                id_column, other
            )),
            None => Err(format!("identifier column '{}' is not declared", id_column)),
        }
    }
}

impl TableSchema {
    pub(crate) fn new(columns: IndexMap<String, DataType>, id_column: String) -> Self {
        Self { columns, id_column }
    }

    pub fn columns(&self) -> &IndexMap<String, DataType> {
        &self.columns
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn column_type(&self, name: &str) -> Option<DataType> {
        self.columns.get(name).copied()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Columns filled positionally by insert, in declaration order.
    pub fn value_columns(&self) -> impl Iterator<Item = (&String, &DataType)> {
        self.columns
            .iter()
            .filter(move |(name, _)| **name != self.id_column)
    }

    pub fn value_column_count(&self) -> usize {
        self.columns.len() - 1
    }

    /// Check a value supplied by a caller against the declared column type.
    pub fn validate(&self, column: &str, value: &Value) -> Result<()> {
        let Some(expected) = self.column_type(column) else {
            return Ok(());
        };
        if !expected.accepts(value) {
            return Err(DbError::TypeMismatch {
                column: column.to_string(),
                expected,
                got: value.data_type(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_policy_uppercases_substring() {
        let policy = IdentifierPolicy::Legacy;
        assert_eq!(policy.normalize("id"), "ID");
        assert_eq!(policy.normalize("guid"), "GUID");
        assert_eq!(policy.normalize("Kid"), "KID");
        assert_eq!(policy.normalize("name"), "name");
    }

    #[test]
    fn test_strict_policy_only_touches_identifier() {
        let policy = IdentifierPolicy::Strict;
        assert_eq!(policy.normalize("Id"), "ID");
        assert_eq!(policy.normalize("guid"), "guid");
    }

    #[test]
    fn test_schema_without_stored_identifier_is_inferred() {
        let schema: TableSchema =
            serde_json::from_str(r#"{"columns": {"ID": "int", "name": "str"}}"#).unwrap();
        assert_eq!(schema.id_column(), "ID");
        assert_eq!(schema.value_column_count(), 1);
    }

    #[test]
    fn test_schema_rejects_text_identifier() {
        let result: serde_json::Result<TableSchema> =
            serde_json::from_str(r#"{"columns": {"ID": "str"}, "id_column": "ID"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_kinds() {
        let schema: TableSchema =
            serde_json::from_str(r#"{"columns": {"ID": "int", "age": "int"}}"#).unwrap();
        let err = schema.validate("age", &Value::coerce("old")).unwrap_err();
        assert!(matches!(
            err,
            DbError::TypeMismatch {
                expected: DataType::Integer,
                got: DataType::Text,
                ..
            }
        ));
    }
}
