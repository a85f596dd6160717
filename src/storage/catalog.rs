use crate::core::{
    DataType, DbError, ID_COLUMN, IdentifierPolicy, Result, TableSchema, is_identifier_name,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Catalog entry: the table layout plus the row count at the last save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub schema: TableSchema,
    #[serde(default)]
    pub rows: usize,
}

/// Cross-table metadata: table name -> definition, in creation order.
///
/// Loaded fresh for every command, mutated in place and handed back to the
/// store for saving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    tables: IndexMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, empty table.
    ///
    /// Each column definition is `name:type`. An identifier column is synthesized in first
    /// position unless one of them is named `id` (any case). The catalog
    /// is left untouched when any definition is rejected.
    pub fn create_table<S: AsRef<str>>(
        &mut self,
        name: &str,
        column_specs: &[S],
        policy: IdentifierPolicy,
    ) -> Result<&TableSchema> {
        check_table_name(name)?;
        if self.tables.contains_key(name) {
            return Err(DbError::DuplicateName(name.to_string()));
        }

        let parsed = column_specs
            .iter()
            .map(|spec| parse_column_spec(spec.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut columns = IndexMap::new();
        let id_supplied = parsed.iter().any(|(col, _)| is_identifier_name(col));
        if !id_supplied {
            columns.insert(ID_COLUMN.to_string(), DataType::Integer);
        }

        for (col, data_type) in parsed {
            if is_identifier_name(col) && data_type != DataType::Integer {
                return Err(DbError::InvalidColumnFormat(format!(
                    "identifier column '{}' must be int, got {}",
                    col, data_type
                )));
            }
            let normalized = policy.normalize(col);
            if columns.contains_key(&normalized) {
                return Err(DbError::InvalidColumnFormat(format!(
                    "duplicate column '{}'",
                    normalized
                )));
            }
            columns.insert(normalized, data_type);
        }

        let schema = TableSchema::new(columns, ID_COLUMN.to_string());
        let entry = self
            .tables
            .entry(name.to_string())
            .or_insert(CatalogEntry { schema, rows: 0 });
        Ok(&entry.schema)
    }

    pub fn drop_table(&mut self, name: &str) -> Result<CatalogEntry> {
        self.tables
            .shift_remove(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }

    pub fn get_table(&self, name: &str) -> Result<&CatalogEntry> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn set_row_count(&mut self, name: &str, rows: usize) -> Result<()> {
        let entry = self
            .tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))?;
        entry.rows = rows;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Table names become file names, so they must stay a single path component.
fn check_table_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        "name cannot be empty"
    } else if name.contains(['/', '\\']) {
        "name must not contain a path separator"
    } else if name == "." || name == ".." {
        "name must not be a relative path"
    } else {
        return Ok(());
    };
    Err(DbError::InvalidTableName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

fn parse_column_spec(spec: &str) -> Result<(&str, DataType)> {
    let Some((name, type_name)) = spec.split_once(':') else {
        return Err(DbError::InvalidColumnFormat(format!(
            "'{}', expected <name>:<type>",
            spec
        )));
    };
    let name = name.trim();
    let type_name = type_name.trim();
    if name.is_empty() || type_name.contains(':') {
        return Err(DbError::InvalidColumnFormat(format!(
            "'{}', expected <name>:<type>",
            spec
        )));
    }
    let data_type = DataType::from_name(type_name).ok_or_else(|| DbError::InvalidColumnType {
        column: name.to_string(),
        type_name: type_name.to_string(),
    })?;
    Ok((name, data_type))
}
