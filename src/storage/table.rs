use crate::core::{Clause, DataType, DbError, Result, Row, TableSchema, Value};
use crate::result::QueryResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an update that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(usize),
    NoMatch,
}

impl UpdateOutcome {
    pub fn affected(&self) -> usize {
        match self {
            Self::Updated(n) => *n,
            Self::NoMatch => 0,
        }
    }
}

/// Read-only description of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<(String, DataType)>,
    pub row_count: usize,
}

impl fmt::Display for TableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|(name, ty)| format!("{}:{}", name, ty))
            .collect();
        writeln!(f, "Table: {}", self.name)?;
        writeln!(f, "Columns: {}", columns.join(", "))?;
        write!(f, "Rows: {}", self.row_count)
    }
}

/// One table's schema and rows.
///
/// Identifiers are positional: the row at index `i` always has identifier
/// `i + 1`. Every mutating operation validates its input completely before
/// touching `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    #[serde(flatten)]
    schema: TableSchema,
    #[serde(default)]
    data: Vec<Row>,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            data: Vec::new(),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.data
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Append a row built from raw tokens, one per non-identifier column.
    /// Returns the identifier assigned to the new row.
    pub fn insert<S: AsRef<str>>(&mut self, values: &[S]) -> Result<i64> {
        let expected = self.schema.value_column_count();
        if values.len() != expected {
            return Err(DbError::ColumnCountMismatch {
                expected,
                got: values.len(),
            });
        }

        let mut typed = Vec::with_capacity(values.len());
        for ((column, _), raw) in self.schema.value_columns().zip(values) {
            let value = Value::coerce(raw.as_ref());
            self.schema.validate(column, &value)?;
            typed.push(value);
        }

        let id = self.next_id();
        let mut typed = typed.into_iter();
        let mut row = Row::with_capacity(self.schema.columns().len());
        for column in self.schema.columns().keys() {
            let value = if *column == self.schema.id_column() {
                Value::Integer(id)
            } else {
                match typed.next() {
                    Some(value) => value,
                    None => break,
                }
            };
            row.insert(column.clone(), value);
        }

        self.data.push(row);
        Ok(id)
    }

    /// Rows matching `filter`, or all rows when no filter is given.
    ///
    /// A filter on an unknown column matches nothing.
    pub fn select(&self, filter: Option<&Clause>) -> Result<QueryResult> {
        let columns = self.schema.column_names();
        let rows = match filter {
            None => self.data.clone(),
            Some(filter) => {
                let mask = self.match_mask(filter)?;
                self.data
                    .iter()
                    .zip(mask)
                    .filter(|(_, hit)| *hit)
                    .map(|(row, _)| row.clone())
                    .collect()
            }
        };
        Ok(QueryResult::new(columns, rows))
    }

    /// Set `set.column` to `set.value` on every row matching `filter`.
    pub fn update(&mut self, set: &Clause, filter: &Clause) -> Result<UpdateOutcome> {
        if self.schema.column_type(&set.column).is_none() {
            return Err(DbError::ColumnNotFound(set.column.clone()));
        }
        if set.column == self.schema.id_column() {
            return Err(DbError::IdentifierImmutable(set.column.clone()));
        }
        self.schema.validate(&set.column, &set.value)?;

        let mask = self.match_mask(filter)?;
        let mut changed = 0;
        for (row, hit) in self.data.iter_mut().zip(mask) {
            if hit {
                row.insert(set.column.clone(), set.value.clone());
                changed += 1;
            }
        }

        if changed == 0 {
            Ok(UpdateOutcome::NoMatch)
        } else {
            Ok(UpdateOutcome::Updated(changed))
        }
    }

    /// Remove every row matching `filter` and renumber the survivors.
    /// Returns the number of removed rows.
    pub fn delete(&mut self, filter: &Clause) -> Result<usize> {
        let mask = self.match_mask(filter)?;
        let before = self.data.len();

        let mut hits = mask.into_iter();
        self.data.retain(|_| !hits.next().unwrap_or(false));

        let removed = before - self.data.len();
        if removed > 0 {
            self.renumber();
        }
        Ok(removed)
    }

    pub fn info(&self, name: &str) -> TableInfo {
        TableInfo {
            name: name.to_string(),
            columns: self
                .schema
                .columns()
                .iter()
                .map(|(col, ty)| (col.clone(), *ty))
                .collect(),
            row_count: self.data.len(),
        }
    }

    /// Check rows read back from storage against the schema.
    pub fn validate(&self) -> Result<()> {
        for (pos, row) in self.data.iter().enumerate() {
            let expected_id = pos as i64 + 1;
            match row.get(self.schema.id_column()) {
                Some(Value::Integer(id)) if *id == expected_id => {}
                other => {
                    return Err(DbError::StoredDataTypeMismatch(format!(
                        "row {} has identifier {:?}, expected {}",
                        pos + 1,
                        other,
                        expected_id
                    )));
                }
            }
            for column in self.schema.columns().keys() {
                let Some(value) = row.get(column) else {
                    return Err(DbError::StoredDataTypeMismatch(format!(
                        "row {} has no value for column '{}'",
                        expected_id, column
                    )));
                };
                self.check_stored(row, column, value)?;
            }
            if let Some(extra) = row.keys().find(|k| self.schema.column_type(k).is_none()) {
                return Err(DbError::StoredDataTypeMismatch(format!(
                    "row {} has undeclared column '{}'",
                    expected_id, extra
                )));
            }
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        self.data.len() as i64 + 1
    }

    fn renumber(&mut self) {
        let id_column = self.schema.id_column().to_string();
        for (pos, row) in self.data.iter_mut().enumerate() {
            row.insert(id_column.clone(), Value::Integer(pos as i64 + 1));
        }
    }

    /// Evaluate `filter` against every row, before any mutation happens.
    fn match_mask(&self, filter: &Clause) -> Result<Vec<bool>> {
        if self.schema.column_type(&filter.column).is_none() {
            return Ok(vec![false; self.data.len()]);
        }
        self.schema.validate(&filter.column, &filter.value)?;

        self.data
            .iter()
            .map(|row| match row.get(&filter.column) {
                Some(value) => {
                    self.check_stored(row, &filter.column, value)?;
                    Ok(*value == filter.value)
                }
                None => Ok(false),
            })
            .collect()
    }

    fn check_stored(&self, row: &Row, column: &str, value: &Value) -> Result<()> {
        match self.schema.column_type(column) {
            Some(expected) if !expected.accepts(value) => {
                let id = row
                    .get(self.schema.id_column())
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "?".to_string());
                Err(DbError::StoredDataTypeMismatch(format!(
                    "column '{}' of row {} holds {} but is declared {}",
                    column,
                    id,
                    value.data_type(),
                    expected
                )))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IdentifierPolicy;
    use crate::storage::Catalog;

    fn users() -> Table {
        let mut catalog = Catalog::new();
        let schema = catalog
            .create_table("users", &["name:str", "age:int"], IdentifierPolicy::Legacy)
            .unwrap()
            .clone();
        Table::new(schema)
    }

    fn ids(table: &Table) -> Vec<i64> {
        table
            .rows()
            .iter()
            .map(|row| row["ID"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut table = users();
        assert_eq!(table.insert(&["Alice", "30"]).unwrap(), 1);
        assert_eq!(table.insert(&["Bob", "25"]).unwrap(), 2);

        let row = &table.rows()[0];
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["ID", "name", "age"]);
        assert_eq!(row["name"], Value::Text("Alice".into()));
        assert_eq!(row["age"], Value::Integer(30));
    }

    #[test]
    fn test_insert_column_count_mismatch() {
        let mut table = users();
        let err = table.insert(&["Alice"]).unwrap_err();
        assert!(matches!(
            err,
            DbError::ColumnCountMismatch { expected: 2, got: 1 }
        ));
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_insert_type_mismatch_leaves_table_unchanged() {
        let mut table = users();
        table.insert(&["Alice", "30"]).unwrap();

        let err = table.insert(&["Bob", "old"]).unwrap_err();
        match err {
            DbError::TypeMismatch {
                column,
                expected,
                got,
            } => {
                assert_eq!(column, "age");
                assert_eq!(expected, DataType::Integer);
                assert_eq!(got, DataType::Text);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_numeric_text_cannot_go_into_str_column() {
        let mut table = users();
        assert!(matches!(
            table.insert(&["42", "30"]),
            Err(DbError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_select_filters_by_strict_equality() {
        let mut table = users();
        table.insert(&["Alice", "30"]).unwrap();
        table.insert(&["Bob", "25"]).unwrap();
        table.insert(&["Carol", "30"]).unwrap();

        let all = table.select(None).unwrap();
        assert_eq!(all.row_count(), 3);
        assert_eq!(all.columns, vec!["ID", "name", "age"]);

        let thirty = table.select(Some(&Clause::new("age", 30i64))).unwrap();
        let names: Vec<_> = thirty.rows.iter().map(|r| r["name"].to_string()).collect();
        assert_eq!(names, vec!["Alice", "Carol"]);
    }

    #[test]
    fn test_select_unknown_column_is_empty() {
        let mut table = users();
        table.insert(&["Alice", "30"]).unwrap();
        let result = table.select(Some(&Clause::new("email", "x"))).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_select_mistyped_filter_fails() {
        let mut table = users();
        table.insert(&["Alice", "30"]).unwrap();
        assert!(matches!(
            table.select(Some(&Clause::new("age", "thirty"))),
            Err(DbError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_update_all_matches() {
        let mut table = users();
        table.insert(&["Alice", "30"]).unwrap();
        table.insert(&["Bob", "25"]).unwrap();
        table.insert(&["Carol", "30"]).unwrap();

        let outcome = table
            .update(&Clause::new("age", 31i64), &Clause::new("age", 30i64))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated(2));
        assert_eq!(table.rows()[2]["age"], Value::Integer(31));
        assert_eq!(table.rows()[1]["age"], Value::Integer(25));
    }

    #[test]
    fn test_update_no_match_is_distinct_outcome() {
        let mut table = users();
        table.insert(&["Alice", "30"]).unwrap();
        let outcome = table
            .update(&Clause::new("age", 40i64), &Clause::new("name", "Zed"))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NoMatch);
        assert_eq!(outcome.affected(), 0);
    }

    #[test]
    fn test_update_rejects_bad_assignments() {
        let mut table = users();
        table.insert(&["Alice", "30"]).unwrap();
        let before = table.clone();

        let filter = Clause::new("name", "Alice");
        assert!(matches!(
            table.update(&Clause::new("age", "old"), &filter),
            Err(DbError::TypeMismatch { .. })
        ));
        assert!(matches!(
            table.update(&Clause::new("email", "a@b"), &filter),
            Err(DbError::ColumnNotFound(_))
        ));
        assert!(matches!(
            table.update(&Clause::new("ID", 5i64), &filter),
            Err(DbError::IdentifierImmutable(_))
        ));
        assert_eq!(table, before);
    }

    #[test]
    fn test_delete_renumbers_identifiers() {
        let mut table = users();
        for (name, age) in [("A", "1"), ("B", "2"), ("C", "3"), ("D", "4")] {
            table.insert(&[name, age]).unwrap();
        }

        assert_eq!(table.delete(&Clause::new("ID", 2i64)).unwrap(), 1);
        assert_eq!(ids(&table), vec![1, 2, 3]);
        assert_eq!(table.rows()[1]["name"], Value::Text("C".into()));

        // next insert continues from the new count
        assert_eq!(table.insert(&["E", "5"]).unwrap(), 4);
    }

    #[test]
    fn test_delete_multiple_and_none() {
        let mut table = users();
        table.insert(&["A", "30"]).unwrap();
        table.insert(&["B", "25"]).unwrap();
        table.insert(&["C", "30"]).unwrap();

        assert_eq!(table.delete(&Clause::new("name", "Nobody")).unwrap(), 0);
        assert_eq!(table.row_count(), 3);

        assert_eq!(table.delete(&Clause::new("age", 30i64)).unwrap(), 2);
        assert_eq!(ids(&table), vec![1]);
        assert_eq!(table.rows()[0]["name"], Value::Text("B".into()));
    }

    #[test]
    fn test_info_describes_table() {
        let mut table = users();
        table.insert(&["Alice", "30"]).unwrap();
        let info = table.info("users");
        assert_eq!(info.row_count, 1);
        assert_eq!(
            info.to_string(),
            "Table: users\nColumns: ID:int, name:str, age:int\nRows: 1"
        );
    }

    #[test]
    fn test_drifted_stored_value_is_rejected() {
        let json = r#"{
            "columns": {"ID": "int", "age": "int"},
            "data": [{"ID": 1, "age": "thirty"}]
        }"#;
        let mut table: Table = serde_json::from_str(json).unwrap();
        assert!(matches!(
            table.validate(),
            Err(DbError::StoredDataTypeMismatch(_))
        ));
        assert!(matches!(
            table.delete(&Clause::new("age", 30i64)),
            Err(DbError::StoredDataTypeMismatch(_))
        ));
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_gapped_identifiers_are_rejected() {
        let json = r#"{
            "columns": {"ID": "int", "age": "int"},
            "data": [{"ID": 1, "age": 3}, {"ID": 3, "age": 4}]
        }"#;
        let table: Table = serde_json::from_str(json).unwrap();
        assert!(table.validate().is_err());
    }
}
