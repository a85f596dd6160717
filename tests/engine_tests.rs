use tabstore::{
    Catalog, Clause, DataType, DbError, IdentifierPolicy, Table, UpdateOutcome, Value,
};

fn users_table() -> Table {
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
fn test_identifier_synthesis() {
    let mut catalog = Catalog::new();
    let schema = catalog
        .create_table("t", &["name:str"], IdentifierPolicy::Legacy)
        .unwrap();

    let columns: Vec<(&str, DataType)> = schema
        .columns()
        .iter()
        .map(|(name, ty)| (name.as_str(), *ty))
        .collect();
    assert_eq!(
        columns,
        vec![("ID", DataType::Integer), ("name", DataType::Text)]
    );
}

#[test]
fn test_identifiers_contiguous_after_any_single_delete() {
    for count in 1..=6 {
        for victim in 1..=count {
            let mut table = users_table();
            for i in 0..count {
                table.insert(&[format!("user{}", i), i.to_string()]).unwrap();
            }

            let removed = table.delete(&Clause::new("ID", victim)).unwrap();
            assert_eq!(removed, 1);

            let expected: Vec<i64> = (1..count).collect();
            assert_eq!(ids(&table), expected, "count={count} victim={victim}");
        }
    }
}

#[test]
fn test_type_enforcement_keeps_row_count() {
    let mut table = users_table();
    table.insert(&["Alice", "30"]).unwrap();

    for bad in ["thirty", "3.5", "true", "1e3"] {
        let err = table.insert(&["Bob", bad]).unwrap_err();
        assert!(matches!(err, DbError::TypeMismatch { .. }), "token {bad}");
        assert_eq!(table.row_count(), 1);
    }
}

#[test]
fn test_negative_integers_are_integers() {
    let mut table = users_table();
    table.insert(&["Cold", "-5"]).unwrap();
    assert_eq!(table.rows()[0]["age"], Value::Integer(-5));
}

#[test]
fn test_filter_correctness() {
    let mut table = users_table();
    table.insert(&["Alice", "30"]).unwrap();
    table.insert(&["Bob", "25"]).unwrap();
    table.insert(&["Carol", "30"]).unwrap();

    let result = table.select(Some(&Clause::new("age", 30i64))).unwrap();
    assert_eq!(result.row_count(), 2);
    assert!(
        result
            .rows
            .iter()
            .all(|row| row["age"] == Value::Integer(30))
    );

    let missing = table.select(Some(&Clause::new("nickname", "Al"))).unwrap();
    assert!(missing.is_empty());
}

#[test]
fn test_update_then_delete_scenario() {
    let mut table = users_table();
    table.insert(&["Alice", "30"]).unwrap();
    table.insert(&["Bob", "25"]).unwrap();

    let outcome = table
        .update(&Clause::new("name", "Robert"), &Clause::new("ID", 2i64))
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Updated(1));

    table.delete(&Clause::new("name", "Alice")).unwrap();
    let rows = table.select(None).unwrap();
    assert_eq!(rows.row_count(), 1);
    assert_eq!(rows.rows[0]["ID"], Value::Integer(1));
    assert_eq!(rows.rows[0]["name"], Value::Text("Robert".into()));
}
