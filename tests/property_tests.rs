//! Property-based tests for SQL building and value-type detection
//!
//! These tests verify that:
//! - Generated statements carry exactly one placeholder per parameter
//! - Parameter order follows column order, then identifier order
//! - Type detection is total and deterministic

#[cfg(test)]
mod tests {
    use dbfacade::core::db::builder::{build_delete, build_insert, build_update};
    use dbfacade::core::db::value::detect_type;
    use dbfacade::{ColumnSet, Identifier, TypeHint, Value};
    use proptest::prelude::*;

    fn arb_column_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}".prop_map(|s: String| s)
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::Integer),
            "[a-zA-Z0-9 ?']{0,12}".prop_map(Value::Text),
            any::<bool>().prop_map(Value::Bool),
            Just(Value::Null),
            (-1.0e6f64..1.0e6).prop_map(Value::Real),
            prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Blob),
        ]
    }

    /// Column sets with distinct names, so length equals the generated count.
    fn arb_column_set(max: usize) -> impl Strategy<Value = ColumnSet> {
        prop::collection::btree_map(arb_column_name(), arb_value(), 1..=max)
            .prop_map(|pairs| pairs.into_iter().collect())
    }

    fn clause_placeholders(clause: &str) -> usize {
        clause.matches(" = ?").count()
    }

    proptest! {
        #[test]
        fn insert_has_one_placeholder_per_column(data in arb_column_set(12)) {
            let stmt = build_insert("t", &data).unwrap();

            prop_assert_eq!(stmt.params.len(), data.len());
            prop_assert_eq!(stmt.placeholder_count(), data.len());

            let columns: Vec<&str> = data.columns().collect();
            let expected_prefix = format!("INSERT INTO t ({}) VALUES (", columns.join(", "));
            prop_assert!(stmt.sql.starts_with(&expected_prefix));
            prop_assert_eq!(stmt.params, data.values().cloned().collect::<Vec<_>>());
        }

        #[test]
        fn update_params_are_values_then_identifier(
            data in arb_column_set(8),
            identifier in arb_column_set(4),
        ) {
            let stmt = build_update("t", &data, &identifier).unwrap();

            prop_assert_eq!(stmt.params.len(), data.len() + identifier.len());
            prop_assert_eq!(stmt.placeholder_count(), data.len() + identifier.len());

            let (_, where_clause) = stmt.sql.split_once(" WHERE ").unwrap();
            prop_assert_eq!(clause_placeholders(where_clause), identifier.len());
            prop_assert_eq!(where_clause.matches(" AND ").count(), identifier.len() - 1);

            let expected: Vec<Value> = data.values().chain(identifier.values()).cloned().collect();
            prop_assert_eq!(stmt.params, expected);
        }

        #[test]
        fn delete_ands_every_identifier_key(identifier in arb_column_set(6)) {
            let stmt = build_delete("t", &identifier).unwrap();

            prop_assert_eq!(stmt.params.len(), identifier.len());
            let (_, where_clause) = stmt.sql.split_once(" WHERE ").unwrap();
            for column in identifier.columns() {
                let predicate = format!("{} = ?", column);
                prop_assert!(where_clause.contains(&predicate));
            }
            prop_assert_eq!(where_clause.matches(" AND ").count(), identifier.len() - 1);
        }

        #[test]
        fn detection_is_total_and_deterministic(value in arb_value()) {
            let first = detect_type(&value);
            prop_assert_eq!(first, detect_type(&value));

            let expected = match value {
                Value::Text(_) => Some(TypeHint::Str),
                Value::Integer(_) => Some(TypeHint::Int),
                Value::Null => Some(TypeHint::Null),
                Value::Bool(_) => Some(TypeHint::Bool),
                _ => None,
            };
            prop_assert_eq!(first, expected);
        }
    }

    #[test]
    fn empty_identifier_is_rejected() {
        let data = ColumnSet::new().with("a", 1);
        assert!(build_update("t", &data, &Identifier::new()).is_err());
        assert!(build_delete("t", &Identifier::new()).is_err());
    }
}
