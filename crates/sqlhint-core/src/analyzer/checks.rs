//! Per-value checks: type compatibility and index advice

use crate::parser::{Clause, ValueReference};
use crate::schema::Column;
use crate::types::{parses_as_datetime, ColumnType, ValueType};

/// Whether `value` cannot be stored in (or compared with) `column`.
///
/// Values of unknown type are never reported.
pub fn is_invalid_assignment(column: &Column, value: &ValueReference) -> bool {
    let Some(value_type) = value.value_type else {
        return false;
    };

    if value_type == ValueType::Null && column.optional {
        return false;
    }

    match (column.declared_type, value_type) {
        (ColumnType::Date, ValueType::Date) => false,
        (ColumnType::Date, ValueType::String) => !value
            .text
            .as_deref()
            .is_some_and(parses_as_datetime),
        (declared, inferred) => !inferred.matches(declared),
    }
}

/// Whether filtering on `column` by `value` would scan without an index
pub fn is_missing_index(column: &Column, value: &ValueReference) -> bool {
    value.clause == Clause::Where && !column.has_index && !column.is_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Span;

    fn value(value_type: Option<ValueType>, text: Option<&str>, clause: Clause) -> ValueReference {
        ValueReference {
            value_type,
            text: text.map(str::to_string),
            clause,
            column: None,
            span: Span::new(0, 1),
        }
    }

    fn typed(value_type: ValueType) -> ValueReference {
        value(Some(value_type), None, Clause::Where)
    }

    #[test]
    fn test_type_matrix() {
        let columns = [
            (Column::new("s", "varchar(10)"), ValueType::String),
            (Column::new("n", "int"), ValueType::Number),
            (Column::new("b", "boolean"), ValueType::Boolean),
        ];
        let inferred = [ValueType::String, ValueType::Number, ValueType::Boolean];

        for (column, matching) in &columns {
            for value_type in inferred {
                assert_eq!(
                    is_invalid_assignment(column, &typed(value_type)),
                    value_type != *matching,
                    "{value_type} into {}",
                    column.declared_type
                );
            }
        }
    }

    #[test]
    fn test_numeric_string_is_not_a_number() {
        let column = Column::new("n", "int");
        assert!(is_invalid_assignment(
            &column,
            &value(Some(ValueType::String), Some("42"), Clause::Where)
        ));
    }

    #[test]
    fn test_null_needs_optional_column() {
        let optional = Column::new("n", "int");
        let required = Column::new("n", "int").not_null();
        assert!(!is_invalid_assignment(&optional, &typed(ValueType::Null)));
        assert!(is_invalid_assignment(&required, &typed(ValueType::Null)));
    }

    #[test]
    fn test_date_column() {
        let column = Column::new("created_at", "datetime");
        let string = |text| value(Some(ValueType::String), Some(text), Clause::Values { row: 0 });

        assert!(!is_invalid_assignment(&column, &typed(ValueType::Date)));
        assert!(!is_invalid_assignment(&column, &string("2020-04-06T14:28:25.774Z")));
        assert!(!is_invalid_assignment(&column, &string("2020-04-06")));
        assert!(is_invalid_assignment(&column, &string("some-string")));
        assert!(is_invalid_assignment(&column, &typed(ValueType::Number)));
        assert!(is_invalid_assignment(&column, &typed(ValueType::Boolean)));
    }

    #[test]
    fn test_date_value_into_string_column() {
        let column = Column::new("label", "text");
        assert!(is_invalid_assignment(&column, &typed(ValueType::Date)));
    }

    #[test]
    fn test_unknown_value_type_is_valid() {
        let column = Column::new("n", "int").not_null();
        assert!(!is_invalid_assignment(&column, &value(None, None, Clause::Values { row: 0 })));
    }

    #[test]
    fn test_missing_index_only_in_where() {
        let column = Column::new("name", "varchar(100)");
        assert!(is_missing_index(&column, &typed(ValueType::String)));
        assert!(!is_missing_index(&column, &value(Some(ValueType::String), None, Clause::Set)));
        assert!(!is_missing_index(&column, &value(Some(ValueType::String), None, Clause::Join)));
    }

    #[test]
    fn test_indexed_and_json_columns_need_no_index() {
        let indexed = Column::new("id", "int").indexed();
        let json = Column::new("payload", "json");
        assert!(!is_missing_index(&indexed, &typed(ValueType::Number)));
        assert!(!is_missing_index(&json, &typed(ValueType::String)));
    }
}
