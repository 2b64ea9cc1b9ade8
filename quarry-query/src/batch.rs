//! Batch insert field verification.
//!
//! Every row of a batch must carry the same non-empty set of field names. The
//! order within a row does not matter; the first row fixes the column order of
//! the rendered INSERT and every row's values are re-ordered to match it.

use indexmap::IndexMap;

use crate::clause::Data;
use crate::error::{QueryError, QueryResult};
use crate::value::QueryValue;

/// Rows of a batch normalized to one column order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRows {
    /// Column order, taken from the first row.
    pub fields: Vec<String>,
    /// Values of each row in column order.
    pub rows: Vec<Vec<QueryValue>>,
}

impl BatchRows {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the batch holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Verify that all rows share one field set and normalize their order.
pub fn verify_fields(rows: Vec<Vec<Data>>) -> QueryResult<BatchRows> {
    if rows.is_empty() {
        return Err(QueryError::empty_data("add_all"));
    }

    let mut fields: Vec<String> = Vec::new();
    let mut normalized = Vec::with_capacity(rows.len());

    for (index, row) in rows.into_iter().enumerate() {
        let mut keyed = index_row(index, row)?;

        if index == 0 {
            fields = keyed.keys().cloned().collect();
        } else if keyed.len() != fields.len() || fields.iter().any(|f| !keyed.contains_key(f)) {
            return Err(QueryError::inconsistent_fields(index));
        }

        let values = fields
            .iter()
            .map(|f| keyed.shift_remove(f).unwrap_or_default())
            .collect();
        normalized.push(values);
    }

    Ok(BatchRows {
        fields,
        rows: normalized,
    })
}

fn index_row(index: usize, row: Vec<Data>) -> QueryResult<IndexMap<String, QueryValue>> {
    if row.is_empty() {
        return Err(QueryError::inconsistent_fields(index));
    }

    let mut keyed = IndexMap::with_capacity(row.len());
    for Data { field, value } in row {
        if field.trim().is_empty() || keyed.contains_key(&field) {
            return Err(QueryError::inconsistent_fields(index));
        }
        keyed.insert(field, value);
    }
    Ok(keyed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_matching_rows_follow_first_row_order() {
        let batch = verify_fields(vec![
            vec![Data::new("a", 1), Data::new("b", 2)],
            vec![Data::new("b", 4), Data::new("a", 3)],
        ])
        .unwrap();

        assert_eq!(batch.fields, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            batch.rows,
            vec![
                vec![QueryValue::from(1), QueryValue::from(2)],
                vec![QueryValue::from(3), QueryValue::from(4)],
            ]
        );
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_mismatched_field_set_is_rejected() {
        let err = verify_fields(vec![
            vec![Data::new("a", 1), Data::new("b", 2)],
            vec![Data::new("a", 3), Data::new("c", 4)],
        ])
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::InconsistentFields);
    }

    #[test]
    fn test_extra_or_missing_fields_are_rejected() {
        let err = verify_fields(vec![
            vec![Data::new("a", 1)],
            vec![Data::new("a", 2), Data::new("b", 3)],
        ])
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InconsistentFields);

        let err = verify_fields(vec![
            vec![Data::new("a", 1), Data::new("b", 3)],
            vec![Data::new("a", 2)],
        ])
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InconsistentFields);
    }

    #[test]
    fn test_empty_rows_and_names_are_rejected() {
        let err = verify_fields(vec![vec![]]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InconsistentFields);

        let err = verify_fields(vec![vec![Data::new("", 1)]]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InconsistentFields);

        let err = verify_fields(vec![vec![Data::new("a", 1), Data::new("a", 2)]]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InconsistentFields);

        let err = verify_fields(Vec::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyData);
    }
}
