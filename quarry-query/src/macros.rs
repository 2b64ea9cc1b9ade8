//! Convenience macros for building arguments and data rows.

/// Build a `Vec<QueryValue>` from heterogeneous expressions.
///
/// ```rust
/// use quarry_query::{values, QueryValue};
///
/// let args = values![1, "ann", true, None::<i32>];
/// assert_eq!(args.len(), 4);
/// assert_eq!(args[3], QueryValue::Null);
/// ```
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::value::QueryValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::value::QueryValue::from($value)),+]
    };
}

/// Build a `Vec<Data>` row from `field => value` pairs.
///
/// ```rust
/// use quarry_query::row;
///
/// let data = row! { "name" => "ann", "age" => 31 };
/// assert_eq!(data[1].field, "age");
/// ```
#[macro_export]
macro_rules! row {
    () => {
        ::std::vec::Vec::<$crate::clause::Data>::new()
    };
    ($($field:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$($crate::clause::Data::new($field, $value)),+]
    };
}

#[cfg(test)]
mod tests {
    use crate::value::QueryValue;

    #[test]
    fn test_values_macro() {
        let empty = values![];
        assert!(empty.is_empty());

        let args = values![1u8, -2, 1.5, "x", String::from("y")];
        assert_eq!(
            args,
            vec![
                QueryValue::UInt(1),
                QueryValue::Int(-2),
                QueryValue::Float(1.5),
                QueryValue::String("x".into()),
                QueryValue::String("y".into()),
            ]
        );
    }

    #[test]
    fn test_row_macro() {
        let data = row! { "a" => 1, "b" => "two", };
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].field, "a");
        assert_eq!(data[1].value, QueryValue::from("two"));
    }
}
