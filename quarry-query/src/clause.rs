//! Clause types handed to the builder.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::QueryValue;

/// A table reference with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Alias, empty for none.
    pub alias: String,
}

impl Table {
    /// Reference a table without an alias.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: String::new(),
        }
    }

    /// Reference a table under an alias.
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }
}

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortOrder {
    /// The keyword rendered into ORDER BY.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column or expression to sort by.
    pub field: Cow<'static, str>,
    /// Direction.
    pub order: SortOrder,
}

impl Order {
    /// Ascending order on `field`.
    pub fn asc(field: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    /// Descending order on `field`.
    pub fn desc(field: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Row window of a select.
///
/// `offset` alone acts as a row count (`LIMIT offset`), matching the MySQL
/// single-argument form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limit {
    /// First argument of LIMIT.
    pub offset: u64,
    /// Second argument of LIMIT, 0 for none.
    pub length: u64,
}

impl Limit {
    /// `LIMIT offset, length`.
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// `LIMIT count`.
    pub fn count(count: u64) -> Self {
        Self {
            offset: count,
            length: 0,
        }
    }
}

/// Page window, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Page number; 0 is treated as the first page.
    pub page: u64,
    /// Rows per page.
    pub rows: u64,
}

impl Page {
    /// Convert into the equivalent limit window.
    ///
    /// The offset saturates at `u64::MAX` for pages past the addressable range.
    pub fn to_limit(self) -> Limit {
        let page = self.page.max(1);
        Limit::new((page - 1).saturating_mul(self.rows), self.rows)
    }
}

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    /// INNER JOIN.
    #[default]
    Inner,
    /// LEFT JOIN.
    Left,
    /// RIGHT JOIN.
    Right,
    /// FULL JOIN.
    Full,
}

impl JoinKind {
    /// Map the integer discriminant used by callers, unknown values become INNER.
    pub fn from_discriminant(kind: i32) -> Self {
        match kind {
            1 => Self::Left,
            2 => Self::Right,
            3 => Self::Full,
            _ => Self::Inner,
        }
    }

    /// The keyword placed in front of JOIN.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
        }
    }
}

/// A join fragment, e.g. `orders o ON o.user_id = u.id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Join statement; the JOIN keyword is optional.
    pub statement: String,
    /// Join flavour.
    pub kind: JoinKind,
}

impl Join {
    /// An INNER join.
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            kind: JoinKind::Inner,
        }
    }

    /// A join selected by integer discriminant (0 inner, 1 left, 2 right, 3 full).
    pub fn with_type(statement: impl Into<String>, kind: i32) -> Self {
        Self {
            statement: statement.into(),
            kind: JoinKind::from_discriminant(kind),
        }
    }

    /// Set the join flavour.
    pub fn kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Sub-selects merged with UNION.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Union {
    /// Rendered sub-selects.
    pub selects: Vec<String>,
    /// UNION ALL instead of UNION.
    pub all: bool,
}

/// A field/value pair written by inserts and updates.
#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    /// Column name.
    pub field: String,
    /// Bound value.
    pub value: QueryValue,
}

impl Data {
    /// Create a field/value pair.
    pub fn new(field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_discriminants() {
        assert_eq!(JoinKind::from_discriminant(0), JoinKind::Inner);
        assert_eq!(JoinKind::from_discriminant(1), JoinKind::Left);
        assert_eq!(JoinKind::from_discriminant(2), JoinKind::Right);
        assert_eq!(JoinKind::from_discriminant(3), JoinKind::Full);
        assert_eq!(JoinKind::from_discriminant(9), JoinKind::Inner);
        assert_eq!(JoinKind::from_discriminant(-1), JoinKind::Inner);
    }

    #[test]
    fn test_page_to_limit() {
        assert_eq!(Page { page: 1, rows: 20 }.to_limit(), Limit::new(0, 20));
        assert_eq!(Page { page: 3, rows: 20 }.to_limit(), Limit::new(40, 20));
        assert_eq!(Page { page: 0, rows: 5 }.to_limit(), Limit::new(0, 5));
    }

    #[test]
    fn test_page_offset_saturates() {
        assert_eq!(
            Page { page: u64::MAX, rows: 2 }.to_limit(),
            Limit::new(u64::MAX, 2)
        );
        assert_eq!(
            Page { page: u64::MAX, rows: 0 }.to_limit(),
            Limit::new(0, 0)
        );
    }
}
