//! Per-statement clause accumulator.
//!
//! A [`QueryOptions`] collects the clauses of exactly one statement. The owner
//! creates it on the first clause call and takes it when the statement is
//! rendered, so nothing carries over into the next statement.

use crate::clause::{Join, Limit, Order, Page, Table, Union};
use crate::error::{QueryError, QueryResult};
use crate::value::QueryValue;

/// Clauses accumulated for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub(crate) tables: Vec<Table>,
    pub(crate) distinct: bool,
    pub(crate) fields: Vec<String>,
    pub(crate) joins: Vec<Join>,
    pub(crate) condition: String,
    pub(crate) args: Vec<QueryValue>,
    pub(crate) group: Vec<String>,
    pub(crate) having: String,
    pub(crate) order: Vec<Order>,
    pub(crate) limit: Limit,
    pub(crate) page: Option<Page>,
    pub(crate) union: Union,
    pub(crate) comment: String,
    pub(crate) force: String,
}

impl QueryOptions {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append explicit tables.
    pub fn push_tables(&mut self, tables: impl IntoIterator<Item = Table>) {
        self.tables.extend(tables);
    }

    /// Append selected fields.
    pub fn push_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
    }

    /// Conjoin a condition and append its arguments.
    ///
    /// Arguments without a condition are rejected and leave the set untouched.
    /// An empty condition without arguments is a no-op.
    pub fn push_where(&mut self, condition: &str, args: Vec<QueryValue>) -> QueryResult<()> {
        let condition = condition.trim();
        if condition.is_empty() {
            if args.is_empty() {
                return Ok(());
            }
            return Err(QueryError::args_without_condition(args.len()));
        }

        if self.condition.is_empty() {
            self.condition = condition.to_string();
        } else {
            self.condition = format!("{} AND {}", self.condition, condition);
        }
        self.args.extend(args);
        Ok(())
    }

    /// Append ORDER BY entries.
    pub fn push_order(&mut self, orders: impl IntoIterator<Item = Order>) {
        self.order.extend(orders);
    }

    /// Replace the limit window.
    pub fn set_limit(&mut self, limit: Limit) {
        self.limit = limit;
    }

    /// Replace the page window; it takes precedence over [`set_limit`](Self::set_limit).
    pub fn set_page(&mut self, page: Page) {
        self.page = Some(page);
    }

    /// Force a single-row window, dropping any page.
    pub fn force_single_row(&mut self) {
        self.page = None;
        self.limit = Limit::count(1);
    }

    /// Append GROUP BY columns.
    pub fn push_group<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group.extend(fields.into_iter().map(Into::into));
    }

    /// Replace the HAVING condition.
    pub fn set_having(&mut self, having: impl Into<String>) {
        self.having = having.into();
    }

    /// Toggle DISTINCT.
    pub fn set_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    /// Append a join.
    pub fn push_join(&mut self, join: Join) {
        self.joins.push(join);
    }

    /// Append sub-selects; `all` is sticky once set.
    pub fn push_union<I, S>(&mut self, selects: I, all: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if all {
            self.union.all = true;
        }
        self.union.selects.extend(selects.into_iter().map(Into::into));
    }

    /// Replace the trailing comment.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Replace the forced index.
    pub fn set_force(&mut self, index: impl Into<String>) {
        self.force = index.into();
    }

    /// The accumulated condition.
    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// The accumulated where arguments, in order.
    pub fn args(&self) -> &[QueryValue] {
        &self.args
    }

    /// True when a non-empty condition or any argument is present.
    pub fn has_condition(&self) -> bool {
        !self.condition.is_empty() || !self.args.is_empty()
    }

    /// The effective limit window after applying the page.
    pub fn effective_limit(&self) -> Limit {
        match self.page {
            Some(page) => page.to_limit(),
            None => self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_conjoins_in_order() {
        let mut opts = QueryOptions::new();
        opts.push_where("a = ?", vec![1.into()]).unwrap();
        opts.push_where("(b = ? OR c = ?)", vec![2.into(), 3.into()]).unwrap();

        assert_eq!(opts.condition(), "a = ? AND (b = ? OR c = ?)");
        assert_eq!(opts.args(), &[QueryValue::from(1), QueryValue::from(2), QueryValue::from(3)]);
    }

    #[test]
    fn test_args_without_condition_keep_prior_clauses() {
        let mut opts = QueryOptions::new();
        opts.push_where("a = ?", vec![1.into()]).unwrap();

        let err = opts.push_where("  ", vec![2.into()]).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ArgsWithoutCondition);
        assert_eq!(opts.condition(), "a = ?");
        assert_eq!(opts.args(), &[QueryValue::from(1)]);
    }

    #[test]
    fn test_empty_where_without_args_is_noop() {
        let mut opts = QueryOptions::new();
        opts.push_where("", Vec::new()).unwrap();
        assert!(!opts.has_condition());
    }

    #[test]
    fn test_union_all_is_sticky() {
        let mut opts = QueryOptions::new();
        opts.push_union(["SELECT 1"], true);
        opts.push_union(["SELECT 2"], false);
        assert!(opts.union.all);
        assert_eq!(opts.union.selects.len(), 2);
    }

    #[test]
    fn test_page_overrides_limit() {
        let mut opts = QueryOptions::new();
        opts.set_limit(Limit::new(5, 5));
        opts.set_page(Page { page: 2, rows: 10 });
        assert_eq!(opts.effective_limit(), Limit::new(10, 10));

        opts.force_single_row();
        assert_eq!(opts.effective_limit(), Limit::count(1));
    }
}
