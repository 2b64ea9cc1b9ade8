//! SQL assembly.
//!
//! Statements are built as an ordered list of typed [`Clause`] nodes and turned
//! into text by [`serialize`], which joins every non-empty fragment with a
//! single space. Each clause renderer is a pure function that can be tested in
//! isolation.
//!
//! ```rust
//! use quarry_query::assembler;
//! use quarry_query::{Limit, Order, QueryOptions, QueryValue};
//!
//! let mut opts = QueryOptions::new();
//! opts.push_fields(["x", "y"]);
//! opts.push_where("x = ?", vec![1.into()]).unwrap();
//! opts.push_order([Order::desc("y")]);
//! opts.set_limit(Limit::new(1, 10));
//!
//! let stmt = assembler::select(&opts, "t").unwrap();
//! assert_eq!(stmt.sql(), "SELECT x,y FROM t WHERE x = ? ORDER BY y desc LIMIT 1, 10");
//! assert_eq!(stmt.args(), &[QueryValue::from(1)]);
//! ```

use std::collections::HashSet;

use crate::clause::{Data, Join, Limit, Order, Table, Union};
use crate::error::{QueryError, QueryResult};
use crate::options::QueryOptions;
use crate::value::QueryValue;

/// Kind of statement being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// SELECT.
    Select,
    /// INSERT.
    Insert,
    /// UPDATE.
    Update,
    /// DELETE.
    Delete,
}

/// One typed node of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// A fixed keyword such as `SELECT` or `FROM`.
    Keyword(&'static str),
    /// `DISTINCT` when set.
    Distinct(bool),
    /// Selected fields, `*` when empty.
    Fields(Vec<String>),
    /// Already resolved table reference.
    Table(String),
    /// `FORCE INDEX (...)` when non-empty.
    ForceIndex(String),
    /// Join fragments.
    Joins(Vec<Join>),
    /// `WHERE ...` when non-empty.
    Where(String),
    /// `GROUP BY ...` when non-empty.
    GroupBy(Vec<String>),
    /// `HAVING ...` when non-empty.
    Having(String),
    /// `ORDER BY ...` when non-empty.
    OrderBy(Vec<Order>),
    /// `LIMIT ...` depending on the window.
    Limit(Limit),
    /// `UNION [ALL] ...` when sub-selects exist.
    Union(Union),
    /// `/* ... */` when non-empty.
    Comment(String),
    /// `(a,b)` column list of an insert.
    Columns(Vec<String>),
    /// `VALUES (?,?)` with the given placeholder count.
    Values(usize),
    /// `SET a = ?, b = ?`.
    Set(Vec<String>),
}

impl Clause {
    /// Render this node; empty when the clause is unset.
    pub fn render(&self) -> String {
        match self {
            Self::Keyword(kw) => (*kw).to_string(),
            Self::Distinct(distinct) => render_distinct(*distinct).to_string(),
            Self::Fields(fields) => render_fields(fields),
            Self::Table(table) => table.clone(),
            Self::ForceIndex(index) => render_force(index),
            Self::Joins(joins) => render_joins(joins),
            Self::Where(condition) => render_where(condition),
            Self::GroupBy(group) => render_group(group),
            Self::Having(having) => render_having(having),
            Self::OrderBy(order) => render_order(order),
            Self::Limit(limit) => render_limit(*limit),
            Self::Union(union) => render_union(union),
            Self::Comment(comment) => render_comment(comment),
            Self::Columns(fields) => format!("({})", fields.join(",")),
            Self::Values(count) => format!("VALUES ({})", placeholders(*count)),
            Self::Set(assignments) => format!("SET {}", assignments.join(", ")),
        }
    }
}

/// Join the rendered clauses, skipping empty fragments.
pub fn serialize(clauses: &[Clause]) -> String {
    let mut sql = String::new();
    for clause in clauses {
        let fragment = clause.render();
        if fragment.is_empty() {
            continue;
        }
        if !sql.is_empty() {
            sql.push(' ');
        }
        sql.push_str(&fragment);
    }
    sql
}

/// An assembled statement with its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    kind: StatementKind,
    clauses: Vec<Clause>,
    args: Vec<QueryValue>,
}

impl Statement {
    /// Statement kind.
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// The clause nodes in render order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Rendered SQL text.
    pub fn sql(&self) -> String {
        serialize(&self.clauses)
    }

    /// Positional arguments matching the `?` placeholders.
    pub fn args(&self) -> &[QueryValue] {
        &self.args
    }

    /// Split into SQL text and arguments.
    pub fn into_parts(self) -> (String, Vec<QueryValue>) {
        (serialize(&self.clauses), self.args)
    }
}

// ============== Clause renderers ==============

/// Explicit tables joined by `,`, else the configured table name.
pub fn render_table(tables: &[Table], default_table: &str) -> QueryResult<String> {
    if !tables.is_empty() {
        let rendered: Vec<String> = tables
            .iter()
            .map(|t| format!("{} {}", t.name, t.alias).trim().to_string())
            .collect();
        return Ok(rendered.join(","));
    }
    if default_table.trim().is_empty() {
        return Err(QueryError::missing_table());
    }
    Ok(default_table.to_string())
}

/// `DISTINCT` or nothing.
pub fn render_distinct(distinct: bool) -> &'static str {
    if distinct { "DISTINCT" } else { "" }
}

/// `*` when no field is selected, else the list verbatim.
pub fn render_fields(fields: &[String]) -> String {
    if fields.is_empty() {
        "*".to_string()
    } else {
        fields.join(",")
    }
}

/// `FORCE INDEX (idx)`.
pub fn render_force(index: &str) -> String {
    if index.is_empty() {
        String::new()
    } else {
        format!("FORCE INDEX ({})", index)
    }
}

/// Render one join, inserting `JOIN` when the statement lacks it.
pub fn render_join(join: &Join) -> String {
    let statement = join.statement.trim();
    let statement = if statement.contains("JOIN") || statement.contains("join") {
        statement.to_string()
    } else {
        format!("JOIN {}", statement)
    };
    format!("{} {}", join.kind.as_sql(), statement)
}

/// All joins separated by a space.
pub fn render_joins(joins: &[Join]) -> String {
    joins.iter().map(render_join).collect::<Vec<_>>().join(" ")
}

/// `WHERE cond`.
pub fn render_where(condition: &str) -> String {
    if condition.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", condition)
    }
}

/// `GROUP BY a,b`.
pub fn render_group(group: &[String]) -> String {
    if group.is_empty() {
        String::new()
    } else {
        format!("GROUP BY {}", group.join(","))
    }
}

/// `HAVING cond`.
pub fn render_having(having: &str) -> String {
    if having.is_empty() {
        String::new()
    } else {
        format!("HAVING {}", having)
    }
}

/// `ORDER BY a asc, b desc`.
pub fn render_order(order: &[Order]) -> String {
    if order.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = order
        .iter()
        .map(|o| format!("{} {}", o.field, o.order.as_sql()))
        .collect();
    format!("ORDER BY {}", parts.join(", "))
}

/// Limit window.
///
/// A zero offset with a non-zero length renders `LIMIT 0, n` so the first page
/// stays expressible; a window with both parts zero renders nothing.
pub fn render_limit(limit: Limit) -> String {
    match (limit.offset, limit.length) {
        (0, 0) => String::new(),
        (offset, 0) => format!("LIMIT {}", offset),
        (offset, length) => format!("LIMIT {}, {}", offset, length),
    }
}

/// `UNION [ALL] s1,s2`.
pub fn render_union(union: &Union) -> String {
    if union.selects.is_empty() {
        return String::new();
    }
    let keyword = if union.all { "UNION ALL" } else { "UNION" };
    format!("{} {}", keyword, union.selects.join(","))
}

/// `/* comment */`.
pub fn render_comment(comment: &str) -> String {
    if comment.is_empty() {
        String::new()
    } else {
        format!("/* {} */", comment)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

// ============== Statement templates ==============

/// Assemble a SELECT from the option set.
pub fn select(opts: &QueryOptions, default_table: &str) -> QueryResult<Statement> {
    let table = render_table(&opts.tables, default_table)?;
    let clauses = vec![
        Clause::Keyword("SELECT"),
        Clause::Distinct(opts.distinct),
        Clause::Fields(opts.fields.clone()),
        Clause::Keyword("FROM"),
        Clause::Table(table),
        Clause::ForceIndex(opts.force.clone()),
        Clause::Joins(opts.joins.clone()),
        Clause::Where(opts.condition.clone()),
        Clause::GroupBy(opts.group.clone()),
        Clause::Having(opts.having.clone()),
        Clause::OrderBy(opts.order.clone()),
        Clause::Limit(opts.effective_limit()),
        Clause::Union(opts.union.clone()),
        Clause::Comment(opts.comment.clone()),
    ];

    Ok(Statement {
        kind: StatementKind::Select,
        clauses,
        args: opts.args.clone(),
    })
}

/// Assemble an INSERT template for the given field list, without arguments.
pub fn insert_template(
    opts: &QueryOptions,
    default_table: &str,
    fields: &[String],
) -> QueryResult<Statement> {
    if fields.is_empty() {
        return Err(QueryError::empty_data("insert"));
    }
    let table = render_table(&opts.tables, default_table)?;
    let clauses = vec![
        Clause::Keyword("INSERT INTO"),
        Clause::Table(table),
        Clause::Columns(fields.to_vec()),
        Clause::Values(fields.len()),
    ];

    Ok(Statement {
        kind: StatementKind::Insert,
        clauses,
        args: Vec::new(),
    })
}

/// Assemble a single-row INSERT.
pub fn insert(opts: &QueryOptions, default_table: &str, data: Vec<Data>) -> QueryResult<Statement> {
    let (fields, values): (Vec<String>, Vec<QueryValue>) =
        data.into_iter().map(|d| (d.field, d.value)).unzip();
    let mut stmt = insert_template(opts, default_table, &fields)?;
    stmt.args = values;
    Ok(stmt)
}

/// Assemble an UPDATE.
///
/// Arguments are the field values in order followed by every where argument.
pub fn update(opts: &QueryOptions, default_table: &str, data: Vec<Data>) -> QueryResult<Statement> {
    if data.is_empty() {
        return Err(QueryError::empty_data("update"));
    }
    if opts.condition.is_empty() {
        return Err(QueryError::missing_condition("update"));
    }

    let mut seen = HashSet::with_capacity(data.len());
    let mut assignments = Vec::with_capacity(data.len());
    let mut args = Vec::with_capacity(data.len() + opts.args.len());
    for item in data {
        if !seen.insert(item.field.clone()) {
            return Err(QueryError::duplicate_field(item.field));
        }
        assignments.push(format!("{} = ?", item.field));
        args.push(item.value);
    }
    args.extend(opts.args.iter().cloned());

    let table = render_table(&opts.tables, default_table)?;
    let clauses = vec![
        Clause::Keyword("UPDATE"),
        Clause::Table(table),
        Clause::Set(assignments),
        Clause::Where(opts.condition.clone()),
    ];

    Ok(Statement {
        kind: StatementKind::Update,
        clauses,
        args,
    })
}

/// Assemble a DELETE.
pub fn delete(opts: &QueryOptions, default_table: &str) -> QueryResult<Statement> {
    if opts.condition.is_empty() {
        return Err(QueryError::missing_condition("delete"));
    }
    let table = render_table(&opts.tables, default_table)?;
    let clauses = vec![
        Clause::Keyword("DELETE FROM"),
        Clause::Table(table),
        Clause::Where(opts.condition.clone()),
    ];

    Ok(Statement {
        kind: StatementKind::Delete,
        clauses,
        args: opts.args.clone(),
    })
}
