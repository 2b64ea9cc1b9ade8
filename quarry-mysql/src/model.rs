//! Fluent query builder bound to one table.
//!
//! Clause methods accumulate into a per-statement [`QueryOptions`]; every
//! terminal operation (`find`, `select`, `add`, `add_all`, `update`,
//! `delete`) takes that option set, so the next statement starts empty even
//! when the previous one failed.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde::Deserialize;
//! use quarry_mysql::{Model, Registry};
//! use quarry_query::{Order, values, row};
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # async fn run(registry: Arc<Registry>) -> quarry_query::QueryResult<()> {
//! let mut users = Model::new(registry, "users");
//!
//! let active: Vec<User> = users
//!     .field(["id", "name"])
//!     .r#where("active = ?", values![true])
//!     .order([Order::desc("id")])
//!     .page(1, 20)
//!     .select()
//!     .await?;
//!
//! let id = users.add(row! { "name" => "ann", "active" => true }).await?;
//! users.r#where("id = ?", values![id]).update(row! { "name" => "anne" }).await?;
//! # drop(active);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, instrument, warn};

use quarry_query::assembler::{self, Statement};
use quarry_query::batch::verify_fields;
use quarry_query::clause::{Data, Join, Limit, Order, Page, Table};
use quarry_query::error::{ErrorCode, QueryError, QueryResult};
use quarry_query::options::QueryOptions;
use quarry_query::value::QueryValue;

use crate::driver::{Connector, Handle, Record};
use crate::pool::MysqlConnector;
use crate::registry::{DEFAULT_ALIAS, Registry};

/// Query builder for one table on one aliased connection.
pub struct Model<C: Connector = MysqlConnector> {
    registry: Arc<Registry<C>>,
    alias: String,
    table: String,
    prefix: Option<String>,
    options: Option<QueryOptions>,
    rejected: bool,
    last_sql: String,
    errors: Vec<String>,
    first_code: Option<ErrorCode>,
}

impl<C: Connector> Model<C> {
    /// Create a model for `table` on the `default` connection.
    pub fn new(registry: Arc<Registry<C>>, table: impl Into<String>) -> Self {
        Self {
            registry,
            alias: DEFAULT_ALIAS.to_string(),
            table: table.into(),
            prefix: None,
            options: None,
            rejected: false,
            last_sql: String::new(),
            errors: Vec::new(),
            first_code: None,
        }
    }

    /// Route statements to another alias; an empty alias means `default`.
    pub fn on(&mut self, alias: impl Into<String>) -> &mut Self {
        let alias = alias.into();
        self.alias = if alias.is_empty() {
            DEFAULT_ALIAS.to_string()
        } else {
            alias
        };
        self
    }

    /// Override the table prefix configured on the connection.
    pub fn prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// The connection alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The unprefixed table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    // ============== Clauses ==============

    fn options(&mut self) -> &mut QueryOptions {
        self.options.get_or_insert_with(QueryOptions::new)
    }

    /// Use explicit tables instead of the model's table.
    pub fn table(&mut self, tables: impl IntoIterator<Item = Table>) -> &mut Self {
        self.options().push_tables(tables);
        self
    }

    /// Select fields; `*` when never called.
    pub fn field<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options().push_fields(fields);
        self
    }

    /// Add a condition, conjoined with earlier ones by `AND`.
    ///
    /// Arguments with an empty condition are rejected: the error is recorded,
    /// earlier clauses are kept and the next terminal operation fails.
    pub fn r#where(&mut self, condition: &str, args: Vec<QueryValue>) -> &mut Self {
        if let Err(e) = self.options().push_where(condition, args) {
            self.rejected = true;
            self.record(&e);
        }
        self
    }

    /// Append ORDER BY entries.
    pub fn order(&mut self, orders: impl IntoIterator<Item = Order>) -> &mut Self {
        self.options().push_order(orders);
        self
    }

    /// Set the row window.
    pub fn limit(&mut self, limit: Limit) -> &mut Self {
        self.options().set_limit(limit);
        self
    }

    /// Select a 1-based page of `rows` rows; overrides [`limit`](Self::limit).
    pub fn page(&mut self, page: u64, rows: u64) -> &mut Self {
        self.options().set_page(Page { page, rows });
        self
    }

    /// Append GROUP BY columns.
    pub fn group<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options().push_group(fields);
        self
    }

    /// Set the HAVING condition.
    pub fn having(&mut self, having: impl Into<String>) -> &mut Self {
        self.options().set_having(having);
        self
    }

    /// Toggle DISTINCT.
    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.options().set_distinct(distinct);
        self
    }

    /// Append a join.
    pub fn join(&mut self, join: Join) -> &mut Self {
        self.options().push_join(join);
        self
    }

    /// Append sub-selects merged with UNION (ALL).
    pub fn union<I, S>(&mut self, selects: I, all: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options().push_union(selects, all);
        self
    }

    /// Attach a `/* comment */` to the select.
    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.options().set_comment(comment);
        self
    }

    /// Force an index on the select.
    pub fn force(&mut self, index: impl Into<String>) -> &mut Self {
        self.options().set_force(index);
        self
    }

    // ============== Terminal operations ==============

    /// Fetch one row, forcing `LIMIT 1`.
    #[instrument(skip(self), fields(alias = %self.alias, table = %self.table))]
    pub async fn find<T: DeserializeOwned>(&mut self) -> QueryResult<Option<T>> {
        let result = self.run_find().await;
        self.finish(result)
    }

    /// Fetch every matching row.
    #[instrument(skip(self), fields(alias = %self.alias, table = %self.table))]
    pub async fn select<T: DeserializeOwned>(&mut self) -> QueryResult<Vec<T>> {
        let result = self.run_select().await;
        self.finish(result)
    }

    /// Insert one row and return the generated id (0 when none).
    #[instrument(skip(self, data), fields(alias = %self.alias, table = %self.table))]
    pub async fn add(&mut self, data: Vec<Data>) -> QueryResult<u64> {
        let result = self.run_add(data).await;
        self.finish(result)
    }

    /// Insert many rows in one transaction and return the rows inserted.
    ///
    /// Every row must carry the same field set. The first failing row rolls
    /// the whole batch back.
    #[instrument(skip(self, rows), fields(alias = %self.alias, table = %self.table, rows = rows.len()))]
    pub async fn add_all(&mut self, rows: Vec<Vec<Data>>) -> QueryResult<u64> {
        let result = self.run_add_all(rows).await;
        self.finish(result)
    }

    /// Update matching rows and return the rows affected.
    #[instrument(skip(self, data), fields(alias = %self.alias, table = %self.table))]
    pub async fn update(&mut self, data: Vec<Data>) -> QueryResult<u64> {
        let result = self.run_update(data).await;
        self.finish(result)
    }

    /// Delete matching rows and return the rows affected.
    #[instrument(skip(self), fields(alias = %self.alias, table = %self.table))]
    pub async fn delete(&mut self) -> QueryResult<u64> {
        let result = self.run_delete().await;
        self.finish(result)
    }

    // ============== Inspection ==============

    /// SQL of the last rendered statement.
    pub fn last_sql(&self) -> &str {
        &self.last_sql
    }

    /// Messages of every failure recorded so far.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// All recorded failures as one error, carrying the first failure's code.
    pub fn error(&self) -> Option<QueryError> {
        self.first_code
            .map(|code| QueryError::aggregate("model", self.errors.clone(), code))
    }

    /// Forget recorded failures.
    pub fn clear_errors(&mut self) {
        self.errors.clear();
        self.first_code = None;
    }

    /// True while clauses are waiting for a terminal operation.
    pub fn has_pending(&self) -> bool {
        self.options.is_some()
    }

    // ============== Internals ==============

    fn record(&mut self, err: &QueryError) {
        self.first_code.get_or_insert(err.code);
        self.errors.push(err.message.clone());
    }

    fn finish<T>(&mut self, result: QueryResult<T>) -> QueryResult<T> {
        if let Err(e) = &result {
            warn!(error = %e, sql = %self.last_sql, "Statement failed");
            self.record(e);
        }
        result
    }

    /// Take the option set, leaving the builder empty for the next statement.
    fn take_options(&mut self) -> QueryResult<QueryOptions> {
        let options = self.options.take().unwrap_or_default();
        if std::mem::take(&mut self.rejected) {
            return Err(QueryError::new(
                ErrorCode::ArgsWithoutCondition,
                "statement discarded because a where clause was rejected",
            ));
        }
        Ok(options)
    }

    async fn resolve_table(&self) -> String {
        if self.table.is_empty() {
            return String::new();
        }
        let prefix = match &self.prefix {
            Some(prefix) => prefix.clone(),
            None => self.registry.prefix(&self.alias).await.unwrap_or_default(),
        };
        format!("{}{}", prefix, self.table)
    }

    fn render(&mut self, stmt: Statement) -> (String, Vec<QueryValue>) {
        let (sql, args) = stmt.into_parts();
        debug!(sql = %sql, args = args.len(), "Rendered statement");
        self.last_sql = sql.clone();
        (sql, args)
    }

    async fn handle(&self) -> QueryResult<C::Handle> {
        self.registry.get(&[self.alias.as_str()]).await
    }

    async fn run_find<T: DeserializeOwned>(&mut self) -> QueryResult<Option<T>> {
        let mut options = self.take_options()?;
        options.force_single_row();
        let table = self.resolve_table().await;
        let (sql, args) = self.render(assembler::select(&options, &table)?);

        let record = self.handle().await?.query_one(&sql, &args).await?;
        record.map(decode).transpose()
    }

    async fn run_select<T: DeserializeOwned>(&mut self) -> QueryResult<Vec<T>> {
        let options = self.take_options()?;
        let table = self.resolve_table().await;
        let (sql, args) = self.render(assembler::select(&options, &table)?);

        let records = self.handle().await?.query_many(&sql, &args).await?;
        records.into_iter().map(decode).collect()
    }

    async fn run_add(&mut self, data: Vec<Data>) -> QueryResult<u64> {
        let options = self.take_options()?;
        let table = self.resolve_table().await;
        let (sql, args) = self.render(assembler::insert(&options, &table, data)?);

        let outcome = self.handle().await?.execute(&sql, &args).await?;
        Ok(outcome.last_insert_id.unwrap_or(0))
    }

    async fn run_add_all(&mut self, rows: Vec<Vec<Data>>) -> QueryResult<u64> {
        let options = self.take_options()?;
        let batch = verify_fields(rows)?;
        let table = self.resolve_table().await;
        let (sql, _) = self.render(assembler::insert_template(&options, &table, &batch.fields)?);

        let mut tx = self.handle().await?.begin().await?;
        let mut inserted = 0;
        for (index, values) in batch.rows.iter().enumerate() {
            match tx.execute(&sql, values).await {
                Ok(outcome) => inserted += outcome.rows_affected,
                Err(e) => {
                    warn!(row = index, error = %e, "Batch row failed, rolling back");
                    if let Err(rollback) = tx.rollback().await {
                        warn!(error = %rollback, "Rollback failed");
                    }
                    return Err(e);
                }
            }
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn run_update(&mut self, data: Vec<Data>) -> QueryResult<u64> {
        let options = self.take_options()?;
        let table = self.resolve_table().await;
        let (sql, args) = self.render(assembler::update(&options, &table, data)?);

        let outcome = self.handle().await?.execute(&sql, &args).await?;
        Ok(outcome.rows_affected)
    }

    async fn run_delete(&mut self) -> QueryResult<u64> {
        let options = self.take_options()?;
        let table = self.resolve_table().await;
        let (sql, args) = self.render(assembler::delete(&options, &table)?);

        let outcome = self.handle().await?.execute(&sql, &args).await?;
        Ok(outcome.rows_affected)
    }
}

fn decode<T: DeserializeOwned>(record: Record) -> QueryResult<T> {
    serde_json::from_value(JsonValue::Object(record))
        .map_err(|e| QueryError::deserialization(e.to_string()))
}

impl<C: Connector> std::fmt::Debug for Model<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("alias", &self.alias)
            .field("table", &self.table)
            .field("prefix", &self.prefix)
            .field("options", &self.options)
            .field("last_sql", &self.last_sql)
            .field("errors", &self.errors)
            .finish()
    }
}
