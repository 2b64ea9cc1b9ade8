//! The seam between the registry/model and a concrete database driver.
//!
//! [`Connector`] opens pooled handles, [`Handle`] executes parameterized
//! statements and [`Transaction`] groups several executions. The MySQL
//! implementation lives in [`crate::pool`]; tests plug in an in-memory one.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use quarry_query::error::QueryResult;
use quarry_query::value::QueryValue;

use crate::config::{Dsn, PoolLimits};

/// One result row as an ordered column → value map.
pub type Record = Map<String, JsonValue>;

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    /// Rows changed by the statement.
    pub rows_affected: u64,
    /// Auto-increment id generated by an insert, if any.
    pub last_insert_id: Option<u64>,
}

/// Opens pooled handles.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Handle type produced by this connector.
    type Handle: Handle;

    /// Open a pool and verify the server is reachable.
    async fn connect(&self, dsn: &Dsn, limits: PoolLimits) -> QueryResult<Self::Handle>;

    /// Open a pool without contacting the server.
    async fn open(&self, dsn: &Dsn, limits: PoolLimits) -> QueryResult<Self::Handle>;
}

/// A cheap, cloneable reference to a connection pool.
#[async_trait]
pub trait Handle: Clone + Send + Sync + 'static {
    /// Execute a statement that returns no rows.
    async fn execute(&self, sql: &str, args: &[QueryValue]) -> QueryResult<ExecOutcome>;

    /// Fetch the first row, if any.
    async fn query_one(&self, sql: &str, args: &[QueryValue]) -> QueryResult<Option<Record>>;

    /// Fetch every row.
    async fn query_many(&self, sql: &str, args: &[QueryValue]) -> QueryResult<Vec<Record>>;

    /// Start a transaction on one pooled connection.
    async fn begin(&self) -> QueryResult<Box<dyn Transaction>>;

    /// Close the pool; idle connections are dropped.
    async fn close(&self) -> QueryResult<()>;
}

/// A transaction bound to one connection.
#[async_trait]
pub trait Transaction: Send {
    /// Execute a statement inside the transaction.
    async fn execute(&mut self, sql: &str, args: &[QueryValue]) -> QueryResult<ExecOutcome>;

    /// Commit and release the connection.
    async fn commit(self: Box<Self>) -> QueryResult<()>;

    /// Roll back and release the connection.
    async fn rollback(self: Box<Self>) -> QueryResult<()>;
}
