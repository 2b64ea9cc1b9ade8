//! `mysql_async` implementation of the driver seam.

use std::sync::Arc;

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row};
use tracing::{debug, info};

use quarry_query::error::{QueryError, QueryResult};
use quarry_query::value::QueryValue;

use crate::config::{DEFAULT_PORT, Dsn, PoolLimits};
use crate::driver::{Connector, ExecOutcome, Handle, Record, Transaction};
use crate::error::MysqlError;
use crate::types::{row_to_record, to_params};

/// Opens [`MysqlPool`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlConnector;

impl MysqlConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }

    /// Translate a DSN and pool limits into driver options.
    ///
    /// The charset is applied with `SET NAMES` on every new connection.
    pub fn opts(dsn: &Dsn, limits: PoolLimits) -> QueryResult<Opts> {
        dsn.validate()?;

        let charset = dsn.effective_charset();
        if !charset.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(MysqlError::config(format!("invalid charset '{}'", charset)).into());
        }

        let constraints = match limits.bounds() {
            Some((min, max)) => PoolConstraints::new(min, max).unwrap_or_default(),
            None => PoolConstraints::default(),
        };
        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_abs_conn_ttl(limits.lifetime());

        let password = (!dsn.password.is_empty()).then(|| dsn.password.clone());
        let builder = OptsBuilder::default()
            .ip_or_hostname(dsn.host.clone())
            .tcp_port(dsn.port.unwrap_or(DEFAULT_PORT))
            .user(Some(dsn.user.clone()))
            .pass(password)
            .db_name(Some(dsn.database.clone()))
            .init(vec![format!("SET NAMES {}", charset)])
            .pool_opts(pool_opts);

        Ok(Opts::from(builder))
    }
}

#[async_trait]
impl Connector for MysqlConnector {
    type Handle = MysqlPool;

    async fn connect(&self, dsn: &Dsn, limits: PoolLimits) -> QueryResult<MysqlPool> {
        let pool = self.open(dsn, limits).await?;
        if let Err(e) = pool.ping().await {
            // Release the half-open pool before reporting.
            let _ = pool.close().await;
            return Err(e);
        }
        info!(endpoint = %pool.endpoint(), "MySQL connection verified");
        Ok(pool)
    }

    async fn open(&self, dsn: &Dsn, limits: PoolLimits) -> QueryResult<MysqlPool> {
        let opts = Self::opts(dsn, limits)?;
        let endpoint = dsn.redacted()?;

        info!(
            endpoint = %endpoint,
            max_open = limits.max_open,
            max_idle = limits.max_idle,
            max_lifetime = limits.max_lifetime,
            "MySQL connection pool created"
        );

        Ok(MysqlPool {
            inner: Pool::new(opts),
            endpoint: Arc::from(endpoint),
        })
    }
}

/// A pooled MySQL handle. Clones share the pool.
#[derive(Debug, Clone)]
pub struct MysqlPool {
    inner: Pool,
    endpoint: Arc<str>,
}

impl MysqlPool {
    /// The connection string with its password masked.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check a connection out and ping the server.
    pub async fn ping(&self) -> QueryResult<()> {
        let mut conn = self.conn().await?;
        conn.ping()
            .await
            .map_err(|e| QueryError::connection(e.to_string()))
    }

    async fn conn(&self) -> QueryResult<Conn> {
        debug!("Acquiring connection from pool");
        self.inner
            .get_conn()
            .await
            .map_err(|e| QueryError::connection(e.to_string()))
    }
}

#[async_trait]
impl Handle for MysqlPool {
    async fn execute(&self, sql: &str, args: &[QueryValue]) -> QueryResult<ExecOutcome> {
        debug!(sql = %sql, args = args.len(), "Executing statement");
        let mut conn = self.conn().await?;
        conn.exec_drop(sql, to_params(args))
            .await
            .map_err(|e| QueryError::from(MysqlError::from(e)).with_sql(sql))?;

        Ok(ExecOutcome {
            rows_affected: conn.affected_rows(),
            last_insert_id: conn.last_insert_id(),
        })
    }

    async fn query_one(&self, sql: &str, args: &[QueryValue]) -> QueryResult<Option<Record>> {
        debug!(sql = %sql, args = args.len(), "Fetching one row");
        let mut conn = self.conn().await?;
        let row: Option<Row> = conn
            .exec_first(sql, to_params(args))
            .await
            .map_err(|e| QueryError::from(MysqlError::from(e)).with_sql(sql))?;

        Ok(row.map(row_to_record))
    }

    async fn query_many(&self, sql: &str, args: &[QueryValue]) -> QueryResult<Vec<Record>> {
        debug!(sql = %sql, args = args.len(), "Fetching rows");
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .exec(sql, to_params(args))
            .await
            .map_err(|e| QueryError::from(MysqlError::from(e)).with_sql(sql))?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn begin(&self) -> QueryResult<Box<dyn Transaction>> {
        let mut conn = self.conn().await?;
        conn.query_drop("BEGIN")
            .await
            .map_err(|e| QueryError::transaction(format!("failed to begin: {}", e)))?;
        debug!("Transaction started");

        Ok(Box::new(MysqlTransaction { conn }))
    }

    async fn close(&self) -> QueryResult<()> {
        self.inner
            .clone()
            .disconnect()
            .await
            .map_err(MysqlError::from)?;
        info!(endpoint = %self.endpoint, "MySQL connection pool closed");
        Ok(())
    }
}

/// A transaction driven with explicit `BEGIN`/`COMMIT`/`ROLLBACK` on one
/// checked-out connection, so it can outlive the borrow of the pool.
pub struct MysqlTransaction {
    conn: Conn,
}

#[async_trait]
impl Transaction for MysqlTransaction {
    async fn execute(&mut self, sql: &str, args: &[QueryValue]) -> QueryResult<ExecOutcome> {
        debug!(sql = %sql, args = args.len(), "Executing statement in transaction");
        self.conn
            .exec_drop(sql, to_params(args))
            .await
            .map_err(|e| QueryError::from(MysqlError::from(e)).with_sql(sql))?;

        Ok(ExecOutcome {
            rows_affected: self.conn.affected_rows(),
            last_insert_id: self.conn.last_insert_id(),
        })
    }

    async fn commit(self: Box<Self>) -> QueryResult<()> {
        let MysqlTransaction { mut conn } = *self;
        conn.query_drop("COMMIT")
            .await
            .map_err(|e| QueryError::transaction(format!("failed to commit: {}", e)))?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> QueryResult<()> {
        let MysqlTransaction { mut conn } = *self;
        conn.query_drop("ROLLBACK")
            .await
            .map_err(|e| QueryError::transaction(format!("failed to roll back: {}", e)))?;
        debug!("Transaction rolled back");
        Ok(())
    }
}
