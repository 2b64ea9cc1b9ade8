//! In-memory driver used by the integration tests.
//!
//! Every statement is written to a shared [`Journal`] so tests can assert on
//! the exact SQL and arguments that reached the driver.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

use quarry::mysql::{Connector, ExecOutcome, Handle, PoolLimits, Record, Transaction};
use quarry::prelude::*;

/// One statement as seen by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub args: Vec<QueryValue>,
}

#[derive(Debug, Default)]
pub struct JournalState {
    /// Statements that ran outside a transaction or were committed.
    pub statements: Vec<Executed>,
    /// Rows returned by queries.
    pub rows: Vec<Record>,
    /// Statements whose arguments contain this value fail.
    pub fail_on: Option<QueryValue>,
    pub next_insert_id: u64,
    pub commits: usize,
    pub rollbacks: usize,
}

/// Shared record of driver traffic.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<JournalState>>);

impl Journal {
    pub fn state(&self) -> MutexGuard<'_, JournalState> {
        self.0.lock().unwrap()
    }

    pub fn statements(&self) -> Vec<Executed> {
        self.state().statements.clone()
    }

    pub fn set_rows(&self, rows: Vec<JsonValue>) {
        self.state().rows = rows
            .into_iter()
            .map(|row| match row {
                JsonValue::Object(map) => map,
                other => panic!("rows must be objects, got {other}"),
            })
            .collect();
    }

    pub fn fail_on(&self, value: impl Into<QueryValue>) {
        self.state().fail_on = Some(value.into());
    }

    fn check(&self, args: &[QueryValue]) -> QueryResult<()> {
        match &self.state().fail_on {
            Some(bad) if args.contains(bad) => Err(QueryError::database("Duplicate entry")),
            _ => Ok(()),
        }
    }

    fn record(&self, sql: &str, args: &[QueryValue]) {
        self.state().statements.push(Executed {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
    }
}

#[derive(Debug, Default)]
pub struct MemoryConnector {
    pub journal: Journal,
    pub connects: AtomicUsize,
    pub opens: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    fn handle(&self, dsn: &Dsn) -> MemoryHandle {
        MemoryHandle {
            journal: self.journal.clone(),
            host: dsn.host.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Handle = MemoryHandle;

    async fn connect(&self, dsn: &Dsn, _limits: PoolLimits) -> QueryResult<MemoryHandle> {
        if dsn.host == "unreachable" {
            return Err(QueryError::connection("connection refused"));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.handle(dsn))
    }

    async fn open(&self, dsn: &Dsn, _limits: PoolLimits) -> QueryResult<MemoryHandle> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.handle(dsn))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryHandle {
    pub journal: Journal,
    pub host: String,
    pub closed: Arc<AtomicBool>,
}

#[async_trait]
impl Handle for MemoryHandle {
    async fn execute(&self, sql: &str, args: &[QueryValue]) -> QueryResult<ExecOutcome> {
        self.journal.check(args)?;
        self.journal.record(sql, args);
        let mut state = self.journal.state();
        state.next_insert_id += 1;
        Ok(ExecOutcome {
            rows_affected: 1,
            last_insert_id: Some(state.next_insert_id),
        })
    }

    async fn query_one(&self, sql: &str, args: &[QueryValue]) -> QueryResult<Option<Record>> {
        self.journal.record(sql, args);
        Ok(self.journal.state().rows.first().cloned())
    }

    async fn query_many(&self, sql: &str, args: &[QueryValue]) -> QueryResult<Vec<Record>> {
        self.journal.record(sql, args);
        Ok(self.journal.state().rows.clone())
    }

    async fn begin(&self) -> QueryResult<Box<dyn Transaction>> {
        Ok(Box::new(MemoryTransaction {
            journal: self.journal.clone(),
            pending: Vec::new(),
        }))
    }

    async fn close(&self) -> QueryResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MemoryTransaction {
    journal: Journal,
    pending: Vec<Executed>,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn execute(&mut self, sql: &str, args: &[QueryValue]) -> QueryResult<ExecOutcome> {
        self.journal.check(args)?;
        self.pending.push(Executed {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        Ok(ExecOutcome {
            rows_affected: 1,
            last_insert_id: None,
        })
    }

    async fn commit(self: Box<Self>) -> QueryResult<()> {
        let mut state = self.journal.state();
        state.statements.extend(self.pending);
        state.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> QueryResult<()> {
        self.journal.state().rollbacks += 1;
        Ok(())
    }
}

pub fn dsn(host: &str) -> Dsn {
    Dsn::new(host, "shop").user("root").password("secret")
}

/// A registry with `default` connected to an in-memory driver.
pub async fn registry() -> (Arc<Registry<MemoryConnector>>, Journal) {
    let journal = Journal::default();
    let registry = Arc::new(Registry::new(MemoryConnector::new(journal.clone())));
    registry
        .connect([ConnectionConfig::new("default", dsn("db0"))])
        .await
        .unwrap();
    (registry, journal)
}

pub fn user_row(id: u64, name: &str) -> JsonValue {
    json!({ "id": id, "name": name })
}
