//! # Quarry
//!
//! A fluent MySQL query builder with a named multi-connection registry.
//!
//! Quarry provides:
//! - A [`Registry`] of aliased, pooled connections that reopen on demand
//! - A [`Model`] builder that turns clauses into parameterized SQL
//! - Typed clause nodes rendered by a single serializer
//! - Batch inserts inside one all-or-nothing transaction
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quarry::prelude::*;
//!
//! #[derive(serde::Deserialize)]
//! struct Purchase {
//!     id: u64,
//!     total: f64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QueryError> {
//!     let registry = Arc::new(Registry::mysql());
//!     registry
//!         .connect([ConnectionConfig::new(
//!             "default",
//!             Dsn::new("127.0.0.1", "shop").user("app").password("secret"),
//!         )])
//!         .await?;
//!
//!     let mut orders = Model::new(registry.clone(), "orders");
//!     let recent: Vec<Purchase> = orders
//!         .field(["id", "total"])
//!         .r#where("customer_id = ?", values![42])
//!         .order([Order::desc("id")])
//!         .limit(Limit::count(10))
//!         .select()
//!         .await?;
//!
//!     registry.close_all().await;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Clause types, option set and SQL assembly.
pub mod query {
    pub use quarry_query::*;
}

/// Connection configuration, registry, driver seam and model.
pub mod mysql {
    pub use quarry_mysql::*;
}

pub use quarry_mysql::{
    ConnectionConfig, DatabasesConfig, Dsn, Model, MysqlConnector, PoolLimits, Registry,
};
pub use quarry_query::{QueryError, QueryResult, QueryValue, logging};

/// Prelude for convenient imports.
pub mod prelude {
    pub use quarry_mysql::driver::{Connector, Handle, Transaction};
    pub use quarry_mysql::{ConnectionConfig, DatabasesConfig, Dsn, Model, Registry};
    pub use quarry_query::prelude::*;
}
