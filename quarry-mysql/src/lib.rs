//! MySQL connection registry and fluent model for Quarry.
//!
//! This crate wires the pure SQL assembly of `quarry-query` to real
//! connections:
//!
//! - [`Dsn`] / [`ConnectionConfig`] / [`DatabasesConfig`] describe connections
//! - [`Registry`] owns named, lazily reopened pools
//! - [`Model`] builds and runs statements against one table
//! - the [`driver`] traits are the seam to the database; [`MysqlConnector`]
//!   implements them on `mysql_async`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quarry_mysql::{DatabasesConfig, Model, Registry};
//! use quarry_query::values;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabasesConfig::from_file("databases.toml")?;
//!     let registry = Arc::new(Registry::mysql());
//!     registry.connect(config.connections).await?;
//!
//!     let mut orders = Model::new(registry.clone(), "orders");
//!     let removed = orders.r#where("status = ?", values!["cancelled"]).delete().await?;
//!     println!("removed {} orders", removed);
//!
//!     registry.close_all().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod pool;
pub mod registry;
pub mod types;

pub use config::{ConnectionConfig, DatabasesConfig, Dsn, PoolLimits};
pub use driver::{Connector, ExecOutcome, Handle, Record, Transaction};
pub use error::MysqlError;
pub use model::Model;
pub use pool::{MysqlConnector, MysqlPool, MysqlTransaction};
pub use registry::{DEFAULT_ALIAS, Registry};
