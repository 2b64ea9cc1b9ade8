//! # quarry-query
//!
//! Clause accumulation and SQL assembly for the Quarry query builder.
//!
//! This crate is pure: it performs no I/O. It provides:
//! - [`QueryValue`], the positional parameter type bound to `?` placeholders
//! - clause types ([`Table`], [`Order`], [`Limit`], [`Page`], [`Join`], [`Data`])
//! - [`QueryOptions`], the per-statement clause accumulator
//! - the [`assembler`], which renders typed clause nodes into MySQL text
//! - [`batch`] verification for multi-row inserts
//! - the [`QueryError`] taxonomy shared by the whole workspace
//!
//! ## Rendering a select
//!
//! ```rust
//! use quarry_query::{assembler, Join, Order, Page, QueryOptions, values};
//!
//! let mut opts = QueryOptions::new();
//! opts.push_fields(["u.id", "u.name"]);
//! opts.push_join(Join::with_type("orders o ON o.user_id = u.id", 1));
//! opts.push_where("u.active = ?", values![true]).unwrap();
//! opts.push_order([Order::asc("u.name")]);
//! opts.set_page(Page { page: 3, rows: 20 });
//!
//! let stmt = assembler::select(&opts, "users u").unwrap();
//! assert_eq!(
//!     stmt.sql(),
//!     "SELECT u.id,u.name FROM users u LEFT JOIN orders o ON o.user_id = u.id \
//!      WHERE u.active = ? ORDER BY u.name asc LIMIT 40, 20"
//! );
//! ```
//!
//! ## Errors
//!
//! ```rust
//! use quarry_query::{ErrorCode, QueryOptions, values};
//!
//! let mut opts = QueryOptions::new();
//! let err = opts.push_where("", values![1]).unwrap_err();
//! assert_eq!(err.code, ErrorCode::ArgsWithoutCondition);
//! ```

#[macro_use]
pub mod macros;

pub mod assembler;
pub mod batch;
pub mod clause;
pub mod error;
pub mod logging;
pub mod options;
pub mod value;

pub use assembler::{Clause, Statement, StatementKind};
pub use batch::{BatchRows, verify_fields};
pub use clause::{Data, Join, JoinKind, Limit, Order, Page, SortOrder, Table, Union};
pub use error::{ErrorCode, ErrorContext, ErrorKind, QueryError, QueryResult};
pub use options::QueryOptions;
pub use value::QueryValue;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::clause::{Data, Join, JoinKind, Limit, Order, Page, SortOrder, Table};
    pub use crate::error::{ErrorCode, QueryError, QueryResult};
    pub use crate::options::QueryOptions;
    pub use crate::value::QueryValue;
    pub use crate::{row, values};
}
