//! Error types for query building, connection management and execution.
//!
//! Every failure in Quarry is a [`QueryError`] carrying:
//! - an [`ErrorCode`] for programmatic handling
//! - a human readable message
//! - context about the failed operation (SQL, field, related failures)
//! - an optional source error from the driver
//!
//! # Error Codes
//!
//! Error codes follow a pattern: Q{category}{number}
//! - 1xxx: Clause and statement validation (missing condition, duplicate field, ...)
//! - 3xxx: Connection registry (not configured, connection failed, closed)
//! - 4xxx: Transaction errors
//! - 5xxx: Execution errors reported by the driver
//! - 6xxx: Data errors (row decoding)
//! - 7xxx: Configuration errors (DSN fields, aliases)
//!
//! ```rust
//! use quarry_query::{ErrorCode, ErrorKind, QueryError};
//!
//! let err = QueryError::missing_field("host");
//! assert_eq!(err.code, ErrorCode::MissingField);
//! assert_eq!(err.kind(), ErrorKind::Validation);
//! assert!(err.to_string().contains("host"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Clause and statement errors (1xxx)
    /// Update or delete issued without a where condition (Q1001).
    MissingCondition = 1001,
    /// Where arguments supplied without a condition string (Q1002).
    ArgsWithoutCondition = 1002,
    /// The same field appears twice in one update (Q1003).
    DuplicateField = 1003,
    /// Rows of a batch insert do not share one field set (Q1004).
    InconsistentFields = 1004,
    /// Insert or update called without data (Q1005).
    EmptyData = 1005,
    /// Neither explicit tables nor a table name are set (Q1006).
    MissingTable = 1006,

    // Connection errors (3xxx)
    /// Opening or validating a connection failed (Q3001).
    ConnectionFailed = 3001,
    /// Alias has never been registered (Q3002).
    NotConfigured = 3002,
    /// Entry is closed (Q3003).
    ConnectionClosed = 3003,

    // Transaction errors (4xxx)
    /// Begin, commit or rollback failed (Q4001).
    TransactionFailed = 4001,

    // Execution errors (5xxx)
    /// Statement execution failed in the driver (Q5001).
    DatabaseError = 5001,

    // Data errors (6xxx)
    /// A returned row could not be decoded into the destination (Q6001).
    DeserializationError = 6001,

    // Configuration errors (7xxx)
    /// A required DSN field is empty (Q7001).
    MissingField = 7001,
    /// A connection config has an empty alias (Q7002).
    EmptyAlias = 7002,
    /// Configuration could not be parsed (Q7003).
    InvalidConfiguration = 7003,
}

/// Coarse error families callers usually branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid input rejected before any I/O.
    Validation,
    /// The requested alias is not registered.
    NotConfigured,
    /// Failure surfaced by the database driver.
    Driver,
    /// Arguments were supplied without a condition.
    Clause,
}

impl ErrorCode {
    /// Get the error code string (e.g., "Q1001").
    pub fn code(&self) -> String {
        format!("Q{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingCondition => "Missing where condition",
            Self::ArgsWithoutCondition => "Arguments without condition",
            Self::DuplicateField => "Duplicate field",
            Self::InconsistentFields => "Inconsistent batch fields",
            Self::EmptyData => "No data supplied",
            Self::MissingTable => "Missing table name",
            Self::ConnectionFailed => "Database connection failed",
            Self::NotConfigured => "Connection not configured",
            Self::ConnectionClosed => "Connection closed",
            Self::TransactionFailed => "Transaction failed",
            Self::DatabaseError => "Database error",
            Self::DeserializationError => "Deserialization error",
            Self::MissingField => "Missing required field",
            Self::EmptyAlias => "Empty alias",
            Self::InvalidConfiguration => "Invalid configuration",
        }
    }

    /// Map the code onto its error family.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ArgsWithoutCondition => ErrorKind::Clause,
            Self::NotConfigured => ErrorKind::NotConfigured,
            Self::ConnectionFailed
            | Self::ConnectionClosed
            | Self::TransactionFailed
            | Self::DatabaseError
            | Self::DeserializationError => ErrorKind::Driver,
            Self::MissingCondition
            | Self::DuplicateField
            | Self::InconsistentFields
            | Self::EmptyData
            | Self::MissingTable
            | Self::MissingField
            | Self::EmptyAlias
            | Self::InvalidConfiguration => ErrorKind::Validation,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// The SQL statement (if one was rendered).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Messages of the individual failures folded into this error.
    pub related: Vec<String>,
}

/// Errors that can occur while building, routing or executing a statement.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// The error family of this error.
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the SQL statement.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A required DSN field is empty.
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(ErrorCode::MissingField, format!("DSN field `{}` is empty", field))
            .with_field(&field)
    }

    /// A connection config was supplied without an alias.
    pub fn empty_alias() -> Self {
        Self::new(ErrorCode::EmptyAlias, "connection alias is empty")
            .with_suggestion("Give every connection config a unique alias, e.g. \"default\"")
    }

    /// The alias has never been registered.
    pub fn not_configured(alias: impl Into<String>) -> Self {
        let alias = alias.into();
        Self::new(
            ErrorCode::NotConfigured,
            format!("database connection `{}` is not configured", alias),
        )
        .with_suggestion("Register the alias with Registry::connect before using it")
    }

    /// The entry for this alias is already closed.
    pub fn connection_closed(alias: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConnectionClosed,
            format!("database connection `{}` is already closed", alias.into()),
        )
    }

    /// Opening or validating a connection failed.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConnectionFailed,
            format!("Connection error: {}", message.into()),
        )
        .with_suggestion("Check that the database server is running")
        .with_suggestion("Verify host, port and credentials of the DSN")
    }

    /// Update or delete without a condition.
    pub fn missing_condition(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        Self::new(
            ErrorCode::MissingCondition,
            format!("{} requires a where condition", operation),
        )
        .with_context(&operation)
    }

    /// Where arguments supplied with an empty condition string.
    pub fn args_without_condition(count: usize) -> Self {
        Self::new(
            ErrorCode::ArgsWithoutCondition,
            format!("{} where argument(s) supplied without a condition", count),
        )
        .with_context("where")
    }

    /// A field is set twice in one update.
    pub fn duplicate_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::DuplicateField,
            format!("field `{}` is set more than once", field),
        )
        .with_field(&field)
        .with_context("update")
    }

    /// Batch rows disagree on their field set.
    pub fn inconsistent_fields(row: usize) -> Self {
        Self::new(
            ErrorCode::InconsistentFields,
            format!("row {} does not share the field set of the batch", row),
        )
        .with_context("add_all")
    }

    /// Insert or update called without data.
    pub fn empty_data(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        Self::new(ErrorCode::EmptyData, format!("{} called without data", operation))
            .with_context(&operation)
    }

    /// No table could be resolved for the statement.
    pub fn missing_table() -> Self {
        Self::new(ErrorCode::MissingTable, "table name is not set")
            .with_suggestion("Set a table name on the model or pass tables with table()")
    }

    /// Configuration could not be parsed.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid configuration: {}", message.into()),
        )
    }

    /// A transaction could not be started, committed or rolled back.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::TransactionFailed,
            format!("Transaction error: {}", message.into()),
        )
    }

    /// A general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message.into())
    }

    /// A returned row could not be decoded.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DeserializationError,
            format!("Failed to deserialize result: {}", message.into()),
        )
        .with_suggestion("Check that the destination type matches the selected fields")
    }

    /// Fold several failures into one error.
    ///
    /// The code of the first failure is kept, every message is listed in
    /// [`ErrorContext::related`] and joined into the message.
    pub fn aggregate(scope: &str, errors: Vec<String>, code: ErrorCode) -> Self {
        let mut err = Self::new(code, format!("[{}]\n{}", scope, errors.join("\n")));
        err.context.related = errors;
        err
    }

    // ============== Error Checks ==============

    /// Check if the alias was not configured.
    pub fn is_not_configured(&self) -> bool {
        self.code == ErrorCode::NotConfigured
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConnectionFailed | ErrorCode::NotConfigured | ErrorCode::ConnectionClosed
        )
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref sql) = self.context.sql {
            let sql_display = if sql.chars().count() > 200 {
                format!("{}...", sql.chars().take(200).collect::<String>())
            } else {
                sql.clone()
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}
