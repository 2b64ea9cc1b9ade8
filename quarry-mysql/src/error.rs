//! Error types for the MySQL driver and configuration loading.

use std::fmt;

use quarry_query::error::QueryError;

/// Failures raised below the driver seam before they are folded into [`QueryError`].
#[derive(Debug)]
pub enum MysqlError {
    /// MySQL driver error.
    Mysql(mysql_async::Error),
    /// Malformed connection URL.
    Url(url::ParseError),
    /// Invalid configuration value.
    Config(String),
    /// TOML configuration could not be parsed.
    Toml(toml::de::Error),
    /// Configuration file could not be read.
    Io(std::io::Error),
}

impl MysqlError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for failures that happened while reaching the server.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::Mysql(mysql_async::Error::Io(_)) | Self::Mysql(mysql_async::Error::Driver(_))
        )
    }
}

impl fmt::Display for MysqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mysql(e) => write!(f, "MySQL error: {}", e),
            Self::Url(e) => write!(f, "Invalid connection URL: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Toml(e) => write!(f, "Invalid TOML configuration: {}", e),
            Self::Io(e) => write!(f, "Could not read configuration: {}", e),
        }
    }
}

impl std::error::Error for MysqlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mysql(e) => Some(e),
            Self::Url(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Config(_) => None,
        }
    }
}

impl From<mysql_async::Error> for MysqlError {
    fn from(err: mysql_async::Error) -> Self {
        Self::Mysql(err)
    }
}

impl From<url::ParseError> for MysqlError {
    fn from(err: url::ParseError) -> Self {
        Self::Url(err)
    }
}

impl From<toml::de::Error> for MysqlError {
    fn from(err: toml::de::Error) -> Self {
        Self::Toml(err)
    }
}

impl From<std::io::Error> for MysqlError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<MysqlError> for QueryError {
    fn from(err: MysqlError) -> Self {
        let message = err.to_string();
        match err {
            e @ MysqlError::Mysql(_) if e.is_connection() => QueryError::connection(message),
            MysqlError::Mysql(_) => QueryError::database(message),
            MysqlError::Url(_) | MysqlError::Config(_) | MysqlError::Toml(_) | MysqlError::Io(_) => {
                QueryError::invalid_configuration(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_query::ErrorCode;

    #[test]
    fn test_error_display() {
        let err = MysqlError::config("max_idle exceeds max_open");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("max_idle"));
    }

    #[test]
    fn test_error_conversion() {
        let err: QueryError = MysqlError::config("bad").into();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);

        let parse = url::Url::parse("not a url").unwrap_err();
        let err: QueryError = MysqlError::from(parse).into();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    }
}
