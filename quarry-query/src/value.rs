//! Positional parameter values bound to `?` placeholders.

use serde::{Deserialize, Serialize};

/// A value bound to one positional placeholder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// SQL NULL.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value.
    UInt(u64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// JSON document, bound as its serialized text.
    Json(serde_json::Value),
}

impl QueryValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for QueryValue {
                fn from(v: $t) -> Self {
                    Self::Int(v as i64)
                }
            }
        )*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for QueryValue {
                fn from(v: $t) -> Self {
                    Self::UInt(v as u64)
                }
            }
        )*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for QueryValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<&String> for QueryValue {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl From<Vec<u8>> for QueryValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<serde_json::Value> for QueryValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            other => Self::Json(other),
        }
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
