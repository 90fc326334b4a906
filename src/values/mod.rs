//! The value model.
//!
//! Scalars are plain data. Strings, arrays and objects are lazy: each wraps a
//! queue plus a backing store and materializes on demand, so a consumer can
//! index into an array while its producer is still running.

pub mod composite;
pub mod exception;
pub mod json;
pub mod lazy;
mod order;
mod render;

pub use composite::{JqArray, JqObject, JqString};
pub use exception::Exception;
pub use lazy::Lazy;
pub use render::{quote, Renderer};

use bigdecimal::BigDecimal;
use std::collections::BTreeMap;

/// A jqsh value.
#[derive(Clone)]
pub enum Value {
    Exception(Exception),
    Null,
    Boolean(bool),
    Number(BigDecimal),
    String(JqString),
    Array(JqArray),
    Object(JqObject),
}

/// Value kinds in their fixed sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Exception,
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Exception => "exception",
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Exception(_) => Kind::Exception,
            Value::Null => Kind::Null,
            Value::Boolean(_) => Kind::Boolean,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, Value::Exception(_))
    }

    pub fn as_exception(&self) -> Option<&Exception> {
        match self {
            Value::Exception(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// The full text of a string value.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.text()),
            _ => None,
        }
    }

    pub fn number(n: impl Into<BigDecimal>) -> Self {
        Value::Number(n.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(JqArray::from(items))
    }

    pub fn object(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Object(entries.into_iter().collect())
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(JqString::from(text))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(JqString::from(text))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(BigDecimal::from(n))
    }
}

impl From<Exception> for Value {
    fn from(e: Exception) -> Self {
        Value::Exception(e)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(JqObject::from(map))
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Exception(e) => write!(f, "Exception({})", e.name()),
            other => write!(f, "{}", other),
        }
    }
}
