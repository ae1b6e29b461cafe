use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Open tag map carried by every record and function.
pub type Tags = BTreeMap<String, Value>;

/// Value of a free-form tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Tags>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Loose equality against user input, as typed on a command line.
    /// Lists never match.
    pub fn matches(&self, needle: &str) -> bool {
        match self {
            Value::List(_) => false,
            Value::Int(v) => needle.trim().parse::<i64>().map(|n| n == *v).unwrap_or(false),
            other => other.to_string() == needle,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::List(items) => write!(f, "[{} items]", items.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}
