//! Data context module
//!
//! A data context maps attribute names to the values a rule is evaluated
//! against. Absent attributes read as [`Value::Missing`].

mod value;

pub use value::*;

use crate::error::{Result, RuleError};
use ahash::AHashMap;
use serde::Deserialize;

static MISSING: Value = Value::Missing;

/// Attribute values supplied at evaluation time
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct DataContext {
    values: AHashMap<String, Value>,
}

impl DataContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: AHashMap::with_capacity(capacity),
        }
    }

    /// Set an attribute, returning the previous value if any
    pub fn insert(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(attribute.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(attribute, value);
        self
    }

    /// Look up an attribute; absent keys yield `Value::Missing`
    #[inline]
    pub fn get(&self, attribute: &str) -> &Value {
        self.values.get(attribute).unwrap_or(&MISSING)
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.values.contains_key(attribute)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Decode a context from a JSON object such as `{"age": 35, "department": "Sales"}`
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }
}

impl TryFrom<serde_json::Value> for DataContext {
    type Error = RuleError;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(RuleError::InvalidContext(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl<K, V> FromIterator<(K, V)> for DataContext
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = DataContext::new();
        for (attribute, value) in iter {
            context.insert(attribute, value);
        }
        context
    }
}
