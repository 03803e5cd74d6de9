//! Configuration module for rule sets and request bodies
//!
//! JSON documents are decoded with serde; with the `python` feature the same
//! structures can also be read from Python dicts.

mod request;
mod rule_set;

pub use request::*;
pub use rule_set::*;

#[cfg(feature = "python")]
pub use self::python::*;

#[cfg(feature = "python")]
mod python {
    use super::RuleSetConfig;
    use crate::context::{DataContext, Value};
    use crate::error::RuleError;
    use pyo3::prelude::*;
    use pyo3::types::{PyBool, PyDict};

    /// Helper to get attribute from either dict or object
    fn get_attr_opt<'py>(obj: &Bound<'py, PyAny>, name: &str) -> Option<Bound<'py, PyAny>> {
        if let Ok(dict) = obj.downcast::<PyDict>() {
            dict.get_item(name).ok().flatten()
        } else {
            obj.getattr(name).ok()
        }
    }

    /// Deserialize a data context from a Python dict
    ///
    /// Expected format: {attribute: value, ...} with str keys. Numbers and
    /// strings carry over, bools become 1/0, anything else reads as missing.
    pub fn deserialize_context(dict: &Bound<'_, PyDict>) -> PyResult<DataContext> {
        let mut context = DataContext::with_capacity(dict.len());

        for (key, value) in dict.iter() {
            let attribute: String = key.extract().map_err(|_| {
                RuleError::InvalidContext(format!("attribute names must be str, got {}", key))
            })?;
            context.insert(attribute, extract_value(&value));
        }

        Ok(context)
    }

    fn extract_value(obj: &Bound<'_, PyAny>) -> Value {
        if obj.is_none() {
            Value::Missing
        } else if let Ok(flag) = obj.downcast::<PyBool>() {
            Value::Number(if flag.is_true() { 1.0 } else { 0.0 })
        } else if let Ok(n) = obj.extract::<f64>() {
            Value::Number(n)
        } else if let Ok(s) = obj.extract::<String>() {
            Value::Text(s)
        } else {
            Value::Missing
        }
    }

    /// Deserialize a rule set from a Python dict or object with a `rules` list
    pub fn deserialize_rule_set(obj: &Bound<'_, PyAny>) -> PyResult<RuleSetConfig> {
        let rules: Vec<String> = match get_attr_opt(obj, "rules") {
            Some(list) if !list.is_none() => list.extract()?,
            _ => Vec::new(),
        };
        Ok(RuleSetConfig { rules })
    }
}
