//! Rule set configuration structures

use crate::error::Result;
use serde::Deserialize;

/// Rules to preload into a rule book
///
/// ```json
/// {"rules": ["age > 30", "department = 'Sales'"]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleSetConfig {
    #[serde(default)]
    pub rules: Vec<String>,
}

impl RuleSetConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
