//! Error types for the rule engine

use thiserror::Error;

/// Main error type for the rule engine
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Malformed rule: {0}")]
    MalformedRule(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid context: {0}")]
    InvalidContext(String),

    #[error("Rule not found: {0}")]
    RuleNotFound(u64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<RuleError> for pyo3::PyErr {
    fn from(err: RuleError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyValueError};

        match err {
            RuleError::MalformedRule(msg) => {
                PyValueError::new_err(format!("Malformed rule: {}", msg))
            }
            RuleError::UnsupportedOperator(op) => {
                PyValueError::new_err(format!("Unsupported operator: {}", op))
            }
            RuleError::InvalidContext(msg) => {
                PyValueError::new_err(format!("Invalid context: {}", msg))
            }
            RuleError::RuleNotFound(id) => PyKeyError::new_err(format!("Rule not found: {}", id)),
            RuleError::Json(e) => PyValueError::new_err(format!("JSON error: {}", e)),
        }
    }
}

/// Result type alias for the rule engine
pub type Result<T> = std::result::Result<T, RuleError>;
