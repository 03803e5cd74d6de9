//! Python bindings via PyO3
//!
//! Exposes parsing, combination and evaluation to a Python host (the HTTP
//! layer), plus a process-wide rule book for hosts that keep rules in
//! memory.

use crate::config::{deserialize_context, deserialize_rule_set};
use crate::rule::{combine_rules, parse_rule, CombinedRule};
use crate::rulebook::RuleBook;
use once_cell::sync::Lazy;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use tracing::info;

/// Global rule book shared by every call in the process
static RULE_BOOK: Lazy<RuleBook> = Lazy::new(RuleBook::new);

// ============================================================================
// CompiledRule PyClass
// ============================================================================

/// Combined rule held in Rust memory
///
/// Parse once with `combine_rules`, then evaluate against many contexts
/// without re-parsing.
#[pyclass(name = "CompiledRule", frozen)]
pub struct PyCompiledRule {
    inner: CombinedRule,
}

#[pymethods]
impl PyCompiledRule {
    /// Evaluate against a dict of attribute values
    fn evaluate(&self, context: &Bound<'_, PyDict>) -> PyResult<bool> {
        let context = deserialize_context(context)?;
        Ok(self.inner.evaluate(&context))
    }

    /// True when built from an empty rule list
    #[getter]
    fn is_vacuous(&self) -> bool {
        self.inner.is_vacuous()
    }

    /// JSON tree of the combined rule, `null` when vacuous
    fn to_json(&self) -> PyResult<String> {
        Ok(self.inner.to_json()?)
    }

    fn __repr__(&self) -> String {
        format!("CompiledRule({})", self.inner)
    }
}

// ============================================================================
// Python Functions
// ============================================================================

/// Parse a rule string and return its AST as JSON
///
/// # Raises
/// ValueError if the rule is malformed or uses an unsupported operator
#[pyfunction(name = "parse_rule")]
fn py_parse_rule(rule: &str) -> PyResult<String> {
    let ast = parse_rule(rule)?;
    Ok(ast.to_json()?)
}

/// Parse and combine rules with AND
///
/// # Arguments
/// * `rules` - Rule strings, combined in order
#[pyfunction(name = "combine_rules")]
fn py_combine_rules(rules: Vec<String>) -> PyResult<PyCompiledRule> {
    Ok(PyCompiledRule {
        inner: combine_rules(&rules)?,
    })
}

/// Combine rules and evaluate them against a context in one call
///
/// # Arguments
/// * `rules` - Rule strings, combined in order
/// * `context` - Attribute values, e.g. {"age": 35, "department": "Sales"}
#[pyfunction]
fn evaluate(rules: Vec<String>, context: &Bound<'_, PyDict>) -> PyResult<bool> {
    let context = deserialize_context(context)?;
    let combined = combine_rules(&rules)?;
    Ok(combined.evaluate(&context))
}

/// Combine and evaluate rules asynchronously
///
/// Parsing and evaluation run on Tokio's blocking pool so the asyncio event
/// loop stays responsive for large rule sets.
///
/// # Example (Python)
/// ```python
/// ok = await evaluate_async(["age > 30"], {"age": 35})
/// ```
#[pyfunction]
fn evaluate_async<'py>(
    py: Python<'py>,
    rules: Vec<String>,
    context: &Bound<'py, PyDict>,
) -> PyResult<Bound<'py, PyAny>> {
    // Convert before leaving the GIL-bound world
    let context = deserialize_context(context)?;

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let verdict = tokio::task::spawn_blocking(move || {
            let combined = combine_rules(&rules)?;
            Ok::<bool, PyErr>(combined.evaluate(&context))
        })
        .await
        .map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Evaluation task panicked: {}",
                e
            ))
        })??;

        Ok(verdict)
    })
}

/// Store a rule in the global rule book and return its id
#[pyfunction]
fn add_rule(rule: &str) -> PyResult<u64> {
    Ok(RULE_BOOK.add(rule)?)
}

/// List stored rules as (id, rule_string) pairs in insertion order
#[pyfunction]
fn list_rules() -> Vec<(u64, String)> {
    RULE_BOOK
        .list()
        .into_iter()
        .map(|r| (r.id, r.rule_string))
        .collect()
}

/// Remove a stored rule
///
/// # Raises
/// KeyError if no rule has this id
#[pyfunction]
fn remove_rule(id: u64) -> PyResult<()> {
    Ok(RULE_BOOK.remove(id)?)
}

/// Load rules from a config dict/object with a `rules` list into the global
/// rule book, returning the new ids
///
/// Rules before the first malformed one stay stored.
#[pyfunction]
fn load_rules(config: &Bound<'_, PyAny>) -> PyResult<Vec<u64>> {
    let config = deserialize_rule_set(config)?;
    let ids = config
        .rules
        .iter()
        .map(|rule| RULE_BOOK.add(rule))
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = ids.len(), "rules loaded");
    Ok(ids)
}

/// Evaluate every rule in the global rule book; true when the book is empty
#[pyfunction]
fn evaluate_rule_book(context: &Bound<'_, PyDict>) -> PyResult<bool> {
    let context = deserialize_context(context)?;
    Ok(RULE_BOOK.evaluate(&context))
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn rule_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_parse_rule, m)?)?;
    m.add_function(wrap_pyfunction!(py_combine_rules, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_async, m)?)?;
    m.add_function(wrap_pyfunction!(add_rule, m)?)?;
    m.add_function(wrap_pyfunction!(list_rules, m)?)?;
    m.add_function(wrap_pyfunction!(remove_rule, m)?)?;
    m.add_function(wrap_pyfunction!(load_rules, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule_book, m)?)?;
    m.add_class::<PyCompiledRule>()?;
    Ok(())
}
