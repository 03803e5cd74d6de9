//! Rule Engine Core - boolean rule expressions over attribute data
//!
//! This crate parses rule strings such as
//! `(age > 30 OR age < 18) AND department = 'Sales'` into an AST, combines
//! several rules with AND, and evaluates the result against a data context.
//! Python bindings are available behind the `python` feature.
//!
//! ```
//! use rule_engine_core::{combine_rules, DataContext};
//!
//! let rule = combine_rules(["age > 30", "department = 'Sales'"]).unwrap();
//! let context = DataContext::new().with("age", 35).with("department", "Sales");
//! assert!(rule.evaluate(&context));
//! ```
//!
//! AND and OR have equal precedence and group left to right, so
//! `a > 1 AND b > 1 OR c > 1` means `(a > 1 AND b > 1) OR c > 1`.

pub mod config;
pub mod context;
pub mod error;
pub mod rule;
pub mod rulebook;

#[cfg(feature = "python")]
mod python;

pub use context::{DataContext, Value};
pub use error::{Result, RuleError};
pub use rule::{
    combine_asts, combine_rules, evaluate_rule, parse_rule, AstNode, CombinedRule,
    LogicalOperator, Operand, RelationalOperator,
};
pub use rulebook::{RuleBook, StoredRule};
