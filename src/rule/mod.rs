//! Rule parsing, combination and evaluation module
//!
//! This module turns rule strings like "age > 30 AND department = 'Sales'"
//! into an AST and evaluates it against a DataContext.

mod ast;
pub mod combiner;
mod evaluator;
pub mod parser;
pub mod tokenizer;


pub use ast::*;
pub use combiner::*;
pub use evaluator::*;
pub use parser::*;
