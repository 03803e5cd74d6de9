//! Rule book module
//!
//! Holds the rules a host application has stored and evaluates them as one
//! combined rule.

mod book;

pub use book::*;
