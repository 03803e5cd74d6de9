//! Ordered registry of compiled rules

use crate::config::RuleSetConfig;
use crate::context::DataContext;
use crate::error::{Result, RuleError};
use crate::rule::{combine_asts, evaluate_rule, parse_rule, AstNode, CombinedRule};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// A rule as stored in the book
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRule {
    pub id: u64,
    pub rule_string: String,
    #[serde(skip)]
    pub ast: AstNode,
}

#[derive(Debug)]
struct BookState {
    next_id: u64,
    rules: Vec<StoredRule>,
}

impl Default for BookState {
    fn default() -> Self {
        Self {
            next_id: 1,
            rules: Vec::new(),
        }
    }
}

/// Thread-safe rule registry
///
/// Rules are parsed once when added and kept in insertion order; evaluation
/// joins all of them with AND in that order. Ids start at 1 and are never
/// reused, even after removal.
#[derive(Debug, Default)]
pub struct RuleBook {
    state: RwLock<BookState>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from a rule set, failing on the first malformed rule
    pub fn from_config(config: &RuleSetConfig) -> Result<Self> {
        let book = Self::new();
        for rule in &config.rules {
            book.add(rule)?;
        }
        Ok(book)
    }

    /// Parse and store a rule, returning its id
    ///
    /// A rule that does not parse is rejected and nothing is stored.
    #[instrument(skip(self))]
    pub fn add(&self, rule_string: &str) -> Result<u64> {
        let ast = parse_rule(rule_string).map_err(|e| {
            warn!(error = %e, "rejected rule");
            e
        })?;

        let mut state = self.state.write();
        let id = state.next_id;
        state.next_id += 1;
        state.rules.push(StoredRule {
            id,
            rule_string: rule_string.to_string(),
            ast,
        });

        info!(rule_id = id, "rule added");
        Ok(id)
    }

    /// Remove a rule by id
    #[instrument(skip(self))]
    pub fn remove(&self, id: u64) -> Result<()> {
        let mut state = self.state.write();
        match state.rules.iter().position(|r| r.id == id) {
            Some(index) => {
                state.rules.remove(index);
                info!(rule_id = id, "rule removed");
                Ok(())
            }
            None => {
                warn!(rule_id = id, "remove of unknown rule");
                Err(RuleError::RuleNotFound(id))
            }
        }
    }

    pub fn get(&self, id: u64) -> Option<StoredRule> {
        self.state.read().rules.iter().find(|r| r.id == id).cloned()
    }

    /// All rules in insertion order
    pub fn list(&self) -> Vec<StoredRule> {
        self.state.read().rules.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().rules.is_empty()
    }

    /// Drop every rule; ids keep counting from where they were
    pub fn clear(&self) {
        let mut state = self.state.write();
        let dropped = state.rules.len();
        state.rules.clear();
        info!(dropped, "rule book cleared");
    }

    /// All stored rules joined with AND, as a standalone copy
    pub fn combined(&self) -> CombinedRule {
        let state = self.state.read();
        combine_asts(state.rules.iter().map(|r| r.ast.clone()))
    }

    /// Evaluate every stored rule against a context; an empty book holds
    ///
    /// Rules are evaluated in place under the read lock, in insertion order,
    /// and every rule runs even after one has failed. The verdict equals
    /// evaluating [`RuleBook::combined`].
    pub fn evaluate(&self, context: &DataContext) -> bool {
        let state = self.state.read();
        let verdict = state
            .rules
            .iter()
            .map(|r| evaluate_rule(&r.ast, context))
            .fold(true, |acc, holds| acc && holds);
        debug!(rules = state.rules.len(), verdict, "rule book evaluated");
        verdict
    }
}
