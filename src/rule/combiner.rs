//! Combining several rules into one tree

use crate::context::DataContext;
use crate::error::Result;
use crate::rule::ast::AstNode;
use crate::rule::evaluator::evaluate_rule;
use crate::rule::parser::parse_rule;
use serde::Serialize;
use std::fmt;

/// Result of combining zero or more rules with AND
///
/// With no rules there is no tree and evaluation is vacuously true.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct CombinedRule {
    root: Option<AstNode>,
}

impl CombinedRule {
    /// The rule that holds for every context
    pub fn always() -> Self {
        Self { root: None }
    }

    pub fn root(&self) -> Option<&AstNode> {
        self.root.as_ref()
    }

    pub fn into_root(self) -> Option<AstNode> {
        self.root
    }

    /// True when no rules were combined
    pub fn is_vacuous(&self) -> bool {
        self.root.is_none()
    }

    pub fn evaluate(&self, context: &DataContext) -> bool {
        self.root
            .as_ref()
            .map_or(true, |root| evaluate_rule(root, context))
    }

    /// JSON tree of the combined rule, `null` when vacuous
    ///
    /// Fails like [`AstNode::to_json`] for trees too deep to encode.
    pub fn to_json(&self) -> Result<String> {
        match &self.root {
            Some(root) => root.to_json(),
            None => Ok("null".to_string()),
        }
    }
}

impl From<AstNode> for CombinedRule {
    fn from(root: AstNode) -> Self {
        Self { root: Some(root) }
    }
}

impl fmt::Display for CombinedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => write!(f, "{}", root),
            None => f.write_str("<always>"),
        }
    }
}

/// Parse every rule and join them with AND, in order, folding left
///
/// A single rule comes back unchanged; an empty input gives
/// [`CombinedRule::always`]. The first rule that fails to parse aborts the
/// whole combination.
pub fn combine_rules<I, S>(rules: I) -> Result<CombinedRule>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parsed = rules
        .into_iter()
        .map(|rule| parse_rule(rule.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    Ok(combine_asts(parsed))
}

/// Join already parsed trees with AND, folding left
pub fn combine_asts<I>(asts: I) -> CombinedRule
where
    I: IntoIterator<Item = AstNode>,
{
    let root = asts
        .into_iter()
        .reduce(|combined, next| AstNode::and(combined, next));

    CombinedRule { root }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use crate::rule::ast::{LogicalOperator, RelationalOperator};

    #[test]
    fn test_single_rule_not_wrapped() {
        let combined = combine_rules(["age > 30"]).unwrap();
        assert_eq!(combined.root(), Some(&parse_rule("age > 30").unwrap()));
    }

    #[test]
    fn test_empty_is_vacuous_true() {
        let combined = combine_rules(Vec::<String>::new()).unwrap();
        assert!(combined.is_vacuous());
        assert!(combined.evaluate(&DataContext::new()));
        assert!(combined.evaluate(&DataContext::new().with("age", 1)));
        assert_eq!(combined, CombinedRule::always());
    }

    #[test]
    fn test_folds_left_in_order() {
        let combined = combine_rules(["a > 1", "b > 1", "c > 1"]).unwrap();
        let expected = AstNode::and(
            AstNode::and(
                AstNode::operand("a", RelationalOperator::Greater, "1"),
                AstNode::operand("b", RelationalOperator::Greater, "1"),
            ),
            AstNode::operand("c", RelationalOperator::Greater, "1"),
        );
        assert_eq!(combined.into_root(), Some(expected));
    }

    #[test]
    fn test_rules_keep_their_own_grouping() {
        // Each rule is parsed on its own, so an OR inside one rule never
        // leaks into the AND chain
        let combined = combine_rules(["a > 1 OR b > 1", "c > 1"]).unwrap();
        match combined.root() {
            Some(AstNode::Operator {
                operator: LogicalOperator::And,
                left,
                ..
            }) => assert!(matches!(
                **left,
                AstNode::Operator {
                    operator: LogicalOperator::Or,
                    ..
                }
            )),
            other => panic!("Expected AND at the root, got {:?}", other),
        }

        let context = DataContext::new().with("a", 2).with("c", 0);
        assert!(!combined.evaluate(&context));
    }

    #[test]
    fn test_parse_failure_propagates() {
        let result = combine_rules(["age > 30", "salary >", "department = 'Sales'"]);
        assert!(matches!(result, Err(RuleError::MalformedRule(_))));
    }

    #[test]
    fn test_evaluate_combined() {
        let combined = combine_rules(["age > 30", "department = 'Sales'"]).unwrap();
        let context = DataContext::new().with("age", 35).with("department", "Sales");
        assert!(combined.evaluate(&context));

        let context = DataContext::new().with("age", 35).with("department", "Marketing");
        assert!(!combined.evaluate(&context));
    }

    #[test]
    fn test_serialize_vacuous_as_null() {
        assert_eq!(serde_json::to_string(&CombinedRule::always()).unwrap(), "null");
    }

    #[test]
    fn test_to_json() {
        assert_eq!(CombinedRule::always().to_json().unwrap(), "null");

        let combined = combine_rules(["a > 1", "b > 1"]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&combined.to_json().unwrap()).unwrap();
        assert_eq!(json["operator"], "AND");

        let many = combine_rules(vec!["a > 1"; 1_000]).unwrap();
        assert!(matches!(many.to_json(), Err(RuleError::MalformedRule(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(CombinedRule::always().to_string(), "<always>");
        let combined = combine_rules(["a > 1", "b = 'x y'"]).unwrap();
        assert_eq!(combined.to_string(), "(a > 1 AND b = 'x y')");
    }
}
