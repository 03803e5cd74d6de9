//! Abstract Syntax Tree for rule expressions
//!
//! The serde representation is the JSON tree exchanged with the HTTP layer:
//!
//! ```json
//! {"type": "operator", "operator": "AND",
//!  "left":  {"type": "operand", "attribute": "age", "operator": ">", "value": "30"},
//!  "right": {"type": "operand", "attribute": "department", "operator": "=", "value": "Sales"}}
//! ```

use crate::error::{Result, RuleError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text that tokenizes as one word
static BARE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex"));

/// Deepest tree `to_json` will encode, in line with serde_json's decode limit
pub const MAX_JSON_DEPTH: usize = 128;

/// AST node for rule expressions
///
/// A flat chain like `a > 1 AND b > 1 AND ...` folds into a left-deep tree
/// as tall as the chain is long, so evaluation, cloning, comparison,
/// rendering and dropping all walk the tree with an explicit stack.
/// `Debug` and serde encoding still recurse; use [`AstNode::to_json`],
/// which refuses trees deeper than [`MAX_JSON_DEPTH`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", try_from = "RawNode")]
pub enum AstNode {
    /// Logical combination of two sub-trees
    Operator {
        operator: LogicalOperator,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    /// Single comparison like "age > 30"
    Operand(Operand),
}

/// Single comparison against a named attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operand {
    pub attribute: String,
    pub operator: RelationalOperator,
    /// Literal text with surrounding quotes removed
    pub value: String,
}

/// Logical operators joining two sub-trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogicalOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

/// Relational operators supported by operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelationalOperator {
    /// Numeric greater than (>)
    #[serde(rename = ">")]
    Greater,
    /// Numeric less than (<)
    #[serde(rename = "<")]
    Less,
    /// Strict textual equality (=)
    #[serde(rename = "=")]
    Equal,
}

impl AstNode {
    /// Build an operand leaf
    pub fn operand(
        attribute: impl Into<String>,
        operator: RelationalOperator,
        value: impl Into<String>,
    ) -> Self {
        AstNode::Operand(Operand {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        })
    }

    /// Join two trees with AND
    pub fn and(left: AstNode, right: AstNode) -> Self {
        Self::join(LogicalOperator::And, left, right)
    }

    /// Join two trees with OR
    pub fn or(left: AstNode, right: AstNode) -> Self {
        Self::join(LogicalOperator::Or, left, right)
    }

    pub fn join(operator: LogicalOperator, left: AstNode, right: AstNode) -> Self {
        AstNode::Operator {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Decode a tree produced elsewhere, e.g. stored by the HTTP layer.
    ///
    /// Operators outside the supported sets are rejected here with
    /// [`RuleError::UnsupportedOperator`], so a decoded tree is always
    /// evaluable. Attributes must be a single non-keyword word and values
    /// must not contain `'`, otherwise [`RuleError::MalformedRule`]; the
    /// parser could not have produced them.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawNode = serde_json::from_str(json)?;
        AstNode::try_from(raw)
    }

    /// Encode the tree in its JSON wire shape
    pub fn to_json(&self) -> Result<String> {
        if self.depth() > MAX_JSON_DEPTH {
            return Err(RuleError::MalformedRule(format!(
                "tree deeper than {} levels cannot be encoded",
                MAX_JSON_DEPTH
            )));
        }
        Ok(serde_json::to_string(self)?)
    }

    /// Number of operand leaves in the tree
    pub fn operand_count(&self) -> usize {
        self.fold(|_| 1, |_, left, right| left + right)
    }

    /// Number of levels, counting a lone operand as one
    pub fn depth(&self) -> usize {
        self.fold(|_| 1, |_, left, right| 1 + left.max(right))
    }

    /// Post-order fold: `leaf` maps each operand, `join` combines the
    /// results of both children. Leaves are visited left to right.
    pub fn fold<'a, T>(
        &'a self,
        mut leaf: impl FnMut(&'a Operand) -> T,
        mut join: impl FnMut(LogicalOperator, T, T) -> T,
    ) -> T {
        enum Step<'n> {
            Visit(&'n AstNode),
            Join(LogicalOperator),
        }

        let mut steps = vec![Step::Visit(self)];
        let mut values: Vec<T> = Vec::new();

        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(AstNode::Operand(operand)) => values.push(leaf(operand)),
                Step::Visit(AstNode::Operator {
                    operator,
                    left,
                    right,
                }) => {
                    steps.push(Step::Join(*operator));
                    steps.push(Step::Visit(right));
                    steps.push(Step::Visit(left));
                }
                Step::Join(operator) => {
                    let right = values.pop();
                    let left = values.pop();
                    match (left, right) {
                        (Some(left), Some(right)) => values.push(join(operator, left, right)),
                        _ => unreachable!("join scheduled before both children"),
                    }
                }
            }
        }

        match values.pop() {
            Some(value) => value,
            None => unreachable!("tree folds to exactly one value"),
        }
    }

    /// Move operator children out into `pending`, leaving empty leaves behind
    fn detach_children(&mut self, pending: &mut Vec<AstNode>) {
        if let AstNode::Operator { left, right, .. } = self {
            for child in [left, right] {
                if matches!(**child, AstNode::Operator { .. }) {
                    pending.push(std::mem::replace(&mut **child, AstNode::empty_leaf()));
                }
            }
        }
    }

    fn empty_leaf() -> Self {
        AstNode::Operand(Operand {
            attribute: String::new(),
            operator: RelationalOperator::Equal,
            value: String::new(),
        })
    }
}

impl Clone for AstNode {
    fn clone(&self) -> Self {
        self.fold(|operand| AstNode::Operand(operand.clone()), AstNode::join)
    }
}

impl PartialEq for AstNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pairs = vec![(self, other)];
        while let Some(pair) = pairs.pop() {
            match pair {
                (AstNode::Operand(a), AstNode::Operand(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (
                    AstNode::Operator {
                        operator: op_a,
                        left: left_a,
                        right: right_a,
                    },
                    AstNode::Operator {
                        operator: op_b,
                        left: left_b,
                        right: right_b,
                    },
                ) => {
                    if op_a != op_b {
                        return false;
                    }
                    pairs.push((&**right_a, &**right_b));
                    pairs.push((&**left_a, &**left_b));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Drop for AstNode {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

impl RelationalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationalOperator::Greater => ">",
            RelationalOperator::Less => "<",
            RelationalOperator::Equal => "=",
        }
    }
}

impl FromStr for LogicalOperator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AND" => Ok(LogicalOperator::And),
            "OR" => Ok(LogicalOperator::Or),
            other => Err(RuleError::UnsupportedOperator(format!(
                "logical operator '{}'",
                other
            ))),
        }
    }
}

impl FromStr for RelationalOperator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ">" => Ok(RelationalOperator::Greater),
            "<" => Ok(RelationalOperator::Less),
            "=" => Ok(RelationalOperator::Equal),
            other => Err(RuleError::UnsupportedOperator(format!(
                "relational operator '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders the tree as a rule string.
///
/// Operator nodes are always parenthesised, so the left-to-right grouping
/// survives a round trip. Values that are not a single word are quoted.
/// Trees from [`crate::parse_rule`] or [`AstNode::from_json`] parse back
/// into the same tree; a hand-built operand whose attribute is not a single
/// word, or whose value contains `'`, does not.
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Piece<'a> {
            Node(&'a AstNode),
            Text(&'static str),
        }

        let mut pieces = vec![Piece::Node(self)];
        while let Some(piece) = pieces.pop() {
            match piece {
                Piece::Text(text) => f.write_str(text)?,
                Piece::Node(AstNode::Operand(operand)) => write!(f, "{}", operand)?,
                Piece::Node(AstNode::Operator {
                    operator,
                    left,
                    right,
                }) => {
                    pieces.push(Piece::Text(")"));
                    pieces.push(Piece::Node(right));
                    pieces.push(Piece::Text(match operator {
                        LogicalOperator::And => " AND ",
                        LogicalOperator::Or => " OR ",
                    }));
                    pieces.push(Piece::Node(left));
                    pieces.push(Piece::Text("("));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if BARE_WORD.is_match(&self.value) && !is_keyword(&self.value) {
            write!(f, "{} {} {}", self.attribute, self.operator, self.value)
        } else {
            write!(f, "{} {} '{}'", self.attribute, self.operator, self.value)
        }
    }
}

// ============================================================================
// Wire decoding
// ============================================================================

/// Untyped mirror of the wire shape; operators are checked on conversion
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawNode {
    Operator {
        operator: String,
        left: Box<RawNode>,
        right: Box<RawNode>,
    },
    Operand {
        attribute: String,
        operator: String,
        value: String,
    },
}

impl TryFrom<RawNode> for AstNode {
    type Error = RuleError;

    fn try_from(raw: RawNode) -> Result<Self> {
        match raw {
            RawNode::Operator {
                operator,
                left,
                right,
            } => Ok(AstNode::join(
                operator.parse()?,
                AstNode::try_from(*left)?,
                AstNode::try_from(*right)?,
            )),
            RawNode::Operand {
                attribute,
                operator,
                value,
            } => {
                if !BARE_WORD.is_match(&attribute) || is_keyword(&attribute) {
                    return Err(RuleError::MalformedRule(format!(
                        "attribute '{}' is not a single word",
                        attribute
                    )));
                }
                if value.contains('\'') {
                    return Err(RuleError::MalformedRule(format!(
                        "value '{}' contains a single quote",
                        value
                    )));
                }
                Ok(AstNode::Operand(Operand {
                    attribute,
                    operator: operator.parse()?,
                    value,
                }))
            }
        }
    }
}

fn is_keyword(text: &str) -> bool {
    text == "AND" || text == "OR"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let ast = AstNode::and(
            AstNode::operand("age", RelationalOperator::Greater, "30"),
            AstNode::operand("department", RelationalOperator::Equal, "Sales"),
        );

        let json: serde_json::Value = serde_json::from_str(&ast.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "operator");
        assert_eq!(json["operator"], "AND");
        assert_eq!(json["left"]["type"], "operand");
        assert_eq!(json["left"]["attribute"], "age");
        assert_eq!(json["left"]["operator"], ">");
        assert_eq!(json["left"]["value"], "30");
        assert_eq!(json["right"]["value"], "Sales");
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"type":"operator","operator":"OR",
            "left":{"type":"operand","attribute":"age","operator":"<","value":"18"},
            "right":{"type":"operand","attribute":"age","operator":">","value":"65"}}"#;

        let ast = AstNode::from_json(json).unwrap();
        assert_eq!(
            ast,
            AstNode::or(
                AstNode::operand("age", RelationalOperator::Less, "18"),
                AstNode::operand("age", RelationalOperator::Greater, "65"),
            )
        );
    }

    #[test]
    fn test_from_json_unsupported_logical_operator() {
        let json = r#"{"type":"operator","operator":"XOR",
            "left":{"type":"operand","attribute":"a","operator":">","value":"1"},
            "right":{"type":"operand","attribute":"b","operator":">","value":"1"}}"#;

        match AstNode::from_json(json) {
            Err(RuleError::UnsupportedOperator(msg)) => assert!(msg.contains("XOR")),
            other => panic!("Expected UnsupportedOperator, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json_unsupported_relational_operator() {
        let json = r#"{"type":"operand","attribute":"age","operator":">=","value":"30"}"#;
        assert!(matches!(
            AstNode::from_json(json),
            Err(RuleError::UnsupportedOperator(_))
        ));
    }

    #[test]
    fn test_deserialize_through_serde() {
        // Embedded trees go through the same operator check
        let ok: AstNode =
            serde_json::from_str(r#"{"type":"operand","attribute":"a","operator":"=","value":"x"}"#)
                .unwrap();
        assert_eq!(ok, AstNode::operand("a", RelationalOperator::Equal, "x"));

        let bad = serde_json::from_str::<AstNode>(
            r#"{"type":"operand","attribute":"a","operator":"!=","value":"x"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_display() {
        let ast = AstNode::or(
            AstNode::and(
                AstNode::operand("age", RelationalOperator::Greater, "30"),
                AstNode::operand("department", RelationalOperator::Equal, "Human Resources"),
            ),
            AstNode::operand("salary", RelationalOperator::Less, "5000"),
        );
        assert_eq!(
            ast.to_string(),
            "((age > 30 AND department = 'Human Resources') OR salary < 5000)"
        );
    }

    #[test]
    fn test_display_quotes_keywords() {
        let ast = AstNode::operand("flag", RelationalOperator::Equal, "OR");
        assert_eq!(ast.to_string(), "flag = 'OR'");
    }

    #[test]
    fn test_from_json_rejects_text_the_parser_cannot_produce() {
        let spaced = r#"{"type":"operand","attribute":"first name","operator":"=","value":"Ann"}"#;
        match AstNode::from_json(spaced) {
            Err(RuleError::MalformedRule(msg)) => assert!(msg.contains("first name")),
            other => panic!("Expected MalformedRule, got {:?}", other),
        }

        let quoted = r#"{"type":"operand","attribute":"surname","operator":"=","value":"O'Brien"}"#;
        assert!(matches!(
            AstNode::from_json(quoted),
            Err(RuleError::MalformedRule(_))
        ));

        let keyword = r#"{"type":"operand","attribute":"OR","operator":"=","value":"x"}"#;
        assert!(matches!(
            AstNode::from_json(keyword),
            Err(RuleError::MalformedRule(_))
        ));
    }

    #[test]
    fn test_decoded_tree_renders_back() {
        let json = r#"{"type":"operator","operator":"AND",
            "left":{"type":"operand","attribute":"name","operator":"=","value":"Mary Ann (jr)"},
            "right":{"type":"operand","attribute":"tier","operator":"=","value":""}}"#;

        let ast = AstNode::from_json(json).unwrap();
        assert_eq!(ast.to_string(), "(name = 'Mary Ann (jr)' AND tier = '')");
        assert_eq!(crate::parse_rule(&ast.to_string()).unwrap(), ast);
    }

    #[test]
    fn test_long_chain_walks_without_recursion() {
        let chain = (1..50_000).fold(
            AstNode::operand("a", RelationalOperator::Greater, "1"),
            |acc, _| AstNode::and(acc, AstNode::operand("a", RelationalOperator::Greater, "1")),
        );

        assert_eq!(chain.operand_count(), 50_000);
        assert_eq!(chain.depth(), 50_000);

        let copy = chain.clone();
        assert!(copy == chain);
        let rendered = chain.to_string();
        assert!(rendered.ends_with("a > 1 AND a > 1) AND a > 1)"));
        assert_eq!(rendered.matches('(').count(), 49_999);
        assert!(matches!(chain.to_json(), Err(RuleError::MalformedRule(_))));

        drop(copy);
        drop(chain);
    }

    #[test]
    fn test_equality_checks_operators_and_shape() {
        let a = AstNode::operand("a", RelationalOperator::Greater, "1");
        let b = AstNode::operand("b", RelationalOperator::Greater, "1");

        assert_eq!(AstNode::and(a.clone(), b.clone()), AstNode::and(a.clone(), b.clone()));
        assert_ne!(AstNode::and(a.clone(), b.clone()), AstNode::or(a.clone(), b.clone()));
        assert_ne!(AstNode::and(a.clone(), b.clone()), AstNode::and(b, a.clone()));
        assert_ne!(AstNode::and(a.clone(), a.clone()), a);
    }

    #[test]
    fn test_depth() {
        let leaf = AstNode::operand("a", RelationalOperator::Greater, "1");
        assert_eq!(leaf.depth(), 1);
        assert_eq!(AstNode::and(leaf.clone(), AstNode::or(leaf.clone(), leaf)).depth(), 3);
    }

    #[test]
    fn test_operand_count() {
        let ast = AstNode::and(
            AstNode::operand("a", RelationalOperator::Greater, "1"),
            AstNode::or(
                AstNode::operand("b", RelationalOperator::Greater, "1"),
                AstNode::operand("c", RelationalOperator::Greater, "1"),
            ),
        );
        assert_eq!(ast.operand_count(), 3);
    }
}
