//! Recursive-descent rule parser
//!
//! Grammar:
//!
//! ```text
//! expression := term ( ('AND' | 'OR') term )*
//! term       := '(' expression ')' | operand
//! operand    := ATTRIBUTE RELOP VALUE
//! ```
//!
//! AND and OR share one precedence level and fold strictly left to right:
//! `a AND b OR c` is `(a AND b) OR c`, and `a OR b AND c` is `(a OR b) AND c`.
//! This differs from the usual "AND binds tighter" convention; use
//! parentheses when the other grouping is meant.
//!
//! The lexer has no sign character, so a negative threshold must be quoted:
//! `balance > '-100'`.
//!
//! Parentheses may nest at most [`MAX_NESTING`] levels deep. Long flat
//! chains are parsed in a loop and have no such limit.

use crate::error::{Result, RuleError};
use crate::rule::ast::{AstNode, Operand, RelationalOperator};
use crate::rule::tokenizer::{tokenize, Token};

/// Deepest parenthesis nesting a rule may use
pub const MAX_NESTING: usize = 256;

/// Parse a rule string into an AST
pub fn parse_rule(rule: &str) -> Result<AstNode> {
    let tokens = tokenize(rule);
    if tokens.is_empty() {
        return Err(RuleError::MalformedRule("empty rule".to_string()));
    }

    let mut parser = Parser::new(&tokens);
    let ast = parser.expression()?;

    if let Some(extra) = parser.peek() {
        return Err(RuleError::MalformedRule(format!(
            "unexpected '{}' after complete expression",
            extra
        )));
    }

    Ok(ast)
}

/// Cursor over one token sequence, owned by a single parse call
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Open parentheses enclosing the current position
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Consume the next token; running out is a malformed rule
    fn advance(&mut self, expected: &str) -> Result<&'a Token> {
        let token = self.tokens.get(self.pos).ok_or_else(|| {
            RuleError::MalformedRule(format!("expected {} but the rule ended", expected))
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn expression(&mut self) -> Result<AstNode> {
        let mut left = self.term()?;

        while let Some(Token::Keyword(operator)) = self.peek() {
            self.pos += 1;
            let right = self.term()?;
            left = AstNode::join(*operator, left, right);
        }

        Ok(left)
    }

    fn term(&mut self) -> Result<AstNode> {
        if let Some(Token::OpenParen) = self.peek() {
            if self.depth == MAX_NESTING {
                return Err(RuleError::MalformedRule("nesting too deep".to_string()));
            }
            self.pos += 1;
            self.depth += 1;
            let inner = self.expression()?;
            // Closing token is skipped without checking it is ')'
            self.advance("closing parenthesis")?;
            self.depth -= 1;
            return Ok(inner);
        }

        self.operand()
    }

    fn operand(&mut self) -> Result<AstNode> {
        let attribute = match self.advance("attribute")? {
            Token::Word(text) | Token::Integer(text) => text.clone(),
            other => {
                return Err(RuleError::MalformedRule(format!(
                    "expected attribute, found '{}'",
                    other
                )))
            }
        };

        let operator = match self.advance("comparison operator")? {
            Token::Comparison(text) => text.parse::<RelationalOperator>()?,
            other => {
                return Err(RuleError::MalformedRule(format!(
                    "expected comparison operator after '{}', found '{}'",
                    attribute, other
                )))
            }
        };

        let value = match self.advance("value")? {
            Token::Word(text) | Token::Integer(text) => text.clone(),
            Token::Quoted(text) => strip_quotes(text).to_string(),
            other => {
                return Err(RuleError::MalformedRule(format!(
                    "expected value after '{} {}', found '{}'",
                    attribute, operator, other
                )))
            }
        };

        Ok(AstNode::Operand(Operand {
            attribute,
            operator,
            value,
        }))
    }
}

/// Remove one layer of surrounding single quotes
fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(text)
}
