//! Rule string tokenizer
//!
//! The lexer is permissive: characters that belong to no token (stray
//! punctuation, whitespace, an unterminated quote) are skipped rather than
//! reported.

use crate::rule::ast::LogicalOperator;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Alternatives are tried in order at each position, first match wins
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(|\)|[A-Za-z0-9_]+|[<>=]+|'[^']*'").expect("valid token pattern")
});

/// Lexical token of a rule string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    OpenParen,
    CloseParen,
    /// `AND` / `OR`, case-sensitive
    Keyword(LogicalOperator),
    /// Word made only of ASCII digits
    Integer(String),
    /// Identifier or bare word
    Word(String),
    /// Run of `<`, `>` and `=` characters
    Comparison(String),
    /// Single-quoted literal, quotes included
    Quoted(String),
}

impl Token {
    fn classify(text: &str) -> Token {
        match text {
            "(" => Token::OpenParen,
            ")" => Token::CloseParen,
            "AND" => Token::Keyword(LogicalOperator::And),
            "OR" => Token::Keyword(LogicalOperator::Or),
            _ if text.starts_with('\'') => Token::Quoted(text.to_string()),
            _ if text.starts_with(['<', '>', '=']) => Token::Comparison(text.to_string()),
            _ if text.bytes().all(|b| b.is_ascii_digit()) => Token::Integer(text.to_string()),
            _ => Token::Word(text.to_string()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::Keyword(op) => write!(f, "{}", op),
            Token::Integer(text)
            | Token::Word(text)
            | Token::Comparison(text)
            | Token::Quoted(text) => f.write_str(text),
        }
    }
}

/// Split a rule string into tokens, left to right
pub fn tokenize(rule: &str) -> Vec<Token> {
    TOKEN_PATTERN
        .find_iter(rule)
        .map(|m| Token::classify(m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple_operand() {
        assert_eq!(
            tokenize("age > 30"),
            vec![
                Token::Word("age".to_string()),
                Token::Comparison(">".to_string()),
                Token::Integer("30".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_without_spaces() {
        assert_eq!(tokenize("age>30"), tokenize("age > 30"));
    }

    #[test]
    fn test_tokenize_keywords_and_parens() {
        let tokens = tokenize("(a > 1 OR b < 2) AND c = 'x'");
        assert_eq!(tokens.len(), 13);
        assert_eq!(tokens[0], Token::OpenParen);
        assert_eq!(tokens[4], Token::Keyword(LogicalOperator::Or));
        assert_eq!(tokens[8], Token::CloseParen);
        assert_eq!(tokens[9], Token::Keyword(LogicalOperator::And));
        assert_eq!(tokens[12], Token::Quoted("'x'".to_string()));
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(tokenize("and"), vec![Token::Word("and".to_string())]);
        assert_eq!(tokenize("ORDER"), vec![Token::Word("ORDER".to_string())]);
    }

    #[test]
    fn test_quoted_string_keeps_spaces() {
        assert_eq!(
            tokenize("city = 'New York'")[2],
            Token::Quoted("'New York'".to_string())
        );
    }

    #[test]
    fn test_multi_character_comparison() {
        assert_eq!(
            tokenize("age >= 30")[1],
            Token::Comparison(">=".to_string())
        );
        assert_eq!(tokenize("a<>b")[1], Token::Comparison("<>".to_string()));
    }

    #[test]
    fn test_stray_characters_dropped() {
        assert_eq!(tokenize("age > 30;!"), tokenize("age > 30"));
        assert_eq!(tokenize("a, b"), vec![
            Token::Word("a".to_string()),
            Token::Word("b".to_string()),
        ]);
    }

    #[test]
    fn test_sign_is_not_a_token() {
        // "-5" lexes as "5"; negative thresholds need quoting
        assert_eq!(tokenize("t > -5"), tokenize("t > 5"));
        assert_eq!(tokenize("t > '-5'")[2], Token::Quoted("'-5'".to_string()));
    }

    #[test]
    fn test_unterminated_quote_dropped() {
        assert_eq!(
            tokenize("name = 'Bob"),
            vec![
                Token::Word("name".to_string()),
                Token::Comparison("=".to_string()),
                Token::Word("Bob".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
    }
}
