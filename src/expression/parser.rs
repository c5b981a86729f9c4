//! Recursive-descent parser for boolean/comparison expressions.
//!
//! One parser builds a tagged [`ExprNode`] tree, walked separately by the
//! interpreter ([`eval`](crate::expression::eval)) and the code generator
//! ([`code`](crate::expression::code)). Parsing levels, weakest binding
//! first:
//!
//! ```text
//! parse_or        "||" / "or"
//!   parse_and     "&&" / "and"
//!     parse_compare   == === != !== <= >= < > %
//!       parse_not     "!"
//!         parse_bracket   "(" ... ")"
//!           parse_string  quoted strings, whitespace preserved
//!             parse_term  context keys, numbers, booleans, bare strings
//! ```
//!
//! Malformed input degrades silently: unknown tokens become terms, the
//! cursor runs to the end of input, and evaluation falls through the atomic
//! term resolution order.

use serde::{Deserialize, Serialize};

use super::lexer::Lexer;

/// Parsed expression tree. Terms stay unclassified ([`ExprNode::Word`])
/// because their meaning depends on the evaluation context.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    Or(Box<ExprNode>, Box<ExprNode>),
    And(Box<ExprNode>, Box<ExprNode>),
    Compare(Box<ExprNode>, Comparator, Box<ExprNode>),
    Not(Box<ExprNode>),
    /// A quoted string literal, quotes removed, inner whitespace preserved.
    Quoted(String),
    /// An unresolved atomic term: context key, brace-wrapped reference,
    /// number, boolean keyword or bare string.
    Word(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Eq,
    Identical,
    NotEq,
    NotIdentical,
    Le,
    Ge,
    Lt,
    Gt,
    /// Modulo participates in the comparator tier of the grammar.
    Modulo,
}

impl Comparator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Comparator::Eq),
            "===" => Some(Comparator::Identical),
            "!=" => Some(Comparator::NotEq),
            "!==" => Some(Comparator::NotIdentical),
            "<=" => Some(Comparator::Le),
            ">=" => Some(Comparator::Ge),
            "<" => Some(Comparator::Lt),
            ">" => Some(Comparator::Gt),
            "%" => Some(Comparator::Modulo),
            _ => None,
        }
    }
}

/// Parse an expression string into an [`ExprNode`] tree.
pub fn parse(expression: &str) -> ExprNode {
    let mut lexer = Lexer::new(expression);
    parse_or(&mut lexer)
}

fn parse_or(lexer: &mut Lexer<'_>) -> ExprNode {
    let mut x = parse_and(lexer);
    while let Some(token) = lexer.peek() {
        let lowered = token.text.to_ascii_lowercase();
        if lowered != "||" && lowered != "or" {
            break;
        }
        lexer.consume(&token);
        let y = parse_and(lexer);
        x = ExprNode::Or(Box::new(x), Box::new(y));
    }
    x
}

fn parse_and(lexer: &mut Lexer<'_>) -> ExprNode {
    let mut x = parse_compare(lexer);
    while let Some(token) = lexer.peek() {
        let lowered = token.text.to_ascii_lowercase();
        if lowered != "&&" && lowered != "and" {
            break;
        }
        lexer.consume(&token);
        let y = parse_compare(lexer);
        x = ExprNode::And(Box::new(x), Box::new(y));
    }
    x
}

fn parse_compare(lexer: &mut Lexer<'_>) -> ExprNode {
    let mut x = parse_not(lexer);
    while let Some(token) = lexer.peek() {
        let Some(comparator) = Comparator::from_token(token.text) else {
            break;
        };
        lexer.consume(&token);
        let y = parse_not(lexer);
        x = ExprNode::Compare(Box::new(x), comparator, Box::new(y));
    }
    x
}

fn parse_not(lexer: &mut Lexer<'_>) -> ExprNode {
    if let Some(token) = lexer.peek()
        && token.text == "!"
    {
        lexer.consume(&token);
        let x = parse_not(lexer);
        return ExprNode::Not(Box::new(x));
    }
    parse_bracket(lexer)
}

fn parse_bracket(lexer: &mut Lexer<'_>) -> ExprNode {
    if let Some(token) = lexer.peek()
        && token.text == "("
    {
        lexer.consume(&token);
        let x = parse_or(lexer);
        if let Some(closing) = lexer.peek()
            && closing.text == ")"
        {
            lexer.consume(&closing);
        }
        return x;
    }
    parse_string(lexer)
}

fn parse_string(lexer: &mut Lexer<'_>) -> ExprNode {
    if let Some(token) = lexer.peek()
        && (token.text == "'" || token.text == "\"")
    {
        let quote = if token.text == "'" { '\'' } else { '"' };
        lexer.consume(&token);
        let content = lexer.read_quoted(quote);
        return ExprNode::Quoted(content);
    }
    parse_term(lexer)
}

fn parse_term(lexer: &mut Lexer<'_>) -> ExprNode {
    match lexer.peek() {
        Some(token) => {
            lexer.consume(&token);
            ExprNode::Word(token.text.to_string())
        }
        // exhausted input: an empty term, falsy under every resolution rule
        None => ExprNode::Word(String::new()),
    }
}
