//! Ternary expressions: `condition ? then : else`.
//!
//! The condition is parsed with the shared recursive-descent parser; the
//! branch operands are quoted literals, context references, or bare words.

use crate::ast::value::Value;
use crate::error::ExpressionError;

use super::code::{self, ExprCode};
use super::eval::{self, ExpressionContext};
use super::parser::{self, ExprNode};

/// A parsed ternary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpression {
    source: String,
    condition: ExprNode,
    then_part: TernaryOperand,
    else_part: TernaryOperand,
}

#[derive(Debug, Clone, PartialEq)]
enum TernaryOperand {
    /// A quoted literal, quotes removed.
    Quoted(String),
    /// A context reference (brace-wrapped or bare) with a literal fallback.
    Word(String),
}

impl TernaryExpression {
    /// Parse `condition ? then : else`.
    ///
    /// The split is quote- and parenthesis-aware. Anything other than
    /// exactly three non-empty parts raises a wrong-arity
    /// [`ExpressionError`].
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let (condition, then_part, else_part) = split_parts(source)?;
        Ok(Self {
            source: source.to_string(),
            condition: parser::parse(condition),
            then_part: Self::operand(then_part),
            else_part: Self::operand(else_part),
        })
    }

    fn operand(part: &str) -> TernaryOperand {
        let trimmed = part.trim();
        for quote in ['\'', '"'] {
            if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
                return TernaryOperand::Quoted(trimmed[1..trimmed.len() - 1].to_string());
            }
        }
        TernaryOperand::Word(
            trimmed
                .trim_start_matches('{')
                .trim_end_matches('}')
                .to_string(),
        )
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate the condition and then only the taken branch.
    pub fn evaluate(&self, context: &ExpressionContext) -> Value {
        let taken = if eval::evaluate(&self.condition, context).is_truthy() {
            &self.then_part
        } else {
            &self.else_part
        };
        match taken {
            TernaryOperand::Quoted(s) => Value::String(s.clone()),
            TernaryOperand::Word(w) => {
                if let Some(v) = context.get(w.as_str()) {
                    return v.clone();
                }
                if let Ok(n) = w.trim().parse::<f64>() {
                    return Value::Number(n);
                }
                Value::String(w.clone())
            }
        }
    }

    pub fn compile(&self) -> ExprCode {
        ExprCode::Ternary {
            condition: Box::new(code::compile(&self.condition)),
            then_branch: Box::new(Self::operand_code(&self.then_part)),
            else_branch: Box::new(Self::operand_code(&self.else_part)),
        }
    }

    fn operand_code(operand: &TernaryOperand) -> ExprCode {
        match operand {
            TernaryOperand::Quoted(s) => ExprCode::Const(Value::String(s.clone())),
            TernaryOperand::Word(w) => ExprCode::OperandWord(w.clone()),
        }
    }
}

/// Split a ternary source into condition, then, else at the first `?` and
/// the first following `:` that sit outside quotes and parentheses.
fn split_parts(source: &str) -> Result<(&str, &str, &str), ExpressionError> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut question = None;
    let mut colon = None;

    let mut chars = source.char_indices();
    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' | '{' => depth += 1,
                ')' | '}' => depth = depth.saturating_sub(1),
                '?' if depth == 0 && question.is_none() => question = Some(i),
                ':' if depth == 0 && question.is_some() && colon.is_none() => colon = Some(i),
                _ => {}
            },
        }
    }

    let parts_found = 1 + question.is_some() as usize + colon.is_some() as usize;
    if parts_found != 3 {
        return Err(ExpressionError::wrong_arity(source, 3, parts_found));
    }
    let q = question.unwrap_or_default();
    let c = colon.unwrap_or_default();
    let condition = source[..q].trim();
    let then_part = source[q + 1..c].trim();
    let else_part = source[c + 1..].trim();
    if condition.is_empty() || then_part.is_empty() || else_part.is_empty() {
        return Err(ExpressionError::wrong_arity(source, 3, parts_found));
    }
    Ok((condition, then_part, else_part))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, entries: &[(&str, Value)]) -> Value {
        let context: ExpressionContext = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        TernaryExpression::parse(source).unwrap().evaluate(&context)
    }

    #[test]
    fn test_branch_selection() {
        assert_eq!(eval("1 ? 2 : 3", &[]), Value::Number(2.0));
        assert_eq!(eval("0 ? 2 : 3", &[]), Value::Number(3.0));
    }

    #[test]
    fn test_quoted_operands_and_conditions() {
        assert_eq!(eval("true ? 'yes' : 'no'", &[]), Value::String("yes".into()));
        assert_eq!(
            eval("('foo' == 'bar') ? 'yes' : 'no'", &[]),
            Value::String("no".into())
        );
        assert_eq!(
            eval("!(true) ? 'yes' : 'no'", &[]),
            Value::String("no".into())
        );
        assert_eq!(
            eval("(true || false) ? 'yes' : 'no'", &[]),
            Value::String("yes".into())
        );
    }

    #[test]
    fn test_variable_operands() {
        let entries = [("foo", Value::String("resolved".into()))];
        assert_eq!(eval("true ? foo : bar", &entries), Value::String("resolved".into()));
        assert_eq!(eval("false ? foo : bar", &entries), Value::String("bar".into()));
        assert_eq!(eval("true ? {foo} : bar", &entries), Value::String("resolved".into()));
    }

    #[test]
    fn test_wrong_arity() {
        let err = TernaryExpression::parse("x ? y").unwrap_err();
        assert_eq!(err.kind, crate::error::ExpressionErrorKind::WrongArity);
        assert!(TernaryExpression::parse("x y z").is_err());
    }

    #[test]
    fn test_quote_aware_split() {
        // the '?' inside the quoted string does not split the expression
        let value = eval("1 ? 'a?b' : 'c'", &[]);
        assert_eq!(value, Value::String("a?b".into()));
    }

    #[test]
    fn test_compiled_parity() {
        let context: ExpressionContext =
            [("cond".to_string(), Value::Bool(true))].into_iter().collect();
        for source in ["1 ? 2 : 3", "0 ? 2 : 3", "cond ? 'yes' : 'no'", "{cond} ? 1 : 2"] {
            let expr = TernaryExpression::parse(source).unwrap();
            assert_eq!(
                expr.evaluate(&context),
                expr.compile().execute(&context),
                "parity for {source}"
            );
        }
    }
}
