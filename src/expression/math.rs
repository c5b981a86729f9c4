//! Math expressions: left-associative chains of `+ - * / % ^` over numeric
//! terms, with lenient operand casting.

use serde::{Deserialize, Serialize};

use crate::ast::value::Value;
use crate::error::ExpressionError;

use super::code::ExprCode;
use super::eval::ExpressionContext;
use super::lexer::Lexer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl MathOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "+" => Some(MathOp::Add),
            "-" => Some(MathOp::Sub),
            "*" => Some(MathOp::Mul),
            "/" => Some(MathOp::Div),
            "%" => Some(MathOp::Mod),
            "^" => Some(MathOp::Pow),
            _ => None,
        }
    }

    /// Apply the operator with lenient numeric casting. Division and modulo
    /// by zero degrade to zero instead of raising.
    pub fn apply(&self, x: &Value, y: &Value) -> Value {
        let a = x.to_number_lenient();
        let b = y.to_number_lenient();
        let result = match self {
            MathOp::Add => a + b,
            MathOp::Sub => a - b,
            MathOp::Mul => a * b,
            MathOp::Div => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
            MathOp::Mod => {
                let divisor = b.trunc() as i64;
                if divisor == 0 {
                    0.0
                } else {
                    (a.trunc() as i64 % divisor) as f64
                }
            }
            MathOp::Pow => a.powf(b),
        };
        Value::Number(result)
    }
}

/// A parsed math expression, e.g. `a + 1` or `4 ^ 2`.
///
/// Terms fold strictly left to right with no precedence between operators,
/// matching the template language's sequential evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct MathExpression {
    source: String,
    first: MathTerm,
    rest: Vec<(MathOp, MathTerm)>,
}

#[derive(Debug, Clone, PartialEq)]
enum MathTerm {
    Number(f64),
    /// A context reference, brace-wrapped or bare. Absent variables cast
    /// to zero at evaluation time.
    Word(String),
}

impl MathExpression {
    /// Parse a math expression. A token in operator position that is not a
    /// supported operator raises an [`ExpressionError`]; a dangling operator
    /// without a right-hand term is a wrong-arity error.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let mut lexer = Lexer::new(source);
        let first = match lexer.peek() {
            Some(token) => {
                lexer.consume(&token);
                Self::term(token.text)
            }
            None => {
                return Err(ExpressionError::new(
                    crate::error::ExpressionErrorKind::Empty,
                    source,
                    "empty math expression",
                ));
            }
        };

        let mut rest = Vec::new();
        while let Some(token) = lexer.peek() {
            let Some(op) = MathOp::from_token(token.text) else {
                return Err(ExpressionError::invalid_operator(source, token.text));
            };
            lexer.consume(&token);
            let Some(operand) = lexer.peek() else {
                return Err(ExpressionError::wrong_arity(source, rest.len() * 2 + 3, rest.len() * 2 + 2));
            };
            lexer.consume(&operand);
            rest.push((op, Self::term(operand.text)));
        }

        Ok(Self {
            source: source.to_string(),
            first,
            rest,
        })
    }

    fn term(text: &str) -> MathTerm {
        match text.trim().parse::<f64>() {
            Ok(n) => MathTerm::Number(n),
            Err(_) => MathTerm::Word(text.to_string()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against a context; absent or non-numeric terms cast to zero.
    pub fn evaluate(&self, context: &ExpressionContext) -> Value {
        let mut acc = Self::resolve(&self.first, context);
        for (op, term) in &self.rest {
            let operand = Self::resolve(term, context);
            acc = op.apply(&acc, &operand);
        }
        acc
    }

    fn resolve(term: &MathTerm, context: &ExpressionContext) -> Value {
        match term {
            MathTerm::Number(n) => Value::Number(*n),
            MathTerm::Word(w) => {
                let key = w.trim_start_matches('{').trim_end_matches('}');
                context.get(key).cloned().unwrap_or(Value::None)
            }
        }
    }

    /// Compile to an executable code tree; the fold order is preserved by
    /// nesting each step as the left operand of the next.
    pub fn compile(&self) -> ExprCode {
        let mut acc = Self::term_code(&self.first);
        for (op, term) in &self.rest {
            acc = ExprCode::Math {
                op: *op,
                lhs: Box::new(acc),
                rhs: Box::new(Self::term_code(term)),
            };
        }
        acc
    }

    fn term_code(term: &MathTerm) -> ExprCode {
        match term {
            MathTerm::Number(n) => ExprCode::Const(Value::Number(*n)),
            // OperandWord resolves the raw context value without coercion,
            // matching the interpreter's math term resolution
            MathTerm::Word(w) => {
                let key = w.trim_start_matches('{').trim_end_matches('}');
                ExprCode::OperandWord(key.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, entries: &[(&str, Value)]) -> Value {
        let context: ExpressionContext = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        MathExpression::parse(source).unwrap().evaluate(&context)
    }

    #[test]
    fn test_operators() {
        assert_eq!(eval("1 + 1", &[]), Value::Number(2.0));
        assert_eq!(eval("2 - 1", &[]), Value::Number(1.0));
        assert_eq!(eval("2 % 4", &[]), Value::Number(2.0));
        assert_eq!(eval("2 * 4", &[]), Value::Number(8.0));
        assert_eq!(eval("4 / 2", &[]), Value::Number(2.0));
        assert_eq!(eval("4 ^ 2", &[]), Value::Number(16.0));
    }

    #[test]
    fn test_variables_and_lenient_nulls() {
        assert_eq!(eval("a + 1", &[("a", Value::Number(1.0))]), Value::Number(2.0));
        // an absent variable casts to zero
        assert_eq!(eval("a + 1", &[]), Value::Number(1.0));
        assert_eq!(eval("1 + b", &[("b", Value::Number(1.0))]), Value::Number(2.0));
        assert_eq!(
            eval("a + b", &[("a", Value::Number(1.0)), ("b", Value::Number(1.0))]),
            Value::Number(2.0)
        );
    }

    #[test]
    fn test_sequential_fold_without_precedence() {
        assert_eq!(eval("1 + 2 * 3", &[]), Value::Number(9.0));
    }

    #[test]
    fn test_invalid_operator() {
        let err = MathExpression::parse("1 gabbagabbahey 1").unwrap_err();
        assert_eq!(err.kind, crate::error::ExpressionErrorKind::InvalidOperator);
    }

    #[test]
    fn test_dangling_operator() {
        let err = MathExpression::parse("1 +").unwrap_err();
        assert_eq!(err.kind, crate::error::ExpressionErrorKind::WrongArity);
    }

    #[test]
    fn test_compiled_parity() {
        let context: ExpressionContext =
            [("a".to_string(), Value::Number(3.0))].into_iter().collect();
        for source in ["1 + 1", "a + 1", "a * 2 - 1", "4 ^ 2", "{a} + 1"] {
            let expr = MathExpression::parse(source).unwrap();
            assert_eq!(
                expr.evaluate(&context),
                expr.compile().execute(&context),
                "parity for {source}"
            );
        }
    }
}
