//! Compiled form of embedded expressions.
//!
//! [`compile`] translates a parsed [`ExprNode`] tree into a serializable
//! [`ExprCode`] tree that can be embedded in a compiled artifact and executed
//! later by [`ExprCode::execute`]. Context-dependent terms stay dynamic ops
//! so that compiled execution resolves variables exactly as the interpreter
//! does; statically classifiable terms fold to constants.

use serde::{Deserialize, Serialize};

use crate::ast::value::Value;

use super::eval::{self, ExpressionContext};
use super::math::MathOp;
use super::ops;
use super::parser::{Comparator, ExprNode};

/// An executable compiled expression. The serialized form is part of the
/// compiled-artifact payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprCode {
    Const(Value),
    /// A bare word resolved at execution time with the interpreter's atomic
    /// term order: context key first, then numeric, boolean, bare string.
    ContextWord(String),
    /// A brace-wrapped context reference; a miss is the absence marker.
    /// Context hits pass through the countable-to-boolean coercion.
    ContextRef(String),
    /// A ternary branch operand: raw context value if the key exists,
    /// otherwise a numeric or string literal. No coercion.
    OperandWord(String),
    Not(Box<ExprCode>),
    And(Box<ExprCode>, Box<ExprCode>),
    Or(Box<ExprCode>, Box<ExprCode>),
    Compare {
        op: Comparator,
        lhs: Box<ExprCode>,
        rhs: Box<ExprCode>,
    },
    Math {
        op: MathOp,
        lhs: Box<ExprCode>,
        rhs: Box<ExprCode>,
    },
    Ternary {
        condition: Box<ExprCode>,
        then_branch: Box<ExprCode>,
        else_branch: Box<ExprCode>,
    },
}

/// Compile a parsed expression tree.
pub fn compile(node: &ExprNode) -> ExprCode {
    match node {
        ExprNode::Or(a, b) => ExprCode::Or(Box::new(compile(a)), Box::new(compile(b))),
        ExprNode::And(a, b) => ExprCode::And(Box::new(compile(a)), Box::new(compile(b))),
        ExprNode::Compare(a, op, b) => {
            let lhs = compile(a);
            let rhs = compile(b);
            // modulo folds to the literal zero constant unless both operands
            // are numeric constants in compiled form
            if *op == Comparator::Modulo && !(is_numeric_const(&lhs) && is_numeric_const(&rhs)) {
                return ExprCode::Const(Value::Number(0.0));
            }
            ExprCode::Compare {
                op: *op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }
        }
        ExprNode::Not(x) => ExprCode::Not(Box::new(compile(x))),
        ExprNode::Quoted(s) => ExprCode::Const(Value::String(s.clone())),
        ExprNode::Word(w) => compile_term(w),
    }
}

fn compile_term(word: &str) -> ExprCode {
    if word.starts_with('{') && word.ends_with('}') {
        let key = word.trim_start_matches('{').trim_end_matches('}');
        return ExprCode::ContextRef(key.to_string());
    }
    if let Ok(n) = word.trim().parse::<f64>() {
        return ExprCode::Const(Value::Number(n));
    }
    let lowered = word.trim().to_ascii_lowercase();
    if lowered == "true" {
        return ExprCode::Const(Value::Bool(true));
    }
    if lowered == "false" {
        return ExprCode::Const(Value::Bool(false));
    }
    ExprCode::ContextWord(word.to_string())
}

fn is_numeric_const(code: &ExprCode) -> bool {
    matches!(code, ExprCode::Const(Value::Number(_)))
}

impl ExprCode {
    /// Execute the compiled expression against a context.
    pub fn execute(&self, context: &ExpressionContext) -> Value {
        match self {
            ExprCode::Const(v) => v.clone(),
            ExprCode::ContextWord(w) => eval::resolve_term(w, context),
            ExprCode::ContextRef(key) => context
                .get(key)
                .cloned()
                .unwrap_or(Value::None)
                .coerce_countable(),
            ExprCode::OperandWord(w) => {
                if let Some(v) = context.get(w.as_str()) {
                    return v.clone();
                }
                if let Ok(n) = w.trim().parse::<f64>() {
                    return Value::Number(n);
                }
                Value::String(w.clone())
            }
            ExprCode::Not(x) => Value::Bool(!x.execute(context).is_truthy()),
            ExprCode::And(a, b) => Value::Bool(
                a.execute(context).is_truthy() && b.execute(context).is_truthy(),
            ),
            ExprCode::Or(a, b) => Value::Bool(
                a.execute(context).is_truthy() || b.execute(context).is_truthy(),
            ),
            ExprCode::Compare { op, lhs, rhs } => {
                let x = lhs.execute(context);
                let y = rhs.execute(context);
                ops::compare(*op, &x, &y)
            }
            ExprCode::Math { op, lhs, rhs } => {
                let x = lhs.execute(context);
                let y = rhs.execute(context);
                op.apply(&x, &y)
            }
            ExprCode::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if condition.execute(context).is_truthy() {
                    then_branch.execute(context)
                } else {
                    else_branch.execute(context)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;

    fn ctx(entries: &[(&str, Value)]) -> ExpressionContext {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_static_terms_fold_to_constants() {
        assert_eq!(compile(&parse("1")), ExprCode::Const(Value::Number(1.0)));
        assert_eq!(compile(&parse("true")), ExprCode::Const(Value::Bool(true)));
        assert_eq!(
            compile(&parse("'foo'")),
            ExprCode::Const(Value::String("foo".into()))
        );
    }

    #[test]
    fn test_modulo_folds_to_literal_zero() {
        // a dynamic operand makes the whole comparison a constant zero
        assert_eq!(compile(&parse("a % b")), ExprCode::Const(Value::Number(0.0)));
        assert_eq!(
            compile(&parse("{a} % 2")),
            ExprCode::Const(Value::Number(0.0))
        );
        // numeric constants keep the real operation
        let code = compile(&parse("5 % 3"));
        assert_eq!(code.execute(&ExpressionContext::new()), Value::Number(2.0));
    }

    #[test]
    fn test_compiled_context_resolution_matches_interpreter() {
        let context = ctx(&[("a", Value::Number(5.0)), ("name", "Ann".into())]);
        for expression in [
            "a == 5",
            "{a} == 5",
            "name == 'Ann'",
            "a > 3 && name",
            "!{missing}",
        ] {
            let node = parse(expression);
            let interpreted = eval::evaluate(&node, &context);
            let executed = compile(&node).execute(&context);
            assert_eq!(interpreted, executed, "parity for {expression}");
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let code = compile(&parse("{a} == 'x' || b > 2"));
        let text = serde_json::to_string(&code).unwrap();
        let back: ExprCode = serde_json::from_str(&text).unwrap();
        assert_eq!(code, back);
    }
}
