//! Interpretation of parsed expression trees against a runtime context.

use indexmap::IndexMap;

use crate::ast::value::Value;

use super::ops;
use super::parser::ExprNode;

/// The variable context an expression is evaluated against. Callers
/// typically assemble it from the render variables, with nested paths
/// already flattened to plain keys by the variable extractor.
pub type ExpressionContext = IndexMap<String, Value>;

/// Evaluate an expression tree to a value.
pub fn evaluate(node: &ExprNode, context: &ExpressionContext) -> Value {
    match node {
        ExprNode::Or(a, b) => {
            let result = evaluate(a, context).is_truthy() || evaluate(b, context).is_truthy();
            Value::Bool(result)
        }
        ExprNode::And(a, b) => {
            let result = evaluate(a, context).is_truthy() && evaluate(b, context).is_truthy();
            Value::Bool(result)
        }
        ExprNode::Compare(a, op, b) => {
            let x = evaluate(a, context);
            let y = evaluate(b, context);
            ops::compare(*op, &x, &y)
        }
        ExprNode::Not(x) => Value::Bool(!evaluate(x, context).is_truthy()),
        ExprNode::Quoted(s) => Value::String(s.clone()),
        ExprNode::Word(w) => resolve_term(w, context),
    }
}

/// Resolve an atomic term, in order:
///
/// 1. a context key, or a brace-wrapped context reference; the resolved
///    value passes through the countable-to-boolean coercion
/// 2. a numeric literal
/// 3. case-insensitive `true` / `false`
/// 4. a bare string, surrounding quotes trimmed
pub fn resolve_term(word: &str, context: &ExpressionContext) -> Value {
    let braced = word.starts_with('{') && word.ends_with('}');
    if context.contains_key(word) || braced {
        let key = word.trim_start_matches('{').trim_end_matches('}');
        return context
            .get(key)
            .cloned()
            .unwrap_or(Value::None)
            .coerce_countable();
    }
    if let Ok(n) = word.trim().parse::<f64>() {
        return Value::Number(n);
    }
    let lowered = word.trim().to_ascii_lowercase();
    if lowered == "true" {
        return Value::Bool(true);
    }
    if lowered == "false" {
        return Value::Bool(false);
    }
    Value::String(word.trim_matches(|c| c == '\'' || c == '"').to_string())
}
