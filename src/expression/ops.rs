//! Comparator semantics shared by the expression interpreter and the
//! compiled-expression executor, so both modes agree on every input.

use std::cmp::Ordering;

use crate::ast::value::Value;

use super::parser::Comparator;

/// Apply a comparator to two evaluated operands.
///
/// Equality and inequality between two objects are force-upgraded to the
/// strict (identity) form regardless of the requested operator. All
/// comparators yield a boolean except modulo, which yields a number.
pub fn compare(op: Comparator, x: &Value, y: &Value) -> Value {
    let both_objects = matches!((x, y), (Value::Object(_), Value::Object(_)));
    let op = match op {
        Comparator::Eq if both_objects => Comparator::Identical,
        Comparator::NotEq if both_objects => Comparator::NotIdentical,
        other => other,
    };

    match op {
        Comparator::Eq => Value::Bool(x.loose_eq(y)),
        Comparator::Identical => Value::Bool(x.strict_eq(y)),
        Comparator::NotEq => Value::Bool(!x.loose_eq(y)),
        Comparator::NotIdentical => Value::Bool(!x.strict_eq(y)),
        Comparator::Le => Value::Bool(ordering(x, y) != Ordering::Greater),
        Comparator::Ge => Value::Bool(ordering(x, y) != Ordering::Less),
        Comparator::Lt => Value::Bool(ordering(x, y) == Ordering::Less),
        Comparator::Gt => Value::Bool(ordering(x, y) == Ordering::Greater),
        Comparator::Modulo => modulo(x, y),
    }
}

/// Ordering for `<`, `>`, `<=`, `>=`: numeric when both operands cast to
/// numbers, otherwise lexicographic over the output strings.
fn ordering(x: &Value, y: &Value) -> Ordering {
    let numeric_like = |v: &Value| {
        v.is_numeric() || matches!(v, Value::Bool(_) | Value::None)
    };
    if numeric_like(x) && numeric_like(y) {
        x.to_number_lenient()
            .partial_cmp(&y.to_number_lenient())
            .unwrap_or(Ordering::Equal)
    } else {
        x.to_output_string().cmp(&y.to_output_string())
    }
}

/// Integer modulo with silent degradation: a non-numeric operand or a zero
/// divisor yields zero instead of an error.
pub fn modulo(x: &Value, y: &Value) -> Value {
    if !x.is_numeric() || !y.is_numeric() {
        return Value::Number(0.0);
    }
    let a = x.to_number_lenient().trunc() as i64;
    let b = y.to_number_lenient().trunc() as i64;
    if b == 0 {
        return Value::Number(0.0);
    }
    Value::Number((a % b) as f64)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::ast::value::Accessible;

    use super::*;

    struct Dummy;

    impl Accessible for Dummy {
        fn get(&self, _name: &str) -> Option<Value> {
            None
        }
    }

    #[test]
    fn test_equality_upgrade_for_objects() {
        let a: Arc<dyn Accessible> = Arc::new(Dummy);
        let b: Arc<dyn Accessible> = Arc::new(Dummy);
        let result = compare(
            Comparator::Eq,
            &Value::Object(a.clone()),
            &Value::Object(b),
        );
        assert_eq!(result, Value::Bool(false));
        let same = compare(
            Comparator::Eq,
            &Value::Object(a.clone()),
            &Value::Object(a),
        );
        assert_eq!(same, Value::Bool(true));
    }

    #[test]
    fn test_loose_vs_strict() {
        let one = Value::Number(1.0);
        let one_str = Value::String("1".into());
        assert_eq!(compare(Comparator::Eq, &one, &one_str), Value::Bool(true));
        assert_eq!(
            compare(Comparator::Identical, &one, &one_str),
            Value::Bool(false)
        );
        assert_eq!(
            compare(Comparator::NotIdentical, &one, &one_str),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_numeric_ordering() {
        let two = Value::Number(2.0);
        let ten = Value::String("10".into());
        assert_eq!(compare(Comparator::Lt, &two, &ten), Value::Bool(true));
        assert_eq!(compare(Comparator::Ge, &ten, &two), Value::Bool(true));
    }

    #[test]
    fn test_modulo_degrades_to_zero() {
        assert_eq!(
            modulo(&Value::String("x".into()), &Value::Number(2.0)),
            Value::Number(0.0)
        );
        assert_eq!(
            modulo(&Value::Number(5.0), &Value::Number(0.0)),
            Value::Number(0.0)
        );
        assert_eq!(
            modulo(&Value::Number(5.0), &Value::Number(3.0)),
            Value::Number(2.0)
        );
    }
}
