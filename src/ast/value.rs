use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// The set of runtime value types in stencil-lang.
///
/// Expressions and variable lookups produce `Value`s during rendering. When a
/// `Value` appears at the template level, it is converted to a string via
/// [`to_output_string`](Value::to_output_string). Internally, types are
/// preserved so that conditions, comparisons and arithmetic operate correctly.
///
/// Conversion from common Rust types is provided via `From` impls:
///
/// ```rust
/// use stencil_lang::Value;
///
/// let s: Value = "hello".into();
/// let n: Value = 42i64.into();
/// let b: Value = true.into();
/// let a: Value = vec!["a", "b"].into();
/// ```
#[derive(Clone)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    Array(Vec<Value>),
    /// An ordered string-keyed map. Template contexts are maps at the root.
    Map(IndexMap<String, Value>),
    /// An opaque host object queried through the [`Accessible`] trait.
    /// Equality between two objects is identity, not structure.
    Object(Arc<dyn Accessible>),
    /// The absence of a value. Falsy, renders as an empty string.
    None,
}

/// A host object that variable paths and expressions can read from.
///
/// Implementors expose their members through one or more accessor styles.
/// The [`variables`](crate::variables) module probes these in a fixed
/// priority order; a style that does not apply simply returns `None`.
pub trait Accessible: Send + Sync {
    /// Getter-style access, including dynamic/magic getters. `user.name`
    /// reaches an implementor through `get("name")`.
    fn get(&self, name: &str) -> Option<Value>;

    /// Asserter-style predicate access (`is*`/`has*` accessors). `user.named`
    /// reaches an implementor through `assert("named")`.
    fn assert(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Public-field access, tried after getters and asserters.
    fn field(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Element count for countable objects. Countable objects reduce to a
    /// boolean in expression terms and are truthy iff non-empty.
    fn count(&self) -> Option<usize> {
        None
    }

    /// String representation for template output. Objects without one render
    /// as the empty string.
    fn output(&self) -> Option<String> {
        None
    }
}

impl Value {
    /// Convert this value to its string representation for template output.
    ///
    /// - `String` is returned as-is
    /// - `Number` is formatted without trailing `.0` for whole numbers
    /// - `Bool` becomes `"true"` or `"false"`
    /// - `Array` and `Map` values are joined with `", "`
    /// - `Object` uses [`Accessible::output`], defaulting to empty
    /// - `None` is the empty string
    pub fn to_output_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Array(items) => items
                .iter()
                .map(|v| v.to_output_string())
                .collect::<Vec<_>>()
                .join(", "),
            Value::Map(entries) => entries
                .values()
                .map(|v| v.to_output_string())
                .collect::<Vec<_>>()
                .join(", "),
            Value::Object(obj) => obj.output().unwrap_or_default(),
            Value::None => String::new(),
        }
    }

    /// Type name for diagnostic messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::None => "none",
        }
    }

    /// Truthiness check, used by conditions and the `&&`/`||`/`!` operators.
    ///
    /// Falsy values: empty string, `0`, `false`, empty array, empty map,
    /// countable object with zero elements, `None`. Everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0.0,
            Value::Bool(b) => *b,
            Value::Array(a) => !a.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Object(obj) => obj.count().map(|c| c > 0).unwrap_or(true),
            Value::None => false,
        }
    }

    /// Reduce countable values to a boolean: arrays, maps and countable
    /// objects become `Bool(len > 0)`. This is not a general boolean cast;
    /// any other value is returned unchanged.
    pub fn coerce_countable(self) -> Value {
        match self {
            Value::Array(ref a) => Value::Bool(!a.is_empty()),
            Value::Map(ref m) => Value::Bool(!m.is_empty()),
            Value::Object(ref obj) => match obj.count() {
                Some(c) => Value::Bool(c > 0),
                None => self,
            },
            other => other,
        }
    }

    /// Whether this value is a number or a string that parses as one.
    pub fn is_numeric(&self) -> bool {
        match self {
            Value::Number(_) => true,
            Value::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        }
    }

    /// Lenient numeric cast: numbers pass through, numeric strings parse,
    /// booleans become 0/1, everything else (including `None`) is 0.
    pub fn to_number_lenient(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn Accessible>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Loose equality, used by the `==`/`!=` comparators.
    ///
    /// Rules, in order:
    /// - two objects compare by identity
    /// - an object never loosely equals a non-object
    /// - same-type operands compare structurally
    /// - a boolean equals the other operand's truthiness
    /// - `None` equals any falsy operand
    /// - a number and a numeric string compare numerically
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Object(_), _) | (_, Value::Object(_)) => false,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(b), _) => *b == other.is_truthy(),
            (_, Value::Bool(b)) => *b == self.is_truthy(),
            (Value::None, _) => !other.is_truthy(),
            (_, Value::None) => !self.is_truthy(),
            (Value::Number(a), Value::String(s)) => {
                s.trim().parse::<f64>().map(|b| *a == b).unwrap_or(false)
            }
            (Value::String(s), Value::Number(b)) => {
                s.trim().parse::<f64>().map(|a| a == *b).unwrap_or(false)
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map(|w| v.loose_eq(w)).unwrap_or(false))
            }
            _ => false,
        }
    }

    /// Strict equality, used by the `===`/`!==` comparators: operands must be
    /// the same type and structurally equal; objects compare by identity.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map(|w| v.strict_eq(w)).unwrap_or(false))
            }
            (Value::None, Value::None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Array(a) => f.debug_tuple("Array").field(a).finish(),
            Value::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Value::Object(o) => write!(f, "Object({:p})", Arc::as_ptr(o)),
            Value::None => write!(f, "None"),
        }
    }
}

/// Structural equality with identity semantics for objects, matching
/// [`strict_eq`](Value::strict_eq). Use [`loose_eq`](Value::loose_eq) for
/// comparator semantics.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_output_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl From<Arc<dyn Accessible>> for Value {
    fn from(o: Arc<dyn Accessible>) -> Self {
        Value::Object(o)
    }
}

// ── Serde round-trip via serde_json::Value ──────────────────────────────

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => serde_json::Value::String(s),
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Array(a) => serde_json::Value::Array(a.into_iter().map(Into::into).collect()),
            Value::Map(m) => {
                serde_json::Value::Object(m.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            // Objects never appear in compiled constants; they exist only at
            // render time. Serialized form is the absence marker.
            Value::Object(_) => serde_json::Value::Null,
            Value::None => serde_json::Value::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::Array(a.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(m) => {
                Value::Map(m.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self.clone()).serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counted(usize);

    impl Accessible for Counted {
        fn get(&self, _name: &str) -> Option<Value> {
            None
        }

        fn count(&self) -> Option<usize> {
            Some(self.0)
        }
    }

    #[test]
    fn test_output_strings() {
        assert_eq!(Value::Number(2.0).to_output_string(), "2");
        assert_eq!(Value::Number(2.5).to_output_string(), "2.5");
        assert_eq!(Value::Bool(true).to_output_string(), "true");
        assert_eq!(Value::None.to_output_string(), "");
        let arr: Value = vec!["a", "b"].into();
        assert_eq!(arr.to_output_string(), "a, b");
    }

    #[test]
    fn test_coerce_countable() {
        let empty: Value = Vec::<Value>::new().into();
        assert_eq!(empty.coerce_countable(), Value::Bool(false));
        let full: Value = vec![1i64].into();
        assert_eq!(full.coerce_countable(), Value::Bool(true));
        assert_eq!(
            Value::String("x".into()).coerce_countable(),
            Value::String("x".into())
        );
        let obj = Value::Object(Arc::new(Counted(0)));
        assert_eq!(obj.coerce_countable(), Value::Bool(false));
    }

    #[test]
    fn test_object_identity_equality() {
        let a: Arc<dyn Accessible> = Arc::new(Counted(1));
        let b: Arc<dyn Accessible> = Arc::new(Counted(1));
        let va = Value::Object(a.clone());
        assert!(va.loose_eq(&Value::Object(a)));
        assert!(!va.loose_eq(&Value::Object(b)));
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Number(1.0).loose_eq(&Value::String("1".into())));
        assert!(!Value::Number(1.0).strict_eq(&Value::String("1".into())));
        assert!(Value::Bool(true).loose_eq(&Value::String("yes".into())));
        assert!(Value::None.loose_eq(&Value::String(String::new())));
        assert!(!Value::None.loose_eq(&Value::String("a".into())));
    }

    #[test]
    fn test_serde_round_trip() {
        let value = Value::Array(vec![
            Value::Number(1.0),
            Value::String("two".into()),
            Value::Bool(false),
            Value::None,
        ]);
        let text = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, back);
    }
}
