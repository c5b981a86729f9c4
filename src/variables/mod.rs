//! Variable extraction: resolving dotted paths against runtime values.
//!
//! A path like `user.address.city` walks one segment at a time. Each segment
//! is read through the first applicable accessor kind, probed in a fixed
//! priority order. Misses are never errors: an inaccessible member or an
//! absent intermediate value short-circuits the remaining path to
//! [`Value::None`].
//!
//! A segment may embed a brace-delimited sub-path (`foo.{dyn}.bar`): the
//! inner path is resolved against the original top-level subject and its
//! output string is substituted before the outer path is split.
//!
//! ```rust
//! use indexmap::IndexMap;
//! use stencil_lang::{variables, Value};
//!
//! let mut user = IndexMap::new();
//! user.insert("name".to_string(), Value::String("Ann".into()));
//! let mut root = IndexMap::new();
//! root.insert("user".to_string(), Value::Map(user));
//! let subject = Value::Map(root);
//!
//! assert_eq!(variables::extract(&subject, "user.name"), Value::String("Ann".into()));
//! assert_eq!(variables::extract(&subject, "user.invalid"), Value::None);
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ast::value::Value;

/// The strategy used to read one path segment from a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessorKind {
    /// Indexed access into a map key or array position.
    Index,
    /// Asserter-style predicate accessor on an object.
    Asserter,
    /// Getter-style accessor on an object, including dynamic getters.
    Getter,
    /// Public-field access on an object.
    Property,
}

/// Probe order for detection. First success wins.
const DETECTION_ORDER: [AccessorKind; 4] = [
    AccessorKind::Index,
    AccessorKind::Asserter,
    AccessorKind::Getter,
    AccessorKind::Property,
];

static SUBPATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^{}]+)\}").expect("sub-path pattern is valid")
});

/// Resolve a dotted path against a subject. Misses resolve to
/// [`Value::None`], never an error.
pub fn extract(subject: &Value, path: &str) -> Value {
    extract_with_hints(subject, path, &[])
}

/// Resolve a dotted path with per-segment accessor hints.
///
/// A hint that proves inapplicable at resolution time triggers transparent
/// re-detection instead of failing; extra or missing hints are ignored.
pub fn extract_with_hints(
    subject: &Value,
    path: &str,
    hints: &[Option<AccessorKind>],
) -> Value {
    let path = substitute_subpaths(subject, path);
    let mut current: Option<Value> = None;
    for (i, segment) in path.split('.').enumerate() {
        let hint = hints.get(i).copied().flatten();
        let cursor = current.as_ref().unwrap_or(subject);
        match read_segment(cursor, segment, hint) {
            Some((_, value)) => current = Some(value),
            None => return Value::None,
        }
    }
    current.unwrap_or(Value::None)
}

/// Return the ordered accessor kinds that resolve each segment of a path.
/// Detection stops at the first segment that cannot be read.
pub fn extract_accessors(subject: &Value, path: &str) -> Vec<AccessorKind> {
    let path = substitute_subpaths(subject, path);
    let mut kinds = Vec::new();
    let mut current: Option<Value> = None;
    for segment in path.split('.') {
        let cursor = current.as_ref().unwrap_or(subject);
        match read_segment(cursor, segment, None) {
            Some((kind, value)) => {
                kinds.push(kind);
                current = Some(value);
            }
            None => break,
        }
    }
    kinds
}

/// Replace `{sub.path}` groups with their resolution against the original
/// top-level subject.
fn substitute_subpaths(subject: &Value, path: &str) -> String {
    if !path.contains('{') {
        return path.to_string();
    }
    SUBPATH
        .replace_all(path, |caps: &regex::Captures<'_>| {
            extract(subject, &caps[1]).to_output_string()
        })
        .into_owned()
}

/// Read one segment, trying the hint first and falling back to detection.
fn read_segment(
    subject: &Value,
    segment: &str,
    hint: Option<AccessorKind>,
) -> Option<(AccessorKind, Value)> {
    if let Some(kind) = hint
        && let Some(value) = try_accessor(kind, subject, segment)
    {
        return Some((kind, value));
    }
    for kind in DETECTION_ORDER {
        if let Some(value) = try_accessor(kind, subject, segment) {
            return Some((kind, value));
        }
    }
    None
}

fn try_accessor(kind: AccessorKind, subject: &Value, segment: &str) -> Option<Value> {
    match kind {
        AccessorKind::Index => match subject {
            Value::Map(m) => m.get(segment).cloned(),
            Value::Array(a) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| a.get(i))
                .cloned(),
            _ => None,
        },
        AccessorKind::Asserter => subject.as_object().and_then(|o| o.assert(segment)),
        AccessorKind::Getter => subject.as_object().and_then(|o| o.get(segment)),
        AccessorKind::Property => subject.as_object().and_then(|o| o.field(segment)),
    }
}
