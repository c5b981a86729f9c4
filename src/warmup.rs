//! Warmup result aggregation.
//!
//! A cache warmer compiles templates ahead of real traffic and collects one
//! entry per template identifier: whether it was compilable, whether an
//! artifact exists, whether it carries a layout, and optional failure
//! diagnostics for states that refused to compile.

use indexmap::IndexMap;

use crate::ast::state::{FailedCompilingState, ParsedTemplate};

/// One warmed-up template's outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmupEntry {
    pub compilable: bool,
    pub compiled: bool,
    pub has_layout: bool,
    /// The identifier the compiled artifact is stored under.
    pub identifier: String,
    pub failure: Option<String>,
    pub mitigations: Vec<String>,
}

/// Aggregated warmup outcomes, keyed by template name.
#[derive(Debug, Clone, Default)]
pub struct WarmupResult {
    results: IndexMap<String, WarmupEntry>,
}

impl WarmupResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for one parsed template or compiled artifact.
    pub fn add(&mut self, template: &dyn ParsedTemplate, name: impl Into<String>) {
        // an already compiled template is compilable by definition
        let compilable = template.is_compiled() || template.is_compilable();
        self.results.insert(
            name.into(),
            WarmupEntry {
                compilable,
                compiled: template.is_compiled(),
                has_layout: template.has_layout(),
                identifier: template.identifier().to_string(),
                failure: None,
                mitigations: Vec::new(),
            },
        );
    }

    /// Record a failed compilation with its diagnostics.
    pub fn add_failure(&mut self, failed: &FailedCompilingState, name: impl Into<String>) {
        self.results.insert(
            name.into(),
            WarmupEntry {
                compilable: true,
                compiled: failed.is_compiled(),
                has_layout: failed.has_layout(),
                identifier: failed.identifier().to_string(),
                failure: Some(failed.failure_reason.clone()),
                mitigations: failed.mitigations.clone(),
            },
        );
    }

    /// Merge another result into this one. Entries already present win over
    /// incoming ones.
    pub fn merge(&mut self, other: WarmupResult) {
        for (name, entry) in other.results {
            self.results.entry(name).or_insert(entry);
        }
    }

    pub fn results(&self) -> &IndexMap<String, WarmupEntry> {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Node;
    use crate::ast::state::ParsingState;

    use super::*;

    fn entry(identifier: &str) -> WarmupEntry {
        WarmupEntry {
            compilable: true,
            compiled: false,
            has_layout: false,
            identifier: identifier.to_string(),
            failure: None,
            mitigations: Vec::new(),
        }
    }

    #[test]
    fn test_merge_is_left_biased() {
        let mut first = WarmupResult::new();
        first.results.insert("baz".into(), entry("oof"));
        first.results.insert("foo".into(), entry("kept"));
        let mut second = WarmupResult::new();
        second.results.insert("foo".into(), entry("dropped"));

        first.merge(second);
        assert_eq!(first.results()["baz"].identifier, "oof");
        assert_eq!(first.results()["foo"].identifier, "kept");
        assert_eq!(first.results().len(), 2);
    }

    #[test]
    fn test_add_state() {
        let mut state = ParsingState::new("subject1-identifier", Node::text(""));
        state.set_layout(crate::ast::LayoutReference::Literal("default".into()));
        let mut result = WarmupResult::new();
        result.add(&state, "foobar");

        let entry = &result.results()["foobar"];
        assert!(entry.compilable);
        assert!(!entry.compiled);
        assert!(entry.has_layout);
        assert_eq!(entry.identifier, "subject1-identifier");
        assert_eq!(entry.failure, None);
    }

    #[test]
    fn test_add_failure() {
        let state = ParsingState::new("subject2-identifier", Node::text(""));
        let failed = FailedCompilingState::new(state, "failure-reason")
            .with_mitigation("m1")
            .with_mitigation("m2");
        let mut result = WarmupResult::new();
        result.add_failure(&failed, "foobar");

        let entry = &result.results()["foobar"];
        assert!(entry.compilable);
        assert_eq!(entry.failure.as_deref(), Some("failure-reason"));
        assert_eq!(entry.mitigations, vec!["m1".to_string(), "m2".to_string()]);
    }
}
