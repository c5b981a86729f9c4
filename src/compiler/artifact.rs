//! The compiled artifact: a named executable unit with one stable entry
//! point per section, a layout accessor, and a namespace snapshot that makes
//! it self-sufficient at render time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::ast::state::ParsedTemplate;
use crate::ast::value::Value;
use crate::error::RenderError;
use crate::render::RenderContext;
use crate::resolver::HelperResolver;

use super::program::{self, ClosureRef, CodeBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Compiled,
    /// A deterministic stub for states that could not be compiled. Satisfies
    /// the identifier-lookup contract but refuses to render; callers fall
    /// back to re-parsing.
    Uncompilable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledSection {
    /// Original section name, kept for diagnostics; lookups go through the
    /// hashed key.
    pub name: String,
    pub body: CodeBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompiledLayout {
    Literal(String),
    Dynamic(CodeBody),
}

/// A compiled template, persisted in the cache as deterministic JSON and
/// executed by the [`program`] interpreter loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    identifier: String,
    kind: ArtifactKind,
    layout: Option<CompiledLayout>,
    /// Section bodies keyed by `section_<xxh64(name)>`, in source order.
    sections: IndexMap<String, CompiledSection>,
    root: CodeBody,
    /// Deferred bodies referenced by [`ClosureRef`].
    closures: Vec<CodeBody>,
    /// Snapshot of the resolver's namespace table at compile time.
    namespaces: IndexMap<String, Option<Vec<String>>>,
}

impl CompiledArtifact {
    pub(crate) fn compiled(
        identifier: String,
        root: CodeBody,
        sections: IndexMap<String, CompiledSection>,
        closures: Vec<CodeBody>,
        layout: Option<CompiledLayout>,
        namespaces: IndexMap<String, Option<Vec<String>>>,
    ) -> Self {
        Self {
            identifier,
            kind: ArtifactKind::Compiled,
            layout,
            sections,
            root,
            closures,
            namespaces,
        }
    }

    pub(crate) fn uncompilable(identifier: String) -> Self {
        Self {
            identifier,
            kind: ArtifactKind::Uncompilable,
            layout: None,
            sections: IndexMap::new(),
            root: CodeBody::constant(Value::None),
            closures: Vec::new(),
            namespaces: IndexMap::new(),
        }
    }

    /// The stable cache key for a section entry point.
    pub fn section_key(name: &str) -> String {
        format!("section_{:016x}", xxh64(name.as_bytes(), 0))
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Render the template root.
    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<Value, RenderError> {
        if self.kind == ArtifactKind::Uncompilable {
            return Err(RenderError::uncompiled(&self.identifier));
        }
        program::execute_body(&self.root, self, ctx)
    }

    /// Render a named section through its hashed entry point.
    pub fn render_section(
        &self,
        name: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<Value, RenderError> {
        if self.kind == ArtifactKind::Uncompilable {
            return Err(RenderError::uncompiled(&self.identifier));
        }
        let section = self
            .sections
            .get(&Self::section_key(name))
            .ok_or_else(|| RenderError::unknown_section(name))?;
        program::execute_body(&section.body, self, ctx)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(&Self::section_key(name))
    }

    /// Resolve the layout name: the stored literal, or the translated
    /// layout expression executed against the render context.
    pub fn layout_name(&self, ctx: &RenderContext<'_>) -> Result<Option<String>, RenderError> {
        match &self.layout {
            None => Ok(None),
            Some(CompiledLayout::Literal(name)) => Ok(Some(name.clone())),
            Some(CompiledLayout::Dynamic(body)) => Ok(Some(
                program::execute_body(body, self, ctx)?.to_output_string(),
            )),
        }
    }

    /// Re-register the embedded namespace snapshot, making the artifact
    /// self-sufficient on a fresh resolver.
    pub fn register_namespaces(&self, resolver: &mut HelperResolver) {
        resolver.add_namespaces(self.namespaces.clone());
    }

    pub fn namespaces(&self) -> &IndexMap<String, Option<Vec<String>>> {
        &self.namespaces
    }

    pub(crate) fn closure(&self, reference: ClosureRef) -> Result<&CodeBody, RenderError> {
        self.closures.get(reference.0).ok_or_else(|| {
            RenderError::invalid_artifact(format!("missing closure {}", reference.0))
        })
    }

    /// Serialize to the cacheable payload text. Identical artifacts
    /// serialize to byte-identical text.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

impl ParsedTemplate for CompiledArtifact {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn is_compilable(&self) -> bool {
        self.kind == ArtifactKind::Compiled
    }

    fn is_compiled(&self) -> bool {
        true
    }

    fn has_layout(&self) -> bool {
        self.layout.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_key_is_stable() {
        let a = CompiledArtifact::section_key("main");
        let b = CompiledArtifact::section_key("main");
        assert_eq!(a, b);
        assert!(a.starts_with("section_"));
        assert_ne!(a, CompiledArtifact::section_key("other"));
    }

    #[test]
    fn test_uncompilable_stub_contract() {
        let stub = CompiledArtifact::uncompilable("stub_id".to_string());
        assert!(!stub.is_compilable());
        assert!(stub.is_compiled());
        assert_eq!(stub.identifier(), "stub_id");

        let resolver = HelperResolver::default();
        let variables = Value::Map(Default::default());
        let ctx = RenderContext::new(&variables, &resolver);
        let err = stub.render(&ctx).unwrap_err();
        assert_eq!(err.kind, crate::error::RenderErrorKind::Uncompiled);
    }

    #[test]
    fn test_payload_round_trip() {
        let stub = CompiledArtifact::uncompilable("x".to_string());
        let payload = stub.to_payload().unwrap();
        let back = CompiledArtifact::from_payload(&payload).unwrap();
        assert_eq!(stub, back);
    }
}
