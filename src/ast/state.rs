//! Parse results and the parsed-template contract.
//!
//! A [`ParsingState`] is produced once by the external template parser,
//! consumed exactly once by the template compiler, and discarded. It can
//! also be rendered directly (interpreted) when compilation is disabled.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ast::value::Value;
use crate::ast::{LayoutReference, Node};
use crate::error::RenderError;
use crate::render::{self, RenderContext};

/// Contract implemented by anything that behaves like a parsed template:
/// a fresh [`ParsingState`] or a compiled artifact loaded from cache.
pub trait ParsedTemplate {
    fn identifier(&self) -> &str;

    /// Whether the template may be compiled into an artifact.
    fn is_compilable(&self) -> bool;

    /// Whether this instance already is a compiled artifact.
    fn is_compiled(&self) -> bool;

    fn has_layout(&self) -> bool;
}

/// The external template parser contract. The compiler never re-tokenizes;
/// it consumes whatever state the parser produced.
pub trait TemplateParser {
    fn parse(&self, identifier: &str, source: &str) -> Result<ParsingState, RenderError>;
}

/// One template's parse result.
pub struct ParsingState {
    identifier: String,
    root: Node,
    sections: IndexMap<String, Node>,
    layout: Option<LayoutReference>,
    compilable: bool,
    /// Transient symbol table for parser-internal bookkeeping. Not consulted
    /// by the compiler and discarded with the state.
    symbols: HashMap<String, Value>,
}

impl ParsingState {
    pub fn new(identifier: impl Into<String>, root: Node) -> Self {
        Self {
            identifier: identifier.into(),
            root,
            sections: IndexMap::new(),
            layout: None,
            compilable: true,
            symbols: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Register a named section subtree. Section order is preserved.
    pub fn add_section(&mut self, name: impl Into<String>, node: Node) {
        self.sections.insert(name.into(), node);
    }

    pub fn sections(&self) -> &IndexMap<String, Node> {
        &self.sections
    }

    pub fn set_layout(&mut self, layout: LayoutReference) {
        self.layout = Some(layout);
    }

    pub fn layout(&self) -> Option<&LayoutReference> {
        self.layout.as_ref()
    }

    pub fn set_compilable(&mut self, compilable: bool) {
        self.compilable = compilable;
    }

    pub fn set_symbol(&mut self, name: impl Into<String>, value: Value) {
        self.symbols.insert(name.into(), value);
    }

    pub fn symbol(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name)
    }

    /// Render the template by interpreting its syntax tree. This is the
    /// non-compiled path, used whenever caching is off.
    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<Value, RenderError> {
        render::evaluate_nodes(self.root.children_or_self(), ctx)
    }

    /// Render a named section by interpretation.
    pub fn render_section(
        &self,
        name: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<Value, RenderError> {
        let section = self
            .sections
            .get(name)
            .ok_or_else(|| RenderError::unknown_section(name))?;
        render::evaluate_nodes(section.children_or_self(), ctx)
    }

    /// Resolve the layout name, evaluating a dynamic layout node if needed.
    pub fn layout_name(&self, ctx: &RenderContext<'_>) -> Result<Option<String>, RenderError> {
        match &self.layout {
            None => Ok(None),
            Some(LayoutReference::Literal(name)) => Ok(Some(name.clone())),
            Some(LayoutReference::Dynamic(node)) => {
                Ok(Some(render::evaluate_node(node, ctx)?.to_output_string()))
            }
        }
    }
}

impl ParsedTemplate for ParsingState {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn is_compilable(&self) -> bool {
        self.compilable
    }

    fn is_compiled(&self) -> bool {
        false
    }

    fn has_layout(&self) -> bool {
        self.layout.is_some()
    }
}

/// A parsing state whose compilation failed, with diagnostics for warmup
/// reporting.
pub struct FailedCompilingState {
    pub state: ParsingState,
    pub failure_reason: String,
    pub mitigations: Vec<String>,
}

impl FailedCompilingState {
    pub fn new(state: ParsingState, failure_reason: impl Into<String>) -> Self {
        Self {
            state,
            failure_reason: failure_reason.into(),
            mitigations: Vec::new(),
        }
    }

    pub fn with_mitigation(mut self, mitigation: impl Into<String>) -> Self {
        self.mitigations.push(mitigation.into());
        self
    }
}

impl ParsedTemplate for FailedCompilingState {
    fn identifier(&self) -> &str {
        self.state.identifier()
    }

    fn is_compilable(&self) -> bool {
        self.state.is_compilable()
    }

    fn is_compiled(&self) -> bool {
        self.state.is_compiled()
    }

    fn has_layout(&self) -> bool {
        self.state.has_layout()
    }
}
