//! The template syntax tree.
//!
//! Nodes are produced by an external template parser (see
//! [`TemplateParser`](crate::ast::state::TemplateParser)) and consumed either
//! by the interpreting renderer ([`render`](crate::render)) or by the
//! template compiler ([`compiler`](crate::compiler)). A parent exclusively
//! owns its children; the tree is acyclic with depth bounded by source
//! nesting.

pub mod state;
pub mod value;

use indexmap::IndexMap;

use crate::expression::ExpressionNode;
use crate::variables::AccessorKind;

/// One node of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Raw text between template constructs.
    Text(String),

    /// A helper invocation with named arguments and child content.
    Helper(HelperNode),

    /// A dotted variable path, e.g. `user.name`, with optional accessor
    /// hints recorded by the parser.
    ObjectAccessor {
        path: String,
        accessors: Vec<Option<AccessorKind>>,
    },

    /// An embedded boolean, ternary or math expression.
    Expression(ExpressionNode),

    /// The top-level container of a template or section.
    Root(Vec<Node>),

    /// An inline list of nodes, e.g. mixed text and accessors inside an
    /// argument value.
    Sequence(Vec<Node>),
}

impl Node {
    /// Convenience constructor for a plain accessor without hints.
    pub fn accessor(path: impl Into<String>) -> Self {
        Node::ObjectAccessor {
            path: path.into(),
            accessors: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(content.into())
    }

    /// Children of container nodes; leaf nodes yield themselves. Used by the
    /// compiler when a section or root body is converted as a node list.
    pub fn children_or_self(&self) -> &[Node] {
        match self {
            Node::Root(children) | Node::Sequence(children) => children,
            _ => std::slice::from_ref(self),
        }
    }
}

/// A helper invocation: `<ns:format.cdata attr="...">...</ns:format.cdata>`.
#[derive(Debug, Clone, PartialEq)]
pub struct HelperNode {
    /// Namespace alias; `None` consults the resolver's alias table.
    pub namespace: Option<String>,
    /// Helper identifier, possibly hierarchical (`format.cdata`).
    pub name: String,
    /// Named arguments in source order.
    pub arguments: IndexMap<String, Node>,
    /// Child content, rendered lazily on the helper's request.
    pub children: Vec<Node>,
}

impl HelperNode {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            arguments: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_argument(mut self, name: &str, value: Node) -> Self {
        self.arguments.insert(name.to_string(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }
}

/// A template's layout reference: either a literal name or a node evaluated
/// at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutReference {
    Literal(String),
    Dynamic(Node),
}
