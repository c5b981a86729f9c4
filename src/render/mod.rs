//! Rendering by direct interpretation of the syntax tree.
//!
//! This is the path taken when compilation is disabled or an artifact is not
//! yet cached: the renderer walks [`Node`]s, resolves variables through the
//! extractor, evaluates embedded expressions, and dispatches helper
//! invocations through the resolver and the invocation layer.
//!
//! [`LazyContent`] is the deferred-evaluation closure handed to helpers for
//! child content and lazy arguments. It defers execution, not concurrency:
//! the captured nodes or compiled body are evaluated synchronously when the
//! consuming helper asks.

use std::sync::LazyLock;

use crate::ast::Node;
use crate::ast::value::Value;
use crate::ast::HelperNode;
use crate::compiler::artifact::CompiledArtifact;
use crate::compiler::program::{self, CodeBody};
use crate::error::RenderError;
use crate::expression::ExpressionContext;
use crate::helper::{HelperArgument, HelperArguments, invoke};
use crate::resolver::HelperResolver;
use crate::variables;

static EMPTY_CONTEXT: LazyLock<ExpressionContext> = LazyLock::new(ExpressionContext::new);

/// The ambient state a render runs against: the variable root and the shared
/// helper resolver.
pub struct RenderContext<'a> {
    pub variables: &'a Value,
    pub resolver: &'a HelperResolver,
}

impl<'a> RenderContext<'a> {
    pub fn new(variables: &'a Value, resolver: &'a HelperResolver) -> Self {
        Self {
            variables,
            resolver,
        }
    }

    /// The variable root viewed as an expression context. Non-map roots
    /// expose no keys.
    pub fn expression_context(&self) -> &ExpressionContext {
        self.variables.as_map().unwrap_or(&EMPTY_CONTEXT)
    }
}

/// Deferred template content: a child-node list or a single argument,
/// evaluated on demand against the ambient context and, for compiled
/// templates, the owning artifact.
pub struct LazyContent<'a> {
    inner: LazyInner<'a>,
}

enum LazyInner<'a> {
    Nodes(&'a [Node]),
    Body {
        body: &'a CodeBody,
        artifact: &'a CompiledArtifact,
    },
}

impl<'a> LazyContent<'a> {
    pub fn from_nodes(nodes: &'a [Node]) -> Self {
        Self {
            inner: LazyInner::Nodes(nodes),
        }
    }

    pub fn from_body(body: &'a CodeBody, artifact: &'a CompiledArtifact) -> Self {
        Self {
            inner: LazyInner::Body { body, artifact },
        }
    }

    /// Evaluate the deferred content now, synchronously.
    pub fn evaluate(&self, ctx: &RenderContext<'_>) -> Result<Value, RenderError> {
        match &self.inner {
            LazyInner::Nodes(nodes) => evaluate_nodes(nodes, ctx),
            LazyInner::Body { body, artifact } => program::execute_body(body, artifact, ctx),
        }
    }
}

/// Evaluate a single node to a value.
pub fn evaluate_node(node: &Node, ctx: &RenderContext<'_>) -> Result<Value, RenderError> {
    match node {
        Node::Text(text) => Ok(Value::String(text.clone())),
        Node::ObjectAccessor { path, accessors } => Ok(variables::extract_with_hints(
            ctx.variables,
            path,
            accessors,
        )),
        Node::Expression(expression) => Ok(expression.evaluate(ctx.expression_context())),
        Node::Helper(helper) => evaluate_helper(helper, ctx),
        Node::Root(children) | Node::Sequence(children) => evaluate_nodes(children, ctx),
    }
}

/// Evaluate a node list the way containers do: no children is the absence
/// marker, a single child keeps its typed value, several children
/// concatenate their output strings.
pub fn evaluate_nodes(nodes: &[Node], ctx: &RenderContext<'_>) -> Result<Value, RenderError> {
    match nodes {
        [] => Ok(Value::None),
        [single] => evaluate_node(single, ctx),
        several => {
            let mut output = String::new();
            for node in several {
                output.push_str(&evaluate_node(node, ctx)?.to_output_string());
            }
            Ok(Value::String(output))
        }
    }
}

fn evaluate_helper(helper: &HelperNode, ctx: &RenderContext<'_>) -> Result<Value, RenderError> {
    if let Some(namespace) = helper.namespace.as_deref()
        && ctx.resolver.is_namespace_ignored(namespace)
    {
        // ignored namespaces render their tags as literal markup
        return Ok(Value::String(reconstruct_helper(helper)));
    }

    let instance = ctx
        .resolver
        .create_helper(helper.namespace.as_deref(), &helper.name)?;

    let mut arguments = HelperArguments::new();
    for (name, node) in &helper.arguments {
        arguments.insert(name.clone(), argument_for(node));
    }
    if !helper.children.is_empty() {
        arguments.children = Some(LazyContent::from_nodes(&helper.children));
    }

    invoke::invoke(instance.as_ref(), &display_name(helper), &arguments, ctx)
}

/// Constant text arguments are passed eagerly; anything else is wrapped in
/// a lazy closure so helpers control evaluation of their own branches.
fn argument_for(node: &Node) -> HelperArgument<'_> {
    match node {
        Node::Text(text) => HelperArgument::Value(Value::String(text.clone())),
        other => HelperArgument::Lazy(LazyContent::from_nodes(std::slice::from_ref(other))),
    }
}

fn display_name(helper: &HelperNode) -> String {
    match &helper.namespace {
        Some(ns) => format!("{ns}:{}", helper.name),
        None => helper.name.clone(),
    }
}

/// Canonical literal form for an unprocessed helper tag.
pub(crate) fn reconstruct_helper(helper: &HelperNode) -> String {
    let mut out = format!("<{}", display_name(helper));
    for name in helper.arguments.keys() {
        out.push_str(&format!(" {name}=\"...\""));
    }
    out.push('>');
    out
}
