//! The helper contract: pluggable units invoked by tag-like template syntax.
//!
//! A helper receives named arguments, each either an eagerly evaluated
//! [`Value`] or a lazy closure evaluated on demand, plus optional lazy child
//! content. Helpers declare an argument schema that the
//! [`invoke`](crate::helper::invoke) layer validates before dispatch.
//!
//! There are two ways to provide a helper:
//!
//! - **Trait-based**: implement [`Helper`] directly for full control over
//!   the schema and rendering.
//! - **Closure-based**: use [`ClosureHelper`] for simple cases where a full
//!   implementation would be boilerplate.

pub mod builtins;
pub mod invoke;

use indexmap::IndexMap;

use crate::ast::value::Value;
use crate::error::RenderError;
use crate::render::{LazyContent, RenderContext};

/// A pluggable template helper.
pub trait Helper: Send + Sync {
    /// Declare the arguments this helper supports. Undeclared arguments are
    /// rejected by the invoker before `render` is called.
    fn arguments(&self) -> Vec<ArgumentDefinition> {
        Vec::new()
    }

    /// Whether invocations of this helper may be baked into a compiled
    /// artifact. Returning `false` stops compilation of the whole template.
    fn compilable(&self) -> bool {
        true
    }

    /// Produce the helper's output value.
    fn render(
        &self,
        arguments: &HelperArguments<'_>,
        ctx: &RenderContext<'_>,
    ) -> Result<Value, RenderError>;
}

/// Describes one named argument a helper accepts.
#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub name: String,
    /// Expected type for eagerly evaluated values; `None` accepts anything.
    pub expected: Option<ValueType>,
    pub required: bool,
}

impl ArgumentDefinition {
    pub fn new(name: &str, expected: Option<ValueType>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            expected,
            required,
        }
    }

    pub fn required(name: &str, expected: ValueType) -> Self {
        Self::new(name, Some(expected), true)
    }

    pub fn optional(name: &str) -> Self {
        Self::new(name, None, false)
    }
}

/// Type tag used in argument schemas for runtime validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Bool,
    Array,
    Map,
    Object,
    /// Accepts any value type.
    Any,
}

impl ValueType {
    /// Check whether a runtime [`Value`] matches this type expectation.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueType::Any => true,
            ValueType::String => matches!(value, Value::String(_)),
            ValueType::Number => matches!(value, Value::Number(_)),
            ValueType::Bool => matches!(value, Value::Bool(_)),
            ValueType::Array => matches!(value, Value::Array(_)),
            ValueType::Map => matches!(value, Value::Map(_)),
            ValueType::Object => matches!(value, Value::Object(_)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Bool => "bool",
            ValueType::Array => "array",
            ValueType::Map => "map",
            ValueType::Object => "object",
            ValueType::Any => "any",
        }
    }
}

/// One argument as received by a helper.
pub enum HelperArgument<'a> {
    /// Already evaluated.
    Value(Value),
    /// Deferred; evaluated when the helper asks for it.
    Lazy(LazyContent<'a>),
}

/// The named arguments and child content passed to a helper invocation.
pub struct HelperArguments<'a> {
    values: IndexMap<String, HelperArgument<'a>>,
    /// Lazy child content; `None` when the invocation has no children.
    pub children: Option<LazyContent<'a>>,
}

impl<'a> HelperArguments<'a> {
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
            children: None,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, argument: HelperArgument<'a>) {
        self.values.insert(name.into(), argument);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&HelperArgument<'a>> {
        self.values.get(name)
    }

    /// Evaluate the named argument if present. Lazy arguments run their
    /// closure against the ambient render context.
    pub fn value(
        &self,
        name: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<Option<Value>, RenderError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(HelperArgument::Value(v)) => Ok(Some(v.clone())),
            Some(HelperArgument::Lazy(content)) => content.evaluate(ctx).map(Some),
        }
    }

    /// Evaluate the named argument, falling back to the child content and
    /// finally to [`Value::None`].
    pub fn value_or_children(
        &self,
        name: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<Value, RenderError> {
        if let Some(value) = self.value(name, ctx)? {
            return Ok(value);
        }
        match &self.children {
            Some(content) => content.evaluate(ctx),
            None => Ok(Value::None),
        }
    }

    /// Evaluate the rendered child content, or [`Value::None`] without
    /// children.
    pub fn render_children(&self, ctx: &RenderContext<'_>) -> Result<Value, RenderError> {
        match &self.children {
            Some(content) => content.evaluate(ctx),
            None => Ok(Value::None),
        }
    }
}

impl Default for HelperArguments<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Helper`] implementation backed by a closure.
///
/// ```rust
/// use stencil_lang::helper::ClosureHelper;
/// use stencil_lang::Value;
///
/// let helper = ClosureHelper::new(|arguments, ctx| {
///     let name = arguments
///         .value("name", ctx)?
///         .unwrap_or(Value::None)
///         .to_output_string();
///     Ok(Value::String(format!("Hello, {name}!")))
/// });
/// ```
pub struct ClosureHelper<F>
where
    F: Fn(&HelperArguments<'_>, &RenderContext<'_>) -> Result<Value, RenderError> + Send + Sync,
{
    arguments: Vec<ArgumentDefinition>,
    func: F,
}

impl<F> ClosureHelper<F>
where
    F: Fn(&HelperArguments<'_>, &RenderContext<'_>) -> Result<Value, RenderError> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self {
            arguments: Vec::new(),
            func,
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<ArgumentDefinition>) -> Self {
        self.arguments = arguments;
        self
    }
}

impl<F> Helper for ClosureHelper<F>
where
    F: Fn(&HelperArguments<'_>, &RenderContext<'_>) -> Result<Value, RenderError> + Send + Sync,
{
    fn arguments(&self) -> Vec<ArgumentDefinition> {
        self.arguments.clone()
    }

    fn render(
        &self,
        arguments: &HelperArguments<'_>,
        ctx: &RenderContext<'_>,
    ) -> Result<Value, RenderError> {
        (self.func)(arguments, ctx)
    }
}
