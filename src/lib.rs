//! # stencil-lang
//!
//! A template compilation and evaluation engine. Source documents mix
//! literal text, embedded expressions and pluggable tag-like helper
//! invocations; an external parser turns them into a syntax tree which is
//! either interpreted directly or compiled into a cacheable executable
//! artifact.
//!
//! The crate is split into four core subsystems:
//!
//! - [`expression`]: a recursive-descent engine for boolean, ternary and
//!   math sub-expressions that both evaluates and compiles them.
//! - [`compiler`]: converts a parse result into a [`CompiledArtifact`] with
//!   one stable entry point per section, persisted through a pluggable
//!   [`cache`].
//! - [`resolver`]: maps namespace-qualified helper identifiers to registered
//!   implementations, with aliasing, ordered multi-root search and
//!   wildcard-based ignoring.
//! - [`variables`]: resolves dotted paths against heterogeneous runtime
//!   values using a deterministic accessor-priority search.
//!
//! The surface tokenizer is not part of this crate: hosts implement
//! [`TemplateParser`] and hand the engine a [`ParsingState`].
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use stencil_lang::{
//!     HelperResolver, MemoryCache, Node, ParsingState, RenderContext,
//!     TemplateCompiler, Value,
//! };
//!
//! // the external parser produced this tree for "Hello, {user.name}!"
//! let root = Node::Root(vec![
//!     Node::text("Hello, "),
//!     Node::accessor("user.name"),
//!     Node::text("!"),
//! ]);
//! let mut state = ParsingState::new("greeting", root);
//!
//! let resolver = HelperResolver::default();
//! let mut compiler = TemplateCompiler::new(Some(Arc::new(MemoryCache::new())));
//! compiler.store("greeting", &mut state, &resolver).unwrap();
//!
//! let mut user = indexmap::IndexMap::new();
//! user.insert("name".to_string(), Value::String("Ann".into()));
//! let mut vars = indexmap::IndexMap::new();
//! vars.insert("user".to_string(), Value::Map(user));
//! let variables = Value::Map(vars);
//!
//! let ctx = RenderContext::new(&variables, &resolver);
//! let artifact = compiler.get_compiled("greeting").unwrap();
//! assert_eq!(artifact.render(&ctx).unwrap().to_output_string(), "Hello, Ann!");
//! ```
//!
//! ## Expressions
//!
//! ```rust
//! use stencil_lang::expression::{BooleanExpression, ExpressionContext};
//! use stencil_lang::Value;
//!
//! let expr = BooleanExpression::parse("{hp} > 50");
//! let mut ctx = ExpressionContext::new();
//! ctx.insert("hp".to_string(), Value::Number(75.0));
//!
//! assert_eq!(expr.evaluate(&ctx), Value::Bool(true));
//! // the compiled form resolves variables the same way
//! assert_eq!(expr.compile().execute(&ctx), Value::Bool(true));
//! ```

pub mod ast;
pub mod cache;
pub mod compiler;
pub mod error;
pub mod expression;
pub mod helper;
pub mod render;
pub mod resolver;
pub mod variables;
pub mod warmup;

pub use ast::state::{FailedCompilingState, ParsedTemplate, ParsingState, TemplateParser};
pub use ast::value::{Accessible, Value};
pub use ast::{HelperNode, LayoutReference, Node};
pub use cache::{MemoryCache, TemplateCache};
pub use compiler::artifact::{ArtifactKind, CompiledArtifact};
pub use compiler::{CompilerOptions, TemplateCompiler};
pub use error::{
    CompileError, ExpressionError, ExpressionErrorKind, RenderError, RenderErrorKind,
    ResolveError,
};
pub use expression::{BooleanExpression, ExpressionNode, MathExpression, TernaryExpression};
pub use helper::{ArgumentDefinition, ClosureHelper, Helper, HelperArguments, ValueType};
pub use render::{LazyContent, RenderContext};
pub use resolver::{HelperRegistry, HelperResolver};
pub use warmup::{WarmupEntry, WarmupResult};
