//! Error types for expression parsing, helper resolution, compilation and
//! rendering.
//!
//! [`ExpressionError`] is produced when an embedded expression is
//! structurally malformed. [`ResolveError`] is produced when a helper cannot
//! be mapped to a registered type. [`CompileError`] covers the template
//! compiler, including the fatal [`Stopped`](CompileError::Stopped) signal.
//! [`RenderError`] is produced during evaluation and can originate from the
//! renderer, the resolver, or a helper implementation.
//!
//! Two conditions are deliberately *not* errors: a disabled compiler
//! silently degrades to interpret-only mode, and a variable path that misses
//! resolves to [`Value::None`](crate::Value::None).

use std::sync::Arc;

use thiserror::Error;

// ── Helper resolution ───────────────────────────────────────────────────

/// A helper namespace + identifier pair could not be mapped to a registered
/// helper type. Carries the candidate type name that was derived and every
/// root that was searched, for actionable diagnostics. Never retried.
#[derive(Debug, Clone, Error)]
#[error(
    "the helper \"{namespace}:{name}\" could not be resolved; based on your spelling, the \
     system would use the type \"{candidate}\"; searched roots: {}",
    roots_for_display(.searched)
)]
pub struct ResolveError {
    pub namespace: String,
    pub name: String,
    /// Derived candidate type name, e.g. `Format.CdataHelper`.
    pub candidate: String,
    /// Namespace roots searched, in the order they were tried.
    pub searched: Vec<String>,
}

fn roots_for_display(roots: &[String]) -> String {
    if roots.is_empty() {
        "none".to_string()
    } else {
        roots.join(", ")
    }
}

// ── Expression errors ───────────────────────────────────────────────────

/// A structurally malformed embedded expression.
///
/// Most malformed input degrades silently (the expression cursor runs to the
/// end of input); this error is reserved for structural violations such as a
/// ternary without exactly three parts or an unknown math operator.
#[derive(Debug, Clone, Error)]
#[error("{message} in expression \"{expression}\"")]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
    pub expression: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionErrorKind {
    /// The expression did not have the required number of parts.
    WrongArity,
    /// An operator token was not part of the supported grammar.
    InvalidOperator,
    /// The expression contained no evaluable content.
    Empty,
}

impl ExpressionError {
    pub fn new(
        kind: ExpressionErrorKind,
        expression: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            expression: expression.into(),
            message: message.into(),
        }
    }

    pub fn wrong_arity(expression: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::new(
            ExpressionErrorKind::WrongArity,
            expression,
            format!("expected {expected} expression parts, found {found}"),
        )
    }

    pub fn invalid_operator(expression: impl Into<String>, operator: &str) -> Self {
        Self::new(
            ExpressionErrorKind::InvalidOperator,
            expression,
            format!("invalid operator \"{operator}\""),
        )
    }
}

// ── Compiler errors ─────────────────────────────────────────────────────

/// An error raised by the template compiler.
///
/// Note that a *disabled* compiler is not an error: `store` returns
/// `Ok(None)` and the template stays interpreted.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Compiling was intentionally stopped, e.g. because a helper declares
    /// itself uncompilable. Fatal and non-partial: no artifact is produced
    /// and the caller owns recovery (typically re-storing the state as
    /// non-compilable).
    #[error("compiling stopped")]
    Stopped,

    /// A helper used by the template could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolveError),

    /// Two distinct raw identifiers sanitized to the same cache key while
    /// collision detection was enabled.
    #[error(
        "template identifiers \"{existing}\" and \"{incoming}\" both sanitize to cache key \"{key}\""
    )]
    IdentifierCollision {
        key: String,
        existing: String,
        incoming: String,
    },

    /// No artifact is stored under the requested identifier.
    #[error("no compiled template stored under identifier \"{identifier}\"")]
    NotFound { identifier: String },

    /// The artifact payload could not be encoded or decoded.
    #[error("compiled artifact payload could not be processed")]
    Codec(#[from] serde_json::Error),
}

// ── Render errors ───────────────────────────────────────────────────────

/// An error that occurs while rendering a template, a section, or a lazy
/// argument closure.
///
/// Carries a structured [`RenderErrorKind`], a human-readable message, and an
/// optional underlying cause. Helper implementations can preserve their own
/// error chain via [`with_source`](RenderError::with_source):
///
/// ```rust
/// use stencil_lang::RenderError;
///
/// fn example() -> Result<(), RenderError> {
///     let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
///     Err(RenderError::helper("failed to load partial").with_source(io_err))
/// }
/// ```
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RenderError {
    pub kind: RenderErrorKind,
    pub message: String,
    /// The underlying error that caused this render error, if any.
    ///
    /// Wrapped in `Arc` so that `RenderError` remains `Clone`.
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderErrorKind {
    /// A helper could not be resolved at render time.
    UnknownHelper,
    /// An embedded expression was structurally malformed.
    Expression,
    /// A helper was invoked with an argument outside its declared schema.
    Argument,
    /// A requested section does not exist in the template or artifact.
    UnknownSection,
    /// An uncompilable stub artifact was asked to render.
    Uncompiled,
    /// A helper implementation failed.
    Helper,
    /// A compiled body referenced state the executor does not have. Indicates
    /// a corrupted or hand-edited artifact payload.
    InvalidArtifact,
}

impl RenderError {
    pub fn new(kind: RenderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying error cause, preserving the full chain for
    /// logging. The source is wrapped in an `Arc` so that `RenderError`
    /// remains `Clone`.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    // Convenience constructors for common error types

    pub fn unknown_section(name: &str) -> Self {
        Self::new(
            RenderErrorKind::UnknownSection,
            format!("unknown section: {name}"),
        )
    }

    pub fn uncompiled(identifier: &str) -> Self {
        Self::new(
            RenderErrorKind::Uncompiled,
            format!("artifact \"{identifier}\" is an uncompilable stub and cannot render"),
        )
    }

    pub fn missing_argument(helper: &str, argument: &str) -> Self {
        Self::new(
            RenderErrorKind::Argument,
            format!("helper \"{helper}\" requires argument \"{argument}\""),
        )
    }

    pub fn unknown_argument(helper: &str, argument: &str) -> Self {
        Self::new(
            RenderErrorKind::Argument,
            format!("helper \"{helper}\" does not declare argument \"{argument}\""),
        )
    }

    pub fn argument_type(helper: &str, argument: &str, expected: &str, got: &str) -> Self {
        Self::new(
            RenderErrorKind::Argument,
            format!(
                "helper \"{helper}\" argument \"{argument}\" expects {expected}, got {got}"
            ),
        )
    }

    pub fn helper(message: impl Into<String>) -> Self {
        Self::new(RenderErrorKind::Helper, message)
    }

    pub fn invalid_artifact(message: impl Into<String>) -> Self {
        Self::new(RenderErrorKind::InvalidArtifact, message)
    }
}

impl From<ResolveError> for RenderError {
    fn from(err: ResolveError) -> Self {
        let message = err.to_string();
        Self {
            kind: RenderErrorKind::UnknownHelper,
            message,
            source: Some(Arc::new(err)),
        }
    }
}

impl From<ExpressionError> for RenderError {
    fn from(err: ExpressionError) -> Self {
        let message = err.to_string();
        Self {
            kind: RenderErrorKind::Expression,
            message,
            source: Some(Arc::new(err)),
        }
    }
}
