//! The template compiler.
//!
//! Converts a [`ParsingState`] into a cacheable [`CompiledArtifact`]: one
//! entry point per section (keyed by a stable hash of the section name), the
//! root render body, a layout accessor, and a snapshot of the resolver's
//! namespace table. The serialized payload is deterministic, so storing an
//! identical state twice yields byte-identical text.
//!
//! Compilation is a pure optimization: with no cache injected, or with
//! caching disabled in [`CompilerOptions`], `store` marks the state
//! non-compilable and the template is interpreted on every render. That
//! degrade is silent by design; only [`CompileError::Stopped`] and
//! resolution failures surface.

pub mod artifact;
pub mod converter;
pub mod program;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::ast::state::{ParsedTemplate, ParsingState};
use crate::ast::LayoutReference;
use crate::cache::TemplateCache;
use crate::error::CompileError;
use crate::resolver::HelperResolver;

use artifact::{CompiledArtifact, CompiledLayout, CompiledSection};
use converter::NodeConverter;

/// Compiler configuration.
///
/// ```rust
/// use stencil_lang::compiler::CompilerOptions;
///
/// let options = CompilerOptions::new()
///     .cache_enabled(true)
///     .detect_identifier_collisions(true);
/// ```
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// When `false` the compiler is disabled even with a cache injected.
    pub cache_enabled: bool,
    /// Distinct raw identifiers can sanitize to the same cache key. The
    /// default keeps the documented silent-collision behavior; enabling
    /// this turns a detected collision into an error.
    pub detect_identifier_collisions: bool,
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn detect_identifier_collisions(mut self, detect: bool) -> Self {
        self.detect_identifier_collisions = detect;
        self
    }
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            detect_identifier_collisions: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompilerMode {
    Normal,
    Warmup,
}

pub struct TemplateCompiler {
    options: CompilerOptions,
    mode: CompilerMode,
    cache: Option<Arc<dyn TemplateCache>>,
    /// In-process artifact instances, keyed by sanitized identifier.
    artifacts: HashMap<String, Arc<CompiledArtifact>>,
    /// Sanitized key to the raw identifier first stored under it.
    identifiers: HashMap<String, String>,
}

impl TemplateCompiler {
    pub fn new(cache: Option<Arc<dyn TemplateCache>>) -> Self {
        Self {
            options: CompilerOptions::default(),
            mode: CompilerMode::Normal,
            cache,
            artifacts: HashMap::new(),
            identifiers: HashMap::new(),
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Enter warmup mode: compilation runs ahead of real traffic and cache
    /// integrations may check [`is_warmup_mode`](Self::is_warmup_mode) to
    /// adjust their behavior. Cannot be reversed for this compiler's
    /// lifetime and does not alter the compilation algorithm.
    pub fn enter_warmup_mode(&mut self) {
        self.mode = CompilerMode::Warmup;
    }

    pub fn is_warmup_mode(&self) -> bool {
        self.mode == CompilerMode::Warmup
    }

    /// Compilation is disabled whenever caching is off.
    pub fn is_disabled(&self) -> bool {
        !self.options.cache_enabled || self.cache.is_none()
    }

    /// Replace every character outside `A-Za-z0-9_` and the extended
    /// `0x7f..=0xff` byte range with `_`.
    pub fn sanitize_identifier(identifier: &str) -> String {
        let bytes: Vec<u8> = identifier
            .bytes()
            .map(|b| {
                if b.is_ascii_alphanumeric() || b == b'_' || b >= 0x7f {
                    b
                } else {
                    b'_'
                }
            })
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Whether an artifact exists for this identifier, in memory or in the
    /// cache.
    pub fn has_compiled(&self, identifier: &str) -> bool {
        let key = Self::sanitize_identifier(identifier);
        if key.is_empty() {
            return false;
        }
        if self.artifacts.contains_key(&key) {
            return true;
        }
        if self.is_disabled() {
            return false;
        }
        self.cache.as_ref().map(|c| c.has(&key)).unwrap_or(false)
    }

    /// Fetch an artifact by identifier, loading and memoizing it from the
    /// cache when necessary.
    pub fn get_compiled(&mut self, identifier: &str) -> Result<Arc<CompiledArtifact>, CompileError> {
        let key = Self::sanitize_identifier(identifier);
        if let Some(artifact) = self.artifacts.get(&key) {
            return Ok(artifact.clone());
        }
        let payload = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get(&key))
            .ok_or_else(|| CompileError::NotFound {
                identifier: key.clone(),
            })?;
        let artifact = Arc::new(CompiledArtifact::from_payload(&payload)?);
        self.artifacts.insert(key, artifact.clone());
        Ok(artifact)
    }

    /// Compile a parsing state and persist the artifact.
    ///
    /// Returns the generated payload text, or `None` when compilation is
    /// disabled (the state is then marked non-compilable and stays
    /// interpreted). A state that is already non-compilable produces the
    /// deterministic uncompilable stub.
    pub fn store(
        &mut self,
        identifier: &str,
        state: &mut ParsingState,
        resolver: &HelperResolver,
    ) -> Result<Option<String>, CompileError> {
        if self.is_disabled() {
            debug!(identifier, "compilation disabled, staying interpreted");
            state.set_compilable(false);
            return Ok(None);
        }

        let key = Self::sanitize_identifier(identifier);
        if key.is_empty() {
            return Ok(None);
        }

        match self.identifiers.get(&key) {
            Some(existing) if existing != identifier => {
                if self.options.detect_identifier_collisions {
                    return Err(CompileError::IdentifierCollision {
                        key,
                        existing: existing.clone(),
                        incoming: identifier.to_string(),
                    });
                }
                warn!(%key, %existing, incoming = identifier, "identifier collision");
            }
            Some(_) => {}
            None => {
                self.identifiers.insert(key.clone(), identifier.to_string());
            }
        }

        if !state.is_compilable() {
            let stub = CompiledArtifact::uncompilable(key.clone());
            let payload = stub.to_payload()?;
            self.persist(&key, &payload, stub);
            return Ok(Some(payload));
        }

        let mut converter = NodeConverter::new(resolver);
        converter.set_variable_counter(0);

        let mut sections = IndexMap::new();
        for (name, node) in state.sections() {
            let body = converter.convert_list(node.children_or_self())?;
            sections.insert(
                CompiledArtifact::section_key(name),
                CompiledSection {
                    name: name.clone(),
                    body,
                },
            );
        }

        let root = converter.convert_list(state.root().children_or_self())?;

        let layout = match state.layout() {
            None => None,
            Some(LayoutReference::Literal(name)) => Some(CompiledLayout::Literal(name.clone())),
            Some(LayoutReference::Dynamic(node)) => {
                Some(CompiledLayout::Dynamic(converter.convert(node)?))
            }
        };

        let artifact = CompiledArtifact::compiled(
            key.clone(),
            root,
            sections,
            converter.into_closures(),
            layout,
            resolver.namespaces().clone(),
        );
        let payload = artifact.to_payload()?;
        debug!(
            identifier,
            %key,
            sections = state.sections().len(),
            has_layout = state.has_layout(),
            "stored compiled template"
        );
        self.persist(&key, &payload, artifact);
        Ok(Some(payload))
    }

    fn persist(&mut self, key: &str, payload: &str, artifact: CompiledArtifact) {
        if let Some(cache) = &self.cache {
            cache.set(key, payload);
        }
        self.artifacts.insert(key.to_string(), Arc::new(artifact));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(
            TemplateCompiler::sanitize_identifier("pages/home.html"),
            "pages_home_html"
        );
        assert_eq!(TemplateCompiler::sanitize_identifier("ok_name_9"), "ok_name_9");
        // the extended byte range is preserved
        assert_eq!(TemplateCompiler::sanitize_identifier("tmpl-é"), "tmpl_é");
    }

    #[test]
    fn test_disabled_compiler_degrades_silently() {
        let mut compiler = TemplateCompiler::new(None);
        assert!(compiler.is_disabled());
        let resolver = HelperResolver::default();
        let mut state = ParsingState::new("t", crate::ast::Node::text("hi"));
        let stored = compiler.store("t", &mut state, &resolver).unwrap();
        assert!(stored.is_none());
        assert!(!state.is_compilable());
        assert!(!compiler.has_compiled("t"));
    }
}
