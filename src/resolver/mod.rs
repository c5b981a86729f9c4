//! Helper name resolution.
//!
//! The resolver maps a namespace alias plus a helper identifier (possibly
//! hierarchical, like `format.cdata`) to a registered helper factory. An
//! alias owns an ordered list of namespace roots; roots added later win on
//! collision. An alias mapped to no roots at all marks the namespace as
//! known-but-ignored: its tags render as literal markup instead of being
//! invoked. Aliases containing `*` glob-match dot-segmented namespace
//! identifiers and also cause ignoring.
//!
//! Helper types live in an explicit [`HelperRegistry`] populated at startup;
//! resolution derives a candidate type name from the identifier
//! (title-cased dot segments plus the `Helper` suffix) and probes each root
//! for it, newest root first.
//!
//! The namespace, alias and memoization tables are expected to be shared
//! read-mostly across renders: mutation requires `&mut self` and callers
//! serialize it against concurrent reads; only the resolution memo is
//! internally locked so [`resolve`](HelperResolver::resolve) can take
//! `&self`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use regex::Regex;
use tracing::trace;

use crate::error::ResolveError;
use crate::helper::Helper;
use crate::helper::builtins::{CdataHelper, IfHelper};

/// Creates a fresh helper instance per invocation.
pub type HelperFactory = Arc<dyn Fn() -> Box<dyn Helper> + Send + Sync>;

/// The default namespace alias and its root.
pub const DEFAULT_ALIAS: &str = "s";
pub const DEFAULT_ROOT: &str = "stencil.helpers";

// ── Registry ────────────────────────────────────────────────────────────

/// Explicit mapping from fully qualified type keys (`root.TypeName`) to
/// helper factories, populated at startup.
pub struct HelperRegistry {
    types: HashMap<String, HelperFactory>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register a helper type under a namespace root. The type name is the
    /// resolution candidate, e.g. `Format.CdataHelper`.
    pub fn register<F>(&mut self, root: &str, type_name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Helper> + Send + Sync + 'static,
    {
        self.types
            .insert(format!("{root}.{type_name}"), Arc::new(factory));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<HelperFactory> {
        self.types.get(key).cloned()
    }
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Resolver ────────────────────────────────────────────────────────────

pub struct HelperResolver {
    /// Alias to ordered namespace roots; no roots marks the alias ignored.
    namespaces: IndexMap<String, Option<Vec<String>>>,
    /// Bare helper name to (namespace, identifier), consulted only when an
    /// invocation carries no namespace prefix.
    aliases: HashMap<String, (String, String)>,
    registry: HelperRegistry,
    /// Memoized (namespace, identifier) to registry key.
    resolved: Mutex<HashMap<(String, String), String>>,
    /// Compiled glob patterns for wildcard-bearing aliases.
    ignore_patterns: HashMap<String, Regex>,
}

impl HelperResolver {
    /// An empty resolver: no namespaces, no aliases, no registered helpers.
    pub fn new() -> Self {
        Self {
            namespaces: IndexMap::new(),
            aliases: HashMap::new(),
            registry: HelperRegistry::new(),
            resolved: Mutex::new(HashMap::new()),
            ignore_patterns: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &HelperRegistry {
        &self.registry
    }

    /// Register a helper type under a namespace root.
    pub fn register<F>(&mut self, root: &str, type_name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Helper> + Send + Sync + 'static,
    {
        self.registry.register(root, type_name, factory);
        self.resolved.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// The current namespace table. The compiler snapshots this into every
    /// artifact it produces.
    pub fn namespaces(&self) -> &IndexMap<String, Option<Vec<String>>> {
        &self.namespaces
    }

    /// Add namespace roots for an alias. Repeated calls for one alias
    /// accumulate unique roots, never replace; later roots win on
    /// resolution collisions.
    pub fn add_namespace(&mut self, alias: &str, roots: Option<Vec<String>>) {
        if alias.contains('*') {
            self.compile_ignore_pattern(alias);
        }
        match self.namespaces.get_mut(alias) {
            None | Some(None) => {
                self.namespaces.insert(alias.to_string(), roots);
            }
            Some(Some(existing)) => {
                if let Some(new_roots) = roots {
                    for root in new_roots {
                        if !existing.contains(&root) {
                            existing.push(root);
                        }
                    }
                }
            }
        }
    }

    /// Add namespaces in bulk without clearing what is already registered.
    /// Used by compiled artifacts to re-register their namespace snapshot.
    pub fn add_namespaces(&mut self, namespaces: IndexMap<String, Option<Vec<String>>>) {
        for (alias, roots) in namespaces {
            self.add_namespace(&alias, roots);
        }
    }

    /// Replace the whole namespace table. This clears all previously added
    /// namespaces including the default alias, plus the resolution memo.
    pub fn set_namespaces(&mut self, namespaces: IndexMap<String, Option<Vec<String>>>) {
        self.namespaces.clear();
        self.ignore_patterns.clear();
        self.resolved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        for (alias, roots) in namespaces {
            self.add_namespace(&alias, roots);
        }
    }

    /// Register an alias so a bare helper name resolves to a namespaced one.
    pub fn add_alias(&mut self, alias: &str, namespace: &str, name: &str) {
        self.aliases
            .insert(alias.to_string(), (namespace.to_string(), name.to_string()));
    }

    pub fn is_alias_registered(&self, alias: &str) -> bool {
        self.aliases.contains_key(alias)
    }

    /// A namespace is valid when it is known and not marked ignored.
    pub fn is_namespace_valid(&self, alias: &str) -> bool {
        matches!(self.namespaces.get(alias), Some(Some(_)))
    }

    /// A namespace is ignored when it is known with no roots, or when any
    /// wildcard-bearing alias glob-matches it.
    pub fn is_namespace_ignored(&self, alias: &str) -> bool {
        if matches!(self.namespaces.get(alias), Some(None)) {
            return true;
        }
        self.ignore_patterns
            .values()
            .any(|pattern| pattern.is_match(alias))
    }

    pub fn is_namespace_valid_or_ignored(&self, alias: &str) -> bool {
        self.is_namespace_valid(alias)
            || self.namespaces.contains_key(alias)
            || self.is_namespace_ignored(alias)
    }

    /// Resolve a helper to its registered factory.
    ///
    /// Without a namespace the alias table is consulted first. The alias's
    /// roots are searched in reverse insertion order for the derived
    /// candidate type name; the first root that concretely registers it
    /// wins. Results are memoized per (namespace, identifier).
    pub fn resolve(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<HelperFactory, ResolveError> {
        let (namespace, name) = match namespace {
            Some(ns) if !ns.is_empty() => (ns.to_string(), name.to_string()),
            _ => match self.aliases.get(name) {
                Some((ns, ident)) => (ns.clone(), ident.clone()),
                None => (String::new(), name.to_string()),
            },
        };

        let memo_key = (namespace.clone(), name.clone());
        {
            let memo = self.resolved.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(key) = memo.get(&memo_key)
                && let Some(factory) = self.registry.get(key)
            {
                return Ok(factory);
            }
        }

        let candidate = candidate_type_name(&name);
        let roots = match self.namespaces.get(&namespace) {
            Some(Some(roots)) => roots.clone(),
            _ => Vec::new(),
        };

        for root in roots.iter().rev() {
            let key = format!("{root}.{candidate}");
            if let Some(factory) = self.registry.get(&key) {
                trace!(%namespace, %name, %key, "resolved helper");
                self.resolved
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(memo_key, key);
                return Ok(factory);
            }
        }

        Err(ResolveError {
            namespace,
            name,
            candidate,
            searched: roots.into_iter().rev().collect(),
        })
    }

    /// Resolve and instantiate a helper.
    pub fn create_helper(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Box<dyn Helper>, ResolveError> {
        self.resolve(namespace, name).map(|factory| factory())
    }

    fn compile_ignore_pattern(&mut self, alias: &str) {
        if self.ignore_patterns.contains_key(alias) {
            return;
        }
        let pattern = alias.replace('.', "\\.").replace('*', "[a-zA-Z0-9\\.]*");
        if let Ok(regex) = Regex::new(&pattern) {
            self.ignore_patterns.insert(alias.to_string(), regex);
        }
    }
}

/// The defaults: the `s` alias pointing at the built-in helper root, with
/// the built-in helpers registered.
impl Default for HelperResolver {
    fn default() -> Self {
        let mut resolver = Self::new();
        resolver.add_namespace(DEFAULT_ALIAS, Some(vec![DEFAULT_ROOT.to_string()]));
        resolver.register(DEFAULT_ROOT, "IfHelper", || Box::new(IfHelper));
        resolver.register(DEFAULT_ROOT, "Format.CdataHelper", || Box::new(CdataHelper));
        resolver
    }
}

/// Derive the candidate type name for a helper identifier: each dot segment
/// title-cased, joined with dots, plus the fixed `Helper` suffix.
/// `format.cdata` becomes `Format.CdataHelper`.
pub fn candidate_type_name(name: &str) -> String {
    let titled: Vec<String> = name.split('.').map(ucfirst).collect();
    format!("{}Helper", titled.join("."))
}

fn ucfirst(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
