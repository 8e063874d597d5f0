//! Template compilation, rendering and the compiled-template cache.
//!
//! A [`CompiledTemplate`] is a minijinja environment holding one root
//! template plus any number of named sub-templates the root can
//! `{% include %}`. It is immutable once built and can be rendered from many
//! threads at once.
//!
//! [`TemplateCompiler`] caches compiled templates by their source texts and
//! the helper set, so repeated renders of the same text compile once.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CompileError, RenderError};
use crate::helpers::{register_helpers, HELPER_NAMES};
use crate::limits::Limits;

/// Name under which the root template of a [`CompiledTemplate`] is stored.
pub const ROOT_TEMPLATE_NAME: &str = "compiled_template";

static RAW_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{%[-+]?\s*raw\s*[-+]?%\}.*?\{%[-+]?\s*endraw\s*[-+]?%\}")
        .expect("raw block pattern")
});

static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{#.*?#\}").expect("comment pattern"));

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}").expect("tag pattern"));

static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#).expect("string literal pattern")
});

static FILTER_PIPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*([A-Za-z_][A-Za-z0-9_]*)").expect("filter pipe pattern"));

static FILTER_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{%[-+]?\s*filter\s+([A-Za-z_][A-Za-z0-9_]*)").expect("filter block pattern")
});

/// An executable template set.
///
/// # Example
///
/// ```rust
/// use ctrconf_template::{CompiledTemplate, Limits};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Model { program: String }
///
/// let mut compiled = CompiledTemplate::compile(
///     "{% include 'header' %}[host]\n",
///     &Limits::default(),
/// ).unwrap();
/// compiled
///     .attach_named("header", "# File generated by {{ program }}. DO NOT EDIT.\n")
///     .unwrap();
///
/// let text = compiled.render(&Model { program: "k3s".into() }).unwrap();
/// assert_eq!(text, "# File generated by k3s. DO NOT EDIT.\n[host]\n");
/// ```
#[derive(Debug)]
pub struct CompiledTemplate {
    env: Environment<'static>,
    limits: Limits,
}

impl CompiledTemplate {
    /// Compiles `source` as the root template.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] on a syntax error or when the template
    /// references a filter outside the helper set and minijinja's built-ins.
    pub fn compile(source: &str, limits: &Limits) -> Result<Self, CompileError> {
        let mut env = new_environment(limits);
        add_checked(&mut env, ROOT_TEMPLATE_NAME, source)?;
        debug!(bytes = source.len(), "compiled template");
        Ok(Self {
            env,
            limits: limits.clone(),
        })
    }

    /// Adds a named sub-template that the root (or other sub-templates) can
    /// include by name.
    pub fn attach_named(&mut self, name: &str, source: &str) -> Result<(), CompileError> {
        if name == ROOT_TEMPLATE_NAME {
            return Err(CompileError::new(
                name,
                "the name is reserved for the root template",
            ));
        }
        add_checked(&mut self.env, name, source)?;
        debug!(name, bytes = source.len(), "attached named template");
        Ok(())
    }

    /// Renders the root template against `model`.
    ///
    /// The model is serialized with serde; template field access is checked
    /// strictly, so reading a field the model does not have is an error.
    pub fn render<T: Serialize + ?Sized>(&self, model: &T) -> Result<String, RenderError> {
        let template = self
            .env
            .get_template(ROOT_TEMPLATE_NAME)
            .map_err(|e| RenderError::evaluation(ROOT_TEMPLATE_NAME, e))?;
        let output = template
            .render(Value::from_serialize(model))
            .map_err(|e| RenderError::evaluation(ROOT_TEMPLATE_NAME, e))?;

        if let Some(limit) = self.limits.max_output_bytes {
            if output.len() > limit {
                return Err(RenderError::OutputLimit {
                    limit,
                    actual: output.len(),
                });
            }
        }

        debug!(bytes = output.len(), "rendered template");
        Ok(output)
    }

    /// Returns true if a template with this name is part of the set.
    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}

fn new_environment(limits: &Limits) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_fuel(limits.fuel);
    register_helpers(&mut env);
    env
}

fn add_checked(
    env: &mut Environment<'static>,
    name: &str,
    source: &str,
) -> Result<(), CompileError> {
    env.add_template_owned(name.to_string(), source.to_string())
        .map_err(|e| CompileError::from_minijinja(name, &e))?;

    let unknown: Vec<String> = referenced_filters(source)
        .into_iter()
        .filter(|filter| !is_known_filter(env, filter))
        .collect();
    if !unknown.is_empty() {
        env.remove_template(name);
        return Err(CompileError::new(
            name,
            format!("unknown helper function(s): {}", unknown.join(", ")),
        ));
    }
    Ok(())
}

/// Collects the filter names used in expression and statement tags.
fn referenced_filters(source: &str) -> BTreeSet<String> {
    let without_raw = RAW_BLOCK.replace_all(source, "");
    let code_only = COMMENT.replace_all(&without_raw, "");
    let mut names = BTreeSet::new();
    for tag in TAG.find_iter(&code_only) {
        let code = STRING_LITERAL.replace_all(tag.as_str(), "\"\"");
        for caps in FILTER_PIPE.captures_iter(&code) {
            names.insert(caps[1].to_string());
        }
        if let Some(caps) = FILTER_BLOCK.captures(&code) {
            names.insert(caps[1].to_string());
        }
    }
    names
}

// Built-in filters are discovered by probing: only an unregistered name fails
// with UnknownFilter.
fn is_known_filter(env: &Environment<'static>, name: &str) -> bool {
    if HELPER_NAMES.contains(&name) {
        return true;
    }
    match env.render_str(&format!("{{{{ none | {} }}}}", name), minijinja::context! {}) {
        Ok(_) => true,
        Err(err) => err.kind() != ErrorKind::UnknownFilter,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: String,
    named: Vec<(String, String)>,
    helpers: &'static [&'static str],
}

impl CacheKey {
    fn new(source: &str, named: &[(&str, &str)]) -> Self {
        Self {
            source: source.to_string(),
            named: named
                .iter()
                .map(|(name, src)| (name.to_string(), src.to_string()))
                .collect(),
            helpers: HELPER_NAMES,
        }
    }
}

/// Compiles templates and caches the results.
///
/// The cache is read-mostly: hits take a shared lock, only misses take the
/// exclusive one. A compiler is `Send + Sync` and is meant to be shared.
///
/// ```rust
/// use ctrconf_template::{Limits, TemplateCompiler};
///
/// let compiler = TemplateCompiler::new(Limits::default());
/// let first = compiler.compile("{{ program }}").unwrap();
/// let second = compiler.compile("{{ program }}").unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug)]
pub struct TemplateCompiler {
    limits: Limits,
    cache: RwLock<HashMap<CacheKey, Arc<CompiledTemplate>>>,
}

impl TemplateCompiler {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Compiles a root template with no named sub-templates.
    pub fn compile(&self, source: &str) -> Result<Arc<CompiledTemplate>, CompileError> {
        self.compile_with(source, &[])
    }

    /// Compiles a root template and attaches `named` sub-templates in order.
    ///
    /// The root is compiled first, so a broken root is reported before any
    /// sub-template is looked at.
    pub fn compile_with(
        &self,
        source: &str,
        named: &[(&str, &str)],
    ) -> Result<Arc<CompiledTemplate>, CompileError> {
        let key = CacheKey::new(source, named);
        if let Some(hit) = self.read_cache().get(&key) {
            debug!("compiled template cache hit");
            return Ok(Arc::clone(hit));
        }

        let mut compiled = CompiledTemplate::compile(source, &self.limits)?;
        for (name, src) in named {
            compiled.attach_named(name, src)?;
        }
        let compiled = Arc::new(compiled);

        if self.limits.cache_capacity > 0 {
            let mut cache = self.write_cache();
            if cache.len() >= self.limits.cache_capacity {
                warn!(
                    entries = cache.len(),
                    "compiled template cache full, clearing"
                );
                cache.clear();
            }
            cache.insert(key, Arc::clone(&compiled));
        }
        Ok(compiled)
    }

    /// Compiles (or fetches) `source` and renders it against `model`.
    pub fn render<T: Serialize + ?Sized>(
        &self,
        source: &str,
        model: &T,
    ) -> Result<String, crate::Error> {
        Ok(self.compile(source)?.render(model)?)
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Number of compiled templates currently cached.
    pub fn cached(&self) -> usize {
        self.read_cache().len()
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, Arc<CompiledTemplate>>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, Arc<CompiledTemplate>>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TemplateCompiler {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}
