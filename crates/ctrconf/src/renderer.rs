//! Shared rendering front end.
//!
//! [`Renderer`] owns the [`TemplateCompiler`]s both file renderers compile
//! through: one for administrator-supplied templates, bounded by the
//! configured [`Limits`], and one for the built-in templates, which keeps the
//! output bound but runs without a fuel budget so large models render. The
//! rendering entry points themselves live in [`crate::hosts`] and
//! [`crate::runtime`].

use ctrconf_template::{CompileError, Limits, TemplateCompiler};
use once_cell::sync::Lazy;

static DEFAULT_RENDERER: Lazy<Renderer> = Lazy::new(Renderer::default);

/// Renders hosts files and runtime configuration.
///
/// A renderer is `Send + Sync`; share one across threads rather than
/// creating one per render.
///
/// ```rust
/// use ctrconf::{HostConfig, Limits, Renderer};
///
/// let renderer = Renderer::new(Limits::default().with_fuel(Some(100_000)));
/// let text = renderer.render_hosts(&HostConfig::new("k3s")).unwrap();
/// assert_eq!(text, "# File generated by k3s. DO NOT EDIT.\n[host]\n");
/// ```
#[derive(Debug)]
pub struct Renderer {
    compiler: TemplateCompiler,
    builtin: TemplateCompiler,
}

impl Renderer {
    pub fn new(limits: Limits) -> Self {
        Self {
            builtin: TemplateCompiler::new(limits.clone().with_fuel(None)),
            compiler: TemplateCompiler::new(limits),
        }
    }

    /// Compiler for custom templates.
    pub fn compiler(&self) -> &TemplateCompiler {
        &self.compiler
    }

    pub(crate) fn builtin_compiler(&self) -> &TemplateCompiler {
        &self.builtin
    }

    /// The process-wide renderer used by the free functions of this crate.
    pub fn shared() -> &'static Renderer {
        &DEFAULT_RENDERER
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

/// The built-in templates ship with the crate; failing to compile one is a
/// build defect, not an input error.
pub(crate) fn builtin_defect(err: CompileError) -> ! {
    tracing::error!(template = err.template(), "built-in template failed to compile");
    panic!("built-in template is invalid: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_compiler_has_no_fuel_budget() {
        let renderer = Renderer::new(Limits::default().with_fuel(Some(500)));
        assert_eq!(renderer.compiler().limits().fuel, Some(500));
        assert_eq!(renderer.builtin_compiler().limits().fuel, None);
        assert_eq!(
            renderer.builtin_compiler().limits().max_output_bytes,
            renderer.compiler().limits().max_output_bytes
        );
    }
}
