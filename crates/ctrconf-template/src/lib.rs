//! # ctrconf-template - Template Compiler for Runtime Configuration
//!
//! `ctrconf-template` compiles Jinja-syntax templates (via minijinja) into
//! [`CompiledTemplate`]s and renders them against serde-serializable models.
//! It is the engine behind the `ctrconf` renderers for containerd's
//! `config.toml` and per-registry `hosts.toml` files.
//!
//! ## Core Concepts
//!
//! - [`CompiledTemplate`]: a root template plus named sub-templates
//! - [`TemplateCompiler`]: a shared, caching front end to compilation
//! - [`Limits`]: fuel, output size and cache bounds
//! - [`HELPER_NAMES`]: the fixed helper set (`quote`, `toml_bool`, ...)
//!
//! ## Environment
//!
//! Every compiled template uses the same settings, chosen for line-oriented
//! TOML output:
//!
//! - a line holding only a block tag (`{% if %}`, `{% endfor %}`) renders
//!   nothing (`trim_blocks` + `lstrip_blocks`)
//! - the final newline of a template is kept
//! - nothing is auto-escaped
//! - undefined fields are errors, not empty strings
//!
//! ## Quick Start
//!
//! ```rust
//! use ctrconf_template::TemplateCompiler;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Mirror { url: String }
//!
//! let compiler = TemplateCompiler::default();
//! let text = compiler
//!     .render("server = {{ url | absolute_url | quote }}\n", &Mirror {
//!         url: "https://mirror.example.com".into(),
//!     })
//!     .unwrap();
//! assert_eq!(text, "server = \"https://mirror.example.com\"\n");
//! ```

mod compiler;
mod error;
mod helpers;
mod limits;

pub use compiler::{CompiledTemplate, TemplateCompiler, ROOT_TEMPLATE_NAME};
pub use error::{CompileError, RenderError};
pub use helpers::{deschemify, quote_toml, register_helpers, HELPER_NAMES};
pub use limits::Limits;

/// Failure of an operation that both compiles and renders.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
