//! Built-in template sources.
//!
//! Both templates live next to the crate in `templates/` and are compiled
//! into the binary. They are constants for the lifetime of the process;
//! nothing replaces or edits them at run time.

/// Per-registry `hosts.toml` template, rendered against
/// [`HostConfig`](crate::HostConfig).
///
/// Template variables:
/// - `program`: name used in the header line
/// - `default`: optional upstream endpoint (`url`, `tls`)
/// - `endpoints`: mirror endpoints (`url`, `override_path`, `tls`, `rewrites`)
pub const HOSTS_TEMPLATE: &str = include_str!("../templates/hosts.toml.jinja");

/// Body of containerd's `config.toml`, rendered against
/// [`ContainerdConfig`](crate::ContainerdConfig). Outer templates reach it as
/// `{% include "base" %}`.
pub const BASE_TEMPLATE: &str = include_str!("../templates/config.toml.jinja");

/// Name under which [`BASE_TEMPLATE`] is attached to runtime templates.
pub const BASE_TEMPLATE_NAME: &str = "base";

/// Outer template used when no custom runtime template is configured.
pub const DEFAULT_RUNTIME_TEMPLATE: &str = "{% include \"base\" %}";

/// Header line written at the top of every generated hosts file.
///
/// ```rust
/// assert_eq!(
///     ctrconf::hosts_header("k3s"),
///     "# File generated by k3s. DO NOT EDIT.\n",
/// );
/// ```
pub fn hosts_header(program: &str) -> String {
    format!("# File generated by {}. DO NOT EDIT.\n", program)
}
