//! Per-registry `hosts.toml` rendering.
//!
//! The output is read by containerd's mirror resolver. Emission order:
//!
//! 1. `# File generated by <program>. DO NOT EDIT.`
//! 2. if the default endpoint has a URL: `server`, `capabilities` with
//!    `push`, then its TLS settings
//! 3. `[host]`
//! 4. one `[host."<url>"]` table per endpoint, in the given order, with
//!    `pull`/`resolve` capabilities, `override_path`, TLS settings and a
//!    `rewrite` sub-table sorted by pattern
//!
//! TLS settings emit only what is set: `ca` for a CA file, `client` when a
//! certificate or a key is set (the missing half as `""`), `skip_verify`
//! when verification is disabled.

use std::collections::HashSet;

use ctrconf_template::RenderError;
use tracing::debug;

use crate::model::HostConfig;
use crate::renderer::{builtin_defect, Renderer};
use crate::templates::HOSTS_TEMPLATE;
use crate::Error;

impl Renderer {
    /// Renders `config` with the built-in hosts template.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when an endpoint URL is not absolute, when two
    /// endpoints share a URL (each URL names one TOML table), or when the
    /// output exceeds the renderer's size bound.
    pub fn render_hosts(&self, config: &HostConfig) -> Result<String, RenderError> {
        if let Some(url) = duplicate_url(config) {
            return Err(RenderError::invalid_model(
                "hosts",
                format!("endpoint '{}' is listed more than once", url),
            ));
        }
        let compiled = self
            .builtin_compiler()
            .compile(HOSTS_TEMPLATE)
            .unwrap_or_else(|err| builtin_defect(err));
        let text = compiled.render(config)?;
        debug!(
            program = %config.program,
            endpoints = config.endpoints.len(),
            "rendered hosts file"
        );
        Ok(text)
    }

    /// Renders `config` with an externally supplied hosts template.
    ///
    /// Compile failures of `template` are returned, never raised.
    pub fn render_hosts_with(&self, template: &str, config: &HostConfig) -> Result<String, Error> {
        let compiled = self.compiler().compile(template)?;
        Ok(compiled.render(config)?)
    }
}

fn duplicate_url(config: &HostConfig) -> Option<&str> {
    let mut seen = HashSet::new();
    config
        .endpoints
        .iter()
        .map(|e| e.url.as_str())
        .find(|url| !seen.insert(*url))
}

/// Renders `config` with the built-in hosts template and the shared renderer.
///
/// ```rust
/// use ctrconf::{render_hosts, Endpoint, HostConfig};
///
/// let config = HostConfig::new("k3s")
///     .with_endpoint(Endpoint::new("https://mirror.local").with_rewrite("^/v2/", "/v2/cache/"));
/// let text = render_hosts(&config).unwrap();
/// assert!(text.contains("[host.\"https://mirror.local\".rewrite]"));
/// ```
pub fn render_hosts(config: &HostConfig) -> Result<String, RenderError> {
    Renderer::shared().render_hosts(config)
}

/// Renders `config` with a custom hosts template and the shared renderer.
pub fn render_hosts_with(template: &str, config: &HostConfig) -> Result<String, Error> {
    Renderer::shared().render_hosts_with(template, config)
}
