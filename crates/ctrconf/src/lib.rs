//! # ctrconf - containerd Configuration Rendering
//!
//! `ctrconf` turns typed configuration models into the text files containerd
//! reads: the main `config.toml` and one `hosts.toml` per registry, which
//! tells containerd's mirror resolver which endpoints to try for that
//! registry.
//!
//! Rendering is a pure function of template and model. Output is always
//! TOML, and identical inputs produce byte-identical text.
//!
//! ## Hosts Files
//!
//! ```rust
//! use ctrconf::{render_hosts, Endpoint, HostConfig, TlsConfig};
//!
//! let config = HostConfig::new("k3s")
//!     .with_default(Endpoint::new("https://registry-1.docker.io"))
//!     .with_endpoint(Endpoint::new("https://mirror.local").with_tls(TlsConfig {
//!         ca_file: Some("/etc/ssl/mirror-ca.pem".into()),
//!         ..TlsConfig::default()
//!     }));
//!
//! let text = render_hosts(&config).unwrap();
//! assert!(text.starts_with("# File generated by k3s. DO NOT EDIT.\n"));
//! assert!(text.contains("server = \"https://registry-1.docker.io\""));
//! assert!(text.contains("[host.\"https://mirror.local\"]"));
//! ```
//!
//! ## Runtime Configuration
//!
//! Custom runtime templates are compiled together with the built-in base
//! template and reach it by name:
//!
//! ```rust
//! use ctrconf::{render_runtime_config, ContainerdConfig};
//!
//! let config = ContainerdConfig { program: "k3s".into(), ..Default::default() };
//! let text = render_runtime_config("{% include \"base\" %}\n# extra\n", &config).unwrap();
//! assert!(text.ends_with("# extra\n"));
//!
//! // Broken custom templates are ordinary errors.
//! assert!(render_runtime_config("{% if %}", &config).is_err());
//! ```
//!
//! ## Errors
//!
//! Custom template text comes from administrators and may be wrong:
//! compile failures are returned as [`Error::Compile`]. The built-in
//! templates are part of the crate and are expected to compile; if one does
//! not, the renderer panics.

pub mod hosts;
pub mod load;
pub mod model;
mod renderer;
pub mod runtime;
pub mod templates;

pub use ctrconf_template::{CompileError, Error, Limits, RenderError};
pub use hosts::{render_hosts, render_hosts_with};
pub use load::{load_model, parse_model, Format, LoadError};
pub use model::{
    AgentConfig, AuthConfig, ContainerdConfig, ContainerdPaths, Endpoint, HostConfig, Mirror,
    NodeConfig, Registry, RegistryConfig, RuntimeSpec, TlsConfig,
};
pub use renderer::Renderer;
pub use runtime::{render_default_runtime_config, render_runtime_config};
pub use templates::{
    hosts_header, BASE_TEMPLATE, BASE_TEMPLATE_NAME, DEFAULT_RUNTIME_TEMPLATE, HOSTS_TEMPLATE,
};
