//! Render inputs.
//!
//! Plain data passed to the renderers. Field names are what templates see:
//! `{{ default.tls.ca_file }}`, `{{ node_config.agent.snapshotter }}`.
//!
//! Maps are `BTreeMap`s so that anything iterating them (templates included)
//! sees keys in sorted order, independent of how the map was built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Inputs for one registry's `hosts.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Upstream registry endpoint, the only one granted `push`.
    pub default: Option<Endpoint>,
    /// Name written into the generated-file header.
    pub program: String,
    /// Mirror endpoints in preference order.
    pub endpoints: Vec<Endpoint>,
}

impl HostConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, endpoint: Endpoint) -> Self {
        self.default = Some(endpoint);
        self
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }
}

/// A single registry endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    pub override_path: bool,
    /// Absolute URL, e.g. `https://mirror.example.com/v2`.
    pub url: String,
    /// Request path rewrites, pattern to replacement.
    pub rewrites: BTreeMap<String, String>,
    pub tls: Option<TlsConfig>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_override_path(mut self, override_path: bool) -> Self {
        self.override_path = override_path;
        self
    }

    pub fn with_rewrite(
        mut self,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.rewrites.insert(pattern.into(), replacement.into());
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }
}

/// TLS material for an endpoint. Only populated fields are rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub ca_file: Option<String>,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub insecure_skip_verify: bool,
}

/// Inputs for containerd's `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerdConfig {
    pub node_config: NodeConfig,
    pub disable_cgroup: bool,
    pub systemd_cgroup: bool,
    pub is_running_in_user_ns: bool,
    pub enable_unprivileged: bool,
    /// Not read by the base template. Hosts-file assembly uses it to leave
    /// out the upstream default endpoint; custom templates may read it too.
    pub no_default_endpoint: bool,
    pub nonroot_devices: bool,
    pub private_registry_config: Option<Registry>,
    /// Additional OCI runtime handlers by name.
    pub extra_runtimes: BTreeMap<String, RuntimeSpec>,
    pub program: String,
}

/// An additional OCI runtime handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSpec {
    /// Shim type, e.g. `io.containerd.runc.v2`.
    pub runtime_type: String,
    pub binary_path: String,
}

impl RuntimeSpec {
    pub fn new(runtime_type: impl Into<String>, binary_path: impl Into<String>) -> Self {
        Self {
            runtime_type: runtime_type.into(),
            binary_path: binary_path.into(),
        }
    }
}

/// The part of the node's configuration the runtime template reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub selinux: bool,
    /// When set the node runs no bundled CNI and the CNI section is omitted.
    pub no_flannel: bool,
    pub containerd: ContainerdPaths,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerdPaths {
    /// containerd `opt` plugin directory.
    pub opt: String,
    /// Directory holding the per-registry `hosts.toml` files.
    pub registry: String,
    pub block_io_config: Option<String>,
    pub rdt_config: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub pause_image: Option<String>,
    pub snapshotter: String,
    pub image_service_socket: Option<String>,
    pub cni_bin_dir: String,
    pub cni_conf_dir: String,
}

/// Private registry settings: mirrors and per-host credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
    /// Not read by the base template: mirrors become per-registry hosts
    /// files, rendered separately from a [`HostConfig`].
    pub mirrors: BTreeMap<String, Mirror>,
    pub configs: BTreeMap<String, RegistryConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mirror {
    pub endpoints: Vec<String>,
    pub rewrites: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub auth: Option<AuthConfig>,
    /// Not read by the base template: TLS settings reach containerd through
    /// the hosts files, as an [`Endpoint`]'s `tls`.
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth: Option<String>,
    pub identity_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_iterate_sorted() {
        let a = Endpoint::new("https://m1")
            .with_rewrite("/z/", "/1/")
            .with_rewrite("/a/", "/2/");
        let b = Endpoint::new("https://m1")
            .with_rewrite("/a/", "/2/")
            .with_rewrite("/z/", "/1/");
        assert_eq!(a, b);
        let keys: Vec<_> = a.rewrites.keys().cloned().collect();
        assert_eq!(keys, vec!["/a/", "/z/"]);
    }

    #[test]
    fn test_host_config_deserializes_with_defaults() {
        let config: HostConfig = serde_json::from_str(
            r#"{"program": "k3s", "endpoints": [{"url": "https://m1"}]}"#,
        )
        .unwrap();
        assert!(config.default.is_none());
        assert_eq!(config.endpoints.len(), 1);
        assert!(!config.endpoints[0].override_path);
        assert!(config.endpoints[0].tls.is_none());
    }

    #[test]
    fn test_optional_fields_serialize_as_null() {
        let value = serde_json::to_value(TlsConfig::default()).unwrap();
        assert!(value.get("ca_file").unwrap().is_null());
    }
}
