//! containerd `config.toml` rendering.
//!
//! A runtime template is an outer template, usually supplied by an
//! administrator, compiled together with the built-in base template. The
//! outer template pulls the base in with `{% include "base" %}` and can add
//! to or wrap it:
//!
//! ```jinja
//! {% include "base" %}
//!
//! [plugins."io.containerd.grpc.v1.cri".containerd.runtimes.gvisor]
//!   runtime_type = "io.containerd.runsc.v1"
//! ```

use ctrconf_template::{RenderError, TemplateCompiler};
use tracing::debug;

use crate::model::ContainerdConfig;
use crate::renderer::{builtin_defect, Renderer};
use crate::templates::{BASE_TEMPLATE, BASE_TEMPLATE_NAME, DEFAULT_RUNTIME_TEMPLATE};
use crate::Error;

impl Renderer {
    /// Renders `config` with `template` as the outer template.
    ///
    /// # Errors
    ///
    /// [`Error::Compile`] when `template` does not compile, [`Error::Render`]
    /// when rendering fails.
    pub fn render_runtime_config(
        &self,
        template: &str,
        config: &ContainerdConfig,
    ) -> Result<String, Error> {
        compose_and_render(self.compiler(), template, config)
    }

    /// Renders `config` with the base template alone.
    ///
    /// Only the built-in templates run here, so no fuel budget applies.
    pub fn render_default_runtime_config(
        &self,
        config: &ContainerdConfig,
    ) -> Result<String, RenderError> {
        match compose_and_render(self.builtin_compiler(), DEFAULT_RUNTIME_TEMPLATE, config) {
            Ok(text) => Ok(text),
            Err(Error::Render(err)) => Err(err),
            Err(Error::Compile(err)) => builtin_defect(err),
        }
    }
}

fn compose_and_render(
    compiler: &TemplateCompiler,
    template: &str,
    config: &ContainerdConfig,
) -> Result<String, Error> {
    let compiled = match compiler.compile_with(template, &[(BASE_TEMPLATE_NAME, BASE_TEMPLATE)]) {
        Ok(compiled) => compiled,
        Err(err) if err.template() == BASE_TEMPLATE_NAME => builtin_defect(err),
        Err(err) => return Err(err.into()),
    };
    let text = compiled.render(config)?;
    debug!(
        program = %config.program,
        extra_runtimes = config.extra_runtimes.len(),
        bytes = text.len(),
        "rendered runtime config"
    );
    Ok(text)
}

/// Renders `config` with a custom outer template and the shared renderer.
pub fn render_runtime_config(template: &str, config: &ContainerdConfig) -> Result<String, Error> {
    Renderer::shared().render_runtime_config(template, config)
}

/// Renders `config` with the base template and the shared renderer.
pub fn render_default_runtime_config(config: &ContainerdConfig) -> Result<String, RenderError> {
    Renderer::shared().render_default_runtime_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuthConfig, Registry, RegistryConfig, RuntimeSpec};
    use ctrconf_template::Limits;

    fn config() -> ContainerdConfig {
        let mut config = ContainerdConfig {
            program: "k3s".into(),
            systemd_cgroup: true,
            ..ContainerdConfig::default()
        };
        config.node_config.containerd.opt = "/var/lib/rancher/k3s/agent/containerd".into();
        config.node_config.containerd.registry =
            "/var/lib/rancher/k3s/agent/etc/containerd/certs.d".into();
        config.node_config.agent.snapshotter = "overlayfs".into();
        config.node_config.agent.pause_image = Some("rancher/mirrored-pause:3.6".into());
        config.node_config.agent.cni_bin_dir = "/var/lib/rancher/k3s/data/current/bin".into();
        config.node_config.agent.cni_conf_dir = "/var/lib/rancher/k3s/agent/etc/cni/net.d".into();
        config
    }

    #[test]
    fn test_default_runtime_config() {
        let text = render_default_runtime_config(&config()).unwrap();
        assert!(text.starts_with(
            "# File generated by k3s. DO NOT EDIT. Use config.toml.tmpl instead.\nversion = 2\n"
        ));
        assert!(text.contains("  sandbox_image = \"rancher/mirrored-pause:3.6\"\n"));
        assert!(text.contains("  snapshotter = \"overlayfs\"\n"));
        assert!(text.contains("  disable_snapshot_annotations = true\n"));
        assert!(text.contains("  SystemdCgroup = true\n"));
        assert!(text.contains("[plugins.\"io.containerd.grpc.v1.cri\".cni]\n"));
        assert!(!text.contains("disable_cgroup"));
        assert!(!text.contains("tasks-service"));
    }

    #[test]
    fn test_outer_template_wraps_base() {
        let text = render_runtime_config(
            "{% include \"base\" %}\n# custom tail for {{ program }}\n",
            &config(),
        )
        .unwrap();
        assert!(text.starts_with("# File generated by k3s."));
        assert!(text.ends_with("\n# custom tail for k3s\n"));
    }

    #[test]
    fn test_outer_template_compile_error_is_recoverable() {
        let err =
            render_runtime_config("{% include \"base\" %}{% endif %}", &config()).unwrap_err();
        match err {
            Error::Compile(err) => assert_ne!(err.template(), BASE_TEMPLATE_NAME),
            other => panic!("expected compile error, got {}", other),
        }
    }

    #[test]
    fn test_outer_template_comment_may_mention_any_filter() {
        let text = render_runtime_config(
            "{# {{ x | shout }} #}{% include \"base\" %}",
            &config(),
        )
        .unwrap();
        assert!(text.starts_with("# File generated by k3s."));
    }

    #[test]
    fn test_default_config_ignores_fuel_budget() {
        let renderer = Renderer::new(Limits::default().with_fuel(Some(50)));
        assert!(renderer.render_default_runtime_config(&config()).is_ok());

        let err = renderer
            .render_runtime_config("{% include \"base\" %}", &config())
            .unwrap_err();
        assert!(matches!(err, Error::Render(ref e) if e.is_out_of_fuel()));
    }

    #[test]
    fn test_outer_template_missing_field_is_render_error() {
        let err = render_runtime_config("{{ node_config.kubelet_args }}", &config()).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn test_extra_runtimes_are_sorted() {
        let mut config = config();
        config.extra_runtimes.insert(
            "nvidia".into(),
            RuntimeSpec::new("io.containerd.runc.v2", "/usr/bin/nvidia-container-runtime"),
        );
        config.extra_runtimes.insert(
            "crun".into(),
            RuntimeSpec::new("io.containerd.runc.v2", "/usr/bin/crun"),
        );

        let text = render_default_runtime_config(&config).unwrap();
        let crun = text.find("runtimes.\"crun\"]").unwrap();
        let nvidia = text.find("runtimes.\"nvidia\"]").unwrap();
        assert!(crun < nvidia);
        assert!(text.contains("  BinaryName = \"/usr/bin/crun\"\n"));
    }

    #[test]
    fn test_private_registry_auth() {
        let mut config = config();
        let mut registry = Registry::default();
        registry.configs.insert(
            "registry.example.com".into(),
            RegistryConfig {
                auth: Some(AuthConfig {
                    username: Some("admin".into()),
                    password: Some("p\"w".into()),
                    ..AuthConfig::default()
                }),
                tls: None,
            },
        );
        registry
            .configs
            .insert("docker.io".into(), RegistryConfig::default());
        config.private_registry_config = Some(registry);

        let text = render_default_runtime_config(&config).unwrap();
        assert!(text.contains(
            "[plugins.\"io.containerd.grpc.v1.cri\".registry.configs.\"registry.example.com\".auth]\n\
             \x20 username = \"admin\"\n\
             \x20 password = \"p\\\"w\"\n"
        ));
        assert!(!text.contains("configs.\"docker.io\""));
    }

    #[test]
    fn test_stargz_keychain() {
        let mut config = config();
        config.node_config.agent.snapshotter = "stargz".into();
        config.node_config.agent.image_service_socket =
            Some("/run/k3s/containerd/image.sock".into());
        let text = render_default_runtime_config(&config).unwrap();
        assert!(text.contains("  disable_snapshot_annotations = false\n"));
        assert!(text.contains(
            "[plugins.\"io.containerd.snapshotter.v1.stargz\".cri_keychain]\n  enable_keychain = true\n"
        ));
    }
}
