//! `ctrconf` - render containerd configuration files from model files.
//!
//! ```text
//! ctrconf hosts docker.io.toml --output certs.d/docker.io/hosts.toml
//! ctrconf runtime node.json --template config.toml.tmpl
//! ctrconf header k3s
//! ```
//!
//! Models are JSON or TOML, chosen by extension. Output goes to stdout unless
//! `--output` is given; nothing is written when rendering fails.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ctrconf::{hosts_header, load_model, ContainerdConfig, HostConfig, Limits, Renderer};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ctrconf", version, about = "Render containerd configuration files")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    limits: LimitArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct LimitArgs {
    /// Read render limits from a TOML or JSON file
    #[arg(long, global = true, value_name = "FILE")]
    limits: Option<PathBuf>,

    /// Instruction budget per render (0 disables the bound)
    #[arg(long, global = true, value_name = "N")]
    fuel: Option<u64>,

    /// Largest allowed output in bytes (0 disables the bound)
    #[arg(long, global = true, value_name = "BYTES")]
    max_output: Option<usize>,
}

impl LimitArgs {
    fn resolve(&self) -> Result<Limits> {
        let mut limits = match &self.limits {
            Some(path) => load_model::<Limits>(path)
                .with_context(|| format!("loading limits from {}", path.display()))?,
            None => Limits::default(),
        };
        if let Some(fuel) = self.fuel {
            limits = limits.with_fuel((fuel > 0).then_some(fuel));
        }
        if let Some(max) = self.max_output {
            limits = limits.with_max_output_bytes((max > 0).then_some(max));
        }
        Ok(limits)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a registry hosts.toml from a HostConfig model
    Hosts(RenderArgs),
    /// Render containerd's config.toml from a ContainerdConfig model
    Runtime(RenderArgs),
    /// Print the header line written at the top of hosts files
    Header {
        /// Program name to put in the header
        program: String,
    },
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Model file (.json or .toml)
    model: PathBuf,

    /// Custom template file instead of the built-in one
    #[arg(short, long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let renderer = Renderer::new(cli.limits.resolve()?);

    match &cli.command {
        Command::Hosts(args) => {
            let config: HostConfig = load_model(&args.model)
                .with_context(|| format!("loading hosts model {}", args.model.display()))?;
            let text = match read_template(args.template.as_deref())? {
                Some(template) => renderer.render_hosts_with(&template, &config)?,
                None => renderer.render_hosts(&config)?,
            };
            emit(&text, args.output.as_deref())
        }
        Command::Runtime(args) => {
            let config: ContainerdConfig = load_model(&args.model)
                .with_context(|| format!("loading runtime model {}", args.model.display()))?;
            let text = match read_template(args.template.as_deref())? {
                Some(template) => renderer.render_runtime_config(&template, &config)?,
                None => renderer.render_default_runtime_config(&config)?,
            };
            emit(&text, args.output.as_deref())
        }
        Command::Header { program } => emit(&hosts_header(program), None),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_template(path: Option<&Path>) -> Result<Option<String>> {
    path.map(|path| {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading template {}", path.display()))
    })
    .transpose()
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = text.len(), "wrote rendered file");
        }
        None => print!("{}", text),
    }
    Ok(())
}
