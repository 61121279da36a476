use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::RouterConfig;
use crate::definition::{HandlerTable, RegistryDefinition};
use crate::dispatcher::Dispatcher;
use crate::logging::{init_logging_with_config, LogConfig};
use crate::registry::HandlerRegistry;
use crate::transport::Request;

/// Command-line interface for nsrouter
#[derive(Parser, Debug)]
#[command(name = "nsrouter")]
#[command(about = "Inspect and exercise namespace registries", long_about = None)]
pub struct Cli {
    /// Router configuration file (YAML)
    #[arg(short, long, global = true, env = "NSR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every handler in a registry definition
    Routes {
        /// Registry definition file (YAML)
        #[arg(short, long)]
        definition: PathBuf,
    },
    /// Dispatch one request and print the response as JSON
    Resolve {
        /// Registry definition file (YAML)
        #[arg(short, long)]
        definition: PathBuf,

        /// HTTP method
        method: String,

        /// Request target: path plus optional query string
        target: String,

        /// `Accept` header, e.g. `*/*;version=v1`
        #[arg(long)]
        accept: Option<String>,

        /// JSON object used as body parameters
        #[arg(long, conflicts_with = "form")]
        body: Option<String>,

        /// Form-urlencoded body parameters
        #[arg(long)]
        form: Option<String>,

        /// Extra header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

/// Parse arguments, initialise logging and run the selected command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut log_config = LogConfig::from_env();
    if std::env::var("NSR_LOG_LEVEL").is_err() {
        if let Some(level) = &config.log_level {
            log_config.log_level.clone_from(level);
        }
    }
    let _guard = init_logging_with_config(&log_config)?;

    let stdout = io::stdout();
    run_command(&cli.command, &config, &mut stdout.lock())
}

fn load_config(cli: &Cli) -> Result<RouterConfig> {
    match &cli.config {
        Some(path) => RouterConfig::load(path),
        None => Ok(RouterConfig::from_env()),
    }
}

/// Run one command, writing its output to `out`.
pub fn run_command(command: &Commands, config: &RouterConfig, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Routes { definition } => {
            let registry = load_registry(definition, config)?;
            registry.write_routes(out)?;
            Ok(())
        }
        Commands::Resolve {
            definition,
            method,
            target,
            accept,
            body,
            form,
            headers,
        } => {
            let registry = load_registry(definition, config)?;
            let dispatcher = Dispatcher::from_config(Arc::new(registry), config)
                .context("Invalid CORS configuration")?;

            let mut builder = Request::builder(method, target);
            if let Some(accept) = accept {
                builder = builder.accept(accept);
            }
            for raw in headers {
                let (name, value) = parse_header(raw)?;
                builder = builder.header(name, value);
            }
            if let Some(body) = body {
                let value = serde_json::from_str(body).context("--body is not valid JSON")?;
                builder = builder.json_body(value);
            }
            if let Some(form) = form {
                builder = builder.form_body(form);
            }
            let req = builder.build()?;

            let resp = dispatcher.dispatch(&req);
            serde_json::to_writer_pretty(&mut *out, &resp)?;
            writeln!(out)?;
            Ok(())
        }
    }
}

fn load_registry(path: &Path, config: &RouterConfig) -> Result<HandlerRegistry> {
    let mut definition = RegistryDefinition::load(path)?;
    if definition.default_group.is_none() {
        definition.default_group = Some(config.default_group.clone());
    }
    let registry = definition
        .build(&HandlerTable::with_echo_fallback())
        .with_context(|| format!("Invalid registry in {}", path.display()))?;
    info!(
        definition = %path.display(),
        handlers = registry.walk().len(),
        versions = registry.version_ids().len(),
        "Registry loaded"
    );
    Ok(registry)
}

fn parse_header(raw: &str) -> Result<(&str, &str)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("header '{raw}' must look like 'Name: value'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("header '{raw}' has an empty name"));
    }
    Ok((name, value.trim()))
}
