//! ejbmd - merge and orchestrate the EJB metadata of one module
//!
//! Reads a module bundle (descriptors plus scanned class metadata), runs the
//! merge and the binding orchestration, and prints the result as JSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ejbmd_common::config::{CliOverrides, ConfigResolver, OnError, RuntimeVersion};
use ejbmd_common::descriptor::load_module_bundle;
use ejbmd_merge::{EjbMdOrchestrator, Error, FactoryOptions, ModuleInitDataFactory, OrchestratorConfig};
use tracing::{error, info};

/// Command-line arguments for ejbmd
#[derive(Parser, Debug)]
#[command(name = "ejbmd")]
#[command(about = "Merge EJB deployment descriptors with class annotations")]
#[command(version)]
struct Args {
    /// Module bundle (.toml or .json)
    #[arg(short, long)]
    module: PathBuf,

    /// Configuration file (default: <config dir>/ejbmd/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Severity of custom binding violations: warn, fail or ignore
    #[arg(long)]
    on_error: Option<OnError>,

    /// Runtime compatibility level: 3.1 or 3.2
    #[arg(long)]
    runtime_version: Option<RuntimeVersion>,

    /// Enable stateful session failover
    #[arg(long)]
    sfsb_failover: bool,

    /// Stop after the merge and print the module init data
    #[arg(long)]
    init_data_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new(CliOverrides {
        config_path: args.config.clone(),
        on_error: args.on_error,
        runtime_version: args.runtime_version,
        sfsb_failover: args.sfsb_failover.then_some(true),
    })
    .resolve()
    .context("Failed to resolve configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting ejbmd v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("EJBMD_GIT_HASH"),
        env!("EJBMD_BUILD_TIMESTAMP"),
        env!("EJBMD_BUILD_PROFILE")
    );
    info!(
        on_error = %config.custom_bindings_on_error,
        runtime_version = %config.runtime_version,
        sfsb_failover = config.sfsb_failover,
        "Configuration resolved"
    );

    let bundle = load_module_bundle(&args.module)
        .with_context(|| format!("Failed to load module bundle {}", args.module.display()))?;
    let (descriptors, classes) = bundle.into_parts();
    let module_name = descriptors.module_name.clone();

    let factory = ModuleInitDataFactory::new(FactoryOptions::from(&config));
    let init_data = match factory.create_module_init_data(descriptors, &classes) {
        Ok(data) => data,
        Err(e) => return report_failure(&module_name, e),
    };

    if args.init_data_only {
        println!("{}", serde_json::to_string_pretty(&init_data)?);
        return Ok(());
    }

    let orchestrator = EjbMdOrchestrator::new(OrchestratorConfig::from(&config), &classes);
    let metadata = match orchestrator.process_module(&init_data) {
        Ok(metadata) => metadata,
        Err(e) => return report_failure(&module_name, e),
    };

    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

/// Print every diagnostic, one per line, then fail.
fn report_failure(module: &str, e: Error) -> Result<()> {
    let diagnostics = e.diagnostics();
    if diagnostics.is_empty() {
        error!(module, "{}", e);
    }
    for diagnostic in &diagnostics {
        eprintln!("{}", diagnostic);
    }
    bail!("module {} failed with {} error(s)", module, diagnostics.len().max(1))
}
