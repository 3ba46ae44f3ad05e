//! Bluegreen - zero-downtime Cloud Foundry deployments
//!
//! Usage:
//!   bluegreen deploy --environment prod --artifact app.zip --app api --org acme --space prod
//!   bluegreen environments

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bluegreen_core::config::{Config, ConfigStore};
use bluegreen_core::courier::CfCourier;
use bluegreen_core::deployer::{DeployReport, Deployer};
use bluegreen_core::deployment::DeploymentInfo;
use bluegreen_core::extractor::Extractor;

#[derive(Parser)]
#[command(name = "bluegreen")]
#[command(about = "Blue-green deployments to Cloud Foundry", long_about = None)]
struct Cli {
    /// Path to bluegreen.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy an application archive to one foundation
    Deploy(Box<DeployArgs>),

    /// List configured environments
    #[command(alias = "envs")]
    Environments {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct DeployArgs {
    /// Environment key from bluegreen.toml
    #[arg(long, short)]
    environment: String,

    /// Foundation to deploy to (defaults to the environment's first foundation)
    #[arg(long)]
    foundation: Option<String>,

    /// Zip archive containing the application
    #[arg(long, short)]
    artifact: PathBuf,

    /// Application name
    #[arg(long)]
    app: String,

    /// Cloud Foundry org
    #[arg(long)]
    org: String,

    /// Cloud Foundry space
    #[arg(long)]
    space: String,

    /// Instance count (defaults to the environment setting)
    #[arg(long, short)]
    instances: Option<u16>,

    /// Manifest file replacing the one bundled in the archive
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Skip SSL validation regardless of the environment setting
    #[arg(long)]
    skip_ssl: bool,

    /// Path to the cf executable
    #[arg(long, default_value = "cf")]
    cf_binary: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "bluegreen=debug,bluegreen_core=debug,info"
    } else {
        "bluegreen=info,bluegreen_core=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = match cli.config {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::from_default_location()?,
    };

    match cli.command {
        Commands::Deploy(args) => run_deploy(&store, *args),
        Commands::Environments { format } => run_environments(&store, format),
    }
}

fn run_deploy(store: &ConfigStore, args: DeployArgs) -> Result<()> {
    let config: Config = store.load_from_env()?;
    let environment = config.environment(&args.environment)?;
    let foundation = environment.select_foundation(args.foundation.as_deref())?;
    let foundation = foundation.as_str().trim_end_matches('/').to_string();

    let manifest = args
        .manifest
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read manifest: {}", path.display()))
        })
        .transpose()?;

    let staging = tempfile::Builder::new()
        .prefix("bluegreen-app-")
        .tempdir()
        .context("Failed to create staging directory")?;
    Extractor::new().unzip(&args.artifact, staging.path(), manifest.as_deref())?;

    let info = DeploymentInfo {
        app_name: args.app,
        instances: args.instances.unwrap_or(environment.instances),
        username: config.username.clone(),
        password: config.password.clone(),
        org: args.org,
        space: args.space,
        skip_ssl: args.skip_ssl || environment.skip_ssl,
        domain: environment.domain.clone(),
    };

    let deployer = Deployer::new(CfCourier::with_binary(args.cf_binary)?);

    // Keep stdout machine-readable when emitting JSON
    let result = match args.format {
        OutputFormat::Table => {
            deployer.deploy(&foundation, staging.path(), &info, &mut std::io::stdout())
        }
        OutputFormat::Json => {
            deployer.deploy(&foundation, staging.path(), &info, &mut std::io::stderr())
        }
    };

    match result {
        Ok(report) => print_report(&report, args.format),
        Err(failure) => {
            print_report(&failure.report, args.format)?;
            if let (OutputFormat::Table, Some(logs)) = (args.format, &failure.report.logs) {
                eprintln!("\nRecent platform logs:\n{}", logs);
            }
            Err(failure.into())
        }
    }
}

fn print_report(report: &DeployReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout)?;
            writeln!(stdout, "App:        {}", report.app)?;
            writeln!(stdout, "Foundation: {}", report.foundation)?;
            writeln!(stdout, "State:      {}", report.state)?;
            writeln!(
                stdout,
                "Duration:   {}s",
                (report.finished_at - report.started_at).num_seconds()
            )?;
            for warning in &report.warnings {
                writeln!(stdout, "  ⚠ {}", warning)?;
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    Ok(())
}

fn run_environments(store: &ConfigStore, format: OutputFormat) -> Result<()> {
    let file = store.load_file()?;

    match format {
        OutputFormat::Table => {
            if file.environments.is_empty() {
                println!(
                    "No environments configured in {}",
                    store.config_path().display()
                );
                return Ok(());
            }
            println!("{:<12} {:<16} {:<28} FOUNDATIONS", "KEY", "NAME", "DOMAIN");
            for (key, env) in &file.environments {
                println!(
                    "{:<12} {:<16} {:<28} {}",
                    key,
                    env.name,
                    env.domain,
                    env.foundations.join(", ")
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&file.environments)?);
        }
    }
    Ok(())
}
