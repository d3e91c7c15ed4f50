//! # orv CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use orv_cli::catalog::{run_describe, run_resources, DescribeArgs};
use orv_cli::validate::{run_package, run_validate, PackageArgs, ValidateArgs};
use orv_cli::{Context, Settings};

/// Open Referral validator
///
/// Checks CSV files and data packages against the Open Referral (HSDS)
/// table schemas.
#[derive(Parser, Debug)]
#[command(name = "orv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Data package to validate against instead of the bundled Open Referral one.
    #[arg(long, global = true)]
    datapackage: Option<String>,

    /// Timeout in seconds for remote fetches and existence probes.
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the resources of the data package.
    Resources,

    /// Print a resource definition with its key-tagged schema.
    Describe(DescribeArgs),

    /// Validate a CSV file against a resource type.
    Validate(ValidateArgs),

    /// Validate every resource of a data package.
    Package(PackageArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings {
        datapackage: cli.datapackage,
        timeout: Duration::from_secs(cli.timeout.max(1)),
    };

    let ctx = match Context::load(&settings).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Commands::Resources => run_resources(&ctx, &mut stdout),
        Commands::Describe(args) => run_describe(args, &ctx, &mut stdout),
        Commands::Validate(args) => run_validate(args, &ctx, &mut stdout).await,
        Commands::Package(args) => run_package(args, &ctx, &mut stdout).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
