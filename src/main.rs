//! minio-reconcile - Main entry point
//!
//! Parses arguments, reconciles the requested resources and prints a single
//! JSON report on stdout. Logs go to stderr.

use anyhow::Context;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use minio_reconcile::cli::{Cli, Commands};
use minio_reconcile::{
    BatchConfig, Connection, FailureReport, McClient, ReconcileOptions, Report, Resource,
    reconcile_all, reconcile_resource,
};

/// Initialize logging; RUST_LOG overrides the default `info` level
fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logger();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    let report = match run(&cli) {
        Ok(report) => report,
        Err(e) => {
            error!("{e:#}");
            FailureReport::from(&e).into()
        }
    };

    println!("{}", report.to_json());
    if report.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: &Cli) -> anyhow::Result<Report> {
    let options = ReconcileOptions {
        check_mode: cli.check,
    };
    if options.check_mode {
        info!("Check mode: no changes will be made");
    }

    match &cli.command {
        Commands::Validate { config } => {
            info!("Validating configuration file: {:?}", config);
            let batch = BatchConfig::load_from_file(config)?;
            batch.validate()?;
            info!("Configuration validation successful");
            Ok(Report::validated(batch.resources.len()))
        }
        Commands::Apply { config } => {
            info!("Applying configuration file: {:?}", config);
            let batch = BatchConfig::load_from_file(config)?;
            batch.validate()?;

            let client = McClient::locate(cli.mc_path.clone(), batch.auth.as_ref())?;
            let results = reconcile_all(&client, options, &batch.resources)?;
            Ok(Report::batch(results))
        }
        Commands::Alias(args) => run_single(cli, options, Resource::Alias(args.desired()?), None),
        Commands::Bucket(args) => {
            let resource = Resource::Bucket(args.desired()?);
            run_single(cli, options, resource, args.auth.connection()?)
        }
        Commands::Policy(args) => {
            let resource = Resource::Policy(args.desired()?);
            run_single(cli, options, resource, args.auth.connection()?)
        }
        Commands::User(args) => {
            let resource = Resource::User(args.desired()?);
            run_single(cli, options, resource, args.auth.connection()?)
        }
    }
}

fn run_single(
    cli: &Cli,
    options: ReconcileOptions,
    resource: Resource,
    connection: Option<Connection>,
) -> anyhow::Result<Report> {
    let client = McClient::locate(cli.mc_path.clone(), connection.as_ref())?;
    let outcome = reconcile_resource(&client, options, &resource)
        .with_context(|| format!("{} '{}'", resource.kind(), resource.name()))?;
    Ok(Report::single(outcome))
}
