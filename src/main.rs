use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courier::config::{Config, IgnoredEnvValue};

mod commands;

#[derive(Parser)]
#[command(
    name = "courier",
    version,
    about = "Proximity-based shipment dispatcher that offers shipments to the nearest drivers in rounds",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch every shipment to nearby drivers until all are accepted
    Run {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Shipments JSON file
        #[arg(long)]
        shipments: Option<PathBuf>,

        /// Drivers JSON file
        #[arg(long)]
        drivers: Option<PathBuf>,

        /// Driver endpoint base URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Milliseconds between rounds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Drivers offered each shipment per round
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Per-offer request timeout in seconds
        #[arg(long)]
        request_timeout: Option<u64>,

        /// Print Prometheus metrics after the run
        #[arg(long, default_value = "false")]
        print_metrics: bool,

        /// Print the summary as JSON instead of the round report
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show each shipment's ranked drivers without sending offers
    Plan {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Shipments JSON file
        #[arg(long)]
        shipments: Option<PathBuf>,

        /// Drivers JSON file
        #[arg(long)]
        drivers: Option<PathBuf>,

        /// Only show the nearest N drivers per shipment
        #[arg(short, long)]
        top: Option<usize>,

        /// Print the plan as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            shipments,
            drivers,
            endpoint,
            interval_ms,
            batch_size,
            request_timeout,
            print_metrics,
            json,
        } => {
            let (mut config, ignored) = load_config(config.as_deref())?;
            apply_data_paths(&mut config, shipments, drivers);
            if let Some(endpoint) = endpoint {
                config.dispatch.endpoint = endpoint;
            }
            if let Some(interval_ms) = interval_ms {
                config.dispatch.interval_ms = interval_ms;
            }
            if let Some(batch_size) = batch_size {
                config.dispatch.batch_size = batch_size;
            }
            if let Some(request_timeout) = request_timeout {
                config.dispatch.request_timeout_secs = request_timeout;
            }

            setup_tracing(&config, cli.log_format.as_deref(), cli.verbose)?;
            report_ignored_env(&ignored);

            tracing::info!(
                endpoint = %config.dispatch.endpoint,
                interval_ms = config.dispatch.interval_ms,
                batch_size = config.dispatch.batch_size,
                "Starting dispatch run"
            );

            let outcome = commands::run(commands::RunParams {
                config,
                print_metrics,
                json,
            })
            .await?;

            Ok(ExitCode::from(outcome.exit_code()))
        }

        Commands::Plan {
            config,
            shipments,
            drivers,
            top,
            json,
        } => {
            let (mut config, ignored) = load_config(config.as_deref())?;
            apply_data_paths(&mut config, shipments, drivers);

            setup_tracing(&config, cli.log_format.as_deref(), cli.verbose)?;
            report_ignored_env(&ignored);

            commands::plan(config, top, json).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Defaults or the given file, then environment overrides
///
/// Tracing is not set up yet, so unparseable overrides are handed back.
fn load_config(path: Option<&Path>) -> Result<(Config, Vec<IgnoredEnvValue>)> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let ignored = config.apply_env_overrides();
    Ok((config, ignored))
}

fn report_ignored_env(ignored: &[IgnoredEnvValue]) {
    for entry in ignored {
        tracing::warn!(key = %entry.key, value = %entry.value, "Ignoring unparseable environment value");
    }
}

fn apply_data_paths(config: &mut Config, shipments: Option<PathBuf>, drivers: Option<PathBuf>) {
    if let Some(shipments) = shipments {
        config.data.shipments_path = shipments;
    }
    if let Some(drivers) = drivers {
        config.data.drivers_path = drivers;
    }
}

fn setup_tracing(config: &Config, format: Option<&str>, verbose: bool) -> Result<()> {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("courier={level},warn")));

    // Logs go to stderr so stdout carries only the round report.
    match format.unwrap_or(config.logging.format.as_str()) {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}
