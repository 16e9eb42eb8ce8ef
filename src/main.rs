//! Parcel Dispatch - delivery day simulator
//!
//! Loads the parcel and distance tables, routes every truck with a
//! nearest-neighbour heuristic and reports events, metrics and parcel status.

mod cli;
mod config;
mod defaults;
mod services;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::defaults::default_address_override;
use crate::services::fleet::{run_fleet, DeliveryContext, FleetPlan, FleetSummary};
use crate::services::loader::{load_distance_index, load_parcels};
use crate::services::report;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    std::fs::create_dir_all(&config.logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.logs_dir, "parcel-dispatch.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - stderr (stdout carries the report) and JSON file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,parcel_dispatch=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking).with_ansi(false))
        .init();

    info!("Starting Parcel Dispatch...");

    let result = run(cli.command.unwrap_or(Command::Simulate { json: false }), &config);
    if let Err(e) = &result {
        error!("Simulation failed: {:#}", e);
    }
    result
}

fn run(command: Command, config: &Config) -> Result<()> {
    let (ctx, summary) = simulate(config)?;

    match command {
        Command::Simulate { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", report::simulation_report(&summary));
            }
        }
        Command::Status { at, parcel, json } => {
            let views = match parcel {
                Some(id) => vec![ctx
                    .parcel_at(id, at)
                    .with_context(|| format!("parcel {} not found", id))?],
                None => ctx.parcels_at(at),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                println!("{}", report::status_report(at, &views));
                if parcel.is_none() {
                    println!("{}", report::status_counts(&ctx.status_counts(at)));
                }
            }
        }
        Command::Trace { truck } => {
            let runs: Vec<_> = match truck {
                Some(id) => vec![summary
                    .run(id)
                    .with_context(|| format!("truck {} is not in the plan", id))?],
                None => summary.runs.iter().collect(),
            };
            let traces: Vec<String> = runs.into_iter().map(report::selection_trace).collect();
            println!("{}", traces.join("\n\n"));
        }
    }

    Ok(())
}

/// Load the tables and run the standard delivery day.
fn simulate(config: &Config) -> Result<(DeliveryContext, FleetSummary)> {
    let parcels = load_parcels(&config.packages_csv, config.store_buckets)?;
    let distances = load_distance_index(&config.locations_csv, &config.distances_csv)?;
    info!(
        "Loaded {} parcels and {} locations",
        parcels.len(),
        distances.size()
    );

    let mut ctx = DeliveryContext::new(parcels, distances, config.dispatch_rules())
        .with_address_override(default_address_override());

    let summary = run_fleet(&mut ctx, &FleetPlan::standard_day()).context("Fleet simulation failed")?;
    Ok((ctx, summary))
}
