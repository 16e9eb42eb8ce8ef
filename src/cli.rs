//! CLI argument parsing for the parcel-dispatch binary.

use chrono::NaiveTime;
use clap::{Parser, Subcommand};

use crate::types::{ParcelId, TruckId};

#[derive(Parser)]
#[command(name = "parcel-dispatch", about = "Parcel delivery day simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the delivery day and print event logs and metrics (default if no subcommand given)
    Simulate {
        /// Print the fleet summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show parcel status at a time of day
    Status {
        /// Time of day, 24-hour HH:MM
        #[arg(long, value_parser = parse_query_time)]
        at: NaiveTime,
        /// Single parcel id; all parcels when omitted
        #[arg(long)]
        parcel: Option<ParcelId>,
        /// Print parcel views as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the nearest-neighbour decisions taken by each truck
    Trace {
        /// Restrict output to one truck
        #[arg(long)]
        truck: Option<TruckId>,
    },
}

/// Parse a 24-hour "HH:MM" time of day.
pub fn parse_query_time(raw: &str) -> Result<NaiveTime, String> {
    let (hours, minutes) = raw
        .trim()
        .split_once(':')
        .ok_or_else(|| format!("'{}' is not in HH:MM format", raw))?;

    let parse = |part: &str| {
        if part.is_empty() || part.len() > 2 || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        part.parse::<u32>().ok()
    };

    match (parse(hours), parse(minutes)) {
        (Some(h), Some(m)) => NaiveTime::from_hms_opt(h, m, 0)
            .ok_or_else(|| format!("'{}' is outside 00:00-23:59", raw)),
        _ => Err(format!("'{}' is not in HH:MM format", raw)),
    }
}
