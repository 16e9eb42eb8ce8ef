use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ParcelId;

/// Truck identifier as used in event logs
pub type TruckId = u8;

const MICROS_PER_HOUR: f64 = 3_600_000_000.0;

/// A leg that would end past midnight
#[derive(Debug, Clone, PartialEq, Error)]
#[error("truck {truck} cannot drive {miles:.1} mi from {at}: arrival is past midnight")]
pub struct ClockOverflow {
    pub truck: TruckId,
    pub at: NaiveTime,
    pub miles: f64,
}

/// Truck state for a single delivery run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    pub id: TruckId,
    /// Constant travel speed in miles per hour
    pub speed_mph: f64,
    /// Odometer for this run, in miles
    pub miles: f64,
    /// Street address the truck is currently at
    pub location: String,
    /// Simulation clock
    pub clock: NaiveTime,
    pub departed_at: NaiveTime,
    /// Parcels assigned before the run, delivered parcels (in order) after it
    pub manifest: Vec<ParcelId>,
}

impl Truck {
    pub fn new(
        id: TruckId,
        speed_mph: f64,
        hub_address: &str,
        departed_at: NaiveTime,
        manifest: Vec<ParcelId>,
    ) -> Self {
        Self {
            id,
            speed_mph,
            miles: 0.0,
            location: hub_address.to_string(),
            clock: departed_at,
            departed_at,
            manifest,
        }
    }

    /// Drive `distance` miles to `destination`, advancing odometer and clock.
    ///
    /// The truck is left unchanged when the leg would end past midnight.
    pub fn drive_to(&mut self, destination: &str, distance: f64) -> Result<(), ClockOverflow> {
        let clock = advance_clock(self.clock, distance / self.speed_mph).ok_or(ClockOverflow {
            truck: self.id,
            at: self.clock,
            miles: distance,
        })?;

        self.miles += distance;
        self.clock = clock;
        self.location = destination.to_string();
        Ok(())
    }

    /// Hours between departure and the current clock
    pub fn active_hours(&self) -> f64 {
        hours_between(self.departed_at, self.clock)
    }
}

/// Advance a time of day by fractional hours (microsecond resolution).
///
/// `None` when the result would wrap past midnight.
pub fn advance_clock(time: NaiveTime, hours: f64) -> Option<NaiveTime> {
    let micros = (hours * MICROS_PER_HOUR).round().max(0.0) as i64;
    let (next, wrapped_secs) = time.overflowing_add_signed(Duration::microseconds(micros));
    (wrapped_secs == 0).then_some(next)
}

/// Signed number of hours from `start` to `end`
pub fn hours_between(start: NaiveTime, end: NaiveTime) -> f64 {
    (end - start).num_microseconds().unwrap_or(0) as f64 / MICROS_PER_HOUR
}
