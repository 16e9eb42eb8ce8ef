//! Route types

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::{ParcelId, Truck, TruckId};

/// Kind of route event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Stopped,
    Delivered,
    Return,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::Stopped => "stopped",
            EventKind::Delivered => "delivered",
            EventKind::Return => "return",
        }
    }
}

/// Entry in a truck's event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEvent {
    pub truck: TruckId,
    pub kind: EventKind,
    pub at: NaiveTime,
    /// Odometer reading; absent for delivered events
    pub miles: Option<f64>,
    /// Street address for stopped/return, "Package {id}" for delivered
    pub target: String,
}

impl RouteEvent {
    pub fn stopped(truck: &Truck) -> Self {
        Self {
            truck: truck.id,
            kind: EventKind::Stopped,
            at: truck.clock,
            miles: Some(truck.miles),
            target: truck.location.clone(),
        }
    }

    pub fn delivered(truck: &Truck, parcel_id: ParcelId) -> Self {
        Self {
            truck: truck.id,
            kind: EventKind::Delivered,
            at: truck.clock,
            miles: None,
            target: format!("Package {}", parcel_id),
        }
    }

    pub fn returned(truck: &Truck) -> Self {
        Self {
            truck: truck.id,
            kind: EventKind::Return,
            at: truck.clock,
            miles: Some(truck.miles),
            target: truck.location.clone(),
        }
    }
}

impl fmt::Display for RouteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let miles = self
            .miles
            .map(|m| format!("{:.1}", m))
            .unwrap_or_default();
        write!(
            f,
            "{},{},{},{},{}",
            self.truck,
            self.kind.as_str(),
            self.at.format("%H:%M:%S"),
            miles,
            self.target
        )
    }
}

/// Location reference resolved through the parcel store: a parcel's stop or the depot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "id")]
pub enum StopRef {
    Hub,
    Parcel(ParcelId),
}

impl fmt::Display for StopRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopRef::Hub => f.write_str("Hub"),
            StopRef::Parcel(id) => write!(f, "{}", id),
        }
    }
}

/// One nearest-neighbour decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionTrace {
    /// Where the truck stood when choosing
    pub from: StopRef,
    /// Parcels examined, in scan order
    pub candidates: Vec<ParcelId>,
    pub chosen: ParcelId,
    pub leg_miles: f64,
    pub total_miles: f64,
}

/// Completed run of one truck
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruckRun {
    pub truck: Truck,
    pub events: Vec<RouteEvent>,
    pub trace: Vec<SelectionTrace>,
}

impl TruckRun {
    pub fn returned_at(&self) -> NaiveTime {
        self.truck.clock
    }

    pub fn delivered_count(&self) -> usize {
        self.truck.manifest.len()
    }
}
