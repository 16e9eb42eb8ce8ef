//! Parcel records and time-derived delivery status

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parcel identifier (positive, unique for the run)
pub type ParcelId = u32;

/// Street address of a parcel destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Delivery deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "time")]
pub enum Deadline {
    EndOfDay,
    By(NaiveTime),
}

impl Deadline {
    /// Parse deadline text as found in the parcel table ("EOD", "10:30 AM", "9:00").
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("eod") {
            return Some(Deadline::EndOfDay);
        }

        NaiveTime::parse_from_str(&text.to_uppercase(), "%I:%M %p")
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
            .ok()
            .map(Deadline::By)
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deadline::EndOfDay => write!(f, "EOD"),
            Deadline::By(time) => write!(f, "{}", time.format("%-I:%M %p")),
        }
    }
}

/// Delivery status of a parcel at a given time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryStatus {
    AtHub,
    EnRoute,
    Delivered,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeliveryStatus::AtHub => "At Hub",
            DeliveryStatus::EnRoute => "En Route",
            DeliveryStatus::Delivered => "Delivered",
        };
        f.write_str(label)
    }
}

/// Dispatch and delivery times, always recorded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStamp {
    /// Departure time of the truck that carried the parcel
    pub dispatched_at: NaiveTime,
    /// Arrival time at the destination
    pub delivered_at: NaiveTime,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StampError {
    #[error("parcel {0} already has a delivery stamp")]
    AlreadyStamped(ParcelId),
    #[error("parcel {id}: delivery at {delivered_at} precedes dispatch at {dispatched_at}")]
    DeliveredBeforeDispatch {
        id: ParcelId,
        dispatched_at: NaiveTime,
        delivered_at: NaiveTime,
    },
}

/// Time-conditional address correction for a single parcel.
///
/// Before `cutoff` the parcel reads as `before`, at or after it as `after`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressOverride {
    pub parcel_id: ParcelId,
    pub cutoff: NaiveTime,
    pub before: StreetAndZip,
    pub after: StreetAndZip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetAndZip {
    pub street: String,
    pub zip: String,
}

impl AddressOverride {
    fn apply(&self, address: &mut Address, at: NaiveTime) {
        let chosen = if at < self.cutoff { &self.before } else { &self.after };
        address.street = chosen.street.clone();
        address.zip = chosen.zip.clone();
    }
}

/// Parcel record held in the parcel store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    pub id: ParcelId,
    pub address: Address,
    pub deadline: Deadline,
    pub weight: f64,
    pub notes: String,
    stamp: Option<DeliveryStamp>,
}

impl Parcel {
    pub fn new(id: ParcelId, address: Address, deadline: Deadline, weight: f64, notes: String) -> Self {
        Self {
            id,
            address,
            deadline,
            weight,
            notes,
            stamp: None,
        }
    }

    pub fn stamp(&self) -> Option<DeliveryStamp> {
        self.stamp
    }

    pub fn dispatched_at(&self) -> Option<NaiveTime> {
        self.stamp.map(|s| s.dispatched_at)
    }

    pub fn delivered_at(&self) -> Option<NaiveTime> {
        self.stamp.map(|s| s.delivered_at)
    }

    /// Record dispatch and delivery. Allowed once per parcel.
    pub fn record_delivery(
        &mut self,
        dispatched_at: NaiveTime,
        delivered_at: NaiveTime,
    ) -> Result<(), StampError> {
        if self.stamp.is_some() {
            return Err(StampError::AlreadyStamped(self.id));
        }
        if delivered_at < dispatched_at {
            return Err(StampError::DeliveredBeforeDispatch {
                id: self.id,
                dispatched_at,
                delivered_at,
            });
        }

        self.stamp = Some(DeliveryStamp {
            dispatched_at,
            delivered_at,
        });
        Ok(())
    }

    /// Status at the given time of day
    pub fn status_at(&self, at: NaiveTime) -> DeliveryStatus {
        match self.stamp {
            None => DeliveryStatus::AtHub,
            Some(s) if at < s.dispatched_at => DeliveryStatus::AtHub,
            Some(s) if at < s.delivered_at => DeliveryStatus::EnRoute,
            Some(_) => DeliveryStatus::Delivered,
        }
    }

    /// Snapshot of the parcel as it reads at `at`, with any address correction applied.
    pub fn view_at(&self, at: NaiveTime, correction: Option<&AddressOverride>) -> ParcelView {
        let mut address = self.address.clone();
        if let Some(correction) = correction.filter(|c| c.parcel_id == self.id) {
            correction.apply(&mut address, at);
        }

        ParcelView {
            id: self.id,
            address,
            deadline: self.deadline,
            weight: self.weight,
            notes: self.notes.clone(),
            status: self.status_at(at),
            dispatched_at: self.dispatched_at(),
            delivered_at: self.delivered_at(),
            queried_at: at,
        }
    }
}

/// Read-only parcel snapshot for a query time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelView {
    pub id: ParcelId,
    pub address: Address,
    pub deadline: Deadline,
    pub weight: f64,
    pub notes: String,
    pub status: DeliveryStatus,
    pub dispatched_at: Option<NaiveTime>,
    pub delivered_at: Option<NaiveTime>,
    pub queried_at: NaiveTime,
}
