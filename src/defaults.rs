use chrono::NaiveTime;

use crate::types::{AddressOverride, ParcelId, StreetAndZip};

pub const DEFAULT_SPEED_MPH: f64 = 18.0;

pub const DEFAULT_HUB_ADDRESS: &str = "4001 South 700 East";

/// Parcels picked on sight, ahead of any distance comparison
pub const DEFAULT_PRIORITY_PARCELS: [ParcelId; 2] = [25, 6];

pub const TRUCK_1_MANIFEST: [ParcelId; 15] = [1, 29, 7, 30, 8, 34, 40, 13, 39, 14, 15, 16, 19, 20, 37];
pub const TRUCK_2_MANIFEST: [ParcelId; 11] = [6, 5, 21, 4, 24, 23, 26, 22, 10, 11, 31];
pub const TRUCK_3_MANIFEST: [ParcelId; 14] = [17, 12, 25, 28, 32, 3, 18, 36, 38, 27, 35, 2, 33, 9];

/// Parcel whose listed address is corrected during the day
pub const CORRECTED_PARCEL_ID: ParcelId = 9;

pub fn truck_1_departure() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).expect("valid static truck 1 departure")
}

pub fn truck_3_departure() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 5, 0).expect("valid static truck 3 departure")
}

pub fn address_correction_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 20, 0).expect("valid static correction cutoff")
}

/// The wrong-address parcel: listed address until the cutoff, corrected one after.
pub fn default_address_override() -> AddressOverride {
    AddressOverride {
        parcel_id: CORRECTED_PARCEL_ID,
        cutoff: address_correction_cutoff(),
        before: StreetAndZip {
            street: "300 State St".to_string(),
            zip: "84103".to_string(),
        },
        after: StreetAndZip {
            street: "410 S State St".to_string(),
            zip: "84111".to_string(),
        },
    }
}
