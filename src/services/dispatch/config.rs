//! Dispatch rule configuration

use crate::defaults::{DEFAULT_HUB_ADDRESS, DEFAULT_PRIORITY_PARCELS, DEFAULT_SPEED_MPH};
use crate::types::ParcelId;

/// Rules applied by the route planner
#[derive(Debug, Clone)]
pub struct DispatchRules {
    /// Street address every truck starts from and returns to
    pub hub_address: String,
    /// Truck speed in miles per hour
    pub speed_mph: f64,
    /// Parcels selected as soon as they are seen in the pending scan
    pub priority_parcels: Vec<ParcelId>,
}

impl Default for DispatchRules {
    fn default() -> Self {
        Self {
            hub_address: DEFAULT_HUB_ADDRESS.to_string(),
            speed_mph: DEFAULT_SPEED_MPH,
            priority_parcels: DEFAULT_PRIORITY_PARCELS.to_vec(),
        }
    }
}

impl DispatchRules {
    pub fn new(hub_address: &str, speed_mph: f64) -> Self {
        Self {
            hub_address: hub_address.to_string(),
            speed_mph,
            ..Self::default()
        }
    }

    /// Plain nearest-neighbour, no priority parcels
    #[cfg(test)]
    pub fn nearest_only(hub_address: &str, speed_mph: f64) -> Self {
        Self {
            hub_address: hub_address.to_string(),
            speed_mph,
            priority_parcels: Vec::new(),
        }
    }

    pub fn is_priority(&self, id: ParcelId) -> bool {
        self.priority_parcels.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = DispatchRules::default();
        assert_eq!(rules.hub_address, "4001 South 700 East");
        assert!((rules.speed_mph - 18.0).abs() < f64::EPSILON);
        assert!(rules.is_priority(25));
        assert!(rules.is_priority(6));
        assert!(!rules.is_priority(9));
    }

    #[test]
    fn test_new_keeps_default_priorities() {
        let rules = DispatchRules::new("hub", 30.0);
        assert_eq!(rules.hub_address, "hub");
        assert_eq!(rules.priority_parcels, vec![25, 6]);
    }

    #[test]
    fn test_nearest_only_has_no_priorities() {
        let rules = DispatchRules::nearest_only("hub", 18.0);
        assert!(rules.priority_parcels.is_empty());
        assert!(!rules.is_priority(25));
    }
}
