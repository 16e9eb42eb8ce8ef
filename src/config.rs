//! Configuration management

use std::path::PathBuf;

use anyhow::{self, Context, Result};

use crate::defaults::{DEFAULT_HUB_ADDRESS, DEFAULT_SPEED_MPH};
use crate::services::dispatch::DispatchRules;
use crate::services::parcel_store::DEFAULT_BUCKET_COUNT;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Package table (header row + one parcel per row)
    pub packages_csv: PathBuf,

    /// Location table (index, name, address)
    pub locations_csv: PathBuf,

    /// Distance matrix, lower triangle allowed
    pub distances_csv: PathBuf,

    /// Directory for rolling log files
    pub logs_dir: PathBuf,

    /// Truck speed in miles per hour
    pub speed_mph: f64,

    /// Hub street address; must match a location
    pub hub_address: String,

    /// Bucket count of the parcel store
    pub store_buckets: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or_else(|| "data".to_string()));
        let path_or = |key: &str, file: &str| {
            var(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(file))
        };

        let packages_csv = path_or("PACKAGES_CSV", "packages.csv");
        let locations_csv = path_or("LOCATIONS_CSV", "locations.csv");
        let distances_csv = path_or("DISTANCES_CSV", "distances.csv");

        let logs_dir = PathBuf::from(var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()));

        let speed_mph = match var("TRUCK_SPEED_MPH") {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("TRUCK_SPEED_MPH is not a number: '{}'", raw))?,
            None => DEFAULT_SPEED_MPH,
        };
        if !(speed_mph.is_finite() && speed_mph > 0.0) {
            anyhow::bail!("TRUCK_SPEED_MPH must be positive (current: {})", speed_mph);
        }

        let hub_address = var("HUB_ADDRESS").unwrap_or_else(|| DEFAULT_HUB_ADDRESS.to_string());

        let store_buckets = match var("STORE_BUCKETS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("STORE_BUCKETS is not a count: '{}'", raw))?,
            None => DEFAULT_BUCKET_COUNT,
        };
        if store_buckets == 0 {
            anyhow::bail!("STORE_BUCKETS must be at least 1");
        }

        Ok(Self {
            packages_csv,
            locations_csv,
            distances_csv,
            logs_dir,
            speed_mph,
            hub_address,
            store_buckets,
        })
    }

    pub fn dispatch_rules(&self) -> DispatchRules {
        DispatchRules::new(&self.hub_address, self.speed_mph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.packages_csv, PathBuf::from("data/packages.csv"));
        assert_eq!(config.locations_csv, PathBuf::from("data/locations.csv"));
        assert_eq!(config.distances_csv, PathBuf::from("data/distances.csv"));
        assert_eq!(config.logs_dir, PathBuf::from("logs"));
        assert_eq!(config.hub_address, "4001 South 700 East");
        assert_eq!(config.store_buckets, 40);
        assert!((config.speed_mph - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_data_dir_moves_all_tables() {
        let config = config(&[("DATA_DIR", "/srv/day1")]).unwrap();
        assert_eq!(config.packages_csv, PathBuf::from("/srv/day1/packages.csv"));
        assert_eq!(config.distances_csv, PathBuf::from("/srv/day1/distances.csv"));
    }

    #[test]
    fn test_config_explicit_table_path_wins() {
        let config = config(&[("DATA_DIR", "/srv/day1"), ("PACKAGES_CSV", "/tmp/p.csv")]).unwrap();
        assert_eq!(config.packages_csv, PathBuf::from("/tmp/p.csv"));
        assert_eq!(config.locations_csv, PathBuf::from("/srv/day1/locations.csv"));
    }

    #[test]
    fn test_config_speed_must_be_positive() {
        assert!(config(&[("TRUCK_SPEED_MPH", "0")]).is_err());
        assert!(config(&[("TRUCK_SPEED_MPH", "fast")]).is_err());
        let config = config(&[("TRUCK_SPEED_MPH", "25.5")]).unwrap();
        assert!((config.speed_mph - 25.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_buckets_must_be_positive() {
        assert!(config(&[("STORE_BUCKETS", "0")]).is_err());
        assert_eq!(config(&[("STORE_BUCKETS", "7")]).unwrap().store_buckets, 7);
    }

    #[test]
    fn test_dispatch_rules_from_config() {
        let rules = config(&[("HUB_ADDRESS", "1 Depot Rd"), ("TRUCK_SPEED_MPH", "30")])
            .unwrap()
            .dispatch_rules();
        assert_eq!(rules.hub_address, "1 Depot Rd");
        assert!((rules.speed_mph - 30.0).abs() < f64::EPSILON);
        assert_eq!(rules.priority_parcels, vec![25, 6]);
    }
}
