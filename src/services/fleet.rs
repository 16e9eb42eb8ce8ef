//! Fleet orchestration
//!
//! Builds one truck per plan entry, runs them in dependency order and sums
//! the results. A truck with a dependent departure leaves at the earliest
//! return time among the trucks it waits for.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveTime;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::defaults::{
    truck_1_departure, truck_3_departure, TRUCK_1_MANIFEST, TRUCK_2_MANIFEST, TRUCK_3_MANIFEST,
};
use crate::services::dispatch::{DispatchError, DispatchRules, RoutePlanner};
use crate::services::distance::DistanceIndex;
use crate::services::parcel_store::ParcelStore;
use crate::types::{
    AddressOverride, DeliveryStatus, ParcelId, ParcelView, Truck, TruckId, TruckRun,
};

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("truck {0} appears more than once in the plan")]
    DuplicateTruck(TruckId),
    #[error("parcel {parcel} is assigned to both truck {first} and truck {second}")]
    DuplicateAssignment {
        parcel: ParcelId,
        first: TruckId,
        second: TruckId,
    },
    #[error("truck {truck} waits for unknown truck {depends_on}")]
    UnknownDependency { truck: TruckId, depends_on: TruckId },
    #[error("truck {0} waits for no trucks")]
    EmptyDependency(TruckId),
    #[error("departure time cannot be resolved for trucks {0:?}")]
    UnresolvableDeparture(Vec<TruckId>),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// When a truck leaves the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    At(NaiveTime),
    /// Leaves when the first of these trucks is back at the hub
    EarliestReturnOf(Vec<TruckId>),
}

#[derive(Debug, Clone)]
pub struct TruckPlan {
    pub truck_id: TruckId,
    pub manifest: Vec<ParcelId>,
    pub departure: Departure,
}

#[derive(Debug, Clone)]
pub struct FleetPlan {
    pub trucks: Vec<TruckPlan>,
}

impl FleetPlan {
    /// Three trucks; truck 2 waits for a driver from truck 1 or truck 3.
    pub fn standard_day() -> Self {
        Self {
            trucks: vec![
                TruckPlan {
                    truck_id: 1,
                    manifest: TRUCK_1_MANIFEST.to_vec(),
                    departure: Departure::At(truck_1_departure()),
                },
                TruckPlan {
                    truck_id: 2,
                    manifest: TRUCK_2_MANIFEST.to_vec(),
                    departure: Departure::EarliestReturnOf(vec![1, 3]),
                },
                TruckPlan {
                    truck_id: 3,
                    manifest: TRUCK_3_MANIFEST.to_vec(),
                    departure: Departure::At(truck_3_departure()),
                },
            ],
        }
    }

    pub fn parcel_count(&self) -> usize {
        self.trucks.iter().map(|t| t.manifest.len()).sum()
    }

    pub fn validate(&self) -> Result<(), FleetError> {
        let mut trucks = HashSet::new();
        for plan in &self.trucks {
            if !trucks.insert(plan.truck_id) {
                return Err(FleetError::DuplicateTruck(plan.truck_id));
            }
        }

        let mut assigned: HashMap<ParcelId, TruckId> = HashMap::new();
        for plan in &self.trucks {
            for &parcel in &plan.manifest {
                if let Some(&first) = assigned.get(&parcel) {
                    return Err(FleetError::DuplicateAssignment {
                        parcel,
                        first,
                        second: plan.truck_id,
                    });
                }
                assigned.insert(parcel, plan.truck_id);
            }

            if let Departure::EarliestReturnOf(waits_for) = &plan.departure {
                if waits_for.is_empty() {
                    return Err(FleetError::EmptyDependency(plan.truck_id));
                }
                if let Some(&unknown) = waits_for.iter().find(|id| !trucks.contains(id)) {
                    return Err(FleetError::UnknownDependency {
                        truck: plan.truck_id,
                        depends_on: unknown,
                    });
                }
            }
        }

        Ok(())
    }
}

fn resolve_departure(departure: &Departure, returns: &HashMap<TruckId, NaiveTime>) -> Option<NaiveTime> {
    match departure {
        Departure::At(time) => Some(*time),
        Departure::EarliestReturnOf(trucks) => trucks
            .iter()
            .map(|id| returns.get(id).copied())
            .collect::<Option<Vec<_>>>()?
            .into_iter()
            .min(),
    }
}

/// Shared state for one simulation: parcels, distances and rules
#[derive(Debug, Clone)]
pub struct DeliveryContext {
    pub parcels: ParcelStore,
    pub distances: DistanceIndex,
    pub rules: DispatchRules,
    pub address_override: Option<AddressOverride>,
}

impl DeliveryContext {
    pub fn new(parcels: ParcelStore, distances: DistanceIndex, rules: DispatchRules) -> Self {
        Self {
            parcels,
            distances,
            rules,
            address_override: None,
        }
    }

    pub fn with_address_override(mut self, address_override: AddressOverride) -> Self {
        self.address_override = Some(address_override);
        self
    }

    pub fn status_at(&self, id: ParcelId, at: NaiveTime) -> Option<DeliveryStatus> {
        self.parcels.search(id).map(|p| p.status_at(at))
    }

    pub fn parcel_at(&self, id: ParcelId, at: NaiveTime) -> Option<ParcelView> {
        self.parcels
            .search(id)
            .map(|p| p.view_at(at, self.address_override.as_ref()))
    }

    /// Number of parcels in each status at `at`
    pub fn status_counts(&self, at: NaiveTime) -> BTreeMap<DeliveryStatus, usize> {
        let mut counts = BTreeMap::new();
        for status in self.parcels.ids().into_iter().filter_map(|id| self.status_at(id, at)) {
            *counts.entry(status).or_insert(0) += 1;
        }
        counts
    }

    /// Every parcel as it reads at `at`, by ascending id
    pub fn parcels_at(&self, at: NaiveTime) -> Vec<ParcelView> {
        self.parcels
            .ids()
            .into_iter()
            .filter_map(|id| self.parcel_at(id, at))
            .collect()
    }
}

/// Outcome of a whole fleet simulation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    /// In plan order
    pub runs: Vec<TruckRun>,
    pub total_miles: f64,
    pub total_active_hours: f64,
    pub total_delivered: usize,
}

impl FleetSummary {
    fn from_runs(runs: Vec<TruckRun>) -> Self {
        let total_miles = runs.iter().map(|r| r.truck.miles).sum();
        let total_active_hours = runs.iter().map(|r| r.truck.active_hours()).sum();
        let total_delivered = runs.iter().map(|r| r.delivered_count()).sum();

        Self {
            runs,
            total_miles,
            total_active_hours,
            total_delivered,
        }
    }

    pub fn run(&self, truck: TruckId) -> Option<&TruckRun> {
        self.runs.iter().find(|r| r.truck.id == truck)
    }
}

/// Run every truck in the plan against the context's parcel store.
pub fn run_fleet(ctx: &mut DeliveryContext, plan: &FleetPlan) -> Result<FleetSummary, FleetError> {
    plan.validate()?;
    info!(
        "Dispatching {} parcels on {} trucks",
        plan.parcel_count(),
        plan.trucks.len()
    );

    let planner = RoutePlanner::new(&ctx.distances, &ctx.rules);
    let mut finished: Vec<Option<TruckRun>> = vec![None; plan.trucks.len()];
    let mut returns: HashMap<TruckId, NaiveTime> = HashMap::new();
    let mut waiting: Vec<usize> = (0..plan.trucks.len()).collect();

    while !waiting.is_empty() {
        let next = waiting.iter().enumerate().find_map(|(slot, &i)| {
            resolve_departure(&plan.trucks[i].departure, &returns).map(|at| (slot, i, at))
        });

        let Some((slot, i, departs)) = next else {
            let stuck = waiting.iter().map(|&i| plan.trucks[i].truck_id).collect();
            return Err(FleetError::UnresolvableDeparture(stuck));
        };
        waiting.remove(slot);

        let entry = &plan.trucks[i];
        let truck = Truck::new(
            entry.truck_id,
            ctx.rules.speed_mph,
            &ctx.rules.hub_address,
            departs,
            entry.manifest.clone(),
        );
        let run = planner.run(truck, &mut ctx.parcels)?;
        returns.insert(entry.truck_id, run.returned_at());
        finished[i] = Some(run);
    }

    let summary = FleetSummary::from_runs(finished.into_iter().flatten().collect());
    info!(
        "Fleet finished: {} parcels, {:.1} mi, {:.2} h",
        summary.total_delivered, summary.total_miles, summary.total_active_hours
    );

    Ok(summary)
}
