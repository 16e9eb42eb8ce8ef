//! Greedy nearest-neighbour dispatch for a single truck
//!
//! The truck repeatedly drives to the closest parcel still on board, except
//! that priority parcels are taken as soon as the scan reaches them. Once the
//! manifest is empty it drives back to the hub.

mod config;

pub use config::DispatchRules;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::services::distance::{DistanceError, DistanceIndex};
use crate::services::parcel_store::ParcelStore;
use crate::types::{
    ClockOverflow, Deadline, ParcelId, RouteEvent, SelectionTrace, StampError, Truck, TruckId,
    TruckRun,
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("truck {truck}: parcel {parcel} is not in the parcel store")]
    UnknownParcel { truck: TruckId, parcel: ParcelId },
    #[error("truck {truck}: parcel {parcel} has already been dispatched")]
    AlreadyDispatched { truck: TruckId, parcel: ParcelId },
    #[error("truck {truck}: {source}")]
    Distance {
        truck: TruckId,
        #[source]
        source: DistanceError,
    },
    #[error(transparent)]
    Clock(#[from] ClockOverflow),
    #[error(transparent)]
    Stamp(#[from] StampError),
}

/// Parcel still on board, with its destination already resolved
#[derive(Debug, Clone)]
struct PendingParcel {
    id: ParcelId,
    street: String,
    location: usize,
}

#[derive(Debug)]
struct Selection {
    position: usize,
    distance: f64,
    candidates: Vec<ParcelId>,
}

/// Runs trucks through their manifests
pub struct RoutePlanner<'a> {
    distances: &'a DistanceIndex,
    rules: &'a DispatchRules,
}

impl<'a> RoutePlanner<'a> {
    pub fn new(distances: &'a DistanceIndex, rules: &'a DispatchRules) -> Self {
        Self { distances, rules }
    }

    /// Deliver every parcel on the truck's manifest and return to the hub.
    ///
    /// Parcel stamps are written to the store only once the whole route,
    /// including the return leg, has been computed.
    pub fn run(&self, mut truck: Truck, store: &mut ParcelStore) -> Result<TruckRun, DispatchError> {
        let truck_id = truck.id;
        let locate = |error: DistanceError| DispatchError::Distance {
            truck: truck_id,
            source: error,
        };

        let hub = self
            .distances
            .location_index(&self.rules.hub_address)
            .map_err(locate)?;
        let mut current = self.distances.location_index(&truck.location).map_err(locate)?;
        let mut pending = self.load(&truck, store)?;

        info!(
            "Truck {} departing {} with {} parcels",
            truck.id,
            truck.departed_at,
            pending.len()
        );

        truck.manifest.clear();
        let mut events = Vec::with_capacity(pending.len() * 2 + 1);
        let mut trace = Vec::with_capacity(pending.len());
        let mut deliveries = Vec::with_capacity(pending.len());

        while let Some(selection) = self.select(current, &pending).map_err(locate)? {
            let from = store.find_by_destination(&truck.location);
            let parcel = pending.remove(selection.position);

            truck.drive_to(&parcel.street, selection.distance)?;
            truck.manifest.push(parcel.id);
            current = parcel.location;
            deliveries.push((parcel.id, truck.clock));

            debug!(
                "Truck {} at {}: chose parcel {} from {:?}, leg {:.1} mi, total {:.1} mi",
                truck.id, from, parcel.id, selection.candidates, selection.distance, truck.miles
            );

            events.push(RouteEvent::stopped(&truck));
            events.push(RouteEvent::delivered(&truck, parcel.id));
            trace.push(SelectionTrace {
                from,
                candidates: selection.candidates,
                chosen: parcel.id,
                leg_miles: selection.distance,
                total_miles: truck.miles,
            });
        }

        let back = self.distances.distance(current, hub).map_err(locate)?;
        truck.drive_to(&self.rules.hub_address, back)?;
        events.push(RouteEvent::returned(&truck));

        for (parcel_id, delivered_at) in deliveries {
            let parcel = store.search_mut(parcel_id).ok_or(DispatchError::UnknownParcel {
                truck: truck_id,
                parcel: parcel_id,
            })?;
            parcel.record_delivery(truck.departed_at, delivered_at)?;
            if let Deadline::By(due) = parcel.deadline {
                if delivered_at > due {
                    warn!(
                        "Truck {} delivered parcel {} at {}, after its {} deadline",
                        truck_id, parcel_id, delivered_at, parcel.deadline
                    );
                }
            }
        }

        info!(
            "Truck {} back at hub at {} after {:.1} mi",
            truck.id, truck.clock, truck.miles
        );

        Ok(TruckRun {
            truck,
            events,
            trace,
        })
    }

    /// Resolve manifest ids to records and destinations to matrix indices.
    fn load(&self, truck: &Truck, store: &ParcelStore) -> Result<Vec<PendingParcel>, DispatchError> {
        truck
            .manifest
            .iter()
            .map(|&id| {
                let parcel = store.search(id).ok_or(DispatchError::UnknownParcel {
                    truck: truck.id,
                    parcel: id,
                })?;
                if parcel.stamp().is_some() {
                    return Err(DispatchError::AlreadyDispatched {
                        truck: truck.id,
                        parcel: id,
                    });
                }

                let location = self
                    .distances
                    .location_index(&parcel.address.street)
                    .map_err(|source| DispatchError::Distance {
                        truck: truck.id,
                        source,
                    })?;

                Ok(PendingParcel {
                    id,
                    street: parcel.address.street.clone(),
                    location,
                })
            })
            .collect()
    }

    /// Pick the next parcel, scanning `pending` in order.
    ///
    /// A priority parcel ends the scan immediately. Otherwise the closest
    /// parcel wins, and on equal distance the one scanned later.
    fn select(
        &self,
        current: usize,
        pending: &[PendingParcel],
    ) -> Result<Option<Selection>, DistanceError> {
        let mut best: Option<(usize, f64)> = None;
        let mut candidates = Vec::with_capacity(pending.len());

        for (position, parcel) in pending.iter().enumerate() {
            candidates.push(parcel.id);
            let distance = self.distances.distance(current, parcel.location)?;

            if self.rules.is_priority(parcel.id) {
                best = Some((position, distance));
                break;
            }

            if best.map_or(true, |(_, closest)| distance <= closest) {
                best = Some((position, distance));
            }
        }

        Ok(best.map(|(position, distance)| Selection {
            position,
            distance,
            candidates,
        }))
    }
}
