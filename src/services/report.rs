//! Plain-text rendering of simulation results

use std::collections::BTreeMap;

use chrono::NaiveTime;

use crate::services::fleet::FleetSummary;
use crate::types::{DeliveryStatus, ParcelView, TruckRun};

const EVENT_HEADER: &str = "truck,event,time,miles,target";

/// Event log of one truck, one CSV-style line per event
pub fn event_log(run: &TruckRun) -> String {
    let mut lines = vec![EVENT_HEADER.to_string()];
    lines.extend(run.events.iter().map(|e| e.to_string()));
    lines.join("\n")
}

pub fn truck_metrics(run: &TruckRun) -> String {
    let truck = &run.truck;
    [
        format!("Truck {}", truck.id),
        format!("  Departure Time: {}", truck.departed_at.format("%H:%M:%S")),
        format!("  Return Time:    {}", run.returned_at().format("%H:%M:%S")),
        format!("  Drive Time:     {:.2} hours", truck.active_hours()),
        format!("  Total Distance: {:.1} miles", truck.miles),
        format!("  Delivered:      {} parcels", run.delivered_count()),
    ]
    .join("\n")
}

pub fn fleet_totals(summary: &FleetSummary) -> String {
    [
        format!("Total Distance: {:.1} miles", summary.total_miles),
        format!("Total Drive Time: {:.2} hours", summary.total_active_hours),
        format!("Parcels Delivered: {}", summary.total_delivered),
    ]
    .join("\n")
}

/// Full report: each truck's log and metrics, then fleet totals
pub fn simulation_report(summary: &FleetSummary) -> String {
    let mut sections: Vec<String> = summary
        .runs
        .iter()
        .map(|run| format!("{}\n\n{}", event_log(run), truck_metrics(run)))
        .collect();
    sections.push(fleet_totals(summary));
    sections.join("\n\n")
}

fn clock(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn parcel_line(view: &ParcelView) -> String {
    let address = &view.address;
    format!(
        "{:>3} | {}, {}, {} {} | due {} | {} kg | {} | left {} | delivered {}",
        view.id,
        address.street,
        address.city,
        address.state,
        address.zip,
        view.deadline,
        view.weight,
        view.status,
        clock(view.dispatched_at),
        clock(view.delivered_at),
    )
}

pub fn status_report(at: NaiveTime, views: &[ParcelView]) -> String {
    let mut lines = vec![format!("Parcel status at {}", at.format("%H:%M"))];
    lines.extend(views.iter().map(parcel_line));
    lines.join("\n")
}

/// One-line tally such as "At Hub: 10 | En Route: 14 | Delivered: 16"
pub fn status_counts(counts: &BTreeMap<DeliveryStatus, usize>) -> String {
    [DeliveryStatus::AtHub, DeliveryStatus::EnRoute, DeliveryStatus::Delivered]
        .iter()
        .map(|status| format!("{}: {}", status, counts.get(status).copied().unwrap_or(0)))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Nearest-neighbour decisions of one truck
pub fn selection_trace(run: &TruckRun) -> String {
    let mut lines = vec![format!("Truck {} selections", run.truck.id)];
    lines.extend(run.trace.iter().enumerate().map(|(step, t)| {
        let candidates: Vec<String> = t.candidates.iter().map(|id| id.to_string()).collect();
        format!(
            "{:>2}. from {:<4} -> {:<3} leg {:>5.1} mi  total {:>5.1} mi  [{}]",
            step + 1,
            t.from.to_string(),
            t.chosen,
            t.leg_miles,
            t.total_miles,
            candidates.join(" ")
        )
    }));
    lines.join("\n")
}
