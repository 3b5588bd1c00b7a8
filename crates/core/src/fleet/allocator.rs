use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fleet::rates::{RateTable, VehicleClass};

/// One vehicle unit inside a plan, priced independently. All currency
/// amounts are whole pesos, rounded at the point of computation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleAssignment {
    pub class: VehicleClass,
    pub passengers: u32,
    pub cost: Decimal,
    pub margin: Decimal,
    pub price: Decimal,
}

/// Ordered vehicle assignments covering the requested passenger count
/// exactly. Every unit is assumed to travel the same route, so they all
/// share the plan's distance and duration totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehiclePlan {
    pub assignments: Vec<VehicleAssignment>,
}

impl VehiclePlan {
    pub fn total_price(&self) -> Decimal {
        self.assignments.iter().map(|assignment| assignment.price).sum()
    }

    pub fn passenger_total(&self) -> u32 {
        self.assignments.iter().map(|assignment| assignment.passengers).sum()
    }

    pub fn unit_count(&self) -> usize {
        self.assignments.len()
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("passenger count must be positive, got {0}")]
    InvalidPassengerCount(i64),
}

/// Split `passengers` across vehicle classes and price each unit for the
/// shared round-trip totals.
///
/// Counts that fit one unit take the smallest covering class. Larger
/// groups greedily fill buses and close with the smallest class covering
/// the remainder, so a 5-person tail rides a van, not a second bus.
pub fn allocate(
    distance_total_km: f64,
    duration_total_hours: f64,
    passengers: u32,
    rates: &RateTable,
) -> Result<VehiclePlan, AllocationError> {
    if passengers == 0 {
        return Err(AllocationError::InvalidPassengerCount(0));
    }

    let bus_capacity = VehicleClass::Bus.capacity();
    let mut units: Vec<(VehicleClass, u32)> = Vec::new();

    if let Some(class) = smallest_covering_class(passengers) {
        units.push((class, passengers));
    } else {
        let full_buses = (passengers - 1) / bus_capacity;
        for _ in 0..full_buses {
            units.push((VehicleClass::Bus, bus_capacity));
        }
        let remainder = passengers - full_buses * bus_capacity;
        let class = smallest_covering_class(remainder).unwrap_or(VehicleClass::Bus);
        units.push((class, remainder));
    }

    let assignments = units
        .into_iter()
        .map(|(class, assigned)| {
            price_unit(class, assigned, distance_total_km, duration_total_hours, rates)
        })
        .collect();

    Ok(VehiclePlan { assignments })
}

/// Smallest class whose capacity covers `passengers`, if any single
/// class can.
pub fn smallest_covering_class(passengers: u32) -> Option<VehicleClass> {
    VehicleClass::ASCENDING.into_iter().find(|class| class.capacity() >= passengers)
}

fn price_unit(
    class: VehicleClass,
    passengers: u32,
    distance_total_km: f64,
    duration_total_hours: f64,
    rates: &RateTable,
) -> VehicleAssignment {
    let rate = rates.rate_for(class);
    let km = decimal_from(distance_total_km);
    let hours = decimal_from(duration_total_hours);

    let base = km * rate.cost_per_km + hours * rate.cost_per_hour;
    let cost = base.round();
    let margin = (base * rates.margin).round();

    VehicleAssignment { class, passengers, cost, margin, price: cost + margin }
}

// NaN/infinite totals collapse to zero instead of poisoning the plan;
// they cannot occur from a well-formed route summary.
fn decimal_from(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Human-readable plan summary: one term per class present, e.g.
/// `"1 bus (45 pax c/u) + 1 van (15 pax c/u)"`.
pub fn fleet_summary(plan: &VehiclePlan) -> String {
    let mut counts: Vec<(VehicleClass, usize)> = Vec::new();
    for assignment in &plan.assignments {
        match counts.iter_mut().find(|(class, _)| *class == assignment.class) {
            Some((_, count)) => *count += 1,
            None => counts.push((assignment.class, 1)),
        }
    }

    counts
        .into_iter()
        .map(|(class, count)| {
            let label = if count == 1 { class.label() } else { class.label_plural() };
            format!("{count} {label} ({} pax c/u)", class.capacity())
        })
        .collect::<Vec<_>>()
        .join(" + ")
}
