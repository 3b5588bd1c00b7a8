use rust_decimal::Decimal;
use serde::Serialize;

use cotibot_core::{allocate, fleet_summary, RateTable};

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct PriceReport {
    command: &'static str,
    total_km: f64,
    total_hours: f64,
    passengers: u32,
    fleet: String,
    units: Vec<PricedUnit>,
    total_price: Decimal,
}

#[derive(Debug, Serialize)]
struct PricedUnit {
    class: &'static str,
    capacity: u32,
    passengers: u32,
    cost: Decimal,
    margin: Decimal,
    price: Decimal,
}

pub fn run(km: f64, hours: f64, passengers: u32) -> CommandResult {
    let plan = match allocate(km, hours, passengers, &RateTable::default()) {
        Ok(plan) => plan,
        Err(error) => return CommandResult::failure("price", "allocation", error.to_string(), 1),
    };

    let report = PriceReport {
        command: "price",
        total_km: km,
        total_hours: hours,
        passengers,
        fleet: fleet_summary(&plan),
        units: plan
            .assignments
            .iter()
            .map(|assignment| PricedUnit {
                class: assignment.class.label(),
                capacity: assignment.class.capacity(),
                passengers: assignment.passengers,
                cost: assignment.cost,
                margin: assignment.margin,
                price: assignment.price,
            })
            .collect(),
        total_price: plan.total_price(),
    };

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("price", "serialization", error.to_string(), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn fifty_passengers_price_as_bus_plus_van() {
        let result = run(120.0, 3.5, 50);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("1 bus (45 pax c/u) + 1 van (15 pax c/u)"));
    }

    #[test]
    fn zero_passengers_fail_cleanly() {
        let result = run(120.0, 3.5, 0);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("allocation"));
    }
}
