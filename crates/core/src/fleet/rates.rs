use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed capacity tiers of the operating fleet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Van,
    Taxibus,
    Bus,
}

impl VehicleClass {
    /// Ascending capacity order, used by the smallest-covering-class rule.
    pub const ASCENDING: [VehicleClass; 3] =
        [VehicleClass::Van, VehicleClass::Taxibus, VehicleClass::Bus];

    pub fn capacity(&self) -> u32 {
        match self {
            Self::Van => 15,
            Self::Taxibus => 30,
            Self::Bus => 45,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Van => "van",
            Self::Taxibus => "taxibus",
            Self::Bus => "bus",
        }
    }

    pub fn label_plural(&self) -> &'static str {
        match self {
            Self::Van => "vans",
            Self::Taxibus => "taxibuses",
            Self::Bus => "buses",
        }
    }
}

/// Unit economics for one vehicle class, CLP.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    pub cost_per_km: Decimal,
    pub cost_per_hour: Decimal,
}

/// Per-class rate cards plus the margin fraction applied on top of cost.
///
/// The figures are operator-tuned, not derived; keep them editable as a
/// value rather than baking them into the allocator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub van: RateCard,
    pub taxibus: RateCard,
    pub bus: RateCard,
    pub margin: Decimal,
}

impl RateTable {
    pub fn rate_for(&self, class: VehicleClass) -> RateCard {
        match class {
            VehicleClass::Van => self.van,
            VehicleClass::Taxibus => self.taxibus,
            VehicleClass::Bus => self.bus,
        }
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            van: RateCard { cost_per_km: Decimal::from(904), cost_per_hour: Decimal::from(13_080) },
            taxibus: RateCard {
                cost_per_km: Decimal::from(1_264),
                cost_per_hour: Decimal::from(13_080),
            },
            bus: RateCard {
                cost_per_km: Decimal::from(1_190),
                cost_per_hour: Decimal::from(13_080),
            },
            // 35% on top of base cost.
            margin: Decimal::new(35, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RateTable, VehicleClass};

    #[test]
    fn capacities_ascend_in_declared_order() {
        let capacities: Vec<u32> =
            VehicleClass::ASCENDING.iter().map(|class| class.capacity()).collect();
        assert_eq!(capacities, vec![15, 30, 45]);
    }

    #[test]
    fn default_table_carries_distinct_km_rates() {
        let table = RateTable::default();
        assert_ne!(table.van.cost_per_km, table.taxibus.cost_per_km);
        assert_eq!(table.van.cost_per_hour, table.bus.cost_per_hour);
    }
}
