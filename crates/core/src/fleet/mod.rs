//! Fleet pricing: vehicle-class allocation and per-unit pricing.

pub mod allocator;
pub mod rates;

pub use allocator::{
    allocate, fleet_summary, smallest_covering_class, AllocationError, VehicleAssignment,
    VehiclePlan,
};
pub use rates::{RateCard, RateTable, VehicleClass};
