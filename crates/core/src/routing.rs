//! Driving-route lookup boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::coordinate::Coordinate;

/// One-way driving summary between two points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub km: f64,
    pub hours: f64,
    /// Encoded polyline, kept for downstream map rendering.
    pub geometry: Option<String>,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("no drivable route between {origin} and {destination}")]
    NoRoute { origin: Coordinate, destination: Coordinate },
    #[error("routing provider failure: {0}")]
    Provider(String),
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteSummary, RouteError>;
}
