//! OpenRouteService driving-directions client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use cotibot_core::{Coordinate, RouteError, RouteProvider, RouteSummary};

pub const ORS_API_BASE: &str = "https://api.openrouteservice.org";

pub struct OpenRouteServiceRouter {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    summary: Summary,
    geometry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}

impl OpenRouteServiceRouter {
    pub fn new(api_key: SecretString, timeout: std::time::Duration) -> Result<Self, RouteError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| RouteError::Provider(error.to_string()))?;
        Ok(Self { http, api_key, base_url: ORS_API_BASE.to_string() })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl RouteProvider for OpenRouteServiceRouter {
    #[tracing::instrument(skip(self))]
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteSummary, RouteError> {
        let url = format!("{}/v2/directions/driving-car", self.base_url);
        let body = json!({
            // ORS takes [lon, lat] pairs.
            "coordinates": [[origin.lon, origin.lat], [destination.lon, destination.lat]],
            "geometry": true,
        });

        let response = self
            .http
            .post(url)
            .header("Authorization", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| RouteError::Provider(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RouteError::Provider(format!("directions request returned {status}")));
        }

        let directions: DirectionsResponse = response
            .json()
            .await
            .map_err(|error| RouteError::Provider(error.to_string()))?;

        summarize(directions, origin, destination)
    }
}

fn summarize(
    directions: DirectionsResponse,
    origin: Coordinate,
    destination: Coordinate,
) -> Result<RouteSummary, RouteError> {
    let route = directions
        .routes
        .into_iter()
        .next()
        .ok_or(RouteError::NoRoute { origin, destination })?;

    Ok(RouteSummary {
        km: route.summary.distance / 1_000.0,
        hours: route.summary.duration / 3_600.0,
        geometry: route.geometry,
    })
}
