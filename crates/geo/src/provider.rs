//! External forward-geocoding provider boundary.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use cotibot_core::{Coordinate, ResolveError};

/// One raw provider hit, before our scoring runs over it.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderHit {
    pub display_name: String,
    pub coordinate: Coordinate,
    /// Provider-reported confidence, 0..1.
    pub relevance: f64,
    pub place_types: Vec<String>,
}

#[async_trait]
pub trait ForwardGeocoder: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ProviderHit>, ResolveError>;
}

/// Geocoder used when no provider token is configured: the resolver
/// simply runs its offline stages only.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullGeocoder;

#[async_trait]
impl ForwardGeocoder for NullGeocoder {
    async fn search(&self, _query: &str) -> Result<Vec<ProviderHit>, ResolveError> {
        Ok(Vec::new())
    }
}

pub const MAPBOX_API_BASE: &str = "https://api.mapbox.com";

/// Mapbox Geocoding v5, scoped to Chile.
pub struct MapboxGeocoder {
    http: reqwest::Client,
    token: SecretString,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    place_name: String,
    /// `[longitude, latitude]`, Mapbox order.
    center: [f64; 2],
    relevance: Option<f64>,
    #[serde(default)]
    place_type: Vec<String>,
}

impl MapboxGeocoder {
    pub fn new(token: SecretString, timeout: std::time::Duration) -> Result<Self, ResolveError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ResolveError::Provider(error.to_string()))?;
        Ok(Self { http, token, base_url: MAPBOX_API_BASE.to_string() })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, query: &str) -> Result<reqwest::Url, ResolveError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|error| ResolveError::Provider(format!("invalid provider base url: {error}")))?;
        url.path_segments_mut()
            .map_err(|_| ResolveError::Provider("provider base url cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places", &format!("{query}.json")]);
        Ok(url)
    }
}

#[async_trait]
impl ForwardGeocoder for MapboxGeocoder {
    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<ProviderHit>, ResolveError> {
        let url = self.endpoint(query)?;

        let response = self
            .http
            .get(url)
            .query(&[("access_token", self.token.expose_secret())])
            .query(&[("country", "cl"), ("language", "es"), ("types", "address,poi,place")])
            .query(&[("limit", "5")])
            .send()
            .await
            .map_err(|error| ResolveError::Provider(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Provider(format!("geocoding request returned {status}")));
        }

        let collection: FeatureCollection = response
            .json()
            .await
            .map_err(|error| ResolveError::Provider(error.to_string()))?;

        Ok(collection.features.into_iter().map(feature_to_hit).collect())
    }
}

fn feature_to_hit(feature: Feature) -> ProviderHit {
    ProviderHit {
        display_name: feature.place_name,
        coordinate: Coordinate::new(feature.center[1], feature.center[0]),
        relevance: feature.relevance.unwrap_or(0.5),
        place_types: feature.place_type,
    }
}

#[cfg(test)]
mod tests {
    use super::{feature_to_hit, FeatureCollection};

    #[test]
    fn feature_payload_decodes_with_lon_lat_order() {
        let raw = r#"{
            "features": [{
                "place_name": "Peñaflor, Región Metropolitana, Chile",
                "center": [-70.87649, -33.60627],
                "relevance": 0.96,
                "place_type": ["place"]
            }]
        }"#;

        let collection: FeatureCollection = serde_json::from_str(raw).expect("decode");
        let hit = feature_to_hit(collection.features.into_iter().next().expect("one feature"));

        assert_eq!(hit.coordinate.lat, -33.60627);
        assert_eq!(hit.coordinate.lon, -70.87649);
        assert_eq!(hit.relevance, 0.96);
        assert_eq!(hit.place_types, vec!["place".to_string()]);
    }

    #[test]
    fn missing_relevance_defaults_to_neutral() {
        let raw = r#"{"features": [{"place_name": "X", "center": [-70.0, -33.0]}]}"#;
        let collection: FeatureCollection = serde_json::from_str(raw).expect("decode");
        let hit = feature_to_hit(collection.features.into_iter().next().expect("one feature"));
        assert_eq!(hit.relevance, 0.5);
    }

    #[test]
    fn empty_feature_list_decodes_to_no_hits() {
        let collection: FeatureCollection = serde_json::from_str("{}").expect("decode");
        assert!(collection.features.is_empty());
    }
}
