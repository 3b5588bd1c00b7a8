//! Address-resolution boundary.
//!
//! The conversation engine only sees this trait; the staged resolver
//! (gazetteer, comuna centroids, external provider) lives in `cotibot-geo`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::coordinate::Coordinate;

/// One ranked possible resolution of a free-text place query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub coordinate: Coordinate,
    pub source: CandidateSource,
    pub score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Curated venue table, consulted before anything else.
    Gazetteer,
    /// Administrative-area centroid override.
    Centroid,
    /// External forward-geocoding provider.
    Provider,
}

impl CandidateSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gazetteer => "gazetteer",
            Self::Centroid => "centroid",
            Self::Provider => "provider",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("empty address query")]
    EmptyQuery,
    #[error("no location found for `{query}`")]
    NoMatch { query: String },
    #[error("`{name}` resolved outside the national bounding box ({coordinate})")]
    OutOfBounds { name: String, coordinate: Coordinate },
    #[error("geocoding provider failure: {0}")]
    Provider(String),
}

#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolve a query to its single best candidate.
    async fn resolve_one(&self, query: &str) -> Result<Candidate, ResolveError>;

    /// Return up to `limit` mutually distinct candidates for user
    /// disambiguation. An empty vector means "nothing found" without
    /// being a hard failure; `EmptyQuery` is still an error.
    async fn resolve_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, ResolveError>;
}
