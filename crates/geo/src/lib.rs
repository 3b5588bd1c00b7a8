//! Address resolution and routing for cotibot.
//!
//! Resolution is staged: a curated gazetteer of venues, then exact
//! comuna-centroid matches, then Mapbox forward geocoding with query
//! variants and heuristic re-scoring. Each stage returns an explicit
//! outcome so rejections stay observable, and every accepted coordinate
//! is checked against the national bounding box.

pub mod comunas;
pub mod gazetteer;
pub mod normalize;
pub mod provider;
pub mod resolver;
pub mod routing;
pub mod scoring;

pub use provider::{ForwardGeocoder, MapboxGeocoder, NullGeocoder, ProviderHit, MAPBOX_API_BASE};
pub use resolver::GeoResolver;
pub use routing::{OpenRouteServiceRouter, ORS_API_BASE};
pub use scoring::{GazetteerWeights, ProviderWeights};
