//! Administrative-area centroids for the Región Metropolitana and the
//! out-of-region destinations operator traffic actually books.
//!
//! A query that *is* a comuna name short-circuits here: providers love
//! answering "Peñaflor" with a same-named street somewhere else.

use cotibot_core::{Candidate, CandidateSource, Coordinate};

use crate::normalize::normalize;

/// Fixed score for a centroid hit in a candidate pool: above any
/// provider hit, below an exact gazetteer venue.
pub const CENTROID_SCORE: f64 = 1.5;

pub struct Comuna {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

pub const COMUNAS: &[Comuna] = &[
    Comuna { name: "Santiago", lat: -33.4489, lon: -70.6693 },
    Comuna { name: "Providencia", lat: -33.4314, lon: -70.6093 },
    Comuna { name: "Las Condes", lat: -33.4080, lon: -70.5670 },
    Comuna { name: "Ñuñoa", lat: -33.4569, lon: -70.5975 },
    Comuna { name: "Maipú", lat: -33.5167, lon: -70.7667 },
    Comuna { name: "Puente Alto", lat: -33.6117, lon: -70.5758 },
    Comuna { name: "Quilicura", lat: -33.3667, lon: -70.7333 },
    Comuna { name: "Pudahuel", lat: -33.4300, lon: -70.8167 },
    Comuna { name: "Cerrillos", lat: -33.4978, lon: -70.7164 },
    Comuna { name: "El Bosque", lat: -33.5657, lon: -70.6728 },
    Comuna { name: "San Bernardo", lat: -33.5695, lon: -70.7376 },
    Comuna { name: "Calera de Tango", lat: -33.6221, lon: -70.7830 },
    Comuna { name: "Peñaflor", lat: -33.60627, lon: -70.87649 },
    Comuna { name: "Talagante", lat: -33.6636, lon: -70.9290 },
    Comuna { name: "Isla de Maipo", lat: -33.7509, lon: -70.8983 },
    Comuna { name: "Melipilla", lat: -33.6896, lon: -71.2135 },
    Comuna { name: "Paine", lat: -33.8234, lon: -70.7343 },
    Comuna { name: "Buin", lat: -33.7333, lon: -70.7417 },
    Comuna { name: "Colina", lat: -33.2042, lon: -70.6744 },
    Comuna { name: "Lampa", lat: -33.2861, lon: -70.8750 },
    Comuna { name: "Viña del Mar", lat: -33.02457, lon: -71.55183 },
    Comuna { name: "Valparaíso", lat: -33.03600, lon: -71.62963 },
];

/// Centroid for an already-normalized query that exactly names a comuna.
pub fn centroid(normalized_query: &str) -> Option<Candidate> {
    COMUNAS
        .iter()
        .find(|comuna| normalize(comuna.name) == normalized_query)
        .map(|comuna| Candidate {
            name: comuna.name.to_string(),
            coordinate: Coordinate::new(comuna.lat, comuna.lon),
            source: CandidateSource::Centroid,
            score: CENTROID_SCORE,
        })
}
