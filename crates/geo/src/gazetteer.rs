//! Curated table of venues operator traffic keeps asking for.
//!
//! Generic geocoders systematically misplace short, locally-known names
//! (a comuna name lands on a same-named street three comunas away), so
//! these are pinned before any provider is consulted.

use cotibot_core::{Candidate, CandidateSource, Coordinate};

use crate::normalize::normalize;
use crate::scoring::{gazetteer_score, GazetteerWeights};

pub struct GazetteerEntry {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

pub const GAZETTEER: &[GazetteerEntry] = &[
    GazetteerEntry { name: "Aeropuerto Arturo Merino Benítez", lat: -33.3930, lon: -70.7858 },
    GazetteerEntry { name: "Aeropuerto de Santiago", lat: -33.3930, lon: -70.7858 },
    GazetteerEntry { name: "Terminal San Borja", lat: -33.4539, lon: -70.6794 },
    GazetteerEntry { name: "Terminal Alameda", lat: -33.4551, lon: -70.6823 },
    GazetteerEntry { name: "Estación Central", lat: -33.4569, lon: -70.6790 },
    GazetteerEntry { name: "Estadio Nacional", lat: -33.4648, lon: -70.6107 },
    GazetteerEntry { name: "Estadio Monumental", lat: -33.5064, lon: -70.6059 },
    GazetteerEntry { name: "Movistar Arena", lat: -33.4624, lon: -70.6610 },
    GazetteerEntry { name: "Parque O'Higgins", lat: -33.4621, lon: -70.6605 },
    GazetteerEntry { name: "Plaza de Armas", lat: -33.4378, lon: -70.6505 },
    GazetteerEntry { name: "Costanera Center", lat: -33.4172, lon: -70.6063 },
    GazetteerEntry { name: "Mall Plaza Oeste", lat: -33.5167, lon: -70.7170 },
    GazetteerEntry { name: "Mall Plaza Vespucio", lat: -33.5126, lon: -70.5972 },
    GazetteerEntry { name: "Mall Arauco Maipú", lat: -33.4824, lon: -70.7541 },
    GazetteerEntry { name: "Universidad de Santiago", lat: -33.4497, lon: -70.6846 },
    GazetteerEntry { name: "Cajón del Maipo", lat: -33.6446, lon: -70.3582 },
    GazetteerEntry { name: "Pomaire", lat: -33.6522, lon: -71.1545 },
    GazetteerEntry { name: "Farellones", lat: -33.3565, lon: -70.3083 },
    GazetteerEntry { name: "Valle Nevado", lat: -33.3561, lon: -70.2484 },
    GazetteerEntry { name: "Embalse El Yeso", lat: -33.6764, lon: -70.0887 },
];

impl GazetteerEntry {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    fn candidate(&self, score: f64) -> Candidate {
        Candidate {
            name: self.name.to_string(),
            coordinate: self.coordinate(),
            source: CandidateSource::Gazetteer,
            score,
        }
    }
}

/// Best entry for an already-normalized query, if it clears the
/// acceptance threshold.
pub fn best_match(normalized_query: &str, weights: &GazetteerWeights) -> Option<Candidate> {
    scored(normalized_query, weights)
        .into_iter()
        .max_by(|left, right| left.score.total_cmp(&right.score))
        .filter(|candidate| candidate.score >= weights.accept_threshold)
}

/// Every entry above the candidate floor, sorted best-first; feeds the
/// disambiguation pool.
pub fn candidates(normalized_query: &str, weights: &GazetteerWeights) -> Vec<Candidate> {
    let mut found: Vec<Candidate> = scored(normalized_query, weights)
        .into_iter()
        .filter(|candidate| candidate.score >= weights.candidate_floor)
        .collect();
    found.sort_by(|left, right| right.score.total_cmp(&left.score));
    found
}

fn scored(normalized_query: &str, weights: &GazetteerWeights) -> Vec<Candidate> {
    GAZETTEER
        .iter()
        .map(|entry| {
            let score = gazetteer_score(normalized_query, &normalize(entry.name), weights);
            entry.candidate(score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use cotibot_core::CandidateSource;

    use super::{best_match, candidates};
    use crate::normalize::normalize;
    use crate::scoring::GazetteerWeights;

    #[test]
    fn exact_venue_name_wins_outright() {
        let weights = GazetteerWeights::default();
        let hit = best_match(&normalize("Estadio Nacional"), &weights).expect("gazetteer hit");
        assert_eq!(hit.name, "Estadio Nacional");
        assert_eq!(hit.source, CandidateSource::Gazetteer);
        assert!(hit.coordinate.within_chile());
    }

    #[test]
    fn abbreviated_airport_query_still_matches() {
        let weights = GazetteerWeights::default();
        let hit = best_match(&normalize("aeropuerto stgo"), &weights).expect("gazetteer hit");
        assert_eq!(hit.name, "Aeropuerto de Santiago");
    }

    #[test]
    fn unknown_place_stays_below_threshold() {
        let weights = GazetteerWeights::default();
        assert!(best_match(&normalize("calle los aromos 742 quilicura"), &weights).is_none());
    }

    #[test]
    fn candidate_pool_is_sorted_best_first() {
        let weights = GazetteerWeights::default();
        let pool = candidates(&normalize("mall plaza"), &weights);
        assert!(pool.len() >= 2, "both mall plaza entries should float");
        assert!(pool.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }
}
