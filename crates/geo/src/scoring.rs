//! Pure scoring functions for both resolution stages that rank.
//!
//! Every constant here is empirically tuned against operator traffic,
//! not derived; they live in `Default`-bearing structs so they can be
//! adjusted and unit-tested in isolation.

use std::collections::BTreeSet;

use crate::normalize::tokens;

/// Weights for the gazetteer composite score. The non-exact components
/// sum to ~1.9, which is the scale the acceptance threshold lives on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GazetteerWeights {
    pub exact: f64,
    pub containment: f64,
    pub jaccard: f64,
    pub ratio: f64,
    /// Minimum composite score for a gazetteer hit to win outright.
    pub accept_threshold: f64,
    /// Floor for a gazetteer entry to appear as a disambiguation option.
    pub candidate_floor: f64,
}

impl Default for GazetteerWeights {
    fn default() -> Self {
        Self {
            exact: 1.9,
            containment: 0.6,
            jaccard: 0.65,
            ratio: 0.65,
            accept_threshold: 0.72,
            candidate_floor: 0.45,
        }
    }
}

/// Weights for ranking external-provider hits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProviderWeights {
    pub region_bonus: f64,
    pub region_penalty: f64,
    pub short_query_place_bonus: f64,
    pub short_query_address_penalty: f64,
    pub containment_bonus: f64,
    /// A variant hit at or above this score stops trying further
    /// query variants.
    pub early_exit: f64,
}

impl Default for ProviderWeights {
    fn default() -> Self {
        Self {
            region_bonus: 0.25,
            region_penalty: 0.25,
            short_query_place_bonus: 0.2,
            short_query_address_penalty: 0.2,
            containment_bonus: 0.3,
            early_exit: 1.2,
        }
    }
}

/// Token-set Jaccard overlap of two normalized strings.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let left: BTreeSet<&str> = tokens(a).into_iter().collect();
    let right: BTreeSet<&str> = tokens(b).into_iter().collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let intersection = left.intersection(&right).count() as f64;
    let union = left.union(&right).count() as f64;
    intersection / union
}

/// Dice coefficient over character bigrams; the character-level
/// similarity component of the gazetteer composite.
pub fn bigram_ratio(a: &str, b: &str) -> f64 {
    let left = bigrams(a);
    let right = bigrams(b);
    if left.is_empty() || right.is_empty() {
        return if a == b { 1.0 } else { 0.0 };
    }

    let mut matches = 0usize;
    let mut right_pool = right.clone();
    for gram in &left {
        if let Some(position) = right_pool.iter().position(|other| other == gram) {
            right_pool.swap_remove(position);
            matches += 1;
        }
    }

    (2.0 * matches as f64) / (left.len() + right.len()) as f64
}

fn bigrams(text: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = text.chars().filter(|ch| !ch.is_whitespace()).collect();
    chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Composite gazetteer score for a (query, entry) pair, both normalized.
pub fn gazetteer_score(query: &str, entry: &str, weights: &GazetteerWeights) -> f64 {
    if query == entry {
        return weights.exact;
    }

    let mut score = 0.0;
    if query.contains(entry) || entry.contains(query) {
        score += weights.containment;
    }
    score += jaccard(query, entry) * weights.jaccard;
    score += bigram_ratio(query, entry) * weights.ratio;
    score
}

/// Region names a provider hit's display name can betray. Keyword →
/// region pairs below map query words to the entry that should match.
const REGION_NAMES: &[&str] = &[
    "metropolitana",
    "valparaiso",
    "ohiggins",
    "maule",
    "nuble",
    "biobio",
    "coquimbo",
    "araucania",
    "los lagos",
];

const REGION_KEYWORDS: &[(&str, &str)] = &[
    ("vina del mar", "valparaiso"),
    ("vina", "valparaiso"),
    ("valparaiso", "valparaiso"),
    ("quilpue", "valparaiso"),
    ("villa alemana", "valparaiso"),
    ("concon", "valparaiso"),
    ("san antonio", "valparaiso"),
    ("rancagua", "ohiggins"),
    ("curico", "maule"),
    ("talca", "maule"),
    ("chillan", "nuble"),
    ("concepcion", "biobio"),
    ("la serena", "coquimbo"),
    ("coquimbo", "coquimbo"),
    ("temuco", "araucania"),
    ("puerto montt", "los lagos"),
    // Short names that generic geocoders scatter across the country but
    // that operator traffic always means in the capital.
    ("costanera", "metropolitana"),
    ("mall", "metropolitana"),
    ("terminal", "metropolitana"),
    ("plaza", "metropolitana"),
    ("santiago", "metropolitana"),
];

/// Region the query's wording points at, if any.
pub fn expected_region(query: &str) -> Option<&'static str> {
    REGION_KEYWORDS
        .iter()
        .find(|(keyword, _)| query.contains(keyword))
        .map(|(_, region)| *region)
}

/// Structurally preferred Mapbox place types for short queries.
const PLACE_LIKE_TYPES: &[&str] = &["place", "locality", "neighborhood"];

/// Score one provider hit against the query. `relevance` is the
/// provider's own 0..1 confidence; everything else is our correction on
/// top of it.
pub fn provider_score(
    query: &str,
    display_name: &str,
    relevance: f64,
    place_types: &[String],
    weights: &ProviderWeights,
) -> f64 {
    let mut score = relevance.clamp(0.0, 1.0);

    if let Some(region) = expected_region(query) {
        if display_name.contains(region) {
            score += weights.region_bonus;
        } else if REGION_NAMES
            .iter()
            .any(|other| *other != region && display_name.contains(other))
        {
            score -= weights.region_penalty;
        }
    }

    // Short queries are place names, not street addresses; a provider
    // that answers with a same-named street is usually wrong.
    if tokens(query).len() <= 2 {
        if place_types.iter().any(|kind| PLACE_LIKE_TYPES.contains(&kind.as_str())) {
            score += weights.short_query_place_bonus;
        }
        if place_types.iter().any(|kind| kind == "address") {
            score -= weights.short_query_address_penalty;
        }
    }

    if display_name.contains(query) {
        score += weights.containment_bonus;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::{
        bigram_ratio, expected_region, gazetteer_score, jaccard, provider_score,
        GazetteerWeights, ProviderWeights,
    };

    fn types(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn jaccard_counts_shared_tokens() {
        assert_eq!(jaccard("mall plaza oeste", "mall plaza oeste"), 1.0);
        assert!((jaccard("mall plaza oeste", "mall plaza vespucio") - 0.5).abs() < 1e-9);
        assert_eq!(jaccard("", "mall"), 0.0);
    }

    #[test]
    fn bigram_ratio_is_one_for_identical_strings() {
        assert_eq!(bigram_ratio("penaflor", "penaflor"), 1.0);
        assert!(bigram_ratio("penaflor", "penalolen") < 0.7);
        assert!(bigram_ratio("estacion central", "estacion centrall") > 0.9);
    }

    #[test]
    fn exact_gazetteer_match_scores_full_scale() {
        let weights = GazetteerWeights::default();
        assert_eq!(gazetteer_score("estadio nacional", "estadio nacional", &weights), 1.9);
    }

    #[test]
    fn near_match_clears_threshold_unrelated_does_not() {
        let weights = GazetteerWeights::default();
        let near = gazetteer_score("estadio nacional nunoa", "estadio nacional", &weights);
        assert!(near >= weights.accept_threshold, "got {near}");

        let unrelated = gazetteer_score("farellones", "terminal san borja", &weights);
        assert!(unrelated < weights.accept_threshold, "got {unrelated}");
    }

    #[test]
    fn scoring_is_deterministic() {
        let weights = GazetteerWeights::default();
        let first = gazetteer_score("mall plaza oeste cerrillos", "mall plaza oeste", &weights);
        let second = gazetteer_score("mall plaza oeste cerrillos", "mall plaza oeste", &weights);
        assert_eq!(first, second);
    }

    #[test]
    fn region_keywords_resolve_to_expected_region() {
        assert_eq!(expected_region("vina del mar centro"), Some("valparaiso"));
        assert_eq!(expected_region("terminal de buses"), Some("metropolitana"));
        assert_eq!(expected_region("camino rural s n"), None);
    }

    #[test]
    fn wrong_region_is_penalized_symmetrically() {
        let weights = ProviderWeights::default();
        let right = provider_score(
            "vina del mar",
            "vina del mar valparaiso chile",
            0.8,
            &types(&["place"]),
            &weights,
        );
        let wrong = provider_score(
            "vina del mar",
            "calle vina del mar nunoa metropolitana chile",
            0.8,
            &types(&["address"]),
            &weights,
        );
        assert!(right > wrong);
        assert!(right - wrong >= weights.region_bonus + weights.region_penalty);
    }

    #[test]
    fn short_queries_prefer_places_over_streets() {
        let weights = ProviderWeights::default();
        let place = provider_score("penaflor", "penaflor", 0.7, &types(&["place"]), &weights);
        let street =
            provider_score("penaflor", "penaflor 1234", 0.7, &types(&["address"]), &weights);
        assert!(place > street);
    }

    #[test]
    fn long_queries_skip_the_place_type_adjustment() {
        let weights = ProviderWeights::default();
        let score = provider_score(
            "avenida libertador bernardo ohiggins 3363",
            "avenida libertador bernardo ohiggins 3363 estacion central",
            0.9,
            &types(&["address"]),
            &weights,
        );
        // Containment bonus applies, address penalty does not.
        assert!(score > 1.0);
    }
}
