//! Staged address resolution: gazetteer → comuna centroid → provider.
//!
//! Every stage returns an explicit outcome instead of falling through on
//! exceptions, so "why did stage 1 reject" stays observable.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use cotibot_core::{AddressResolver, Candidate, CandidateSource, ResolveError};

use crate::comunas;
use crate::gazetteer;
use crate::normalize::normalize;
use crate::provider::{ForwardGeocoder, NullGeocoder};
use crate::scoring::{provider_score, GazetteerWeights, ProviderWeights};

/// Candidates closer than this are the same place for disambiguation
/// purposes.
const DISTINCT_CANDIDATE_METERS: f64 = 250.0;

pub struct GeoResolver {
    geocoder: Arc<dyn ForwardGeocoder>,
    gazetteer_weights: GazetteerWeights,
    provider_weights: ProviderWeights,
}

impl GeoResolver {
    pub fn new(geocoder: Arc<dyn ForwardGeocoder>) -> Self {
        Self {
            geocoder,
            gazetteer_weights: GazetteerWeights::default(),
            provider_weights: ProviderWeights::default(),
        }
    }

    /// Resolver without a provider: gazetteer and centroid stages only.
    pub fn offline() -> Self {
        Self::new(Arc::new(NullGeocoder))
    }

    pub fn with_weights(mut self, gazetteer: GazetteerWeights, provider: ProviderWeights) -> Self {
        self.gazetteer_weights = gazetteer;
        self.provider_weights = provider;
        self
    }

    /// Query variants in increasing specificity; recall for short or
    /// ambiguous inputs comes from the regional/country suffixes.
    fn query_variants(query: &str) -> [String; 3] {
        [
            query.to_string(),
            format!("{query}, región metropolitana"),
            format!("{query}, región metropolitana, chile"),
        ]
    }

    async fn provider_stage(&self, query: &str) -> Result<Vec<Candidate>, ResolveError> {
        let normalized = normalize(query);
        let mut pool: Vec<Candidate> = Vec::new();
        let mut last_error: Option<ResolveError> = None;

        for variant in Self::query_variants(query) {
            let hits = match self.geocoder.search(&variant).await {
                Ok(hits) => hits,
                Err(error) => {
                    warn!(
                        event_name = "geocode.variant_failed",
                        variant = %variant,
                        error = %error,
                        "provider variant query failed"
                    );
                    last_error = Some(error);
                    continue;
                }
            };

            for hit in hits {
                let score = provider_score(
                    &normalized,
                    &normalize(&hit.display_name),
                    hit.relevance,
                    &hit.place_types,
                    &self.provider_weights,
                );
                pool.push(Candidate {
                    name: hit.display_name,
                    coordinate: hit.coordinate,
                    source: CandidateSource::Provider,
                    score,
                });
            }

            let best_so_far =
                pool.iter().map(|candidate| candidate.score).fold(f64::NEG_INFINITY, f64::max);
            if best_so_far >= self.provider_weights.early_exit {
                debug!(
                    event_name = "geocode.early_exit",
                    variant = %variant,
                    best = best_so_far,
                    "provider variant scored high enough to stop"
                );
                break;
            }
        }

        if pool.is_empty() {
            if let Some(error) = last_error {
                return Err(error);
            }
        }

        pool.sort_by(|left, right| right.score.total_cmp(&left.score));
        Ok(pool)
    }

    fn non_empty(query: &str) -> Result<&str, ResolveError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(ResolveError::EmptyQuery);
        }
        Ok(trimmed)
    }
}

#[async_trait]
impl AddressResolver for GeoResolver {
    async fn resolve_one(&self, query: &str) -> Result<Candidate, ResolveError> {
        let query = Self::non_empty(query)?;
        let normalized = normalize(query);

        if let Some(hit) = gazetteer::best_match(&normalized, &self.gazetteer_weights) {
            debug!(event_name = "geocode.gazetteer_hit", query = %query, name = %hit.name, score = hit.score, "gazetteer stage accepted");
            return Ok(hit);
        }

        if let Some(hit) = comunas::centroid(&normalized) {
            debug!(event_name = "geocode.centroid_hit", query = %query, name = %hit.name, "centroid stage accepted");
            return Ok(hit);
        }

        let pool = self.provider_stage(query).await?;
        let best = pool
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NoMatch { query: query.to_string() })?;

        if !best.coordinate.within_chile() {
            return Err(ResolveError::OutOfBounds { name: best.name, coordinate: best.coordinate });
        }

        Ok(best)
    }

    async fn resolve_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, ResolveError> {
        let query = Self::non_empty(query)?;
        let normalized = normalize(query);

        // A confident offline hit is authoritative; offering provider
        // alternatives next to it would reintroduce the misplacements
        // the offline stages exist to prevent.
        if let Some(hit) = gazetteer::best_match(&normalized, &self.gazetteer_weights) {
            return Ok(vec![hit]);
        }
        if let Some(hit) = comunas::centroid(&normalized) {
            return Ok(vec![hit]);
        }

        let mut pool = gazetteer::candidates(&normalized, &self.gazetteer_weights);
        match self.provider_stage(query).await {
            Ok(provider_pool) => pool.extend(provider_pool),
            // Provider trouble degrades to offline-only candidates.
            Err(error) => warn!(
                event_name = "geocode.provider_degraded",
                query = %query,
                error = %error,
                "candidate search continuing without provider results"
            ),
        }

        pool.retain(|candidate| candidate.coordinate.within_chile());
        pool.sort_by(|left, right| right.score.total_cmp(&left.score));

        let mut distinct: Vec<Candidate> = Vec::new();
        for candidate in pool {
            if distinct.len() >= limit {
                break;
            }
            let duplicate = distinct.iter().any(|kept| {
                normalize(&kept.name) == normalize(&candidate.name)
                    || kept.coordinate.distance_m(candidate.coordinate)
                        < DISTINCT_CANDIDATE_METERS
            });
            if !duplicate {
                distinct.push(candidate);
            }
        }

        Ok(distinct)
    }
}
