use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use cotibot_core::config::{AppConfig, LoadOptions};
use cotibot_core::AddressResolver;
use cotibot_geo::{GeoResolver, MapboxGeocoder};

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ResolveReport {
    command: &'static str,
    query: String,
    provider_enabled: bool,
    candidates: Vec<ResolvedCandidate>,
}

#[derive(Debug, Serialize)]
struct ResolvedCandidate {
    name: String,
    lat: f64,
    lon: f64,
    source: &'static str,
    score: f64,
}

pub fn run(query: &str, limit: usize, offline: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("resolve", "config", error.to_string(), 1),
    };

    let (resolver, provider_enabled) = match (&config.geocoding.mapbox_token, offline) {
        (Some(token), false) => {
            let geocoder = match MapboxGeocoder::new(
                token.clone(),
                Duration::from_secs(config.geocoding.timeout_secs),
            ) {
                Ok(geocoder) => geocoder,
                Err(error) => {
                    return CommandResult::failure("resolve", "geocoder", error.to_string(), 1)
                }
            };
            (GeoResolver::new(Arc::new(geocoder)), true)
        }
        _ => (GeoResolver::offline(), false),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("resolve", "runtime", error.to_string(), 1),
    };

    let candidates = match runtime.block_on(resolver.resolve_candidates(query, limit)) {
        Ok(candidates) => candidates,
        Err(error) => return CommandResult::failure("resolve", "resolution", error.to_string(), 1),
    };

    if candidates.is_empty() {
        return CommandResult::failure(
            "resolve",
            "resolution",
            format!("no location found for `{query}`"),
            1,
        );
    }

    let report = ResolveReport {
        command: "resolve",
        query: query.to_string(),
        provider_enabled,
        candidates: candidates
            .into_iter()
            .map(|candidate| ResolvedCandidate {
                name: candidate.name,
                lat: candidate.coordinate.lat,
                lon: candidate.coordinate.lon,
                source: candidate.source.label(),
                score: candidate.score,
            })
            .collect(),
    };

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("resolve", "serialization", error.to_string(), 1),
    }
}
