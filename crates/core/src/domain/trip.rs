use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::coordinate::Coordinate;
use crate::fleet::{fleet_summary, VehiclePlan};

/// Display format used for travel dates everywhere a human sees one.
pub const TRAVEL_DATE_FORMAT: &str = "%d-%m-%Y";
/// Display format for departure/return times.
pub const TRAVEL_TIME_FORMAT: &str = "%H:%M";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl QuoteId {
    /// Short opaque identifier, `COT-` plus eight hex characters.
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        Self(format!("COT-{}", raw[..8].to_uppercase()))
    }
}

impl std::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One end of the trip: what the user typed plus, once known, where it is.
/// The coordinate is cached when a disambiguation choice (or a shared
/// location) pinned it, so pricing never re-resolves the text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub label: String,
    pub coordinate: Option<Coordinate>,
}

impl Stop {
    pub fn from_text(label: impl Into<String>) -> Self {
        Self { label: label.into(), coordinate: None }
    }

    pub fn pinned(label: impl Into<String>, coordinate: Coordinate) -> Self {
        Self { label: label.into(), coordinate: Some(coordinate) }
    }
}

/// Collected quote-request fields. Everything is optional until its
/// collection state has run; `Confirm` requires the full set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TripDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub passengers: Option<u32>,
    pub travel_date: Option<NaiveDate>,
    pub origin: Option<Stop>,
    pub destination: Option<Stop>,
    pub departure_time: Option<NaiveTime>,
    pub return_time: Option<NaiveTime>,
    pub phone: Option<String>,
}

impl TripDraft {
    pub fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.email.is_some()
            && self.passengers.is_some()
            && self.travel_date.is_some()
            && self.origin.is_some()
            && self.destination.is_some()
            && self.departure_time.is_some()
            && self.return_time.is_some()
            && self.phone.is_some()
    }
}

/// Derived pricing fields, populated only by the confirm transition.
/// Either the whole quote priced, or it is pending manual follow-up with
/// the failure recorded; there is no half-priced middle state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum QuoteOutcome {
    Priced(PricedQuote),
    PendingManual { quote_id: QuoteId, error: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricedQuote {
    pub quote_id: QuoteId,
    /// Round-trip totals, rounded to 2 decimals for display/persistence.
    pub total_km: f64,
    pub total_hours: f64,
    pub plan: VehiclePlan,
    pub route_geometry: Option<String>,
}

impl QuoteOutcome {
    pub fn quote_id(&self) -> &QuoteId {
        match self {
            Self::Priced(priced) => &priced.quote_id,
            Self::PendingManual { quote_id, .. } => quote_id,
        }
    }

    pub fn total_price(&self) -> Option<Decimal> {
        match self {
            Self::Priced(priced) => Some(priced.plan.total_price()),
            Self::PendingManual { .. } => None,
        }
    }
}

/// Flat record handed to persistence and notification once a quote is
/// confirmed. Mirrors the row layout of the operator's intake sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub quote_id: QuoteId,
    pub received_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub passengers: u32,
    pub travel_date: NaiveDate,
    pub origin: String,
    pub destination: String,
    pub departure_time: NaiveTime,
    pub return_time: NaiveTime,
    pub phone: String,
    pub total_km: Option<f64>,
    pub total_hours: Option<f64>,
    pub fleet: Option<String>,
    pub total_price: Option<Decimal>,
    pub quote_error: Option<String>,
}

impl QuoteRecord {
    /// Build the persisted record from a complete draft and its outcome.
    /// Returns `None` while any required field is still missing; the
    /// engine only calls this after `Confirm`, where the draft is full.
    pub fn from_parts(
        trip: &TripDraft,
        outcome: &QuoteOutcome,
        received_at: DateTime<Utc>,
    ) -> Option<Self> {
        let (total_km, total_hours, fleet, total_price, quote_error) = match outcome {
            QuoteOutcome::Priced(priced) => (
                Some(priced.total_km),
                Some(priced.total_hours),
                Some(fleet_summary(&priced.plan)),
                Some(priced.plan.total_price()),
                None,
            ),
            QuoteOutcome::PendingManual { error, .. } => {
                (None, None, None, None, Some(error.clone()))
            }
        };

        Some(Self {
            quote_id: outcome.quote_id().clone(),
            received_at,
            name: trip.name.clone()?,
            email: trip.email.clone()?,
            passengers: trip.passengers?,
            travel_date: trip.travel_date?,
            origin: trip.origin.clone()?.label,
            destination: trip.destination.clone()?.label,
            departure_time: trip.departure_time?,
            return_time: trip.return_time?,
            phone: trip.phone.clone()?,
            total_km,
            total_hours,
            fleet,
            total_price,
            quote_error,
        })
    }
}

/// Round to 2 decimals for display and persistence of km/hours totals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
