use serde::{Deserialize, Serialize};

use crate::domain::trip::{QuoteOutcome, TripDraft};
use crate::geocode::Candidate;

/// External channel identity (WhatsApp phone id). Sessions are keyed by
/// it; one in-progress quote conversation per sender.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderId(pub String);

impl std::fmt::Display for SenderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Conversation position. Collection states run in declared order;
/// `OriginChoice`/`DestinationChoice` are the disambiguation sub-dialogs
/// and `FieldChoice` is the "which field do you want to change" step
/// reachable only from `Confirm`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Name,
    Email,
    Passengers,
    TravelDate,
    Origin,
    OriginChoice,
    Destination,
    DestinationChoice,
    DepartureTime,
    ReturnTime,
    Phone,
    FieldChoice,
    Confirm,
}

/// A correctable quote field, as the user names it from the summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Passengers,
    TravelDate,
    Origin,
    Destination,
    DepartureTime,
    ReturnTime,
    Phone,
}

impl Field {
    /// The collection state that re-asks this field.
    pub fn collection_state(&self) -> SessionState {
        match self {
            Self::Name => SessionState::Name,
            Self::Email => SessionState::Email,
            Self::Passengers => SessionState::Passengers,
            Self::TravelDate => SessionState::TravelDate,
            Self::Origin => SessionState::Origin,
            Self::Destination => SessionState::Destination,
            Self::DepartureTime => SessionState::DepartureTime,
            Self::ReturnTime => SessionState::ReturnTime,
            Self::Phone => SessionState::Phone,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "nombre",
            Self::Email => "correo",
            Self::Passengers => "pasajeros",
            Self::TravelDate => "fecha de viaje",
            Self::Origin => "origen",
            Self::Destination => "destino",
            Self::DepartureTime => "hora de ida",
            Self::ReturnTime => "hora de regreso",
            Self::Phone => "teléfono",
        }
    }
}

/// Mutable record of one in-progress quote conversation.
///
/// `returns_to` is the correction continuation: while re-collecting a
/// single field from `Confirm`, it holds `Confirm` so the completed
/// collection jumps back to the summary instead of advancing linearly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteSession {
    pub sender: SenderId,
    pub state: SessionState,
    pub returns_to: Option<SessionState>,
    pub trip: TripDraft,
    pub origin_candidates: Vec<Candidate>,
    pub destination_candidates: Vec<Candidate>,
    pub quote: Option<QuoteOutcome>,
}

impl QuoteSession {
    pub fn new(sender: SenderId) -> Self {
        Self {
            sender,
            state: SessionState::Idle,
            returns_to: None,
            trip: TripDraft::default(),
            origin_candidates: Vec::new(),
            destination_candidates: Vec::new(),
            quote: None,
        }
    }

    /// Reset to the top-level menu, discarding in-progress collection.
    /// The global greeting override relies on this being total.
    pub fn reset(&mut self) {
        let sender = self.sender.clone();
        *self = Self::new(sender);
    }

    /// Enter correction mode for one field: jump to its collection state
    /// and remember to come back to `Confirm`.
    pub fn begin_correction(&mut self, field: Field) {
        self.returns_to = Some(SessionState::Confirm);
        self.state = field.collection_state();
    }

    /// Where to go after a collection state completes: the pending
    /// correction continuation wins over the linear successor.
    pub fn take_continuation(&mut self) -> Option<SessionState> {
        self.returns_to.take()
    }
}
