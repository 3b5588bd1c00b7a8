pub mod config;
pub mod delivery;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod fleet;
pub mod geocode;
pub mod routing;

pub use delivery::{InMemoryQuoteLedger, LedgerError, LogNotifier, NotifyError, QuoteLedger, QuoteNotifier};
pub use domain::coordinate::{BoundingBox, Coordinate, CHILE_BOUNDS};
pub use domain::session::{Field, QuoteSession, SenderId, SessionState};
pub use domain::trip::{
    PricedQuote, QuoteId, QuoteOutcome, QuoteRecord, Stop, TripDraft, TRAVEL_DATE_FORMAT,
    TRAVEL_TIME_FORMAT,
};
pub use engine::{ConversationEngine, Inbound, InMemorySessionStore, Outbound, PromptOption, SessionStore};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use fleet::{allocate, fleet_summary, AllocationError, RateTable, VehicleAssignment, VehicleClass, VehiclePlan};
pub use geocode::{AddressResolver, Candidate, CandidateSource, ResolveError};
pub use routing::{RouteError, RouteProvider, RouteSummary};
