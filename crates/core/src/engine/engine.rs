use std::sync::Arc;

use chrono::{Local, Utc};
use tracing::{info, warn};

use crate::delivery::{QuoteLedger, QuoteNotifier};
use crate::domain::coordinate::Coordinate;
use crate::domain::session::{Field, QuoteSession, SenderId, SessionState};
use crate::domain::trip::{round2, PricedQuote, QuoteId, QuoteOutcome, QuoteRecord, Stop, TripDraft};
use crate::engine::prompts;
use crate::engine::store::SessionStore;
use crate::engine::validate::{self, TravelDateError};
use crate::engine::{Inbound, Outbound};
use crate::errors::{ApplicationError, DomainError};
use crate::fleet::{allocate, RateTable};
use crate::geocode::{AddressResolver, ResolveError};
use crate::routing::RouteProvider;

/// Maximum candidates offered in a disambiguation sub-dialog.
pub const DISAMBIGUATION_LIMIT: usize = 3;

/// Whether the session survives the turn. Confirmation is the only path
/// that discards it.
enum Disposition {
    Persist,
    Discard,
}

/// Which end of the trip a collection state is filling.
#[derive(Clone, Copy, PartialEq, Eq)]
enum StopSlot {
    Origin,
    Destination,
}

impl StopSlot {
    fn option_prefix(self) -> &'static str {
        match self {
            Self::Origin => prompts::OPT_ORIGIN_PREFIX,
            Self::Destination => prompts::OPT_DESTINATION_PREFIX,
        }
    }
}

/// The per-sender conversation state machine.
///
/// One `handle` call per inbound utterance; the transport adapter
/// delivers the returned prompts and guarantees per-sender ordering.
pub struct ConversationEngine {
    resolver: Arc<dyn AddressResolver>,
    routes: Arc<dyn RouteProvider>,
    ledger: Arc<dyn QuoteLedger>,
    notifier: Arc<dyn QuoteNotifier>,
    sessions: Arc<dyn SessionStore>,
    rates: RateTable,
}

impl ConversationEngine {
    pub fn new(
        resolver: Arc<dyn AddressResolver>,
        routes: Arc<dyn RouteProvider>,
        ledger: Arc<dyn QuoteLedger>,
        notifier: Arc<dyn QuoteNotifier>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self { resolver, routes, ledger, notifier, sessions, rates: RateTable::default() }
    }

    pub fn with_rates(mut self, rates: RateTable) -> Self {
        self.rates = rates;
        self
    }

    pub async fn handle(&self, sender: &SenderId, inbound: Inbound) -> Vec<Outbound> {
        let mut session = self.sessions.get_or_create(sender).await;

        // Global escape hatch: a greeting always returns to the menu,
        // discarding whatever was being collected.
        if let Inbound::Text(text) = &inbound {
            if validate::is_greeting(text) {
                session.reset();
                self.sessions.save(session).await;
                return vec![prompts::main_menu()];
            }
        }

        let from = session.state;
        let (replies, disposition) = self.dispatch(&mut session, inbound).await;
        info!(
            event_name = "conversation.turn",
            sender = %session.sender,
            from = ?from,
            to = ?session.state,
            replies = replies.len(),
            "conversation turn handled"
        );

        match disposition {
            Disposition::Persist => self.sessions.save(session).await,
            Disposition::Discard => self.sessions.remove(sender).await,
        }
        replies
    }

    async fn dispatch(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match session.state {
            SessionState::Idle => self.handle_idle(session, inbound),
            SessionState::Name => self.handle_name(session, inbound),
            SessionState::Email => self.handle_email(session, inbound),
            SessionState::Passengers => self.handle_passengers(session, inbound),
            SessionState::TravelDate => self.handle_travel_date(session, inbound),
            SessionState::Origin => self.collect_stop(session, inbound, StopSlot::Origin).await,
            SessionState::OriginChoice => self.choose_stop(session, inbound, StopSlot::Origin),
            SessionState::Destination => {
                self.collect_stop(session, inbound, StopSlot::Destination).await
            }
            SessionState::DestinationChoice => {
                self.choose_stop(session, inbound, StopSlot::Destination)
            }
            SessionState::DepartureTime => self.handle_departure_time(session, inbound),
            SessionState::ReturnTime => self.handle_return_time(session, inbound),
            SessionState::Phone => self.handle_phone(session, inbound),
            SessionState::FieldChoice => self.handle_field_choice(session, inbound),
            SessionState::Confirm => self.handle_confirm(session, inbound).await,
        }
    }

    fn handle_idle(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Option(id) if id == prompts::OPT_START_QUOTE => {
                session.state = SessionState::Name;
                (vec![prompts::ask_name()], Disposition::Persist)
            }
            Inbound::Option(id) if id == prompts::OPT_HUMAN => {
                (vec![prompts::human_handoff()], Disposition::Persist)
            }
            Inbound::Text(text) if validate::fold(&text).contains("cotiza") => {
                session.state = SessionState::Name;
                (vec![prompts::ask_name()], Disposition::Persist)
            }
            Inbound::Text(text) if validate::fold(&text).contains("ejecutivo") => {
                (vec![prompts::human_handoff()], Disposition::Persist)
            }
            _ => (vec![prompts::main_menu()], Disposition::Persist),
        }
    }

    fn handle_name(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Text(text) if !text.trim().is_empty() => {
                session.trip.name = Some(text.trim().to_string());
                (self.advance(session, SessionState::Email, prompts::ask_email()), Disposition::Persist)
            }
            _ => (vec![prompts::ask_name()], Disposition::Persist),
        }
    }

    fn handle_email(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Text(text) if validate::is_valid_email(&text) => {
                session.trip.email = Some(text.trim().to_string());
                (
                    self.advance(session, SessionState::Passengers, prompts::ask_passengers()),
                    Disposition::Persist,
                )
            }
            _ => (vec![prompts::email_invalid()], Disposition::Persist),
        }
    }

    fn handle_passengers(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Text(text) => match validate::parse_passenger_count(&text) {
                Some(count) => {
                    session.trip.passengers = Some(count);
                    (
                        self.advance(session, SessionState::TravelDate, prompts::ask_travel_date()),
                        Disposition::Persist,
                    )
                }
                None => (vec![prompts::passengers_invalid()], Disposition::Persist),
            },
            _ => (vec![prompts::passengers_invalid()], Disposition::Persist),
        }
    }

    fn handle_travel_date(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Text(text) => {
                let today = Local::now().date_naive();
                match validate::parse_travel_date(&text, today) {
                    Ok(date) => {
                        session.trip.travel_date = Some(date);
                        (
                            self.advance(session, SessionState::Origin, prompts::ask_origin()),
                            Disposition::Persist,
                        )
                    }
                    Err(TravelDateError::InPast) => {
                        (vec![prompts::travel_date_past()], Disposition::Persist)
                    }
                    Err(TravelDateError::BadFormat) => {
                        (vec![prompts::travel_date_invalid()], Disposition::Persist)
                    }
                }
            }
            _ => (vec![prompts::ask_travel_date()], Disposition::Persist),
        }
    }

    async fn collect_stop(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
        slot: StopSlot,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Location { lat, lon } => {
                let stop = Stop::pinned("Ubicación compartida", Coordinate::new(lat, lon));
                self.set_stop(session, slot, stop);
                (self.advance_past_stop(session, slot), Disposition::Persist)
            }
            Inbound::Text(text) => {
                let query = text.trim().to_string();
                match self.resolver.resolve_candidates(&query, DISAMBIGUATION_LIMIT).await {
                    Err(ResolveError::EmptyQuery) => {
                        (vec![prompts::address_retry()], Disposition::Persist)
                    }
                    Err(error) => {
                        // Resolution trouble never blocks collection; the
                        // confirm boundary re-resolves or degrades.
                        warn!(
                            event_name = "address.resolution_deferred",
                            sender = %session.sender,
                            error = %error,
                            "address resolution failed during collection, deferring"
                        );
                        self.set_stop(session, slot, Stop::from_text(query));
                        (self.advance_past_stop(session, slot), Disposition::Persist)
                    }
                    Ok(candidates) if candidates.len() >= 2 => {
                        let prompt = prompts::address_choice(slot.option_prefix(), &candidates);
                        match slot {
                            StopSlot::Origin => {
                                session.origin_candidates = candidates;
                                session.state = SessionState::OriginChoice;
                            }
                            StopSlot::Destination => {
                                session.destination_candidates = candidates;
                                session.state = SessionState::DestinationChoice;
                            }
                        }
                        (vec![prompt], Disposition::Persist)
                    }
                    Ok(candidates) => {
                        let stop = match candidates.first() {
                            Some(candidate) => Stop {
                                label: query,
                                coordinate: Some(candidate.coordinate),
                            },
                            None => Stop::from_text(query),
                        };
                        self.set_stop(session, slot, stop);
                        (self.advance_past_stop(session, slot), Disposition::Persist)
                    }
                }
            }
            Inbound::Option(_) => {
                let prompt = match slot {
                    StopSlot::Origin => prompts::ask_origin(),
                    StopSlot::Destination => prompts::ask_destination(),
                };
                (vec![prompt], Disposition::Persist)
            }
        }
    }

    fn choose_stop(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
        slot: StopSlot,
    ) -> (Vec<Outbound>, Disposition) {
        let candidates = match slot {
            StopSlot::Origin => session.origin_candidates.clone(),
            StopSlot::Destination => session.destination_candidates.clone(),
        };

        let index = match &inbound {
            Inbound::Option(id) => {
                id.strip_prefix(slot.option_prefix()).and_then(|raw| raw.parse::<usize>().ok())
            }
            // Typed "1".."3" selects the matching option.
            Inbound::Text(text) => {
                text.trim().parse::<usize>().ok().and_then(|number| number.checked_sub(1))
            }
            Inbound::Location { .. } => None,
        };

        match index.and_then(|index| candidates.get(index)) {
            Some(candidate) => {
                let stop = Stop::pinned(candidate.name.clone(), candidate.coordinate);
                self.set_stop(session, slot, stop);
                match slot {
                    StopSlot::Origin => session.origin_candidates.clear(),
                    StopSlot::Destination => session.destination_candidates.clear(),
                }
                (self.advance_past_stop(session, slot), Disposition::Persist)
            }
            None => (
                vec![prompts::address_choice(slot.option_prefix(), &candidates)],
                Disposition::Persist,
            ),
        }
    }

    fn handle_departure_time(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Text(text) => match validate::parse_travel_time(&text) {
                Some(time) => {
                    session.trip.departure_time = Some(time);
                    (
                        self.advance(session, SessionState::ReturnTime, prompts::ask_return_time()),
                        Disposition::Persist,
                    )
                }
                None => (vec![prompts::time_invalid()], Disposition::Persist),
            },
            _ => (vec![prompts::time_invalid()], Disposition::Persist),
        }
    }

    fn handle_return_time(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Text(text) => match validate::parse_travel_time(&text) {
                // No cross-check against the departure time: overnight
                // round trips are a legitimate booking.
                Some(time) => {
                    session.trip.return_time = Some(time);
                    (
                        self.advance(session, SessionState::Phone, prompts::ask_phone()),
                        Disposition::Persist,
                    )
                }
                None => (vec![prompts::time_invalid()], Disposition::Persist),
            },
            _ => (vec![prompts::time_invalid()], Disposition::Persist),
        }
    }

    fn handle_phone(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Text(text) if validate::is_valid_phone(&text) => {
                session.trip.phone = Some(text.trim().to_string());
                (self.to_confirm(session), Disposition::Persist)
            }
            _ => (vec![prompts::phone_invalid()], Disposition::Persist),
        }
    }

    fn handle_field_choice(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Text(text) => match validate::parse_field_name(&text) {
                Some(field) => self.start_correction(session, field),
                None => (vec![prompts::field_unknown()], Disposition::Persist),
            },
            _ => (vec![prompts::field_unknown()], Disposition::Persist),
        }
    }

    async fn handle_confirm(
        &self,
        session: &mut QuoteSession,
        inbound: Inbound,
    ) -> (Vec<Outbound>, Disposition) {
        match inbound {
            Inbound::Option(id) if id == prompts::OPT_CONFIRM_YES => self.complete(session).await,
            Inbound::Option(id) if id == prompts::OPT_CONFIRM_EDIT => {
                session.state = SessionState::FieldChoice;
                (vec![prompts::ask_field_choice()], Disposition::Persist)
            }
            Inbound::Text(text) if validate::is_affirmative(&text) => self.complete(session).await,
            Inbound::Text(text) => match validate::parse_field_name(&text) {
                Some(field) => self.start_correction(session, field),
                None => (vec![prompts::confirm_retry()], Disposition::Persist),
            },
            _ => (vec![prompts::confirm_retry()], Disposition::Persist),
        }
    }

    /// Run the confirm pipeline. The acknowledgment goes out first; every
    /// downstream failure degrades to manual follow-up instead of
    /// surfacing, so the conversation can never dead-end here.
    async fn complete(&self, session: &mut QuoteSession) -> (Vec<Outbound>, Disposition) {
        let mut replies = vec![prompts::quote_received()];

        let outcome = self.finalize(&session.trip).await;
        session.quote = Some(outcome.clone());

        match QuoteRecord::from_parts(&session.trip, &outcome, Utc::now()) {
            Some(record) => {
                if let Err(error) = self.ledger.append(&record).await {
                    warn!(
                        event_name = "quote.persistence_degraded",
                        quote_id = %record.quote_id,
                        error = %error,
                        "quote record not persisted, operator follow-up required"
                    );
                }
                if let Err(error) = self.notifier.notify(&record).await {
                    warn!(
                        event_name = "quote.notification_degraded",
                        quote_id = %record.quote_id,
                        error = %error,
                        "quote notification not delivered, operator follow-up required"
                    );
                }
            }
            None => {
                warn!(
                    event_name = "quote.record_incomplete",
                    sender = %session.sender,
                    "confirm reached with an incomplete draft"
                );
            }
        }

        replies.push(prompts::main_menu());
        (replies, Disposition::Discard)
    }

    async fn finalize(&self, trip: &TripDraft) -> QuoteOutcome {
        let quote_id = QuoteId::generate();
        match self.price_trip(quote_id.clone(), trip).await {
            Ok(priced) => {
                info!(
                    event_name = "quote.priced",
                    quote_id = %priced.quote_id,
                    total_km = priced.total_km,
                    total_price = %priced.plan.total_price(),
                    "quote priced"
                );
                QuoteOutcome::Priced(priced)
            }
            Err(error) => {
                warn!(
                    event_name = "quote.pricing_degraded",
                    quote_id = %quote_id,
                    error = %error,
                    "quote degraded to pending manual pricing"
                );
                QuoteOutcome::PendingManual { quote_id, error: error.to_string() }
            }
        }
    }

    async fn price_trip(
        &self,
        quote_id: QuoteId,
        trip: &TripDraft,
    ) -> Result<PricedQuote, ApplicationError> {
        let passengers = trip.passengers.ok_or_else(|| {
            ApplicationError::Domain(DomainError::InvariantViolation(
                "passenger count missing at confirm".to_string(),
            ))
        })?;

        let origin = self.stop_coordinate(trip.origin.as_ref()).await?;
        let destination = self.stop_coordinate(trip.destination.as_ref()).await?;

        // One leg out, same leg back.
        let leg = self.routes.route(origin, destination).await?;
        let total_km = round2(leg.km * 2.0);
        let total_hours = round2(leg.hours * 2.0);

        let plan =
            allocate(total_km, total_hours, passengers, &self.rates).map_err(DomainError::from)?;

        Ok(PricedQuote { quote_id, total_km, total_hours, plan, route_geometry: leg.geometry })
    }

    async fn stop_coordinate(&self, stop: Option<&Stop>) -> Result<Coordinate, ApplicationError> {
        let stop = stop.ok_or_else(|| {
            ApplicationError::Domain(DomainError::InvariantViolation(
                "trip stop missing at confirm".to_string(),
            ))
        })?;

        if let Some(coordinate) = stop.coordinate {
            return Ok(coordinate);
        }

        let candidate = self.resolver.resolve_one(&stop.label).await?;
        Ok(candidate.coordinate)
    }

    fn start_correction(
        &self,
        session: &mut QuoteSession,
        field: Field,
    ) -> (Vec<Outbound>, Disposition) {
        session.begin_correction(field);
        (
            vec![prompts::correction_intro(field.label()), self.prompt_for(field.collection_state())],
            Disposition::Persist,
        )
    }

    fn prompt_for(&self, state: SessionState) -> Outbound {
        match state {
            SessionState::Name => prompts::ask_name(),
            SessionState::Email => prompts::ask_email(),
            SessionState::Passengers => prompts::ask_passengers(),
            SessionState::TravelDate => prompts::ask_travel_date(),
            SessionState::Origin => prompts::ask_origin(),
            SessionState::Destination => prompts::ask_destination(),
            SessionState::DepartureTime => prompts::ask_departure_time(),
            SessionState::ReturnTime => prompts::ask_return_time(),
            SessionState::Phone => prompts::ask_phone(),
            SessionState::Idle
            | SessionState::OriginChoice
            | SessionState::DestinationChoice
            | SessionState::FieldChoice
            | SessionState::Confirm => prompts::main_menu(),
        }
    }

    fn set_stop(&self, session: &mut QuoteSession, slot: StopSlot, stop: Stop) {
        match slot {
            StopSlot::Origin => session.trip.origin = Some(stop),
            StopSlot::Destination => session.trip.destination = Some(stop),
        }
    }

    fn advance_past_stop(&self, session: &mut QuoteSession, slot: StopSlot) -> Vec<Outbound> {
        match slot {
            StopSlot::Origin => {
                self.advance(session, SessionState::Destination, prompts::ask_destination())
            }
            StopSlot::Destination => {
                self.advance(session, SessionState::DepartureTime, prompts::ask_departure_time())
            }
        }
    }

    /// Linear successor unless a correction continuation is pending, in
    /// which case we return straight to the summary.
    fn advance(
        &self,
        session: &mut QuoteSession,
        next: SessionState,
        prompt: Outbound,
    ) -> Vec<Outbound> {
        if let Some(returns_to) = session.take_continuation() {
            session.state = returns_to;
            return vec![prompts::summary(&session.trip), prompts::confirm_menu()];
        }
        session.state = next;
        vec![prompt]
    }

    fn to_confirm(&self, session: &mut QuoteSession) -> Vec<Outbound> {
        session.returns_to = None;
        session.state = SessionState::Confirm;
        vec![prompts::summary(&session.trip), prompts::confirm_menu()]
    }
}
