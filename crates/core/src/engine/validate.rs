//! Input validation for the collection states.
//!
//! Every rule is a pure function over the raw utterance so the re-prompt
//! behavior in the engine stays a one-line decision.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::domain::session::Field;
use crate::domain::trip::{TRAVEL_DATE_FORMAT, TRAVEL_TIME_FORMAT};

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
    })
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Chilean mobile: 9 + 8 digits, optionally prefixed +56 / 56.
    PATTERN.get_or_init(|| Regex::new(r"^(?:\+?56)?9\d{8}$").expect("valid phone regex"))
}

pub fn is_valid_email(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.contains(char::is_whitespace) && email_pattern().is_match(trimmed)
}

pub fn parse_passenger_count(text: &str) -> Option<u32> {
    let digits: String = text.trim().trim_start_matches('+').to_string();
    match digits.parse::<u32>() {
        Ok(count) if count > 0 => Some(count),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TravelDateError {
    BadFormat,
    InPast,
}

/// Fixed `DD-MM-YYYY` format; today is accepted, yesterday is not.
pub fn parse_travel_date(text: &str, today: NaiveDate) -> Result<NaiveDate, TravelDateError> {
    let date = NaiveDate::parse_from_str(text.trim(), TRAVEL_DATE_FORMAT)
        .map_err(|_| TravelDateError::BadFormat)?;
    if date < today {
        return Err(TravelDateError::InPast);
    }
    Ok(date)
}

pub fn parse_travel_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), TRAVEL_TIME_FORMAT).ok()
}

pub fn is_valid_phone(text: &str) -> bool {
    let compact: String = text.chars().filter(|ch| !ch.is_whitespace() && *ch != '-').collect();
    phone_pattern().is_match(&compact)
}

/// Case-fold and strip the accents that show up in chat Spanish.
pub fn fold(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .map(|ch| match ch {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

const GREETINGS: [&str; 7] = ["hola", "menu", "inicio", "buenas", "volver", "empezar", "buenos dias"];

/// Global menu escape: any of these resets the conversation to the
/// top-level menu, no matter the current state.
pub fn is_greeting(text: &str) -> bool {
    let folded = fold(text);
    GREETINGS.contains(&folded.as_str())
}

pub fn is_affirmative(text: &str) -> bool {
    matches!(fold(text).as_str(), "si" | "sí" | "confirmo" | "confirmar" | "ok" | "dale")
}

/// Map a free-text field mention from the summary to the field it names.
pub fn parse_field_name(text: &str) -> Option<Field> {
    let folded = fold(text);

    if folded.contains("correo") || folded.contains("email") || folded.contains("mail") {
        return Some(Field::Email);
    }
    if folded.contains("nombre") {
        return Some(Field::Name);
    }
    if folded.contains("pasajero") {
        return Some(Field::Passengers);
    }
    if folded.contains("fecha") {
        return Some(Field::TravelDate);
    }
    if folded.contains("origen") {
        return Some(Field::Origin);
    }
    if folded.contains("destino") {
        return Some(Field::Destination);
    }
    if folded.contains("regreso") || folded.contains("vuelta") {
        return Some(Field::ReturnTime);
    }
    if folded.contains("ida") || folded.contains("salida") {
        return Some(Field::DepartureTime);
    }
    if folded.contains("telefono") || folded.contains("fono") || folded.contains("celular") {
        return Some(Field::Phone);
    }

    None
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        is_affirmative, is_greeting, is_valid_email, is_valid_phone, parse_field_name,
        parse_passenger_count, parse_travel_date, parse_travel_time, TravelDateError,
    };
    use crate::domain::session::Field;

    #[test]
    fn accepts_plain_corporate_email() {
        assert!(is_valid_email("cliente@empresa.cl"));
        assert!(is_valid_email("  maria.jose+viajes@gmail.com  "));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("dos palabras@empresa.cl"));
        assert!(!is_valid_email("salto\n@empresa.cl"));
        assert!(!is_valid_email("sin@tld"));
    }

    #[test]
    fn passenger_count_must_be_a_positive_integer() {
        assert_eq!(parse_passenger_count("25"), Some(25));
        assert_eq!(parse_passenger_count(" 8 "), Some(8));
        assert_eq!(parse_passenger_count("0"), None);
        assert_eq!(parse_passenger_count("-3"), None);
        assert_eq!(parse_passenger_count("veinte"), None);
        assert_eq!(parse_passenger_count("12.5"), None);
    }

    #[test]
    fn travel_date_today_is_accepted_yesterday_is_not() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).expect("valid date");
        assert_eq!(parse_travel_date("06-08-2026", today), Ok(today));
        assert_eq!(parse_travel_date("05-08-2026", today), Err(TravelDateError::InPast));
        assert!(parse_travel_date("07-08-2026", today).is_ok());
    }

    #[test]
    fn travel_date_requires_day_month_year() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).expect("valid date");
        assert_eq!(parse_travel_date("2026-08-10", today), Err(TravelDateError::BadFormat));
        assert_eq!(parse_travel_date("10/08/2026", today), Err(TravelDateError::BadFormat));
        assert_eq!(parse_travel_date("mañana", today), Err(TravelDateError::BadFormat));
    }

    #[test]
    fn times_parse_as_hh_mm() {
        assert!(parse_travel_time("07:45").is_some());
        assert!(parse_travel_time("18:00").is_some());
        assert!(parse_travel_time("7:45").is_some());
        assert!(parse_travel_time("25:00").is_none());
        assert!(parse_travel_time("a las ocho").is_none());
    }

    #[test]
    fn chilean_mobile_numbers_validate_with_and_without_prefix() {
        assert!(is_valid_phone("+56 9 12345678"));
        assert!(is_valid_phone("56912345678"));
        assert!(is_valid_phone("9 1234 5678"));
        assert!(is_valid_phone("912345678"));
        assert!(!is_valid_phone("22 345 678"));
        assert!(!is_valid_phone("+56 9 1234"));
    }

    #[test]
    fn greetings_reset_from_any_state() {
        assert!(is_greeting("Hola"));
        assert!(is_greeting("MENÚ"));
        assert!(is_greeting("volver"));
        assert!(!is_greeting("santiago centro"));
    }

    #[test]
    fn affirmatives_cover_chat_spelling_variants() {
        assert!(is_affirmative("sí"));
        assert!(is_affirmative("SI"));
        assert!(!is_affirmative("no"));
    }

    #[test]
    fn field_names_resolve_including_accented_spelling() {
        assert_eq!(parse_field_name("el correo"), Some(Field::Email));
        assert_eq!(parse_field_name("Teléfono"), Some(Field::Phone));
        assert_eq!(parse_field_name("hora de ida"), Some(Field::DepartureTime));
        assert_eq!(parse_field_name("hora regreso"), Some(Field::ReturnTime));
        assert_eq!(parse_field_name("la fecha"), Some(Field::TravelDate));
        assert_eq!(parse_field_name("cualquier cosa"), None);
    }

    #[test]
    fn return_time_wins_when_both_time_words_appear() {
        // "hora de vuelta" mentions neither "ida" nor "salida" first;
        // the regreso/vuelta check is ordered before ida on purpose.
        assert_eq!(parse_field_name("vuelta"), Some(Field::ReturnTime));
    }
}
