//! User-facing prompt texts and option identifiers.
//!
//! All copy is Chilean-Spanish, matching the operator's channel. The
//! engine only assembles these; delivery formatting (button limits,
//! truncation) belongs to the transport adapter.

use crate::domain::trip::{TripDraft, TRAVEL_DATE_FORMAT, TRAVEL_TIME_FORMAT};
use crate::engine::{Outbound, PromptOption};
use crate::geocode::Candidate;

pub const OPT_START_QUOTE: &str = "menu_cotizar";
pub const OPT_HUMAN: &str = "menu_ejecutivo";
pub const OPT_CONFIRM_YES: &str = "confirmar_si";
pub const OPT_CONFIRM_EDIT: &str = "confirmar_editar";
pub const OPT_ORIGIN_PREFIX: &str = "origen_";
pub const OPT_DESTINATION_PREFIX: &str = "destino_";

pub fn main_menu() -> Outbound {
    Outbound {
        text: "🚍 ¡Hola! Soy el asistente de cotizaciones.\n¿Qué necesitas hoy?".to_string(),
        options: vec![
            PromptOption::new(OPT_START_QUOTE, "Cotizar un viaje"),
            PromptOption::new(OPT_HUMAN, "Hablar con un ejecutivo"),
        ],
    }
}

pub fn human_handoff() -> Outbound {
    Outbound::text(
        "👤 Un ejecutivo te contactará dentro del horario hábil.\n\
         También puedes escribirnos a contacto@ecobus.cl 🙌",
    )
}

pub fn ask_name() -> Outbound {
    Outbound::text("🙋 ¿A nombre de quién hacemos la cotización?")
}

pub fn ask_email() -> Outbound {
    Outbound::text("📧 ¿Cuál es tu correo de contacto?")
}

pub fn email_invalid() -> Outbound {
    Outbound::text("⚠️ Correo inválido. Ej: cliente@empresa.cl\nIntenta nuevamente:")
}

pub fn ask_passengers() -> Outbound {
    Outbound::text("👥 ¿Cuántos pasajeros serán?")
}

pub fn passengers_invalid() -> Outbound {
    Outbound::text("⚠️ Necesito un número de pasajeros mayor a cero. Ej: 25")
}

pub fn ask_travel_date() -> Outbound {
    Outbound::text("📅 Fecha viaje (DD-MM-AAAA)")
}

pub fn travel_date_invalid() -> Outbound {
    Outbound::text("⚠️ Formato incorrecto. Ej: 25-12-2025")
}

pub fn travel_date_past() -> Outbound {
    Outbound::text("⚠️ Fecha pasada. Ingrésala nuevamente:")
}

pub fn ask_origin() -> Outbound {
    Outbound::text("📍 Dirección de origen:")
}

pub fn ask_destination() -> Outbound {
    Outbound::text("📍 Dirección de destino:")
}

pub fn address_retry() -> Outbound {
    Outbound::text("⚠️ No entendí la dirección. Escríbela nuevamente:")
}

/// Disambiguation prompt: up to three candidates as selectable options.
pub fn address_choice(prefix: &str, candidates: &[Candidate]) -> Outbound {
    let options = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            PromptOption::new(format!("{prefix}{index}"), candidate.name.clone())
        })
        .collect();

    Outbound {
        text: "🤔 Encontré varias opciones. ¿Cuál es la correcta?".to_string(),
        options,
    }
}

pub fn ask_departure_time() -> Outbound {
    Outbound::text("🕒 Hora Ida (HH:MM)")
}

pub fn ask_return_time() -> Outbound {
    Outbound::text("🕒 Hora Regreso (HH:MM)")
}

pub fn time_invalid() -> Outbound {
    Outbound::text("⚠️ Hora inválida. Ej: 07:45")
}

pub fn ask_phone() -> Outbound {
    Outbound::text("📱 Teléfono de contacto:")
}

pub fn phone_invalid() -> Outbound {
    Outbound::text("⚠️ Teléfono inválido. Ej: +56 9 12345678")
}

pub fn summary(trip: &TripDraft) -> Outbound {
    let fmt = |value: &Option<String>| value.clone().unwrap_or_else(|| "—".to_string());
    let stop = |value: &Option<crate::domain::trip::Stop>| {
        value.as_ref().map(|stop| stop.label.clone()).unwrap_or_else(|| "—".to_string())
    };
    let date = trip
        .travel_date
        .map(|date| date.format(TRAVEL_DATE_FORMAT).to_string())
        .unwrap_or_else(|| "—".to_string());
    let time = |value: &Option<chrono::NaiveTime>| {
        value.map(|t| t.format(TRAVEL_TIME_FORMAT).to_string()).unwrap_or_else(|| "—".to_string())
    };
    let passengers =
        trip.passengers.map(|count| count.to_string()).unwrap_or_else(|| "—".to_string());

    Outbound::text(format!(
        "📋 *Resumen de tu solicitud*\n\
         • Nombre: {}\n\
         • Correo: {}\n\
         • Pasajeros: {}\n\
         • Fecha viaje: {}\n\
         • Origen: {}\n\
         • Destino: {}\n\
         • Hora ida: {}\n\
         • Hora regreso: {}\n\
         • Teléfono: {}",
        fmt(&trip.name),
        fmt(&trip.email),
        passengers,
        date,
        stop(&trip.origin),
        stop(&trip.destination),
        time(&trip.departure_time),
        time(&trip.return_time),
        fmt(&trip.phone),
    ))
}

pub fn confirm_menu() -> Outbound {
    Outbound {
        text: "¿Confirmas estos datos?".to_string(),
        options: vec![
            PromptOption::new(OPT_CONFIRM_YES, "Sí, confirmar"),
            PromptOption::new(OPT_CONFIRM_EDIT, "Cambiar un dato"),
        ],
    }
}

pub fn confirm_retry() -> Outbound {
    Outbound::text(
        "🤖 Para continuar, confirma con el botón o dime qué dato quieres cambiar \
         (nombre, correo, pasajeros, fecha, origen, destino, hora ida, hora regreso o teléfono).",
    )
}

pub fn ask_field_choice() -> Outbound {
    Outbound::text(
        "👌 Puedes corregir lo que necesites.\n¿Qué dato quieres cambiar?\n\
         (nombre, correo, pasajeros, fecha, origen, destino, hora ida, hora regreso o teléfono)",
    )
}

pub fn field_unknown() -> Outbound {
    Outbound::text(
        "⚠️ No reconocí ese dato. Dime uno de estos: nombre, correo, pasajeros, fecha, \
         origen, destino, hora ida, hora regreso o teléfono.",
    )
}

pub fn correction_intro(label: &str) -> Outbound {
    Outbound::text(format!("✏️ Perfecto, corrijamos el {label}."))
}

pub fn quote_received() -> Outbound {
    Outbound::text(
        "🎉 *¡Solicitud recibida exitosamente!*\n\
         Estamos preparando tu cotización 🚍\n\
         📧 Revisa tu correo, ahí te llegará la información.\n\
         Un ejecutivo te contactará pronto 🙌",
    )
}

#[cfg(test)]
mod tests {
    use super::{address_choice, confirm_menu, main_menu, summary, OPT_ORIGIN_PREFIX};
    use crate::domain::coordinate::Coordinate;
    use crate::domain::trip::TripDraft;
    use crate::geocode::{Candidate, CandidateSource};

    #[test]
    fn main_menu_offers_quote_and_human_options() {
        let menu = main_menu();
        assert_eq!(menu.options.len(), 2);
        assert_eq!(menu.options[0].id, "menu_cotizar");
    }

    #[test]
    fn address_choice_numbers_option_ids_by_candidate_index() {
        let candidates = vec![
            Candidate {
                name: "Peñaflor, RM".to_string(),
                coordinate: Coordinate::new(-33.60627, -70.87649),
                source: CandidateSource::Centroid,
                score: 1.0,
            },
            Candidate {
                name: "Calle Peñaflor, Maipú".to_string(),
                coordinate: Coordinate::new(-33.51, -70.76),
                source: CandidateSource::Provider,
                score: 0.6,
            },
        ];

        let prompt = address_choice(OPT_ORIGIN_PREFIX, &candidates);
        assert_eq!(prompt.options.len(), 2);
        assert_eq!(prompt.options[0].id, "origen_0");
        assert_eq!(prompt.options[1].id, "origen_1");
    }

    #[test]
    fn summary_renders_placeholders_for_missing_fields() {
        let text = summary(&TripDraft::default()).text;
        assert!(text.contains("• Nombre: —"));
        assert!(text.contains("• Teléfono: —"));
    }

    #[test]
    fn confirm_menu_has_exactly_affirmative_and_edit() {
        let menu = confirm_menu();
        let ids: Vec<&str> = menu.options.iter().map(|option| option.id.as_str()).collect();
        assert_eq!(ids, vec!["confirmar_si", "confirmar_editar"]);
    }
}
