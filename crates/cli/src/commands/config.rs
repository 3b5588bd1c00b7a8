use std::env;

use cotibot_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line("database.url", &config.database.url, Some("COTIBOT_DATABASE_URL")));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        Some("COTIBOT_DATABASE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        Some("COTIBOT_DATABASE_TIMEOUT_SECS"),
    ));

    let access_token = config
        .whatsapp
        .access_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());
    lines.push(render_line(
        "whatsapp.access_token",
        &access_token,
        Some("COTIBOT_WHATSAPP_ACCESS_TOKEN"),
    ));
    lines.push(render_line(
        "whatsapp.phone_number_id",
        config.whatsapp.phone_number_id.as_deref().unwrap_or("(unset)"),
        Some("COTIBOT_WHATSAPP_PHONE_NUMBER_ID"),
    ));

    let mapbox_token = config
        .geocoding
        .mapbox_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());
    lines.push(render_line("geocoding.mapbox_token", &mapbox_token, Some("COTIBOT_MAPBOX_TOKEN")));

    let ors_key = config
        .routing
        .ors_api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());
    lines.push(render_line("routing.ors_api_key", &ors_key, Some("COTIBOT_ORS_API_KEY")));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        Some("COTIBOT_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line("server.port", &config.server.port.to_string(), Some("COTIBOT_SERVER_PORT")));
    lines.push(render_line("logging.level", &config.logging.level, Some("COTIBOT_LOGGING_LEVEL")));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        Some("COTIBOT_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn render_line(key: &str, value: &str, env_var: Option<&str>) -> String {
    let source = env_var
        .filter(|var| env::var(var).map(|value| !value.trim().is_empty()).unwrap_or(false))
        .map(|var| format!("env:{var}"))
        .unwrap_or_else(|| "file|default".to_string());
    format!("  {key} = {value}  [{source}]")
}

fn redact_token(token: &str) -> String {
    if token.is_empty() {
        return "(empty)".to_string();
    }
    let visible: String = token.chars().take(6).collect();
    format!("{visible}…(redacted)")
}
