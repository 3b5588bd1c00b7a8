use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use cotibot_core::config::{AppConfig, ConfigError, LoadOptions};
use cotibot_core::{
    ConversationEngine, Coordinate, InMemorySessionStore, LogNotifier, ResolveError, RouteError,
    RouteProvider, RouteSummary,
};
use cotibot_db::{connect_with_settings, migrations, DbPool, SqlQuoteLedger};
use cotibot_geo::{GeoResolver, MapboxGeocoder, NullGeocoder, OpenRouteServiceRouter};
use cotibot_whatsapp::{CloudApiSender, MessageSender, NoopSender, SendError};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: Arc<ConversationEngine>,
    pub sender: Arc<dyn MessageSender>,
    transport_noop: bool,
}

impl Application {
    pub fn is_noop_transport(&self) -> bool {
        self.transport_noop
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("geocoding client initialization failed: {0}")]
    Geocoder(#[source] ResolveError),
    #[error("routing client initialization failed: {0}")]
    Router(#[source] RouteError),
    #[error("whatsapp client initialization failed: {0}")]
    Transport(#[source] SendError),
}

/// Router used when no ORS key is configured: every confirm degrades to
/// pending-manual pricing instead of blocking the conversation.
pub struct UnconfiguredRouter;

#[async_trait]
impl RouteProvider for UnconfiguredRouter {
    async fn route(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
    ) -> Result<RouteSummary, RouteError> {
        Err(RouteError::Provider("routing provider not configured".to_string()))
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let resolver = match &config.geocoding.mapbox_token {
        Some(token) => {
            let geocoder = MapboxGeocoder::new(
                token.clone(),
                Duration::from_secs(config.geocoding.timeout_secs),
            )
            .map_err(BootstrapError::Geocoder)?;
            GeoResolver::new(Arc::new(geocoder))
        }
        None => GeoResolver::new(Arc::new(NullGeocoder)),
    };

    let router: Arc<dyn RouteProvider> = match &config.routing.ors_api_key {
        Some(key) => Arc::new(
            OpenRouteServiceRouter::new(
                key.clone(),
                Duration::from_secs(config.routing.timeout_secs),
            )
            .map_err(BootstrapError::Router)?,
        ),
        None => Arc::new(UnconfiguredRouter),
    };

    let engine = Arc::new(ConversationEngine::new(
        Arc::new(resolver),
        router,
        Arc::new(SqlQuoteLedger::new(db_pool.clone())),
        Arc::new(LogNotifier),
        Arc::new(InMemorySessionStore::default()),
    ));

    let (sender, transport_noop): (Arc<dyn MessageSender>, bool) =
        match (&config.whatsapp.access_token, &config.whatsapp.phone_number_id) {
            (Some(token), Some(phone_number_id)) => (
                Arc::new(
                    CloudApiSender::new(token.clone(), phone_number_id.clone())
                        .map_err(BootstrapError::Transport)?,
                ),
                false,
            ),
            _ => (Arc::new(NoopSender::default()), true),
        };

    Ok(Application { config, db_pool, engine, sender, transport_noop })
}
