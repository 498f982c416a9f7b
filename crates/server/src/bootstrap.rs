use std::sync::Arc;

use axum::Router;
use kronos_core::config::{AppConfig, ConfigError, LoadOptions};
use kronos_db::{connect_with_config, migrations, DbPool, SqlTimestampLogRepository};
use kronos_slack::{
    NoopMessenger, SignatureVerifier, SlackApiError, SlackMessenger, SlackWebClient,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::health;
use crate::ingest::{EventIngestor, IngestSettings};
use crate::webhook::{self, WebhookState};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub messenger: Arc<dyn SlackMessenger>,
    pub ingestor: Arc<EventIngestor>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("slack client setup failed: {0}")]
    Slack(#[from] SlackApiError),
}

impl Application {
    /// Webhook routes plus `/health`.
    pub fn router(&self) -> Router {
        let verifier = self.config.slack.signing_secret.clone().map(SignatureVerifier::new);
        webhook::router(WebhookState::new(self.ingestor.clone(), verifier))
            .merge(health::router(self.db_pool.clone(), self.messenger.transport()))
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
        app_mode = ?config.app.mode,
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
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

    let messenger = build_messenger(&config)?;
    if config.app.mode.is_production() && messenger.transport() == "noop" {
        warn!(
            event_name = "system.bootstrap.noop_messenger",
            correlation_id = "bootstrap",
            "prod mode without a slack bot token; acknowledgements will not leave the process"
        );
    }

    let repository = Arc::new(SqlTimestampLogRepository::new(db_pool.clone()));
    let ingestor = Arc::new(EventIngestor::new(
        IngestSettings::from_config(&config),
        repository,
        messenger.clone(),
    ));

    Ok(Application { config, db_pool, messenger, ingestor })
}

fn build_messenger(config: &AppConfig) -> Result<Arc<dyn SlackMessenger>, BootstrapError> {
    if !config.has_bot_token() {
        return Ok(Arc::new(NoopMessenger));
    }
    Ok(Arc::new(SlackWebClient::from_config(&config.slack)?))
}
