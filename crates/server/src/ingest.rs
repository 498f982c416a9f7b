//! Record-and-acknowledge pipeline shared by `/interactions` and `/commands`.
//!
//! validate -> normalize -> insert one row -> (prod only) acknowledge in the
//! channel. A messaging failure is reported after the row is already stored;
//! the row is never rolled back.

use std::sync::Arc;

use tracing::{error, info, warn};

use kronos_core::config::{AppConfig, AppMode};
use kronos_core::domain::event::{CHANNEL_ID, COMMAND, TEXT, USER_ID};
use kronos_core::{
    describe_action, CanonicalTimestamp, FormFields, IngestError, RequestHeaders,
    TimestampNormalizer, Validator,
};
use kronos_db::TimestampLogRepository;
use kronos_slack::{acknowledgement_message, parse_action_text, welcome_menu, SlackMessenger};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSource {
    /// Go button on the welcome menu. The selected option is the action.
    Interaction,
    /// Slash command. `text` is `<action-code> [note]`.
    SlashCommand,
}

impl EventSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Interaction => "interaction",
            Self::SlashCommand => "slash_command",
        }
    }
}

#[derive(Clone, Debug)]
pub struct IngestSettings {
    pub validator: Validator,
    pub normalizer: TimestampNormalizer,
    pub select_block_id: String,
    pub mode: AppMode,
}

impl IngestSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            validator: Validator::default(),
            normalizer: config.normalizer(),
            select_block_id: config.slack.select_block_id.clone(),
            mode: config.app.mode,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestOutcome {
    pub row_id: i64,
    pub timestamp: CanonicalTimestamp,
    pub acknowledged: bool,
}

pub struct EventIngestor {
    settings: IngestSettings,
    repository: Arc<dyn TimestampLogRepository>,
    messenger: Arc<dyn SlackMessenger>,
}

impl EventIngestor {
    pub fn new(
        settings: IngestSettings,
        repository: Arc<dyn TimestampLogRepository>,
        messenger: Arc<dyn SlackMessenger>,
    ) -> Self {
        Self { settings, repository, messenger }
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    pub async fn ingest(
        &self,
        source: EventSource,
        headers: &RequestHeaders,
        fields: FormFields,
        correlation_id: &str,
    ) -> Result<IngestOutcome, IngestError> {
        let event = self.settings.validator.validate(headers, fields).map_err(|rejection| {
            warn!(
                event_name = "ingest.validation.rejected",
                correlation_id,
                source = source.as_str(),
                reason = rejection.reason(),
                field = rejection.field().unwrap_or(""),
                "request rejected"
            );
            IngestError::from(rejection)
        })?;

        let timestamp = self.settings.normalizer.normalize_epoch(event.epoch)?;
        let record = event.into_record(timestamp.clone());
        let user_id = record.field(USER_ID).unwrap_or_default().to_owned();
        let channel_id = record.field(CHANNEL_ID).unwrap_or_default().to_owned();

        let row_id = self.repository.insert(&record).await.map_err(|persist_error| {
            error!(
                event_name = "ingest.persistence.failed",
                correlation_id,
                user_id = %user_id,
                channel_id = %channel_id,
                error = %persist_error,
                "failed to store timestamp"
            );
            IngestError::Persistence(persist_error.to_string())
        })?;

        info!(
            event_name = "ingest.recorded",
            correlation_id,
            source = source.as_str(),
            row_id,
            user_id = %user_id,
            channel_id = %channel_id,
            timestamp = timestamp.as_str(),
            "timestamp recorded"
        );

        if !self.settings.mode.is_production() {
            return Ok(IngestOutcome { row_id, timestamp, acknowledged: false });
        }

        let (code, note) = match source {
            EventSource::Interaction => {
                (record.field(COMMAND).unwrap_or_default().to_owned(), String::new())
            }
            EventSource::SlashCommand => {
                let selection = parse_action_text(record.field(TEXT).unwrap_or_default());
                (selection.code, selection.note)
            }
        };
        let message = acknowledgement_message(&describe_action(&code, &user_id, &note));

        self.messenger.post_message(&channel_id, &message).await.map_err(|slack_error| {
            error!(
                event_name = "ingest.acknowledgement.failed",
                correlation_id,
                row_id,
                user_id = %user_id,
                channel_id = %channel_id,
                error = %slack_error,
                "timestamp stored but acknowledgement failed"
            );
            IngestError::Messaging(slack_error.to_string())
        })?;

        Ok(IngestOutcome { row_id, timestamp, acknowledged: true })
    }

    /// Shows the welcome menu to `user` in `channel`, visible only to them.
    pub async fn post_welcome_menu(
        &self,
        user: &str,
        channel: &str,
        correlation_id: &str,
    ) -> Result<(), IngestError> {
        let menu = welcome_menu(&self.settings.select_block_id);
        self.messenger.post_ephemeral(user, channel, &menu).await.map_err(|slack_error| {
            error!(
                event_name = "services.menu.failed",
                correlation_id,
                user_id = user,
                channel_id = channel,
                error = %slack_error,
                "failed to post welcome menu"
            );
            IngestError::Messaging(slack_error.to_string())
        })?;

        info!(
            event_name = "services.menu.posted",
            correlation_id,
            user_id = user,
            channel_id = channel,
            transport = self.messenger.transport(),
            "welcome menu posted"
        );
        Ok(())
    }
}
