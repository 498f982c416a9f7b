//! Outbound Slack Web API calls.
//!
//! The ingest pipeline only needs two calls: `chat.postMessage` for the
//! channel acknowledgement and `chat.postEphemeral` for the welcome menu.
//! Both sit behind [`SlackMessenger`] so handlers can run without a network.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use kronos_core::config::SlackConfig;

use crate::blocks::{Block, MessageTemplate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlackApiError {
    #[error("slack client could not be built: {0}")]
    Client(String),
    #[error("slack request failed: {0}")]
    Request(String),
    #[error("slack response could not be decoded: {0}")]
    Response(String),
    #[error("slack api returned error `{0}`")]
    Api(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: Option<String>,
    pub ts: Option<String>,
}

#[async_trait]
pub trait SlackMessenger: Send + Sync {
    async fn post_message(
        &self,
        channel: &str,
        template: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError>;

    async fn post_ephemeral(
        &self,
        user: &str,
        channel: &str,
        template: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError>;

    /// Transport label for startup logs and health output.
    fn transport(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    channel: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
    text: &'a str,
    blocks: &'a [Block],
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    message_ts: Option<String>,
}

impl ChatResponse {
    fn into_result(self) -> Result<PostedMessage, SlackApiError> {
        if !self.ok {
            return Err(SlackApiError::Api(self.error.unwrap_or_else(|| "unknown_error".to_owned())));
        }
        Ok(PostedMessage { channel: self.channel, ts: self.ts.or(self.message_ts) })
    }
}

#[derive(Clone)]
pub struct SlackWebClient {
    client: Client,
    bot_token: SecretString,
    api_base_url: String,
}

impl std::fmt::Debug for SlackWebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebClient")
            .field("bot_token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl SlackWebClient {
    pub fn new(
        bot_token: SecretString,
        api_base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SlackApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| SlackApiError::Client(error.to_string()))?;
        let api_base_url = api_base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, bot_token, api_base_url })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, SlackApiError> {
        Self::new(
            config.bot_token.clone(),
            config.api_base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base_url)
    }

    async fn call(
        &self,
        method: &str,
        request: &ChatRequest<'_>,
    ) -> Result<PostedMessage, SlackApiError> {
        let response = self
            .client
            .post(self.method_url(method))
            .bearer_auth(self.bot_token.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|error| SlackApiError::Request(error.to_string()))?;

        let status = response.status();
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|error| SlackApiError::Response(format!("{status}: {error}")))?;

        match body.into_result() {
            Ok(posted) => {
                debug!(
                    event_name = "slack.api.ok",
                    method,
                    channel = request.channel,
                    ts = ?posted.ts,
                    "slack api call succeeded"
                );
                Ok(posted)
            }
            Err(error) => {
                warn!(
                    event_name = "slack.api.error",
                    method,
                    channel = request.channel,
                    error = %error,
                    "slack api call rejected"
                );
                Err(error)
            }
        }
    }
}

#[async_trait]
impl SlackMessenger for SlackWebClient {
    async fn post_message(
        &self,
        channel: &str,
        template: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError> {
        let request = ChatRequest {
            channel,
            user: None,
            text: &template.fallback_text,
            blocks: &template.blocks,
        };
        self.call("chat.postMessage", &request).await
    }

    async fn post_ephemeral(
        &self,
        user: &str,
        channel: &str,
        template: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError> {
        let request = ChatRequest {
            channel,
            user: Some(user),
            text: &template.fallback_text,
            blocks: &template.blocks,
        };
        self.call("chat.postEphemeral", &request).await
    }

    fn transport(&self) -> &'static str {
        "web_api"
    }
}

/// Messenger used when no bot token is configured. Calls succeed without
/// leaving the process.
#[derive(Clone, Debug, Default)]
pub struct NoopMessenger;

#[async_trait]
impl SlackMessenger for NoopMessenger {
    async fn post_message(
        &self,
        channel: &str,
        _template: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError> {
        debug!(event_name = "slack.noop.post_message", channel, "skipping slack post");
        Ok(PostedMessage { channel: Some(channel.to_owned()), ts: None })
    }

    async fn post_ephemeral(
        &self,
        user: &str,
        channel: &str,
        _template: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError> {
        debug!(event_name = "slack.noop.post_ephemeral", user, channel, "skipping slack post");
        Ok(PostedMessage { channel: Some(channel.to_owned()), ts: None })
    }

    fn transport(&self) -> &'static str {
        "noop"
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SentMessage {
    Channel { channel: String, template: MessageTemplate },
    Ephemeral { user: String, channel: String, template: MessageTemplate },
}

/// In-process messenger that keeps every call, optionally failing them.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    failure: Option<SlackApiError>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: SlackApiError) -> Self {
        Self { sent: Mutex::new(Vec::new()), failure: Some(error) }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    fn record(&self, message: SentMessage) -> Result<PostedMessage, SlackApiError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let channel = match &message {
            SentMessage::Channel { channel, .. } | SentMessage::Ephemeral { channel, .. } => {
                channel.clone()
            }
        };
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(PostedMessage { channel: Some(channel), ts: None })
    }
}

#[async_trait]
impl SlackMessenger for RecordingMessenger {
    async fn post_message(
        &self,
        channel: &str,
        template: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError> {
        self.record(SentMessage::Channel { channel: channel.to_owned(), template: template.clone() })
    }

    async fn post_ephemeral(
        &self,
        user: &str,
        channel: &str,
        template: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError> {
        self.record(SentMessage::Ephemeral {
            user: user.to_owned(),
            channel: channel.to_owned(),
            template: template.clone(),
        })
    }

    fn transport(&self) -> &'static str {
        "recording"
    }
}
