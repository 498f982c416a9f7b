//! Block-action interaction payloads (`POST /interactions`).
//!
//! Slack wraps the interaction JSON in a `payload` form field. Kronos only
//! records submissions of the welcome menu's Go button; the selected action is
//! read from the static select inside the configured block.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use kronos_core::domain::event::{
    API_APP_ID, CHANNEL_ID, CHANNEL_NAME, COMMAND, IS_ENTERPRISE_INSTALL, RESPONSE_URL,
    TEAM_DOMAIN, TEAM_ID, TEXT, TOKEN, TRIGGER_ID, USER_ID, USER_NAME,
};
use kronos_core::FormFields;

use crate::blocks::{SELECT_ACTION_ID, SUBMIT_ACTION_ID};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InteractionParseError {
    #[error("interaction form is missing the `payload` field")]
    MissingPayload,
    #[error("interaction payload is not valid JSON: {0}")]
    InvalidJson(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InteractionPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub team: Option<InteractionTeam>,
    #[serde(default)]
    pub channel: Option<InteractionChannel>,
    #[serde(default)]
    pub user: Option<InteractionUser>,
    #[serde(default)]
    pub api_app_id: Option<String>,
    #[serde(default)]
    pub is_enterprise_install: Option<bool>,
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub actions: Vec<InteractionAction>,
    #[serde(default)]
    pub state: Option<InteractionState>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InteractionTeam {
    pub id: Option<String>,
    pub domain: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InteractionChannel {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InteractionUser {
    pub id: Option<String>,
    pub username: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InteractionAction {
    pub action_id: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InteractionState {
    #[serde(default)]
    pub values: Value,
}

impl InteractionPayload {
    pub fn from_form(form: &FormFields) -> Result<Self, InteractionParseError> {
        let raw = form.get("payload").ok_or(InteractionParseError::MissingPayload)?;
        serde_json::from_str(raw)
            .map_err(|error| InteractionParseError::InvalidJson(error.to_string()))
    }

    pub fn action_id(&self) -> Option<&str> {
        self.actions.first().map(|action| action.action_id.as_str())
    }

    pub fn is_submission(&self) -> bool {
        self.action_id() == Some(SUBMIT_ACTION_ID)
    }

    pub fn selected_action(&self, select_block_id: &str) -> Option<&str> {
        self.state
            .as_ref()?
            .values
            .get(select_block_id)?
            .get(SELECT_ACTION_ID)?
            .get("selected_option")?
            .get("value")?
            .as_str()
    }

    /// Flattens into the Slack form field layout. Values missing from the
    /// payload are left out so validation reports them; `text` is always
    /// empty because the menu has no free-text input.
    pub fn to_form_fields(&self, select_block_id: &str) -> FormFields {
        let team = self.team.as_ref();
        let channel = self.channel.as_ref();
        let user = self.user.as_ref();

        let entries: [(&str, Option<String>); 13] = [
            (TOKEN, self.token.clone()),
            (TEAM_ID, team.and_then(|team| team.id.clone())),
            (TEAM_DOMAIN, team.and_then(|team| team.domain.clone())),
            (CHANNEL_ID, channel.and_then(|channel| channel.id.clone())),
            (CHANNEL_NAME, channel.and_then(|channel| channel.name.clone())),
            (USER_ID, user.and_then(|user| user.id.clone())),
            (USER_NAME, user.and_then(|user| user.username.clone())),
            (COMMAND, self.selected_action(select_block_id).map(str::to_owned)),
            (TEXT, Some(String::new())),
            (API_APP_ID, self.api_app_id.clone()),
            (IS_ENTERPRISE_INSTALL, self.is_enterprise_install.map(|flag| flag.to_string())),
            (RESPONSE_URL, self.response_url.clone()),
            (TRIGGER_ID, self.trigger_id.clone()),
        ];

        entries
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key.to_owned(), value)))
            .collect()
    }
}
