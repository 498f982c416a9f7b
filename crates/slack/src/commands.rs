//! Slash-command form (`POST /commands`).
//!
//! Slack posts slash commands as a flat form using the same field names the
//! timestamp log stores, so the form is recorded as-is. The command text is
//! read as `<action-code> [note...]`.

use kronos_core::domain::event::{CHANNEL_ID, USER_ID};
use kronos_core::FormFields;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionSelection {
    pub code: String,
    pub note: String,
}

/// Splits command text into the action code (first word) and the note (the
/// rest, trimmed). Empty text yields an empty code, which maps to the
/// unknown-command message.
pub fn parse_action_text(text: &str) -> ActionSelection {
    let trimmed = text.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((code, note)) => {
            ActionSelection { code: code.to_ascii_lowercase(), note: note.trim().to_owned() }
        }
        None => ActionSelection { code: trimmed.to_ascii_lowercase(), note: String::new() },
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommand {
    fields: FormFields,
}

impl SlashCommand {
    pub fn from_form(fields: FormFields) -> Self {
        Self { fields }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.fields.get(USER_ID).map(String::as_str)
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.fields.get(CHANNEL_ID).map(String::as_str)
    }

    pub fn into_form_fields(self) -> FormFields {
        self.fields
    }
}
