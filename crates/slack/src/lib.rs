//! Slack integration for Kronos.
//!
//! - `blocks` - Block Kit builders for the welcome menu and acknowledgements
//! - `interactions` - flattening of `block_actions` payloads into form fields
//! - `commands` - slash-command form and action text parsing
//! - `signature` - `v0` request signature verification
//! - `client` - Web API messenger (`chat.postMessage`, `chat.postEphemeral`)

pub mod blocks;
pub mod client;
pub mod commands;
pub mod interactions;
pub mod signature;

pub use blocks::{acknowledgement_message, welcome_menu, MessageTemplate};
pub use client::{
    NoopMessenger, PostedMessage, RecordingMessenger, SentMessage, SlackApiError, SlackMessenger,
    SlackWebClient,
};
pub use commands::{parse_action_text, ActionSelection, SlashCommand};
pub use interactions::{InteractionParseError, InteractionPayload};
pub use signature::{SignatureError, SignatureVerifier, SIGNATURE_HEADER};
