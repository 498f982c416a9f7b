use thiserror::Error;

/// Caller errors. Each maps to HTTP 400 and is never retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing timestamp header")]
    MissingHeader,
    #[error("field missing: {0}")]
    MissingField(String),
    #[error("invalid timestamp value")]
    InvalidTimestamp,
    /// An input field uses a key the stored record reserves for itself.
    #[error("reserved field: {0}")]
    ReservedField(String),
}

impl ValidationError {
    /// Fixed reason string, without the field name.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing timestamp header",
            Self::MissingField(_) => "field missing",
            Self::InvalidTimestamp => "invalid timestamp value",
            Self::ReservedField(_) => "reserved field",
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField(name) | Self::ReservedField(name) => Some(name),
            Self::MissingHeader | Self::InvalidTimestamp => None,
        }
    }
}

/// Everything that can stop an event from being recorded and acknowledged.
///
/// The `String` payloads of the downstream variants hold internal detail for
/// logs only; [`IngestError::user_message`] is what goes back to Slack.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("messaging failure: {0}")]
    Messaging(String),
}

impl IngestError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Persistence(_) | Self::Messaging(_) => 500,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(error) => error.to_string(),
            Self::Persistence(_) => {
                "Failed to save timestamp to database! Please contact Client Solutions".to_owned()
            }
            Self::Messaging(_) => "Failed to call Slack API".to_owned(),
        }
    }
}
