use serde::{Deserialize, Serialize};

use crate::errors::IngestError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Body returned to Slack: `{"status": "success" | "failed", "msg": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: ResponseStatus,
    pub msg: String,
}

impl ApiResponse {
    pub fn build(is_success: bool, msg: impl Into<String>) -> Self {
        let status = if is_success { ResponseStatus::Success } else { ResponseStatus::Failed };
        Self { status, msg: msg.into() }
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self::build(true, msg)
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::build(false, msg)
    }
}

impl From<&IngestError> for ApiResponse {
    fn from(error: &IngestError) -> Self {
        Self::failed(error.user_message())
    }
}
