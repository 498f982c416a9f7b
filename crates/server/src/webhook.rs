use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kronos_core::domain::event::{CHANNEL_ID, USER_ID};
use kronos_core::{
    ApiResponse, EpochSeconds, FormFields, IngestError, RequestHeaders, ValidationError,
    REQUEST_TIMESTAMP_HEADER,
};
use kronos_slack::{
    InteractionPayload, SignatureError, SignatureVerifier, SlashCommand, SIGNATURE_HEADER,
};

use crate::ingest::{EventIngestor, EventSource, IngestOutcome};

pub const INVALID_SIGNATURE_MESSAGE: &str = "invalid request signature";
pub const INVALID_FORM_MESSAGE: &str = "invalid form body";
pub const INVALID_PAYLOAD_MESSAGE: &str = "invalid interaction payload";

type HandlerResponse = (StatusCode, Json<ApiResponse>);

#[derive(Clone)]
pub struct WebhookState {
    ingestor: Arc<EventIngestor>,
    verifier: Option<SignatureVerifier>,
}

impl WebhookState {
    pub fn new(ingestor: Arc<EventIngestor>, verifier: Option<SignatureVerifier>) -> Self {
        Self { ingestor, verifier }
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/interactions", post(interactions))
        .route("/commands", post(commands))
        .route("/services", post(services))
        .with_state(state)
}

/// Undecodable bytes become U+FFFD so a garbled timestamp still reads as
/// present (and then fails to parse).
fn request_headers(headers: &HeaderMap) -> RequestHeaders {
    headers
        .iter()
        .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect()
}

fn parse_form(body: &Bytes) -> Result<FormFields, HandlerResponse> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .map(|pairs| pairs.into_iter().collect())
        .map_err(|error| {
            warn!(event_name = "webhook.form.invalid", error = %error, "form body rejected");
            (StatusCode::BAD_REQUEST, Json(ApiResponse::failed(INVALID_FORM_MESSAGE)))
        })
}

/// How a route treats a request whose timestamp header is missing or does not
/// parse, when a signing secret is configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UnreadableTimestamp {
    /// The route validates before it has any side effect, so validation
    /// reports the 400.
    Validate,
    /// The route never validates; the request is unauthenticated.
    Reject,
}

/// Signature checks only run when a signing secret is configured.
fn check_signature(
    state: &WebhookState,
    headers: &RequestHeaders,
    body: &Bytes,
    correlation_id: &str,
    unreadable: UnreadableTimestamp,
) -> Result<(), HandlerResponse> {
    let Some(verifier) = &state.verifier else {
        return Ok(());
    };

    let timestamp = headers.get(REQUEST_TIMESTAMP_HEADER);
    let readable = timestamp.is_some_and(|value| EpochSeconds::parse(value).is_ok());
    if !readable && unreadable == UnreadableTimestamp::Validate {
        return Ok(());
    }

    timestamp
        .ok_or(SignatureError::MissingTimestamp)
        .and_then(|timestamp| {
            verifier.verify(timestamp, body, headers.get(SIGNATURE_HEADER), Utc::now().timestamp())
        })
        .map_err(|error| {
            warn!(
                event_name = "webhook.signature.rejected",
                correlation_id,
                error = %error,
                "request signature rejected"
            );
            (StatusCode::UNAUTHORIZED, Json(ApiResponse::failed(INVALID_SIGNATURE_MESSAGE)))
        })
}

fn error_response(error: &IngestError) -> HandlerResponse {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiResponse::from(error)))
}

fn outcome_response(result: Result<IngestOutcome, IngestError>) -> HandlerResponse {
    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ApiResponse::success(format!("timestamp recorded: {}", outcome.timestamp.as_str()))),
        ),
        Err(error) => error_response(&error),
    }
}

pub async fn interactions(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResponse {
    let correlation_id = Uuid::new_v4().to_string();
    let headers = request_headers(&headers);
    if let Err(response) =
        check_signature(&state, &headers, &body, &correlation_id, UnreadableTimestamp::Validate)
    {
        return response;
    }
    let form = match parse_form(&body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let payload = match InteractionPayload::from_form(&form) {
        Ok(payload) => payload,
        Err(error) => {
            warn!(
                event_name = "webhook.interaction.invalid",
                correlation_id = %correlation_id,
                error = %error,
                "interaction payload rejected"
            );
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::failed(INVALID_PAYLOAD_MESSAGE)));
        }
    };

    if !payload.is_submission() {
        debug!(
            event_name = "webhook.interaction.ignored",
            correlation_id = %correlation_id,
            action_id = payload.action_id().unwrap_or(""),
            "interaction is not a submission"
        );
        return (StatusCode::OK, Json(ApiResponse::success("interaction ignored")));
    }

    let fields = payload.to_form_fields(&state.ingestor.settings().select_block_id);
    let result =
        state.ingestor.ingest(EventSource::Interaction, &headers, fields, &correlation_id).await;
    outcome_response(result)
}

pub async fn commands(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResponse {
    let correlation_id = Uuid::new_v4().to_string();
    let headers = request_headers(&headers);
    if let Err(response) =
        check_signature(&state, &headers, &body, &correlation_id, UnreadableTimestamp::Validate)
    {
        return response;
    }
    let command = match parse_form(&body) {
        Ok(form) => SlashCommand::from_form(form),
        Err(response) => return response,
    };

    let result = state
        .ingestor
        .ingest(EventSource::SlashCommand, &headers, command.into_form_fields(), &correlation_id)
        .await;
    outcome_response(result)
}

pub async fn services(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResponse {
    let correlation_id = Uuid::new_v4().to_string();
    let headers = request_headers(&headers);
    if let Err(response) =
        check_signature(&state, &headers, &body, &correlation_id, UnreadableTimestamp::Reject)
    {
        return response;
    }
    let command = match parse_form(&body) {
        Ok(form) => SlashCommand::from_form(form),
        Err(response) => return response,
    };

    let user = command.user_id().filter(|value| !value.is_empty());
    let channel = command.channel_id().filter(|value| !value.is_empty());
    let (user, channel) = match (user, channel) {
        (Some(user), Some(channel)) => (user, channel),
        (None, _) => {
            return error_response(&IngestError::from(ValidationError::MissingField(
                USER_ID.to_owned(),
            )))
        }
        (_, None) => {
            return error_response(&IngestError::from(ValidationError::MissingField(
                CHANNEL_ID.to_owned(),
            )))
        }
    };

    match state.ingestor.post_welcome_menu(user, channel, &correlation_id).await {
        Ok(()) => {
            info!(
                event_name = "webhook.services.ok",
                correlation_id = %correlation_id,
                "services request handled"
            );
            (StatusCode::OK, Json(ApiResponse::success("menu sent")))
        }
        Err(error) => error_response(&error),
    }
}
