//! Challenge page and widget callback handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    response::Html,
};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::challenge::ChallengeOutcome;
use crate::domain::{ApiResponse, ErrorCallback, VerifiedCallback};
use crate::error::BridgeError;
use crate::service::token::VerificationToken;

const PAGE_TEMPLATE: &str = include_str!("../../../static/challenge.html");

fn parse_session(raw: &str) -> Result<Uuid, BridgeError> {
    Uuid::parse_str(raw).map_err(|_| BridgeError::BadRequest(format!("invalid session id: {raw}")))
}

/// Keep only characters that can appear in a site key.
fn sanitize_site_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

/// Render the widget page for a pending session.
pub async fn page(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Html<String>, BridgeError> {
    let session = parse_session(&session)?;
    if !state.bridge.is_pending(&session) {
        return Err(BridgeError::SessionNotFound(session.to_string()));
    }

    let html = PAGE_TEMPLATE
        .replace("{{SESSION}}", &session.to_string())
        .replace("{{SITE_KEY}}", &sanitize_site_key(state.bridge.site_key()));
    Ok(Html(html))
}

/// `onVerified(token)`.
pub async fn verified(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(body): Json<VerifiedCallback>,
) -> Result<Json<ApiResponse<()>>, BridgeError> {
    let session = parse_session(&session)?;
    let token = body.token.trim();
    if token.is_empty() {
        return Err(BridgeError::MissingParam("token"));
    }

    state
        .bridge
        .resolve(&session, ChallengeOutcome::Verified(VerificationToken::new(token)))?;
    Ok(Json(ApiResponse::ok()))
}

/// `onError(message)`. The body is optional.
pub async fn error(
    State(state): State<AppState>,
    Path(session): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<()>>, BridgeError> {
    let session = parse_session(&session)?;
    let callback: ErrorCallback = serde_json::from_slice(&body).unwrap_or_default();
    let message = callback
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "unknown widget error".to_string());

    state
        .bridge
        .resolve(&session, ChallengeOutcome::Error(message))?;
    Ok(Json(ApiResponse::ok()))
}

/// `onExpire()`.
pub async fn expired(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<ApiResponse<()>>, BridgeError> {
    let session = parse_session(&session)?;
    state.bridge.resolve(&session, ChallengeOutcome::Expired)?;
    Ok(Json(ApiResponse::ok()))
}

/// The user closed the page without completing the challenge.
pub async fn cancel(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<ApiResponse<()>>, BridgeError> {
    let session = parse_session(&session)?;
    state.bridge.resolve(&session, ChallengeOutcome::Cancelled)?;
    Ok(Json(ApiResponse::ok()))
}
