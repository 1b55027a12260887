//! API request handlers.

use std::str::FromStr;

use axum::{
    body::Bytes,
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::{ApiResponse, AppState};
use crate::applications::{ApplicationId, ApplicationStatus, ServiceCategory};
use crate::error::{ErrorCode, MeridianError};
use crate::identity::{User, UserId};
use crate::portal::ApplicationDraft;

// ═══════════════════════════════════════════════════════════════════════════════
// Actor extraction
// ═══════════════════════════════════════════════════════════════════════════════

/// The authenticated caller, resolved from the bearer token.
pub struct Actor(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = MeridianError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| MeridianError::unauthorized("Missing Authorization header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| MeridianError::unauthorized("Expected a bearer token"))?;

        let user = state.sessions.resolve(token).await?.ok_or_else(|| {
            MeridianError::new(ErrorCode::InvalidToken, "Session token is not recognized")
        })?;
        Ok(Actor(user))
    }
}

fn parse_category(category: &str) -> Result<ServiceCategory, MeridianError> {
    ServiceCategory::from_str(category).map_err(MeridianError::validation)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Health
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Applications
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn submit_application(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(draft): Json<ApplicationDraft>,
) -> Result<impl IntoResponse, MeridianError> {
    if draft.application_type.trim().is_empty() {
        return Err(MeridianError::validation("application_type cannot be empty"));
    }

    let application = state.portal.submit_application(&actor, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(application)),
    ))
}

pub async fn view_application(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((category, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, MeridianError> {
    let category = parse_category(&category)?;
    let application = state
        .portal
        .view_application(&actor, category, &ApplicationId::new(id))
        .await?;
    Ok(Json(ApiResponse::success(application)))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn update_application_status(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((category, id)): Path<(String, String)>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, MeridianError> {
    let category = parse_category(&category)?;
    let status = ApplicationStatus::from_str(&req.status).map_err(MeridianError::validation)?;

    let change = state
        .portal
        .update_application_status(&actor, category, &ApplicationId::new(id), status, req.message)
        .await?;
    Ok(Json(ApiResponse::success(change)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Clients
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn view_client_roster(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<impl IntoResponse, MeridianError> {
    let roster = state.portal.view_client_roster(&actor).await?;
    Ok(Json(ApiResponse::success(roster)))
}

pub async fn view_client_detail(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MeridianError> {
    let detail = state
        .portal
        .view_client_detail(&actor, &UserId::new(id))
        .await?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn disassociate_client(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MeridianError> {
    let client = state
        .portal
        .disassociate_client(&actor, &UserId::new(id))
        .await?;
    Ok(Json(ApiResponse::success(client)))
}

#[derive(Deserialize)]
pub struct ReassignClientRequest {
    pub new_partner_id: UserId,
}

pub async fn reassign_client(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    Json(req): Json<ReassignClientRequest>,
) -> Result<impl IntoResponse, MeridianError> {
    let client = state
        .portal
        .reassign_client(&actor, &UserId::new(id), &req.new_partner_id)
        .await?;
    Ok(Json(ApiResponse::success(client)))
}

#[derive(Deserialize, Default)]
pub struct RemoveClientRequest {
    #[serde(default)]
    pub reassign_to: Option<UserId>,
}

/// Parse the optional cascade body. An empty body means "delete the
/// applications"; a non-empty body must parse, so a malformed request
/// carrying a reassignment target is rejected rather than read as no target.
fn parse_removal_body(body: &[u8]) -> Result<Option<UserId>, MeridianError> {
    if body.is_empty() {
        return Ok(None);
    }
    let req: RemoveClientRequest = serde_json::from_slice(body)
        .map_err(|err| MeridianError::validation(format!("Invalid request body: {err}")))?;
    Ok(req.reassign_to)
}

pub async fn permanently_delete_client(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, MeridianError> {
    let reassign_to = parse_removal_body(&body)?;
    let outcome = state
        .portal
        .permanently_delete_client(&actor, &UserId::new(id), reassign_to)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}
