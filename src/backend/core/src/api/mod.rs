//! HTTP surface over the portal service.
//!
//! Routes live under `/api/v1` and require a bearer token, resolved to an
//! actor through the [`SessionResolver`] port; `/health` is open. All
//! handlers return `Result<impl IntoResponse, MeridianError>` so errors
//! render through the `IntoResponse` implementation on `MeridianError`.

mod handlers;

pub use handlers::Actor;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::identity::SessionResolver;
use crate::portal::PortalService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub portal: PortalService,
    pub sessions: Arc<dyn SessionResolver>,
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let v1 = Router::new()
        .route("/applications", post(handlers::submit_application))
        .route(
            "/applications/:category/:id",
            get(handlers::view_application),
        )
        .route(
            "/applications/:category/:id/status",
            put(handlers::update_application_status),
        )
        .route("/clients", get(handlers::view_client_roster))
        .route("/clients/:id", get(handlers::view_client_detail))
        .route("/clients/:id", delete(handlers::permanently_delete_client))
        .route(
            "/clients/:id/disassociate",
            post(handlers::disassociate_client),
        )
        .route("/clients/:id/reassign", post(handlers::reassign_client));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", v1)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// API response wrapper.
#[derive(serde::Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    pub fn error_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_code: Some(code.into()),
        }
    }
}
