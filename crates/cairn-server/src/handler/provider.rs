use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::error::AppError;
use crate::handler::dto::PinProviderRequest;
use crate::AppState;

pub struct ProviderApiModule;

impl ProviderApiModule {
    pub fn register() -> OpenApiRouter<crate::AppState> {
        OpenApiRouter::new().routes(routes!(pin_provider_handler))
    }
}

#[utoipa::path(
    post,
    path = "/pin",
    tag = "Providers",
    request_body = PinProviderRequest,
    responses(
        (status = 200, description = "Provider pinned; selection cache refreshed"),
        (status = 404, description = "Network or provider unknown"),
        (status = 422, description = "Unknown operation or unsupported pairing")
    )
)]
pub async fn pin_provider_handler(
    State(state): State<AppState>,
    Json(request): Json<PinProviderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let operation: cairn_types::Operation = request
        .operation
        .parse()
        .map_err(|_| AppError::ValidationError(format!("unknown operation: {}", request.operation)))?;

    state
        .selector
        .pin_default_provider(&request.network, operation, &request.provider, request.url_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}
