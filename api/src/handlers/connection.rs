use axum::{extract::State, Json};
use tracing::info;

use crate::{
    error::{ApiResult, ErrorEnvelope},
    models::{PlatformInfo, ValidateResponse},
    AppState,
};

/// Validate the connection and report platform identity
///
/// GET /validate
#[utoipa::path(
    get,
    path = "/validate",
    responses(
        (status = 200, description = "Connection validated", body = ValidateResponse),
        (status = 401, description = "Authentication failed", body = ErrorEnvelope)
    ),
    tag = "connection"
)]
pub async fn validate_connection(
    State(state): State<AppState>,
) -> ApiResult<Json<ValidateResponse>> {
    info!("Connection validation requested");

    Ok(Json(ValidateResponse {
        success: true,
        message: "Connection validated successfully".to_string(),
        platform_info: PlatformInfo {
            name: state.platform.name.clone(),
            version: state.platform.version.clone(),
            capabilities: state.platform.capabilities.clone(),
        },
    }))
}
