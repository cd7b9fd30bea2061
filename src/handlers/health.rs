use crate::endpoint::Endpoint;
use crate::models::{HealthResponse, UnhealthyResponse};
use crate::routes;
use axum::{extract::State, http::StatusCode, Json};

/// GET /health handler - Health check endpoint
///
/// Lists the endpoint's namespace to verify the object store is reachable.
/// Returns 200 OK if it is, 503 Service Unavailable otherwise.
#[utoipa::path(
    get,
    path = routes::HEALTH,
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = UnhealthyResponse)
    ),
    tag = "health"
)]
pub async fn health_handler(
    State(endpoint): State<Endpoint>,
) -> Result<(StatusCode, Json<HealthResponse>), (StatusCode, Json<UnhealthyResponse>)> {
    match endpoint.store().list(&endpoint.namespace()).await {
        Ok(_) => {
            tracing::debug!(parent: endpoint.span(), "Health check passed");
            Ok((
                StatusCode::OK,
                Json(HealthResponse {
                    status: "healthy".to_string(),
                }),
            ))
        }
        Err(e) => {
            tracing::error!(parent: endpoint.span(), "Health check failed: {:#}", e);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(UnhealthyResponse {
                    status: "unhealthy".to_string(),
                    error: format!("Cannot reach object store: {:#}", e),
                }),
            ))
        }
    }
}
