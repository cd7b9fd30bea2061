use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::routes;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};

/// DELETE /{id} handler - Remove a stored object
#[utoipa::path(
    delete,
    path = routes::OBJECT_ITEM,
    params(
        ("id" = String, Path, description = "Object id")
    ),
    responses(
        (status = 200, description = "Object deleted"),
        (status = 404, description = "Object not found", body = String),
        (status = 500, description = "Storage error", body = String)
    ),
    tag = "objects"
)]
pub async fn delete_handler(
    State(endpoint): State<Endpoint>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_object(&endpoint, id)
        .await
        .inspect_err(|err| endpoint.log_failure(err))
}

async fn delete_object(endpoint: &Endpoint, id: String) -> Result<StatusCode, ApiError> {
    tracing::debug!(parent: endpoint.span(), "DELETE request for object {}", id);

    let key = endpoint.object_key(&id);
    if !endpoint.store().has(&key).await {
        tracing::info!(parent: endpoint.span(), "Object not found with id: {}", id);
        return Err(ApiError::ObjectNotFound(id));
    }

    endpoint.store().delete(&key).await?;

    tracing::info!(parent: endpoint.span(), "Deleted object {}", id);
    Ok(StatusCode::OK)
}
