use crate::body::object_body;
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::routes;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// GET /{id} handler - Stream a stored object back verbatim
#[utoipa::path(
    get,
    path = routes::OBJECT_ITEM,
    params(
        ("id" = String, Path, description = "Object id")
    ),
    responses(
        (status = 200, description = "Stored bytes", body = String, content_type = "application/octet-stream"),
        (status = 404, description = "Object not found", body = String),
        (status = 500, description = "Storage error", body = String)
    ),
    tag = "objects"
)]
pub async fn get_handler(
    State(endpoint): State<Endpoint>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    get_object(&endpoint, id)
        .await
        .inspect_err(|err| endpoint.log_failure(err))
}

async fn get_object(endpoint: &Endpoint, id: String) -> Result<Response, ApiError> {
    tracing::debug!(parent: endpoint.span(), "GET request for object {}", id);

    let key = endpoint.object_key(&id);
    if !endpoint.store().has(&key).await {
        tracing::info!(parent: endpoint.span(), "Object not found with id: {}", id);
        return Err(ApiError::ObjectNotFound(id));
    }

    let reader = endpoint.store().reader(&key).await?;

    tracing::info!(parent: endpoint.span(), "Streaming object {}", id);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        object_body(reader),
    )
        .into_response())
}
