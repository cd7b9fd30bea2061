use crate::body::{write_object, RequestBody};
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::routes;
use axum::{
    body::Body,
    extract::{Path, State},
    http::StatusCode,
};

/// PUT /{id} handler - Store an object under a caller-chosen id
///
/// Any previous object with the same id is replaced.
#[utoipa::path(
    put,
    path = routes::OBJECT_ITEM,
    params(
        ("id" = String, Path, description = "Object id")
    ),
    request_body(content = String, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Object stored, body echoes the id", body = String),
        (status = 400, description = "No request body supplied", body = String),
        (status = 500, description = "Storage error", body = String)
    ),
    tag = "objects"
)]
pub async fn put_handler(
    State(endpoint): State<Endpoint>,
    Path(id): Path<String>,
    RequestBody(body): RequestBody,
) -> Result<(StatusCode, String), ApiError> {
    put_object(&endpoint, id, body)
        .await
        .inspect_err(|err| endpoint.log_failure(err))
}

async fn put_object(endpoint: &Endpoint, id: String, body: Body) -> Result<(StatusCode, String), ApiError> {
    tracing::debug!(parent: endpoint.span(), "PUT request for object {}", id);

    let key = endpoint.object_key(&id);
    let written = write_object(endpoint.store(), &key, body).await?;

    tracing::info!(parent: endpoint.span(), "Successfully stored object {} ({} bytes)", id, written);
    Ok((StatusCode::OK, id))
}
