use crate::body::{write_object, RequestBody};
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::routes;
use axum::{body::Body, extract::State, http::StatusCode};
use uuid::Uuid;

/// POST / handler - Store a new object under a generated id
///
/// The body is stored verbatim; the response body is the new id as plain text.
#[utoipa::path(
    post,
    path = routes::OBJECTS,
    request_body(content = String, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Object stored, body is the generated id", body = String),
        (status = 400, description = "No request body supplied", body = String),
        (status = 500, description = "Storage error", body = String)
    ),
    tag = "objects"
)]
pub async fn create_handler(
    State(endpoint): State<Endpoint>,
    RequestBody(body): RequestBody,
) -> Result<(StatusCode, String), ApiError> {
    create_object(&endpoint, body)
        .await
        .inspect_err(|err| endpoint.log_failure(err))
}

async fn create_object(endpoint: &Endpoint, body: Body) -> Result<(StatusCode, String), ApiError> {
    let id = Uuid::new_v4().to_string();
    tracing::debug!(parent: endpoint.span(), "POST request for new object {}", id);

    let key = endpoint.object_key(&id);
    let written = write_object(endpoint.store(), &key, body).await?;

    tracing::info!(parent: endpoint.span(), "Created object {} ({} bytes)", id, written);
    Ok((StatusCode::CREATED, id))
}
