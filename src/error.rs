use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Custom error type for the object endpoint
///
/// Every variant maps to one HTTP status code. The response body is the
/// plain error message, never a JSON envelope.
#[derive(Debug)]
pub enum ApiError {
    /// POST or PUT without a request body
    MissingBody,
    /// No object stored under the requested id
    ObjectNotFound(String),
    /// Any failure reported by the object store
    Storage(anyhow::Error),
    /// The stored object is not a JSON object and cannot be patched
    CorruptObject(serde_json::Error),
    /// The PATCH body is not a JSON object
    InvalidPatch(serde_json::Error),
    /// The request body could not be buffered (read failure or size limit)
    UnreadableBody(axum::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingBody | ApiError::InvalidPatch(_) | ApiError::UnreadableBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::CorruptObject(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::MissingBody => write!(f, "no body supplied"),
            ApiError::ObjectNotFound(_) => write!(f, "object not found"),
            ApiError::Storage(err) => write!(f, "{:#}", err),
            ApiError::CorruptObject(err) | ApiError::InvalidPatch(err) => write!(f, "{}", err),
            ApiError::UnreadableBody(err) => write!(f, "Failed to read request body: {}", err),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Storage(err)
    }
}
