use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::Span;

use crate::error::ApiError;
use crate::handlers::{
    create_handler, delete_handler, get_handler, list_handler, patch_handler, put_handler,
};
use crate::routes;
use crate::store::ObjectStore;

/// Separator between an endpoint's namespace and an object id in storage keys
pub const KEY_SEPARATOR: &str = "::";

/// CRUD endpoint over one namespace of an [`ObjectStore`]
///
/// Every key it reads or writes has the form `<prefix>::<id>`, so several
/// endpoints can share one store without seeing each other's objects. The
/// endpoint is immutable and cheap to clone; it doubles as the axum state
/// for its handlers.
#[derive(Clone)]
pub struct Endpoint {
    prefix: Arc<str>,
    store: Arc<dyn ObjectStore>,
    span: Span,
}

impl Endpoint {
    pub fn new(prefix: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        let prefix: String = prefix.into();
        let span = tracing::info_span!("endpoint", prefix = %prefix);
        Self {
            prefix: prefix.into(),
            store,
            span,
        }
    }

    /// Replace the span that request logs are recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Record a failed request under this endpoint's span
    pub fn log_failure(&self, err: &ApiError) {
        if err.status().is_server_error() {
            tracing::error!(parent: &self.span, "Request failed: {}", err);
        } else {
            tracing::debug!(parent: &self.span, "Request rejected: {}", err);
        }
    }

    /// Storage key prefix shared by all objects of this endpoint
    pub fn namespace(&self) -> String {
        format!("{}{}", self.prefix, KEY_SEPARATOR)
    }

    /// Storage key for object `id`
    pub fn object_key(&self, id: &str) -> String {
        format!("{}{}{}", self.prefix, KEY_SEPARATOR, id)
    }

    /// Inverse of [`object_key`](Self::object_key); `None` for foreign keys
    pub fn strip_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(&*self.prefix)?.strip_prefix(KEY_SEPARATOR)
    }

    /// Router serving the six object routes relative to its mount point
    ///
    /// Unknown paths and unsupported methods on known paths both answer 404.
    pub fn router(self) -> Router {
        Router::new()
            .route(
                routes::OBJECTS,
                post(create_handler).get(list_handler).fallback(not_found),
            )
            .route(
                routes::OBJECT_ITEM,
                get(get_handler)
                    .put(put_handler)
                    .patch(patch_handler)
                    .delete(delete_handler)
                    .fallback(not_found),
            )
            .with_state(self)
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
