//! HTTP create/read/update/delete interface over an opaque object store.
//!
//! [`Endpoint`] serves one namespace of an [`ObjectStore`]; [`app`] wires an
//! endpoint, the health check and the API docs into a complete service.

pub mod api_doc;
pub mod body;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::config::Config;
use crate::handlers::health_handler;

pub use crate::endpoint::Endpoint;
pub use crate::error::ApiError;
pub use crate::store::ObjectStore;

/// Build the full service router
///
/// Object routes are mounted under `config.mount_path`; the health check and
/// the Swagger UI live at fixed paths next to them.
pub fn app(config: &Config, store: Arc<dyn ObjectStore>) -> Router {
    let endpoint = Endpoint::new(config.object_prefix.clone(), store);
    let objects = endpoint.clone().router();

    let app = Router::new()
        .route(routes::HEALTH, get(health_handler))
        .with_state(endpoint);

    // axum does not nest at the root
    let app = if config.mount_path == "/" {
        app.merge(objects)
    } else {
        app.nest(&config.mount_path, objects)
    };

    app.merge(SwaggerUi::new(routes::SWAGGER_UI).url(routes::OPENAPI_JSON, ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
