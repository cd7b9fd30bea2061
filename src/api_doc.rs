use utoipa::OpenApi;

use crate::handlers;
use crate::models::{HealthResponse, UnhealthyResponse};

/// OpenAPI documentation
///
/// Object paths are relative to the configured mount path.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "crud-store API",
        version = "1.0.0",
        description = "Generic create/read/update/delete interface over an opaque object store"
    ),
    paths(
        handlers::health::health_handler,
        handlers::create::create_handler,
        handlers::list::list_handler,
        handlers::get::get_handler,
        handlers::put::put_handler,
        handlers::patch::patch_handler,
        handlers::delete::delete_handler
    ),
    components(
        schemas(
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "objects", description = "Object store operations")
    )
)]
pub struct ApiDoc;
