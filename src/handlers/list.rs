use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::routes;
use axum::{extract::State, Json};

/// GET / handler - List the ids of all objects in this namespace
///
/// Ids are returned bare, without the storage namespace, in no particular
/// order.
#[utoipa::path(
    get,
    path = routes::OBJECTS,
    responses(
        (status = 200, description = "Ids of all stored objects", body = Vec<String>),
        (status = 500, description = "Storage error", body = String)
    ),
    tag = "objects"
)]
pub async fn list_handler(State(endpoint): State<Endpoint>) -> Result<Json<Vec<String>>, ApiError> {
    list_ids(&endpoint)
        .await
        .map(Json)
        .inspect_err(|err| endpoint.log_failure(err))
}

async fn list_ids(endpoint: &Endpoint) -> Result<Vec<String>, ApiError> {
    tracing::debug!(parent: endpoint.span(), "GET request to list objects");

    let keys = endpoint.store().list(&endpoint.namespace()).await?;
    let ids: Vec<String> = keys
        .iter()
        .filter_map(|key| endpoint.strip_key(key))
        .map(str::to_string)
        .collect();

    tracing::info!(parent: endpoint.span(), "Listed {} objects", ids.len());
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use crate::endpoint::Endpoint;
    use crate::handlers::testing::{send, setup_failing_app, setup_test_app, FailingStore};
    use crate::store::MemoryStore;
    use axum::{body::Body, http::header, http::Request, http::StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn parse_ids(body: &str) -> Vec<String> {
        let mut ids: Vec<String> = serde_json::from_str(body).unwrap();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_list_endpoint_empty() {
        let (app, _store) = setup_test_app();

        let (status, body) = send(&app, "GET", "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(parse_ids(&body).is_empty());
    }

    #[tokio::test]
    async fn test_list_endpoint_with_data() {
        let (app, _store) = setup_test_app();
        for key in ["key1", "key2", "key3", "key4"] {
            let (status, _) = send(&app, "PUT", &format!("/{}", key), Some("foobar")).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, "GET", "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse_ids(&body), vec!["key1", "key2", "key3", "key4"]);
    }

    #[tokio::test]
    async fn test_list_endpoint_content_type() {
        let (app, _store) = setup_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_list_isolates_namespaces() {
        let store = Arc::new(MemoryStore::new());
        let short = Endpoint::new("a", store.clone()).router();
        let long = Endpoint::new("ab", store.clone()).router();

        send(&short, "PUT", "/one", Some("1")).await;
        send(&long, "PUT", "/two", Some("2")).await;

        let (_, body) = send(&short, "GET", "/", None).await;
        assert_eq!(parse_ids(&body), vec!["one"]);

        let (_, body) = send(&long, "GET", "/", None).await;
        assert_eq!(parse_ids(&body), vec!["two"]);

        // same id in another namespace is a different object
        let (status, _) = send(&long, "GET", "/one", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_after_delete() {
        let (app, _store) = setup_test_app();
        send(&app, "PUT", "/keep", Some("x")).await;
        send(&app, "PUT", "/drop", Some("x")).await;
        send(&app, "DELETE", "/drop", None).await;

        let (_, body) = send(&app, "GET", "/", None).await;
        assert_eq!(parse_ids(&body), vec!["keep"]);
    }

    #[tokio::test]
    async fn test_list_storage_failure() {
        let app = setup_failing_app(FailingStore { fail_list: true, ..FailingStore::default() });

        let (status, body) = send(&app, "GET", "/", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "listing unavailable");
    }
}
