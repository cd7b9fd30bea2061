use crate::body::{buffer_body, read_object, write_bytes};
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::routes;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
};
use serde::de::Error as _;
use serde_json::{Deserializer, Map, Value as JsonValue};

type JsonObject = Map<String, JsonValue>;

type PatchResponse = (StatusCode, [(header::HeaderName, &'static str); 1], Vec<u8>);

/// Largest accepted patch document
pub const PATCH_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Shallow merge: top-level keys of `patch` replace those of `base`
///
/// Nested objects are replaced wholesale, not merged; keys missing from
/// `patch` are kept.
pub fn merge_shallow(base: &mut JsonObject, patch: JsonObject) {
    base.extend(patch);
}

/// Decode the leading JSON object of `bytes`, ignoring anything after it
fn decode_object(bytes: &[u8]) -> Result<JsonObject, serde_json::Error> {
    Deserializer::from_slice(bytes)
        .into_iter::<JsonObject>()
        .next()
        .unwrap_or_else(|| Err(serde_json::Error::custom("EOF while parsing a JSON object")))
}

/// PATCH /{id} handler - Merge fields into a stored JSON object
///
/// The merged object is written back and returned. There is no version
/// check: two concurrent patches of the same id race, and the last write wins.
#[utoipa::path(
    patch,
    path = routes::OBJECT_ITEM,
    params(
        ("id" = String, Path, description = "Object id")
    ),
    request_body(content = serde_json::Value, content_type = "application/json"),
    responses(
        (status = 200, description = "Merged object", body = serde_json::Value),
        (status = 400, description = "Patch body is not a JSON object", body = String),
        (status = 404, description = "Object not found", body = String),
        (status = 500, description = "Stored object is not a JSON object, or storage error", body = String)
    ),
    tag = "objects"
)]
pub async fn patch_handler(
    State(endpoint): State<Endpoint>,
    Path(id): Path<String>,
    body: Body,
) -> Result<PatchResponse, ApiError> {
    patch_object(&endpoint, id, body)
        .await
        .inspect_err(|err| endpoint.log_failure(err))
}

async fn patch_object(endpoint: &Endpoint, id: String, body: Body) -> Result<PatchResponse, ApiError> {
    tracing::debug!(parent: endpoint.span(), "PATCH request for object {}", id);

    let key = endpoint.object_key(&id);
    if !endpoint.store().has(&key).await {
        tracing::info!(parent: endpoint.span(), "Object not found with id: {}", id);
        return Err(ApiError::ObjectNotFound(id));
    }

    let stored = read_object(endpoint.store(), &key).await?;
    let mut object = decode_object(&stored).map_err(ApiError::CorruptObject)?;

    let patch = buffer_body(body, PATCH_BODY_LIMIT).await?;
    let patch = decode_object(&patch).map_err(ApiError::InvalidPatch)?;
    let patched_fields = patch.len();
    merge_shallow(&mut object, patch);

    let encoded = serde_json::to_vec(&object).map_err(ApiError::CorruptObject)?;
    write_bytes(endpoint.store(), &key, &encoded).await?;

    tracing::info!(
        parent: endpoint.span(),
        "Patched {} fields of object {} ({} fields total)",
        patched_fields,
        id,
        object.len()
    );
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        encoded,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{send, setup_failing_app, setup_test_app, FailingStore};
    use serde_json::json;

    fn object(value: JsonValue) -> JsonObject {
        match value {
            JsonValue::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_merge_shallow() {
        let mut base = object(json!({"a": 1, "b": 2}));
        merge_shallow(&mut base, object(json!({"c": 3, "a": 4})));

        assert_eq!(JsonValue::Object(base), json!({"a": 4, "b": 2, "c": 3}));
    }

    #[test]
    fn test_merge_replaces_nested_values() {
        let mut base = object(json!({"nested": {"x": 1, "y": 2}, "list": [1, 2]}));
        merge_shallow(&mut base, object(json!({"nested": {"x": 10}, "list": null})));

        assert_eq!(
            JsonValue::Object(base),
            json!({"nested": {"x": 10}, "list": null})
        );
    }

    #[test]
    fn test_merge_empty_patch() {
        let mut base = object(json!({"a": 1}));
        merge_shallow(&mut base, JsonObject::new());

        assert_eq!(JsonValue::Object(base), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_patch_endpoint_success() {
        let (app, _store) = setup_test_app();
        send(&app, "PUT", "/key1", Some(r#"{"a":1,"b":2}"#)).await;

        let (status, body) = send(&app, "PATCH", "/key1", Some(r#"{"c":3,"a":4}"#)).await;
        assert_eq!(status, StatusCode::OK);
        let returned: JsonValue = serde_json::from_str(&body).unwrap();
        assert_eq!(returned, json!({"a": 4, "b": 2, "c": 3}));

        let (status, body) = send(&app, "GET", "/key1", None).await;
        assert_eq!(status, StatusCode::OK);
        let stored: JsonObject = serde_json::from_str(&body).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored["a"], json!(4));
        assert_eq!(stored["b"], json!(2));
        assert_eq!(stored["c"], json!(3));
    }

    #[tokio::test]
    async fn test_patch_response_matches_stored_bytes() {
        let (app, _store) = setup_test_app();
        send(&app, "PUT", "/doc", Some(r#"{"name":"old","tags":["a"]}"#)).await;

        let (_, patched) = send(&app, "PATCH", "/doc", Some(r#"{"name":"new"}"#)).await;
        let (_, stored) = send(&app, "GET", "/doc", None).await;

        assert_eq!(patched, stored);
    }

    #[tokio::test]
    async fn test_patch_endpoint_not_found() {
        let (app, store) = setup_test_app();

        let (status, body) = send(&app, "PATCH", "/never-written", Some(r#"{"a":1}"#)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "object not found");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_patch_invalid_patch_body() {
        let (app, _store) = setup_test_app();
        send(&app, "PUT", "/key1", Some(r#"{"a":1}"#)).await;

        let (status, _) = send(&app, "PATCH", "/key1", Some("{invalid json}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "PATCH", "/key1", Some("[1]")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "PATCH", "/key1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // stored object untouched
        let (_, body) = send(&app, "GET", "/key1", None).await;
        assert_eq!(body, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_patch_corrupt_stored_object() {
        let (app, _store) = setup_test_app();
        send(&app, "PUT", "/blob", Some("foobar")).await;

        let (status, _) = send(&app, "PATCH", "/blob", Some(r#"{"a":1}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (_, body) = send(&app, "GET", "/blob", None).await;
        assert_eq!(body, "foobar");
    }

    #[tokio::test]
    async fn test_patch_stored_non_object() {
        let (app, _store) = setup_test_app();
        send(&app, "PUT", "/list", Some("[1,2,3]")).await;

        let (status, _) = send(&app, "PATCH", "/list", Some(r#"{"a":1}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    fn oversized_patch() -> String {
        format!(r#"{{"blob":"{}"}}"#, "x".repeat(PATCH_BODY_LIMIT + 1))
    }

    #[tokio::test]
    async fn test_patch_missing_object_with_oversized_body() {
        let (app, _store) = setup_test_app();

        let (status, body) = send(&app, "PATCH", "/never-written", Some(&oversized_patch())).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "object not found");
    }

    #[tokio::test]
    async fn test_patch_oversized_body() {
        let (app, _store) = setup_test_app();
        send(&app, "PUT", "/key1", Some(r#"{"a":1}"#)).await;

        let (status, body) = send(&app, "PATCH", "/key1", Some(&oversized_patch())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("Failed to read request body"));

        let (_, body) = send(&app, "GET", "/key1", None).await;
        assert_eq!(body, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_patch_ignores_content_after_first_object() {
        let (app, _store) = setup_test_app();
        send(&app, "PUT", "/stream", Some("{\"a\":1}\n{\"b\":2}")).await;

        let (status, body) = send(&app, "PATCH", "/stream", Some("{\"c\":3}\n")).await;

        assert_eq!(status, StatusCode::OK);
        let returned: JsonValue = serde_json::from_str(&body).unwrap();
        assert_eq!(returned, json!({"a": 1, "c": 3}));
    }

    #[tokio::test]
    async fn test_patch_write_back_failure() {
        let store = FailingStore::default();
        store.seed("test::key1", br#"{"a":1}"#).await;
        let store = FailingStore { fail_writer: true, ..store };
        let app = setup_failing_app(store);

        let (status, body) = send(&app, "PATCH", "/key1", Some(r#"{"b":2}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("writer unavailable"));
    }

    #[test]
    fn test_decode_object() {
        assert_eq!(
            JsonValue::Object(decode_object(br#"{"a":1} {"b":2}"#).unwrap()),
            json!({"a": 1})
        );
        assert!(decode_object(b"").is_err());
        assert!(decode_object(b"   ").is_err());
        assert!(decode_object(b"[1]").is_err());
    }
}
