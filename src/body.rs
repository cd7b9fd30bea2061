//! Request/response body plumbing between axum and the object store.
//!
//! Uploads and downloads are copied chunk by chunk, so memory use stays
//! bounded regardless of object size.

use anyhow::Context as _;
use axum::{
    body::{Body, HttpBody},
    extract::{FromRequest, Request},
    http::header,
};
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::ApiError;
use crate::store::{ObjectReader, ObjectStore, ObjectWriter};

const CHUNK_SIZE: usize = 64 * 1024;

/// Request body that must be present
///
/// A body is absent when the request declares neither `Content-Length` nor
/// `Transfer-Encoding` and carries no bytes. `Content-Length: 0` is a
/// present, empty body.
pub struct RequestBody(pub Body);

impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = req.headers();
        let declared = headers.contains_key(header::CONTENT_LENGTH)
            || headers.contains_key(header::TRANSFER_ENCODING);

        let body = req.into_body();
        if !declared && body.size_hint().exact() == Some(0) {
            return Err(ApiError::MissingBody);
        }
        Ok(RequestBody(body))
    }
}

/// Copy a request body into the store under `key`
///
/// The object only becomes visible once the writer has been shut down
/// successfully.
pub async fn write_object(store: &dyn ObjectStore, key: &str, body: Body) -> Result<u64, ApiError> {
    let mut writer = store.writer(key).await?;
    let mut chunks = body.into_data_stream();
    let mut written = 0u64;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.context("Failed to read request body")?;
        writer
            .write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write object {}", key))?;
        written += chunk.len() as u64;
    }

    finish_object(writer, key).await?;
    Ok(written)
}

/// Store an in-memory buffer under `key`, replacing any previous object
pub async fn write_bytes(store: &dyn ObjectStore, key: &str, data: &[u8]) -> Result<(), ApiError> {
    let mut writer = store.writer(key).await?;
    writer
        .write_all(data)
        .await
        .with_context(|| format!("Failed to write object {}", key))?;
    finish_object(writer, key).await
}

/// Shut the writer down so the new object version becomes visible
async fn finish_object(mut writer: ObjectWriter, key: &str) -> Result<(), ApiError> {
    writer
        .shutdown()
        .await
        .with_context(|| format!("Failed to finalize object {}", key))?;
    Ok(())
}

/// Buffer a request body of at most `limit` bytes
pub async fn buffer_body(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    axum::body::to_bytes(body, limit)
        .await
        .map_err(ApiError::UnreadableBody)
}

/// Turn an object reader into a streaming response body
pub fn object_body(reader: ObjectReader) -> Body {
    let chunks = stream::try_unfold(reader, |mut reader| async move {
        let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
        let read = reader.read_buf(&mut buf).await?;
        let chunk = (read > 0).then(|| (buf.freeze(), reader));
        Ok::<_, io::Error>(chunk)
    });
    Body::from_stream(chunks)
}

/// Read a whole object into memory
pub async fn read_object(store: &dyn ObjectStore, key: &str) -> Result<Vec<u8>, ApiError> {
    let mut reader = store.reader(key).await?;
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .await
        .with_context(|| format!("Failed to read object {}", key))?;
    Ok(buf)
}
