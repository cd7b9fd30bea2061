use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

use super::{ObjectReader, ObjectStore, ObjectWriter};

/// Process-local object store
///
/// Clones share the same underlying map, so a clone handed to a test can
/// observe writes made through the endpoint.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<DashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all namespaces
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn has(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    async fn reader(&self, key: &str) -> Result<ObjectReader> {
        let data = self
            .objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| anyhow!("no object stored under key: {}", key))?;

        Ok(Box::new(io::Cursor::new(data)))
    }

    async fn writer(&self, key: &str) -> Result<ObjectWriter> {
        Ok(Box::new(MemoryWriter {
            key: key.to_string(),
            buf: Vec::new(),
            objects: Arc::clone(&self.objects),
            committed: false,
        }))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| anyhow!("no object stored under key: {}", key))
    }
}

/// Buffers written bytes and publishes them on shutdown
struct MemoryWriter {
    key: String,
    buf: Vec<u8>,
    objects: Arc<DashMap<String, Bytes>>,
    committed: bool,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.committed {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write after shutdown",
            )));
        }
        this.buf.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.committed {
            let data = Bytes::from(std::mem::take(&mut this.buf));
            this.objects.insert(this.key.clone(), data);
            this.committed = true;
        }
        Poll::Ready(Ok(()))
    }
}
