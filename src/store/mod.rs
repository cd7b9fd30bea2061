//! Storage collaborator used by the CRUD endpoint.
//!
//! The endpoint never touches a concrete backend directly; everything goes
//! through [`ObjectStore`], so backends can be swapped without touching the
//! HTTP handlers.

pub mod fs;
pub mod memory;

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::{Config, StoreBackend};

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Byte stream over a stored object. Dropping it releases the object.
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Byte sink for a new object version.
///
/// The object is only finalized once `shutdown()` returns successfully;
/// `shutdown()` may fail, and callers must surface that failure.
pub type ObjectWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Opaque key-value byte store
///
/// Implementations must be safe for concurrent use by many requests at once.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether an object exists at `key`
    async fn has(&self, key: &str) -> bool;

    /// Open a reader over the object at `key`
    async fn reader(&self, key: &str) -> Result<ObjectReader>;

    /// Open a writer that replaces the object at `key` when shut down
    async fn writer(&self, key: &str) -> Result<ObjectWriter>;

    /// All keys starting with `prefix`, in no particular order
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Remove the object at `key`
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Open the backend selected by the configuration
pub async fn open_store(config: &Config) -> Result<Arc<dyn ObjectStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory object store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Fs => {
            let Some(root) = config.store_path.as_ref() else {
                bail!("STORE_PATH is required for the fs backend");
            };
            tracing::info!("Using filesystem object store at: {}", root.display());
            Ok(Arc::new(FsStore::open(root).await?))
        }
    }
}
