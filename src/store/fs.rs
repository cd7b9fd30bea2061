use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::fs::{self, File};
use tokio::io::AsyncWrite;
use uuid::Uuid;

use super::{ObjectReader, ObjectStore, ObjectWriter};

const TEMP_FILE_PREFIX: &str = ".tmp-";

/// Object store keeping one file per key under a root directory
///
/// File names are the hex encoding of the key, so keys may contain any
/// characters (`::`, `/`, ...) and listing can recover them exactly. Writes
/// go to a temporary file that replaces the target on shutdown.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create store directory {}", root.display()))?;

        tracing::debug!("Opened filesystem store at: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(hex::encode(key))
    }
}

/// Recover a key from a file name, skipping temp files and foreign entries
fn decode_file_name(name: &str) -> Option<String> {
    if name.starts_with(TEMP_FILE_PREFIX) {
        return None;
    }
    let bytes = hex::decode(name).ok()?;
    String::from_utf8(bytes).ok()
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn has(&self, key: &str) -> bool {
        fs::metadata(self.object_path(key))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn reader(&self, key: &str) -> Result<ObjectReader> {
        let file = File::open(self.object_path(key))
            .await
            .with_context(|| format!("Failed to open object {}", key))?;
        Ok(Box::new(file))
    }

    async fn writer(&self, key: &str) -> Result<ObjectWriter> {
        let temp_path = self
            .root
            .join(format!("{}{}", TEMP_FILE_PREFIX, Uuid::new_v4()));
        let file = File::create(&temp_path)
            .await
            .with_context(|| format!("Failed to create object {}", key))?;

        Ok(Box::new(FsWriter {
            file,
            temp_path,
            target_path: self.object_path(key),
            rename: None,
            finished: false,
        }))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .with_context(|| format!("Failed to read store directory {}", self.root.display()))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .context("Failed to read store directory entry")?
        {
            let Some(name) = entry.file_name().to_str().and_then(decode_file_name) else {
                continue;
            };
            if name.starts_with(prefix) {
                keys.push(name);
            }
        }

        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        fs::remove_file(self.object_path(key))
            .await
            .with_context(|| format!("Failed to delete object {}", key))
    }
}

type RenameFuture = Pin<Box<dyn Future<Output = io::Result<()>> + Send>>;

struct FsWriter {
    file: File,
    temp_path: PathBuf,
    target_path: PathBuf,
    rename: Option<RenameFuture>,
    finished: bool,
}

impl AsyncWrite for FsWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.finished || this.rename.is_some() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write after shutdown",
            )));
        }
        Pin::new(&mut this.file).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(Ok(()));
        }

        if this.rename.is_none() {
            ready!(Pin::new(&mut this.file).poll_shutdown(cx))?;
            let from = this.temp_path.clone();
            let to = this.target_path.clone();
            this.rename = Some(Box::pin(async move { fs::rename(from, to).await }));
        }

        if let Some(rename) = this.rename.as_mut() {
            let result = ready!(rename.as_mut().poll(cx));
            this.rename = None;
            this.finished = result.is_ok();
            return Poll::Ready(result);
        }
        Poll::Ready(Ok(()))
    }
}

impl Drop for FsWriter {
    fn drop(&mut self) {
        if !self.finished {
            // abandoned write, the target object is left untouched
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}
