use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use anyhow::{bail, Context, Result};

use crate::endpoint::KEY_SEPARATOR;

/// Which [`ObjectStore`](crate::store::ObjectStore) backend to run with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Fs,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "memory" => Ok(StoreBackend::Memory),
            "fs" => Ok(StoreBackend::Fs),
            other => bail!("STORE_BACKEND must be one of: memory, fs, got '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service_port: u16,
    pub service_host: String,
    pub store_backend: StoreBackend,
    pub store_path: Option<PathBuf>,
    pub object_prefix: String,
    pub mount_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let service_port = env::var("SERVICE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = env::var("SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .parse::<StoreBackend>()?;

        let store_path = env::var("STORE_PATH").ok().map(PathBuf::from);
        if store_backend == StoreBackend::Fs && store_path.is_none() {
            bail!("STORE_PATH environment variable is required when STORE_BACKEND=fs");
        }

        let object_prefix = env::var("OBJECT_PREFIX")
            .unwrap_or_else(|_| "objects".to_string());
        if object_prefix.is_empty() || object_prefix.contains(KEY_SEPARATOR) {
            bail!(
                "OBJECT_PREFIX must be non-empty and must not contain '{}'",
                KEY_SEPARATOR
            );
        }

        let mount_path = env::var("MOUNT_PATH")
            .unwrap_or_else(|_| "/objects".to_string());
        if !mount_path.starts_with('/') {
            bail!("MOUNT_PATH must start with '/', got '{}'", mount_path);
        }
        // `/objects/` mounts the same routes as `/objects`
        let mount_path = match mount_path.trim_end_matches('/') {
            "" => "/".to_string(),
            trimmed => trimmed.to_string(),
        };

        Ok(Config {
            service_port,
            service_host,
            store_backend,
            store_path,
            object_prefix,
            mount_path,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Store backend: {:?}", self.store_backend);
        tracing::info!("  Store path: {}",
            self.store_path.as_ref().map(|p| p.display().to_string()).as_deref().unwrap_or("none"));
        tracing::info!("  Object prefix: {}", self.object_prefix);
        tracing::info!("  Mounted at: {}", self.mount_path);
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}
