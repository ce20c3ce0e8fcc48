//! Local filesystem backend for payment proofs.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use domain::storage::{InMemoryProofStorage, ProofStorage, StorageError};

use crate::config::StorageConfig;

/// Writes proof objects under a directory and serves them by URL
/// prefix. The reverse proxy (or a static-file route) is expected to
/// map `public_base_url` onto `root`.
#[derive(Debug)]
pub struct LocalProofStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalProofStorage {
    pub fn new(root: &str, public_base_url: &str) -> Self {
        Self {
            root: PathBuf::from(root),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_path(&self, object_name: &str) -> Result<PathBuf, StorageError> {
        // Object names come from proof_object_name and never contain
        // separators; reject anything else before touching the disk.
        if object_name.is_empty() || object_name.contains('/') || object_name.contains("..") {
            return Err(StorageError::Io(format!(
                "invalid object name: {object_name}"
            )));
        }
        Ok(self.root.join(object_name))
    }
}

#[async_trait]
impl ProofStorage for LocalProofStorage {
    async fn store(
        &self,
        object_name: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let path = self.object_path(object_name)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        debug!(path = %path.display(), "stored payment proof");
        Ok(format!("{}/{}", self.public_base_url, object_name))
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        let object_name = url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StorageError::NotFound(url.to_string()))?;
        let path = self.object_path(object_name)?;

        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(url.to_string())
            } else {
                StorageError::Io(e.to_string())
            }
        })
    }
}

/// Selects the storage backend from configuration. `memory` keeps
/// proofs in-process; everything else writes to the local filesystem.
pub fn build_proof_storage(config: &StorageConfig) -> Arc<dyn ProofStorage> {
    if config.provider == "memory" {
        Arc::new(InMemoryProofStorage::new())
    } else {
        Arc::new(LocalProofStorage::new(
            &config.root,
            &config.public_base_url,
        ))
    }
}
