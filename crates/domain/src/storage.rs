//! Proof object storage abstraction.
//!
//! Payment proofs are opaque image blobs addressed by URL. The manager
//! services only depend on this trait; the HTTP layer decides whether
//! objects land on the local filesystem or stay in memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o error: {0}")]
    Io(String),

    #[error("object not found: {0}")]
    NotFound(String),
}

/// Builds the canonical object name for a payment proof.
///
/// The round and user identify the payment slot; the millisecond
/// timestamp keeps resubmissions from colliding with the object they
/// replace.
pub fn proof_object_name(
    round_id: Uuid,
    user_id: Uuid,
    at: DateTime<Utc>,
    extension: &str,
) -> String {
    format!(
        "{}_{}_{}.{}",
        round_id,
        user_id,
        at.timestamp_millis(),
        extension
    )
}

#[async_trait]
pub trait ProofStorage: Send + Sync {
    /// Persists an object and returns the URL it is reachable under.
    async fn store(
        &self,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError>;

    /// Deletes the object behind a previously returned URL.
    async fn remove(&self, url: &str) -> Result<(), StorageError>;
}

const MEMORY_URL_PREFIX: &str = "memory://payment-proofs/";

#[derive(Debug)]
struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
}

/// Keeps proofs in a process-local map. Used by tests and by
/// deployments that have not configured a storage root.
#[derive(Debug, Default)]
pub struct InMemoryProofStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl InMemoryProofStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        let Some(name) = url.strip_prefix(MEMORY_URL_PREFIX) else {
            return false;
        };
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    pub fn object_count(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn content_type_of(&self, url: &str) -> Option<String> {
        let name = url.strip_prefix(MEMORY_URL_PREFIX)?;
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .map(|o| o.content_type.clone())
    }

    pub fn bytes_of(&self, url: &str) -> Option<Vec<u8>> {
        let name = url.strip_prefix(MEMORY_URL_PREFIX)?;
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .map(|o| o.bytes.clone())
    }
}

#[async_trait]
impl ProofStorage for InMemoryProofStorage {
    async fn store(
        &self,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.insert(
            object_name.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(format!("{MEMORY_URL_PREFIX}{object_name}"))
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        let name = url
            .strip_prefix(MEMORY_URL_PREFIX)
            .ok_or_else(|| StorageError::NotFound(url.to_string()))?;
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(url.to_string()))
    }
}
