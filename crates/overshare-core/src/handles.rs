//! Scoped binary handles
//!
//! Binary results (the uploaded preview, metadata-stripped and blurred
//! images) are stored once in a registry and referenced by `BlobHandle`.
//! A handle stays resolvable until it is revoked; the controller revokes
//! handles when a newer result supersedes them or the session is discarded,
//! so repeated scans do not accumulate bytes.

use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Opaque reference to bytes held by a `HandleRegistry`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BlobHandle {
    pub id: Uuid,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct HandleRegistry {
    blobs: HashMap<Uuid, Bytes>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        bytes: Bytes,
        filename: Option<String>,
        content_type: Option<String>,
    ) -> BlobHandle {
        let handle = BlobHandle {
            id: Uuid::new_v4(),
            filename,
            content_type,
            size: bytes.len(),
        };
        self.blobs.insert(handle.id, bytes);
        handle
    }

    pub fn resolve(&self, handle: &BlobHandle) -> Option<Bytes> {
        self.blobs.get(&handle.id).cloned()
    }

    /// Release the bytes behind `handle`. Returns false if already revoked.
    pub fn revoke(&mut self, handle: &BlobHandle) -> bool {
        let removed = self.blobs.remove(&handle.id).is_some();
        if removed {
            tracing::debug!(handle_id = %handle.id, size = handle.size, "Revoked blob handle");
        }
        removed
    }

    /// Revoke `old` if present; used when a new result replaces it.
    pub fn revoke_opt(&mut self, old: Option<&BlobHandle>) {
        if let Some(handle) = old {
            self.revoke(handle);
        }
    }

    pub fn revoke_all(&mut self) -> usize {
        let count = self.blobs.len();
        self.blobs.clear();
        count
    }

    pub fn is_live(&self, handle: &BlobHandle) -> bool {
        self.blobs.contains_key(&handle.id)
    }

    pub fn live_count(&self) -> usize {
        self.blobs.len()
    }
}
