//! Asset loading: content-addressed model handles, glTF/GLB metadata import.
//!
//! Models are identified by the hash of their file contents. The simulation
//! consumes a [`ModelHandle`] once a background load completes, never a raw
//! file path.
//!
//! # Invariants
//! - A load never blocks the caller; completion is delivered as one message.
//! - A failed load is reported, never panics the worker or the caller.

mod gltf;
mod loader;

pub use gltf::{MaterialInfo, MeshInfo, ModelHandle, import_model, parse_model};
pub use loader::{AssetLoader, PendingLoad};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-addressed asset ID computed from the asset bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    /// First eight bytes of the SHA-256 digest, little endian.
    pub fn of_bytes(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        AssetId(u64::from_le_bytes(bytes))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("glTF format error: {0}")]
    Gltf(String),
    #[error("asset worker disconnected before reporting")]
    Disconnected,
    #[error("asset load did not finish within {0:?}")]
    Timeout(std::time::Duration),
}

pub fn crate_info() -> &'static str {
    "leashwalk-assets v0.1.0"
}
