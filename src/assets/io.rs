//! Asset sources.
//!
//! The overlay never parses model files itself. It consumes two seams:
//! - [`AssetReader`]: raw bytes for a path (logo images)
//! - [`ModelSource`]: a decoded [`ModelAsset`] for a path
//!
//! Both return boxed `Send` futures so the [`AssetServer`](super::AssetServer)
//! can drive them on its background runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::assets::model::ModelAsset;
use crate::errors::{Error, Result};

pub type BoxLoadFuture<T> = BoxFuture<'static, Result<T>>;

/// Asynchronous byte reader.
pub trait AssetReader: Send + Sync {
    fn read_bytes(&self, path: &str) -> BoxLoadFuture<Vec<u8>>;
}

/// Asynchronous model loader (the external "Asset Loader" collaborator).
pub trait ModelSource: Send + Sync {
    fn load_model(&self, path: &str) -> BoxLoadFuture<ModelAsset>;
}

// ============================================================================
// Local files
// ============================================================================

/// Reads files relative to a root directory.
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    fn read_bytes(&self, path: &str) -> BoxLoadFuture<Vec<u8>> {
        // Web-style absolute paths ("/logo.png") are relative to the root.
        let full = self.root_path.join(path.trim_start_matches('/'));
        let label = path.to_string();
        Box::pin(async move {
            #[cfg(not(target_arch = "wasm32"))]
            {
                tokio::fs::read(&full)
                    .await
                    .map_err(|e| Error::asset_load(label, e))
            }
            #[cfg(target_arch = "wasm32")]
            {
                let _ = full;
                Err(Error::asset_load(label, "file access is unavailable on wasm32"))
            }
        })
    }
}

// ============================================================================
// In-memory sources
// ============================================================================

/// Byte reader backed by a map; used for embedded assets and tests.
#[derive(Default, Clone)]
pub struct MemoryAssetReader {
    files: Arc<RwLock<FxHashMap<String, Arc<Vec<u8>>>>>,
}

impl MemoryAssetReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.write().insert(path.into(), Arc::new(bytes));
    }
}

impl AssetReader for MemoryAssetReader {
    fn read_bytes(&self, path: &str) -> BoxLoadFuture<Vec<u8>> {
        let result = self
            .files
            .read()
            .get(path)
            .map(|bytes| bytes.as_ref().clone())
            .ok_or_else(|| Error::asset_load(path, "no such file"));
        Box::pin(async move { result })
    }
}

/// Model source backed by pre-built assets keyed by path.
#[derive(Default, Clone)]
pub struct MemoryModelSource {
    models: Arc<RwLock<FxHashMap<String, Arc<ModelAsset>>>>,
}

impl MemoryModelSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, model: ModelAsset) {
        self.models.write().insert(path.into(), Arc::new(model));
    }

    #[must_use]
    pub fn with_model(self, path: impl Into<String>, model: ModelAsset) -> Self {
        self.insert(path, model);
        self
    }
}

impl ModelSource for MemoryModelSource {
    fn load_model(&self, path: &str) -> BoxLoadFuture<ModelAsset> {
        let result = self
            .models
            .read()
            .get(path)
            .map(|model| model.as_ref().clone())
            .ok_or_else(|| Error::asset_load(path, "model not found"));
        Box::pin(async move { result })
    }
}
