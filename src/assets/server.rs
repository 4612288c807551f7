use slotmap::new_key_type;
use std::future::Future;
use std::sync::Arc;

use image::RgbaImage;

use crate::assets::io::{AssetReader, FileAssetReader, MemoryModelSource, ModelSource};
use crate::assets::model::ModelAsset;
use crate::assets::storage::AssetStorage;
use crate::assets::task::LoadTask;
use crate::errors::{Error, Result};
use crate::resources::{Geometry, Material, Texture};
use crate::scene::node::{Node, NodeComponent};

#[cfg(not(target_arch = "wasm32"))]
use std::sync::OnceLock;
#[cfg(not(target_arch = "wasm32"))]
use tokio::runtime::Runtime;

#[cfg(not(target_arch = "wasm32"))]
fn get_asset_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create asset loader runtime"))
}

// Strongly-typed handles
new_key_type! {
    pub struct GeometryHandle;
    pub struct MaterialHandle;
    pub struct TextureHandle;
}

/// Live resource counts across all pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

impl ResourceCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.geometries + self.materials + self.textures
    }
}

/// Central resource pools and asynchronous loading front-end.
///
/// Cheap to clone; all clones share the same pools and sources.
#[derive(Clone)]
pub struct AssetServer {
    pub geometries: Arc<AssetStorage<GeometryHandle, Geometry>>,
    pub materials: Arc<AssetStorage<MaterialHandle, Material>>,
    pub textures: Arc<AssetStorage<TextureHandle, Texture>>,

    reader: Arc<dyn AssetReader>,
    models: Arc<dyn ModelSource>,
}

impl Default for AssetServer {
    fn default() -> Self {
        Self::new(FileAssetReader::new("."), MemoryModelSource::new())
    }
}

impl AssetServer {
    #[must_use]
    pub fn new(reader: impl AssetReader + 'static, models: impl ModelSource + 'static) -> Self {
        Self {
            geometries: Arc::new(AssetStorage::new()),
            materials: Arc::new(AssetStorage::new()),
            textures: Arc::new(AssetStorage::new()),
            reader: Arc::new(reader),
            models: Arc::new(models),
        }
    }

    #[must_use]
    pub fn resource_counts(&self) -> ResourceCounts {
        ResourceCounts {
            geometries: self.geometries.len(),
            materials: self.materials.len(),
            textures: self.textures.len(),
        }
    }

    /// Releases the geometry/material referenced by a removed node's
    /// component. Textures are owned by whoever created them and are not
    /// touched here.
    pub fn release_node(&self, node: &Node) {
        match &node.component {
            Some(NodeComponent::Mesh(mesh)) => {
                self.geometries.remove(mesh.geometry);
                self.materials.remove(mesh.material);
            }
            Some(NodeComponent::Sprite(sprite)) => {
                self.materials.remove(sprite.material);
            }
            Some(NodeComponent::Light(_)) | None => {}
        }
    }

    pub fn release_nodes(&self, nodes: &[Node]) {
        for node in nodes {
            self.release_node(node);
        }
    }

    /// Clones a material into a new pool entry (per-instance opacity).
    pub fn clone_material(&self, template: MaterialHandle) -> Option<MaterialHandle> {
        let material = self.materials.get(template)?;
        Some(self.materials.add(material.as_ref().clone()))
    }

    // ========================================================================
    // Async Loading
    // ========================================================================

    /// Starts loading a model. The result is observed with [`LoadTask::poll`]
    /// on a later frame.
    pub fn load_model(&self, path: &str) -> LoadTask<ModelAsset> {
        log::debug!("Loading model '{path}'");
        let future = self.models.load_model(path);
        Self::spawn_load(path, future)
    }

    /// Reads and decodes an image into RGBA8.
    pub fn load_image(&self, path: &str) -> LoadTask<RgbaImage> {
        log::debug!("Loading image '{path}'");
        let read = self.reader.read_bytes(path);
        let label = path.to_string();
        Self::spawn_load(path, async move {
            let bytes = read.await?;
            Self::decode_image_async(bytes, label).await
        })
    }

    fn spawn_load<T, F>(label: &str, future: F) -> LoadTask<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, task) = LoadTask::channel(label);
        let deliver = async move {
            let result = future.await;
            // A closed channel means the requester abandoned the load.
            if tx.send(result).is_err() {
                log::debug!("Discarding result of an abandoned load");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            get_asset_runtime().spawn(deliver);
        }
        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(deliver);
        }

        task
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    /// Image decoding, offloaded to the blocking pool on native targets.
    async fn decode_image_async(bytes: Vec<u8>, label: String) -> Result<RgbaImage> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            tokio::task::spawn_blocking(move || Self::decode_image_cpu(&bytes, &label)).await?
        }
        #[cfg(target_arch = "wasm32")]
        {
            Self::decode_image_cpu(&bytes, &label)
        }
    }

    pub(crate) fn decode_image_cpu(bytes: &[u8], label: &str) -> Result<RgbaImage> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| Error::ImageDecode(format!("{label}: {e}")))?;
        Ok(img.to_rgba8())
    }
}
