//! Assets Module
//!
//! - [`AssetServer`]: GPU resource pools with live-count accounting and the
//!   asynchronous loading front-end
//! - [`LoadTask`]: frame-polled result of a background load
//! - [`LoadCompletion`]: caller-facing future for an effect's load
//! - [`io`]: byte readers and model sources (external collaborators)

pub mod io;
pub mod model;
pub mod server;
pub mod storage;
pub mod task;

pub use io::{AssetReader, FileAssetReader, MemoryAssetReader, MemoryModelSource, ModelSource};
pub use model::{ModelAsset, ModelMesh, ModelNode};
pub use server::{AssetServer, GeometryHandle, MaterialHandle, ResourceCounts, TextureHandle};
pub use storage::AssetStorage;
pub use task::{LoadCompleter, LoadCompletion, LoadTask};
