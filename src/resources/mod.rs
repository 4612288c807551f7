//! GPU resource descriptions.
//!
//! These are the CPU-side records of everything an effect allocates for the
//! GPU: geometry buffers, textures and materials. They live in the
//! [`AssetServer`](crate::assets::AssetServer) pools; the render host uploads
//! them, and disposing an effect removes them from the pools again.

pub mod geometry;
pub mod material;
pub mod texture;

pub use geometry::{BoundingBox, Geometry};
pub use material::{Blending, Material, MaterialKind, Side};
pub use texture::Texture;
