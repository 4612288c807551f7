//! Scene Module
//!
//! The minimal node hierarchy effects attach to:
//! - Node: hierarchy + transform + optional mesh/sprite/light payload
//! - Transform: local TRS with cached matrices
//! - Scene: slotmap-backed node arena
//! - Camera / Ray: pointer projection and hit-testing
//! - transform_system: world-matrix propagation

pub mod camera;
pub mod light;
pub mod node;
pub mod ray;
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use camera::Camera;
pub use light::{Light, LightKind};
pub use node::{MeshComponent, Node, NodeComponent, SpriteComponent};
pub use ray::Ray;
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
}
