use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::animation::AnimationClip;
use crate::resources::{Geometry, Material};

/// Mesh payload of a model node, before it is registered with the GPU pools.
#[derive(Debug, Clone)]
pub struct ModelMesh {
    pub geometry: Geometry,
    pub material: Material,
    /// Blend shape names in the order their weights are stored.
    pub morph_targets: Vec<String>,
}

/// One node of a decoded model. `parent` indexes into [`ModelAsset::nodes`]
/// and always points to an earlier entry.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    pub parent: Option<usize>,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub mesh: Option<ModelMesh>,
}

/// A decoded 3D asset: node tree plus zero or more named animation clips.
///
/// Produced by a [`ModelSource`](crate::assets::io::ModelSource); file-format
/// parsing lives behind that trait.
#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    pub label: String,
    pub nodes: Vec<ModelNode>,
    pub clips: Vec<Arc<AnimationClip>>,
}

impl ModelAsset {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            nodes: Vec::new(),
            clips: Vec::new(),
        }
    }

    /// Appends a node and returns its index. A `parent` that does not point
    /// to an earlier node is treated as "no parent".
    pub fn add_node(&mut self, name: impl Into<String>, parent: Option<usize>, position: Vec3) -> usize {
        let index = self.nodes.len();
        self.nodes.push(ModelNode {
            name: name.into(),
            parent: parent.filter(|&p| p < index),
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: None,
        });
        index
    }

    /// Appends a node carrying a mesh.
    pub fn add_mesh_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<usize>,
        position: Vec3,
        mesh: ModelMesh,
    ) -> usize {
        let index = self.add_node(name, parent, position);
        self.nodes[index].mesh = Some(mesh);
        index
    }

    pub fn add_clip(&mut self, clip: AnimationClip) {
        self.clips.push(Arc::new(clip));
    }

    #[must_use]
    pub fn with_clip(mut self, clip: AnimationClip) -> Self {
        self.add_clip(clip);
        self
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.mesh.is_some()).count()
    }
}
