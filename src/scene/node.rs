use crate::assets::{GeometryHandle, MaterialHandle};
use crate::scene::NodeHandle;
use crate::scene::light::Light;
use crate::scene::transform::Transform;
use glam::Affine3A;

/// Renderable mesh attached to a node.
#[derive(Debug, Clone)]
pub struct MeshComponent {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    /// Names of the morph targets (blend shapes) the geometry carries.
    pub morph_target_names: Vec<String>,
    /// Current influence of each morph target, same order as the names.
    pub morph_weights: Vec<f32>,
}

impl MeshComponent {
    #[must_use]
    pub fn new(geometry: GeometryHandle, material: MaterialHandle) -> Self {
        Self {
            geometry,
            material,
            morph_target_names: Vec::new(),
            morph_weights: Vec::new(),
        }
    }

    /// Index of the morph target with the given name, if present.
    #[must_use]
    pub fn morph_target_index(&self, name: &str) -> Option<usize> {
        self.morph_target_names.iter().position(|n| n == name)
    }
}

/// Camera-facing point sprite (particles, rocket markers).
#[derive(Debug, Clone, Copy)]
pub struct SpriteComponent {
    pub material: MaterialHandle,
}

/// The single optional payload a node may carry.
#[derive(Debug, Clone)]
pub enum NodeComponent {
    Mesh(MeshComponent),
    Sprite(SpriteComponent),
    Light(Light),
}

/// A scene node: hierarchy, transform and an optional payload.
///
/// Nodes are owned by [`Scene`](crate::scene::Scene); each effect
/// owns exactly one subtree and never mutates another effect's nodes.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    pub transform: Transform,
    pub visible: bool,
    pub component: Option<NodeComponent>,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            component: None,
        }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: NodeComponent) -> Self {
        self.component = Some(component);
        self
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }

    #[must_use]
    pub fn mesh(&self) -> Option<&MeshComponent> {
        match &self.component {
            Some(NodeComponent::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut MeshComponent> {
        match &mut self.component {
            Some(NodeComponent::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("")
    }
}
