use crate::scene::NodeHandle;

/// Node property an animation track drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
    /// Influence of the morph target at this index on the node's mesh.
    MorphWeight(usize),
}

/// Track `track_index` of a clip resolved to a concrete scene node.
#[derive(Debug, Clone)]
pub struct PropertyBinding {
    pub track_index: usize,
    pub node_handle: NodeHandle,
    pub target: TargetPath,
}
