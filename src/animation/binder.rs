use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

pub struct Binder;

impl Binder {
    /// Resolves each track of `clip` to a node below `root` by name.
    /// Tracks whose node is absent are skipped.
    #[must_use]
    pub fn bind(scene: &Scene, root: NodeHandle, clip: &AnimationClip) -> Vec<PropertyBinding> {
        clip.tracks
            .iter()
            .enumerate()
            .filter_map(|(track_index, track)| {
                let node_handle = scene.find_node_by_name(root, &track.meta.node_name);
                if node_handle.is_none() {
                    log::debug!(
                        "Clip '{}': no node named '{}', track skipped",
                        clip.name,
                        track.meta.node_name
                    );
                }
                node_handle.map(|node_handle| PropertyBinding {
                    track_index,
                    node_handle,
                    target: track.meta.target,
                })
            })
            .collect()
    }
}
