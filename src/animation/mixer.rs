use std::sync::Arc;

use crate::animation::action::{AnimationAction, LoopMode};
use crate::animation::binder::Binder;
use crate::animation::binding::TargetPath;
use crate::animation::clip::{AnimationClip, TrackData};
use crate::errors::Error;
use crate::scene::{NodeHandle, Scene};

/// Outcome of picking the clip a model should play.
#[derive(Debug)]
pub struct ClipSelection<'a> {
    pub clip: &'a Arc<AnimationClip>,
    /// Set when the requested clip was absent and the first clip was used.
    pub fallback: Option<Error>,
}

/// Picks `preferred` by name, falling back to the first clip. `None` only
/// when the model has no clips at all.
#[must_use]
pub fn select_clip<'a>(clips: &'a [Arc<AnimationClip>], preferred: Option<&str>) -> Option<ClipSelection<'a>> {
    let first = clips.first()?;
    let Some(name) = preferred else {
        return Some(ClipSelection {
            clip: first,
            fallback: None,
        });
    };

    Some(match clips.iter().find(|c| c.name == name) {
        Some(clip) => ClipSelection { clip, fallback: None },
        None => ClipSelection {
            clip: first,
            fallback: Some(Error::MissingAnimationClip(name.to_string())),
        },
    })
}

/// Drives a set of actions and writes sampled values into scene nodes.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
}

impl AnimationMixer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, action: AnimationAction) {
        self.actions.push(action);
    }

    /// Binds `clip` to the subtree under `root` and starts it looping.
    pub fn play(&mut self, scene: &Scene, root: NodeHandle, clip: Arc<AnimationClip>, loop_mode: LoopMode) {
        let bindings = Binder::bind(scene, root, &clip);
        let mut action = AnimationAction::new(clip).with_bindings(bindings);
        action.loop_mode = loop_mode;
        self.add_action(action);
    }

    #[must_use]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn stop_all(&mut self) {
        self.actions.clear();
    }

    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        for action in &mut self.actions {
            action.update(dt);
            if !action.enabled || action.weight <= 0.0 {
                continue;
            }
            Self::apply(action, scene);
        }
    }

    fn apply(action: &mut AnimationAction, scene: &mut Scene) {
        let clip = Arc::clone(action.clip());
        let time = action.time;

        for binding in &action.bindings {
            let Some(track) = clip.tracks.get(binding.track_index) else {
                continue;
            };
            let Some(cursor) = action.track_cursors.get_mut(binding.track_index) else {
                continue;
            };
            let Some(node) = scene.get_node_mut(binding.node_handle) else {
                continue;
            };

            match (&track.data, binding.target) {
                (TrackData::Vector3(t), TargetPath::Translation) => {
                    if let Some(v) = t.sample_with_cursor(time, cursor) {
                        node.transform.position = v;
                    }
                }
                (TrackData::Vector3(t), TargetPath::Scale) => {
                    if let Some(v) = t.sample_with_cursor(time, cursor) {
                        node.transform.scale = v;
                    }
                }
                (TrackData::Quaternion(t), TargetPath::Rotation) => {
                    if let Some(q) = t.sample_with_cursor(time, cursor) {
                        node.transform.rotation = q;
                    }
                }
                (TrackData::Scalar(t), TargetPath::MorphWeight(index)) => {
                    if let (Some(w), Some(mesh)) = (t.sample_with_cursor(time, cursor), node.mesh_mut()) {
                        if let Some(slot) = mesh.morph_weights.get_mut(index) {
                            *slot = w;
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
