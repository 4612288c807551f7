use std::f32::consts::{PI, TAU};

use glam::{EulerRot, Quat, Vec3};
use rand::RngExt;

use crate::animation::{AnimationMixer, LoopMode, select_clip};
use crate::assets::{LoadCompleter, LoadCompletion, LoadTask, ModelAsset};
use crate::config::model::{
    TOSS_HEIGHT, TOSS_RATE, TOSS_ROTATION_DAMPING, TOSS_SETTLE_DRIFT, TOSS_SETTLE_END, TOSS_SETTLE_HEIGHT,
    TOSS_TUMBLE_X, TOSS_TUMBLE_Z,
};
use crate::config::{ANCHOR_UP, BlinkConfig, ModelConfig, REFERENCE_HZ};
use crate::effects::{Effect, EffectContext, EffectState, Reaction, release_subtree};
use crate::errors::{Error, Result};
use crate::resources::BoundingBox;
use crate::scene::{MeshComponent, Node, NodeComponent, NodeHandle, Ray, Scene, Transform};
use crate::utils::clamp_dt;

/// Progress of a tap-triggered toss.
#[derive(Debug, Clone, Copy, Default)]
struct Toss {
    progress: f32,
    /// Tumble angles around X and Z, radians.
    tumble: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlinkPhase {
    Waiting { remaining: f32 },
    Closing { elapsed: f32 },
    Opening { elapsed: f32 },
}

struct Blink {
    mesh_node: NodeHandle,
    morph_index: usize,
    config: BlinkConfig,
    phase: BlinkPhase,
}

impl Blink {
    /// Advances the blink cycle and returns the morph weight to apply.
    fn advance(&mut self, ctx: &mut EffectContext<'_>, dt: f32) -> f32 {
        match &mut self.phase {
            BlinkPhase::Waiting { remaining } => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    self.phase = BlinkPhase::Closing { elapsed: 0.0 };
                }
                0.0
            }
            BlinkPhase::Closing { elapsed } => {
                *elapsed += dt;
                let weight = (*elapsed / self.config.close_duration.max(f32::EPSILON)).min(1.0);
                if weight >= 1.0 {
                    self.phase = BlinkPhase::Opening { elapsed: 0.0 };
                }
                weight
            }
            BlinkPhase::Opening { elapsed } => {
                *elapsed += dt;
                let weight = 1.0 - (*elapsed / self.config.open_duration.max(f32::EPSILON)).min(1.0);
                if weight <= 0.0 {
                    self.phase = BlinkPhase::Waiting {
                        remaining: next_blink_interval(ctx, &self.config),
                    };
                }
                weight
            }
        }
    }
}

fn next_blink_interval(ctx: &mut EffectContext<'_>, config: &BlinkConfig) -> f32 {
    ctx.rng.random_range(config.interval_min..=config.interval_max)
}

/// An external 3D model, loaded asynchronously and kept animated.
///
/// The root node carries the procedural motion (bob, spin, toss). Below it a
/// content node applies the configured scale and orientation, and the
/// asset's own node tree hangs off that.
pub struct ModelEffect {
    config: ModelConfig,
    state: EffectState,
    root: NodeHandle,
    rest_position: Vec3,

    task: Option<LoadTask<ModelAsset>>,
    completers: Vec<LoadCompleter>,
    /// Cleared on dispose; a result that arrives afterwards is dropped.
    wanted: bool,
    failed: bool,

    content: Option<NodeHandle>,
    mixer: AnimationMixer,
    /// Model extent in root space.
    bounds: Option<BoundingBox>,

    bob_phase: f32,
    spin_angle: f32,
    toss: Option<Toss>,
    blink: Option<Blink>,
}

impl ModelEffect {
    pub fn new(config: ModelConfig, scene: &mut Scene, parent: NodeHandle) -> Self {
        let rest_position = config.position;
        let root = scene.add_child(
            parent,
            Node::new(format!("Model:{}", config.name)).with_transform(Transform::from_position(rest_position)),
        );
        Self {
            config,
            state: EffectState::Uninitialized,
            root,
            rest_position,
            task: None,
            completers: Vec::new(),
            wanted: false,
            failed: false,
            content: None,
            mixer: AnimationMixer::new(),
            bounds: None,
            bob_phase: 0.0,
            spin_angle: 0.0,
            toss: None,
            blink: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// `true` once a load has failed; the effect then stays inert.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    #[must_use]
    pub fn is_tossing(&self) -> bool {
        self.toss.is_some()
    }

    /// Current idle spin around [`ANCHOR_UP`], in radians.
    #[must_use]
    pub fn spin_angle(&self) -> f32 {
        self.spin_angle
    }

    #[must_use]
    pub fn is_blinking_enabled(&self) -> bool {
        self.blink.is_some()
    }

    #[must_use]
    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// Top center of the model plus the configured clearance, in anchor
    /// space. `None` until the model has loaded.
    #[must_use]
    pub fn head_position(&self) -> Option<Vec3> {
        if self.state != EffectState::Active {
            return None;
        }
        let bounds = self.bounds?;
        let top = if bounds.is_empty() {
            Vec3::ZERO
        } else {
            let center = bounds.center();
            Vec3::new(center.x, bounds.max.y, center.z)
        };
        Some(self.rest_position + top + ANCHOR_UP * self.config.head_clearance)
    }

    /// Requests the model and places it at `position` (anchor space).
    ///
    /// The returned future resolves once the model is in the scene and its
    /// animation is playing, fails with the load error otherwise, and
    /// resolves to [`Error::Cancelled`] if the effect is disposed first.
    pub fn load(&mut self, ctx: &mut EffectContext<'_>, position: Vec3) -> LoadCompletion {
        let (mut completer, completion) = LoadCompletion::pair();
        match self.state {
            EffectState::Disposed => completer.complete(Err(Error::Cancelled)),
            EffectState::Active => completer.complete(Ok(())),
            EffectState::Loading if self.failed => completer.complete(Err(Error::asset_load(
                self.config.path.clone(),
                "an earlier load of this model failed",
            ))),
            EffectState::Loading => self.completers.push(completer),
            EffectState::Uninitialized => {
                self.rest_position = position;
                if let Some(node) = ctx.scene.get_node_mut(self.root) {
                    node.transform.position = position;
                }
                log::info!("Model '{}': loading {}", self.config.name, self.config.path);
                self.task = Some(ctx.assets.load_model(&self.config.path));
                self.wanted = true;
                self.state = EffectState::Loading;
                self.completers.push(completer);
            }
        }
        completion
    }

    fn settle_completers(&mut self, result: &Result<()>) {
        for mut completer in self.completers.drain(..) {
            let outcome = match result {
                Ok(()) => Ok(()),
                Err(Error::AssetLoad { path, reason }) => Err(Error::asset_load(path.clone(), reason)),
                Err(other) => Err(Error::asset_load(self.config.path.clone(), other)),
            };
            completer.complete(outcome);
        }
    }

    fn instantiate(&mut self, ctx: &mut EffectContext<'_>, asset: &ModelAsset) {
        let mut content_transform = Transform::new();
        content_transform.set_scale_uniform(self.config.scale);
        let r = self.config.rotation_euler;
        content_transform.set_rotation_euler(r.x, r.y, r.z);
        let content = ctx
            .scene
            .add_child(self.root, Node::new("ModelContent").with_transform(content_transform));

        let mut handles: Vec<NodeHandle> = Vec::with_capacity(asset.nodes.len());
        let mut mesh_nodes = Vec::new();
        for model_node in &asset.nodes {
            let transform = Transform::from_trs(model_node.position, model_node.rotation, model_node.scale);
            let mut node = Node::new(model_node.name.clone()).with_transform(transform);
            if let Some(mesh) = &model_node.mesh {
                let geometry = ctx.assets.geometries.add(mesh.geometry.clone());
                let material = ctx.assets.materials.add(mesh.material.clone());
                let mut component = MeshComponent::new(geometry, material);
                component.morph_target_names.clone_from(&mesh.morph_targets);
                component.morph_weights = vec![0.0; mesh.morph_targets.len()];
                node = node.with_component(NodeComponent::Mesh(component));
            }

            let parent = model_node.parent.and_then(|i| handles.get(i).copied()).unwrap_or(content);
            let handle = ctx.scene.add_child(parent, node);
            if let Some(mesh) = &model_node.mesh {
                mesh_nodes.push((handle, mesh.geometry.bounding_box()));
            }
            handles.push(handle);
        }

        let bounds = mesh_nodes
            .iter()
            .filter_map(|(handle, local)| {
                ctx.scene
                    .matrix_relative_to(*handle, self.root)
                    .map(|m| local.transform(&m))
            })
            .fold(BoundingBox::EMPTY, |acc, b| acc.union(&b));

        self.content = Some(content);
        self.bounds = Some(bounds);
        self.start_animation(ctx.scene, content, asset);
        self.blink = self.resolve_blink(ctx, &mesh_nodes);
    }

    fn start_animation(&mut self, scene: &Scene, content: NodeHandle, asset: &ModelAsset) {
        if asset.clips.is_empty() {
            log::debug!("Model '{}': no animation clips", self.config.name);
            return;
        }

        if self.config.play_all_clips {
            for clip in &asset.clips {
                self.mixer.play(scene, content, clip.clone(), LoopMode::Loop);
            }
            return;
        }

        if let Some(selection) = select_clip(&asset.clips, self.config.primary_clip.as_deref()) {
            if let Some(fallback) = selection.fallback {
                log::warn!(
                    "Model '{}': {fallback}; playing '{}' instead",
                    self.config.name,
                    selection.clip.name
                );
            }
            self.mixer
                .play(scene, content, selection.clip.clone(), LoopMode::Loop);
        }
    }

    fn resolve_blink(&self, ctx: &mut EffectContext<'_>, mesh_nodes: &[(NodeHandle, BoundingBox)]) -> Option<Blink> {
        let config = self.config.blink.clone()?;
        let found = mesh_nodes.iter().find_map(|(handle, _)| {
            let mesh = ctx.scene.get_node(*handle)?.mesh()?;
            mesh.morph_target_index(&config.morph_target)
                .map(|index| (*handle, index))
        });

        let Some((mesh_node, morph_index)) = found else {
            let error = Error::MissingNamedResource {
                name: config.morph_target.clone(),
                owner: self.config.name.clone(),
            };
            log::error!("Model '{}': blink disabled: {error}", self.config.name);
            return None;
        };

        let remaining = next_blink_interval(ctx, &config);
        Some(Blink {
            mesh_node,
            morph_index,
            config,
            phase: BlinkPhase::Waiting { remaining },
        })
    }

    fn advance_motion(&mut self, dt: f32) -> (Vec3, Quat) {
        // The spin holds its angle while airborne.
        let held_spin = Quat::from_axis_angle(ANCHOR_UP, self.spin_angle);

        if let Some(toss) = &mut self.toss {
            toss.progress += dt * TOSS_RATE;
            let p = toss.progress;
            let (height, drift) = if p < 1.0 {
                toss.tumble.z += dt * TOSS_TUMBLE_Z;
                toss.tumble.x += dt * TOSS_TUMBLE_X;
                ((p * PI).sin() * TOSS_HEIGHT, 0.0)
            } else if p < TOSS_SETTLE_END {
                let f = (p - 1.0) / (TOSS_SETTLE_END - 1.0);
                toss.tumble *= TOSS_ROTATION_DAMPING.powf(dt * REFERENCE_HZ);
                ((1.0 - f) * TOSS_SETTLE_HEIGHT, (1.0 - f) * TOSS_SETTLE_DRIFT)
            } else {
                self.toss = None;
                return (self.rest_position, held_spin);
            };

            let tumble = Quat::from_euler(EulerRot::XYZ, toss.tumble.x.rem_euclid(TAU), 0.0, toss.tumble.z.rem_euclid(TAU));
            return (self.rest_position + ANCHOR_UP * height + Vec3::X * drift, held_spin * tumble);
        }

        self.spin_angle = (self.spin_angle + dt * self.config.spin_rate).rem_euclid(TAU);
        let spin = Quat::from_axis_angle(ANCHOR_UP, self.spin_angle);

        let mut position = self.rest_position;
        if let Some(bob) = self.config.bob {
            self.bob_phase = (self.bob_phase + dt * bob.frequency).rem_euclid(TAU);
            position += bob.axis * self.bob_phase.sin() * bob.amplitude;
        }
        (position, spin)
    }
}

impl Effect for ModelEffect {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn state(&self) -> EffectState {
        self.state
    }

    fn scene_root(&self) -> NodeHandle {
        self.root
    }

    fn create(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        // Nobody awaits the completion here; the orchestrator observes
        // progress through `poll_ready`.
        let _ = self.load(ctx, self.config.position);
        Ok(())
    }

    fn poll_ready(&mut self, ctx: &mut EffectContext<'_>) -> EffectState {
        if self.state != EffectState::Loading || !self.wanted {
            return self.state;
        }
        let Some(task) = self.task.as_mut() else {
            return self.state;
        };
        let Some(result) = task.poll() else {
            return self.state;
        };
        self.task = None;

        match result {
            Ok(asset) => {
                self.instantiate(ctx, &asset);
                self.state = EffectState::Active;
                log::info!(
                    "Model '{}': ready ({} meshes, {} clips)",
                    self.config.name,
                    asset.mesh_count(),
                    asset.clips.len()
                );
                self.settle_completers(&Ok(()));
            }
            Err(e) => {
                log::error!("Model '{}': load failed: {e}", self.config.name);
                self.failed = true;
                self.settle_completers(&Err(e));
            }
        }
        self.state
    }

    fn update(&mut self, ctx: &mut EffectContext<'_>, dt: f32) {
        if self.state != EffectState::Active {
            return;
        }
        let dt = clamp_dt(dt);

        self.mixer.update(dt, ctx.scene);

        let (position, rotation) = self.advance_motion(dt);
        if let Some(node) = ctx.scene.get_node_mut(self.root) {
            node.transform.position = position;
            node.transform.rotation = rotation;
        }

        if let Some(blink) = &mut self.blink {
            let weight = blink.advance(ctx, dt);
            let target = blink.morph_index;
            if let Some(mesh) = ctx.scene.get_node_mut(blink.mesh_node).and_then(Node::mesh_mut) {
                if let Some(slot) = mesh.morph_weights.get_mut(target) {
                    *slot = weight;
                }
            }
        }
    }

    fn dispose(&mut self, ctx: &mut EffectContext<'_>) {
        if self.state == EffectState::Disposed {
            return;
        }
        self.wanted = false;
        self.task = None;
        for mut completer in self.completers.drain(..) {
            completer.complete(Err(Error::Cancelled));
        }

        self.mixer.stop_all();
        self.blink = None;
        self.toss = None;
        release_subtree(ctx, self.root);
        self.content = None;
        self.bounds = None;
        self.state = EffectState::Disposed;
        log::info!("Model '{}': disposed", self.config.name);
    }

    fn hit_test(&self, scene: &Scene, ray: &Ray) -> Option<f32> {
        if self.state != EffectState::Active {
            return None;
        }
        let bounds = self.bounds.filter(|b| !b.is_empty())?;
        let anchor = scene.get_node(self.root)?.parent()?;
        let to_anchor = scene.matrix_relative_to(self.root, anchor)?;
        ray.transform(&to_anchor.inverse()).intersect_aabb(&bounds)
    }

    fn interaction_priority(&self) -> Option<u8> {
        self.config.interactive
    }

    fn on_tap(&mut self, _ctx: &mut EffectContext<'_>) -> Option<Reaction> {
        if self.state != EffectState::Active || !self.config.tossable || self.toss.is_some() {
            return None;
        }
        log::debug!("Model '{}': tossed", self.config.name);
        self.toss = Some(Toss::default());
        Some(Reaction::Toss)
    }
}
