//! Scene Orchestrator
//!
//! The single authority of a mounted overlay: it builds the scene, owns every
//! effect, turns tracking events and taps into reactions, runs the frame loop
//! and tears everything down in order.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Initializing -> Running -> TearingDown -> Disposed
//! ```
//!
//! `Initializing` lasts until the tracking host's start future resolves.
//! Effects are created (and begin loading) during `mount`, but receive
//! `update` only once the overlay is `Running`.
//!
//! # Frame order
//!
//! Effects are updated in construction order (banner, fireworks, then
//! models in configuration order) and disposed in reverse.

mod context;

pub use context::RenderContext;

use futures::future::LocalBoxFuture;
use glam::{Affine3A, Vec3};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::assets::{AssetServer, ResourceCounts};
use crate::config::{SceneConfig, lighting};
use crate::effects::{
    BannerEffect, Effect, EffectContext, EffectState, EffectVariant, Fireworks, ModelEffect, Reaction,
};
use crate::errors::{Error, Result};
use crate::host::{AudioPlayer, PointerEvent, TrackingEvent, TrackingHost};
use crate::scene::{Light, Node, NodeComponent, NodeHandle, Scene};
use crate::utils::poll_once;

/// Mount lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountState {
    Idle,
    Initializing,
    Running,
    TearingDown,
    Disposed,
}

/// Summary of one `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub state: MountState,
    pub frame: u64,
    pub active_effects: usize,
    pub loading_effects: usize,
    pub live_particles: usize,
}

pub struct Orchestrator<H: TrackingHost, A: AudioPlayer> {
    state: MountState,
    host: H,
    audio: A,
    assets: AssetServer,
    scene: Scene,
    rng: StdRng,

    scene_root: NodeHandle,
    anchor: NodeHandle,
    effects: Vec<EffectVariant>,
    /// Index of the model the banner follows.
    follow: Option<usize>,

    events: flume::Receiver<TrackingEvent>,
    start: Option<LocalBoxFuture<'static, Result<()>>>,
    playback: Option<LocalBoxFuture<'static, Result<()>>>,

    fireworks_on_found: bool,
    has_fired: bool,
    target_visible: bool,
    audio_paused: bool,
    frame: u64,

    context: Option<RenderContext>,
}

impl<H: TrackingHost, A: AudioPlayer> Orchestrator<H, A> {
    /// Claims the render context, builds the scene, creates every effect and
    /// starts the tracking host.
    ///
    /// Per-effect failures are logged and leave that effect inert; only a
    /// busy render context or an invalid configuration fails the mount.
    pub fn mount(config: SceneConfig, mut host: H, audio: A, assets: AssetServer) -> Result<Self> {
        config.validate()?;

        let mut scene = Scene::new();
        let context = RenderContext::acquire(scene.id)?;
        log::info!("Mounting scene {}", scene.id);

        let scene_root = scene.add_node(Node::new("ARScene"));
        let light = Light::new_hemisphere(lighting::SKY_COLOR, lighting::GROUND_COLOR, lighting::INTENSITY);
        scene.add_child(scene_root, Node::new("HemisphereLight").with_component(NodeComponent::Light(light)));
        let anchor = scene.add_child(scene_root, Node::new("Anchor"));

        let mut effects: Vec<EffectVariant> = Vec::new();
        if let Some(banner) = config.banner.clone() {
            effects.push(BannerEffect::new(banner, &mut scene, anchor).into());
        }
        if let Some(fireworks) = config.fireworks.clone() {
            effects.push(Fireworks::new(fireworks, &mut scene, anchor).into());
        }
        for model in &config.models {
            effects.push(ModelEffect::new(model.clone(), &mut scene, anchor).into());
        }

        let follow = config
            .banner
            .as_ref()
            .and_then(|b| b.follow_model.as_deref())
            .and_then(|name| {
                effects
                    .iter()
                    .position(|e| e.as_model().is_some_and(|m| m.config().name == name))
            });

        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(clock_seed()),
        };

        {
            let mut ctx = EffectContext {
                scene: &mut scene,
                assets: &assets,
                rng: &mut rng,
            };
            for effect in &mut effects {
                if let Err(e) = effect.create(&mut ctx) {
                    log::error!("Effect '{}' failed to initialize: {e}", effect.name());
                }
            }
        }

        let (tx, events) = flume::unbounded();
        host.set_listener(Some(tx));
        let start = host.start();

        Ok(Self {
            state: MountState::Initializing,
            host,
            audio,
            assets,
            scene,
            rng,
            scene_root,
            anchor,
            effects,
            follow,
            events,
            start: Some(start),
            playback: None,
            fireworks_on_found: config.fireworks_on_found,
            has_fired: false,
            target_visible: false,
            audio_paused: false,
            frame: 0,
            context: Some(context),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn state(&self) -> MountState {
        self.state
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn anchor(&self) -> NodeHandle {
        self.anchor
    }

    #[must_use]
    pub fn assets(&self) -> &AssetServer {
        &self.assets
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn audio(&self) -> &A {
        &self.audio
    }

    #[must_use]
    pub fn effects(&self) -> &[EffectVariant] {
        &self.effects
    }

    #[must_use]
    pub fn effect(&self, name: &str) -> Option<&EffectVariant> {
        self.effects.iter().find(|e| e.name() == name)
    }

    #[must_use]
    pub fn fireworks(&self) -> Option<&Fireworks> {
        self.effects.iter().find_map(EffectVariant::as_fireworks)
    }

    #[must_use]
    pub fn banner(&self) -> Option<&BannerEffect> {
        self.effects.iter().find_map(EffectVariant::as_banner)
    }

    #[must_use]
    pub fn model(&self, name: &str) -> Option<&ModelEffect> {
        self.effects
            .iter()
            .filter_map(EffectVariant::as_model)
            .find(|m| m.config().name == name)
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.has_fired
    }

    #[must_use]
    pub fn is_target_visible(&self) -> bool {
        self.target_visible
    }

    #[must_use]
    pub fn resource_counts(&self) -> ResourceCounts {
        self.assets.resource_counts()
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// Runs one host frame.
    ///
    /// Returns [`Error::TrackingStartFailure`] if the tracking host failed to
    /// start; the orchestrator has torn itself down by then.
    pub fn tick(&mut self, dt: f32) -> Result<FrameReport> {
        match self.state {
            MountState::Initializing => {
                if let Some(outcome) = self.start.as_mut().and_then(poll_once) {
                    self.start = None;
                    match outcome {
                        Ok(()) => {
                            log::info!("Tracking started; scene {} running", self.scene.id);
                            self.state = MountState::Running;
                        }
                        Err(e) => {
                            let error = match e {
                                Error::TrackingStartFailure(_) => e,
                                other => Error::TrackingStartFailure(other.to_string()),
                            };
                            log::error!("{error}");
                            self.unmount();
                            return Err(error);
                        }
                    }
                }
                self.poll_loads();
                if self.state == MountState::Running {
                    self.run_frame(dt);
                }
            }
            MountState::Running => self.run_frame(dt),
            MountState::Idle | MountState::TearingDown | MountState::Disposed => {}
        }
        Ok(self.report())
    }

    fn run_frame(&mut self, dt: f32) {
        self.frame += 1;

        let events: Vec<TrackingEvent> = self.events.try_iter().collect();
        for event in events {
            self.handle_tracking_event(event);
        }

        self.sync_anchor();
        self.poll_loads();
        self.poll_playback();

        {
            let (effects, mut ctx) = self.split();
            for effect in effects.iter_mut().filter(|e| e.state() == EffectState::Active) {
                effect.update(&mut ctx, dt);
            }
        }

        self.relay_follow_target();
        self.scene.update_matrix_world();
        self.host.render(&self.scene);
    }

    fn report(&self) -> FrameReport {
        let count = |state| self.effects.iter().filter(|e| e.state() == state).count();
        FrameReport {
            state: self.state,
            frame: self.frame,
            active_effects: count(EffectState::Active),
            loading_effects: count(EffectState::Loading),
            live_particles: self.fireworks().map_or(0, Fireworks::live_particles),
        }
    }

    fn split(&mut self) -> (&mut Vec<EffectVariant>, EffectContext<'_>) {
        (
            &mut self.effects,
            EffectContext {
                scene: &mut self.scene,
                assets: &self.assets,
                rng: &mut self.rng,
            },
        )
    }

    fn poll_loads(&mut self) {
        let (effects, mut ctx) = self.split();
        for effect in effects.iter_mut().filter(|e| e.state() == EffectState::Loading) {
            effect.poll_ready(&mut ctx);
        }
    }

    fn poll_playback(&mut self) {
        if let Some(outcome) = self.playback.as_mut().and_then(poll_once) {
            self.playback = None;
            if let Err(e) = outcome {
                log::warn!("Audio playback was rejected: {e}");
            }
        }
    }

    fn sync_anchor(&mut self) {
        let (scale, rotation, position) = self.host.anchor_matrix().to_scale_rotation_translation();
        if let Some(node) = self.scene.get_node_mut(self.anchor) {
            node.transform.position = position;
            node.transform.rotation = rotation;
            node.transform.scale = scale;
        }
    }

    fn relay_follow_target(&mut self) {
        let Some(index) = self.follow else {
            return;
        };
        let Some(head) = self.effects.get(index).and_then(EffectVariant::as_model).and_then(ModelEffect::head_position)
        else {
            return;
        };
        if let Some(banner) = self.effects.iter_mut().find_map(EffectVariant::as_banner_mut) {
            banner.set_position(&mut self.scene, head);
        }
    }

    // ========================================================================
    // Tracking events
    // ========================================================================

    fn handle_tracking_event(&mut self, event: TrackingEvent) {
        match event {
            TrackingEvent::Found => {
                self.target_visible = true;
                if !self.has_fired {
                    self.has_fired = true;
                    log::info!("Target found: starting one-shot reactions");
                    self.start_audio();
                    if self.fireworks_on_found {
                        if let Some(fireworks) = self.effects.iter_mut().find_map(EffectVariant::as_fireworks_mut) {
                            fireworks.launch_sequence(Vec3::ZERO);
                        }
                    }
                } else if self.audio_paused {
                    log::debug!("Target re-acquired: resuming audio");
                    self.start_audio();
                }
            }
            TrackingEvent::Lost => {
                self.target_visible = false;
                if self.has_fired && !self.audio_paused {
                    log::debug!("Target lost: pausing audio");
                    self.audio.pause();
                    self.audio_paused = true;
                }
            }
        }
    }

    fn start_audio(&mut self) {
        self.audio_paused = false;
        let mut playback = self.audio.play();
        match poll_once(&mut playback) {
            Some(Err(e)) => log::warn!("Audio playback was rejected: {e}"),
            Some(Ok(())) => {}
            None => self.playback = Some(playback),
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Hit-tests a tap against interactive effects, most specific first.
    /// Returns the reaction of the first effect hit, if any.
    pub fn tap(&mut self, pointer: PointerEvent) -> Option<Reaction> {
        if self.state != MountState::Running {
            return None;
        }

        let world_ray = self.host.camera().ray_from_ndc(pointer.ndc);
        let anchor_inverse: Affine3A = self.host.anchor_matrix().inverse();
        let ray = world_ray.transform(&anchor_inverse);

        let mut candidates: Vec<(u8, usize)> = self
            .effects
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.interaction_priority().map(|p| (p, i)))
            .collect();
        candidates.sort_unstable();

        let hit = candidates
            .into_iter()
            .map(|(_, i)| i)
            .find(|&i| self.effects[i].hit_test(&self.scene, &ray).is_some())?;

        let reaction = {
            let (effects, mut ctx) = self.split();
            effects[hit].on_tap(&mut ctx)
        };
        log::debug!("Tap hit '{}': {reaction:?}", self.effects[hit].name());

        if let Some(Reaction::LaunchBurst { origin }) = reaction {
            self.launch_burst(origin);
        }
        reaction
    }

    fn launch_burst(&mut self, origin: Vec3) {
        let Some(index) = self.effects.iter().position(|e| e.as_fireworks().is_some()) else {
            return;
        };
        let (effects, mut ctx) = self.split();
        let Some(fireworks) = effects[index].as_fireworks_mut() else {
            return;
        };
        let palette: Vec<u32> = fireworks.config().sequence.iter().map(|e| e.color).collect();
        let color = if palette.is_empty() {
            fireworks.config().rocket_color
        } else {
            palette[ctx.rng.random_range(0..palette.len())]
        };
        fireworks.launch(&mut ctx, origin, color);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.host.resize(width, height);
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Tears the overlay down. Safe to call repeatedly and with loads still
    /// in flight.
    pub fn unmount(&mut self) {
        if matches!(self.state, MountState::TearingDown | MountState::Disposed) {
            return;
        }
        self.state = MountState::TearingDown;
        log::info!("Unmounting scene {}", self.scene.id);

        self.host.set_listener(None);
        {
            let (effects, mut ctx) = self.split();
            for effect in effects.iter_mut().rev() {
                effect.dispose(&mut ctx);
            }
        }

        self.start = None;
        self.playback = None;
        self.host.stop();

        let removed = self.scene.remove_node(self.scene_root);
        self.assets.release_nodes(&removed);

        self.context = None;
        self.state = MountState::Disposed;
        log::info!("Scene {} disposed", self.scene.id);
    }
}

impl<H: TrackingHost, A: AudioPlayer> Drop for Orchestrator<H, A> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Holds at most one mounted overlay; mounting again tears the previous one
/// down first.
pub struct MountSlot<H: TrackingHost, A: AudioPlayer> {
    current: Option<Orchestrator<H, A>>,
}

impl<H: TrackingHost, A: AudioPlayer> Default for MountSlot<H, A> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<H: TrackingHost, A: AudioPlayer> MountSlot<H, A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, config: SceneConfig, host: H, audio: A, assets: AssetServer) -> Result<&mut Orchestrator<H, A>> {
        if let Some(mut previous) = self.current.take() {
            previous.unmount();
        }
        let orchestrator = Orchestrator::mount(config, host, audio, assets)?;
        Ok(self.current.insert(orchestrator))
    }

    /// Unmounts and returns the previous overlay (already disposed).
    pub fn unmount(&mut self) -> Option<Orchestrator<H, A>> {
        let mut previous = self.current.take()?;
        previous.unmount();
        Some(previous)
    }

    #[must_use]
    pub fn get(&self) -> Option<&Orchestrator<H, A>> {
        self.current.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut Orchestrator<H, A>> {
        self.current.as_mut()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.current.is_some()
    }
}

fn clock_seed() -> u64 {
    #[cfg(not(target_arch = "wasm32"))]
    use std::time::{SystemTime, UNIX_EPOCH};
    #[cfg(target_arch = "wasm32")]
    use web_time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0x5eed_f1e1_d5ee_d5ee, |d| d.as_nanos() as u64)
}
