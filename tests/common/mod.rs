//! Shared fixtures: scripted tracking host, counting audio player, gated
//! model source and a small sample model.

#![allow(dead_code)]

use std::thread;
use std::time::{Duration, Instant};

use futures::future::LocalBoxFuture;
use glam::{Affine3A, Vec2, Vec3, Vec4};
use rand::SeedableRng;
use rand::rngs::StdRng;

use arfx::animation::{AnimationClip, KeyframeTrack, TargetPath, Track, TrackData};
use arfx::assets::io::BoxLoadFuture;
use arfx::assets::{AssetServer, MemoryAssetReader, MemoryModelSource, ModelAsset, ModelMesh, ModelSource};
use arfx::effects::EffectContext;
use arfx::errors::{Error, Result};
use arfx::host::{AudioPlayer, TrackingEvent, TrackingHost};
use arfx::resources::{Geometry, Material};
use arfx::scene::{Camera, Node, NodeHandle, Scene};
use arfx::Orchestrator;

pub const EPSILON: f32 = 1e-4;
pub const FRAME: f32 = 1.0 / 60.0;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Tracking host
// ============================================================================

/// Tracking host driven by the test: it records calls and fires events on
/// demand. The camera sits one unit in front of the anchor, looking at it.
pub struct MockHost {
    pub starts: usize,
    pub stops: usize,
    pub renders: usize,
    pub resizes: Vec<(u32, u32)>,
    pub start_error: Option<String>,
    pub start_gate: Option<flume::Receiver<()>>,
    pub anchor: Affine3A,
    pub camera: Camera,
    listener: Option<flume::Sender<TrackingEvent>>,
}

impl Default for MockHost {
    fn default() -> Self {
        let mut camera = Camera::new_perspective(60.0, 1.0, 0.01, 100.0);
        camera.look_at(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::Y);
        Self {
            starts: 0,
            stops: 0,
            renders: 0,
            resizes: Vec::new(),
            start_error: None,
            start_gate: None,
            anchor: Affine3A::IDENTITY,
            camera,
            listener: None,
        }
    }
}

impl MockHost {
    pub fn failing(reason: &str) -> Self {
        Self {
            start_error: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// Start stays pending until the returned sender fires (or is dropped).
    pub fn gated() -> (flume::Sender<()>, Self) {
        let (tx, rx) = flume::bounded(1);
        (
            tx,
            Self {
                start_gate: Some(rx),
                ..Self::default()
            },
        )
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Delivers a tracking event; `false` when no listener is installed.
    pub fn emit(&self, event: TrackingEvent) -> bool {
        self.listener.as_ref().is_some_and(|tx| tx.send(event).is_ok())
    }

    /// Projects an anchor-space point to NDC.
    pub fn ndc_of(&self, point: Vec3) -> Vec2 {
        let world = self.anchor.transform_point3(point);
        let clip = *self.camera.projection_matrix() * self.camera.view_matrix() * Vec4::new(world.x, world.y, world.z, 1.0);
        Vec2::new(clip.x / clip.w, clip.y / clip.w)
    }
}

impl TrackingHost for MockHost {
    fn start(&mut self) -> LocalBoxFuture<'static, Result<()>> {
        self.starts += 1;
        let error = self.start_error.clone();
        let gate = self.start_gate.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.recv_async().await;
            }
            match error {
                Some(reason) => Err(Error::TrackingStartFailure(reason)),
                None => Ok(()),
            }
        })
    }

    fn stop(&mut self) {
        self.stops += 1;
    }

    fn set_listener(&mut self, listener: Option<flume::Sender<TrackingEvent>>) {
        self.listener = listener;
    }

    fn anchor_matrix(&self) -> Affine3A {
        self.anchor
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn render(&mut self, _scene: &Scene) {
        self.renders += 1;
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
        self.camera.set_aspect(width as f32 / height.max(1) as f32);
    }
}

// ============================================================================
// Audio
// ============================================================================

#[derive(Default)]
pub struct MockAudio {
    pub plays: usize,
    pub pauses: usize,
    pub reject: bool,
}

impl AudioPlayer for MockAudio {
    fn play(&mut self) -> LocalBoxFuture<'static, Result<()>> {
        self.plays += 1;
        let reject = self.reject;
        Box::pin(async move {
            if reject {
                Err(Error::asset_load("audio", "playback blocked by autoplay policy"))
            } else {
                Ok(())
            }
        })
    }

    fn pause(&mut self) {
        self.pauses += 1;
    }
}

// ============================================================================
// Model sources
// ============================================================================

/// Serves `model` for any path, but only after the gate opens.
pub struct GatedModelSource {
    gate: flume::Receiver<()>,
    model: ModelAsset,
}

impl GatedModelSource {
    pub fn new(model: ModelAsset) -> (flume::Sender<()>, Self) {
        let (tx, rx) = flume::unbounded();
        (tx, Self { gate: rx, model })
    }
}

impl ModelSource for GatedModelSource {
    fn load_model(&self, path: &str) -> BoxLoadFuture<ModelAsset> {
        let gate = self.gate.clone();
        let model = self.model.clone();
        let label = path.to_string();
        Box::pin(async move {
            gate.recv_async()
                .await
                .map_err(|_| Error::asset_load(label, "gate closed"))?;
            Ok(model)
        })
    }
}

/// A unit cube "Body" mesh with `Smile`/`Blink` blend shapes, a "Head"
/// child, and two clips (`Dance`, `Wave`).
pub fn sample_model() -> ModelAsset {
    let mut model = ModelAsset::new("sample");
    let body = model.add_mesh_node(
        "Body",
        None,
        Vec3::ZERO,
        ModelMesh {
            geometry: Geometry::cuboid(Vec3::ONE),
            material: Material::standard(0xcccccc),
            morph_targets: vec!["Smile".to_string(), "Blink".to_string()],
        },
    );
    model.add_node("Head", Some(body), Vec3::new(0.0, 0.6, 0.0));

    let dance = AnimationClip::new(
        "Dance",
        vec![Track::new(
            "Head",
            TargetPath::Translation,
            TrackData::Vector3(KeyframeTrack::linear(
                vec![0.0, 1.0],
                vec![Vec3::new(0.0, 0.6, 0.0), Vec3::new(0.0, 0.8, 0.0)],
            )),
        )],
    );
    let wave = AnimationClip::new(
        "Wave",
        vec![Track::new(
            "Head",
            TargetPath::Scale,
            TrackData::Vector3(KeyframeTrack::linear(vec![0.0, 2.0], vec![Vec3::ONE, Vec3::splat(2.0)])),
        )],
    );
    model.with_clip(dance).with_clip(wave)
}

/// Asset server serving `sample_model()` at every `paths` entry.
pub fn sample_assets(paths: &[&str]) -> AssetServer {
    let models = MemoryModelSource::new();
    for path in paths {
        models.insert(*path, sample_model());
    }
    AssetServer::new(MemoryAssetReader::new(), models)
}

// ============================================================================
// Effect harness
// ============================================================================

/// Scene + pools + RNG for driving a single effect without an orchestrator.
pub struct Harness {
    pub scene: Scene,
    pub assets: AssetServer,
    pub rng: StdRng,
    pub anchor: NodeHandle,
}

impl Harness {
    pub fn new(assets: AssetServer) -> Self {
        let mut scene = Scene::new();
        let anchor = scene.add_node(Node::new("Anchor"));
        Self {
            scene,
            assets,
            rng: StdRng::seed_from_u64(7),
            anchor,
        }
    }

    pub fn ctx(&mut self) -> EffectContext<'_> {
        EffectContext {
            scene: &mut self.scene,
            assets: &self.assets,
            rng: &mut self.rng,
        }
    }
}

// ============================================================================
// Waiting
// ============================================================================

/// Calls `step` until `done` holds, sleeping briefly between attempts so
/// background loads can land. Panics after two seconds.
pub fn wait_until<T>(target: &mut T, mut step: impl FnMut(&mut T), mut done: impl FnMut(&T) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !done(target) {
        assert!(Instant::now() < deadline, "condition not reached in time");
        step(target);
        thread::sleep(Duration::from_millis(1));
    }
}

/// Ticks the orchestrator until `done` holds.
pub fn tick_until<H: TrackingHost, A: AudioPlayer>(
    orchestrator: &mut Orchestrator<H, A>,
    done: impl FnMut(&Orchestrator<H, A>) -> bool,
) {
    wait_until(
        orchestrator,
        |o| {
            o.tick(FRAME).expect("tick failed");
        },
        done,
    );
}
