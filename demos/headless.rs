//! Headless Overlay Demo
//!
//! Mounts the graduation scene against a scripted tracking host and steps it
//! with a fixed clock. No window, no GPU: the host just counts draw calls.
//!
//! Script:
//! - frame 30: target found (sequence + music)
//! - frame 120: tap on the banner
//! - frame 240: target lost (music pauses)
//! - frame 300: target found again (music resumes)
//!
//! Run with `RUST_LOG=info cargo run --example headless`.

use std::time::Duration;

use futures::future::LocalBoxFuture;
use glam::{Affine3A, Vec2, Vec3, Vec4};

use arfx::assets::{MemoryAssetReader, MemoryModelSource, ModelAsset, ModelMesh};
use arfx::config::ModelConfig;
use arfx::{
    AssetServer, AudioPlayer, Camera, Geometry, Material, Orchestrator, PointerEvent, Scene, SceneConfig, Timer,
    TrackingEvent, TrackingHost,
};

const FRAMES: u64 = 420;

struct ScriptedHost {
    camera: Camera,
    listener: Option<flume::Sender<TrackingEvent>>,
    draws: u64,
}

impl ScriptedHost {
    fn new() -> Self {
        let mut camera = Camera::new_perspective(60.0, 16.0 / 9.0, 0.01, 100.0);
        camera.look_at(Vec3::new(0.0, 0.0, 1.2), Vec3::ZERO, Vec3::Y);
        Self {
            camera,
            listener: None,
            draws: 0,
        }
    }

    fn emit(&self, event: TrackingEvent) {
        if let Some(tx) = &self.listener {
            let _ = tx.send(event);
        }
    }

    /// Where an anchor-space point lands on screen.
    fn ndc_of(&self, point: Vec3) -> Vec2 {
        let clip: Vec4 = *self.camera.projection_matrix() * self.camera.view_matrix() * point.extend(1.0);
        Vec2::new(clip.x / clip.w, clip.y / clip.w)
    }
}

impl TrackingHost for ScriptedHost {
    fn start(&mut self) -> LocalBoxFuture<'static, arfx::Result<()>> {
        log::info!("camera started");
        Box::pin(async { Ok(()) })
    }

    fn stop(&mut self) {
        log::info!("camera stopped after {} draws", self.draws);
    }

    fn set_listener(&mut self, listener: Option<flume::Sender<TrackingEvent>>) {
        self.listener = listener;
    }

    fn anchor_matrix(&self) -> Affine3A {
        Affine3A::IDENTITY
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn render(&mut self, _scene: &Scene) {
        self.draws += 1;
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width as f32 / height.max(1) as f32);
    }
}

struct LoggingAudio;

impl AudioPlayer for LoggingAudio {
    fn play(&mut self) -> LocalBoxFuture<'static, arfx::Result<()>> {
        log::info!("music: play");
        Box::pin(async { Ok(()) })
    }

    fn pause(&mut self) {
        log::info!("music: pause");
    }
}

/// Stand-in for a decoded model file: one box mesh with a blink shape.
fn placeholder_model(label: &str) -> ModelAsset {
    let mut model = ModelAsset::new(label);
    model.add_mesh_node(
        "Body",
        None,
        Vec3::ZERO,
        ModelMesh {
            geometry: Geometry::cuboid(Vec3::splat(20.0)),
            material: Material::standard(0xdddddd),
            morph_targets: vec!["Blink".to_string()],
        },
    );
    model
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SceneConfig {
        rng_seed: Some(2024),
        ..SceneConfig::default()
    };

    let models = [ModelConfig::chibi(), ModelConfig::book(), ModelConfig::cap()]
        .into_iter()
        .fold(MemoryModelSource::new(), |source, m| {
            let asset = placeholder_model(&m.name);
            source.with_model(m.path, asset)
        });
    // No logo bytes: the banner logs a warning and renders text only.
    let assets = AssetServer::new(MemoryAssetReader::new(), models);

    let mut overlay = Orchestrator::mount(config, ScriptedHost::new(), LoggingAudio, assets)?;
    let mut timer = Timer::new();

    for frame in 1..=FRAMES {
        timer.advance(Duration::from_micros(16_667));

        match frame {
            30 | 300 => overlay.host().emit(TrackingEvent::Found),
            240 => overlay.host().emit(TrackingEvent::Lost),
            120 => {
                if let Some(rest) = overlay.banner().map(arfx::BannerEffect::rest_position) {
                    let ndc = overlay.host().ndc_of(rest);
                    let reaction = overlay.tap(PointerEvent::from_ndc(ndc.x, ndc.y));
                    log::info!("tap at {ndc} -> {reaction:?}");
                }
            }
            _ => {}
        }

        let report = overlay.tick(timer.clamped_dt())?;
        if frame % 60 == 0 {
            log::info!("{report:?}");
        }

        // Give the loader threads a chance to finish between frames.
        std::thread::sleep(Duration::from_millis(1));
    }

    if let Some(fireworks) = overlay.fireworks() {
        log::info!("{:?}", fireworks.stats());
    }

    overlay.unmount();
    log::info!("after unmount: {:?}", overlay.resource_counts());
    Ok(())
}
