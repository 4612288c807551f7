//! Model Effect Tests
//!
//! Tests for:
//! - Load completion futures: success, shared waiters, failure, cancellation
//! - Clip selection (named, fallback, play-all)
//! - Blink resolution and morph weight driving
//! - Toss reaction and settle
//! - Anchor-space hit testing and head position
//! - Resource release on dispose

mod common;

use futures::FutureExt;
use glam::Vec3;

use arfx::assets::{AssetServer, MemoryAssetReader, MemoryModelSource};
use arfx::config::{BlinkConfig, ModelConfig, Oscillation};
use arfx::effects::{Effect, EffectState, ModelEffect, Reaction};
use arfx::errors::Error;
use arfx::scene::Ray;

use common::{FRAME, GatedModelSource, Harness, approx, init_logger, sample_assets, sample_model, wait_until};

const PATH: &str = "/cube.glb";

fn cube_config() -> ModelConfig {
    ModelConfig {
        name: "cube".to_string(),
        path: PATH.to_string(),
        scale: 0.1,
        ..ModelConfig::default()
    }
}

fn harness() -> Harness {
    init_logger();
    Harness::new(sample_assets(&[PATH]))
}

fn spawn(h: &mut Harness, config: ModelConfig) -> ModelEffect {
    let anchor = h.anchor;
    ModelEffect::new(config, &mut h.scene, anchor)
}

/// Polls until the effect leaves `Loading` (or reports a failure).
fn settle(h: &mut Harness, model: &mut ModelEffect) {
    let mut pair = (h, model);
    wait_until(
        &mut pair,
        |(h, m)| {
            m.poll_ready(&mut h.ctx());
        },
        |(_, m)| m.state() != EffectState::Loading || m.is_failed(),
    );
}

fn loaded(config: ModelConfig) -> (Harness, ModelEffect) {
    let mut h = harness();
    let mut model = spawn(&mut h, config);
    model.create(&mut h.ctx()).unwrap();
    settle(&mut h, &mut model);
    assert_eq!(model.state(), EffectState::Active);
    (h, model)
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn load_completion_resolves_once_content_is_built() {
    let mut h = harness();
    let mut model = spawn(&mut h, cube_config());

    let completion = model.load(&mut h.ctx(), Vec3::new(0.1, 0.0, 0.0));
    assert_eq!(model.state(), EffectState::Loading);
    settle(&mut h, &mut model);

    assert!(pollster::block_on(completion).is_ok());
    assert_eq!(model.state(), EffectState::Active);
    assert!(!model.mixer().is_empty());
    let root = h.scene.get_node(model.scene_root()).unwrap();
    assert!(approx(root.transform.position.x, 0.1));
}

#[test]
fn concurrent_loads_share_one_request() {
    let mut h = harness();
    let mut model = spawn(&mut h, cube_config());

    let first = model.load(&mut h.ctx(), Vec3::ZERO);
    let second = model.load(&mut h.ctx(), Vec3::ZERO);
    settle(&mut h, &mut model);

    assert!(pollster::block_on(first).is_ok());
    assert!(pollster::block_on(second).is_ok());
    // One content subtree: root -> content -> Body -> Head.
    assert_eq!(h.scene.subtree(model.scene_root()).len(), 4);
}

#[test]
fn load_after_activation_resolves_immediately() {
    let (mut h, mut model) = loaded(cube_config());
    let completion = model.load(&mut h.ctx(), Vec3::ZERO);
    assert!(pollster::block_on(completion).is_ok());
}

#[test]
fn failed_load_rejects_and_stays_inert() {
    init_logger();
    let mut h = Harness::new(AssetServer::new(MemoryAssetReader::new(), MemoryModelSource::new()));
    let mut model = spawn(&mut h, cube_config());

    let completion = model.load(&mut h.ctx(), Vec3::ZERO);
    settle(&mut h, &mut model);

    assert!(matches!(pollster::block_on(completion), Err(Error::AssetLoad { .. })));
    assert!(model.is_failed());
    assert_eq!(model.state(), EffectState::Loading);

    // Inert: updates and taps do nothing.
    model.update(&mut h.ctx(), FRAME);
    assert_eq!(model.on_tap(&mut h.ctx()), None);
    assert_eq!(model.head_position(), None);

    let again = model.load(&mut h.ctx(), Vec3::ZERO);
    assert!(pollster::block_on(again).is_err());
}

#[test]
fn completion_stays_pending_until_the_asset_arrives() {
    init_logger();
    let (open, models) = GatedModelSource::new(sample_model());
    let mut h = Harness::new(AssetServer::new(MemoryAssetReader::new(), models));
    let mut model = spawn(&mut h, cube_config());

    let mut completion = model.load(&mut h.ctx(), Vec3::ZERO);
    model.poll_ready(&mut h.ctx());
    assert!((&mut completion).now_or_never().is_none());
    assert_eq!(model.state(), EffectState::Loading);

    open.send(()).unwrap();
    settle(&mut h, &mut model);

    assert!(matches!(completion.now_or_never(), Some(Ok(()))));
    assert_eq!(model.state(), EffectState::Active);
}

#[test]
fn dispose_during_load_cancels_and_ignores_late_result() {
    init_logger();
    let (open, models) = GatedModelSource::new(sample_model());
    let mut h = Harness::new(AssetServer::new(MemoryAssetReader::new(), models));
    let mut model = spawn(&mut h, cube_config());
    let root = model.scene_root();

    let completion = model.load(&mut h.ctx(), Vec3::ZERO);
    model.dispose(&mut h.ctx());
    assert!(matches!(pollster::block_on(completion), Err(Error::Cancelled)));

    open.send(()).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(20));
    model.poll_ready(&mut h.ctx());

    assert_eq!(model.state(), EffectState::Disposed);
    assert!(!h.scene.contains(root));
    assert_eq!(h.assets.resource_counts().total(), 0);

    let late = model.load(&mut h.ctx(), Vec3::ZERO);
    assert!(matches!(pollster::block_on(late), Err(Error::Cancelled)));
}

// ============================================================================
// Clips
// ============================================================================

#[test]
fn named_clip_is_selected() {
    let config = ModelConfig {
        primary_clip: Some("Wave".to_string()),
        ..cube_config()
    };
    let (_h, model) = loaded(config);
    let actions = model.mixer().actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].clip().name, "Wave");
}

#[test]
fn missing_clip_falls_back_to_first() {
    let config = ModelConfig {
        primary_clip: Some("Backflip".to_string()),
        ..cube_config()
    };
    let (_h, model) = loaded(config);
    let actions = model.mixer().actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].clip().name, "Dance");
}

#[test]
fn play_all_clips_loops_every_clip() {
    let config = ModelConfig {
        play_all_clips: true,
        ..cube_config()
    };
    let (_h, model) = loaded(config);
    assert_eq!(model.mixer().actions().len(), 2);
}

#[test]
fn animation_moves_bound_nodes() {
    let (mut h, mut model) = loaded(cube_config());
    let head = h.scene.find_node_by_name(model.scene_root(), "Head").unwrap();

    for _ in 0..30 {
        model.update(&mut h.ctx(), FRAME);
    }
    let y = h.scene.get_node(head).unwrap().transform.position.y;
    assert!(y > 0.6 && y < 0.8, "head y {y}");
}

// ============================================================================
// Blink
// ============================================================================

#[test]
fn blink_drives_the_named_morph_weight() {
    let config = ModelConfig {
        blink: Some(BlinkConfig {
            interval_min: 0.1,
            interval_max: 0.1,
            ..BlinkConfig::default()
        }),
        ..cube_config()
    };
    let (mut h, mut model) = loaded(config);
    assert!(model.is_blinking_enabled());
    let body = h.scene.find_node_by_name(model.scene_root(), "Body").unwrap();

    let mut peak: f32 = 0.0;
    for _ in 0..30 {
        model.update(&mut h.ctx(), FRAME);
        let weights = &h.scene.get_node(body).unwrap().mesh().unwrap().morph_weights;
        assert!(approx(weights[0], 0.0), "other morphs untouched");
        assert!((0.0..=1.0).contains(&weights[1]));
        peak = peak.max(weights[1]);
    }
    assert!(peak > 0.9, "blink never closed: {peak}");
}

#[test]
fn missing_blink_morph_disables_blinking() {
    let config = ModelConfig {
        blink: Some(BlinkConfig {
            morph_target: "Wink".to_string(),
            ..BlinkConfig::default()
        }),
        ..cube_config()
    };
    let (mut h, mut model) = loaded(config);
    assert!(!model.is_blinking_enabled());
    model.update(&mut h.ctx(), FRAME);
    assert_eq!(model.state(), EffectState::Active);
}

// ============================================================================
// Motion & interaction
// ============================================================================

#[test]
fn toss_rises_then_settles_back() {
    let config = ModelConfig {
        interactive: Some(0),
        tossable: true,
        ..cube_config()
    };
    let (mut h, mut model) = loaded(config);
    let root = model.scene_root();

    assert_eq!(model.on_tap(&mut h.ctx()), Some(Reaction::Toss));
    assert_eq!(model.on_tap(&mut h.ctx()), None, "no re-toss mid-flight");

    let mut highest: f32 = 0.0;
    for _ in 0..120 {
        model.update(&mut h.ctx(), FRAME);
        highest = highest.max(h.scene.get_node(root).unwrap().transform.position.y);
    }
    assert!(highest > 0.35, "peak {highest}");
    assert!(!model.is_tossing());
    assert!(approx(h.scene.get_node(root).unwrap().transform.position.y, 0.0));
    assert_eq!(model.on_tap(&mut h.ctx()), Some(Reaction::Toss));
}

#[test]
fn spin_holds_while_airborne() {
    let config = ModelConfig {
        interactive: Some(0),
        tossable: true,
        spin_rate: 1.0,
        ..cube_config()
    };
    let (mut h, mut model) = loaded(config);

    for _ in 0..30 {
        model.update(&mut h.ctx(), FRAME);
    }
    let before_toss = model.spin_angle();
    assert!(approx(before_toss, 0.5), "idle spin {before_toss}");

    assert_eq!(model.on_tap(&mut h.ctx()), Some(Reaction::Toss));
    let mut airborne_frames = 0;
    while model.is_tossing() {
        model.update(&mut h.ctx(), FRAME);
        assert_eq!(model.spin_angle(), before_toss);
        airborne_frames += 1;
        assert!(airborne_frames < 600, "toss never settled");
    }
    assert!(airborne_frames > 1);

    model.update(&mut h.ctx(), FRAME);
    assert!(approx(model.spin_angle(), before_toss + FRAME));
}

#[test]
fn non_tossable_models_do_not_react() {
    let config = ModelConfig {
        interactive: Some(1),
        ..cube_config()
    };
    let (mut h, mut model) = loaded(config);
    assert_eq!(model.interaction_priority(), Some(1));
    assert_eq!(model.on_tap(&mut h.ctx()), None);
}

#[test]
fn bob_stays_within_amplitude() {
    let config = ModelConfig {
        bob: Some(Oscillation {
            axis: Vec3::Z,
            amplitude: 0.008,
            frequency: 2.0,
        }),
        ..cube_config()
    };
    let (mut h, mut model) = loaded(config);
    let root = model.scene_root();

    for _ in 0..200 {
        model.update(&mut h.ctx(), FRAME);
        let z = h.scene.get_node(root).unwrap().transform.position.z;
        assert!(z.abs() <= 0.008 + 1e-6);
    }
}

#[test]
fn hit_test_uses_scaled_bounds() {
    let (h, model) = loaded(cube_config());

    let through = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z);
    let t = model.hit_test(&h.scene, &through).expect("centre ray should hit");
    assert!(approx(t, 0.95), "t {t}");

    let beside = Ray::new(Vec3::new(0.2, 0.0, 1.0), Vec3::NEG_Z);
    assert_eq!(model.hit_test(&h.scene, &beside), None);
}

#[test]
fn head_position_tracks_bounds_and_clearance() {
    let config = ModelConfig {
        position: Vec3::new(0.1, 0.0, 0.0),
        head_clearance: 0.02,
        ..cube_config()
    };
    let (_h, model) = loaded(config);
    let head = model.head_position().unwrap();
    assert!(approx(head.x, 0.1));
    assert!(approx(head.y, 0.07));
}

// ============================================================================
// Disposal
// ============================================================================

#[test]
fn dispose_releases_meshes_and_is_idempotent() {
    let (mut h, mut model) = loaded(cube_config());
    assert!(h.assets.resource_counts().total() > 0);

    model.dispose(&mut h.ctx());
    model.dispose(&mut h.ctx());

    assert_eq!(model.state(), EffectState::Disposed);
    assert_eq!(h.assets.resource_counts().total(), 0);
    assert!(!h.scene.contains(model.scene_root()));
    assert!(model.mixer().is_empty());
}
