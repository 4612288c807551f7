//! Scene Orchestrator Tests
//!
//! Tests for:
//! - Mount lifecycle: Initializing -> Running -> Disposed
//! - One-shot reactions to target acquisition (audio + fireworks sequence)
//! - Audio pause/resume on loss and re-acquisition
//! - Teardown with loads in flight, resource accounting
//! - Tap routing by interaction priority
//! - Render context exclusivity and MountSlot remounting
//! - Tracking start failure

mod common;

use glam::Vec3;

use arfx::assets::{AssetServer, MemoryAssetReader};
use arfx::config::{BannerConfig, FireworksConfig, ModelConfig, SceneConfig};
use arfx::effects::{EffectState, Reaction};
use arfx::errors::Error;
use arfx::host::{PointerEvent, TrackingEvent};
use arfx::orchestrator::{MountSlot, MountState, Orchestrator, RenderContext};
use arfx::Effect;

use common::{
    FRAME, GatedModelSource, MockAudio, MockHost, approx, init_logger, sample_assets, sample_model, tick_until,
};

const CUBE: &str = "/cube.glb";

fn cube(name: &str) -> ModelConfig {
    ModelConfig {
        name: name.to_string(),
        path: CUBE.to_string(),
        scale: 0.1,
        ..ModelConfig::default()
    }
}

fn banner_at(position: Vec3) -> BannerConfig {
    BannerConfig {
        logo_path: None,
        position,
        ..BannerConfig::default()
    }
}

fn scene_config(models: Vec<ModelConfig>) -> SceneConfig {
    SceneConfig {
        banner: Some(banner_at(Vec3::new(0.0, 0.3, 0.0))),
        fireworks: Some(FireworksConfig::default()),
        models,
        fireworks_on_found: true,
        rng_seed: Some(42),
    }
}

type TestOrchestrator = Orchestrator<MockHost, MockAudio>;

fn mount(config: SceneConfig) -> TestOrchestrator {
    init_logger();
    Orchestrator::mount(config, MockHost::default(), MockAudio::default(), sample_assets(&[CUBE])).expect("mount failed")
}

fn running(config: SceneConfig) -> TestOrchestrator {
    let mut orchestrator = mount(config);
    tick_until(&mut orchestrator, |o| {
        o.state() == MountState::Running && o.effects().iter().all(|e| e.state() == EffectState::Active)
    });
    orchestrator
}

fn tick_for(orchestrator: &mut TestOrchestrator, seconds: f32) {
    let frames = (seconds / FRAME).ceil() as usize;
    for _ in 0..frames {
        orchestrator.tick(FRAME).expect("tick failed");
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn mount_builds_effects_in_order_and_starts_tracking() {
    let orchestrator = mount(scene_config(vec![cube("chibi"), cube("cap")]));

    assert_eq!(orchestrator.state(), MountState::Initializing);
    assert_eq!(orchestrator.host().starts, 1);
    assert!(orchestrator.host().has_listener());

    let names: Vec<&str> = orchestrator.effects().iter().map(|e| e.name()).collect();
    assert_eq!(names, ["banner", "fireworks", "chibi", "cap"]);
    assert_eq!(orchestrator.model("chibi").unwrap().state(), EffectState::Loading);
    assert_eq!(orchestrator.banner().unwrap().state(), EffectState::Active);
}

#[test]
fn first_tick_after_start_runs_the_frame() {
    let mut orchestrator = mount(scene_config(vec![]));
    let report = orchestrator.tick(FRAME).unwrap();

    assert_eq!(report.state, MountState::Running);
    assert_eq!(report.frame, 1);
    assert_eq!(orchestrator.host().renders, 1);
}

#[test]
fn no_frames_render_while_tracking_is_starting() {
    init_logger();
    let (open, host) = MockHost::gated();
    let mut orchestrator =
        Orchestrator::mount(scene_config(vec![]), host, MockAudio::default(), sample_assets(&[])).unwrap();

    for _ in 0..5 {
        let report = orchestrator.tick(FRAME).unwrap();
        assert_eq!(report.state, MountState::Initializing);
    }
    assert_eq!(orchestrator.host().renders, 0);

    open.send(()).unwrap();
    tick_until(&mut orchestrator, |o| o.state() == MountState::Running);
    assert!(orchestrator.host().renders >= 1);
}

#[test]
fn loaded_models_become_active() {
    let orchestrator = running(scene_config(vec![cube("chibi")]));
    let report_state = orchestrator.model("chibi").unwrap().state();
    assert_eq!(report_state, EffectState::Active);
    assert!(orchestrator.model("chibi").unwrap().bounds().is_some());
}

#[test]
fn failed_model_stays_inert_without_affecting_others() {
    init_logger();
    let mut config = scene_config(vec![cube("chibi")]);
    config.models[0].path = "/missing.glb".to_string();
    let mut orchestrator =
        Orchestrator::mount(config, MockHost::default(), MockAudio::default(), sample_assets(&[CUBE])).unwrap();

    tick_until(&mut orchestrator, |o| o.model("chibi").is_some_and(|m| m.is_failed()));
    tick_for(&mut orchestrator, 0.1);

    assert_eq!(orchestrator.state(), MountState::Running);
    assert_eq!(orchestrator.model("chibi").unwrap().state(), EffectState::Loading);
    assert_eq!(orchestrator.fireworks().unwrap().state(), EffectState::Active);
}

#[test]
fn invalid_config_is_rejected_before_claiming_the_context() {
    init_logger();
    let mut config = scene_config(vec![]);
    config.fireworks.as_mut().unwrap().drag = 0.0;

    let result = Orchestrator::mount(config, MockHost::default(), MockAudio::default(), sample_assets(&[]));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
    assert_eq!(RenderContext::active_scene(), None);
}

// ============================================================================
// Tracking events
// ============================================================================

#[test]
fn target_found_fires_audio_and_sequence_once() {
    let mut orchestrator = running(scene_config(vec![]));

    assert!(orchestrator.host().emit(TrackingEvent::Found));
    orchestrator.tick(FRAME).unwrap();

    assert!(orchestrator.has_fired());
    assert_eq!(orchestrator.audio().plays, 1);
    let stats = orchestrator.fireworks().unwrap().stats();
    assert_eq!(stats.sequences, 1);

    tick_for(&mut orchestrator, 3.0);
    assert_eq!(orchestrator.fireworks().unwrap().stats().launches, 5);
}

#[test]
fn repeated_found_events_do_not_refire() {
    let mut orchestrator = running(scene_config(vec![]));

    orchestrator.host().emit(TrackingEvent::Found);
    orchestrator.host().emit(TrackingEvent::Found);
    orchestrator.tick(FRAME).unwrap();
    orchestrator.host().emit(TrackingEvent::Found);
    orchestrator.tick(FRAME).unwrap();

    assert_eq!(orchestrator.fireworks().unwrap().stats().sequences, 1);
    assert_eq!(orchestrator.audio().plays, 1);
}

#[test]
fn lost_pauses_and_refound_resumes_audio() {
    let mut orchestrator = running(scene_config(vec![]));

    orchestrator.host().emit(TrackingEvent::Found);
    orchestrator.tick(FRAME).unwrap();
    orchestrator.host().emit(TrackingEvent::Lost);
    orchestrator.tick(FRAME).unwrap();

    assert!(!orchestrator.is_target_visible());
    assert_eq!(orchestrator.audio().pauses, 1);

    orchestrator.host().emit(TrackingEvent::Found);
    orchestrator.tick(FRAME).unwrap();

    assert_eq!(orchestrator.audio().plays, 2);
    assert_eq!(orchestrator.fireworks().unwrap().stats().sequences, 1);
}

#[test]
fn lost_before_any_found_is_ignored() {
    let mut orchestrator = running(scene_config(vec![]));

    orchestrator.host().emit(TrackingEvent::Lost);
    orchestrator.tick(FRAME).unwrap();

    assert_eq!(orchestrator.audio().pauses, 0);
    assert!(!orchestrator.has_fired());
}

#[test]
fn rejected_playback_does_not_stop_the_scene() {
    init_logger();
    let audio = MockAudio {
        reject: true,
        ..MockAudio::default()
    };
    let mut orchestrator =
        Orchestrator::mount(scene_config(vec![]), MockHost::default(), audio, sample_assets(&[])).unwrap();
    orchestrator.tick(FRAME).unwrap();

    orchestrator.host().emit(TrackingEvent::Found);
    orchestrator.tick(FRAME).unwrap();
    orchestrator.tick(FRAME).unwrap();

    assert_eq!(orchestrator.state(), MountState::Running);
    assert_eq!(orchestrator.fireworks().unwrap().stats().sequences, 1);
}

#[test]
fn sequence_can_be_disabled() {
    let mut config = scene_config(vec![]);
    config.fireworks_on_found = false;
    let mut orchestrator = running(config);

    orchestrator.host().emit(TrackingEvent::Found);
    orchestrator.tick(FRAME).unwrap();

    assert_eq!(orchestrator.audio().plays, 1);
    assert_eq!(orchestrator.fireworks().unwrap().stats().sequences, 0);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn unmount_with_load_in_flight_leaves_nothing_behind() {
    init_logger();
    let (open, models) = GatedModelSource::new(sample_model());
    let assets = AssetServer::new(MemoryAssetReader::new(), models);
    let mut orchestrator =
        Orchestrator::mount(scene_config(vec![cube("chibi")]), MockHost::default(), MockAudio::default(), assets)
            .unwrap();
    orchestrator.tick(FRAME).unwrap();
    assert_eq!(orchestrator.model("chibi").unwrap().state(), EffectState::Loading);

    orchestrator.unmount();
    open.send(()).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(20));
    orchestrator.tick(FRAME).unwrap();

    assert_eq!(orchestrator.state(), MountState::Disposed);
    assert!(orchestrator.effects().iter().all(|e| e.state() == EffectState::Disposed));
    assert_eq!(orchestrator.scene().node_count(), 0);
    assert_eq!(orchestrator.resource_counts().total(), 0);
}

#[test]
fn unmount_releases_host_and_listener() {
    let mut orchestrator = running(scene_config(vec![cube("chibi")]));
    orchestrator.unmount();

    assert_eq!(orchestrator.host().stops, 1);
    assert!(!orchestrator.host().has_listener());
    assert_eq!(RenderContext::active_scene(), None);

    // Idempotent.
    orchestrator.unmount();
    assert_eq!(orchestrator.host().stops, 1);
}

#[test]
fn resources_return_to_zero_after_fireworks() {
    let mut orchestrator = running(scene_config(vec![cube("chibi")]));
    orchestrator.host().emit(TrackingEvent::Found);
    tick_for(&mut orchestrator, 1.5);
    assert!(orchestrator.fireworks().unwrap().live_particles() > 0);

    orchestrator.unmount();
    assert_eq!(orchestrator.resource_counts().total(), 0);
    assert_eq!(orchestrator.scene().node_count(), 0);
}

#[test]
fn ticks_after_dispose_are_no_ops() {
    let mut orchestrator = running(scene_config(vec![]));
    orchestrator.unmount();
    let renders = orchestrator.host().renders;

    let report = orchestrator.tick(FRAME).unwrap();
    assert_eq!(report.state, MountState::Disposed);
    assert_eq!(orchestrator.host().renders, renders);
}

#[test]
fn dropping_the_orchestrator_frees_the_render_context() {
    let orchestrator = mount(scene_config(vec![]));
    assert!(RenderContext::active_scene().is_some());
    drop(orchestrator);
    assert_eq!(RenderContext::active_scene(), None);
}

// ============================================================================
// Tracking start failure
// ============================================================================

#[test]
fn tracking_start_failure_tears_down() {
    init_logger();
    let mut orchestrator = Orchestrator::mount(
        scene_config(vec![cube("chibi")]),
        MockHost::failing("camera permission denied"),
        MockAudio::default(),
        sample_assets(&[CUBE]),
    )
    .unwrap();

    let error = orchestrator.tick(FRAME).unwrap_err();
    assert!(matches!(error, Error::TrackingStartFailure(ref reason) if reason.contains("permission")));
    assert_eq!(orchestrator.state(), MountState::Disposed);
    assert_eq!(orchestrator.host().stops, 1);
    assert_eq!(orchestrator.host().renders, 0);
    assert_eq!(RenderContext::active_scene(), None);
}

// ============================================================================
// Render context
// ============================================================================

#[test]
fn second_mount_on_same_thread_fails() {
    let mut first = mount(scene_config(vec![]));
    let second = Orchestrator::mount(scene_config(vec![]), MockHost::default(), MockAudio::default(), sample_assets(&[]));
    assert!(matches!(second, Err(Error::SceneAlreadyMounted)));

    first.unmount();
    let third = Orchestrator::mount(scene_config(vec![]), MockHost::default(), MockAudio::default(), sample_assets(&[]));
    assert!(third.is_ok());
}

#[test]
fn mount_slot_disposes_previous_overlay() {
    init_logger();
    let mut slot: MountSlot<MockHost, MockAudio> = MountSlot::new();

    let first_id = slot
        .mount(scene_config(vec![]), MockHost::default(), MockAudio::default(), sample_assets(&[]))
        .unwrap()
        .scene()
        .id;
    let second_id = slot
        .mount(scene_config(vec![]), MockHost::default(), MockAudio::default(), sample_assets(&[]))
        .unwrap()
        .scene()
        .id;

    assert_ne!(first_id, second_id);
    assert_eq!(RenderContext::active_scene(), Some(second_id));

    let previous = slot.unmount().unwrap();
    assert_eq!(previous.state(), MountState::Disposed);
    assert!(!slot.is_mounted());
    assert_eq!(RenderContext::active_scene(), None);
}

// ============================================================================
// Input
// ============================================================================

#[test]
fn banner_tap_launches_exactly_one_rocket() {
    let mut orchestrator = running(scene_config(vec![cube("chibi")]));
    let target = orchestrator.host().ndc_of(Vec3::new(0.0, 0.3, 0.0));

    let reaction = orchestrator.tap(PointerEvent { ndc: target });

    match reaction {
        Some(Reaction::LaunchBurst { origin }) => {
            assert!(approx(origin.y, 0.0), "origin {origin}");
        }
        other => panic!("expected a burst, got {other:?}"),
    }
    let stats = orchestrator.fireworks().unwrap().stats();
    assert_eq!(stats.launches, 1);
    assert_eq!(stats.live_rockets, 1);
    assert_eq!(stats.sequences, 0);
}

#[test]
fn lower_priority_value_wins_overlapping_taps() {
    let mut cap = cube("cap");
    cap.interactive = Some(0);
    cap.tossable = true;
    let mut chibi = cube("chibi");
    chibi.interactive = Some(1);
    let mut orchestrator = running(scene_config(vec![chibi, cap]));

    let reaction = orchestrator.tap(PointerEvent::from_ndc(0.0, 0.0));

    assert_eq!(reaction, Some(Reaction::Toss));
    assert!(orchestrator.model("cap").unwrap().is_tossing());
    assert!(!orchestrator.model("chibi").unwrap().is_tossing());
}

#[test]
fn first_hit_consumes_the_tap_even_without_reaction() {
    let mut chibi = cube("chibi");
    chibi.interactive = Some(1);
    let mut config = scene_config(vec![chibi]);
    config.banner = Some(banner_at(Vec3::new(0.0, 0.0, -0.2)));
    let mut orchestrator = running(config);

    let reaction = orchestrator.tap(PointerEvent::from_ndc(0.0, 0.0));

    assert_eq!(reaction, None);
    assert_eq!(orchestrator.fireworks().unwrap().stats().launches, 0);
}

#[test]
fn taps_outside_every_effect_do_nothing() {
    let mut orchestrator = running(scene_config(vec![cube("chibi")]));
    let reaction = orchestrator.tap(PointerEvent::from_ndc(0.95, -0.95));
    assert_eq!(reaction, None);
}

#[test]
fn taps_are_ignored_before_running() {
    init_logger();
    let (_open, host) = MockHost::gated();
    let mut orchestrator =
        Orchestrator::mount(scene_config(vec![]), host, MockAudio::default(), sample_assets(&[])).unwrap();
    orchestrator.tick(FRAME).unwrap();

    let target = orchestrator.host().ndc_of(Vec3::new(0.0, 0.3, 0.0));
    assert_eq!(orchestrator.tap(PointerEvent { ndc: target }), None);
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn banner_follows_the_configured_model() {
    let mut chibi = cube("chibi");
    chibi.head_clearance = 0.05;
    let mut config = scene_config(vec![chibi]);
    config.banner.as_mut().unwrap().follow_model = Some("chibi".to_string());
    let mut orchestrator = running(config);
    orchestrator.tick(FRAME).unwrap();

    // Unit cube scaled by 0.1: top face at 0.05, plus the clearance.
    let rest = orchestrator.banner().unwrap().rest_position();
    assert!(approx(rest.y, 0.1), "rest {rest}");
    assert!(approx(rest.x, 0.0));
}

#[test]
fn resize_is_forwarded_to_the_host() {
    let mut orchestrator = mount(scene_config(vec![]));
    orchestrator.resize(800, 600);
    assert_eq!(orchestrator.host().resizes, [(800, 600)]);
}
