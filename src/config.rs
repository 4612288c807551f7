//! Scene configuration.
//!
//! Tuning values live as named constants grouped per effect. [`SceneConfig`]
//! collects them into a serde-deserializable description of one overlay; its
//! `Default` reproduces the stock graduation scene.
//!
//! ```rust,ignore
//! let config = SceneConfig::from_json_str(r#"{ "rng_seed": 7, "models": [] }"#)?;
//! ```

use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// "Up" on the target image. Rockets rise and particles fall along this axis.
pub const ANCHOR_UP: Vec3 = Vec3::Y;

/// Host cadence the per-tick constants were tuned for.
pub const REFERENCE_HZ: f32 = 60.0;

/// Longest frame step fed into simulations (a stalled host must not teleport
/// particles).
pub const MAX_FRAME_DT: f32 = 0.1;

/// Scene lighting.
pub mod lighting {
    pub const SKY_COLOR: u32 = 0xffffff;
    pub const GROUND_COLOR: u32 = 0x444444;
    pub const INTENSITY: f32 = 1.0;
}

/// Particle system tuning, expressed per 60 Hz tick.
pub mod fireworks {
    pub const ASCENT_STEP: f32 = 0.012;
    pub const ASCENT_HEIGHT: f32 = 0.35;
    pub const ASCENT_JITTER: f32 = 0.1;
    pub const ROCKET_COLOR: u32 = 0xffff00;
    pub const ROCKET_SCALE: f32 = 0.02;

    pub const BULK_COUNT: usize = 120;
    pub const BULK_SCALE: f32 = 0.010;
    pub const CORE_COUNT: usize = 30;
    pub const CORE_SCALE: f32 = 0.015;
    pub const CORE_COLOR: u32 = 0xffffff;

    pub const SPEED_MIN: f32 = 0.006;
    pub const SPEED_JITTER: f32 = 0.004;
    pub const LIFE_MIN: f32 = 0.75;
    pub const LIFE_MAX: f32 = 1.0;
    pub const LIFE_DECAY: f32 = 0.015;
    pub const GRAVITY: f32 = 0.0002;
    pub const DRAG: f32 = 0.985;
    pub const SHRINK: f32 = 0.99;

    pub const SPRITE_TEXTURE_SIZE: u32 = 32;

    /// Launch choreography: `(delay seconds, x offset, y offset, color)`.
    pub const SEQUENCE: [(f32, f32, f32, u32); 5] = [
        (0.0, 0.0, -0.30, 0xff0000),
        (0.7, -0.05, -0.25, 0xffd700),
        (1.4, 0.10, -0.30, 0x00ff00),
        (2.1, -0.15, -0.20, 0x00ffff),
        (2.8, 0.20, -0.28, 0xff00ff),
    ];
}

/// Banner rasterization and placement.
pub mod banner {
    pub const CANVAS_WIDTH: u32 = 700;
    pub const CANVAS_HEIGHT: u32 = 180;
    pub const BORDER_INSET: u32 = 8;
    pub const BORDER_WIDTH: u32 = 4;
    pub const LOGO_SIZE: u32 = 65;
    pub const LOGO_X: u32 = 25;
    pub const TEXT_CENTER_X: u32 = 400;
    pub const TITLE_Y: u32 = 42;
    pub const HEADLINE_Y: u32 = 100;
    pub const SUBTITLE_Y: u32 = 150;
    pub const RULE_Y: [u32; 2] = [55, 115];
    pub const RULE_X: (u32, u32) = (150, 650);

    pub const WIDTH: f32 = 0.95;
    pub const HEIGHT: f32 = 0.24;
    pub const POSITION: [f32; 3] = [0.0, 0.45, 0.05];
    pub const FLOAT_AMPLITUDE: f32 = 0.006;
    pub const FLOAT_FREQUENCY: f32 = 1.5;

    /// Interactive effects are tested in ascending priority; the banner
    /// always goes last.
    pub const INTERACTION_PRIORITY: u8 = u8::MAX;

    /// A tap on the banner launches a rocket from this far below its center.
    pub const TAP_LAUNCH_DROP: f32 = 0.3;
}

/// Model motion.
pub mod model {
    pub const TOSS_RATE: f32 = 1.2;
    pub const TOSS_HEIGHT: f32 = 0.4;
    pub const TOSS_SETTLE_END: f32 = 1.8;
    pub const TOSS_SETTLE_HEIGHT: f32 = 0.15;
    pub const TOSS_SETTLE_DRIFT: f32 = 0.05;
    pub const TOSS_TUMBLE_Z: f32 = 10.0;
    pub const TOSS_TUMBLE_X: f32 = 5.0;
    pub const TOSS_ROTATION_DAMPING: f32 = 0.95;

    pub const BLINK_INTERVAL_MIN: f32 = 2.0;
    pub const BLINK_INTERVAL_MAX: f32 = 4.0;
    pub const BLINK_CLOSE_DURATION: f32 = 0.1;
    pub const BLINK_OPEN_DURATION: f32 = 0.1;
}

// ============================================================================
// Serializable configuration
// ============================================================================

/// One scheduled fireworks launch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchEntry {
    /// Offset from the sequence center, in anchor space.
    pub offset: Vec3,
    /// `0xRRGGBB`
    pub color: u32,
    /// Seconds after the sequence starts.
    pub delay: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireworksConfig {
    pub ascent_step: f32,
    pub ascent_height: f32,
    pub ascent_jitter: f32,
    pub rocket_color: u32,
    pub rocket_scale: f32,
    pub bulk_count: usize,
    pub bulk_scale: f32,
    pub core_count: usize,
    pub core_scale: f32,
    pub core_color: u32,
    pub speed_min: f32,
    pub speed_jitter: f32,
    pub life_min: f32,
    pub life_max: f32,
    pub life_decay: f32,
    pub gravity: f32,
    pub drag: f32,
    pub shrink: f32,
    pub sequence: Vec<LaunchEntry>,
}

impl Default for FireworksConfig {
    fn default() -> Self {
        use fireworks as f;
        Self {
            ascent_step: f::ASCENT_STEP,
            ascent_height: f::ASCENT_HEIGHT,
            ascent_jitter: f::ASCENT_JITTER,
            rocket_color: f::ROCKET_COLOR,
            rocket_scale: f::ROCKET_SCALE,
            bulk_count: f::BULK_COUNT,
            bulk_scale: f::BULK_SCALE,
            core_count: f::CORE_COUNT,
            core_scale: f::CORE_SCALE,
            core_color: f::CORE_COLOR,
            speed_min: f::SPEED_MIN,
            speed_jitter: f::SPEED_JITTER,
            life_min: f::LIFE_MIN,
            life_max: f::LIFE_MAX,
            life_decay: f::LIFE_DECAY,
            gravity: f::GRAVITY,
            drag: f::DRAG,
            shrink: f::SHRINK,
            sequence: f::SEQUENCE
                .iter()
                .map(|&(delay, x, y, color)| LaunchEntry {
                    offset: Vec3::new(x, y, 0.0),
                    color,
                    delay,
                })
                .collect(),
        }
    }
}

impl FireworksConfig {
    /// Total particles one explosion spawns.
    #[must_use]
    pub fn particles_per_burst(&self) -> usize {
        self.bulk_count + self.core_count
    }
}

/// Banner colors, `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerPalette {
    pub background: u32,
    pub border: u32,
    pub title: u32,
    pub headline: u32,
    pub subtitle: u32,
}

impl Default for BannerPalette {
    fn default() -> Self {
        Self {
            background: 0x5A0000,
            border: 0xC9A227,
            title: 0xC9A227,
            headline: 0xF0D060,
            subtitle: 0xE0D0B0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    pub title: String,
    pub headline: String,
    pub subtitle: String,
    pub logo_path: Option<String>,
    pub size: Vec2,
    pub position: Vec3,
    pub float_amplitude: f32,
    pub float_frequency: f32,
    /// Name of a model whose head position the banner follows.
    pub follow_model: Option<String>,
    pub palette: BannerPalette,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            title: "TRƯỜNG ĐẠI HỌC TRÀ VINH".to_string(),
            headline: "CHÚC MỪNG TỐT NGHIỆP".to_string(),
            subtitle: "Chúc bạn thành công trên hành trình phía trước".to_string(),
            logo_path: Some("/logotvu.png".to_string()),
            size: Vec2::new(banner::WIDTH, banner::HEIGHT),
            position: Vec3::from_array(banner::POSITION),
            float_amplitude: banner::FLOAT_AMPLITUDE,
            float_frequency: banner::FLOAT_FREQUENCY,
            follow_model: None,
            palette: BannerPalette::default(),
        }
    }
}

/// Sinusoidal offset `sin(t * frequency) * amplitude` along `axis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillation {
    pub axis: Vec3,
    pub amplitude: f32,
    /// Radians per second.
    pub frequency: f32,
}

/// Periodic blend-shape blink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    pub morph_target: String,
    pub interval_min: f32,
    pub interval_max: f32,
    pub close_duration: f32,
    pub open_duration: f32,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            morph_target: "Blink".to_string(),
            interval_min: model::BLINK_INTERVAL_MIN,
            interval_max: model::BLINK_INTERVAL_MAX,
            close_duration: model::BLINK_CLOSE_DURATION,
            open_duration: model::BLINK_OPEN_DURATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub path: String,
    pub position: Vec3,
    pub scale: f32,
    /// XYZ Euler angles, radians.
    pub rotation_euler: Vec3,
    /// Clip to loop; the first clip is used when absent or missing.
    pub primary_clip: Option<String>,
    /// Loop every clip instead of a single primary one.
    pub play_all_clips: bool,
    pub bob: Option<Oscillation>,
    /// Radians per second around the anchor up axis.
    pub spin_rate: f32,
    /// Hit-test priority; lower is tested first. `None` = not tappable.
    pub interactive: Option<u8>,
    pub tossable: bool,
    pub blink: Option<BlinkConfig>,
    /// Distance above the bounding box top reported as the head position.
    pub head_clearance: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            path: String::new(),
            position: Vec3::ZERO,
            scale: 1.0,
            rotation_euler: Vec3::ZERO,
            primary_clip: None,
            play_all_clips: false,
            bob: None,
            spin_rate: 0.0,
            interactive: None,
            tossable: false,
            blink: None,
            head_clearance: 0.0,
        }
    }
}

impl ModelConfig {
    /// Dancing chibi character with a blinking face.
    #[must_use]
    pub fn chibi() -> Self {
        Self {
            name: "chibi".to_string(),
            path: "/models/dancing_character.fbx".to_string(),
            position: Vec3::new(0.0, -0.05, 0.01),
            scale: 0.005,
            rotation_euler: Vec3::new(-std::f32::consts::FRAC_PI_2, std::f32::consts::PI, std::f32::consts::PI),
            interactive: Some(1),
            blink: Some(BlinkConfig::default()),
            head_clearance: 0.005,
            ..Self::default()
        }
    }

    /// Book that loops all of its clips and floats slightly.
    #[must_use]
    pub fn book() -> Self {
        Self {
            name: "book".to_string(),
            path: "/models/animated_book.glb".to_string(),
            position: Vec3::new(0.28, -0.2, 0.05),
            scale: 0.1,
            play_all_clips: true,
            bob: Some(Oscillation {
                axis: Vec3::Z,
                amplitude: 0.008,
                frequency: 2.0,
            }),
            ..Self::default()
        }
    }

    /// Spinning graduation cap that can be tossed with a tap.
    #[must_use]
    pub fn cap() -> Self {
        Self {
            name: "cap".to_string(),
            path: "/models/graduation_cap_with_textures.glb".to_string(),
            position: Vec3::new(-0.28, -0.1, 0.0),
            scale: 0.06,
            bob: Some(Oscillation {
                axis: Vec3::Y,
                amplitude: 0.01,
                frequency: 2.0,
            }),
            spin_rate: 0.8,
            interactive: Some(0),
            tossable: true,
            ..Self::default()
        }
    }
}

/// Complete description of one mounted overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub banner: Option<BannerConfig>,
    pub fireworks: Option<FireworksConfig>,
    pub models: Vec<ModelConfig>,
    /// Launch the fireworks sequence on the first target acquisition.
    pub fireworks_on_found: bool,
    /// Fixed seed for particle randomness; clock-seeded when absent.
    pub rng_seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            banner: Some(BannerConfig::default()),
            fireworks: Some(FireworksConfig::default()),
            models: vec![ModelConfig::chibi(), ModelConfig::book(), ModelConfig::cap()],
            fireworks_on_found: true,
            rng_seed: None,
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Rejects values the effects cannot run with.
    pub fn validate(&self) -> Result<()> {
        if let Some(fw) = &self.fireworks {
            let scalars = [
                ("ascent_step", fw.ascent_step),
                ("ascent_height", fw.ascent_height),
                ("ascent_jitter", fw.ascent_jitter),
                ("rocket_scale", fw.rocket_scale),
                ("bulk_scale", fw.bulk_scale),
                ("core_scale", fw.core_scale),
                ("speed_min", fw.speed_min),
                ("speed_jitter", fw.speed_jitter),
                ("life_decay", fw.life_decay),
                ("gravity", fw.gravity),
            ];
            require_finite("fireworks", &scalars)?;
            if fw.ascent_step <= 0.0 {
                return Err(Error::InvalidConfig("fireworks.ascent_step must be positive".into()));
            }
            for (name, spread) in [("ascent_jitter", fw.ascent_jitter), ("speed_jitter", fw.speed_jitter)] {
                if spread < 0.0 {
                    return Err(Error::InvalidConfig(format!("fireworks.{name} must be >= 0")));
                }
            }
            if fw.life_decay <= 0.0 {
                return Err(Error::InvalidConfig("fireworks.life_decay must be positive".into()));
            }
            if !(0.0 < fw.life_min && fw.life_min <= fw.life_max && fw.life_max <= 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "fireworks life band [{}, {}] must lie within (0, 1]",
                    fw.life_min, fw.life_max
                )));
            }
            for (name, factor) in [("drag", fw.drag), ("shrink", fw.shrink)] {
                if !(0.0 < factor && factor <= 1.0) {
                    return Err(Error::InvalidConfig(format!("fireworks.{name} must lie within (0, 1]")));
                }
            }
            if fw.sequence.iter().any(|e| e.delay < 0.0 || !e.delay.is_finite()) {
                return Err(Error::InvalidConfig("fireworks sequence delays must be finite and >= 0".into()));
            }
        }

        if let Some(banner) = &self.banner {
            require_finite(
                "banner",
                &[
                    ("size.x", banner.size.x),
                    ("size.y", banner.size.y),
                    ("float_amplitude", banner.float_amplitude),
                    ("float_frequency", banner.float_frequency),
                ],
            )?;
            if banner.size.x <= 0.0 || banner.size.y <= 0.0 {
                return Err(Error::InvalidConfig("banner.size must be positive".into()));
            }
            if let Some(target) = &banner.follow_model {
                if !self.models.iter().any(|m| &m.name == target) {
                    return Err(Error::InvalidConfig(format!(
                        "banner.follow_model '{target}' does not name a configured model"
                    )));
                }
            }
        }

        for (i, model) in self.models.iter().enumerate() {
            if model.name.is_empty() {
                return Err(Error::InvalidConfig(format!("models[{i}] has no name")));
            }
            if model.path.is_empty() {
                return Err(Error::InvalidConfig(format!("model '{}' has no path", model.name)));
            }
            if self.models[..i].iter().any(|m| m.name == model.name) {
                return Err(Error::InvalidConfig(format!("duplicate model name '{}'", model.name)));
            }
            require_finite(
                &model.name,
                &[
                    ("scale", model.scale),
                    ("spin_rate", model.spin_rate),
                    ("head_clearance", model.head_clearance),
                ],
            )?;
            if let Some(blink) = &model.blink {
                require_finite(
                    &model.name,
                    &[
                        ("blink.interval_min", blink.interval_min),
                        ("blink.interval_max", blink.interval_max),
                        ("blink.close_duration", blink.close_duration),
                        ("blink.open_duration", blink.open_duration),
                    ],
                )?;
                if blink.interval_min < 0.0 || blink.interval_min > blink.interval_max {
                    return Err(Error::InvalidConfig(format!(
                        "model '{}': blink interval must satisfy 0 <= min <= max",
                        model.name
                    )));
                }
            }
        }

        Ok(())
    }
}

fn require_finite(section: &str, fields: &[(&str, f32)]) -> Result<()> {
    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, value)) => Err(Error::InvalidConfig(format!("{section}.{name} must be finite, got {value}"))),
        None => Ok(()),
    }
}
