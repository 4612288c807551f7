#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod config;
pub mod effects;
pub mod errors;
pub mod host;
pub mod orchestrator;
pub mod resources;
pub mod scene;
pub mod utils;

pub use animation::{AnimationAction, AnimationClip, AnimationMixer, Binder, LoopMode};
pub use assets::{AssetServer, ResourceCounts};
pub use config::{BannerConfig, FireworksConfig, ModelConfig, SceneConfig};
pub use effects::{BannerEffect, Effect, EffectState, EffectVariant, Fireworks, ModelEffect, Reaction};
pub use errors::{Error, Result};
pub use host::{AudioPlayer, PointerEvent, SilentAudio, TrackingEvent, TrackingHost};
pub use orchestrator::{FrameReport, MountSlot, MountState, Orchestrator, RenderContext};
pub use resources::{Geometry, Material, Texture};
pub use scene::{Camera, Light, Node, Scene};
pub use utils::Timer;
