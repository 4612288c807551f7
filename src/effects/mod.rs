//! Effects Module
//!
//! Every visual behavior of the overlay implements [`Effect`]:
//!
//! - [`BannerEffect`]: procedurally rasterized congratulation billboard
//! - [`Fireworks`]: rocket + particle burst simulation
//! - [`ModelEffect`]: asynchronously loaded, animated 3D model
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --create--> Loading --poll_ready--> Active --dispose--> Disposed
//!                              |                                           ^
//!                              +----------- (failed: stays inert) ---------+
//! ```
//!
//! Effects own exactly one subtree of the scene, rooted at
//! [`Effect::scene_root`]. That root exists from construction on, so it can
//! be attached to the anchor group before any content has loaded.

pub mod banner;
pub mod fireworks;
pub mod model;
mod raster;

pub use banner::BannerEffect;
pub use fireworks::{Fireworks, FireworksStats};
pub use model::ModelEffect;

use glam::Vec3;
use rand::rngs::StdRng;

use crate::assets::AssetServer;
use crate::errors::Result;
use crate::scene::{NodeHandle, Ray, Scene};

/// Lifecycle state of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectState {
    Uninitialized,
    Loading,
    Active,
    Disposed,
}

/// Everything an effect may touch during a lifecycle call.
pub struct EffectContext<'a> {
    pub scene: &'a mut Scene,
    pub assets: &'a AssetServer,
    pub rng: &'a mut StdRng,
}

/// Follow-up the orchestrator performs after a successful tap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reaction {
    /// The tapped model started its toss.
    Toss,
    /// Launch one firework rocket from `origin` (anchor space).
    LaunchBurst { origin: Vec3 },
}

/// The uniform contract the orchestrator drives.
pub trait Effect {
    fn name(&self) -> &str;

    fn state(&self) -> EffectState;

    /// The effect's exclusively owned attachment point.
    fn scene_root(&self) -> NodeHandle;

    /// Starts initialization. Calling it again is a no-op.
    fn create(&mut self, ctx: &mut EffectContext<'_>) -> Result<()>;

    /// Drives pending asynchronous work; called once per frame while the
    /// effect is `Loading`.
    fn poll_ready(&mut self, _ctx: &mut EffectContext<'_>) -> EffectState {
        self.state()
    }

    /// Advances animation by `dt` seconds. No-op unless `Active`.
    fn update(&mut self, ctx: &mut EffectContext<'_>, dt: f32);

    /// Releases every resource the effect allocated. Idempotent.
    fn dispose(&mut self, ctx: &mut EffectContext<'_>);

    /// Distance along `ray` (anchor space) at which the effect is hit.
    fn hit_test(&self, _scene: &Scene, _ray: &Ray) -> Option<f32> {
        None
    }

    /// `Some` for tappable effects; lower values are tested first.
    fn interaction_priority(&self) -> Option<u8> {
        None
    }

    fn on_tap(&mut self, _ctx: &mut EffectContext<'_>) -> Option<Reaction> {
        None
    }
}

/// Tagged union of every effect the orchestrator can own.
pub enum EffectVariant {
    Banner(BannerEffect),
    Fireworks(Fireworks),
    Model(ModelEffect),
}

macro_rules! delegate {
    ($self:ident, $e:ident => $body:expr) => {
        match $self {
            EffectVariant::Banner($e) => $body,
            EffectVariant::Fireworks($e) => $body,
            EffectVariant::Model($e) => $body,
        }
    };
}

impl Effect for EffectVariant {
    fn name(&self) -> &str {
        delegate!(self, e => e.name())
    }

    fn state(&self) -> EffectState {
        delegate!(self, e => e.state())
    }

    fn scene_root(&self) -> NodeHandle {
        delegate!(self, e => e.scene_root())
    }

    fn create(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        delegate!(self, e => e.create(ctx))
    }

    fn poll_ready(&mut self, ctx: &mut EffectContext<'_>) -> EffectState {
        delegate!(self, e => e.poll_ready(ctx))
    }

    fn update(&mut self, ctx: &mut EffectContext<'_>, dt: f32) {
        delegate!(self, e => e.update(ctx, dt));
    }

    fn dispose(&mut self, ctx: &mut EffectContext<'_>) {
        delegate!(self, e => e.dispose(ctx));
    }

    fn hit_test(&self, scene: &Scene, ray: &Ray) -> Option<f32> {
        delegate!(self, e => e.hit_test(scene, ray))
    }

    fn interaction_priority(&self) -> Option<u8> {
        delegate!(self, e => e.interaction_priority())
    }

    fn on_tap(&mut self, ctx: &mut EffectContext<'_>) -> Option<Reaction> {
        delegate!(self, e => e.on_tap(ctx))
    }
}

impl EffectVariant {
    #[must_use]
    pub fn as_banner(&self) -> Option<&BannerEffect> {
        match self {
            Self::Banner(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_banner_mut(&mut self) -> Option<&mut BannerEffect> {
        match self {
            Self::Banner(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_fireworks(&self) -> Option<&Fireworks> {
        match self {
            Self::Fireworks(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_fireworks_mut(&mut self) -> Option<&mut Fireworks> {
        match self {
            Self::Fireworks(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_model(&self) -> Option<&ModelEffect> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_model_mut(&mut self) -> Option<&mut ModelEffect> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }
}

impl From<BannerEffect> for EffectVariant {
    fn from(effect: BannerEffect) -> Self {
        Self::Banner(effect)
    }
}

impl From<Fireworks> for EffectVariant {
    fn from(effect: Fireworks) -> Self {
        Self::Fireworks(effect)
    }
}

impl From<ModelEffect> for EffectVariant {
    fn from(effect: ModelEffect) -> Self {
        Self::Model(effect)
    }
}

/// Removes `root` with its subtree and releases the pooled resources its
/// components referenced.
pub(crate) fn release_subtree(ctx: &mut EffectContext<'_>, root: NodeHandle) {
    let removed = ctx.scene.remove_node(root);
    ctx.assets.release_nodes(&removed);
}
