use std::f32::consts::TAU;

use glam::Vec3;
use image::RgbaImage;

use crate::assets::{LoadTask, TextureHandle};
use crate::config::banner::{INTERACTION_PRIORITY, TAP_LAUNCH_DROP};
use crate::config::{ANCHOR_UP, BannerConfig};
use crate::effects::raster::rasterize_banner;
use crate::effects::{Effect, EffectContext, EffectState, Reaction, release_subtree};
use crate::errors::Result;
use crate::resources::{Geometry, Material, Texture};
use crate::scene::{MeshComponent, Node, NodeComponent, NodeHandle, Ray, Scene, Transform};

/// Floating congratulation billboard.
///
/// The texture is rasterized on the CPU. When a logo is configured the
/// billboard stays absent (state `Loading`) until the logo image arrives; a
/// logo that fails to load is left out.
pub struct BannerEffect {
    config: BannerConfig,
    state: EffectState,
    root: NodeHandle,
    billboard: Option<NodeHandle>,
    texture: Option<TextureHandle>,
    logo_task: Option<LoadTask<RgbaImage>>,

    rest_position: Vec3,
    /// Oscillation phase in `[0, 2π)`.
    phase: f32,
}

impl BannerEffect {
    pub fn new(config: BannerConfig, scene: &mut Scene, parent: NodeHandle) -> Self {
        let rest_position = config.position;
        let root = scene.add_child(
            parent,
            Node::new("Banner").with_transform(Transform::from_position(rest_position)),
        );
        Self {
            config,
            state: EffectState::Uninitialized,
            root,
            billboard: None,
            texture: None,
            logo_task: None,
            rest_position,
            phase: 0.0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BannerConfig {
        &self.config
    }

    #[must_use]
    pub fn rest_position(&self) -> Vec3 {
        self.rest_position
    }

    #[must_use]
    pub fn has_billboard(&self) -> bool {
        self.billboard.is_some()
    }

    /// Moves the point the banner floats around. Valid in every state.
    pub fn set_position(&mut self, scene: &mut Scene, position: Vec3) {
        self.rest_position = position;
        self.apply_offset(scene);
    }

    fn apply_offset(&self, scene: &mut Scene) {
        let offset = ANCHOR_UP * self.phase.sin() * self.config.float_amplitude;
        if let Some(node) = scene.get_node_mut(self.root) {
            node.transform.position = self.rest_position + offset;
        }
    }

    fn build(&mut self, ctx: &mut EffectContext<'_>, logo: Option<&RgbaImage>) {
        let image = rasterize_banner(&self.config, logo);
        let texture = ctx.assets.textures.add(Texture::new("BannerTexture", image));
        let material = ctx.assets.materials.add(Material::basic(texture));
        let geometry = ctx
            .assets
            .geometries
            .add(Geometry::plane(self.config.size.x, self.config.size.y));

        let billboard = ctx.scene.add_child(
            self.root,
            Node::new("BannerBillboard").with_component(NodeComponent::Mesh(MeshComponent::new(geometry, material))),
        );

        self.texture = Some(texture);
        self.billboard = Some(billboard);
        self.state = EffectState::Active;
        log::info!("Banner: billboard ready (logo: {})", logo.is_some());
    }
}

impl Effect for BannerEffect {
    fn name(&self) -> &str {
        "banner"
    }

    fn state(&self) -> EffectState {
        self.state
    }

    fn scene_root(&self) -> NodeHandle {
        self.root
    }

    fn create(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        if self.state != EffectState::Uninitialized {
            return Ok(());
        }
        match self.config.logo_path.clone() {
            Some(path) => {
                self.logo_task = Some(ctx.assets.load_image(&path));
                self.state = EffectState::Loading;
            }
            None => self.build(ctx, None),
        }
        Ok(())
    }

    fn poll_ready(&mut self, ctx: &mut EffectContext<'_>) -> EffectState {
        if self.state != EffectState::Loading {
            return self.state;
        }
        let Some(task) = self.logo_task.as_mut() else {
            return self.state;
        };

        match task.poll() {
            None => {}
            Some(Ok(logo)) => {
                self.logo_task = None;
                self.build(ctx, Some(&logo));
            }
            Some(Err(e)) => {
                self.logo_task = None;
                log::warn!("Banner: logo unavailable, rendering without it: {e}");
                self.build(ctx, None);
            }
        }
        self.state
    }

    fn update(&mut self, ctx: &mut EffectContext<'_>, dt: f32) {
        if self.state != EffectState::Active {
            return;
        }
        self.phase = (self.phase + dt * self.config.float_frequency).rem_euclid(TAU);
        self.apply_offset(ctx.scene);
    }

    fn dispose(&mut self, ctx: &mut EffectContext<'_>) {
        if self.state == EffectState::Disposed {
            return;
        }
        // Abandon a logo still in flight.
        self.logo_task = None;
        release_subtree(ctx, self.root);
        if let Some(texture) = self.texture.take() {
            ctx.assets.textures.remove(texture);
        }
        self.billboard = None;
        self.state = EffectState::Disposed;
        log::info!("Banner: disposed");
    }

    fn hit_test(&self, scene: &Scene, ray: &Ray) -> Option<f32> {
        let billboard = self.billboard?;
        let anchor = scene.get_node(self.root)?.parent()?;
        let to_anchor = scene.matrix_relative_to(billboard, anchor)?;
        ray.transform(&to_anchor.inverse())
            .intersect_quad(self.config.size * 0.5)
    }

    fn interaction_priority(&self) -> Option<u8> {
        Some(INTERACTION_PRIORITY)
    }

    fn on_tap(&mut self, _ctx: &mut EffectContext<'_>) -> Option<Reaction> {
        (self.state == EffectState::Active).then(|| Reaction::LaunchBurst {
            origin: self.rest_position - ANCHOR_UP * TAP_LAUNCH_DROP,
        })
    }
}
