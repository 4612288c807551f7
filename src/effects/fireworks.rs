//! Rocket and particle burst simulation.
//!
//! A launch spawns one ascent marker ("rocket") that climbs along
//! [`ANCHOR_UP`] until it reaches a randomized height, then explodes into two
//! particle populations. Rockets, scheduled launches and particles are all
//! advanced by [`Effect::update`]; there is no second timing path.
//!
//! All tuning values are per 60 Hz tick. `update` scales them by
//! `k = dt * 60` (with `dt` clamped to [`MAX_FRAME_DT`]) so a burst lasts the
//! same wall-clock time at any host frame rate.

use std::f32::consts::TAU;

use glam::Vec3;
use image::{Rgba, RgbaImage};
use rand::RngExt;
use rustc_hash::FxHashMap;

use crate::assets::{MaterialHandle, TextureHandle};
use crate::config::{ANCHOR_UP, FireworksConfig, REFERENCE_HZ, fireworks::SPRITE_TEXTURE_SIZE};
use crate::effects::{Effect, EffectContext, EffectState, release_subtree};
use crate::errors::Result;
use crate::resources::{Material, Texture};
use crate::scene::node::{NodeComponent, SpriteComponent};
use crate::scene::{Node, NodeHandle, Scene, Transform};
use crate::utils::clamp_dt;

/// Running totals, for diagnostics and leak checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireworksStats {
    pub sequences: usize,
    pub launches: usize,
    pub explosions: usize,
    pub live_rockets: usize,
    pub live_particles: usize,
    pub particles_spawned: usize,
    pub particles_released: usize,
}

struct Particle {
    node: NodeHandle,
    material: MaterialHandle,
    position: Vec3,
    /// Units per reference tick.
    velocity: Vec3,
    /// Remaining fraction of the life budget.
    life: f32,
    scale: f32,
}

struct Rocket {
    node: NodeHandle,
    position: Vec3,
    /// Height along [`ANCHOR_UP`] at which the rocket explodes.
    target_height: f32,
    color: u32,
}

struct PendingLaunch {
    origin: Vec3,
    color: u32,
    remaining: f32,
}

pub struct Fireworks {
    config: FireworksConfig,
    state: EffectState,
    root: NodeHandle,

    sprite_texture: Option<TextureHandle>,
    /// One template per color; every sprite gets its own clone.
    templates: FxHashMap<u32, MaterialHandle>,

    rockets: Vec<Rocket>,
    particles: Vec<Particle>,
    schedule: Vec<PendingLaunch>,
    stats: FireworksStats,
}

impl Fireworks {
    /// Creates the effect and its (empty) root under `parent`.
    pub fn new(config: FireworksConfig, scene: &mut Scene, parent: NodeHandle) -> Self {
        let root = scene.add_child(parent, Node::new("Fireworks"));
        Self {
            config,
            state: EffectState::Uninitialized,
            root,
            sprite_texture: None,
            templates: FxHashMap::default(),
            rockets: Vec::new(),
            particles: Vec::new(),
            schedule: Vec::new(),
            stats: FireworksStats::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &FireworksConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> FireworksStats {
        FireworksStats {
            live_rockets: self.rockets.len(),
            live_particles: self.particles.len(),
            ..self.stats
        }
    }

    #[must_use]
    pub fn live_particles(&self) -> usize {
        self.particles.len()
    }

    #[must_use]
    pub fn live_rockets(&self) -> usize {
        self.rockets.len()
    }

    #[must_use]
    pub fn pending_launches(&self) -> usize {
        self.schedule.len()
    }

    /// Remaining life of every live particle, in spawn order.
    #[must_use]
    pub fn particle_lives(&self) -> Vec<f32> {
        self.particles.iter().map(|p| p.life).collect()
    }

    /// Burst colors of the rockets still climbing, oldest first.
    #[must_use]
    pub fn rocket_colors(&self) -> Vec<u32> {
        self.rockets.iter().map(|r| r.color).collect()
    }

    /// Fires one rocket from `origin` (anchor space).
    pub fn launch(&mut self, ctx: &mut EffectContext<'_>, origin: Vec3, color: u32) {
        if self.state != EffectState::Active {
            log::warn!("Fireworks: launch ignored in state {:?}", self.state);
            return;
        }

        let Some(material) = self.instance_material(ctx, self.config.rocket_color) else {
            return;
        };
        let height = origin.dot(ANCHOR_UP) + self.config.ascent_height + jitter(ctx, self.config.ascent_jitter);

        let node = ctx.scene.add_child(self.root, sprite_node("Rocket", material, origin, self.config.rocket_scale));
        self.rockets.push(Rocket {
            node,
            position: origin,
            target_height: height,
            color,
        });
        self.stats.launches += 1;
        log::debug!("Fireworks: launch #{} from {origin} (color #{color:06x})", self.stats.launches);
    }

    /// Queues the configured choreography around `center`.
    pub fn launch_sequence(&mut self, center: Vec3) {
        if self.state != EffectState::Active {
            log::warn!("Fireworks: sequence ignored in state {:?}", self.state);
            return;
        }
        self.schedule.extend(self.config.sequence.iter().map(|entry| PendingLaunch {
            origin: center + entry.offset,
            color: entry.color,
            remaining: entry.delay,
        }));
        self.stats.sequences += 1;
        log::info!("Fireworks: sequence of {} launches scheduled", self.config.sequence.len());
    }

    /// Spawns one burst at `position`: a bulk population in `color` and a
    /// smaller, brighter core.
    pub fn explode(&mut self, ctx: &mut EffectContext<'_>, position: Vec3, color: u32) {
        if self.state != EffectState::Active {
            return;
        }

        let populations = [
            (self.config.bulk_count, color, self.config.bulk_scale),
            (self.config.core_count, self.config.core_color, self.config.core_scale),
        ];
        for (count, tint, scale) in populations {
            for _ in 0..count {
                self.spawn_particle(ctx, position, tint, scale);
            }
        }
        self.stats.explosions += 1;
    }

    fn spawn_particle(&mut self, ctx: &mut EffectContext<'_>, position: Vec3, color: u32, scale: f32) {
        let Some(material) = self.instance_material(ctx, color) else {
            return;
        };

        // Uniform direction on the sphere.
        let theta = ctx.rng.random_range(0.0..TAU);
        let phi = ctx.rng.random_range(-1.0_f32..1.0).acos();
        let speed = self.config.speed_min + jitter(ctx, self.config.speed_jitter);
        let direction = Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
        let life = ctx.rng.random_range(self.config.life_min..=self.config.life_max);

        let node = ctx.scene.add_child(self.root, sprite_node("Particle", material, position, scale));
        self.particles.push(Particle {
            node,
            material,
            position,
            velocity: direction * speed,
            life,
            scale,
        });
        self.stats.particles_spawned += 1;
    }

    /// Clone of the per-color template, creating the template on first use.
    fn instance_material(&mut self, ctx: &mut EffectContext<'_>, color: u32) -> Option<MaterialHandle> {
        let texture = self.sprite_texture?;
        let template = *self
            .templates
            .entry(color)
            .or_insert_with(|| ctx.assets.materials.add(Material::sprite(color, texture)));
        ctx.assets.clone_material(template)
    }

    fn advance_schedule(&mut self, ctx: &mut EffectContext<'_>, dt: f32) {
        if self.schedule.is_empty() {
            return;
        }
        let mut due = Vec::new();
        self.schedule.retain_mut(|entry| {
            entry.remaining -= dt;
            if entry.remaining <= 0.0 {
                due.push((entry.origin, entry.color));
                false
            } else {
                true
            }
        });
        for (origin, color) in due {
            self.launch(ctx, origin, color);
        }
    }

    fn advance_rockets(&mut self, ctx: &mut EffectContext<'_>, k: f32) {
        let step = ANCHOR_UP * self.config.ascent_step * k;
        let mut arrived = Vec::new();
        self.rockets.retain_mut(|rocket| {
            rocket.position += step;
            let height = rocket.position.dot(ANCHOR_UP);
            if height >= rocket.target_height {
                // Burst exactly at the target, not at the overshoot.
                let burst = rocket.position - ANCHOR_UP * (height - rocket.target_height);
                arrived.push((rocket.node, burst, rocket.color));
                false
            } else {
                if let Some(node) = ctx.scene.get_node_mut(rocket.node) {
                    node.transform.position = rocket.position;
                }
                true
            }
        });

        for (node, position, color) in arrived {
            release_subtree(ctx, node);
            self.explode(ctx, position, color);
        }
    }

    fn advance_particles(&mut self, ctx: &mut EffectContext<'_>, k: f32) {
        let cfg = &self.config;
        let gravity = ANCHOR_UP * cfg.gravity * k;
        let drag = cfg.drag.powf(k);
        let shrink = cfg.shrink.powf(k);
        let decay = cfg.life_decay * k;

        let mut released = 0;
        self.particles.retain_mut(|p| {
            p.position += p.velocity * k;
            p.velocity -= gravity;
            p.velocity *= drag;
            p.life -= decay;

            if p.life <= 0.0 {
                release_subtree(ctx, p.node);
                released += 1;
                return false;
            }

            p.scale *= shrink;
            if let Some(node) = ctx.scene.get_node_mut(p.node) {
                node.transform.position = p.position;
                node.transform.set_scale_uniform(p.scale);
            }
            let opacity = p.life.max(0.0);
            ctx.assets.materials.modify(p.material, |m| m.opacity = opacity);
            true
        });
        self.stats.particles_released += released;
    }
}

impl Effect for Fireworks {
    fn name(&self) -> &str {
        "fireworks"
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
        let texture = Texture::new("FireworksSprite", radial_gradient(SPRITE_TEXTURE_SIZE));
        self.sprite_texture = Some(ctx.assets.textures.add(texture));
        self.state = EffectState::Active;
        log::info!("Fireworks: ready");
        Ok(())
    }

    fn update(&mut self, ctx: &mut EffectContext<'_>, dt: f32) {
        if self.state != EffectState::Active {
            return;
        }
        let dt = clamp_dt(dt);
        let k = dt * REFERENCE_HZ;

        self.advance_schedule(ctx, dt);
        self.advance_rockets(ctx, k);
        self.advance_particles(ctx, k);
    }

    fn dispose(&mut self, ctx: &mut EffectContext<'_>) {
        if self.state == EffectState::Disposed {
            return;
        }

        self.stats.particles_released += self.particles.len();
        self.particles.clear();
        self.rockets.clear();
        self.schedule.clear();

        // Particles and rockets are children of the root.
        release_subtree(ctx, self.root);
        for (_, template) in self.templates.drain() {
            ctx.assets.materials.remove(template);
        }
        if let Some(texture) = self.sprite_texture.take() {
            ctx.assets.textures.remove(texture);
        }

        self.state = EffectState::Disposed;
        log::info!("Fireworks: disposed");
    }
}

/// Uniform sample from `[0, amount]`; zero when there is no spread.
fn jitter(ctx: &mut EffectContext<'_>, amount: f32) -> f32 {
    if amount > 0.0 { ctx.rng.random_range(0.0..=amount) } else { 0.0 }
}

fn sprite_node(name: &str, material: MaterialHandle, position: Vec3, scale: f32) -> Node {
    let mut transform = Transform::from_position(position);
    transform.set_scale_uniform(scale);
    Node::new(name)
        .with_transform(transform)
        .with_component(NodeComponent::Sprite(SpriteComponent { material }))
}

/// White disc: opaque to 40% of the radius, fading to transparent at the rim.
fn radial_gradient(size: u32) -> RgbaImage {
    let center = size as f32 / 2.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        let r = (dx * dx + dy * dy).sqrt() / center;
        let alpha = if r <= 0.4 {
            1.0
        } else if r >= 1.0 {
            0.0
        } else {
            1.0 - (r - 0.4) / 0.6
        };
        Rgba([255, 255, 255, (alpha * 255.0).round() as u8])
    })
}
