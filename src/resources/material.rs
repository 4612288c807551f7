use glam::Vec3;

use crate::assets::TextureHandle;
use crate::scene::light::rgb_from_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blending {
    Normal,
    Additive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Unlit, optionally textured.
    Basic,
    /// Camera-facing sprite.
    Sprite,
    /// Lit surface from a loaded model.
    Standard,
}

/// Render state and parameters of one material instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub label: String,
    pub kind: MaterialKind,
    pub color: Vec3,
    pub opacity: f32,
    pub map: Option<TextureHandle>,
    pub blending: Blending,
    pub side: Side,
    pub transparent: bool,
    pub depth_write: bool,
}

impl Material {
    /// Additive, transparent sprite material tinted with `color` (`0xRRGGBB`).
    #[must_use]
    pub fn sprite(color: u32, map: TextureHandle) -> Self {
        Self {
            label: format!("Sprite#{color:06x}"),
            kind: MaterialKind::Sprite,
            color: rgb_from_hex(color),
            opacity: 1.0,
            map: Some(map),
            blending: Blending::Additive,
            side: Side::Front,
            transparent: true,
            depth_write: false,
        }
    }

    /// Unlit textured material visible from both sides.
    #[must_use]
    pub fn basic(map: TextureHandle) -> Self {
        Self {
            label: "Basic".to_string(),
            kind: MaterialKind::Basic,
            color: Vec3::ONE,
            opacity: 1.0,
            map: Some(map),
            blending: Blending::Normal,
            side: Side::Double,
            transparent: true,
            depth_write: true,
        }
    }

    /// Lit, opaque material with a flat color.
    #[must_use]
    pub fn standard(color: u32) -> Self {
        Self {
            label: "Standard".to_string(),
            kind: MaterialKind::Standard,
            color: rgb_from_hex(color),
            opacity: 1.0,
            map: None,
            blending: Blending::Normal,
            side: Side::Front,
            transparent: false,
            depth_write: true,
        }
    }
}
