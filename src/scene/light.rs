use glam::Vec3;

/// Sky/ground ambient light, the only light the overlay attaches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereLight {
    pub sky_color: Vec3,
    pub ground_color: Vec3,
}

// Light component attached to a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Hemisphere(HemisphereLight),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    #[must_use]
    pub fn new_hemisphere(sky: u32, ground: u32, intensity: f32) -> Self {
        let sky_color = rgb_from_hex(sky);
        Self {
            color: sky_color,
            intensity,
            kind: LightKind::Hemisphere(HemisphereLight {
                sky_color,
                ground_color: rgb_from_hex(ground),
            }),
        }
    }
}

/// Converts a `0xRRGGBB` color into linear-ish `[0, 1]` components.
#[must_use]
pub fn rgb_from_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}
