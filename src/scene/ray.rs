use glam::{Affine3A, Vec2, Vec3};

use crate::resources::BoundingBox;

/// A ray used for pointer hit-testing.
///
/// The direction is not renormalized after [`transform`](Ray::transform), so
/// hit distances are expressed in the units of whatever space the ray lives
/// in. Only the ordering of hits matters to callers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Moves the ray into another space.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }

    /// Slab test against an axis-aligned box. Returns the entry distance
    /// (or 0 when the origin is inside).
    #[must_use]
    pub fn intersect_aabb(&self, bounds: &BoundingBox) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let dir = self.direction[axis];
            let (lo, hi) = (bounds.min[axis], bounds.max[axis]);

            if dir.abs() < 1e-8 {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }

    /// Intersects a rectangle centered at the origin of the local XY plane
    /// (`z = 0`), with the given half extents. Both faces count.
    #[must_use]
    pub fn intersect_quad(&self, half_extents: Vec2) -> Option<f32> {
        if self.direction.z.abs() < 1e-8 {
            return None;
        }
        let t = -self.origin.z / self.direction.z;
        if t < 0.0 {
            return None;
        }
        let hit = self.at(t);
        (hit.x.abs() <= half_extents.x && hit.y.abs() <= half_extents.y).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_unit_box_from_outside() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let bounds = BoundingBox {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let t = ray.intersect_aabb(&bounds).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let ray = Ray::new(Vec3::new(0.0, 3.0, 5.0), Vec3::NEG_Z);
        let bounds = BoundingBox {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        assert!(ray.intersect_aabb(&bounds).is_none());
    }

    #[test]
    fn quad_hit_respects_extents() {
        let half = Vec2::new(0.5, 0.1);
        let inside = Ray::new(Vec3::new(0.4, 0.05, 1.0), Vec3::NEG_Z);
        let outside = Ray::new(Vec3::new(0.4, 0.2, 1.0), Vec3::NEG_Z);
        assert!(inside.intersect_quad(half).is_some());
        assert!(outside.intersect_quad(half).is_none());
    }

    #[test]
    fn quad_behind_origin_is_ignored() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::Z);
        assert!(ray.intersect_quad(Vec2::ONE).is_none());
    }
}
