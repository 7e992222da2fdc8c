//! Spatial helpers: zone bounds and facing.

use glam::Vec3;
use rand::Rng;
use serde::Serialize;

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Build a box from two opposite corners given in any order
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Containment on the XZ plane only. Altitude is ignored, so a player
    /// flying above a zone still counts as inside it.
    pub fn contains_xz(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Uniform random XZ inside the box, at a fixed height above its top face.
    /// Placement does not check the terrain underneath.
    pub fn random_spawn_point<R: Rng + ?Sized>(&self, rng: &mut R, height_offset: f32) -> Vec3 {
        let x = if self.max.x > self.min.x {
            rng.gen_range(self.min.x..self.max.x)
        } else {
            self.min.x
        };
        let z = if self.max.z > self.min.z {
            rng.gen_range(self.min.z..self.max.z)
        } else {
            self.min.z
        };
        Vec3::new(x, self.max.y + height_offset, z)
    }
}

/// Yaw around +Y that faces from `from` toward `to`, ignoring height
pub fn facing_yaw(from: Vec3, to: Vec3) -> f32 {
    let d = to - from;
    d.x.atan2(d.z)
}
