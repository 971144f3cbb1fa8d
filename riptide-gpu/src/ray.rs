use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Ray travelling through the scene.
///
/// Rays live in double-buffered arrays; which half is authoritative is
/// decided by the scheduler (see `PassParams::active`).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Ray {
    origin: Vec3,

    /// Bucket of the material this ray hit most recently, or [`Ray::MISS`].
    pub bucket: u32,

    direction: Vec3,
    active: u32,
}

impl Ray {
    /// Sentinel bucket for rays that missed everything or are inactive.
    pub const MISS: u32 = u32::MAX;

    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            bucket: Self::MISS,
            direction,
            active: 1,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn inv_direction(&self) -> Vec3 {
        1.0 / self.direction
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    pub fn is_active(&self) -> bool {
        self.active != 0
    }

    pub fn deactivate(&mut self) {
        self.active = 0;
        self.bucket = Self::MISS;
    }

    /// Returns the distance to given bounding box or `f32::MAX` if the ray
    /// misses it.
    pub fn distance_to_box(&self, min: Vec3, max: Vec3) -> f32 {
        let inv_direction = self.inv_direction();
        let hit_min = (min - self.origin) * inv_direction;
        let hit_max = (max - self.origin) * inv_direction;

        let tmin = hit_min.min(hit_max).max_element();
        let tmax = hit_min.max(hit_max).min_element();

        if tmax >= tmin && tmax >= 0.0 {
            tmin.max(0.0)
        } else {
            f32::MAX
        }
    }
}
