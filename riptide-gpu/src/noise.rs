use core::f32::consts::PI;

use glam::{vec2, vec3, UVec2, Vec2, Vec3};

use crate::PassParams;

/// Deterministic per-invocation random number generator.
#[derive(Copy, Clone, Debug)]
pub struct Noise {
    state: u32,
}

impl Noise {
    pub fn new(seed: u32, id: UVec2) -> Self {
        Self {
            state: seed
                ^ 48619u32.wrapping_mul(id.x)
                ^ 95461u32.wrapping_mul(id.y),
        }
    }

    /// Creates a generator for given pixel, decorrelated across bounces of
    /// the same frame.
    ///
    /// Stream zero belongs to ray generation, bounces start at stream one.
    pub fn for_pass(params: &PassParams, pixel: u32, stream: u32) -> Self {
        let seed = params.seed ^ stream.wrapping_mul(0x9e37_79b9);

        Self::new(seed, UVec2::new(pixel, stream))
    }

    /// Generates a uniform sample in range `<0.0, 1.0>`.
    pub fn sample(&mut self) -> f32 {
        (self.sample_int() as f32) / (u32::MAX as f32)
    }

    /// Generates a uniform sample in range `<0, u32::MAX>`.
    pub fn sample_int(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(747796405)
            .wrapping_add(2891336453);

        let word = ((self.state >> ((self.state >> 28) + 4)) ^ self.state)
            .wrapping_mul(277803737);

        (word >> 22) ^ word
    }

    /// Generates a uniform sample on a circle.
    pub fn sample_circle(&mut self) -> Vec2 {
        let angle = self.sample() * PI * 2.0;

        vec2(angle.cos(), angle.sin())
    }

    /// Generates a uniform sample inside of a disk.
    pub fn sample_disk(&mut self) -> Vec2 {
        let radius = self.sample().sqrt();

        self.sample_circle() * radius
    }

    /// Generates a cosine-weighted sample on a hemisphere around given normal.
    pub fn sample_hemisphere(&mut self, normal: Vec3) -> Vec3 {
        let u = vec2(self.sample(), self.sample());

        let radius = u.x.sqrt();
        let angle = 2.0 * PI * u.y;

        let helper = if normal.x.abs() > 0.9 {
            vec3(0.0, 1.0, 0.0)
        } else {
            vec3(1.0, 0.0, 0.0)
        };

        let b = normal.cross(helper).normalize();
        let t = b.cross(normal);

        (radius * angle.cos() * b
            + radius * angle.sin() * t
            + (1.0 - u.x).max(0.0).sqrt() * normal)
            .normalize()
    }
}
