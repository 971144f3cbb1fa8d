use glam::{Vec2, Vec3};

use crate::{CollisionInfo, Noise, Ray};

/// Everything a material's shading function gets to see about a hit.
#[derive(Clone, Copy, Debug)]
pub struct ShadeInput {
    pub ray: Ray,
    pub hit: CollisionInfo,

    /// Radiance emitted by the hit surface; zero unless it belongs to a light.
    pub emission: Vec3,

    pub uv: Vec2,
    pub bounce: u32,
}

/// Result of evaluating a material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shade {
    /// Direction of the continuation ray; zero terminates the path.
    pub direction: Vec3,

    /// Factor the path's throughput gets multiplied by.
    pub weight: Vec3,

    /// Luminance emitted towards the incoming ray.
    pub luminance: Vec3,
}

impl Shade {
    pub fn terminate(luminance: Vec3) -> Self {
        Self {
            direction: Vec3::ZERO,
            weight: Vec3::ZERO,
            luminance,
        }
    }
}

/// User-supplied shading function of one material bucket.
pub trait Shader {
    fn evaluate(&self, input: &ShadeInput, noise: &mut Noise) -> Shade;
}

impl<F> Shader for F
where
    F: Fn(&ShadeInput, &mut Noise) -> Shade,
{
    fn evaluate(&self, input: &ShadeInput, noise: &mut Noise) -> Shade {
        self(input, noise)
    }
}
