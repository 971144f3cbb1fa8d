use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Per-ray accumulator living for the whole multi-bounce trace of one frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RayInfo {
    /// Luminance gathered so far.
    pub luminance: Vec3,

    /// Index of the pixel this ray has been generated for.
    pub pixel: u32,

    /// Product of all the weights returned by shading kernels so far.
    pub throughput: Vec3,

    /// Number of surfaces this ray has bounced off.
    pub bounces: u32,
}

impl RayInfo {
    pub fn new(pixel: u32) -> Self {
        Self {
            luminance: Vec3::ZERO,
            pixel,
            throughput: Vec3::ONE,
            bounces: 0,
        }
    }
}
