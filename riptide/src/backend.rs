//! Devices command lists can be executed on.

mod device;
mod host;

pub use self::device::*;
pub use self::host::*;
use glam::{UVec2, Vec4};
use image::RgbaImage;

use crate::gpu;
use crate::{CommandList, SceneData};

/// Sizes of every per-frame resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLayout {
    /// Number of pixels; also the number of rays in one half of the
    /// double-buffered ray arrays.
    pub pixel_count: u32,

    /// Number of material buckets plus one for the miss bucket.
    pub bucket_count: u32,
}

impl BufferLayout {
    pub fn ray_slots(&self) -> usize {
        2 * self.pixel_count as usize
    }
}

pub trait Backend {
    /// Backend's representation of a user shading kernel.
    type Shader;

    /// (Re)creates per-frame resources; previous contents are lost.
    fn allocate(&mut self, layout: BufferLayout);

    /// Uploads scene geometry.
    fn write_scene(&mut self, scene: SceneData<'_>);

    fn write_camera(&mut self, camera: &gpu::Camera);

    /// Installs shading kernels of every material bucket, in bucket order,
    /// plus the one handling misses.
    fn bind_shaders(&mut self, shaders: Vec<Self::Shader>, miss: Self::Shader);

    /// Executes given commands.
    fn submit(&mut self, commands: &CommandList);
}

/// Converts post-processed pixels into 8-bit RGBA; missing pixels come out
/// black and transparent.
fn to_rgba_image(camera: &gpu::Camera, output: &[Vec4]) -> RgbaImage {
    let size = camera.screen_size();

    RgbaImage::from_fn(size.x, size.y, |x, y| {
        let idx = camera.screen_to_idx(UVec2::new(x, y));

        let color = output
            .get(idx as usize)
            .copied()
            .unwrap_or_default()
            .clamp(Vec4::ZERO, Vec4::ONE);

        let color = (color * 255.0).round().as_uvec4();

        image::Rgba(color.to_array().map(|c| c as u8))
    })
}
