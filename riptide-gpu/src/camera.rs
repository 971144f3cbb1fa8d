use bytemuck::{Pod, Zeroable};
use glam::{vec2, UVec2, Vec2, Vec4, Vec4Swizzles};

use crate::{Noise, Ray};

/// Physical (thin-lens) camera model.
///
/// Camera space follows the usual convention: `-Z` is forward, `+Y` is up.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Camera {
    pub view_to_world: glam::Mat4,

    /// x - sensor width (meters)
    /// y - sensor height (meters)
    /// z - focal length (meters)
    /// w - aperture radius (meters); zero turns the camera into a pinhole
    pub sensor: Vec4,

    /// x - screen width (pixels)
    /// y - screen height (pixels)
    /// z - focus distance (meters)
    /// w - unused
    pub screen: Vec4,
}

impl Camera {
    pub fn screen_size(&self) -> UVec2 {
        self.screen.xy().as_uvec2()
    }

    pub fn pixel_count(&self) -> u32 {
        let size = self.screen_size();

        size.x * size.y
    }

    /// Given a point in screen-coordinates, returns a unique index for it; used
    /// to index screen-space structures.
    pub fn screen_to_idx(&self, pos: UVec2) -> u32 {
        pos.y * (self.screen.x as u32) + pos.x
    }

    /// Reverse of [`Self::screen_to_idx()`].
    pub fn idx_to_screen(&self, idx: u32) -> UVec2 {
        let width = (self.screen.x as u32).max(1);

        UVec2::new(idx % width, idx / width)
    }

    /// Casts a primary ray through given pixel, jittered within the pixel's
    /// footprint and across the lens' aperture.
    pub fn ray(&self, noise: &mut Noise, screen_pos: UVec2) -> Ray {
        let jitter = vec2(noise.sample(), noise.sample());
        let ndc = (screen_pos.as_vec2() + jitter) / self.screen.xy() - 0.5;

        let sensor_pos = vec2(ndc.x * self.sensor.x, -ndc.y * self.sensor.y);
        let focal_length = self.sensor.z;
        let aperture = self.sensor.w;
        let focus_distance = self.screen.z;

        let dir = sensor_pos.extend(-focal_length).normalize();
        let focus_point = dir * (focus_distance / -dir.z);

        let lens_pos = if aperture > 0.0 {
            noise.sample_disk() * aperture
        } else {
            Vec2::ZERO
        };

        let origin = lens_pos.extend(0.0);
        let dir = (focus_point - origin).normalize();

        Ray::new(
            self.view_to_world.transform_point3(origin),
            self.view_to_world.transform_vector3(dir).normalize(),
        )
    }
}
