use glam::{vec4, Mat4, UVec2, Vec3};

use crate::gpu;

/// Physical camera the primary rays are generated from.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub viewport_size: UVec2,

    /// Camera-to-world transform; the camera looks down its local `-Z`.
    pub transform: Mat4,

    /// Sensor size, in meters (defaults to full-frame 36x24mm).
    pub sensor_size: (f32, f32),

    pub focal_length: f32,

    /// Aperture radius; zero makes a pinhole camera with everything in focus.
    pub aperture: f32,

    pub focus_distance: f32,
}

impl Camera {
    pub fn looking_at(
        viewport_size: UVec2,
        eye: Vec3,
        target: Vec3,
        up: Vec3,
    ) -> Self {
        Self {
            viewport_size,
            transform: Mat4::look_at_rh(eye, target, up).inverse(),
            ..Default::default()
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.viewport_size.x * self.viewport_size.y
    }

    pub(crate) fn serialize(&self) -> gpu::Camera {
        assert!(
            self.viewport_size.x > 0 && self.viewport_size.y > 0,
            "viewport must not be empty, got {}",
            self.viewport_size,
        );

        gpu::Camera {
            view_to_world: self.transform,
            sensor: vec4(
                self.sensor_size.0,
                self.sensor_size.1,
                self.focal_length,
                self.aperture,
            ),
            screen: vec4(
                self.viewport_size.x as f32,
                self.viewport_size.y as f32,
                self.focus_distance,
                0.0,
            ),
        }
    }

    pub(crate) fn describe(&self) -> String {
        format!(
            "{}x{}, f={}mm, r={}mm",
            self.viewport_size.x,
            self.viewport_size.y,
            self.focal_length * 1000.0,
            self.aperture * 1000.0,
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            viewport_size: UVec2::new(320, 240),
            transform: Mat4::IDENTITY,
            sensor_size: (0.036, 0.024),
            focal_length: 0.05,
            aperture: 0.0,
            focus_distance: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize() {
        let camera = Camera {
            viewport_size: UVec2::new(4, 2),
            ..Default::default()
        };

        let actual = camera.serialize();

        assert_eq!(8, actual.pixel_count());
        assert_eq!(0.05, actual.sensor.z);
    }

    #[test]
    #[should_panic(expected = "viewport must not be empty")]
    fn empty_viewport() {
        Camera {
            viewport_size: UVec2::new(0, 2),
            ..Default::default()
        }
        .serialize();
    }
}
