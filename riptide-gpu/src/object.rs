use bytemuck::{Pod, Zeroable};
use glam::Vec4;

/// Range of BVH nodes belonging to one submitted mesh or light source; the
/// first node of the range is the mesh's root.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ObjectInfo {
    pub begin_node: u32,
    pub end_node: u32,

    /// Index into the lights table or [`ObjectInfo::NOT_A_LIGHT`].
    pub light: u32,

    _padding: u32,
}

impl ObjectInfo {
    pub const NOT_A_LIGHT: u32 = u32::MAX;

    pub fn new(begin_node: u32, end_node: u32, light: u32) -> Self {
        Self {
            begin_node,
            end_node,
            light,
            _padding: 0,
        }
    }

    pub fn is_light(&self) -> bool {
        self.light != Self::NOT_A_LIGHT
    }
}

/// Light-source properties.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Light {
    /// x, y, z - emitted radiance; w - unused
    pub emission: Vec4,
}
