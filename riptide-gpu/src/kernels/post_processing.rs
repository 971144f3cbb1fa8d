use glam::{Vec3, Vec4};

use crate::{Accumulator, PassParams};

/// Maps an accumulated pixel into displayable range: exposure, Reinhard
/// tone-mapping and gamma correction.
pub fn main(
    id: u32,
    params: &PassParams,
    accumulators: &[Accumulator],
    output: &mut [Vec4],
) {
    if id >= params.ray_count {
        return;
    }

    output[id as usize] =
        tone_map(accumulators[id as usize].mean(), params.exposure).extend(1.0);
}

pub fn tone_map(color: Vec3, exposure: f32) -> Vec3 {
    let color = color * exposure;
    let color = color / (Vec3::ONE + color);

    color.powf(1.0 / 2.2)
}
