use crate::{Accumulator, PassParams, RayInfo};

/// Folds the luminance gathered by ray `id` into its pixel's accumulator.
///
/// Rays may have been permuted by the sorter, hence the pixel is looked up
/// from the ray info; every pixel owns exactly one ray.
pub fn main(
    id: u32,
    params: &PassParams,
    ray_infos: &[RayInfo],
    accumulators: &mut [Accumulator],
) {
    if id >= params.ray_count {
        return;
    }

    let info = &ray_infos[id as usize];

    accumulators[info.pixel as usize].add(info.luminance, params.is_reset());
}
