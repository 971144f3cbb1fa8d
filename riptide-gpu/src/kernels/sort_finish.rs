use crate::{CollisionInfo, PassParams, Ray, RayInfo, RayRef};

/// Gathers ray records into bucket-contiguous order: slot `id` of the target
/// half receives the ray the `id`-th sorted ray ref points at.
pub fn main(
    id: u32,
    params: &PassParams,
    ray_refs: &[RayRef],
    src: (&[Ray], &[RayInfo], &[CollisionInfo]),
    dst: (&mut [Ray], &mut [RayInfo], &mut [CollisionInfo]),
) {
    if id >= params.ray_count {
        return;
    }

    let from = ray_refs[id as usize].index as usize;
    let to = id as usize;

    dst.0[to] = src.0[from];
    dst.1[to] = src.1[from];
    dst.2[to] = src.2[from];
}
