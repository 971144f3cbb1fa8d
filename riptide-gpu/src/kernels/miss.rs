use glam::{Vec2, Vec3};

use super::shading::resolve_slot;
use crate::{
    Bucket, CollisionInfo, Noise, PassParams, Ray, RayInfo, ShadeInput, Shader,
};

/// Terminates rays of the miss bucket, adding the environment's contribution.
///
/// Expects `params.bucket` to point at the miss bucket.
pub fn main(
    id: u32,
    params: &PassParams,
    shader: &dyn Shader,
    buckets: &[Bucket],
    collisions: &[CollisionInfo],
    rays: &mut [Ray],
    ray_infos: &mut [RayInfo],
) {
    let Some(slot) = resolve_slot(id, params, buckets, rays) else {
        return;
    };

    let ray = rays[slot];

    if !ray.is_active() {
        return;
    }

    let input = ShadeInput {
        ray,
        hit: collisions[slot],
        emission: Vec3::ZERO,
        uv: Vec2::ZERO,
        bounce: params.bounce,
    };

    let info = &mut ray_infos[slot];
    let mut noise = Noise::for_pass(params, info.pixel, params.bounce + 1);
    let shade = shader.evaluate(&input, &mut noise);

    info.luminance += info.throughput * shade.luminance;
    rays[slot].deactivate();
}
