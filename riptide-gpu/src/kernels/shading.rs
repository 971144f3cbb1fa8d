use glam::{Vec2, Vec3, Vec4Swizzles};

use super::SURFACE_NUDGE;
use crate::{
    Bucket, CollisionInfo, Face, Light, Noise, PassParams, Ray, RayInfo,
    RayRef, Shade, ShadeInput, Shader, Triangle, Vertex,
};

#[derive(Clone, Copy)]
pub struct Materials<'a> {
    pub faces: &'a [Face],
    pub vertices: &'a [Vertex],
    pub lights: &'a [Light],
}

/// Evaluates the material of bucket `params.bucket` for one ray.
///
/// When rays are sorted, lane `id` shades slot `offset + id` of the bucket's
/// range; otherwise lanes span the whole population and skip rays of other
/// buckets.
pub fn main(
    id: u32,
    params: &PassParams,
    shader: &dyn Shader,
    materials: Materials<'_>,
    buckets: &[Bucket],
    collisions: &[CollisionInfo],
    rays: &mut [Ray],
    ray_infos: &mut [RayInfo],
) {
    let Some(slot) = resolve_slot(id, params, buckets, rays) else {
        return;
    };

    let ray = rays[slot];
    let hit = collisions[slot];

    if !ray.is_active() || !hit.is_hit() {
        return;
    }

    let emission = if hit.is_light() {
        materials.lights[hit.light as usize].emission.xyz()
    } else {
        Vec3::ZERO
    };

    let uv = if let Some(face) = materials.faces.get(hit.primitive as usize) {
        Triangle::fetch(materials.vertices, face).uv(hit.barycentrics)
    } else {
        Vec2::ZERO
    };

    let input = ShadeInput {
        ray,
        hit,
        emission,
        uv,
        bounce: params.bounce,
    };

    let info = &mut ray_infos[slot];
    let mut noise = Noise::for_pass(params, info.pixel, params.bounce + 1);
    let shade = shader.evaluate(&input, &mut noise);

    rays[slot] = apply(info, &ray, &hit, shade);
}

/// Returns the slot given lane should shade, if any.
pub fn resolve_slot(
    id: u32,
    params: &PassParams,
    buckets: &[Bucket],
    rays: &[Ray],
) -> Option<usize> {
    if params.is_sorted() {
        let bucket = buckets[params.bucket as usize];

        (id < bucket.count).then_some((bucket.offset + id) as usize)
    } else {
        if id >= params.ray_count {
            return None;
        }

        let key = RayRef::key(rays[id as usize].bucket, params.bucket_count);

        (key == params.bucket).then_some(id as usize)
    }
}

/// Folds the result of a material evaluation into the ray's accumulators and
/// returns the continuation ray.
pub fn apply(
    info: &mut RayInfo,
    ray: &Ray,
    hit: &CollisionInfo,
    shade: Shade,
) -> Ray {
    info.luminance += info.throughput * shade.luminance;
    info.throughput *= shade.weight;
    info.bounces += 1;

    let mut next = *ray;

    if shade.direction == Vec3::ZERO {
        next.deactivate();
        return next;
    }

    let direction = shade.direction.normalize();

    let nudge = if direction.dot(hit.normal) >= 0.0 {
        hit.normal * SURFACE_NUDGE
    } else {
        -hit.normal * SURFACE_NUDGE
    };

    next = Ray::new(hit.position + nudge, direction);

    // Keeps the ray out of other buckets' dispatches until the next
    // intersection pass re-classifies it
    next.bucket = ray.bucket;
    next
}
