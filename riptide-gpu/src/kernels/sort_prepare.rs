use crate::{Bucket, PassParams, Ray, RayRef};

/// Clears the bucket table and emits one ray ref per ray into the first half
/// of the ray-ref array.
///
/// Dispatched over `max(ray_count, bucket_count)` lanes.
pub fn main(
    id: u32,
    params: &PassParams,
    rays: &[Ray],
    ray_refs: &mut [RayRef],
    buckets: &mut [Bucket],
) {
    if id < params.bucket_count {
        buckets[id as usize] = Bucket::default();
    }

    if id < params.ray_count {
        ray_refs[id as usize] =
            RayRef::new(&rays[id as usize], id, params.bucket_count);
    }
}
