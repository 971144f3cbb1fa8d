use crate::{Bucket, PassParams, RayRef};

/// Bumps the counter of the bucket given ray ref belongs to.
///
/// On the device this is an atomic increment; lanes race only on the counter.
pub fn main(
    id: u32,
    params: &PassParams,
    ray_refs: &[RayRef],
    buckets: &mut [Bucket],
) {
    if id >= params.ray_count {
        return;
    }

    buckets[ray_refs[id as usize].bucket as usize].count += 1;
}
