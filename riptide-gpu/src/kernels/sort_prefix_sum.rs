use crate::{Bucket, PassParams};

/// Turns per-bucket counts into exclusive offsets and indirect-dispatch
/// arguments.
///
/// The table is small, so a single lane walks it sequentially.
pub fn main(id: u32, params: &PassParams, buckets: &mut [Bucket]) {
    if id != 0 {
        return;
    }

    let mut offset = 0;

    for bucket in &mut buckets[..params.bucket_count as usize] {
        let count = bucket.count;

        *bucket = Bucket::new(count, offset);
        offset += count;
    }
}
