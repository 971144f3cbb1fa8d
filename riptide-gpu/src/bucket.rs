use bytemuck::{Pod, Zeroable};

use crate::Ray;

/// Lightweight sort key standing in for a full ray record.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RayRef {
    pub bucket: u32,
    pub index: u32,
}

impl RayRef {
    /// Creates a reference for given ray; the miss sentinel (and any bucket
    /// outside of the table) maps to the last bucket, so that missed and
    /// inactive rays sort to the end.
    pub fn new(ray: &Ray, index: u32, bucket_count: u32) -> Self {
        Self {
            bucket: Self::key(ray.bucket, bucket_count),
            index,
        }
    }

    pub fn key(bucket: u32, bucket_count: u32) -> u32 {
        bucket.min(bucket_count - 1)
    }
}

/// Per-bucket bookkeeping written by the sorter.
///
/// The first three fields double as indirect-dispatch arguments, so the
/// struct must stay at the beginning of its slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Bucket {
    pub dispatch_x: u32,
    pub dispatch_y: u32,
    pub dispatch_z: u32,

    /// Number of rays in this bucket.
    pub count: u32,

    /// Index of the first ray of this bucket within the sorted ray buffer.
    pub offset: u32,

    _padding: [u32; 3],
}

impl Bucket {
    pub fn new(count: u32, offset: u32) -> Self {
        let dispatch = crate::dispatch_for(count);

        Self {
            dispatch_x: dispatch.x,
            dispatch_y: dispatch.y,
            dispatch_z: dispatch.z,
            count,
            offset,
            _padding: Default::default(),
        }
    }

    pub fn range(&self) -> core::ops::Range<u32> {
        self.offset..(self.offset + self.count)
    }
}

/// Returns index of the first reference whose bucket is not less than `key`.
pub fn lower_bound(refs: &[RayRef], key: u32) -> usize {
    let mut lo = 0;
    let mut hi = refs.len();

    while lo < hi {
        let mid = lo + (hi - lo) / 2;

        if refs[mid].bucket < key {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    lo
}

/// Returns index of the first reference whose bucket is greater than `key`.
pub fn upper_bound(refs: &[RayRef], key: u32) -> usize {
    let mut lo = 0;
    let mut hi = refs.len();

    while lo < hi {
        let mid = lo + (hi - lo) / 2;

        if refs[mid].bucket <= key {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    lo
}
