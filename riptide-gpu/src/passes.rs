use bytemuck::{Pod, Zeroable};

/// Push constants shared by every kernel; each kernel reads only the fields
/// it needs.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PassParams {
    /// Per-frame random seed.
    pub seed: u32,

    /// Bounce being processed, counting from zero.
    pub bounce: u32,

    /// Authoritative half (0 or 1) of the double-buffered ray arrays.
    pub active: u32,

    /// Half of the ray-ref array the merge pass reads from.
    pub refs_half: u32,

    /// Length of the runs merged by the merge pass.
    pub section_length: u32,

    /// Bucket processed by the shading pass.
    pub bucket: u32,

    /// Number of ray slots in one half of the ray arrays.
    pub ray_count: u32,

    /// Number of buckets, including the miss bucket.
    pub bucket_count: u32,

    pub object_count: u32,

    /// Whether the accumulation pass should discard the accumulated image.
    pub reset: u32,

    pub exposure: f32,

    /// Whether the shading pass runs over a sorted bucket range.
    pub sorted: u32,
}

impl PassParams {
    /// Index of the first slot of the authoritative half.
    pub fn active_base(&self) -> usize {
        (self.active * self.ray_count) as usize
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted != 0
    }

    pub fn is_reset(&self) -> bool {
        self.reset != 0
    }

    pub fn miss_bucket(&self) -> u32 {
        self.bucket_count - 1
    }
}
