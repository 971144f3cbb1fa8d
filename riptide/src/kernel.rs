use std::fmt;

/// Compute kernel a dispatch runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kernel {
    RayGeneration,
    Intersection,
    SortPrepare,
    SortCount,
    SortMerge,
    SortPrefixSum,
    SortFinish,

    /// User shading kernel of given material bucket.
    Shading(u32),

    Miss,
    Accumulation,
    PostProcessing,
}

/// Device resource a kernel accesses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Camera,
    Rays,
    RayInfos,
    Collisions,
    RayRefs,
    Buckets,
    Vertices,
    Faces,
    Nodes,
    Objects,
    Lights,
    Accumulators,
    Output,
}

impl Kernel {
    /// Kernels that don't depend on the material set.
    pub const BUILTIN: [Kernel; 10] = [
        Kernel::RayGeneration,
        Kernel::Intersection,
        Kernel::SortPrepare,
        Kernel::SortCount,
        Kernel::SortMerge,
        Kernel::SortPrefixSum,
        Kernel::SortFinish,
        Kernel::Miss,
        Kernel::Accumulation,
        Kernel::PostProcessing,
    ];

    pub fn reads(&self) -> &'static [Resource] {
        use Resource::*;

        match self {
            Kernel::RayGeneration => &[Camera],
            Kernel::Intersection => &[Rays, Nodes, Faces, Vertices, Objects],
            Kernel::SortPrepare => &[Rays],
            Kernel::SortCount => &[RayRefs],
            Kernel::SortMerge => &[RayRefs],
            Kernel::SortPrefixSum => &[Buckets],
            Kernel::SortFinish => &[RayRefs, Rays, RayInfos, Collisions],
            Kernel::Shading(_) => &[
                Buckets, Collisions, Rays, RayInfos, Faces, Vertices, Lights,
            ],
            Kernel::Miss => &[Buckets, Collisions, Rays, RayInfos],
            Kernel::Accumulation => &[RayInfos, Accumulators],
            Kernel::PostProcessing => &[Accumulators],
        }
    }

    pub fn writes(&self) -> &'static [Resource] {
        use Resource::*;

        match self {
            Kernel::RayGeneration => &[Rays, RayInfos],
            Kernel::Intersection => &[Rays, Collisions],
            Kernel::SortPrepare => &[RayRefs, Buckets],
            Kernel::SortCount => &[Buckets],
            Kernel::SortMerge => &[RayRefs],
            Kernel::SortPrefixSum => &[Buckets],
            Kernel::SortFinish => &[Rays, RayInfos, Collisions],
            Kernel::Shading(_) | Kernel::Miss => &[Rays, RayInfos],
            Kernel::Accumulation => &[Accumulators],
            Kernel::PostProcessing => &[Output],
        }
    }

    /// Whether this kernel shades a bucket; dispatches of such kernels touch
    /// disjoint rays and so may run without barriers between them.
    pub fn is_shading(&self) -> bool {
        matches!(self, Kernel::Shading(_) | Kernel::Miss)
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kernel::RayGeneration => write!(f, "ray_generation"),
            Kernel::Intersection => write!(f, "intersection"),
            Kernel::SortPrepare => write!(f, "sort_prepare"),
            Kernel::SortCount => write!(f, "sort_count"),
            Kernel::SortMerge => write!(f, "sort_merge"),
            Kernel::SortPrefixSum => write!(f, "sort_prefix_sum"),
            Kernel::SortFinish => write!(f, "sort_finish"),
            Kernel::Shading(material) => write!(f, "shading_{material}"),
            Kernel::Miss => write!(f, "miss"),
            Kernel::Accumulation => write!(f, "accumulation"),
            Kernel::PostProcessing => write!(f, "post_processing"),
        }
    }
}
