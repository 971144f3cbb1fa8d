//! Per-invocation bodies of every compute kernel.
//!
//! Each `main()` corresponds to a single lane of a dispatch; `id` is the
//! global invocation index. Slices of double-buffered arrays are passed
//! already narrowed down to the half a kernel operates on.

pub mod accumulation;
pub mod intersection;
pub mod miss;
pub mod post_processing;
pub mod ray_generation;
pub mod shading;
pub mod sort_count;
pub mod sort_finish;
pub mod sort_merge;
pub mod sort_prefix_sum;
pub mod sort_prepare;

/// Distance by which continuation rays are pushed off the surface they start
/// at.
pub const SURFACE_NUDGE: f32 = 1e-3;
