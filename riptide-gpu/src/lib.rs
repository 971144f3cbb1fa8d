//! Common structs and kernels shared by Riptide's backends.
//!
//! Everything in here is laid out so that it can be copied byte-for-byte into
//! GPU buffers; the WGSL ports of the kernels mirror these definitions.

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::too_many_arguments)]

mod accumulator;
mod bucket;
mod bvh_node;
mod camera;
mod collision;
mod face;
mod noise;
mod object;
mod passes;
mod ray;
mod ray_info;
mod shading;

pub mod kernels;

use glam::UVec3;

pub use self::accumulator::*;
pub use self::bucket::*;
pub use self::bvh_node::*;
pub use self::camera::*;
pub use self::collision::*;
pub use self::face::*;
pub use self::noise::*;
pub use self::object::*;
pub use self::passes::*;
pub use self::ray::*;
pub use self::ray_info::*;
pub use self::shading::*;

/// Number of invocations per workgroup, shared by every kernel.
pub const WORKGROUP_SIZE: u32 = 64;

/// Maximum stack size per invocation when traversing the BVH.
///
/// Traversal pushes at most one extra entry per level, so a tree must not be
/// deeper than `BVH_STACK_SIZE - 1`.
pub const BVH_STACK_SIZE: usize = 64;

/// Maximum number of workgroups dispatched along a single dimension; matches
/// the smallest value of `maxComputeWorkgroupsPerDimension` devices report.
pub const MAX_WORKGROUPS_PER_DIMENSION: u32 = 65535;

/// Returns the number of workgroups needed to cover given invocations.
pub fn workgroups_for(invocations: u32) -> u32 {
    invocations.div_ceil(WORKGROUP_SIZE)
}

/// Returns a workgroup grid covering given invocations.
///
/// Large dispatches spill into the second dimension, keeping each dimension
/// under [`MAX_WORKGROUPS_PER_DIMENSION`]; kernels flatten the grid back with
/// [`invocation_id()`].
pub fn dispatch_for(invocations: u32) -> UVec3 {
    let workgroups = workgroups_for(invocations);
    let rows = workgroups.div_ceil(MAX_WORKGROUPS_PER_DIMENSION).max(1);

    UVec3::new(workgroups.div_ceil(rows), rows, 1)
}

/// Flattens a global invocation id of a [`dispatch_for()`] grid into a lane
/// index.
pub fn invocation_id(global_id: UVec3, num_workgroups: UVec3) -> u32 {
    global_id.y * num_workgroups.x * WORKGROUP_SIZE + global_id.x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_dispatches_stay_one_dimensional() {
        assert_eq!(UVec3::new(0, 1, 1), dispatch_for(0));
        assert_eq!(UVec3::new(1, 1, 1), dispatch_for(64));
        assert_eq!(UVec3::new(2, 1, 1), dispatch_for(65));

        assert_eq!(
            UVec3::new(MAX_WORKGROUPS_PER_DIMENSION, 1, 1),
            dispatch_for(MAX_WORKGROUPS_PER_DIMENSION * WORKGROUP_SIZE),
        );
    }

    #[test]
    fn large_dispatches_spill_into_rows() {
        for invocations in [3840 * 2160, 7680 * 4320, u32::MAX] {
            let size = dispatch_for(invocations);

            assert!(size.x <= MAX_WORKGROUPS_PER_DIMENSION, "{invocations}");
            assert!(size.y <= MAX_WORKGROUPS_PER_DIMENSION, "{invocations}");
            assert_eq!(1, size.z);

            let lanes = size.x as u64 * size.y as u64 * WORKGROUP_SIZE as u64;

            assert!(lanes >= invocations as u64, "{invocations}");
        }

        assert_eq!(UVec3::new(64800, 2, 1), dispatch_for(3840 * 2160));
    }

    #[test]
    fn invocation_ids_cover_the_grid_once() {
        let size = UVec3::new(3, 2, 1);
        let mut seen = vec![false; 3 * 2 * WORKGROUP_SIZE as usize];

        for y in 0..size.y {
            for x in 0..(size.x * WORKGROUP_SIZE) {
                let id = invocation_id(UVec3::new(x, y, 0), size) as usize;

                assert!(!seen[id], "lane {id} visited twice");
                seen[id] = true;
            }
        }

        assert!(seen.into_iter().all(|seen| seen));
    }
}
