use log::trace;

use crate::gpu::PassParams;
use crate::{CommandList, DispatchSize, FrameContext, Kernel};

/// Groups rays by their material bucket.
///
/// Recording runs, in order: prepare (emits ray refs, clears the bucket
/// table), count (per-bucket histogram), a bottom-up merge network over the
/// ray refs, prefix sum (bucket offsets and indirect-dispatch sizes) and
/// finish (gathers rays into the inactive half, which then becomes the
/// active one). Every stage consumes its predecessor's output, so each is
/// followed by a barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RayBucketSorter {
    ray_count: u32,
    bucket_count: u32,
}

impl RayBucketSorter {
    pub fn new(ray_count: u32, bucket_count: u32) -> Self {
        assert!(ray_count > 0, "cannot sort an empty ray population");
        assert!(bucket_count > 0, "bucket table must not be empty");

        Self {
            ray_count,
            bucket_count,
        }
    }

    /// Number of merge passes needed to sort the whole population, i.e.
    /// `ceil(log2(ray_count))`.
    pub fn merge_passes(&self) -> u32 {
        self.ray_count.next_power_of_two().trailing_zeros()
    }

    /// Records the sort and returns the context with its active half flipped.
    pub fn record(
        &self,
        ctx: FrameContext,
        base: &PassParams,
        commands: &mut CommandList,
    ) -> FrameContext {
        let params = PassParams {
            ray_count: self.ray_count,
            bucket_count: self.bucket_count,
            ..ctx.params(base)
        };

        let rays = DispatchSize::Direct(self.ray_count);

        trace!(
            "Recording sort (rays={}, buckets={}, active={})",
            self.ray_count,
            self.bucket_count,
            ctx.active,
        );

        commands.dispatch(
            Kernel::SortPrepare,
            params,
            DispatchSize::Direct(self.ray_count.max(self.bucket_count)),
        );

        commands.barrier();
        commands.dispatch(Kernel::SortCount, params, rays);
        commands.barrier();

        let mut refs_half = 0;
        let mut section_length = 1;

        while section_length < self.ray_count {
            commands.dispatch(
                Kernel::SortMerge,
                PassParams {
                    refs_half,
                    section_length,
                    ..params
                },
                rays,
            );

            commands.barrier();

            refs_half ^= 1;
            section_length *= 2;
        }

        commands.dispatch(
            Kernel::SortPrefixSum,
            params,
            DispatchSize::Direct(1),
        );

        commands.barrier();

        commands.dispatch(
            Kernel::SortFinish,
            PassParams { refs_half, ..params },
            rays,
        );

        commands.barrier();

        ctx.flipped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Command;

    #[test]
    fn merge_passes() {
        assert_eq!(0, RayBucketSorter::new(1, 1).merge_passes());
        assert_eq!(1, RayBucketSorter::new(2, 1).merge_passes());
        assert_eq!(3, RayBucketSorter::new(5, 1).merge_passes());
        assert_eq!(3, RayBucketSorter::new(8, 1).merge_passes());
    }

    #[test]
    fn record() {
        let target = RayBucketSorter::new(5, 3);
        let mut commands = CommandList::new();
        let ctx = FrameContext::new(123);
        let actual = target.record(ctx, &Default::default(), &mut commands);

        assert_eq!(1, actual.active);
        assert_eq!(ctx.seed, actual.seed);
        assert!(commands.hazards().is_empty());

        assert_eq!(
            vec![
                Kernel::SortPrepare,
                Kernel::SortCount,
                Kernel::SortMerge,
                Kernel::SortMerge,
                Kernel::SortMerge,
                Kernel::SortPrefixSum,
                Kernel::SortFinish,
            ],
            commands.kernels().collect::<Vec<_>>()
        );

        // Every stage is followed by a barrier
        assert_eq!(7, commands.barriers());

        let merges: Vec<_> = commands
            .iter()
            .filter_map(|command| match command {
                Command::Dispatch {
                    kernel: Kernel::SortMerge,
                    params,
                    ..
                } => Some((params.refs_half, params.section_length)),
                _ => None,
            })
            .collect();

        assert_eq!(vec![(0, 1), (1, 2), (0, 4)], merges);

        let finish_half = commands.iter().find_map(|command| match command {
            Command::Dispatch {
                kernel: Kernel::SortFinish,
                params,
                ..
            } => Some(params.refs_half),
            _ => None,
        });

        assert_eq!(Some(1), finish_half);
    }
}
