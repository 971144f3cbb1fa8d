use crate::{Axis, BoundingBox};

/// Heuristic used to pick the position at which a node gets split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Splits the node's box in half.
    #[default]
    SpatialMedian,

    /// Bisects for the position that divides the node's faces roughly in
    /// half.
    ObjectMedian,
}

impl SplitStrategy {
    const BISECTION_STEPS: usize = 32;

    /// Returns the split position along `axis`; faces whose centroid lies
    /// below it go to the left child.
    pub fn find(
        self,
        bounds: &BoundingBox,
        axis: Axis,
        centroids: &[f32],
    ) -> f32 {
        let min = axis.of(bounds.min());
        let max = axis.of(bounds.max());

        match self {
            SplitStrategy::SpatialMedian => (min + max) / 2.0,

            SplitStrategy::ObjectMedian => {
                let target = centroids.len() / 2;
                let mut lo = min;
                let mut hi = max;

                for _ in 0..Self::BISECTION_STEPS {
                    let mid = (lo + hi) / 2.0;
                    let left = centroids.iter().filter(|&&c| c < mid).count();

                    if left == target {
                        return mid;
                    }

                    if left < target {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }

                hi
            }
        }
    }
}
