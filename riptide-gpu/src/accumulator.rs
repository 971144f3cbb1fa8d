use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};

/// Running mean and variance of a pixel's luminance (Welford's algorithm).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Accumulator {
    /// x, y, z - mean; w - number of samples
    pub mean: Vec4,

    /// x, y, z - sum of squared differences from the mean; w - unused
    pub m2: Vec4,
}

impl Accumulator {
    pub fn sample_count(&self) -> u32 {
        self.mean.w as u32
    }

    pub fn mean(&self) -> Vec3 {
        self.mean.xyz()
    }

    pub fn variance(&self) -> Vec3 {
        if self.mean.w < 2.0 {
            Vec3::ZERO
        } else {
            self.m2.xyz() / (self.mean.w - 1.0)
        }
    }

    /// Folds a new sample in; `reset` discards everything accumulated so far.
    pub fn add(&mut self, sample: Vec3, reset: bool) {
        if reset {
            *self = Self::default();
        }

        let count = self.mean.w + 1.0;
        let delta = sample - self.mean.xyz();
        let mean = self.mean.xyz() + delta / count;
        let m2 = self.m2.xyz() + delta * (sample - mean);

        self.mean = mean.extend(count);
        self.m2 = m2.extend(0.0);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    #[test]
    fn mean_and_variance() {
        let mut target = Accumulator::default();

        for sample in [1.0, 2.0, 3.0, 4.0] {
            target.add(Vec3::splat(sample), false);
        }

        assert_eq!(4, target.sample_count());
        assert_relative_eq!(target.mean().x, 2.5);
        assert_relative_eq!(target.variance().y, 5.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn reset() {
        let mut target = Accumulator::default();

        target.add(vec3(10.0, 10.0, 10.0), false);
        target.add(vec3(1.0, 2.0, 3.0), true);

        assert_eq!(1, target.sample_count());
        assert_eq!(vec3(1.0, 2.0, 3.0), target.mean());
        assert_eq!(Vec3::ZERO, target.variance());
    }
}
