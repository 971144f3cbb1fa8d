use std::ops::{Add, AddAssign};

use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::default(), Self::add)
    }

    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Returns a box enlarged by `eps` on every side.
    pub fn inflate(self, eps: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(eps),
            max: self.max + Vec3::splat(eps),
        }
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn extent(&self) -> Vec3 {
        self.max() - self.min()
    }

    pub fn center(&self) -> Vec3 {
        (self.min() + self.max()) / 2.0
    }

    pub fn is_set(&self) -> bool {
        self.min.x <= self.max.x
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn contains_box(&self, other: &Self) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    /// Whether both boxes share any point along given axis.
    pub fn overlaps_along(&self, other: &Self, axis: usize) -> bool {
        self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis]
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }
}

impl Add<Vec3> for BoundingBox {
    type Output = Self;

    fn add(mut self, rhs: Vec3) -> Self::Output {
        self.grow(rhs);
        self
    }
}

impl Add<Self> for BoundingBox {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        if rhs.is_set() {
            self.grow(rhs.min);
            self.grow(rhs.max);
        }

        self
    }
}

impl AddAssign<Vec3> for BoundingBox {
    fn add_assign(&mut self, rhs: Vec3) {
        self.grow(rhs);
    }
}

impl AddAssign<Self> for BoundingBox {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl FromIterator<Vec3> for BoundingBox {
    fn from_iter<T: IntoIterator<Item = Vec3>>(iter: T) -> Self {
        Self::from_points(iter)
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn from_points() {
        let target: BoundingBox =
            [vec3(1.0, 5.0, -1.0), vec3(-2.0, 0.0, 3.0)].into_iter().collect();

        assert_eq!(vec3(-2.0, 0.0, -1.0), target.min());
        assert_eq!(vec3(1.0, 5.0, 3.0), target.max());
        assert!(target.contains(vec3(0.0, 1.0, 0.0)));
        assert!(!target.contains(vec3(0.0, 6.0, 0.0)));
    }

    #[test]
    fn empty_box_is_neutral() {
        let target = BoundingBox::from_points([Vec3::ONE]);

        assert!(!BoundingBox::default().is_set());
        assert_eq!(target, target + BoundingBox::default());
    }
}
