use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::X, Self::Y, Self::Z].into_iter()
    }

    pub fn of(self, v: Vec3) -> f32 {
        v[self as usize]
    }

    /// Returns the axis along which given extent is the largest.
    pub fn longest(extent: Vec3) -> Self {
        if extent.x >= extent.y && extent.x >= extent.z {
            Self::X
        } else if extent.y >= extent.z {
            Self::Y
        } else {
            Self::Z
        }
    }
}

impl From<usize> for Axis {
    fn from(value: usize) -> Self {
        match value {
            0 => Self::X,
            1 => Self::Y,
            2 => Self::Z,
            _ => panic!("invalid axis: {value}"),
        }
    }
}
