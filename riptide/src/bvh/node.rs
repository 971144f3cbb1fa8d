use std::ops::Range;

use crate::BoundingBox;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BvhNode {
    Internal {
        bounds: BoundingBox,
        faces: FacesRef,
        left: BvhNodeId,
        right: BvhNodeId,
    },

    Leaf {
        bounds: BoundingBox,
        faces: FacesRef,
    },
}

impl BvhNode {
    pub fn bounds(&self) -> BoundingBox {
        match self {
            BvhNode::Internal { bounds, .. } => *bounds,
            BvhNode::Leaf { bounds, .. } => *bounds,
        }
    }

    pub fn faces(&self) -> FacesRef {
        match self {
            BvhNode::Internal { faces, .. } => *faces,
            BvhNode::Leaf { faces, .. } => *faces,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }
}

impl Default for BvhNode {
    fn default() -> Self {
        BvhNode::Leaf {
            bounds: Default::default(),
            faces: Default::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BvhNodeId(u32);

impl BvhNodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn root() -> Self {
        Self::new(0)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Half-open range of faces owned by a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FacesRef {
    begin: u32,
    end: u32,
}

impl FacesRef {
    pub fn new(begin: u32, end: u32) -> Self {
        assert!(begin <= end);

        Self { begin, end }
    }

    pub fn begin(&self) -> u32 {
        self.begin
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.begin) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn range(&self) -> Range<usize> {
        (self.begin as usize)..(self.end as usize)
    }

    /// Splits this range into `[begin, begin + len)` and the rest.
    pub fn split_at(&self, len: usize) -> (Self, Self) {
        let pivot = self.begin + len as u32;

        assert!(pivot <= self.end);

        (Self::new(self.begin, pivot), Self::new(pivot, self.end))
    }
}
