//! Bounding volume hierarchy over a triangle soup.
//!
//! Trees are stored in an arena ([`BvhNodes`]) with children referenced by
//! index, so a built tree can be freely copied and relocated into the
//! scene-wide node array (see [`serializer`]).

mod builder;
mod node;
mod nodes;
mod split;

pub mod serializer;

use glam::Vec3;

pub use self::builder::*;
pub use self::node::*;
pub use self::nodes::*;
pub use self::split::*;
use crate::gpu::{Face, Vertex};
use crate::BoundingBox;

/// Inflation applied to every node's bounding box, so that geometry touching
/// a box's boundary is not missed due to rounding.
pub const LEAF_TOLERANCE: f32 = 1e-4;

/// Built hierarchy together with the (reordered) faces it indexes.
#[derive(Clone, Debug)]
pub struct Bvh {
    nodes: BvhNodes,
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    depth: usize,
}

impl Bvh {
    pub fn nodes(&self) -> &BvhNodes {
        &self.nodes
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Depth of the deepest node, with the root being at depth zero.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn root(&self) -> &BvhNode {
        &self.nodes[BvhNodeId::root()]
    }

    /// Iterates over all nodes, depth-first, along with their depths.
    pub fn walk(&self) -> impl Iterator<Item = (BvhNodeId, usize)> + '_ {
        let mut stack = vec![(BvhNodeId::root(), 0)];

        std::iter::from_fn(move || {
            let (id, depth) = stack.pop()?;

            if let BvhNode::Internal { left, right, .. } = self.nodes[id] {
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }

            Some((id, depth))
        })
    }

    pub fn leaves(&self) -> impl Iterator<Item = &BvhNode> + '_ {
        self.walk()
            .map(|(id, _)| &self.nodes[id])
            .filter(|node| node.is_leaf())
    }

    pub(crate) fn face_positions(&self, face: &Face) -> [Vec3; 3] {
        face.vertices
            .map(|vertex| self.vertices[vertex as usize].position())
    }

    pub(crate) fn face_bounds(&self, faces: FacesRef) -> BoundingBox {
        self.faces[faces.range()]
            .iter()
            .flat_map(|face| self.face_positions(face))
            .collect()
    }
}
