use std::collections::VecDeque;

use super::{
    Bvh, BvhNode, BvhNodeId, BvhNodes, FacesRef, SplitStrategy, LEAF_TOLERANCE,
};
use crate::gpu::{Face, Vertex, BVH_STACK_SIZE};
use crate::Axis;

#[derive(Clone, Copy, Debug, Default)]
pub struct BvhBuilder {
    max_depth: usize,
    strategy: SplitStrategy,
}

impl BvhBuilder {
    /// Maximum depth supported by the intersection kernel's traversal stack.
    pub const MAX_DEPTH: usize = BVH_STACK_SIZE - 1;

    pub fn new(max_depth: usize) -> Self {
        assert!(
            max_depth <= Self::MAX_DEPTH,
            "BVH depth must not exceed {}, got {max_depth}",
            Self::MAX_DEPTH,
        );

        Self {
            max_depth,
            strategy: Default::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: SplitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Builds a tree over given faces.
    ///
    /// Inputs are copied; the returned [`Bvh`] carries its own, reordered,
    /// face array which its nodes' ranges refer to.
    pub fn build(&self, vertices: &[Vertex], faces: &[Face]) -> Bvh {
        let mut bvh = Bvh {
            nodes: BvhNodes::default(),
            vertices: vertices.to_vec(),
            faces: faces.to_vec(),
            depth: 0,
        };

        let root_faces = FacesRef::new(0, faces.len() as u32);

        let root = bvh.nodes.set_root(BvhNode::Leaf {
            bounds: bounds_of(&bvh, root_faces),
            faces: root_faces,
        });

        let mut queue = VecDeque::from_iter([(root, 0)]);

        while let Some((id, depth)) = queue.pop_front() {
            bvh.depth = bvh.depth.max(depth);

            if depth >= self.max_depth {
                continue;
            }

            if let Some((left, right)) = self.split(&mut bvh, id) {
                queue.push_back((left, depth + 1));
                queue.push_back((right, depth + 1));
            }
        }

        bvh
    }

    fn split(
        &self,
        bvh: &mut Bvh,
        id: BvhNodeId,
    ) -> Option<(BvhNodeId, BvhNodeId)> {
        let BvhNode::Leaf { bounds, faces } = bvh.nodes[id] else {
            unreachable!();
        };

        if faces.len() <= 1 {
            return None;
        }

        let axis = Axis::longest(bounds.extent());

        let centroid = |vertices: &[Vertex], face: &Face| {
            let sum: f32 = face
                .vertices
                .iter()
                .map(|&vertex| axis.of(vertices[vertex as usize].position()))
                .sum();

            sum / 3.0
        };

        let centroids: Vec<_> = bvh.faces[faces.range()]
            .iter()
            .map(|face| centroid(&bvh.vertices, face))
            .collect();

        let split_at = self.strategy.find(&bounds, axis, &centroids);

        // ---

        let faces_data = &mut bvh.faces[faces.range()];
        let mut left_idx = 0;
        let mut right_idx = faces_data.len() as i32 - 1;

        while left_idx <= right_idx {
            if centroid(&bvh.vertices, &faces_data[left_idx as usize])
                < split_at
            {
                left_idx += 1;
            } else {
                faces_data.swap(left_idx as usize, right_idx as usize);
                right_idx -= 1;
            }
        }

        let left_len = left_idx as usize;

        // Splitting didn't separate anything (e.g. all centroids coincide), so
        // this node stays a leaf
        if left_len == 0 || left_len == faces.len() {
            return None;
        }

        // ---

        let (left_faces, right_faces) = faces.split_at(left_len);

        let left = bvh.nodes.add(BvhNode::Leaf {
            bounds: bounds_of(bvh, left_faces),
            faces: left_faces,
        });

        let right = bvh.nodes.add(BvhNode::Leaf {
            bounds: bounds_of(bvh, right_faces),
            faces: right_faces,
        });

        bvh.nodes[id] = BvhNode::Internal {
            bounds,
            faces,
            left,
            right,
        };

        Some((left, right))
    }
}

fn bounds_of(bvh: &Bvh, faces: FacesRef) -> crate::BoundingBox {
    let bounds = bvh.face_bounds(faces);

    if bounds.is_set() {
        bounds.inflate(LEAF_TOLERANCE)
    } else {
        bounds
    }
}

#[cfg(test)]
mod tests {
    use glam::{vec2, vec3, Vec3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::BoundingBox;

    fn vertex(position: Vec3) -> Vertex {
        Vertex::new(position, Vec3::ZERO, vec2(0.0, 0.0))
    }

    /// Generates `count` random triangles inside the unit cube at `offset`.
    fn soup(
        rng: &mut StdRng,
        offset: Vec3,
        count: usize,
        vertices: &mut Vec<Vertex>,
        faces: &mut Vec<Face>,
    ) {
        for _ in 0..count {
            let base = vertices.len() as u32;

            for _ in 0..3 {
                let position = vec3(rng.gen(), rng.gen(), rng.gen());

                vertices.push(vertex(offset + position));
            }

            faces.push(Face::new([base, base + 1, base + 2], 0, u32::MAX));
        }
    }

    fn random_scene(seed: u64, count: usize) -> (Vec<Vertex>, Vec<Face>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        soup(&mut rng, Vec3::ZERO, count, &mut vertices, &mut faces);

        (vertices, faces)
    }

    fn assert_partition(bvh: &Bvh) {
        let mut seen = vec![0; bvh.faces().len()];

        for leaf in bvh.leaves() {
            for face_id in leaf.faces().range() {
                seen[face_id] += 1;
            }
        }

        assert!(seen.iter().all(|&n| n == 1), "leaves: {seen:?}");
    }

    fn assert_containment(bvh: &Bvh) {
        for (id, _) in bvh.walk() {
            let node = &bvh.nodes()[id];
            let bounds = node.bounds();

            for face in &bvh.faces()[node.faces().range()] {
                for position in bvh.face_positions(face) {
                    assert!(bounds.contains(position));
                }
            }

            if let BvhNode::Internal { left, right, .. } = *node {
                let l = bvh.nodes()[left].faces();
                let r = bvh.nodes()[right].faces();

                assert_eq!(node.faces().begin(), l.begin());
                assert_eq!(l.end(), r.begin());
                assert_eq!(r.end(), node.faces().end());
                assert!(bounds.contains_box(&bvh.nodes()[left].bounds()));
                assert!(bounds.contains_box(&bvh.nodes()[right].bounds()));
            }
        }
    }

    #[test]
    fn partition_and_containment() {
        let strategies =
            [SplitStrategy::SpatialMedian, SplitStrategy::ObjectMedian];

        for strategy in strategies {
            for (seed, count) in [(1, 2), (2, 17), (3, 256), (4, 1000)] {
                let (vertices, faces) = random_scene(seed, count);

                let bvh = BvhBuilder::new(20)
                    .with_strategy(strategy)
                    .build(&vertices, &faces);

                assert_partition(&bvh);
                assert_containment(&bvh);
                assert!(bvh.nodes().len() <= 2 * count - 1);
            }
        }
    }

    #[test]
    fn input_is_left_untouched() {
        let (vertices, faces) = random_scene(5, 64);
        let bvh = BvhBuilder::new(8).build(&vertices, &faces);

        assert_eq!(vertices, bvh.vertices());

        let mut actual = bvh.faces().to_vec();
        let mut expected = faces.clone();

        actual.sort_by_key(|face| face.vertices);
        expected.sort_by_key(|face| face.vertices);

        assert_eq!(expected, actual);
    }

    #[test]
    fn depth_limit() {
        let (vertices, faces) = random_scene(6, 500);

        for max_depth in [0, 1, 3, 7] {
            let bvh = BvhBuilder::new(max_depth).build(&vertices, &faces);

            assert!(bvh.walk().all(|(_, depth)| depth <= max_depth));
            assert!(bvh.depth() <= max_depth);
        }

        let bvh = BvhBuilder::new(0).build(&vertices, &faces);

        assert_eq!(1, bvh.nodes().len());
    }

    #[test]
    fn tiny_inputs_yield_single_leaf() {
        let (vertices, faces) = random_scene(7, 1);

        for max_depth in [0, 5, BvhBuilder::MAX_DEPTH] {
            let bvh = BvhBuilder::new(max_depth).build(&vertices, &faces);

            assert_eq!(1, bvh.nodes().len());
            assert!(bvh.root().is_leaf());
        }

        let bvh = BvhBuilder::new(5).build(&[], &[]);

        assert_eq!(1, bvh.nodes().len());
        assert!(bvh.root().faces().is_empty());
    }

    #[test]
    fn single_triangle() {
        let vertices = [
            vertex(vec3(0.0, 0.0, 0.0)),
            vertex(vec3(1.0, 0.0, 0.0)),
            vertex(vec3(0.0, 1.0, 0.0)),
        ];

        let faces = [Face::new([0, 1, 2], 0, u32::MAX)];
        let bvh = BvhBuilder::new(0).build(&vertices, &faces);
        let bounds = bvh.root().bounds();

        assert_eq!(1, bvh.nodes().len());

        let tight = BoundingBox::new(Vec3::ZERO, vec3(1.0, 1.0, 0.0));

        assert!(bounds.contains_box(&tight));
        assert!(tight.inflate(LEAF_TOLERANCE * 1.01).contains_box(&bounds));
    }

    #[test]
    fn degenerate_geometry_stops_splitting() {
        // Three copies of the very same (zero-area) triangle
        let vertices = [vertex(Vec3::ONE); 3];
        let faces = [Face::new([0, 1, 2], 0, u32::MAX); 3];
        let bvh = BvhBuilder::new(10).build(&vertices, &faces);

        assert_eq!(1, bvh.nodes().len());
        assert_eq!(3, bvh.root().faces().len());
    }

    #[test]
    fn two_disjoint_clusters() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        soup(&mut rng, Vec3::ZERO, 100, &mut vertices, &mut faces);
        soup(&mut rng, vec3(100.0, 0.0, 0.0), 100, &mut vertices, &mut faces);

        let bvh = BvhBuilder::new(1).build(&vertices, &faces);

        let BvhNode::Internal { left, right, .. } = *bvh.root() else {
            panic!("root should have been split");
        };

        let left = bvh.nodes()[left];
        let right = bvh.nodes()[right];

        assert_eq!(100, left.faces().len());
        assert_eq!(100, right.faces().len());
        assert!(!left.bounds().overlaps_along(&right.bounds(), 0));
    }

    #[test]
    #[should_panic(expected = "BVH depth must not exceed")]
    fn too_deep() {
        BvhBuilder::new(BvhBuilder::MAX_DEPTH + 1);
    }
}
