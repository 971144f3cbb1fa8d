//! Flattens a [`Bvh`] into the layout expected by the intersection kernel.

use super::{Bvh, BvhNode, BvhNodeId};
use crate::gpu::GpuBvhNode;

/// Appends given tree's nodes into `buffer`, depth-first, rebasing node
/// indices onto the buffer's current length and face ranges onto
/// `face_offset`.
///
/// Returns index of the root node.
pub fn run(bvh: &Bvh, face_offset: u32, buffer: &mut Vec<GpuBvhNode>) -> u32 {
    buffer.reserve(bvh.nodes().len());

    walk(bvh, face_offset, buffer, BvhNodeId::root())
}

fn walk(
    bvh: &Bvh,
    face_offset: u32,
    buffer: &mut Vec<GpuBvhNode>,
    id: BvhNodeId,
) -> u32 {
    let ptr = buffer.len();
    let node = bvh.nodes()[id];
    let bounds = node.bounds();
    let begin = face_offset + node.faces().begin();
    let end = face_offset + node.faces().end();

    match node {
        BvhNode::Internal { left, right, .. } => {
            buffer.push(Default::default());

            let left_ptr = walk(bvh, face_offset, buffer, left);
            let right_ptr = walk(bvh, face_offset, buffer, right);

            buffer[ptr] = GpuBvhNode::internal(
                bounds.min(),
                bounds.max(),
                begin,
                end,
                left_ptr,
                right_ptr,
            );
        }

        BvhNode::Leaf { .. } => {
            buffer.push(GpuBvhNode::leaf(
                bounds.min(),
                bounds.max(),
                begin,
                end,
            ));
        }
    }

    ptr as u32
}

#[cfg(test)]
mod tests {
    use glam::{vec2, vec3, Vec3};

    use super::*;
    use crate::bvh::BvhBuilder;
    use crate::gpu::{Face, Vertex};

    #[test]
    fn rebases_indices() {
        let vertices: Vec<_> = (0..4)
            .flat_map(|i| {
                let x = (i * 10) as f32;

                [
                    vec3(x, 0.0, 0.0),
                    vec3(x + 1.0, 0.0, 0.0),
                    vec3(x, 1.0, 0.0),
                ]
            })
            .map(|p| Vertex::new(p, Vec3::ZERO, vec2(0.0, 0.0)))
            .collect();

        let faces: Vec<_> = (0..4)
            .map(|i| Face::new([i * 3, i * 3 + 1, i * 3 + 2], 0, u32::MAX))
            .collect();

        let bvh = BvhBuilder::new(4).build(&vertices, &faces);
        let mut buffer = vec![GpuBvhNode::default(); 5];
        let root = run(&bvh, 100, &mut buffer);

        assert_eq!(5, root);
        assert_eq!(5 + bvh.nodes().len(), buffer.len());
        assert_eq!(100, buffer[5].begin);
        assert_eq!(104, buffer[5].end);

        for node in &buffer[5..] {
            if node.is_leaf() {
                assert_eq!(1, node.end - node.begin);
            } else {
                assert!(node.left >= 5 && node.right >= 5);
                assert!((node.left as usize) < buffer.len());
                assert!((node.right as usize) < buffer.len());
            }
        }
    }
}
