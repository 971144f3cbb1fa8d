use glam::{Vec2, Vec3};

use crate::gpu::{Face, Vertex};

/// Triangle mesh, as produced by an importer.
///
/// Normals and texture coordinates are optional; when present, they must
/// have one entry per position.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    faces: Vec<MeshFace>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshFace {
    pub vertices: [u32; 3],

    /// Material bucket of this face.
    pub bucket: u32,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, faces: Vec<MeshFace>) -> Self {
        Self {
            positions,
            faces,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = uvs;
        self
    }

    /// Builds a mesh with every face using the same material bucket.
    pub fn from_triangles(
        triangles: impl IntoIterator<Item = [Vec3; 3]>,
        bucket: u32,
    ) -> Self {
        let mut positions = Vec::new();
        let mut faces = Vec::new();

        for triangle in triangles {
            let base = positions.len() as u32;

            positions.extend(triangle);

            faces.push(MeshFace {
                vertices: [base, base + 1, base + 2],
                bucket,
            });
        }

        Self::new(positions, faces)
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn faces(&self) -> &[MeshFace] {
        &self.faces
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Converts this mesh into vertices and faces, with face indices local to
    /// the mesh; missing attributes are zero-filled.
    pub(crate) fn serialize(&self, light: u32) -> (Vec<Vertex>, Vec<Face>) {
        let vertices = self
            .positions
            .iter()
            .enumerate()
            .map(|(idx, &position)| {
                let normal = self.normals.get(idx).copied().unwrap_or_default();
                let uv = self.uvs.get(idx).copied().unwrap_or_default();

                Vertex::new(position, normal, uv)
            })
            .collect();

        let faces = self
            .faces
            .iter()
            .map(|face| Face::new(face.vertices, face.bucket, light))
            .collect();

        (vertices, faces)
    }
}

#[cfg(test)]
mod tests {
    use glam::{vec2, vec3};

    use super::*;

    #[test]
    fn missing_attributes_are_zero_filled() {
        let mesh = Mesh::from_triangles(
            [[Vec3::ZERO, Vec3::X, Vec3::Y], [Vec3::ONE, Vec3::X, Vec3::Z]],
            3,
        )
        .with_uvs(vec![vec2(0.5, 0.25)]);

        let (vertices, faces) = mesh.serialize(7);

        assert_eq!(6, vertices.len());
        assert_eq!(vec2(0.5, 0.25), vertices[0].uv());
        assert_eq!(Vec2::ZERO, vertices[1].uv());
        assert_eq!(Vec3::ZERO, vertices[0].normal());
        assert_eq!(vec3(1.0, 1.0, 1.0), vertices[3].position());

        assert_eq!([3, 4, 5], faces[1].vertices);
        assert_eq!(3, faces[1].bucket);
        assert_eq!(7, faces[1].light);
    }
}
