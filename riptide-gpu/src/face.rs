use bytemuck::{Pod, Zeroable};
use glam::{vec2, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::Ray;

/// Triangle referencing three entries of the scene-wide vertex buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Face {
    pub vertices: [u32; 3],

    /// Material bucket this face is shaded with.
    pub bucket: u32,

    /// Index into the lights table or [`crate::ObjectInfo::NOT_A_LIGHT`].
    pub light: u32,
}

impl Face {
    pub fn new(vertices: [u32; 3], bucket: u32, light: u32) -> Self {
        Self {
            vertices,
            bucket,
            light,
        }
    }

    pub fn is_light(&self) -> bool {
        self.light != crate::ObjectInfo::NOT_A_LIGHT
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// x, y, z - position; w - texture coordinate u
    pub position: Vec4,

    /// x, y, z - normal; w - texture coordinate v
    pub normal: Vec4,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.extend(uv.x),
            normal: normal.extend(uv.y),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position.xyz()
    }

    pub fn normal(&self) -> Vec3 {
        self.normal.xyz()
    }

    pub fn uv(&self) -> Vec2 {
        vec2(self.position.w, self.normal.w)
    }
}

/// Three vertices of a face, fetched from the vertex buffer.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

/// Distance and barycentric coordinates of a ray-triangle intersection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleHit {
    pub distance: f32,
    pub barycentrics: Vec2,
}

impl Triangle {
    pub fn fetch(vertices: &[Vertex], face: &Face) -> Self {
        Self {
            vertices: [
                vertices[face.vertices[0] as usize],
                vertices[face.vertices[1] as usize],
                vertices[face.vertices[2] as usize],
            ],
        }
    }

    /// Möller-Trumbore test; returns a hit only if it's closer than
    /// `max_distance`.
    pub fn hit(&self, ray: &Ray, max_distance: f32) -> Option<TriangleHit> {
        let p0 = self.vertices[0].position();
        let v0v1 = self.vertices[1].position() - p0;
        let v0v2 = self.vertices[2].position() - p0;

        let pvec = ray.direction().cross(v0v2);
        let det = v0v1.dot(pvec);

        if det.abs() < f32::EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let tvec = ray.origin() - p0;
        let u = tvec.dot(pvec) * inv_det;
        let qvec = tvec.cross(v0v1);
        let v = ray.direction().dot(qvec) * inv_det;
        let distance = v0v2.dot(qvec) * inv_det;

        if (u < 0.0)
            | (u > 1.0)
            | (v < 0.0)
            | (u + v > 1.0)
            | (distance <= 0.0)
            | (distance >= max_distance)
        {
            return None;
        }

        Some(TriangleHit {
            distance,
            barycentrics: vec2(u, v),
        })
    }

    pub fn geometric_normal(&self) -> Vec3 {
        let p0 = self.vertices[0].position();

        (self.vertices[1].position() - p0)
            .cross(self.vertices[2].position() - p0)
            .normalize_or_zero()
    }

    /// Interpolates vertex normals, falling back to the geometric normal when
    /// the mesh doesn't provide any.
    pub fn shading_normal(&self, barycentrics: Vec2) -> Vec3 {
        let normal = self.interpolate(barycentrics, |v| v.normal());

        if normal.length_squared() < 1e-12 {
            self.geometric_normal()
        } else {
            normal.normalize()
        }
    }

    pub fn uv(&self, barycentrics: Vec2) -> Vec2 {
        let [a, b, c] = self.vertices.map(|v| v.uv());

        a + (b - a) * barycentrics.x + (c - a) * barycentrics.y
    }

    fn interpolate(
        &self,
        barycentrics: Vec2,
        f: impl Fn(&Vertex) -> Vec3,
    ) -> Vec3 {
        let [a, b, c] = [
            f(&self.vertices[0]),
            f(&self.vertices[1]),
            f(&self.vertices[2]),
        ];

        (1.0 - barycentrics.x - barycentrics.y) * a
            + barycentrics.x * b
            + barycentrics.y * c
    }
}
