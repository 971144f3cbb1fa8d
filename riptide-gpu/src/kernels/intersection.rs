use crate::{
    BVH_STACK_SIZE, CollisionInfo, Face, GpuBvhNode, ObjectInfo, PassParams,
    Ray, Triangle, Vertex,
};

#[derive(Clone, Copy)]
pub struct Scene<'a> {
    pub nodes: &'a [GpuBvhNode],
    pub faces: &'a [Face],
    pub vertices: &'a [Vertex],
    pub objects: &'a [ObjectInfo],
}

pub fn main(
    id: u32,
    params: &PassParams,
    scene: Scene<'_>,
    rays: &mut [Ray],
    collisions: &mut [CollisionInfo],
) {
    if id >= params.ray_count {
        return;
    }

    let ray = &mut rays[id as usize];

    if !ray.is_active() {
        ray.bucket = Ray::MISS;
        collisions[id as usize] = CollisionInfo::none();
        return;
    }

    let collision = trace(scene, params.object_count, ray);

    ray.bucket = collision.bucket;
    collisions[id as usize] = collision;
}

/// Finds the closest intersection of given ray across all objects.
pub fn trace(scene: Scene<'_>, object_count: u32, ray: &Ray) -> CollisionInfo {
    let mut closest_distance = f32::MAX;
    let mut closest = None;

    for object in &scene.objects[..object_count as usize] {
        let mut stack = [0u32; BVH_STACK_SIZE];
        let mut stack_len = 1;

        stack[0] = object.begin_node;

        while stack_len > 0 {
            stack_len -= 1;

            let node = &scene.nodes[stack[stack_len] as usize];

            if node.distance(ray) >= closest_distance {
                continue;
            }

            if node.is_leaf() {
                for face_id in node.begin..node.end {
                    let face = &scene.faces[face_id as usize];
                    let triangle = Triangle::fetch(scene.vertices, face);

                    if let Some(hit) = triangle.hit(ray, closest_distance) {
                        closest_distance = hit.distance;
                        closest = Some((face_id, triangle, hit));
                    }
                }
            } else {
                let left = &scene.nodes[node.left as usize];
                let right = &scene.nodes[node.right as usize];

                // Visit the nearer child first
                let (near, far) = if left.distance(ray) <= right.distance(ray) {
                    (node.left, node.right)
                } else {
                    (node.right, node.left)
                };

                stack[stack_len] = far;
                stack[stack_len + 1] = near;
                stack_len += 2;
            }
        }
    }

    let Some((face_id, triangle, hit)) = closest else {
        return CollisionInfo::none();
    };

    let face = &scene.faces[face_id as usize];
    let mut collision = CollisionInfo::none();
    let mut normal = triangle.shading_normal(hit.barycentrics);

    collision.mark_hit();

    if normal.dot(ray.direction()) > 0.0 {
        normal = -normal;
        collision.mark_flipped();
    }

    if face.is_light() {
        collision.mark_light(face.light);
    }

    collision.position = ray.at(hit.distance);
    collision.distance = hit.distance;
    collision.normal = normal;
    collision.barycentrics = hit.barycentrics;
    collision.primitive = face_id;
    collision.bucket = face.bucket;
    collision
}
