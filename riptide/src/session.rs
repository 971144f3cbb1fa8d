mod params;
mod state;

use std::ops::Range;

use glam::Vec3;
use log::{debug, info};

pub use self::params::*;
pub use self::state::*;
use crate::bvh::{self, BvhBuilder, SplitStrategy};
use crate::gpu::{Face, GpuBvhNode, Light, ObjectInfo, Vertex};
use crate::{utils, Camera, Mesh};

/// One render scene's worth of geometry.
///
/// Meshes and light sources are submitted within a `begin()` / `end()`
/// scope; each one gets its own BVH, appended into scene-wide arrays that
/// are uploaded to the device once the session is bound to a scheduler.
#[derive(Clone, Debug, Default)]
pub struct TraceSession {
    state: SessionState,
    params: TraceParams,
    split_strategy: SplitStrategy,
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    nodes: Vec<GpuBvhNode>,
    objects: Vec<ObjectInfo>,
    lights: Vec<Light>,
    meshes: Vec<MeshInfo>,
    light_infos: Vec<LightInfo>,
    depth: usize,
    revision: u64,
    sample_count: u32,
}

/// Nodes of a submitted renderable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshInfo {
    pub nodes: Range<u32>,
}

/// Nodes of a submitted light source, along with its entry in the lights
/// table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightInfo {
    pub nodes: Range<u32>,
    pub light: u32,
}

/// Borrowed view of a session's geometry, as uploaded to the device.
#[derive(Clone, Copy, Debug)]
pub struct SceneData<'a> {
    pub vertices: &'a [Vertex],
    pub faces: &'a [Face],
    pub nodes: &'a [GpuBvhNode],
    pub objects: &'a [ObjectInfo],
    pub lights: &'a [Light],
}

impl TraceSession {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_split_strategy(mut self, strategy: SplitStrategy) -> Self {
        self.split_strategy = strategy;
        self
    }

    /// Opens a new scope, discarding previously submitted geometry.
    pub fn begin(&mut self, params: TraceParams) {
        self.state.apply(SessionOp::Begin);

        info!("Beginning trace session: {}", params.camera.describe());

        self.params = params;
        self.vertices.clear();
        self.faces.clear();
        self.nodes.clear();
        self.objects.clear();
        self.lights.clear();
        self.meshes.clear();
        self.light_infos.clear();
        self.depth = 0;
        self.revision += 1;
        self.sample_count = 0;
    }

    pub fn submit_renderable(&mut self, mesh: &Mesh, bvh_depth: usize) {
        let nodes = self.submit(mesh, bvh_depth, ObjectInfo::NOT_A_LIGHT);

        self.meshes.push(MeshInfo { nodes });
    }

    pub fn submit_light_src(
        &mut self,
        mesh: &Mesh,
        emission: Vec3,
        bvh_depth: usize,
    ) {
        let light = self.lights.len() as u32;
        let nodes = self.submit(mesh, bvh_depth, light);

        self.lights.push(Light {
            emission: emission.extend(0.0),
        });

        self.light_infos.push(LightInfo { nodes, light });
    }

    fn submit(
        &mut self,
        mesh: &Mesh,
        bvh_depth: usize,
        light: u32,
    ) -> Range<u32> {
        self.state.apply(SessionOp::Submit);

        assert!(!mesh.is_empty(), "cannot submit a mesh without faces");

        let (vertices, faces) = mesh.serialize(light);

        for face in &faces {
            for &vertex in &face.vertices {
                assert!(
                    (vertex as usize) < vertices.len(),
                    "face references vertex #{vertex}, but mesh has only {} \
                     vertices",
                    vertices.len(),
                );
            }
        }

        let bvh = utils::measure("bvh", || {
            BvhBuilder::new(bvh_depth)
                .with_strategy(self.split_strategy)
                .build(&vertices, &faces)
        });

        let vertex_offset = self.vertices.len() as u32;
        let face_offset = self.faces.len() as u32;

        self.vertices.extend_from_slice(bvh.vertices());

        self.faces.extend(bvh.faces().iter().map(|face| Face {
            vertices: face.vertices.map(|vertex| vertex + vertex_offset),
            ..*face
        }));

        let begin_node =
            bvh::serializer::run(&bvh, face_offset, &mut self.nodes);

        let end_node = self.nodes.len() as u32;

        self.objects.push(ObjectInfo::new(begin_node, end_node, light));

        self.depth = self.depth.max(bvh.depth());

        debug!(
            "Submitted {} (faces={}, nodes={}, depth={})",
            if light == ObjectInfo::NOT_A_LIGHT {
                "renderable"
            } else {
                "light source"
            },
            faces.len(),
            end_node - begin_node,
            bvh.depth(),
        );

        begin_node..end_node
    }

    pub fn end(&mut self) {
        self.state.apply(SessionOp::End);

        info!(
            "Trace session ready: {} mesh(es), {} light(s), {} face(s), {} \
             node(s)",
            self.meshes.len(),
            self.light_infos.len(),
            self.faces.len(),
            self.nodes.len(),
        );
    }

    /// Restarts progressive accumulation, keeping the geometry.
    pub fn clear(&mut self) {
        self.state.apply(SessionOp::Clear);
        self.sample_count = 0;
    }

    /// Moves the camera; like [`Self::clear()`], this restarts accumulation.
    pub fn set_camera(&mut self, camera: Camera) {
        self.clear();
        self.params.camera = camera;
    }

    /// Invalidates the session entirely.
    pub fn reset(&mut self) {
        self.state.apply(SessionOp::Reset);

        let revision = self.revision;

        *self = Self {
            revision,
            split_strategy: self.split_strategy,
            ..Default::default()
        };
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn params(&self) -> &TraceParams {
        &self.params
    }

    pub fn meshes(&self) -> &[MeshInfo] {
        &self.meshes
    }

    pub fn lights(&self) -> &[LightInfo] {
        &self.light_infos
    }

    /// Incremented every time a new scope begins; identifies the geometry a
    /// scheduler has been bound to.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Whether the next trace should discard the accumulated image.
    pub fn needs_reset(&self) -> bool {
        self.sample_count == 0
    }

    pub fn is_converged(&self) -> bool {
        self.params
            .samples_per_pixel
            .is_some_and(|spp| self.sample_count >= spp)
    }

    /// Depth of the deepest BVH submitted so far.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn scene(&self) -> SceneData<'_> {
        SceneData {
            vertices: &self.vertices,
            faces: &self.faces,
            nodes: &self.nodes,
            objects: &self.objects,
            lights: &self.lights,
        }
    }

    pub(crate) fn transition(&mut self, op: SessionOp) {
        self.state.apply(op);
    }

    pub(crate) fn mark_traced(&mut self) {
        self.sample_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;
    use crate::MeshFace;

    fn triangle(offset: Vec3, bucket: u32) -> Mesh {
        Mesh::from_triangles(
            [[offset, offset + Vec3::X, offset + Vec3::Y]],
            bucket,
        )
    }

    fn session() -> TraceSession {
        let mut target = TraceSession::new();

        target.begin(Default::default());
        target
    }

    #[test]
    fn accumulates_geometry() {
        let mut target = session();

        target.submit_renderable(&triangle(Vec3::ZERO, 0), 4);
        target.submit_light_src(&triangle(Vec3::Z, 1), Vec3::splat(5.0), 4);
        target.end();

        assert_eq!(SessionState::Ready, target.state());
        assert_eq!(vec![MeshInfo { nodes: 0..1 }], target.meshes());

        assert_eq!(
            vec![LightInfo {
                nodes: 1..2,
                light: 0
            }],
            target.lights()
        );

        let scene = target.scene();

        assert_eq!(6, scene.vertices.len());
        assert_eq!([3, 4, 5], scene.faces[1].vertices);
        assert_eq!(1, scene.nodes[1].begin);
        assert_eq!(2, scene.nodes[1].end);
        assert_eq!(ObjectInfo::NOT_A_LIGHT, scene.objects[0].light);
        assert_eq!(0, scene.objects[1].light);
        assert_eq!(0, scene.faces[1].light);
        assert_eq!(5.0, scene.lights[0].emission.x);

        for face in scene.faces {
            for vertex in face.vertices {
                assert!((vertex as usize) < scene.vertices.len());
            }
        }
    }

    #[test]
    fn offsets_nested_nodes() {
        let mut target = session();

        let cluster = |x: f32| {
            Mesh::from_triangles(
                (0..4).map(|i| {
                    let o = vec3(x + (i as f32) * 10.0, 0.0, 0.0);

                    [o, o + Vec3::X, o + Vec3::Y]
                }),
                0,
            )
        };

        target.submit_renderable(&cluster(0.0), 8);
        target.submit_renderable(&cluster(100.0), 8);
        target.end();

        let scene = target.scene();
        let second = &target.meshes()[1].nodes;

        assert_eq!(7, second.start);
        assert_eq!(14, second.end);

        for node in &scene.nodes[second.start as usize..] {
            assert!(node.begin >= 4 && node.end <= 8);

            if !node.is_leaf() {
                assert!(second.contains(&node.left));
                assert!(second.contains(&node.right));
            }
        }
    }

    #[test]
    fn begin_discards_previous_scope() {
        let mut target = session();

        target.submit_renderable(&triangle(Vec3::ZERO, 0), 4);
        target.end();
        target.begin(Default::default());
        target.end();

        assert_eq!(2, target.revision());
        assert!(target.scene().faces.is_empty());
        assert!(target.meshes().is_empty());
    }

    #[test]
    fn clear_restarts_accumulation() {
        let mut target = session();

        target.end();
        target.transition(SessionOp::Bind);
        target.mark_traced();

        assert!(!target.needs_reset());

        target.clear();

        assert_eq!(SessionState::Ready, target.state());
        assert!(target.needs_reset());
        assert_eq!(1, target.revision());
    }

    #[test]
    fn convergence() {
        let mut target = TraceSession::new();

        target.begin(TraceParams {
            samples_per_pixel: Some(2),
            ..Default::default()
        });

        target.end();
        target.mark_traced();
        assert!(!target.is_converged());
        target.mark_traced();
        assert!(target.is_converged());
    }

    #[test]
    fn reset() {
        let mut target = session();

        target.submit_renderable(&triangle(Vec3::ZERO, 0), 4);
        target.reset();

        assert_eq!(SessionState::Reset, target.state());
        assert!(target.scene().vertices.is_empty());

        target.begin(Default::default());
        assert_eq!(2, target.revision());
    }

    #[test]
    #[should_panic(expected = "cannot submit to trace session in state reset")]
    fn submit_before_begin() {
        TraceSession::new().submit_renderable(&triangle(Vec3::ZERO, 0), 4);
    }

    #[test]
    #[should_panic(expected = "cannot submit to trace session in state ready")]
    fn submit_after_end() {
        let mut target = session();

        target.end();
        target.submit_renderable(&triangle(Vec3::ZERO, 0), 4);
    }

    #[test]
    #[should_panic(expected = "cannot begin trace session in state open-scope")]
    fn begin_twice() {
        let mut target = session();

        target.begin(Default::default());
    }

    #[test]
    #[should_panic(expected = "cannot clear trace session in state reset")]
    fn clear_before_begin() {
        TraceSession::new().clear();
    }

    #[test]
    #[should_panic(expected = "cannot submit a mesh without faces")]
    fn empty_mesh() {
        session().submit_renderable(&Mesh::default(), 4);
    }

    #[test]
    #[should_panic(expected = "face references vertex #3")]
    fn out_of_bounds_face() {
        let mesh = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![MeshFace {
                vertices: [0, 1, 3],
                bucket: 0,
            }],
        );

        session().submit_renderable(&mesh, 4);
    }
}
