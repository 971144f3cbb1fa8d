use derivative::Derivative;
use glam::{UVec3, Vec4};
use image::RgbaImage;
use log::{debug, info};

use super::{Backend, BufferLayout};
use crate::gpu::kernels::{self, intersection, shading};
use crate::gpu::{
    self, Accumulator, Bucket, CollisionInfo, Face, GpuBvhNode, Light, Noise,
    ObjectInfo, PassParams, Ray, RayInfo, RayRef, Shade, ShadeInput, Shader,
    Vertex, WORKGROUP_SIZE,
};
use crate::{Command, CommandList, DispatchSize, Kernel, SceneData};

pub type HostShader = Box<dyn Shader + Send + Sync>;

/// Wraps a closure into a [`HostShader`].
pub fn host_shader<F>(f: F) -> HostShader
where
    F: Fn(&ShadeInput, &mut Noise) -> Shade + Send + Sync + 'static,
{
    Box::new(f)
}

/// Backend executing kernels on the CPU, one invocation after another.
///
/// Mostly useful for testing and debugging: every buffer can be inspected
/// after a command list has been submitted.
#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct HostBackend {
    camera: gpu::Camera,
    layout: Option<BufferLayout>,
    #[derivative(Debug = "ignore")]
    rays: Vec<Ray>,
    #[derivative(Debug = "ignore")]
    ray_infos: Vec<RayInfo>,
    #[derivative(Debug = "ignore")]
    collisions: Vec<CollisionInfo>,
    #[derivative(Debug = "ignore")]
    ray_refs: Vec<RayRef>,
    buckets: Vec<Bucket>,
    #[derivative(Debug = "ignore")]
    vertices: Vec<Vertex>,
    #[derivative(Debug = "ignore")]
    faces: Vec<Face>,
    #[derivative(Debug = "ignore")]
    nodes: Vec<GpuBvhNode>,
    objects: Vec<ObjectInfo>,
    lights: Vec<Light>,
    #[derivative(Debug = "ignore")]
    accumulators: Vec<Accumulator>,
    #[derivative(Debug = "ignore")]
    output: Vec<Vec4>,
    #[derivative(Debug = "ignore")]
    shaders: Vec<HostShader>,
    #[derivative(Debug = "ignore")]
    miss: Option<HostShader>,
}

impl HostBackend {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn layout(&self) -> Option<BufferLayout> {
        self.layout
    }

    /// All ray slots, i.e. both halves.
    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }

    pub fn rays_mut(&mut self) -> &mut [Ray] {
        &mut self.rays
    }

    pub fn ray_infos(&self) -> &[RayInfo] {
        &self.ray_infos
    }

    pub fn collisions(&self) -> &[CollisionInfo] {
        &self.collisions
    }

    pub fn ray_refs(&self) -> &[RayRef] {
        &self.ray_refs
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn accumulators(&self) -> &[Accumulator] {
        &self.accumulators
    }

    pub fn output(&self) -> &[Vec4] {
        &self.output
    }

    /// Returns given half of the ray arrays, as `(rays, infos, collisions)`.
    pub fn half(&self, half: u32) -> (&[Ray], &[RayInfo], &[CollisionInfo]) {
        let range = self.half_range(half);

        (
            &self.rays[range.clone()],
            &self.ray_infos[range.clone()],
            &self.collisions[range],
        )
    }

    /// Converts the post-processed image into 8-bit RGBA.
    pub fn snapshot(&self) -> RgbaImage {
        super::to_rgba_image(&self.camera, &self.output)
    }

    fn half_range(&self, half: u32) -> std::ops::Range<usize> {
        let n = self.pixel_count();
        let start = half as usize * n;

        start..(start + n)
    }

    fn pixel_count(&self) -> usize {
        self.layout.map_or(0, |layout| layout.pixel_count as usize)
    }

    fn invocations(&self, size: DispatchSize) -> u32 {
        let workgroups = match size {
            DispatchSize::Direct(invocations) => {
                gpu::dispatch_for(invocations)
            }

            DispatchSize::Indirect(bucket) => {
                let bucket = self.buckets[bucket as usize];

                UVec3::new(
                    bucket.dispatch_x,
                    bucket.dispatch_y,
                    bucket.dispatch_z,
                )
            }
        };

        // Lanes of the flattened grid, see `gpu::invocation_id()`
        workgroups.x * workgroups.y * workgroups.z * WORKGROUP_SIZE
    }

    fn dispatch(
        &mut self,
        kernel: Kernel,
        params: &PassParams,
        size: DispatchSize,
    ) {
        let invocations = self.invocations(size);
        let n = params.ray_count as usize;
        let active = params.active;

        let Self {
            camera,
            rays,
            ray_infos,
            collisions,
            ray_refs,
            buckets,
            vertices,
            faces,
            nodes,
            objects,
            lights,
            accumulators,
            output,
            shaders,
            miss,
            ..
        } = self;

        let scene = intersection::Scene {
            nodes,
            faces,
            vertices,
            objects,
        };

        match kernel {
            Kernel::RayGeneration => {
                let (rays, _) = halves(rays, n, active);
                let (ray_infos, _) = halves(ray_infos, n, active);

                for id in 0..invocations {
                    kernels::ray_generation::main(
                        id, params, camera, rays, ray_infos,
                    );
                }
            }

            Kernel::Intersection => {
                let (rays, _) = halves(rays, n, active);
                let (collisions, _) = halves(collisions, n, active);

                for id in 0..invocations {
                    kernels::intersection::main(
                        id, params, scene, rays, collisions,
                    );
                }
            }

            Kernel::SortPrepare => {
                let (rays, _) = halves(rays, n, active);

                for id in 0..invocations {
                    kernels::sort_prepare::main(
                        id, params, rays, ray_refs, buckets,
                    );
                }
            }

            Kernel::SortCount => {
                for id in 0..invocations {
                    kernels::sort_count::main(
                        id,
                        params,
                        &ray_refs[..n],
                        buckets,
                    );
                }
            }

            Kernel::SortMerge => {
                let (src, dst) = halves(ray_refs, n, params.refs_half);

                for id in 0..invocations {
                    kernels::sort_merge::main(id, params, src, dst);
                }
            }

            Kernel::SortPrefixSum => {
                for id in 0..invocations {
                    kernels::sort_prefix_sum::main(id, params, buckets);
                }
            }

            Kernel::SortFinish => {
                let (refs, _) = halves(ray_refs, n, params.refs_half);
                let (src_rays, dst_rays) = halves(rays, n, active);
                let (src_infos, dst_infos) = halves(ray_infos, n, active);
                let (src_colls, dst_colls) = halves(collisions, n, active);

                for id in 0..invocations {
                    kernels::sort_finish::main(
                        id,
                        params,
                        refs,
                        (&*src_rays, &*src_infos, &*src_colls),
                        (&mut *dst_rays, &mut *dst_infos, &mut *dst_colls),
                    );
                }
            }

            Kernel::Shading(material) => {
                let shader = &shaders[material as usize];
                let (rays, _) = halves(rays, n, active);
                let (ray_infos, _) = halves(ray_infos, n, active);
                let (collisions, _) = halves(collisions, n, active);

                let materials = shading::Materials {
                    faces,
                    vertices,
                    lights,
                };

                for id in 0..invocations {
                    shading::main(
                        id,
                        params,
                        &**shader,
                        materials,
                        buckets,
                        collisions,
                        rays,
                        ray_infos,
                    );
                }
            }

            Kernel::Miss => {
                let Some(shader) = miss else {
                    panic!("miss shader has not been bound");
                };

                let (rays, _) = halves(rays, n, active);
                let (ray_infos, _) = halves(ray_infos, n, active);
                let (collisions, _) = halves(collisions, n, active);

                for id in 0..invocations {
                    kernels::miss::main(
                        id,
                        params,
                        &**shader,
                        buckets,
                        collisions,
                        rays,
                        ray_infos,
                    );
                }
            }

            Kernel::Accumulation => {
                let (ray_infos, _) = halves(ray_infos, n, active);

                for id in 0..invocations {
                    kernels::accumulation::main(
                        id,
                        params,
                        ray_infos,
                        accumulators,
                    );
                }
            }

            Kernel::PostProcessing => {
                for id in 0..invocations {
                    kernels::post_processing::main(
                        id,
                        params,
                        accumulators,
                        output,
                    );
                }
            }
        }
    }
}

impl Backend for HostBackend {
    type Shader = HostShader;

    fn allocate(&mut self, layout: BufferLayout) {
        info!(
            "Allocating host buffers (pixels={}, buckets={})",
            layout.pixel_count, layout.bucket_count,
        );

        let slots = layout.ray_slots();
        let pixels = layout.pixel_count as usize;

        self.rays = vec![Default::default(); slots];
        self.ray_infos = vec![Default::default(); slots];
        self.collisions = vec![CollisionInfo::none(); slots];
        self.ray_refs = vec![Default::default(); slots];
        self.buckets = vec![Default::default(); layout.bucket_count as usize];
        self.accumulators = vec![Default::default(); pixels];
        self.output = vec![Vec4::ZERO; pixels];
        self.layout = Some(layout);
    }

    fn write_scene(&mut self, scene: SceneData<'_>) {
        debug!(
            "Uploading scene (vertices={}, faces={}, nodes={})",
            scene.vertices.len(),
            scene.faces.len(),
            scene.nodes.len(),
        );

        self.vertices = scene.vertices.to_vec();
        self.faces = scene.faces.to_vec();
        self.nodes = scene.nodes.to_vec();
        self.objects = scene.objects.to_vec();
        self.lights = scene.lights.to_vec();
    }

    fn write_camera(&mut self, camera: &gpu::Camera) {
        self.camera = *camera;
    }

    fn bind_shaders(&mut self, shaders: Vec<HostShader>, miss: HostShader) {
        self.shaders = shaders;
        self.miss = Some(miss);
    }

    fn submit(&mut self, commands: &CommandList) {
        debug_assert!(
            commands.hazards().is_empty(),
            "command list contains hazards: {:?}",
            commands.hazards(),
        );

        assert!(self.layout.is_some(), "buffers have not been allocated");

        for command in commands {
            if let Command::Dispatch {
                kernel,
                params,
                size,
            } = command
            {
                self.dispatch(*kernel, params, *size);
            }
        }
    }
}

/// Splits a double-buffered array into `(selected half, the other one)`.
fn halves<T>(items: &mut [T], n: usize, half: u32) -> (&mut [T], &mut [T]) {
    let (a, b) = items.split_at_mut(n);

    if half == 0 {
        (a, b)
    } else {
        (b, a)
    }
}
