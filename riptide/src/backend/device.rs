mod bind_group;
mod buffer;
mod pass;
mod shaders;

use std::sync::Arc;

use derivative::Derivative;
use fxhash::FxHashMap;
use glam::Vec4;
use image::RgbaImage;
use log::{debug, info, trace};

use self::bind_group::*;
use self::buffer::*;
use self::pass::*;
pub use self::shaders::*;
use super::{Backend, BufferLayout};
use crate::gpu::{self, Accumulator, Bucket, CollisionInfo, Ray, RayInfo};
use crate::{Command, CommandList, DispatchSize, Kernel, Resource, SceneData};

/// Backend running kernels as wgpu compute pipelines.
///
/// Requires a device created with [`WgpuBackend::FEATURES`] and limits
/// covering [`WgpuBackend::limits()`]: push constants of at least
/// `size_of::<PassParams>()` bytes, [`WgpuBackend::MIN_STORAGE_BUFFERS`]
/// storage buffers per stage (the shading kernels bind that many) and
/// [`gpu::MAX_WORKGROUPS_PER_DIMENSION`] workgroups per dimension.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct WgpuBackend {
    #[derivative(Debug = "ignore")]
    device: Arc<wgpu::Device>,
    #[derivative(Debug = "ignore")]
    queue: Arc<wgpu::Queue>,
    camera: gpu::Camera,
    layout: Option<BufferLayout>,
    frame: Option<FrameBuffers>,
    scene: Option<SceneBuffers>,
    shaders: Vec<WgslShader>,
    miss: Option<WgslShader>,
    #[derivative(Debug = "ignore")]
    passes: FxHashMap<Kernel, ComputePass>,
}

#[derive(Debug)]
struct FrameBuffers {
    camera: StorageBuffer,
    rays: StorageBuffer,
    ray_infos: StorageBuffer,
    collisions: StorageBuffer,
    ray_refs: StorageBuffer,
    buckets: StorageBuffer,
    accumulators: StorageBuffer,
    output: StorageBuffer,
}

#[derive(Debug)]
struct SceneBuffers {
    vertices: StorageBuffer,
    faces: StorageBuffer,
    nodes: StorageBuffer,
    objects: StorageBuffer,
    lights: StorageBuffer,
}

impl WgpuBackend {
    pub const FEATURES: wgpu::Features = wgpu::Features::PUSH_CONSTANTS;

    /// Largest number of storage buffers any kernel binds.
    pub const MIN_STORAGE_BUFFERS: u32 = 7;

    /// Returns given limits, raised to what the kernels need.
    pub fn limits(base: wgpu::Limits) -> wgpu::Limits {
        let push_constants = std::mem::size_of::<gpu::PassParams>() as u32;

        wgpu::Limits {
            max_push_constant_size: base
                .max_push_constant_size
                .max(push_constants),
            max_storage_buffers_per_shader_stage: base
                .max_storage_buffers_per_shader_stage
                .max(Self::MIN_STORAGE_BUFFERS),
            max_compute_workgroups_per_dimension: base
                .max_compute_workgroups_per_dimension
                .max(gpu::MAX_WORKGROUPS_PER_DIMENSION),
            ..base
        }
    }

    /// Returns whether given adapter is able to run the kernels, i.e. whether
    /// it can provide `limits(downlevel_defaults())`.
    pub fn supports(adapter: &wgpu::Adapter) -> bool {
        let required = Self::limits(wgpu::Limits::downlevel_defaults());

        adapter.features().contains(Self::FEATURES)
            && required.check_limits(&adapter.limits())
    }

    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        info!("Initializing wgpu backend");

        assert!(
            device.features().contains(Self::FEATURES),
            "device doesn't support push constants",
        );

        let limits = device.limits();

        assert!(
            limits.max_push_constant_size as usize
                >= std::mem::size_of::<gpu::PassParams>(),
            "device's push constant limit is too low",
        );

        assert!(
            limits.max_storage_buffers_per_shader_stage
                >= Self::MIN_STORAGE_BUFFERS,
            "device's storage buffer limit is too low (need {}, got {})",
            Self::MIN_STORAGE_BUFFERS,
            limits.max_storage_buffers_per_shader_stage,
        );

        assert!(
            limits.max_compute_workgroups_per_dimension
                >= gpu::MAX_WORKGROUPS_PER_DIMENSION,
            "device's workgroup limit is too low",
        );

        Self {
            device,
            queue,
            camera: Default::default(),
            layout: None,
            frame: None,
            scene: None,
            shaders: Default::default(),
            miss: None,
            passes: Default::default(),
        }
    }

    pub fn layout(&self) -> Option<BufferLayout> {
        self.layout
    }

    /// Records given commands into given encoder; every barrier closes the
    /// current compute pass.
    pub fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        commands: &CommandList,
    ) {
        self.prepare_passes();

        let Some(frame) = &self.frame else {
            panic!("buffers have not been allocated");
        };

        let mut dispatches = Vec::new();

        for command in commands.iter().chain([&Command::Barrier]) {
            match command {
                Command::Dispatch {
                    kernel,
                    params,
                    size,
                } => {
                    dispatches.push((*kernel, params, *size));
                }

                Command::Barrier => {
                    if dispatches.is_empty() {
                        continue;
                    }

                    let mut pass = encoder.begin_compute_pass(
                        &wgpu::ComputePassDescriptor {
                            label: Some("riptide_segment"),
                            timestamp_writes: None,
                        },
                    );

                    for (kernel, params, size) in dispatches.drain(..) {
                        let Some(compute) = self.passes.get(&kernel) else {
                            panic!("kernel `{kernel}` has not been bound");
                        };

                        trace!("Dispatching {} ({size:?})", compute.label());

                        compute.bind(&mut pass, params);

                        match size {
                            DispatchSize::Direct(invocations) => {
                                let size = gpu::dispatch_for(invocations);

                                pass.dispatch_workgroups(
                                    size.x, size.y, size.z,
                                );
                            }

                            DispatchSize::Indirect(bucket) => {
                                pass.dispatch_workgroups_indirect(
                                    frame.buckets.buffer(),
                                    bucket as u64
                                        * std::mem::size_of::<Bucket>() as u64,
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn rays(&self) -> Vec<Ray> {
        self.download(|frame| &frame.rays, self.ray_slots())
    }

    pub fn ray_infos(&self) -> Vec<RayInfo> {
        self.download(|frame| &frame.ray_infos, self.ray_slots())
    }

    pub fn collisions(&self) -> Vec<CollisionInfo> {
        self.download(|frame| &frame.collisions, self.ray_slots())
    }

    pub fn buckets(&self) -> Vec<Bucket> {
        let len = self.layout.map_or(0, |layout| layout.bucket_count);

        self.download(|frame| &frame.buckets, len as usize)
    }

    pub fn accumulators(&self) -> Vec<Accumulator> {
        self.download(|frame| &frame.accumulators, self.pixel_count())
    }

    pub fn output(&self) -> Vec<Vec4> {
        self.download(|frame| &frame.output, self.pixel_count())
    }

    /// Downloads the post-processed image and converts it into 8-bit RGBA.
    pub fn snapshot(&self) -> RgbaImage {
        super::to_rgba_image(&self.camera, &self.output())
    }

    /// Reads back given frame buffer, blocking until the device is idle.
    fn download<T>(
        &self,
        buffer: impl FnOnce(&FrameBuffers) -> &StorageBuffer,
        len: usize,
    ) -> Vec<T>
    where
        T: bytemuck::Pod,
    {
        let Some(frame) = &self.frame else {
            return Vec::new();
        };

        buffer(frame).download(&self.device, &self.queue, len)
    }

    fn ray_slots(&self) -> usize {
        self.layout.map_or(0, |layout| layout.ray_slots())
    }

    fn pixel_count(&self) -> usize {
        self.layout.map_or(0, |layout| layout.pixel_count as usize)
    }

    fn kernels(&self) -> impl Iterator<Item = Kernel> + '_ {
        Kernel::BUILTIN
            .into_iter()
            .chain((0..self.shaders.len() as u32).map(Kernel::Shading))
    }

    /// (Re)creates pipelines, if any of their inputs has changed since they
    /// were last built.
    fn prepare_passes(&mut self) {
        if !self.passes.is_empty() {
            return;
        }

        let (Some(frame), Some(scene), Some(miss)) =
            (&self.frame, &self.scene, &self.miss)
        else {
            panic!(
                "cannot prepare passes before buffers, scene and shaders \
                 are all in place"
            );
        };

        info!("Building pipelines ({} materials)", self.shaders.len());

        let passes: FxHashMap<_, _> = self
            .kernels()
            .map(|kernel| {
                let source = kernel_source(kernel, &self.shaders, miss);

                let module = self.device.create_shader_module(
                    wgpu::ShaderModuleDescriptor {
                        label: Some(&format!("riptide_{kernel}")),
                        source: wgpu::ShaderSource::Wgsl(source.into()),
                    },
                );

                let binders: Vec<_> = bindings(kernel)
                    .iter()
                    .map(|&(resource, read_only)| {
                        let buffer = buffer_of(frame, scene, resource);

                        let binder: Box<dyn Bindable + '_> = if read_only {
                            Box::new(buffer.as_ro_bind())
                        } else {
                            Box::new(buffer.as_rw_bind())
                        };

                        binder
                    })
                    .collect();

                let pass = ComputePass::<gpu::PassParams>::builder(kernel)
                    .bind(binders.iter().map(|binder| &**binder))
                    .build(&self.device, &(module, "main"));

                (kernel, pass)
            })
            .collect();

        self.passes = passes;
    }
}

impl Backend for WgpuBackend {
    type Shader = WgslShader;

    fn allocate(&mut self, layout: BufferLayout) {
        info!(
            "Allocating device buffers (pixels={}, buckets={})",
            layout.pixel_count, layout.bucket_count,
        );

        let device = &self.device;
        let slots = layout.ray_slots();
        let pixels = layout.pixel_count as usize;
        let buckets = layout.bucket_count as usize;

        let frame = FrameBuffers {
            camera: StorageBuffer::new(
                device,
                "camera",
                std::mem::size_of::<gpu::Camera>(),
                wgpu::BufferUsages::empty(),
            ),
            rays: StorageBuffer::new(
                device,
                "rays",
                slots * std::mem::size_of::<Ray>(),
                wgpu::BufferUsages::empty(),
            ),
            ray_infos: StorageBuffer::new(
                device,
                "ray_infos",
                slots * std::mem::size_of::<RayInfo>(),
                wgpu::BufferUsages::empty(),
            ),
            collisions: StorageBuffer::new(
                device,
                "collisions",
                slots * std::mem::size_of::<CollisionInfo>(),
                wgpu::BufferUsages::empty(),
            ),
            ray_refs: StorageBuffer::new(
                device,
                "ray_refs",
                slots * std::mem::size_of::<gpu::RayRef>(),
                wgpu::BufferUsages::empty(),
            ),
            buckets: StorageBuffer::new(
                device,
                "buckets",
                buckets * std::mem::size_of::<Bucket>(),
                wgpu::BufferUsages::INDIRECT,
            ),
            accumulators: StorageBuffer::new(
                device,
                "accumulators",
                pixels * std::mem::size_of::<Accumulator>(),
                wgpu::BufferUsages::empty(),
            ),
            output: StorageBuffer::new(
                device,
                "output",
                pixels * std::mem::size_of::<Vec4>(),
                wgpu::BufferUsages::empty(),
            ),
        };

        frame.camera.write(&self.queue, 0, &[self.camera]);

        self.frame = Some(frame);
        self.layout = Some(layout);
        self.passes.clear();
    }

    fn write_scene(&mut self, scene: SceneData<'_>) {
        debug!(
            "Uploading scene (vertices={}, faces={}, nodes={})",
            scene.vertices.len(),
            scene.faces.len(),
            scene.nodes.len(),
        );

        let (device, queue) = (&self.device, &self.queue);

        self.scene = Some(SceneBuffers {
            vertices: StorageBuffer::with_data(
                device,
                queue,
                "vertices",
                scene.vertices,
            ),
            faces: StorageBuffer::with_data(
                device,
                queue,
                "faces",
                scene.faces,
            ),
            nodes: StorageBuffer::with_data(
                device,
                queue,
                "nodes",
                scene.nodes,
            ),
            objects: StorageBuffer::with_data(
                device,
                queue,
                "objects",
                scene.objects,
            ),
            lights: StorageBuffer::with_data(
                device,
                queue,
                "lights",
                scene.lights,
            ),
        });

        self.passes.clear();
    }

    fn write_camera(&mut self, camera: &gpu::Camera) {
        self.camera = *camera;

        if let Some(frame) = &self.frame {
            frame.camera.write(&self.queue, 0, &[*camera]);
        }
    }

    fn bind_shaders(&mut self, shaders: Vec<WgslShader>, miss: WgslShader) {
        self.shaders = shaders;
        self.miss = Some(miss);
        self.passes.clear();
    }

    fn submit(&mut self, commands: &CommandList) {
        debug_assert!(
            commands.hazards().is_empty(),
            "command list contains hazards: {:?}",
            commands.hazards(),
        );

        let mut encoder =
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("riptide_frame"),
                });

        self.encode(&mut encoder, commands);
        self.queue.submit([encoder.finish()]);
    }
}

/// Buffers bound to given kernel, in binding order; must match the
/// declarations of the kernel's WGSL source.
fn bindings(kernel: Kernel) -> &'static [(Resource, bool)] {
    use Resource::*;

    match kernel {
        Kernel::RayGeneration => {
            &[(Camera, true), (Rays, false), (RayInfos, false)]
        }

        Kernel::Intersection => &[
            (Nodes, true),
            (Faces, true),
            (Vertices, true),
            (Objects, true),
            (Rays, false),
            (Collisions, false),
        ],

        Kernel::SortPrepare => {
            &[(Rays, true), (RayRefs, false), (Buckets, false)]
        }

        Kernel::SortCount => &[(RayRefs, true), (Buckets, false)],
        Kernel::SortMerge => &[(RayRefs, false)],
        Kernel::SortPrefixSum => &[(Buckets, false)],

        Kernel::SortFinish => &[
            (RayRefs, true),
            (Rays, false),
            (RayInfos, false),
            (Collisions, false),
        ],

        Kernel::Shading(_) => &[
            (Faces, true),
            (Vertices, true),
            (Lights, true),
            (Buckets, true),
            (Collisions, true),
            (Rays, false),
            (RayInfos, false),
        ],

        Kernel::Miss => &[
            (Buckets, true),
            (Collisions, true),
            (Rays, false),
            (RayInfos, false),
        ],

        Kernel::Accumulation => &[(RayInfos, true), (Accumulators, false)],
        Kernel::PostProcessing => &[(Accumulators, true), (Output, false)],
    }
}

fn buffer_of<'a>(
    frame: &'a FrameBuffers,
    scene: &'a SceneBuffers,
    resource: Resource,
) -> &'a StorageBuffer {
    match resource {
        Resource::Camera => &frame.camera,
        Resource::Rays => &frame.rays,
        Resource::RayInfos => &frame.ray_infos,
        Resource::Collisions => &frame.collisions,
        Resource::RayRefs => &frame.ray_refs,
        Resource::Buckets => &frame.buckets,
        Resource::Accumulators => &frame.accumulators,
        Resource::Output => &frame.output,
        Resource::Vertices => &scene.vertices,
        Resource::Faces => &scene.faces,
        Resource::Nodes => &scene.nodes,
        Resource::Objects => &scene.objects,
        Resource::Lights => &scene.lights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_fit_storage_buffer_limit() {
        let kernels = Kernel::BUILTIN.into_iter().chain([Kernel::Shading(0)]);

        let widest = kernels
            .map(|kernel| bindings(kernel).len() as u32)
            .max()
            .unwrap_or_default();

        assert_eq!(WgpuBackend::MIN_STORAGE_BUFFERS, widest);

        assert!(
            wgpu::Limits::downlevel_defaults()
                .max_storage_buffers_per_shader_stage
                < widest
        );
    }

    #[test]
    fn limits_are_raised_to_kernel_needs() {
        let limits = WgpuBackend::limits(wgpu::Limits::downlevel_defaults());

        assert_eq!(
            WgpuBackend::MIN_STORAGE_BUFFERS,
            limits.max_storage_buffers_per_shader_stage,
        );

        assert!(
            limits.max_push_constant_size as usize
                >= std::mem::size_of::<gpu::PassParams>()
        );

        assert!(
            limits.max_compute_workgroups_per_dimension
                >= gpu::MAX_WORKGROUPS_PER_DIMENSION
        );

        // Limits that are already high enough stay untouched
        let limits = WgpuBackend::limits(wgpu::Limits {
            max_push_constant_size: 128,
            ..wgpu::Limits::default()
        });

        assert_eq!(128, limits.max_push_constant_size);
        assert_eq!(8, limits.max_storage_buffers_per_shader_stage);
    }

    #[test]
    fn bindings_cover_accessed_resources() {
        let kernels = Kernel::BUILTIN.into_iter().chain([Kernel::Shading(0)]);

        for kernel in kernels {
            let bound: Vec<_> =
                bindings(kernel).iter().map(|(res, _)| *res).collect();

            for res in kernel.reads().iter().chain(kernel.writes()) {
                assert!(bound.contains(res), "{kernel} doesn't bind {res:?}");
            }

            for (res, read_only) in bindings(kernel) {
                assert_eq!(
                    *read_only,
                    !kernel.writes().contains(res),
                    "{kernel} binds {res:?} with a wrong access mode",
                );
            }
        }
    }
}
