mod config;
mod context;

use derivative::Derivative;
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use self::config::*;
pub use self::context::*;
use crate::gpu::{PassParams, BVH_STACK_SIZE};
use crate::{
    Backend, BufferLayout, Camera, CommandList, DispatchSize, Kernel,
    RayBucketSorter, SessionOp, TraceSession,
};

/// Drives the per-frame bounce loop.
///
/// Scheduler doesn't execute anything by itself: [`Self::trace()`] records
/// a frame into a [`CommandList`] which the caller then submits to the
/// backend, e.g. through [`Self::backend_mut()`].
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct WavefrontScheduler<B>
where
    B: Backend,
{
    #[derivative(Debug = "ignore")]
    backend: B,
    config: SchedulerConfig,
    #[derivative(Debug = "ignore")]
    rng: StdRng,
    material_count: Option<u32>,
    bindings_dirty: bool,
    bound_revision: Option<u64>,
    layout: Option<BufferLayout>,
    camera: Option<Camera>,
    last_frame: Option<FrameContext>,
}

impl<B> WavefrontScheduler<B>
where
    B: Backend,
{
    pub fn new(backend: B, config: SchedulerConfig) -> Self {
        info!("Initializing scheduler: {config:?}");

        Self {
            backend,
            rng: StdRng::seed_from_u64(config.seed),
            config,
            material_count: None,
            bindings_dirty: true,
            bound_revision: None,
            layout: None,
            camera: None,
            last_frame: None,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Installs shading kernels, one per material bucket.
    ///
    /// This invalidates resource bindings; [`Self::set_trace_session()`] has
    /// to be called again before the next trace.
    pub fn set_materials(
        &mut self,
        shaders: Vec<B::Shader>,
        miss: B::Shader,
    ) {
        info!("Binding {} material(s)", shaders.len());

        self.material_count = Some(shaders.len() as u32);
        self.bindings_dirty = true;
        self.backend.bind_shaders(shaders, miss);
    }

    /// Binds the scheduler to given session, uploading its geometry.
    pub fn set_trace_session(&mut self, session: &mut TraceSession) {
        let material_count = self
            .material_count
            .unwrap_or_else(|| panic!("materials must be set before binding"));

        assert!(
            session.depth() < BVH_STACK_SIZE,
            "session's BVH is too deep ({}) to be traversed",
            session.depth(),
        );

        session.transition(SessionOp::Bind);

        info!(
            "Binding trace session (revision={}, materials={})",
            session.revision(),
            material_count,
        );

        self.backend.write_scene(session.scene());
        self.bound_revision = Some(session.revision());
        self.bindings_dirty = false;
        self.update_camera(session.params().camera.clone(), true);
    }

    /// Records a frame, drawing its seed from the scheduler's generator.
    pub fn trace(
        &mut self,
        session: &mut TraceSession,
        commands: &mut CommandList,
    ) -> bool {
        let seed = self.rng.gen();

        self.trace_with_seed(session, commands, seed)
    }

    /// Records a frame with given seed; given the same session state and
    /// seed, the frame is reproduced bit-for-bit.
    ///
    /// Returns `false`, recording nothing, once the session has gathered
    /// its `samples_per_pixel`.
    pub fn trace_with_seed(
        &mut self,
        session: &mut TraceSession,
        commands: &mut CommandList,
        seed: u32,
    ) -> bool {
        assert!(
            !self.bindings_dirty,
            "bindings are stale; call set_trace_session() after changing \
             materials"
        );

        assert_eq!(
            self.bound_revision,
            Some(session.revision()),
            "trace session has changed since it was bound",
        );

        session.transition(SessionOp::Trace);

        if session.is_converged() {
            trace!(
                "Session has converged ({} samples), skipping frame",
                session.sample_count(),
            );

            return false;
        }

        self.update_camera(session.params().camera.clone(), false);

        let Some(layout) = self.layout else {
            unreachable!();
        };

        let bounces = session
            .params()
            .max_bounces
            .min(self.config.max_bounce_limit);

        let base = PassParams {
            ray_count: layout.pixel_count,
            bucket_count: layout.bucket_count,
            object_count: session.scene().objects.len() as u32,
            reset: session.needs_reset() as u32,
            exposure: self.config.exposure,
            sorted: self.config.sort_rays as u32,
            ..Default::default()
        };

        trace!(
            "Recording frame (seed={seed}, bounces={bounces}, reset={})",
            base.reset,
        );

        let mut ctx = FrameContext::new(seed);
        let rays = DispatchSize::Direct(layout.pixel_count);

        commands.dispatch(Kernel::RayGeneration, ctx.params(&base), rays);
        commands.barrier();

        for bounce in 0..bounces {
            ctx = self.record_bounce(ctx.with_bounce(bounce), &base, commands);
        }

        commands.dispatch(Kernel::Accumulation, ctx.params(&base), rays);
        commands.barrier();

        if self.config.post_processing {
            commands.dispatch(Kernel::PostProcessing, ctx.params(&base), rays);
            commands.barrier();
        }

        session.mark_traced();

        self.last_frame = Some(ctx);

        true
    }

    /// Context the most recently recorded frame ended with; its `active`
    /// field tells which half of the ray arrays holds the final rays.
    pub fn last_frame(&self) -> Option<FrameContext> {
        self.last_frame
    }

    fn record_bounce(
        &self,
        ctx: FrameContext,
        base: &PassParams,
        commands: &mut CommandList,
    ) -> FrameContext {
        let rays = DispatchSize::Direct(base.ray_count);

        commands.dispatch(Kernel::Intersection, ctx.params(base), rays);
        commands.barrier();

        let ctx = if self.config.sort_rays {
            RayBucketSorter::new(base.ray_count, base.bucket_count)
                .record(ctx, base, commands)
        } else {
            ctx
        };

        let size = |bucket| {
            if self.config.sort_rays {
                DispatchSize::Indirect(bucket)
            } else {
                rays
            }
        };

        let miss_bucket = base.miss_bucket();

        for material in 0..miss_bucket {
            commands.dispatch(
                Kernel::Shading(material),
                PassParams {
                    bucket: material,
                    ..ctx.params(base)
                },
                size(material),
            );
        }

        commands.dispatch(
            Kernel::Miss,
            PassParams {
                bucket: miss_bucket,
                ..ctx.params(base)
            },
            size(miss_bucket),
        );

        commands.barrier();

        ctx
    }

    fn update_camera(&mut self, camera: Camera, force: bool) {
        if !force && self.camera.as_ref() == Some(&camera) {
            return;
        }

        let Some(material_count) = self.material_count else {
            unreachable!();
        };

        let layout = BufferLayout {
            pixel_count: camera.pixel_count(),
            bucket_count: material_count + 1,
        };

        if self.layout != Some(layout) {
            info!("Allocating buffers for camera: {}", camera.describe());

            self.backend.allocate(layout);
            self.layout = Some(layout);
        } else {
            debug!("Updating camera: {}", camera.describe());
        }

        self.backend.write_camera(&camera.serialize());
        self.camera = Some(camera);
    }
}

#[cfg(test)]
mod tests {
    use glam::{UVec2, Vec3};

    use super::*;
    use crate::gpu;
    use crate::{Command, Mesh, SceneData, TraceParams};

    #[derive(Default)]
    struct RecordingBackend {
        allocations: Vec<BufferLayout>,
        scenes: usize,
        cameras: Vec<gpu::Camera>,
        shaders: usize,
    }

    impl Backend for RecordingBackend {
        type Shader = ();

        fn allocate(&mut self, layout: BufferLayout) {
            self.allocations.push(layout);
        }

        fn write_scene(&mut self, _: SceneData<'_>) {
            self.scenes += 1;
        }

        fn write_camera(&mut self, camera: &gpu::Camera) {
            self.cameras.push(*camera);
        }

        fn bind_shaders(&mut self, shaders: Vec<()>, _: ()) {
            self.shaders = shaders.len();
        }

        fn submit(&mut self, _: &CommandList) {
            //
        }
    }

    fn session(max_bounces: u32) -> TraceSession {
        session_with(TraceParams {
            max_bounces,
            ..Default::default()
        })
    }

    fn session_with(params: TraceParams) -> TraceSession {
        let mut session = TraceSession::new();

        session.begin(TraceParams {
            camera: Camera {
                viewport_size: UVec2::new(8, 4),
                ..Default::default()
            },
            ..params
        });

        session.submit_renderable(
            &Mesh::from_triangles([[Vec3::ZERO, Vec3::X, Vec3::Y]], 0),
            4,
        );

        session.end();
        session
    }

    fn scheduler(
        config: SchedulerConfig,
    ) -> WavefrontScheduler<RecordingBackend> {
        let mut target =
            WavefrontScheduler::new(RecordingBackend::default(), config);

        target.set_materials(vec![(), ()], ());
        target
    }

    #[test]
    fn binding() {
        let mut target = scheduler(Default::default());
        let mut session = session(2);

        target.set_trace_session(&mut session);

        assert_eq!(crate::SessionState::Tracing, session.state());
        assert_eq!(1, target.backend().scenes);
        assert_eq!(2, target.backend().shaders);

        assert_eq!(
            vec![BufferLayout {
                pixel_count: 32,
                bucket_count: 3,
            }],
            target.backend().allocations
        );
    }

    #[test]
    fn unsorted_frame() {
        let mut target = scheduler(SchedulerConfig {
            sort_rays: false,
            max_bounce_limit: 1,
            post_processing: false,
            ..Default::default()
        });

        let mut session = session(5);
        let mut commands = CommandList::new();

        target.set_trace_session(&mut session);
        target.trace_with_seed(&mut session, &mut commands, 1);

        assert_eq!(
            vec![
                Kernel::RayGeneration,
                Kernel::Intersection,
                Kernel::Shading(0),
                Kernel::Shading(1),
                Kernel::Miss,
                Kernel::Accumulation,
            ],
            commands.kernels().collect::<Vec<_>>()
        );

        assert!(commands.hazards().is_empty());
        assert_eq!(4, commands.barriers());
        assert_eq!(Some(0), target.last_frame().map(|ctx| ctx.active));
        assert_eq!(1, session.sample_count());

        for command in &commands {
            if let Command::Dispatch { params, size, .. } = command {
                assert_eq!(DispatchSize::Direct(32), *size);
                assert_eq!(1, params.reset);
                assert_eq!(0, params.sorted);
            }
        }
    }

    #[test]
    fn sorted_frame() {
        let mut target = scheduler(SchedulerConfig {
            max_bounce_limit: 8,
            ..Default::default()
        });

        let mut session = session(3);
        let mut commands = CommandList::new();

        target.set_trace_session(&mut session);
        target.trace_with_seed(&mut session, &mut commands, 1);

        // One flip per bounce
        assert_eq!(Some(1), target.last_frame().map(|ctx| ctx.active));
        assert!(commands.hazards().is_empty());

        let kernels: Vec<_> = commands.kernels().collect();

        let count = |kernel: Kernel| {
            kernels.iter().filter(|k| **k == kernel).count()
        };

        assert_eq!(3, count(Kernel::Intersection));
        assert_eq!(3, count(Kernel::SortFinish));
        assert_eq!(Some(&Kernel::PostProcessing), kernels.last());

        for command in &commands {
            if let Command::Dispatch {
                kernel: Kernel::Shading(material),
                size,
                params,
            } = command
            {
                assert_eq!(DispatchSize::Indirect(*material), *size);
                assert_eq!(*material, params.bucket);
            }

            if let Command::Dispatch {
                kernel: Kernel::Miss,
                size,
                ..
            } = command
            {
                assert_eq!(DispatchSize::Indirect(2), *size);
            }
        }

        // Second frame doesn't reset the accumulated image
        commands.clear();
        target.trace_with_seed(&mut session, &mut commands, 2);

        assert!(commands.iter().all(|command| match command {
            Command::Dispatch { params, .. } => params.reset == 0,
            Command::Barrier => true,
        }));
    }

    #[test]
    fn camera_changes() {
        let mut target = scheduler(Default::default());
        let mut session = session(1);
        let mut commands = CommandList::new();

        target.set_trace_session(&mut session);
        target.trace(&mut session, &mut commands);

        session.set_camera(Camera {
            viewport_size: UVec2::new(8, 4),
            focal_length: 0.1,
            ..Default::default()
        });

        target.trace(&mut session, &mut commands);

        session.set_camera(Camera {
            viewport_size: UVec2::new(16, 4),
            ..Default::default()
        });

        target.trace(&mut session, &mut commands);

        assert_eq!(2, target.backend().allocations.len());
        assert_eq!(3, target.backend().cameras.len());
        assert_eq!(1, session.sample_count());
    }

    #[test]
    fn sample_budget() {
        let mut target = scheduler(Default::default());

        let mut session = session_with(TraceParams {
            max_bounces: 1,
            samples_per_pixel: Some(2),
            ..Default::default()
        });

        target.set_trace_session(&mut session);

        let recorded: Vec<_> = (0..5)
            .map(|_| {
                let mut commands = CommandList::new();
                let traced = target.trace(&mut session, &mut commands);

                (traced, commands.kernels().count() > 0)
            })
            .collect();

        assert_eq!(
            vec![
                (true, true),
                (true, true),
                (false, false),
                (false, false),
                (false, false),
            ],
            recorded
        );

        assert_eq!(2, session.sample_count());
        assert!(session.is_converged());

        // Moving the camera restarts accumulation
        session.set_camera(Camera {
            viewport_size: UVec2::new(8, 4),
            focal_length: 0.1,
            ..Default::default()
        });

        assert!(target.trace(&mut session, &mut CommandList::new()));
        assert_eq!(1, session.sample_count());
    }

    #[test]
    #[should_panic(expected = "bindings are stale")]
    fn stale_bindings() {
        let mut target = scheduler(Default::default());
        let mut session = session(1);

        target.set_trace_session(&mut session);
        target.set_materials(vec![()], ());
        target.trace(&mut session, &mut CommandList::new());
    }

    #[test]
    #[should_panic(expected = "trace session has changed since it was bound")]
    fn rebuilt_session() {
        let mut target = scheduler(Default::default());
        let mut session = session(1);

        target.set_trace_session(&mut session);
        session.clear();
        session.begin(Default::default());
        session.end();
        target.trace(&mut session, &mut CommandList::new());
    }

    #[test]
    #[should_panic(expected = "cannot bind trace session in state open-scope")]
    fn binding_open_session() {
        let mut target = scheduler(Default::default());
        let mut session = TraceSession::new();

        session.begin(Default::default());
        target.set_trace_session(&mut session);
    }

    #[test]
    #[should_panic(expected = "materials must be set before binding")]
    fn binding_without_materials() {
        let mut target = WavefrontScheduler::new(
            RecordingBackend::default(),
            Default::default(),
        );

        target.set_trace_session(&mut session(1));
    }
}
