use std::sync::Arc;

use glam::{vec3, UVec2, Vec3};
use riptide::*;

/// Returns `None` when there's no adapter capable of running the kernels,
/// e.g. on headless CI machines.
fn backend() -> Option<WgpuBackend> {
    let instance = wgpu::Instance::default();

    let adapter = pollster::block_on(
        instance.request_adapter(&wgpu::RequestAdapterOptions::default()),
    )?;

    if !WgpuBackend::supports(&adapter) {
        return None;
    }

    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("riptide_tests"),
            required_features: WgpuBackend::FEATURES,
            required_limits: WgpuBackend::limits(
                wgpu::Limits::downlevel_defaults(),
            )
            .using_resolution(adapter.limits()),
            ..Default::default()
        },
        None,
    ))
    .ok()?;

    Some(WgpuBackend::new(Arc::new(device), Arc::new(queue)))
}

fn session() -> TraceSession {
    let mut session = TraceSession::new();

    session.begin(TraceParams {
        camera: Camera {
            viewport_size: UVec2::new(16, 8),
            ..Default::default()
        },
        max_bounces: 2,
        ..Default::default()
    });

    let a = vec3(-10.0, -10.0, -5.0);
    let b = vec3(0.0, -10.0, -5.0);
    let c = vec3(0.0, 10.0, -5.0);
    let d = vec3(-10.0, 10.0, -5.0);

    session.submit_renderable(
        &Mesh::from_triangles([[a, b, c], [a, c, d]], 0),
        8,
    );

    session.end();
    session
}

#[test]
fn smoke() {
    for sort_rays in [false, true] {
        let Some(backend) = backend() else {
            return;
        };

        let mut target = WavefrontScheduler::new(
            backend,
            SchedulerConfig {
                sort_rays,
                ..Default::default()
            },
        );

        target.set_materials(
            vec![WgslShader::constant(vec3(1.0, 0.0, 0.0))],
            WgslShader::constant(vec3(0.0, 0.0, 1.0)),
        );

        let mut session = session();
        let mut commands = CommandList::new();

        target.set_trace_session(&mut session);
        target.trace_with_seed(&mut session, &mut commands, 1);
        target.backend_mut().submit(&commands);

        let accumulators = target.backend().accumulators();

        assert_eq!(128, accumulators.len());

        for y in 0..8 {
            assert_eq!(vec3(1.0, 0.0, 0.0), accumulators[y * 16].mean());
            assert_eq!(vec3(0.0, 0.0, 1.0), accumulators[y * 16 + 15].mean());
        }

        let image = target.backend().snapshot();

        assert_eq!((16, 8), image.dimensions());
        assert!(image.pixels().all(|pixel| pixel.0[3] == 255));
        assert_ne!(Vec3::ZERO, accumulators[0].mean());
    }
}
