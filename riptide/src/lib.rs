//! Wavefront path tracer.
//!
//! Instead of tracing each ray to completion, the whole population of rays
//! is advanced one bounce at a time through a fixed sequence of wide
//! dispatches: generation, intersection, (optional) sorting by material,
//! shading and accumulation.
//!
//! - [`TraceSession`] accumulates scene geometry, building a BVH per mesh,
//! - [`WavefrontScheduler`] records frames into [`CommandList`]s,
//! - [`Backend`]s execute those lists, either in-process ([`HostBackend`])
//!   or through wgpu ([`WgpuBackend`]).

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::too_many_arguments)]

mod backend;
mod camera;
mod commands;
mod kernel;
mod mesh;
mod scheduler;
mod session;
mod sorter;
mod utils;

pub mod bvh;

pub use riptide_gpu as gpu;

pub use self::backend::*;
pub use self::camera::*;
pub use self::commands::*;
pub use self::kernel::*;
pub use self::mesh::*;
pub use self::scheduler::*;
pub use self::session::*;
pub use self::sorter::*;
pub use self::utils::*;
