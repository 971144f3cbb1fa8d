use std::borrow::Cow;

use crate::Kernel;

const COMMON: &str = include_str!("shaders/common.wgsl");
const RAY_GENERATION: &str = include_str!("shaders/ray_generation.wgsl");
const INTERSECTION: &str = include_str!("shaders/intersection.wgsl");
const SORT_PREPARE: &str = include_str!("shaders/sort_prepare.wgsl");
const SORT_COUNT: &str = include_str!("shaders/sort_count.wgsl");
const SORT_MERGE: &str = include_str!("shaders/sort_merge.wgsl");
const SORT_PREFIX_SUM: &str = include_str!("shaders/sort_prefix_sum.wgsl");
const SORT_FINISH: &str = include_str!("shaders/sort_finish.wgsl");
const SHADING: &str = include_str!("shaders/shading.wgsl");
const MISS: &str = include_str!("shaders/miss.wgsl");
const ACCUMULATION: &str = include_str!("shaders/accumulation.wgsl");
const POST_PROCESSING: &str = include_str!("shaders/post_processing.wgsl");

/// User shading kernel, as WGSL source.
///
/// The source must define:
///
/// ```wgsl
/// fn evaluate(input: ShadeInput, noise: ptr<function, Noise>) -> Shade
/// ```
///
/// It's compiled together with a prelude declaring `ShadeInput`, `Shade`,
/// `Noise` and the `noise_sample*()` helpers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WgslShader {
    source: Cow<'static, str>,
}

impl WgslShader {
    pub fn new(source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Shader that ends every path it's given, adding a constant radiance.
    pub fn constant(luminance: glam::Vec3) -> Self {
        Self::new(format!(
            "fn evaluate(input: ShadeInput, noise: ptr<function, Noise>) \
             -> Shade {{\n    \
             return Shade(vec3(0.0), vec3(0.0), vec3({:?}, {:?}, {:?}));\n}}\n",
            luminance.x, luminance.y, luminance.z,
        ))
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Returns the complete WGSL module of given kernel.
pub(super) fn kernel_source(
    kernel: Kernel,
    shaders: &[WgslShader],
    miss: &WgslShader,
) -> String {
    let body = match kernel {
        Kernel::RayGeneration => RAY_GENERATION,
        Kernel::Intersection => INTERSECTION,
        Kernel::SortPrepare => SORT_PREPARE,
        Kernel::SortCount => SORT_COUNT,
        Kernel::SortMerge => SORT_MERGE,
        Kernel::SortPrefixSum => SORT_PREFIX_SUM,
        Kernel::SortFinish => SORT_FINISH,
        Kernel::Accumulation => ACCUMULATION,
        Kernel::PostProcessing => POST_PROCESSING,

        Kernel::Shading(material) => {
            let Some(shader) = shaders.get(material as usize) else {
                panic!("material #{material} has no shader bound");
            };

            return format!("{COMMON}\n{}\n{SHADING}", shader.source());
        }

        Kernel::Miss => {
            return format!("{COMMON}\n{}\n{MISS}", miss.source());
        }
    };

    format!("{COMMON}\n{body}")
}
