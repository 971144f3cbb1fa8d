#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Whether rays get grouped by material bucket before shading.
    pub sort_rays: bool,

    /// Upper bound for the number of bounces, regardless of what the trace
    /// session asks for.
    pub max_bounce_limit: u32,

    /// Whether to run the tone-mapping pass after accumulation.
    pub post_processing: bool,

    pub exposure: f32,

    /// Seed of the generator per-frame seeds are drawn from.
    pub seed: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sort_rays: true,
            max_bounce_limit: 8,
            post_processing: true,
            exposure: 1.0,
            seed: 0,
        }
    }
}
