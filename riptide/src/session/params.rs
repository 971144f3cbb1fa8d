use crate::Camera;

/// Parameters a trace session is opened with.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceParams {
    pub camera: Camera,

    /// Maximum number of bounces per path; capped by the scheduler's own
    /// limit.
    pub max_bounces: u32,

    /// Number of samples after which the session is considered converged;
    /// `None` accumulates indefinitely.
    pub samples_per_pixel: Option<u32>,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            camera: Default::default(),
            max_bounces: 4,
            samples_per_pixel: None,
        }
    }
}
