use crate::gpu::PassParams;

/// Per-frame state threaded through the bounce loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameContext {
    /// Authoritative half of the double-buffered ray arrays.
    pub active: u32,

    pub bounce: u32,
    pub seed: u32,
}

impl FrameContext {
    pub fn new(seed: u32) -> Self {
        Self {
            active: 0,
            bounce: 0,
            seed,
        }
    }

    pub fn flipped(self) -> Self {
        Self {
            active: 1 - self.active,
            ..self
        }
    }

    pub fn with_bounce(self, bounce: u32) -> Self {
        Self { bounce, ..self }
    }

    /// Fills per-frame fields of given parameters.
    pub fn params(&self, base: &PassParams) -> PassParams {
        PassParams {
            seed: self.seed,
            bounce: self.bounce,
            active: self.active,
            ..*base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flipping() {
        let ctx = FrameContext::new(5).with_bounce(2);

        assert_eq!(1, ctx.flipped().active);
        assert_eq!(0, ctx.flipped().flipped().active);
        assert_eq!(2, ctx.flipped().bounce);

        let params = ctx.flipped().params(&PassParams {
            ray_count: 10,
            ..Default::default()
        });

        assert_eq!(5, params.seed);
        assert_eq!(2, params.bounce);
        assert_eq!(1, params.active);
        assert_eq!(10, params.ray_count);
    }
}
