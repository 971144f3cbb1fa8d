use std::fmt;

use crate::gpu::PassParams;
use crate::{Kernel, Resource};

/// How many invocations a dispatch runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchSize {
    /// Given number of invocations, rounded up to whole workgroups.
    Direct(u32),

    /// Workgroup count read from given bucket's entry of the bucket table.
    Indirect(u32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Dispatch {
        kernel: Kernel,
        params: PassParams,
        size: DispatchSize,
    },

    /// Makes writes of every preceding dispatch visible to every following
    /// one.
    Barrier,
}

/// Recorded, backend-independent sequence of dispatches and barriers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<Command>,
}

/// Two dispatches touching the same resource without a barrier in between,
/// with at least one of them writing to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hazard {
    /// Index of the earlier command.
    pub first: usize,

    /// Index of the later command.
    pub second: usize,

    pub resource: Resource,
}

impl CommandList {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn dispatch(
        &mut self,
        kernel: Kernel,
        params: PassParams,
        size: DispatchSize,
    ) {
        self.commands.push(Command::Dispatch {
            kernel,
            params,
            size,
        });
    }

    /// Appends a barrier; a barrier right after another one (or at the very
    /// beginning) is redundant and gets skipped.
    pub fn barrier(&mut self) {
        if let Some(Command::Dispatch { .. }) = self.commands.last() {
            self.commands.push(Command::Barrier);
        }
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> + '_ {
        self.commands.iter()
    }

    /// Iterates over kernels of all dispatches, in order.
    pub fn kernels(&self) -> impl Iterator<Item = Kernel> + '_ {
        self.commands.iter().filter_map(|command| match command {
            Command::Dispatch { kernel, .. } => Some(*kernel),
            Command::Barrier => None,
        })
    }

    pub fn barriers(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, Command::Barrier))
            .count()
    }

    /// Returns all pairs of dispatches that race with each other.
    pub fn hazards(&self) -> Vec<Hazard> {
        let mut hazards = Vec::new();
        let mut segment: Vec<(usize, Kernel)> = Vec::new();

        for (idx, command) in self.commands.iter().enumerate() {
            let Command::Dispatch { kernel, .. } = command else {
                segment.clear();
                continue;
            };

            for &(prev_idx, prev) in &segment {
                if prev.is_shading() && kernel.is_shading() {
                    continue;
                }

                let conflict = prev
                    .writes()
                    .iter()
                    .find(|res| {
                        kernel.reads().contains(*res)
                            || kernel.writes().contains(*res)
                    })
                    .or_else(|| {
                        prev.reads()
                            .iter()
                            .find(|res| kernel.writes().contains(*res))
                    });

                if let Some(&resource) = conflict {
                    hazards.push(Hazard {
                        first: prev_idx,
                        second: idx,
                        resource,
                    });
                }
            }

            segment.push((idx, *kernel));
        }

        hazards
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl fmt::Display for CommandList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.commands {
            match command {
                Command::Dispatch { kernel, size, .. } => {
                    writeln!(f, "dispatch {kernel} {size:?}")?;
                }
                Command::Barrier => {
                    writeln!(f, "barrier")?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: DispatchSize = DispatchSize::Direct(1);

    fn params() -> PassParams {
        Default::default()
    }

    #[test]
    fn redundant_barriers_are_skipped() {
        let mut target = CommandList::new();

        target.barrier();
        target.dispatch(Kernel::RayGeneration, params(), ONE);
        target.barrier();
        target.barrier();

        assert_eq!(2, target.len());
        assert_eq!(1, target.barriers());
    }

    #[test]
    fn hazards() {
        let mut target = CommandList::new();

        target.dispatch(Kernel::RayGeneration, params(), ONE);
        target.dispatch(Kernel::Intersection, params(), ONE);
        target.barrier();
        target.dispatch(Kernel::Shading(0), params(), ONE);
        target.dispatch(Kernel::Shading(1), params(), ONE);
        target.dispatch(Kernel::Miss, params(), ONE);
        target.barrier();
        target.dispatch(Kernel::Accumulation, params(), ONE);
        target.dispatch(Kernel::PostProcessing, params(), ONE);

        assert_eq!(
            vec![
                Hazard {
                    first: 0,
                    second: 1,
                    resource: Resource::Rays,
                },
                Hazard {
                    first: 7,
                    second: 8,
                    resource: Resource::Accumulators,
                },
            ],
            target.hazards()
        );
    }
}
