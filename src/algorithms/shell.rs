use super::{Bounds, InsertionPass, StepSequence};
use crate::array::{InstrumentedArray, SortValue};
use crate::error::SortError;
use crate::step::Step;

/// Shell sort with a halving gap sequence.
///
/// For each gap, runs one strided insertion pass per offset `0..gap`. The
/// passes are plain [`InsertionPass`]es, so only the final `Complete` is
/// emitted.
pub struct ShellSort<T> {
    lo: usize,
    hi: usize,
    gap: usize,
    offset: usize,
    pass: Option<InsertionPass<T>>,
    completed: bool,
}

impl<T: SortValue> ShellSort<T> {
    pub fn new(bounds: Option<Bounds>) -> Self {
        let (lo, hi, gap) = match bounds {
            Some(bounds) => (bounds.lo, bounds.hi, bounds.span()),
            None => (0, 0, 0),
        };
        Self {
            lo,
            hi,
            gap,
            // Forces the first resume to halve the gap before any pass.
            offset: gap,
            pass: None,
            completed: false,
        }
    }
}

impl<T: SortValue> StepSequence<T> for ShellSort<T> {
    fn resume(&mut self, array: &mut InstrumentedArray<T>) -> Result<Option<Step<T>>, SortError> {
        loop {
            if let Some(pass) = self.pass.as_mut() {
                if let Some(step) = pass.resume(array)? {
                    return Ok(Some(step));
                }
                self.pass = None;
                self.offset += 1;
            }

            if self.completed {
                return Ok(None);
            }

            if self.offset < self.gap {
                self.pass = Some(InsertionPass::new(self.lo + self.offset, self.hi, self.gap));
                continue;
            }

            if self.gap > 1 {
                self.gap /= 2;
                self.offset = 0;
                continue;
            }

            self.completed = true;
            return Ok(Some(Step::complete(array)));
        }
    }
}
