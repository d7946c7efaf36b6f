use super::{Bounds, StepSequence};
use crate::array::{InstrumentedArray, SortValue};
use crate::error::SortError;
use crate::step::Step;
use std::mem;

enum GnomePhase<T> {
    ReadLeft,
    ReadRight { left: T },
    WriteLeft { left: T, right: T },
    WriteRight { left: T },
    Complete,
    Done,
}

/// Bubble sort variant that steps back after every swap instead of finishing
/// the pass.
pub struct GnomeSort<T> {
    lo: usize,
    hi: usize,
    pos: usize,
    phase: GnomePhase<T>,
}

impl<T: SortValue> GnomeSort<T> {
    pub fn new(bounds: Option<Bounds>) -> Self {
        let (lo, hi, phase) = match bounds {
            Some(bounds) => (bounds.lo, bounds.hi, GnomePhase::ReadLeft),
            None => (0, 0, GnomePhase::Complete),
        };
        Self {
            lo,
            hi,
            pos: lo + 1,
            phase,
        }
    }
}

impl<T: SortValue> StepSequence<T> for GnomeSort<T> {
    fn resume(&mut self, array: &mut InstrumentedArray<T>) -> Result<Option<Step<T>>, SortError> {
        loop {
            match mem::replace(&mut self.phase, GnomePhase::Done) {
                GnomePhase::ReadLeft => {
                    if self.pos > self.hi {
                        self.phase = GnomePhase::Complete;
                        continue;
                    }
                    let left = array.get(self.pos - 1)?;
                    self.phase = GnomePhase::ReadRight { left };
                    return Ok(Some(Step::read(self.pos - 1)));
                }
                GnomePhase::ReadRight { left } => {
                    let at = self.pos;
                    let right = array.get(at)?;
                    if left > right {
                        self.phase = GnomePhase::WriteLeft { left, right };
                    } else {
                        self.pos += 1;
                        self.phase = GnomePhase::ReadLeft;
                    }
                    return Ok(Some(Step::read(at)));
                }
                GnomePhase::WriteLeft { left, right } => {
                    let at = self.pos - 1;
                    array.set(at, right.clone())?;
                    self.phase = GnomePhase::WriteRight { left };
                    return Ok(Some(Step::write(array, at, right)));
                }
                GnomePhase::WriteRight { left } => {
                    let at = self.pos;
                    array.set(at, left.clone())?;
                    if self.pos > self.lo + 1 {
                        self.pos -= 1;
                    } else {
                        self.pos += 1;
                    }
                    self.phase = GnomePhase::ReadLeft;
                    return Ok(Some(Step::write(array, at, left)));
                }
                GnomePhase::Complete => return Ok(Some(Step::complete(array))),
                GnomePhase::Done => return Ok(None),
            }
        }
    }
}
