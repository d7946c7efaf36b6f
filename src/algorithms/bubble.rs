use super::{Bounds, StepSequence};
use crate::array::{InstrumentedArray, SortValue};
use crate::error::SortError;
use crate::step::Step;
use std::mem;

// =============================================================================
// Bubble sort
// =============================================================================

enum BubblePhase<T> {
    Pass,
    ReadLeft,
    ReadRight { left: T },
    WriteLeft { left: T, right: T },
    WriteRight { left: T },
    Complete,
    Done,
}

/// Adjacent compare/swap passes; each pass shrinks the unsorted suffix by one.
pub struct BubbleSort<T> {
    lo: usize,
    top: usize,
    idx: usize,
    phase: BubblePhase<T>,
}

impl<T: SortValue> BubbleSort<T> {
    pub fn new(bounds: Option<Bounds>) -> Self {
        let (lo, top, phase) = match bounds {
            Some(bounds) => (bounds.lo, bounds.hi, BubblePhase::Pass),
            None => (0, 0, BubblePhase::Complete),
        };
        Self {
            lo,
            top,
            idx: lo,
            phase,
        }
    }
}

impl<T: SortValue> StepSequence<T> for BubbleSort<T> {
    fn resume(&mut self, array: &mut InstrumentedArray<T>) -> Result<Option<Step<T>>, SortError> {
        loop {
            match mem::replace(&mut self.phase, BubblePhase::Done) {
                BubblePhase::Pass => {
                    if self.top <= self.lo {
                        self.phase = BubblePhase::Complete;
                    } else {
                        self.idx = self.lo + 1;
                        self.phase = BubblePhase::ReadLeft;
                    }
                }
                BubblePhase::ReadLeft => {
                    if self.idx > self.top {
                        self.top -= 1;
                        self.phase = BubblePhase::Pass;
                        continue;
                    }
                    let left = array.get(self.idx - 1)?;
                    self.phase = BubblePhase::ReadRight { left };
                    return Ok(Some(Step::read(self.idx - 1)));
                }
                BubblePhase::ReadRight { left } => {
                    let at = self.idx;
                    let right = array.get(at)?;
                    if left > right {
                        self.phase = BubblePhase::WriteLeft { left, right };
                    } else {
                        self.idx += 1;
                        self.phase = BubblePhase::ReadLeft;
                    }
                    return Ok(Some(Step::read(at)));
                }
                BubblePhase::WriteLeft { left, right } => {
                    let at = self.idx - 1;
                    array.set(at, right.clone())?;
                    self.phase = BubblePhase::WriteRight { left };
                    return Ok(Some(Step::write(array, at, right)));
                }
                BubblePhase::WriteRight { left } => {
                    let at = self.idx;
                    array.set(at, left.clone())?;
                    self.idx += 1;
                    self.phase = BubblePhase::ReadLeft;
                    return Ok(Some(Step::write(array, at, left)));
                }
                BubblePhase::Complete => return Ok(Some(Step::complete(array))),
                BubblePhase::Done => return Ok(None),
            }
        }
    }
}

// =============================================================================
// Read-optimized bubble sort
// =============================================================================

enum CarryPhase<T> {
    Pass,
    ReadFirst,
    ReadNext { carried: T },
    WriteLeft { carried: T, next: T },
    WriteRight { carried: T },
    Complete,
    Done,
}

/// Bubble sort that carries the larger value of each pair into the next
/// comparison instead of reading it again.
pub struct ReadOptimizedBubbleSort<T> {
    lo: usize,
    top: usize,
    idx: usize,
    phase: CarryPhase<T>,
}

impl<T: SortValue> ReadOptimizedBubbleSort<T> {
    pub fn new(bounds: Option<Bounds>) -> Self {
        let (lo, top, phase) = match bounds {
            Some(bounds) => (bounds.lo, bounds.hi, CarryPhase::Pass),
            None => (0, 0, CarryPhase::Complete),
        };
        Self {
            lo,
            top,
            idx: lo,
            phase,
        }
    }
}

impl<T: SortValue> StepSequence<T> for ReadOptimizedBubbleSort<T> {
    fn resume(&mut self, array: &mut InstrumentedArray<T>) -> Result<Option<Step<T>>, SortError> {
        loop {
            match mem::replace(&mut self.phase, CarryPhase::Done) {
                CarryPhase::Pass => {
                    if self.top <= self.lo {
                        self.phase = CarryPhase::Complete;
                    } else {
                        self.idx = self.lo + 1;
                        self.phase = CarryPhase::ReadFirst;
                    }
                }
                CarryPhase::ReadFirst => {
                    let carried = array.get(self.lo)?;
                    self.phase = CarryPhase::ReadNext { carried };
                    return Ok(Some(Step::read(self.lo)));
                }
                CarryPhase::ReadNext { carried } => {
                    if self.idx > self.top {
                        self.top -= 1;
                        self.phase = CarryPhase::Pass;
                        continue;
                    }
                    let at = self.idx;
                    let next = array.get(at)?;
                    if carried > next {
                        self.phase = CarryPhase::WriteLeft { carried, next };
                    } else {
                        self.idx += 1;
                        self.phase = CarryPhase::ReadNext { carried: next };
                    }
                    return Ok(Some(Step::read(at)));
                }
                CarryPhase::WriteLeft { carried, next } => {
                    let at = self.idx - 1;
                    array.set(at, next.clone())?;
                    self.phase = CarryPhase::WriteRight { carried };
                    return Ok(Some(Step::write(array, at, next)));
                }
                CarryPhase::WriteRight { carried } => {
                    let at = self.idx;
                    array.set(at, carried.clone())?;
                    self.idx += 1;
                    self.phase = CarryPhase::ReadNext {
                        carried: carried.clone(),
                    };
                    return Ok(Some(Step::write(array, at, carried)));
                }
                CarryPhase::Complete => return Ok(Some(Step::complete(array))),
                CarryPhase::Done => return Ok(None),
            }
        }
    }
}
