use super::{Bounds, StepSequence};
use crate::array::{InstrumentedArray, SortValue};
use crate::error::SortError;
use crate::step::Step;
use std::mem;

enum PassPhase<T> {
    Next,
    ReadPred { key: T },
    Shift { key: T, pred: T },
    Place { key: T },
    Finished,
}

/// One strided insertion sort over `lo, lo + stride, ...` up to `hi`.
///
/// This is the stepped core shared with shell sort. It never emits
/// `Complete`; `resume` returns `Ok(None)` when the pass is over.
pub struct InsertionPass<T> {
    lo: usize,
    hi: usize,
    stride: usize,
    idx: usize,
    hole: usize,
    phase: PassPhase<T>,
}

impl<T: SortValue> InsertionPass<T> {
    pub fn new(lo: usize, hi: usize, stride: usize) -> Self {
        let stride = stride.max(1);
        Self {
            lo,
            hi,
            stride,
            idx: lo + stride,
            hole: lo + stride,
            phase: PassPhase::Next,
        }
    }

    pub fn resume(&mut self, array: &mut InstrumentedArray<T>) -> Result<Option<Step<T>>, SortError> {
        loop {
            match mem::replace(&mut self.phase, PassPhase::Finished) {
                PassPhase::Next => {
                    if self.idx > self.hi {
                        return Ok(None);
                    }
                    let key = array.get(self.idx)?;
                    self.hole = self.idx;
                    self.phase = PassPhase::ReadPred { key };
                    return Ok(Some(Step::read(self.idx)));
                }
                PassPhase::ReadPred { key } => {
                    if self.hole < self.lo + self.stride {
                        self.phase = PassPhase::Place { key };
                        continue;
                    }
                    let at = self.hole - self.stride;
                    let pred = array.get(at)?;
                    self.phase = if pred <= key {
                        PassPhase::Place { key }
                    } else {
                        PassPhase::Shift { key, pred }
                    };
                    return Ok(Some(Step::read(at)));
                }
                PassPhase::Shift { key, pred } => {
                    let at = self.hole;
                    array.set(at, pred.clone())?;
                    self.hole -= self.stride;
                    self.phase = PassPhase::ReadPred { key };
                    return Ok(Some(Step::write(array, at, pred)));
                }
                PassPhase::Place { key } => {
                    let at = self.hole;
                    let moved = at != self.idx;
                    self.idx += self.stride;
                    self.phase = PassPhase::Next;
                    if moved {
                        array.set(at, key.clone())?;
                        return Ok(Some(Step::write(array, at, key)));
                    }
                }
                PassPhase::Finished => return Ok(None),
            }
        }
    }
}

/// Insertion sort: shift larger predecessors right, then place the key.
pub struct InsertionSort<T> {
    pass: Option<InsertionPass<T>>,
    completed: bool,
}

impl<T: SortValue> InsertionSort<T> {
    pub fn new(bounds: Option<Bounds>) -> Self {
        Self::with_stride(bounds, 1)
    }

    /// Sorts only every `stride`-th element starting at `lo`.
    pub fn with_stride(bounds: Option<Bounds>, stride: usize) -> Self {
        Self {
            pass: bounds.map(|b| InsertionPass::new(b.lo, b.hi, stride)),
            completed: false,
        }
    }
}

impl<T: SortValue> StepSequence<T> for InsertionSort<T> {
    fn resume(&mut self, array: &mut InstrumentedArray<T>) -> Result<Option<Step<T>>, SortError> {
        if let Some(pass) = self.pass.as_mut() {
            if let Some(step) = pass.resume(array)? {
                return Ok(Some(step));
            }
            self.pass = None;
        }
        if self.completed {
            return Ok(None);
        }
        self.completed = true;
        Ok(Some(Step::complete(array)))
    }
}
