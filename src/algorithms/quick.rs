use super::{Bounds, StepSequence};
use crate::array::{InstrumentedArray, SortValue};
use crate::error::SortError;
use crate::step::Step;
use std::mem;

enum QuickPhase<T> {
    Partition,
    ReadPivot,
    Scan { pivot: T },
    ReadStore { pivot: T, scanned: T },
    WriteStore { pivot: T, scanned: T, stored: T },
    WriteScanned { pivot: T, stored: T },
    ReadFinal { pivot: T },
    WriteLo { pivot: T, stored: T },
    WritePivot { pivot: T },
    Recurse,
    Complete,
    Done,
}

/// Quick sort with a Lomuto partition around the first element of each range.
///
/// Pending sub-ranges live on an explicit stack instead of the call stack, so
/// every partition at every depth is stepped by the same machine and the whole
/// sort ends with a single `Complete`.
pub struct QuickSort<T> {
    ranges: Vec<(usize, usize)>,
    lo: usize,
    hi: usize,
    scan: usize,
    store: usize,
    phase: QuickPhase<T>,
}

impl<T: SortValue> QuickSort<T> {
    pub fn new(bounds: Option<Bounds>) -> Self {
        let ranges = match bounds {
            Some(bounds) if bounds.lo < bounds.hi => vec![(bounds.lo, bounds.hi)],
            _ => Vec::new(),
        };
        Self {
            ranges,
            lo: 0,
            hi: 0,
            scan: 0,
            store: 0,
            phase: QuickPhase::Partition,
        }
    }

    /// Pushes the high side first so the low side is partitioned next.
    fn push_partitions(&mut self) {
        let (lo, hi, pivot_at) = (self.lo, self.hi, self.store);
        if pivot_at + 1 < hi {
            self.ranges.push((pivot_at + 1, hi));
        }
        if pivot_at > lo + 1 {
            self.ranges.push((lo, pivot_at - 1));
        }
    }
}

impl<T: SortValue> StepSequence<T> for QuickSort<T> {
    fn resume(&mut self, array: &mut InstrumentedArray<T>) -> Result<Option<Step<T>>, SortError> {
        loop {
            match mem::replace(&mut self.phase, QuickPhase::Done) {
                QuickPhase::Partition => match self.ranges.pop() {
                    Some((lo, hi)) => {
                        self.lo = lo;
                        self.hi = hi;
                        self.store = lo;
                        self.scan = lo + 1;
                        self.phase = QuickPhase::ReadPivot;
                    }
                    None => self.phase = QuickPhase::Complete,
                },
                QuickPhase::ReadPivot => {
                    let pivot = array.get(self.lo)?;
                    self.phase = QuickPhase::Scan { pivot };
                    return Ok(Some(Step::read(self.lo)));
                }
                QuickPhase::Scan { pivot } => {
                    if self.scan > self.hi {
                        self.phase = if self.store != self.lo {
                            QuickPhase::ReadFinal { pivot }
                        } else {
                            QuickPhase::Recurse
                        };
                        continue;
                    }
                    let at = self.scan;
                    let scanned = array.get(at)?;
                    if scanned < pivot {
                        self.store += 1;
                    }
                    self.phase = if scanned < pivot && self.store != at {
                        QuickPhase::ReadStore { pivot, scanned }
                    } else {
                        self.scan += 1;
                        QuickPhase::Scan { pivot }
                    };
                    return Ok(Some(Step::read(at)));
                }
                QuickPhase::ReadStore { pivot, scanned } => {
                    let stored = array.get(self.store)?;
                    self.phase = QuickPhase::WriteStore {
                        pivot,
                        scanned,
                        stored,
                    };
                    return Ok(Some(Step::read(self.store)));
                }
                QuickPhase::WriteStore {
                    pivot,
                    scanned,
                    stored,
                } => {
                    array.set(self.store, scanned.clone())?;
                    self.phase = QuickPhase::WriteScanned { pivot, stored };
                    return Ok(Some(Step::write(array, self.store, scanned)));
                }
                QuickPhase::WriteScanned { pivot, stored } => {
                    let at = self.scan;
                    array.set(at, stored.clone())?;
                    self.scan += 1;
                    self.phase = QuickPhase::Scan { pivot };
                    return Ok(Some(Step::write(array, at, stored)));
                }
                QuickPhase::ReadFinal { pivot } => {
                    let stored = array.get(self.store)?;
                    self.phase = QuickPhase::WriteLo { pivot, stored };
                    return Ok(Some(Step::read(self.store)));
                }
                QuickPhase::WriteLo { pivot, stored } => {
                    array.set(self.lo, stored.clone())?;
                    self.phase = QuickPhase::WritePivot { pivot };
                    return Ok(Some(Step::write(array, self.lo, stored)));
                }
                QuickPhase::WritePivot { pivot } => {
                    array.set(self.store, pivot.clone())?;
                    self.phase = QuickPhase::Recurse;
                    return Ok(Some(Step::write(array, self.store, pivot)));
                }
                QuickPhase::Recurse => {
                    self.push_partitions();
                    self.phase = QuickPhase::Partition;
                }
                QuickPhase::Complete => return Ok(Some(Step::complete(array))),
                QuickPhase::Done => return Ok(None),
            }
        }
    }
}
