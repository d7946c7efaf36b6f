use super::{Bounds, StepSequence};
use crate::array::{InstrumentedArray, SortValue};
use crate::error::SortError;
use crate::step::Step;
use std::mem;

enum RadixPhase<T> {
    Bucket,
    NextCycle,
    Carry { carried: T, dest: usize },
    Place { carried: T, displaced: T, dest: usize },
    Complete,
    Done,
}

/// LSB-first binary radix sort that permutes in place.
///
/// Each bit pass first links every position into one of two buckets (an
/// index-linked list per bucket, no element moves), turns the bucket order into
/// a destination per position, and then walks the permutation cycle by cycle.
/// Only the cycle walk emits steps; the bucket scan reads through the array so
/// its reads are still counted.
pub struct RadixSort<T> {
    lo: usize,
    span: usize,
    bit: u32,
    bits: u32,
    cursor: usize,
    destinations: Vec<usize>,
    phase: RadixPhase<T>,
}

impl<T: SortValue> RadixSort<T> {
    pub fn new(bounds: Option<Bounds>) -> Self {
        let (lo, span, phase) = match bounds {
            Some(bounds) => (bounds.lo, bounds.span(), RadixPhase::Bucket),
            None => (0, 0, RadixPhase::Complete),
        };
        Self {
            lo,
            span,
            bit: 0,
            bits: span.saturating_sub(1).significant_bits(),
            cursor: 0,
            destinations: vec![0; span],
            phase,
        }
    }

    fn assign_buckets(&mut self, array: &mut InstrumentedArray<T>) -> Result<(), SortError> {
        let mut heads: [Option<usize>; 2] = [None, None];
        let mut links: Vec<Option<usize>> = vec![None; self.span];

        for i in (0..self.span).rev() {
            let value = array.get(self.lo + i)?;
            if self.bit == 0 {
                self.bits = self.bits.max(value.significant_bits());
            }
            let bucket = usize::from(value.bit(self.bit));
            links[i] = heads[bucket];
            heads[bucket] = Some(i);
        }

        let mut slot = 0;
        for head in heads {
            let mut node = head;
            while let Some(i) = node {
                node = links[i];
                self.destinations[i] = slot;
                slot += 1;
            }
        }
        self.cursor = self.span;
        Ok(())
    }
}

impl<T: SortValue> StepSequence<T> for RadixSort<T> {
    fn resume(&mut self, array: &mut InstrumentedArray<T>) -> Result<Option<Step<T>>, SortError> {
        loop {
            match mem::replace(&mut self.phase, RadixPhase::Done) {
                RadixPhase::Bucket => {
                    self.assign_buckets(array)?;
                    self.phase = RadixPhase::NextCycle;
                }
                RadixPhase::NextCycle => {
                    if self.cursor == 0 {
                        self.bit += 1;
                        self.phase = if self.bit >= self.bits {
                            RadixPhase::Complete
                        } else {
                            RadixPhase::Bucket
                        };
                        continue;
                    }
                    self.cursor -= 1;
                    let start = self.cursor;
                    let dest = self.destinations[start];
                    if dest == start {
                        self.phase = RadixPhase::NextCycle;
                        continue;
                    }
                    let carried = array.get(self.lo + start)?;
                    self.phase = RadixPhase::Carry { carried, dest };
                    return Ok(Some(Step::read(self.lo + start)));
                }
                RadixPhase::Carry { carried, dest } => {
                    let start = self.cursor;
                    if dest == start {
                        // Cycle closed: the carried value lands where the walk began.
                        array.set(self.lo + start, carried.clone())?;
                        self.destinations[start] = start;
                        self.phase = RadixPhase::NextCycle;
                        return Ok(Some(Step::write(array, self.lo + start, carried)));
                    }
                    let displaced = array.get(self.lo + dest)?;
                    self.phase = RadixPhase::Place {
                        carried,
                        displaced,
                        dest,
                    };
                    return Ok(Some(Step::read(self.lo + dest)));
                }
                RadixPhase::Place {
                    carried,
                    displaced,
                    dest,
                } => {
                    array.set(self.lo + dest, carried.clone())?;
                    let next = mem::replace(&mut self.destinations[dest], dest);
                    self.phase = RadixPhase::Carry {
                        carried: displaced,
                        dest: next,
                    };
                    return Ok(Some(Step::write(array, self.lo + dest, carried)));
                }
                RadixPhase::Complete => return Ok(Some(Step::complete(array))),
                RadixPhase::Done => return Ok(None),
            }
        }
    }
}
