//! Sorting algorithms expressed as resumable step sequences.
//!
//! Every algorithm is an explicit state machine. One call to
//! [`StepSequence::resume`] runs the algorithm up to its next array access (or
//! to completion) and hands back the matching [`Step`]. The machine keeps its
//! own locals between calls, so a runner can stop after every step and wait on
//! its peers.

mod bubble;
mod gnome;
mod insertion;
mod quick;
mod radix;
mod shell;

pub use bubble::{BubbleSort, ReadOptimizedBubbleSort};
pub use gnome::GnomeSort;
pub use insertion::{InsertionPass, InsertionSort};
pub use quick::QuickSort;
pub use radix::RadixSort;
pub use shell::ShellSort;

use crate::array::{InstrumentedArray, SortValue};
use crate::error::SortError;
use crate::step::Step;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Step sequence contract
// =============================================================================

pub trait StepSequence<T: SortValue>: Send {
    /// Runs until the next step. Returns `Ok(None)` once `Complete` was emitted.
    fn resume(&mut self, array: &mut InstrumentedArray<T>) -> Result<Option<Step<T>>, SortError>;
}

impl<T: SortValue> StepSequence<T> for Box<dyn StepSequence<T>> {
    fn resume(&mut self, array: &mut InstrumentedArray<T>) -> Result<Option<Step<T>>, SortError> {
        (**self).resume(array)
    }
}

/// Inclusive `[lo, hi]` range to sort. Always `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct Bounds {
    lo: usize,
    hi: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBounds {
    lo: usize,
    hi: usize,
}

impl TryFrom<RawBounds> for Bounds {
    type Error = SortError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        Bounds::new(raw.lo, raw.hi)
    }
}

impl Bounds {
    pub fn new(lo: usize, hi: usize) -> Result<Self, SortError> {
        if lo > hi {
            return Err(SortError::InvalidBounds { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    /// The whole array, or `None` when there is nothing to sort.
    pub fn full(len: usize) -> Option<Self> {
        len.checked_sub(1).map(|hi| Self { lo: 0, hi })
    }

    pub fn lo(&self) -> usize {
        self.lo
    }

    pub fn hi(&self) -> usize {
        self.hi
    }

    /// Number of elements covered; never zero.
    pub fn span(&self) -> usize {
        self.hi - self.lo + 1
    }
}

// =============================================================================
// Algorithm catalogue
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Bubble,
    ReadOptimizedBubble,
    Insertion,
    Shell,
    Radix,
    Quick,
    Gnome,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::Bubble,
        Algorithm::ReadOptimizedBubble,
        Algorithm::Insertion,
        Algorithm::Shell,
        Algorithm::Radix,
        Algorithm::Quick,
        Algorithm::Gnome,
    ];

    /// The set run when nothing else is asked for.
    pub const DEFAULT_SET: [Algorithm; 6] = [
        Algorithm::Bubble,
        Algorithm::ReadOptimizedBubble,
        Algorithm::Insertion,
        Algorithm::Shell,
        Algorithm::Radix,
        Algorithm::Quick,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Bubble => "bubble",
            Algorithm::ReadOptimizedBubble => "read-optimized-bubble",
            Algorithm::Insertion => "insertion",
            Algorithm::Shell => "shell",
            Algorithm::Radix => "radix",
            Algorithm::Quick => "quick",
            Algorithm::Gnome => "gnome",
        }
    }

    /// Builds a fresh step sequence over `bounds` (`None` sorts nothing).
    pub fn sequence<T: SortValue>(self, bounds: Option<Bounds>) -> Box<dyn StepSequence<T>> {
        match self {
            Algorithm::Bubble => Box::new(BubbleSort::new(bounds)),
            Algorithm::ReadOptimizedBubble => Box::new(ReadOptimizedBubbleSort::new(bounds)),
            Algorithm::Insertion => Box::new(InsertionSort::new(bounds)),
            Algorithm::Shell => Box::new(ShellSort::new(bounds)),
            Algorithm::Radix => Box::new(RadixSort::new(bounds)),
            Algorithm::Quick => Box::new(QuickSort::new(bounds)),
            Algorithm::Gnome => Box::new(GnomeSort::new(bounds)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Algorithm::ALL.iter().map(|a| a.name()).collect();
                format!("unknown algorithm '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

// =============================================================================
// Iterator adaptor
// =============================================================================

/// Drives a sequence over an array as an iterator of steps.
///
/// Fuses after `Complete` or after the first error.
pub struct Steps<'a, T: SortValue, S: StepSequence<T>> {
    sequence: S,
    array: &'a mut InstrumentedArray<T>,
    done: bool,
}

impl<'a, T: SortValue, S: StepSequence<T>> Steps<'a, T, S> {
    pub fn new(sequence: S, array: &'a mut InstrumentedArray<T>) -> Self {
        Self {
            sequence,
            array,
            done: false,
        }
    }

    pub fn array(&self) -> &InstrumentedArray<T> {
        &*self.array
    }
}

impl<T: SortValue, S: StepSequence<T>> Iterator for Steps<'_, T, S> {
    type Item = Result<Step<T>, SortError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.sequence.resume(self.array) {
            Ok(Some(step)) => {
                self.done = step.is_complete();
                Some(Ok(step))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{is_non_decreasing, run};
    use super::*;
    use proptest::prelude::*;

    const FIXTURES: &[&[u32]] = &[
        &[],
        &[7],
        &[1, 2],
        &[2, 1],
        &[1, 2, 3, 4, 5, 6],
        &[6, 5, 4, 3, 2, 1],
        &[5, 3, 4, 1, 2],
        &[3, 3, 1, 3, 0, 0, 2],
        &[4, 4, 4, 4],
        &[9, 0, 1000, 17, 3, 3, 250, 1],
    ];

    #[test]
    fn test_every_algorithm_sorts_fixtures() {
        for algorithm in Algorithm::ALL {
            for input in FIXTURES {
                let (steps, array) = run(algorithm, input);
                let mut expected = input.to_vec();
                expected.sort();

                match steps.last() {
                    Some(Step::Complete { snapshot }) => {
                        assert_eq!(snapshot, &expected, "{algorithm} on {input:?}")
                    }
                    other => panic!("{algorithm} ended with {other:?}"),
                }
                assert_eq!(array.as_slice(), &expected[..]);
            }
        }
    }

    #[test]
    fn test_exactly_one_complete_step_last() {
        for algorithm in Algorithm::ALL {
            let (steps, _) = run(algorithm, &[8u32, 2, 9, 4, 4, 1, 7, 0, 3, 5, 6]);
            let completes = steps.iter().filter(|step| step.is_complete()).count();
            assert_eq!(completes, 1, "{algorithm}");
            assert!(steps.last().unwrap().is_complete(), "{algorithm}");
        }
    }

    #[test]
    fn test_sequence_is_exhausted_after_complete() {
        let mut array = InstrumentedArray::new(vec![2u32, 1]);
        let mut sequence = Algorithm::Quick.sequence::<u32>(Bounds::full(2));
        while let Some(step) = sequence.resume(&mut array).unwrap() {
            if step.is_complete() {
                break;
            }
        }
        assert!(sequence.resume(&mut array).unwrap().is_none());
        assert!(sequence.resume(&mut array).unwrap().is_none());
    }

    #[test]
    fn test_sub_range_leaves_outside_untouched() {
        for algorithm in Algorithm::ALL {
            let mut array = InstrumentedArray::new(vec![9u32, 5, 1, 4, 2, 0]);
            let sequence = algorithm.sequence::<u32>(Some(Bounds::new(1, 4).unwrap()));
            let steps: Vec<_> = Steps::new(sequence, &mut array)
                .collect::<Result<_, _>>()
                .unwrap();
            assert!(steps.last().unwrap().is_complete());
            assert_eq!(array.as_slice(), &[9, 1, 2, 4, 5, 0], "{algorithm}");
        }
    }

    #[test]
    fn test_hi_past_end_fails_with_out_of_range() {
        for algorithm in Algorithm::ALL {
            let mut array = InstrumentedArray::new(vec![3u32, 2, 1]);
            let sequence = algorithm.sequence::<u32>(Some(Bounds::new(0, 5).unwrap()));
            let results: Vec<_> = Steps::new(sequence, &mut array).collect();
            assert!(
                matches!(results.last(), Some(Err(SortError::OutOfRange { .. }))),
                "{algorithm}"
            );
        }
    }

    #[test]
    fn test_bounds_validation() {
        assert!(matches!(
            Bounds::new(4, 2),
            Err(SortError::InvalidBounds { lo: 4, hi: 2 })
        ));
        assert_eq!(Bounds::new(2, 2).unwrap().span(), 1);
        assert_eq!(Bounds::full(0), None);
        assert_eq!(Bounds::full(3), Some(Bounds { lo: 0, hi: 2 }));
    }

    #[test]
    fn test_inverted_bounds_rejected_when_deserialized() {
        let bounds: Bounds = serde_json::from_str(r#"{"lo": 1, "hi": 3}"#).unwrap();
        assert_eq!((bounds.lo(), bounds.hi()), (1, 3));

        let err = serde_json::from_str::<Bounds>(r#"{"lo": 3, "hi": 1}"#).unwrap_err();
        assert!(err.to_string().contains("lo (3)"), "{err}");
    }

    #[test]
    fn test_steps_expose_array_while_iterating() {
        let mut array = InstrumentedArray::new(vec![2u32, 1]);
        let mut steps = Steps::new(Algorithm::Bubble.sequence::<u32>(Bounds::full(2)), &mut array);
        assert_eq!(steps.next().unwrap().unwrap(), Step::Read { index: 0 });
        assert_eq!(steps.array().counts().reads, 1);
        assert_eq!(steps.by_ref().count(), 4);
        assert_eq!(steps.array().as_slice(), &[1, 2]);
        assert!(steps.next().is_none());
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), algorithm);
        }
        let err = "bogo".parse::<Algorithm>().unwrap_err();
        assert!(err.contains("bogo"));
        assert!(err.contains("read-optimized-bubble"));
    }

    proptest! {
        #[test]
        fn test_all_algorithms_produce_sorted_permutation(
            input in proptest::collection::vec(0u32..64, 0..40)
        ) {
            let mut expected = input.clone();
            expected.sort();
            for algorithm in Algorithm::ALL {
                let (steps, _) = run(algorithm, &input);
                match steps.last() {
                    Some(Step::Complete { snapshot }) => {
                        prop_assert!(is_non_decreasing(snapshot));
                        prop_assert_eq!(snapshot, &expected);
                    }
                    _ => prop_assert!(false, "{} did not complete", algorithm),
                }
            }
        }

        #[test]
        fn test_counts_match_issued_accesses(
            input in proptest::collection::vec(any::<u16>(), 0..32)
        ) {
            for algorithm in Algorithm::ALL {
                let mut array = InstrumentedArray::from_slice(&input);
                let issued = std::sync::Arc::new(std::sync::Mutex::new((0u64, 0u64)));
                let tally = std::sync::Arc::clone(&issued);
                array = array.with_observer(move |access, _| {
                    let mut tally = tally.lock().unwrap();
                    match access {
                        crate::array::Access::Read { .. } => tally.0 += 1,
                        crate::array::Access::Write { .. } => tally.1 += 1,
                    }
                });
                let sequence = algorithm.sequence::<u16>(Bounds::full(input.len()));
                let steps: Vec<_> = Steps::new(sequence, &mut array)
                    .collect::<Result<_, _>>()
                    .unwrap();
                let counts = array.counts();
                let (reads, writes) = *issued.lock().unwrap();
                prop_assert_eq!(counts.reads, reads);
                prop_assert_eq!(counts.writes, writes);

                // Every write is a step; read steps never exceed counted reads.
                let write_steps = steps.iter().filter(|s| s.write_index().is_some()).count() as u64;
                let read_steps = steps.iter().filter(|s| s.read_index().is_some()).count() as u64;
                prop_assert_eq!(write_steps, counts.writes);
                prop_assert!(read_steps <= counts.reads);
                if algorithm != Algorithm::Radix {
                    prop_assert_eq!(read_steps, counts.reads);
                }
            }
        }
    }
}
