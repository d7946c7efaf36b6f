use crate::array::{InstrumentedArray, SortValue};

/// One observable unit of progress emitted by a run.
///
/// A run emits exactly one `Complete`, and it is always the last step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Read { index: usize },
    Write { index: usize, value: T, snapshot: Vec<T> },
    Complete { snapshot: Vec<T> },
}

impl<T: SortValue> Step<T> {
    pub fn read(index: usize) -> Self {
        Step::Read { index }
    }

    /// Builds a write step from the array state right after `set`.
    pub fn write(array: &InstrumentedArray<T>, index: usize, value: T) -> Self {
        Step::Write {
            index,
            value,
            snapshot: array.snapshot(),
        }
    }

    pub fn complete(array: &InstrumentedArray<T>) -> Self {
        Step::Complete {
            snapshot: array.snapshot(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Step::Complete { .. })
    }

    pub fn read_index(&self) -> Option<usize> {
        match self {
            Step::Read { index } => Some(*index),
            _ => None,
        }
    }

    pub fn write_index(&self) -> Option<usize> {
        match self {
            Step::Write { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Full array contents carried by the step, if any.
    pub fn snapshot(&self) -> Option<&[T]> {
        match self {
            Step::Read { .. } => None,
            Step::Write { snapshot, .. } | Step::Complete { snapshot } => Some(snapshot),
        }
    }
}
