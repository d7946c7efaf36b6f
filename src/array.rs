use crate::error::SortError;
use serde::Serialize;
use std::fmt::{self, Debug};

// =============================================================================
// Values that can be sorted
// =============================================================================

/// Element type accepted by every algorithm.
///
/// Radix sort needs to look at individual bits, so the trait carries two
/// helpers on top of `Ord`. Only unsigned integers implement it.
pub trait SortValue: Ord + Clone + Debug + Send + Sync + 'static {
    /// Returns whether bit `n` (0 = least significant) is set.
    fn bit(&self, n: u32) -> bool;

    /// Number of bits needed to represent the value (0 for zero).
    fn significant_bits(&self) -> u32;
}

macro_rules! impl_sort_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SortValue for $ty {
                fn bit(&self, n: u32) -> bool {
                    n < <$ty>::BITS && (*self >> n) & 1 == 1
                }

                fn significant_bits(&self) -> u32 {
                    <$ty>::BITS - self.leading_zeros()
                }
            }
        )*
    };
}

impl_sort_value!(u8, u16, u32, u64, usize);

// =============================================================================
// Access accounting
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccessCounts {
    pub reads: u64,
    pub writes: u64,
}

/// One counted access, handed to the observer after the counter moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read { index: usize },
    Write { index: usize },
}

type Observer = Box<dyn FnMut(Access, AccessCounts) + Send>;

// =============================================================================
// InstrumentedArray
// =============================================================================

/// A sequence wrapper that counts every element access.
///
/// `get` and `set` each bump exactly one counter. `len`, `as_slice` and
/// `snapshot` are not accesses and leave the counters alone.
pub struct InstrumentedArray<T> {
    items: Vec<T>,
    counts: AccessCounts,
    observer: Option<Observer>,
}

impl<T: SortValue> InstrumentedArray<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            counts: AccessCounts::default(),
            observer: None,
        }
    }

    /// Copies `initial` so the array never aliases another run's storage.
    pub fn from_slice(initial: &[T]) -> Self {
        Self::new(initial.to_vec())
    }

    /// Installs a pure observer called after every counted access.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(Access, AccessCounts) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn get(&mut self, index: usize) -> Result<T, SortError> {
        let value = self
            .items
            .get(index)
            .cloned()
            .ok_or_else(|| SortError::out_of_range(index, self.items.len()))?;
        self.counts.reads += 1;
        self.notify(Access::Read { index });
        Ok(value)
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), SortError> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or_else(|| SortError::out_of_range(index, len))?;
        *slot = value;
        self.counts.writes += 1;
        self.notify(Access::Write { index });
        Ok(())
    }

    fn notify(&mut self, access: Access) {
        let counts = self.counts;
        if let Some(observer) = self.observer.as_mut() {
            observer(access, counts);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn counts(&self) -> AccessCounts {
        self.counts
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T: Debug> Debug for InstrumentedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentedArray")
            .field("items", &self.items)
            .field("counts", &self.counts)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}
