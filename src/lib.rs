//! Runs several sorting algorithms side by side in visual lockstep.
//!
//! Each run sorts a private [`InstrumentedArray`] copy of one shared initial
//! sequence. Algorithms are resumable [`StepSequence`]s that stop after every
//! read or write; a [`Runner`] hands each step to a [`Renderer`] and then waits
//! on the shared [`Synchronizer`] until every other live run has made its step
//! too. Runs that finish leave the synchronizer so nobody waits on them.
//!
//! ```no_run
//! use lockstep_sort::{Algorithm, Coordinator, SummaryRenderer};
//! use std::sync::Arc;
//!
//! let initial = lockstep_sort::workload::shuffled_permutation(32, Some(1));
//! let reports = Coordinator::new(initial, Arc::new(SummaryRenderer::new(false)))
//!     .algorithms(Algorithm::DEFAULT_SET)
//!     .run()?;
//! assert!(reports.iter().all(|report| report.is_sorted()));
//! # Ok::<(), lockstep_sort::SortError>(())
//! ```

pub mod algorithms;
pub mod array;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gate;
pub mod render;
pub mod runner;
pub mod step;
pub mod synchronizer;
pub mod workload;

pub use algorithms::{Algorithm, Bounds, StepSequence, Steps};
pub use array::{AccessCounts, InstrumentedArray, SortValue};
pub use config::SortConfig;
pub use coordinator::Coordinator;
pub use error::{ConfigError, SortError};
pub use render::{render_channel, ChannelRenderer, Frame, RenderFrames, Renderer, SummaryRenderer};
pub use runner::{RunId, RunReport, RunSummary, Runner};
pub use step::Step;
pub use synchronizer::{Membership, Synchronizer};
