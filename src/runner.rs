use crate::algorithms::{Algorithm, Bounds, StepSequence};
use crate::array::{AccessCounts, InstrumentedArray, SortValue};
use crate::error::SortError;
use crate::gate::StartGate;
use crate::render::Renderer;
use crate::step::Step;
use crate::synchronizer::Membership;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, trace, warn};

// =============================================================================
// Run identity and report
// =============================================================================

/// Identity of one run; also its participant key in the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RunId {
    pub index: usize,
    pub algorithm: Algorithm,
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.algorithm, self.index)
    }
}

#[derive(Debug)]
pub struct RunReport<T> {
    pub run: RunId,
    pub counts: AccessCounts,
    pub elapsed: Duration,
    /// Final array contents, or the error that aborted the run.
    pub result: Result<Vec<T>, SortError>,
}

/// Serializable view of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run: RunId,
    pub reads: u64,
    pub writes: u64,
    pub elapsed_secs: f64,
    pub sorted: bool,
    pub error: Option<String>,
}

impl<T: SortValue> RunReport<T> {
    pub fn final_array(&self) -> Option<&[T]> {
        self.result.as_deref().ok()
    }

    /// True when the run completed with a non-decreasing array.
    pub fn is_sorted(&self) -> bool {
        self.final_array()
            .is_some_and(|items| items.windows(2).all(|pair| pair[0] <= pair[1]))
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run: self.run,
            reads: self.counts.reads,
            writes: self.counts.writes,
            elapsed_secs: self.elapsed.as_secs_f64(),
            sorted: self.is_sorted(),
            error: self.result.as_ref().err().map(|err| err.to_string()),
        }
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Drives one algorithm over its private array copy in lockstep with peers.
pub struct Runner<T: SortValue> {
    run: RunId,
    array: InstrumentedArray<T>,
    sequence: Box<dyn StepSequence<T>>,
    membership: Membership<RunId>,
    gate: Arc<StartGate>,
    renderer: Arc<dyn Renderer<T>>,
}

impl<T: SortValue> Runner<T> {
    pub fn new(
        run: RunId,
        initial: &[T],
        bounds: Option<Bounds>,
        membership: Membership<RunId>,
        gate: Arc<StartGate>,
        renderer: Arc<dyn Renderer<T>>,
    ) -> Self {
        let array = InstrumentedArray::from_slice(initial).with_observer(move |access, counts| {
            trace!(%run, ?access, reads = counts.reads, writes = counts.writes, "array access");
        });
        Self {
            run,
            array,
            sequence: run.algorithm.sequence(bounds),
            membership,
            gate,
            renderer,
        }
    }

    pub fn id(&self) -> RunId {
        self.run
    }

    /// Waits at the start gate, then steps and syncs until `Complete`.
    ///
    /// Leaves the synchronizer before returning. Synchronizer misuse panics:
    /// it is a coordination bug, not a run failure.
    pub fn run(self) -> RunReport<T> {
        let Runner {
            run,
            mut array,
            mut sequence,
            membership,
            gate,
            renderer,
        } = self;

        gate.wait();
        info!(%run, len = array.len(), "run started");
        let started = Instant::now();

        let result = drive(run, &mut array, sequence.as_mut(), &membership, renderer.as_ref());
        let left = membership.leave();

        let report = RunReport {
            run,
            counts: array.counts(),
            elapsed: started.elapsed(),
            result,
        };
        if let Err(err) = left {
            panic!("{run} could not leave the synchronizer: {err}");
        }
        match &report.result {
            Ok(_) => info!(
                %run,
                reads = report.counts.reads,
                writes = report.counts.writes,
                elapsed = ?report.elapsed,
                "run complete"
            ),
            Err(err) if err.is_fatal() => panic!("{run} hit a coordination bug: {err}"),
            Err(err) => warn!(%run, %err, "run failed"),
        }

        renderer.finished(&report);
        report
    }
}

fn drive<T: SortValue>(
    run: RunId,
    array: &mut InstrumentedArray<T>,
    sequence: &mut dyn StepSequence<T>,
    membership: &Membership<RunId>,
    renderer: &dyn Renderer<T>,
) -> Result<Vec<T>, SortError> {
    loop {
        let Some(step) = sequence.resume(array)? else {
            // Sequences always finish with Complete; treat a bare end the same way.
            return Ok(array.snapshot());
        };
        renderer.render(run, &step, array.counts());
        if let Step::Complete { snapshot } = step {
            return Ok(snapshot);
        }
        membership.sync()?;
    }
}
