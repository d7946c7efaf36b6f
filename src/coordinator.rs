use crate::algorithms::{Algorithm, Bounds};
use crate::array::SortValue;
use crate::error::SortError;
use crate::gate::StartGate;
use crate::render::Renderer;
use crate::runner::{RunId, RunReport, Runner};
use crate::synchronizer::Synchronizer;
use std::panic;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

type RoundHook = Box<dyn Fn() + Send + Sync>;

/// Starts one runner per algorithm over copies of the same initial sequence
/// and keeps them in lockstep through a shared synchronizer.
pub struct Coordinator<T: SortValue> {
    initial: Arc<[T]>,
    algorithms: Vec<Algorithm>,
    bounds: Option<Bounds>,
    renderer: Arc<dyn Renderer<T>>,
    round_hook: Option<RoundHook>,
}

impl<T: SortValue> Coordinator<T> {
    pub fn new(initial: impl Into<Arc<[T]>>, renderer: Arc<dyn Renderer<T>>) -> Self {
        Self {
            initial: initial.into(),
            algorithms: Vec::new(),
            bounds: None,
            renderer,
            round_hook: None,
        }
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithms.push(algorithm);
        self
    }

    pub fn algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.algorithms.extend(algorithms);
        self
    }

    /// Sorts only `[lo, hi]` of every copy; defaults to the whole sequence.
    pub fn bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Fired once per closed round, under the synchronizer lock.
    pub fn on_round_complete<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.round_hook = Some(Box::new(hook));
        self
    }

    /// Runs every algorithm to completion and returns reports in the order the
    /// algorithms were added.
    ///
    /// A failing run is reported, not returned as an error. A runner panic
    /// (synchronizer misuse) is resumed on the calling thread.
    pub fn run(self) -> Result<Vec<RunReport<T>>, SortError> {
        let Coordinator {
            initial,
            algorithms,
            bounds,
            renderer,
            round_hook,
        } = self;

        let mut synchronizer = Synchronizer::new();
        if let Some(hook) = round_hook {
            synchronizer = synchronizer.with_round_hook(hook);
        }
        let synchronizer = Arc::new(synchronizer);
        let gate = Arc::new(StartGate::new());
        let bounds = bounds.or_else(|| Bounds::full(initial.len()));

        // Everyone joins before any thread exists, so no early starter can
        // close rounds on its own.
        let runners = algorithms
            .iter()
            .enumerate()
            .map(|(index, &algorithm)| {
                let run = RunId { index, algorithm };
                let membership = synchronizer.enroll(run)?;
                Ok(Runner::new(
                    run,
                    &initial,
                    bounds,
                    membership,
                    Arc::clone(&gate),
                    Arc::clone(&renderer),
                ))
            })
            .collect::<Result<Vec<_>, SortError>>()?;

        let mut handles = Vec::with_capacity(runners.len());
        let mut spawn_failure = None;
        for runner in runners {
            if spawn_failure.is_some() {
                // Dropping the runner drops its membership, which leaves.
                continue;
            }
            let run = runner.id();
            match thread::Builder::new()
                .name(run.algorithm.name().to_string())
                .spawn(move || runner.run())
            {
                Ok(handle) => {
                    debug!(%run, "runner spawned");
                    handles.push(handle);
                }
                Err(err) => spawn_failure = Some(err),
            }
        }

        info!(runs = handles.len(), len = initial.len(), "opening start gate");
        gate.open();

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.join() {
                Ok(report) => reports.push(report),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        info!(rounds = synchronizer.rounds_closed(), "all runs finished");

        match spawn_failure {
            Some(err) => Err(SortError::Spawn(err)),
            None => Ok(reports),
        }
    }
}
