//! Boundary toward whatever displays the runs.
//!
//! Runners call a [`Renderer`] synchronously on their own thread, so
//! implementations hand the data off and return. [`ChannelRenderer`] does that
//! over a crossbeam channel and [`RenderFrames`] rebuilds per-run frames on the
//! receiving side, releasing one batch per closed round.

use crate::array::{AccessCounts, SortValue};
use crate::runner::{RunId, RunReport};
use crate::step::Step;
use colored::Colorize;
use crossbeam::channel::{self, Receiver, Sender};
use itertools::Itertools;
use parking_lot::Mutex;
use std::collections::BTreeMap;

pub trait Renderer<T>: Send + Sync {
    fn render(&self, run: RunId, step: &Step<T>, counts: AccessCounts);

    /// Called once per run after it left the synchronizer.
    fn finished(&self, _report: &RunReport<T>) {}
}

impl<T, A, B> Renderer<T> for (A, B)
where
    A: Renderer<T>,
    B: Renderer<T>,
{
    fn render(&self, run: RunId, step: &Step<T>, counts: AccessCounts) {
        self.0.render(run, step, counts);
        self.1.render(run, step, counts);
    }

    fn finished(&self, report: &RunReport<T>) {
        self.0.finished(report);
        self.1.finished(report);
    }
}

// =============================================================================
// Channel hand-off
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent<T> {
    Step {
        run: RunId,
        step: Step<T>,
        counts: AccessCounts,
    },
    RoundComplete,
    Finished {
        run: RunId,
        counts: AccessCounts,
        sorted: bool,
    },
}

pub struct ChannelRenderer<T> {
    tx: Sender<RenderEvent<T>>,
}

/// Creates a connected renderer and frame consumer.
pub fn render_channel<T: SortValue>() -> (ChannelRenderer<T>, RenderFrames<T>) {
    let (tx, rx) = channel::unbounded();
    (ChannelRenderer { tx }, RenderFrames::new(rx))
}

impl<T: SortValue> ChannelRenderer<T> {
    /// Round-complete hook for the synchronizer: marks a batch boundary.
    ///
    /// Only enqueues a marker, so it is safe to run under the synchronizer
    /// lock.
    pub fn round_hook(&self) -> impl Fn() + Send + Sync + 'static {
        let tx = self.tx.clone();
        move || {
            // A dropped consumer just means nobody is watching any more.
            let _ = tx.send(RenderEvent::RoundComplete);
        }
    }
}

impl<T: SortValue> Renderer<T> for ChannelRenderer<T> {
    fn render(&self, run: RunId, step: &Step<T>, counts: AccessCounts) {
        let _ = self.tx.send(RenderEvent::Step {
            run,
            step: step.clone(),
            counts,
        });
    }

    fn finished(&self, report: &RunReport<T>) {
        let _ = self.tx.send(RenderEvent::Finished {
            run: report.run,
            counts: report.counts,
            sorted: report.is_sorted(),
        });
    }
}

/// Latest visible state of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<T> {
    pub run: RunId,
    pub array: Vec<T>,
    pub read_index: Option<usize>,
    pub write_index: Option<usize>,
    pub counts: AccessCounts,
    pub complete: bool,
    pub finished: bool,
}

impl<T: SortValue> Frame<T> {
    fn new(run: RunId) -> Self {
        Self {
            run,
            array: Vec::new(),
            read_index: None,
            write_index: None,
            counts: AccessCounts::default(),
            complete: false,
            finished: false,
        }
    }

    fn apply(&mut self, step: Step<T>, counts: AccessCounts) {
        self.counts = counts;
        self.read_index = step.read_index();
        self.write_index = step.write_index();
        match step {
            Step::Read { .. } => {}
            Step::Write { snapshot, .. } => self.array = snapshot,
            Step::Complete { snapshot } => {
                self.array = snapshot;
                self.complete = true;
            }
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.array.iter().tuple_windows().all(|(a, b)| a <= b)
    }
}

/// Consumer side of [`render_channel`]: yields every run's frame once per
/// closed round, plus a final batch when all senders are gone.
pub struct RenderFrames<T> {
    rx: Receiver<RenderEvent<T>>,
    frames: BTreeMap<RunId, Frame<T>>,
    dirty: bool,
}

impl<T: SortValue> RenderFrames<T> {
    pub fn new(rx: Receiver<RenderEvent<T>>) -> Self {
        Self {
            rx,
            frames: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Seeds a run's frame with the array it starts from.
    pub fn seed(&mut self, run: RunId, initial: &[T]) {
        self.frames.entry(run).or_insert_with(|| Frame::new(run)).array = initial.to_vec();
    }

    fn batch(&mut self) -> Vec<Frame<T>> {
        self.dirty = false;
        self.frames.values().cloned().collect()
    }
}

impl<T: SortValue> Iterator for RenderFrames<T> {
    type Item = Vec<Frame<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Ok(event) = self.rx.recv() {
            match event {
                RenderEvent::Step { run, step, counts } => {
                    self.frames
                        .entry(run)
                        .or_insert_with(|| Frame::new(run))
                        .apply(step, counts);
                    self.dirty = true;
                }
                RenderEvent::Finished { run, counts, .. } => {
                    let frame = self.frames.entry(run).or_insert_with(|| Frame::new(run));
                    frame.counts = counts;
                    frame.read_index = None;
                    frame.write_index = None;
                    frame.finished = true;
                    self.dirty = true;
                }
                RenderEvent::RoundComplete => return Some(self.batch()),
            }
        }
        if self.dirty {
            Some(self.batch())
        } else {
            None
        }
    }
}

// =============================================================================
// Text summary
// =============================================================================

/// Prints one line per finished run, and optionally the array after every
/// write.
#[derive(Debug, Default)]
pub struct SummaryRenderer {
    trace_writes: bool,
}

impl SummaryRenderer {
    pub fn new(trace_writes: bool) -> Self {
        Self { trace_writes }
    }
}

/// `name: read_count = R, write_count = W, time = Ts`, flagged when unsorted.
pub fn summary_line<T: SortValue>(report: &RunReport<T>) -> String {
    let mut line = format!(
        "{}: read_count = {}, write_count = {}, time = {:.2}s",
        report.run.algorithm,
        report.counts.reads,
        report.counts.writes,
        report.elapsed.as_secs_f64()
    );
    if let Err(err) = &report.result {
        line.push_str(&format!(" ** FAILED: {err} **"));
    } else if !report.is_sorted() {
        line.push_str(" ** NOT SORTED **");
    }
    line
}

impl<T: SortValue> Renderer<T> for SummaryRenderer {
    fn render(&self, run: RunId, step: &Step<T>, _counts: AccessCounts) {
        if !self.trace_writes {
            return;
        }
        if let Step::Write { snapshot, .. } = step {
            println!("{}: array = {:?}", run.algorithm, snapshot);
        }
    }

    fn finished(&self, report: &RunReport<T>) {
        let line = summary_line(report);
        if report.is_sorted() {
            println!("{}", line.green());
        } else {
            println!("{}", line.red().bold());
        }
    }
}

// =============================================================================
// Recording
// =============================================================================

/// Keeps every call it receives; handy for inspecting a run after the fact.
pub struct RecordingRenderer<T> {
    calls: Mutex<Vec<(RunId, Step<T>, AccessCounts)>>,
    finished: Mutex<Vec<RunId>>,
}

impl<T: SortValue> RecordingRenderer<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(RunId, Step<T>, AccessCounts)> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, run: RunId) -> Vec<Step<T>> {
        self.calls
            .lock()
            .iter()
            .filter(|(id, _, _)| *id == run)
            .map(|(_, step, _)| step.clone())
            .collect()
    }

    pub fn finished_runs(&self) -> Vec<RunId> {
        self.finished.lock().clone()
    }
}

impl<T: SortValue> Default for RecordingRenderer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SortValue> Renderer<T> for RecordingRenderer<T> {
    fn render(&self, run: RunId, step: &Step<T>, counts: AccessCounts) {
        self.calls.lock().push((run, step.clone(), counts));
    }

    fn finished(&self, report: &RunReport<T>) {
        self.finished.lock().push(report.run);
    }
}
