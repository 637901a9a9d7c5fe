//! Progress events and the sinks that receive them

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use serde::Serialize;
use tracing::debug;

use crate::parallel::BatchSummary;
use crate::processing::ImageReport;

/// Progress update event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The output location is ready and processing begins
    Started {
        total: usize,
        output_folder: Option<PathBuf>,
    },
    /// One image finished
    ImageCompleted {
        index: usize,
        done: usize,
        total: usize,
        report: ImageReport,
    },
    /// One image could not be read and was skipped
    ImageSkipped {
        index: usize,
        done: usize,
        total: usize,
        path: PathBuf,
        error: String,
    },
    /// Every image is processed; staged files now replace the originals
    Replacing { count: usize },
    /// The batch finished
    Finished { summary: BatchSummary },
    /// The batch stopped at an error
    Aborted {
        path: Option<PathBuf>,
        error: String,
    },
}

impl ProgressEvent {
    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Aborted { .. })
    }
}

/// Receiver of progress events. Must be shareable across worker threads.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: &ProgressEvent) {}
}

/// Sink calling a closure for every event
pub struct Callback<F>(pub F);

/// Wrap a closure as a progress sink
pub fn callback<F>(f: F) -> Callback<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    Callback(f)
}

impl<F> ProgressSink for Callback<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: &ProgressEvent) {
        (self.0)(event)
    }
}

impl ProgressSink for tokio::sync::mpsc::UnboundedSender<ProgressEvent> {
    fn emit(&self, event: &ProgressEvent) {
        if self.send(event.clone()).is_err() {
            debug!("Progress receiver dropped");
        }
    }
}

impl ProgressSink for crossbeam::channel::Sender<ProgressEvent> {
    fn emit(&self, event: &ProgressEvent) {
        if self.send(event.clone()).is_err() {
            debug!("Progress receiver dropped");
        }
    }
}

/// Thread-safe counters for one batch
pub struct ProgressTracker {
    total: usize,
    done: AtomicUsize,
    completed: AtomicUsize,
    skipped: AtomicUsize,
    start_time: Instant,
}

/// Snapshot of a batch's progress
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

impl ProgressTracker {
    /// Start tracking a batch of `total` images
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Count a finished image; returns its position among all finished images
    pub fn complete_image(&self) -> usize {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.done.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Count a skipped image; returns its position among all finished images
    pub fn skip_image(&self) -> usize {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.done.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn get_state(&self) -> ProgressState {
        ProgressState {
            total: self.total,
            completed: self.completed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            elapsed: self.start_time.elapsed(),
        }
    }
}
