//! Batch execution: sequential or on a rayon pool, with progress events

use std::path::{Path, PathBuf};
use std::time::Duration;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ErrorPolicy, ResizeJob};
use crate::error::{Result, ResizeError};
use crate::output::{commit_all, ensure_distinct_names, OutputPlan, StagedReplacement};
use crate::processing::{ImageAction, ImageReport, ProcessingEngine};

pub mod progress;

pub use progress::*;

/// A source image that was skipped under `ErrorPolicy::Skip`
#[derive(Debug, Clone, Serialize)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub error: String,
}

/// Totals for a finished batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub resized: usize,
    pub copied: usize,
    pub unchanged: usize,
    pub skipped: usize,
    /// Originals replaced by their resized versions
    pub replaced: usize,
    pub output_folder: Option<PathBuf>,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Get size reduction percentage
    pub fn size_reduction(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        let reduction = self.input_bytes.saturating_sub(self.output_bytes);
        (reduction as f64 / self.input_bytes as f64) * 100.0
    }

    /// Images that made it to the destination
    pub fn processed(&self) -> usize {
        self.resized + self.copied + self.unchanged
    }
}

/// Result of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub images: Vec<ImageReport>,
    pub skipped: Vec<SkippedImage>,
}

enum Outcome {
    Done(ImageReport, Option<StagedReplacement>),
    Skipped(SkippedImage),
}

/// Runs a resize job over a list of source files
pub struct BatchProcessor {
    job: ResizeJob,
    engine: ProcessingEngine,
}

impl BatchProcessor {
    /// Create a processor for a validated job
    pub fn new(job: ResizeJob) -> Result<Self> {
        job.validate()?;
        let engine = ProcessingEngine::new(&job);
        Ok(Self { job, engine })
    }

    /// Process every source and report progress to `sink`.
    ///
    /// Runs to completion on the calling thread unless the job asks for
    /// more than one worker. With in-place replacement, originals are only
    /// touched after every image has been processed.
    pub fn run(&self, sources: &[PathBuf], sink: &dyn ProgressSink) -> Result<BatchReport> {
        let result = self.run_inner(sources, sink);

        if let Err(e) = &result {
            sink.emit(&ProgressEvent::Aborted {
                path: e.file_path().cloned(),
                error: e.user_message(),
            });
        }

        result
    }

    /// Run the batch on tokio's blocking pool, streaming events over a channel.
    ///
    /// The receiver yields one event per image and ends with `Finished` or
    /// `Aborted`. Must be called within a tokio runtime.
    pub fn spawn(
        self,
        sources: Vec<PathBuf>,
    ) -> (
        tokio::task::JoinHandle<Result<BatchReport>>,
        tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>,
    ) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let handle = tokio::task::spawn_blocking(move || self.run(&sources, &sender));
        (handle, receiver)
    }

    fn run_inner(&self, sources: &[PathBuf], sink: &dyn ProgressSink) -> Result<BatchReport> {
        if sources.is_empty() {
            return Err(ResizeError::invalid_parameters("No source images given"));
        }

        if !self.job.destination.is_in_place() {
            ensure_distinct_names(sources)?;
        }

        let plan = OutputPlan::prepare(&self.job.destination, &self.job.folder_prefix)?;
        let tracker = ProgressTracker::new(sources.len());

        info!(
            "Resizing {} images to {}px (quality {})",
            sources.len(),
            self.job.target_width,
            self.job.quality
        );
        sink.emit(&ProgressEvent::Started {
            total: sources.len(),
            output_folder: plan.folder().map(Path::to_path_buf),
        });

        let outcomes = match self.job.threads {
            Some(threads) if threads > 1 && sources.len() > 1 => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ResizeError::system(format!("Failed to build thread pool: {}", e)))?;

                debug!("Processing on {} worker threads", threads);
                pool.install(|| {
                    sources
                        .par_iter()
                        .enumerate()
                        .map(|(index, source)| self.process_one(index, source, &plan, &tracker, sink))
                        .collect::<Result<Vec<_>>>()
                })?
            }
            _ => sources
                .iter()
                .enumerate()
                .map(|(index, source)| self.process_one(index, source, &plan, &tracker, sink))
                .collect::<Result<Vec<_>>>()?,
        };

        let mut images = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        let mut staged = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Done(report, replacement) => {
                    images.push(report);
                    staged.extend(replacement);
                }
                Outcome::Skipped(image) => skipped.push(image),
            }
        }

        let replaced = if staged.is_empty() {
            0
        } else {
            info!("Replacing {} originals", staged.len());
            sink.emit(&ProgressEvent::Replacing { count: staged.len() });
            commit_all(staged)?
        };

        let summary = summarize(&images, skipped.len(), replaced, &plan, &tracker);
        info!(
            "Batch completed: {} resized, {} copied, {} unchanged, {} skipped in {:.2}s",
            summary.resized,
            summary.copied,
            summary.unchanged,
            summary.skipped,
            summary.elapsed.as_secs_f64()
        );
        sink.emit(&ProgressEvent::Finished {
            summary: summary.clone(),
        });

        Ok(BatchReport {
            summary,
            images,
            skipped,
        })
    }

    fn process_one(
        &self,
        index: usize,
        source: &Path,
        plan: &OutputPlan,
        tracker: &ProgressTracker,
        sink: &dyn ProgressSink,
    ) -> Result<Outcome> {
        match self.engine.process_file(source, plan) {
            Ok(processed) => {
                let done = tracker.complete_image();
                sink.emit(&ProgressEvent::ImageCompleted {
                    index,
                    done,
                    total: tracker.total(),
                    report: processed.report.clone(),
                });
                Ok(Outcome::Done(processed.report, processed.staged))
            }
            Err(e) if e.is_recoverable() && self.job.error_policy == ErrorPolicy::Skip => {
                warn!("Skipping {:?}: {}", source, e);
                let done = tracker.skip_image();
                let error = e.user_message();
                sink.emit(&ProgressEvent::ImageSkipped {
                    index,
                    done,
                    total: tracker.total(),
                    path: source.to_path_buf(),
                    error: error.clone(),
                });
                Ok(Outcome::Skipped(SkippedImage {
                    path: source.to_path_buf(),
                    error,
                }))
            }
            Err(e) => Err(e),
        }
    }
}

fn summarize(
    images: &[ImageReport],
    skipped: usize,
    replaced: usize,
    plan: &OutputPlan,
    tracker: &ProgressTracker,
) -> BatchSummary {
    let count = |action: ImageAction| images.iter().filter(|r| r.action == action).count();

    BatchSummary {
        total: tracker.total(),
        resized: count(ImageAction::Resized),
        copied: count(ImageAction::Copied),
        unchanged: count(ImageAction::Unchanged),
        skipped,
        replaced,
        output_folder: plan.folder().map(Path::to_path_buf),
        input_bytes: images.iter().map(|r| r.input_size).sum(),
        output_bytes: images.iter().map(|r| r.output_size).sum(),
        elapsed: tracker.get_state().elapsed,
    }
}
