//! jpgresize - Batch JPEG Resizer
//!
//! Shrinks a batch of JPEG photos to a target width while keeping their
//! aspect ratio. Results go to a new folder on the desktop, to an explicit
//! directory, or replace the originals.
//!
//! The target width applies to the *primary dimension*: the width of
//! landscape and square images, the height of portrait ones. Images whose
//! primary dimension already fits are copied unchanged, never upscaled.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jpgresize::{collect_sources, BatchProcessor, Destination, ResizeJob};
//! use jpgresize::parallel::callback;
//!
//! let job = ResizeJob::new(1024)
//!     .quality(85)
//!     .destination(Destination::Directory("resized".into()));
//!
//! let sources = collect_sources(&["photos"], false)?;
//! let report = BatchProcessor::new(job)?.run(
//!     &sources,
//!     &callback(|event| println!("{:?}", event)),
//! )?;
//!
//! println!("{} images resized", report.summary.resized);
//! # Ok::<(), jpgresize::ResizeError>(())
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod parallel;
pub mod processing;

// Re-export commonly used types
pub use config::{Config, Destination, ErrorPolicy, Quality, ResizeJob, WidthPreset};
pub use error::{Result, ResizeError};
pub use input::collect_sources;
pub use parallel::{BatchProcessor, BatchReport, BatchSummary, ProgressEvent, ProgressSink};
pub use processing::{FilterType, ImageAction, ImageReport, ProcessingEngine};

use tracing::info;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the `RUST_LOG` filter.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init() -> Result<()> {
    if tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish(),
    )
    .is_ok()
    {
        info!("jpgresize v{} initialized", VERSION);
    }

    Ok(())
}

/// Initialize logging from the `[logging]` section of a configuration
pub fn init_with_config(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.logging.level).map_err(|e| {
        ResizeError::config(format!(
            "Invalid log level {:?}: {}",
            config.logging.level, e
        ))
    })?;

    let builder = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.logging.json_format {
        tracing::subscriber::set_global_default(builder.json().finish()).is_ok()
    } else {
        tracing::subscriber::set_global_default(builder.finish()).is_ok()
    };

    if installed {
        info!("jpgresize v{} initialized with custom config", VERSION);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_init() {
        // Should not fail on multiple calls
        assert!(init().is_ok());
        assert!(init().is_ok());
    }

    #[test]
    fn test_init_rejects_bad_level() {
        let mut config = Config::default();
        config.logging.level = "jpgresize=verbose".to_string();
        assert!(init_with_config(&config).is_err());
    }
}
