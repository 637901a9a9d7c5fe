//! Configuration management for jpgresize

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{Result, ResizeError};
use crate::processing::FilterType;

pub mod presets;
pub use presets::*;

/// Default name prefix for freshly created output folders
pub const DEFAULT_FOLDER_PREFIX: &str = "Resized Images";

/// Main configuration structure, loaded from TOML or YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to produce
    pub resize: ResizeSettings,

    /// Where to put it
    pub output: OutputSettings,

    /// How to run the batch
    pub processing: ProcessingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Resize settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeSettings {
    /// Target size of the primary dimension in pixels
    pub width: u32,

    /// JPEG quality (clamped to 1-100)
    pub quality: Quality,

    /// Resampling filter
    pub filter: FilterType,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            width: WidthPreset::Small.width(),
            quality: Quality::default(),
            filter: FilterType::default(),
        }
    }
}

/// Where resized images are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// New uniquely named folder on the desktop
    Desktop,
    /// Explicit directory (`output.path`)
    Directory,
    /// New uniquely named folder inside `output.path`
    NewFolder,
    /// Replace the original files
    InPlace,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub mode: OutputMode,

    /// Directory used by the `directory` and `new_folder` modes
    pub path: Option<PathBuf>,

    /// Name prefix of newly created output folders
    pub folder_prefix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            mode: OutputMode::Desktop,
            path: None,
            folder_prefix: DEFAULT_FOLDER_PREFIX.to_string(),
        }
    }
}

/// Global processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of worker threads (None = sequential)
    pub threads: Option<usize>,

    /// Descend into subfolders when a folder is given
    pub recursive: bool,

    /// Maximum source file size (in bytes)
    pub max_file_size: u64,

    /// Maximum source image area (width * height)
    pub max_image_pixels: u64,

    /// What to do when a source image cannot be read
    pub on_error: ErrorPolicy,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            threads: None,
            recursive: false,
            max_file_size: 500 * 1024 * 1024, // 500MB
            max_image_pixels: 500_000_000,    // 500 megapixels
            on_error: ErrorPolicy::Abort,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// JPEG output quality, always within 1..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    /// Build a quality from any integer, clamping out-of-range values
    pub fn new(value: i64) -> Self {
        Self(value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

impl From<i64> for Quality {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Policy for source images that cannot be read or decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the batch at the first failure
    #[default]
    Abort,
    /// Report the failure and continue with the next image
    Skip,
}

/// Destination of a resize job; exactly one mode applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// New uniquely named folder on the user's desktop
    Desktop,
    /// New uniquely named folder inside the given directory
    NewFolderIn(PathBuf),
    /// Explicit directory, created if missing and reused if present
    Directory(PathBuf),
    /// Replace the original files after the whole batch is processed
    InPlace,
}

impl Destination {
    /// Resolve the three destination switches of the command line.
    ///
    /// "Save to desktop" wins whenever it is set. Otherwise replacing the
    /// originals and saving to an explicit path are mutually exclusive.
    /// With nothing set the desktop is used.
    pub fn from_flags(
        save_to_desktop: bool,
        resize_originals: bool,
        save_path: Option<PathBuf>,
    ) -> Result<Self> {
        if save_to_desktop {
            return Ok(Self::Desktop);
        }

        match (resize_originals, save_path) {
            (true, Some(path)) => Err(ResizeError::config(format!(
                "Cannot both replace originals and save to {:?}",
                path
            ))),
            (true, None) => Ok(Self::InPlace),
            (false, Some(path)) => Ok(Self::Directory(path)),
            (false, None) => Ok(Self::Desktop),
        }
    }

    pub fn is_in_place(&self) -> bool {
        matches!(self, Self::InPlace)
    }
}

/// Immutable description of one resize batch
#[derive(Debug, Clone)]
pub struct ResizeJob {
    /// Target size of the primary dimension
    pub target_width: u32,
    pub quality: Quality,
    pub destination: Destination,
    pub filter: FilterType,
    pub error_policy: ErrorPolicy,
    /// Worker threads; `None` or `Some(1)` processes on the calling thread
    pub threads: Option<usize>,
    /// Name prefix for `Desktop` and `NewFolderIn` output folders
    pub folder_prefix: String,
    pub max_file_size: u64,
    pub max_image_pixels: u64,
}

impl ResizeJob {
    /// Create a job for the given target width with default settings
    pub fn new(target_width: u32) -> Self {
        let processing = ProcessingConfig::default();
        Self {
            target_width,
            quality: Quality::default(),
            destination: Destination::Desktop,
            filter: FilterType::default(),
            error_policy: ErrorPolicy::default(),
            threads: None,
            folder_prefix: DEFAULT_FOLDER_PREFIX.to_string(),
            max_file_size: processing.max_file_size,
            max_image_pixels: processing.max_image_pixels,
        }
    }

    /// Use one of the preset widths
    pub fn preset(preset: WidthPreset) -> Self {
        Self::new(preset.width())
    }

    /// One worker per CPU core, capped at 16
    pub fn parallel(self) -> Self {
        self.threads(Some(num_cpus::get().min(16)))
    }

    /// Set quality; out-of-range values are clamped
    pub fn quality(mut self, quality: i64) -> Self {
        self.quality = Quality::new(quality);
        self
    }

    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn folder_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.folder_prefix = prefix.into();
        self
    }

    /// Validate job parameters
    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 {
            return Err(ResizeError::invalid_parameters("Target width must be greater than 0"));
        }

        if let Some(0) = self.threads {
            return Err(ResizeError::invalid_parameters("Thread count must be greater than 0"));
        }

        if self.folder_prefix.trim().is_empty()
            || self.folder_prefix.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|'])
        {
            return Err(ResizeError::invalid_parameters(format!(
                "Invalid output folder prefix: {:?}",
                self.folder_prefix
            )));
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ResizeError::config(format!(
                "Failed to read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        match config_extension(path.as_ref()).as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(ResizeError::config(
                "Unsupported config file format. Use .toml or .yaml",
            )),
        }
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = match config_extension(path.as_ref()).as_str() {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| ResizeError::config(format!("TOML serialization failed: {}", e)))?,
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| ResizeError::config(format!("YAML serialization failed: {}", e)))?,
            _ => {
                return Err(ResizeError::config(
                    "Unsupported config file format. Use .toml or .yaml",
                ))
            }
        };

        std::fs::write(&path, content).map_err(|e| {
            ResizeError::config(format!(
                "Failed to write config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.to_job()?.validate()
    }

    /// Build the resize job described by this configuration
    pub fn to_job(&self) -> Result<ResizeJob> {
        self.to_job_with(None)
    }

    /// Build the resize job, letting `destination` replace the `[output]`
    /// mode and path of the file
    pub fn to_job_with(&self, destination: Option<Destination>) -> Result<ResizeJob> {
        let destination = match destination {
            Some(destination) => destination,
            None => self.destination()?,
        };

        Ok(ResizeJob {
            target_width: self.resize.width,
            quality: self.resize.quality,
            destination,
            filter: self.resize.filter,
            error_policy: self.processing.on_error,
            threads: self.processing.threads,
            folder_prefix: self.output.folder_prefix.clone(),
            max_file_size: self.processing.max_file_size,
            max_image_pixels: self.processing.max_image_pixels,
        })
    }

    fn destination(&self) -> Result<Destination> {
        match (self.output.mode, &self.output.path) {
            (OutputMode::Desktop, _) => Ok(Destination::Desktop),
            (OutputMode::InPlace, _) => Ok(Destination::InPlace),
            (OutputMode::Directory, Some(path)) => Ok(Destination::Directory(path.clone())),
            (OutputMode::NewFolder, Some(path)) => Ok(Destination::NewFolderIn(path.clone())),
            (mode, None) => Err(ResizeError::config(format!(
                "Output mode {:?} requires output.path",
                mode
            ))),
        }
    }
}

fn config_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}
