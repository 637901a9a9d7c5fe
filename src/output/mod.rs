//! Output locations: unique folders, explicit directories and in-place replacement

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use chrono::Local;
use tracing::{debug, info};

use crate::config::Destination;
use crate::error::{Result, ResizeError};

pub mod atomic;
pub use atomic::*;

/// Upper bound on ` (n)` suffixes tried before giving up on a folder name
const MAX_FOLDER_ATTEMPTS: u32 = 10_000;

/// Where the files of one batch end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPlan {
    /// Every output goes into this directory under its source file name
    Folder(PathBuf),
    /// Outputs are staged beside their sources and replace them at the end
    InPlace,
}

impl OutputPlan {
    /// Resolve a destination into a concrete plan, creating folders as needed
    pub fn prepare(destination: &Destination, folder_prefix: &str) -> Result<Self> {
        match destination {
            Destination::Desktop => {
                let desktop = desktop_dir()?;
                let folder = create_unique_dir(&desktop, folder_prefix)?;
                info!("Writing resized images to new desktop folder {:?}", folder);
                Ok(Self::Folder(folder))
            }
            Destination::NewFolderIn(parent) => {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ResizeError::write(parent.clone(), e))?;
                let folder = create_unique_dir(parent, folder_prefix)?;
                info!("Writing resized images to new folder {:?}", folder);
                Ok(Self::Folder(folder))
            }
            Destination::Directory(path) => {
                std::fs::create_dir_all(path).map_err(|e| ResizeError::write(path.clone(), e))?;
                info!("Writing resized images to {:?}", path);
                Ok(Self::Folder(path.clone()))
            }
            Destination::InPlace => {
                info!("Resized images will replace their originals");
                Ok(Self::InPlace)
            }
        }
    }

    /// Final location of the output for `source`
    pub fn target_for(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source.file_name().ok_or_else(|| {
            ResizeError::validation("Source path has no file name", Some(source.to_path_buf()))
        })?;

        Ok(match self {
            Self::Folder(dir) => dir.join(file_name),
            Self::InPlace => source.to_path_buf(),
        })
    }

    /// The output folder, if this plan writes into one
    pub fn folder(&self) -> Option<&Path> {
        match self {
            Self::Folder(dir) => Some(dir),
            Self::InPlace => None,
        }
    }
}

/// The user's desktop directory
pub fn desktop_dir() -> Result<PathBuf> {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .filter(|dir| dir.is_dir())
        .ok_or_else(|| ResizeError::config("Could not locate the desktop directory"))
}

/// Create a new, previously nonexistent folder `"<prefix> <timestamp>"` in
/// `parent`, appending ` (2)`, ` (3)`, ... while the name is taken.
///
/// Directory creation itself is the uniqueness check, so two batches
/// started within the same second still get different folders.
pub fn create_unique_dir(parent: &Path, prefix: &str) -> Result<PathBuf> {
    let base = format!("{} {}", prefix, Local::now().format("%Y-%m-%d %H.%M.%S"));

    for attempt in 1..=MAX_FOLDER_ATTEMPTS {
        let name = if attempt == 1 {
            base.clone()
        } else {
            format!("{} ({})", base, attempt)
        };
        let candidate = parent.join(name);

        match std::fs::create_dir(&candidate) {
            Ok(()) => {
                debug!("Created output folder {:?}", candidate);
                return Ok(candidate);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(ResizeError::write(candidate, e)),
        }
    }

    Err(ResizeError::system(format!(
        "No free folder name for {:?} in {:?}",
        base, parent
    )))
}

/// Fail if two sources share a file name and would be written to the same
/// file of an output folder
pub fn ensure_distinct_names(sources: &[PathBuf]) -> Result<()> {
    let mut seen: HashMap<&OsStr, &Path> = HashMap::with_capacity(sources.len());

    for source in sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        if let Some(first) = seen.insert(name, source) {
            return Err(ResizeError::config(format!(
                "{} and {} would both be written as {}; resize them in separate batches",
                first.display(),
                source.display(),
                Path::new(name).display()
            )));
        }
    }

    Ok(())
}

/// Whether two paths name the same existing file
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
