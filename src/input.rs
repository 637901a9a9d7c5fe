//! Collecting source images from files and folders

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, ResizeError};
use crate::processing::has_jpeg_extension;

/// Turn user-supplied files and folders into a sorted list of absolute
/// JPEG paths.
///
/// Files named explicitly are taken as given, whatever their extension.
/// Folders contribute their `.jpg`/`.jpeg` files; subfolders only when
/// `recursive` is set.
pub fn collect_sources<P: AsRef<Path>>(inputs: &[P], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut sources = BTreeSet::new();

    for input in inputs {
        let input = input.as_ref();
        let absolute = std::fs::canonicalize(input).map_err(|e| {
            ResizeError::validation(
                format!("Input path is not accessible: {}", e),
                Some(input.to_path_buf()),
            )
        })?;

        if absolute.is_dir() {
            let before = sources.len();
            let max_depth = if recursive { usize::MAX } else { 1 };
            for entry in WalkDir::new(&absolute)
                .max_depth(max_depth)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if has_jpeg_extension(entry.path()) {
                    sources.insert(entry.into_path());
                }
            }
            debug!("Found {} JPEG files in {:?}", sources.len() - before, absolute);
        } else {
            sources.insert(absolute);
        }
    }

    if sources.is_empty() {
        return Err(ResizeError::validation("No JPEG files found in the given inputs", None));
    }

    Ok(sources.into_iter().collect())
}
