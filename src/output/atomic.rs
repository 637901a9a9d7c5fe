//! Temp-file-then-rename writes

use std::fs::{File, Permissions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile, TempPath};
use tracing::debug;

use crate::error::{Result, ResizeError};

const TEMP_PREFIX: &str = ".jpgresize-";
const TEMP_SUFFIX: &str = ".tmp";

/// A fully written replacement waiting to be renamed over its original
#[derive(Debug)]
pub struct StagedReplacement {
    original: PathBuf,
    staged: TempPath,
}

impl StagedReplacement {
    pub fn staged_path(&self) -> &Path {
        &self.staged
    }

    /// Atomically rename the staged file over the original
    pub fn commit(self) -> Result<()> {
        let original = self.original;
        self.staged
            .persist(&original)
            .map_err(|e| ResizeError::replace(original.clone(), e.error))?;
        debug!("Replaced {:?}", original);
        Ok(())
    }
}

/// Write a file so that `target` only ever holds complete content.
///
/// `fill` writes into a temporary file in the target's directory, which is
/// then renamed onto `target`. Returns the number of bytes written.
pub fn write_atomically<F>(target: &Path, permissions: Option<Permissions>, fill: F) -> Result<u64>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let temp = write_temp_beside(target, permissions, fill)?;
    let size = temp
        .as_file()
        .metadata()
        .map_err(|e| ResizeError::write(target, e))?
        .len();

    temp.persist(target)
        .map_err(|e| ResizeError::write(target, e.error))?;
    Ok(size)
}

/// Write the replacement for `original` beside it without touching the
/// original yet. Dropping the returned value removes the staged file.
pub fn stage_replacement<F>(
    original: &Path,
    permissions: Option<Permissions>,
    fill: F,
) -> Result<StagedReplacement>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let temp = write_temp_beside(original, permissions, fill)?;
    Ok(StagedReplacement {
        original: original.to_path_buf(),
        staged: temp.into_temp_path(),
    })
}

/// Commit staged replacements in order, stopping at the first failure.
///
/// Originals that were not yet replaced stay untouched and their staged
/// files are removed.
pub fn commit_all(staged: Vec<StagedReplacement>) -> Result<usize> {
    let total = staged.len();
    for replacement in staged {
        replacement.commit()?;
    }
    Ok(total)
}

fn write_temp_beside<F>(
    target: &Path,
    permissions: Option<Permissions>,
    fill: F,
) -> Result<NamedTempFile>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| ResizeError::write(target, e))?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        fill(&mut writer)?;
        writer.flush().map_err(|e| ResizeError::write(target, e))?;
    }

    let file: &File = temp.as_file();
    file.sync_all().map_err(|e| ResizeError::write(target, e))?;
    if let Some(permissions) = permissions {
        file.set_permissions(permissions)
            .map_err(|e| ResizeError::write(target, e))?;
    }

    Ok(temp)
}

/// Whether a file name belongs to one of our temporary files
pub fn is_temp_file_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftovers(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| is_temp_file_name(&entry.file_name().to_string_lossy()))
            .count()
    }

    #[test]
    fn test_write_atomically() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.jpg");

        let size = write_atomically(&target, None, |w| {
            w.write_all(b"resized").map_err(ResizeError::from)
        })
        .unwrap();

        assert_eq!(size, 7);
        assert_eq!(std::fs::read(&target).unwrap(), b"resized");
        assert_eq!(leftovers(dir.path()), 0);
    }

    #[test]
    fn test_failed_write_leaves_target_alone() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.jpg");
        std::fs::write(&target, b"previous").unwrap();

        let result = write_atomically(&target, None, |w| {
            w.write_all(b"partial").map_err(ResizeError::from)?;
            Err(ResizeError::system("encoder exploded"))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read(&target).unwrap(), b"previous");
        assert_eq!(leftovers(dir.path()), 0);
    }

    #[test]
    fn test_staged_replacement_commit() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("photo.jpg");
        std::fs::write(&original, b"original").unwrap();

        let staged = stage_replacement(&original, None, |w| {
            w.write_all(b"smaller").map_err(ResizeError::from)
        })
        .unwrap();

        // Nothing happens to the original until commit
        assert_eq!(std::fs::read(&original).unwrap(), b"original");
        assert!(staged.staged_path().exists());

        assert_eq!(commit_all(vec![staged]).unwrap(), 1);
        assert_eq!(std::fs::read(&original).unwrap(), b"smaller");
        assert_eq!(leftovers(dir.path()), 0);
    }

    #[test]
    fn test_dropped_stage_keeps_original() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("photo.jpg");
        std::fs::write(&original, b"original").unwrap();

        let staged = stage_replacement(&original, None, |w| {
            w.write_all(b"smaller").map_err(ResizeError::from)
        })
        .unwrap();
        drop(staged);

        assert_eq!(std::fs::read(&original).unwrap(), b"original");
        assert_eq!(leftovers(dir.path()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_are_applied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.jpg");
        write_atomically(&target, Some(Permissions::from_mode(0o644)), |w| {
            w.write_all(b"x").map_err(ResizeError::from)
        })
        .unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
