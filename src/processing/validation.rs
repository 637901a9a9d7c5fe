//! Source file validation

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, ResizeError};
use crate::processing::formats::ensure_jpeg_header;

/// What validation learned about a source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
}

impl SourceInfo {
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Checks that a source file is a readable JPEG within size limits
pub struct ImageValidator {
    max_file_size: u64,
    max_image_pixels: u64,
}

impl ImageValidator {
    /// Create a new image validator with default limits
    pub fn new() -> Self {
        Self {
            max_file_size: 500 * 1024 * 1024, // 500MB
            max_image_pixels: 500_000_000,    // 500 megapixels
        }
    }

    /// Create a validator with custom limits
    pub fn with_limits(max_file_size: u64, max_image_pixels: u64) -> Self {
        Self {
            max_file_size,
            max_image_pixels,
        }
    }

    /// Validate a file for processing.
    ///
    /// Reads only the file header, never the full image.
    pub fn validate_file<P: AsRef<Path>>(&self, path: P) -> Result<SourceInfo> {
        let path = path.as_ref();
        debug!("Validating file: {:?}", path);

        let metadata = std::fs::metadata(path).map_err(|e| {
            ResizeError::validation(format!("Cannot access file: {}", e), Some(path.to_path_buf()))
        })?;

        if !metadata.is_file() {
            return Err(ResizeError::validation(
                "Path is not a regular file",
                Some(path.to_path_buf()),
            ));
        }

        let file_size = metadata.len();
        if file_size == 0 {
            return Err(ResizeError::validation("File is empty", Some(path.to_path_buf())));
        }

        if file_size > self.max_file_size {
            return Err(ResizeError::file_too_large(
                file_size,
                self.max_file_size,
                path.to_path_buf(),
            ));
        }

        let mut file = File::open(path).map_err(|e| {
            ResizeError::validation(format!("Cannot open file: {}", e), Some(path.to_path_buf()))
        })?;

        let mut header = [0u8; 32];
        let bytes_read = read_up_to(&mut file, &mut header).map_err(|e| {
            ResizeError::validation(
                format!("Cannot read file header: {}", e),
                Some(path.to_path_buf()),
            )
        })?;
        ensure_jpeg_header(&header[..bytes_read], path)?;

        let (width, height) = read_dimensions(path)?;
        let info = SourceInfo {
            path: path.to_path_buf(),
            file_size,
            width,
            height,
        };

        if info.pixel_count() > self.max_image_pixels {
            return Err(ResizeError::image_too_large(
                width,
                height,
                self.max_image_pixels,
                Some(info.path),
            ));
        }

        Ok(info)
    }
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Read JPEG dimensions from the frame header without decoding pixels
fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    let file = File::open(path).map_err(|e| {
        ResizeError::validation(format!("Cannot open file: {}", e), Some(path.to_path_buf()))
    })?;
    image::io::Reader::with_format(BufReader::new(file), image::ImageFormat::Jpeg)
        .into_dimensions()
        .map_err(|e| {
            ResizeError::validation(
                format!("Cannot read image dimensions: {}", e),
                Some(path.to_path_buf()),
            )
        })
}

fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Quality;
    use crate::processing::encode_jpeg;
    use image::DynamicImage;
    use tempfile::TempDir;

    fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        encode_jpeg(&DynamicImage::new_rgb8(width, height), Quality::default(), file).unwrap();
        path
    }

    #[test]
    fn test_valid_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = write_jpeg(dir.path(), "ok.jpg", 40, 30);

        let info = ImageValidator::new().validate_file(&path).unwrap();
        assert_eq!((info.width, info.height), (40, 30));
        assert_eq!(info.pixel_count(), 1200);
        assert!(info.file_size > 0);
    }

    #[test]
    fn test_missing_and_empty_files() {
        let dir = TempDir::new().unwrap();
        let validator = ImageValidator::new();

        let err = validator.validate_file(dir.path().join("missing.jpg")).unwrap_err();
        assert!(matches!(err, ResizeError::ValidationError { .. }));
        assert!(err.is_recoverable());

        let empty = dir.path().join("empty.jpg");
        std::fs::write(&empty, b"").unwrap();
        assert!(validator.validate_file(&empty).is_err());

        assert!(validator.validate_file(dir.path()).is_err());
    }

    #[test]
    fn test_not_a_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"this is certainly not an image").unwrap();

        let err = ImageValidator::new().validate_file(&path).unwrap_err();
        assert_eq!(err.file_path(), Some(&path));
    }

    #[test]
    fn test_truncated_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("truncated.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();

        assert!(ImageValidator::new().validate_file(&path).is_err());
    }

    #[test]
    fn test_limits() {
        let dir = TempDir::new().unwrap();
        let path = write_jpeg(dir.path(), "big.jpg", 100, 100);

        let err = ImageValidator::with_limits(u64::MAX, 5_000)
            .validate_file(&path)
            .unwrap_err();
        assert!(matches!(err, ResizeError::ImageTooLarge { .. }));

        let err = ImageValidator::with_limits(10, u64::MAX)
            .validate_file(&path)
            .unwrap_err();
        assert!(matches!(err, ResizeError::FileTooLarge { .. }));
    }
}
