//! JPEG detection by extension and by content

use std::path::Path;
use crate::error::{Result, ResizeError};

/// File extensions picked up when scanning a folder
pub fn supported_extensions() -> &'static [&'static str] {
    &["jpg", "jpeg"]
}

/// Check if a file extension names a JPEG
pub fn is_jpeg_extension(extension: &str) -> bool {
    supported_extensions()
        .iter()
        .any(|&ext| ext.eq_ignore_ascii_case(extension))
}

/// Check if a path has a JPEG extension
pub fn has_jpeg_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, is_jpeg_extension)
}

/// Identify file content from its leading bytes.
///
/// Returns the MIME type when the bytes match a known format.
pub fn sniff_mime_type(header: &[u8]) -> Option<&'static str> {
    infer::get(header).map(|kind| kind.mime_type())
}

/// Require that `header` is the start of a JPEG stream
pub fn ensure_jpeg_header(header: &[u8], path: &Path) -> Result<()> {
    match sniff_mime_type(header) {
        Some("image/jpeg") => Ok(()),
        Some(other) => Err(ResizeError::unsupported_format(
            other,
            Some(path.to_path_buf()),
        )),
        None => Err(ResizeError::validation(
            "File content is not a recognizable image",
            Some(path.to_path_buf()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_HEADER: [u8; 12] = [
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01,
    ];
    const PNG_HEADER: [u8; 12] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
    ];

    #[test]
    fn test_extensions() {
        assert!(is_jpeg_extension("jpg"));
        assert!(is_jpeg_extension("JPG"));
        assert!(is_jpeg_extension("jpeg"));
        assert!(!is_jpeg_extension("png"));

        assert!(has_jpeg_extension("/photos/IMG_0001.JPG"));
        assert!(!has_jpeg_extension("/photos/notes.txt"));
        assert!(!has_jpeg_extension("/photos/no_extension"));
    }

    #[test]
    fn test_sniffing() {
        assert_eq!(sniff_mime_type(&JPEG_HEADER), Some("image/jpeg"));
        assert_eq!(sniff_mime_type(&PNG_HEADER), Some("image/png"));
        assert_eq!(sniff_mime_type(b"plain text"), None);
    }

    #[test]
    fn test_ensure_jpeg_header() {
        let path = Path::new("photo.jpg");
        assert!(ensure_jpeg_header(&JPEG_HEADER, path).is_ok());

        let err = ensure_jpeg_header(&PNG_HEADER, path).unwrap_err();
        assert!(matches!(err, ResizeError::UnsupportedFormat { .. }));

        let err = ensure_jpeg_header(b"hello world!", path).unwrap_err();
        assert!(matches!(err, ResizeError::ValidationError { .. }));
    }
}
