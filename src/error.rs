//! Error types and handling for jpgresize

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for jpgresize operations
pub type Result<T> = std::result::Result<T, ResizeError>;

/// Main error type for jpgresize operations
#[derive(Debug, Error)]
pub enum ResizeError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid resize parameters
    #[error("Invalid resize parameters: {message}")]
    InvalidParameters { message: String },

    /// Source is not a JPEG
    #[error("Unsupported image format: {format} (file: {file:?})")]
    UnsupportedFormat {
        format: String,
        file: Option<PathBuf>,
    },

    /// Source file failed validation (missing, empty, corrupt)
    #[error("File validation failed: {message} (file: {file:?})")]
    ValidationError {
        message: String,
        file: Option<PathBuf>,
    },

    /// File size too large
    #[error("File too large: {size} bytes (limit: {limit} bytes, file: {file:?})")]
    FileTooLarge {
        size: u64,
        limit: u64,
        file: PathBuf,
    },

    /// Image dimensions too large
    #[error("Image too large: {width}x{height} pixels (limit: {limit} pixels, file: {file:?})")]
    ImageTooLarge {
        width: u32,
        height: u32,
        limit: u64,
        file: Option<PathBuf>,
    },

    /// Writing an output file failed
    #[error("Failed to write {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Renaming a staged file over its original failed
    #[error("Failed to replace original {path:?}: {source}")]
    ReplaceError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),

    /// System resource errors (thread pools, task joins)
    #[error("System resource error: {message}")]
    SystemError { message: String },
}

impl ResizeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S, file: Option<PathBuf>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
            file,
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S, file: Option<PathBuf>) -> Self {
        Self::ValidationError {
            message: message.into(),
            file,
        }
    }

    /// Create a new file too large error
    pub fn file_too_large(size: u64, limit: u64, file: PathBuf) -> Self {
        Self::FileTooLarge { size, limit, file }
    }

    /// Create a new image too large error
    pub fn image_too_large(width: u32, height: u32, limit: u64, file: Option<PathBuf>) -> Self {
        Self::ImageTooLarge {
            width,
            height,
            limit,
            file,
        }
    }

    /// Create a new write error
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Create a new replace error
    pub fn replace(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReplaceError {
            path: path.into(),
            source,
        }
    }

    /// Create a new system error
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::SystemError {
            message: message.into(),
        }
    }

    /// Check if this error concerns a single source image, so that a batch
    /// running with a skip policy may continue past it
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ImageError(_)
            | Self::UnsupportedFormat { .. }
            | Self::ValidationError { .. }
            | Self::FileTooLarge { .. }
            | Self::ImageTooLarge { .. } => true,

            // Destination side failures stop the batch
            Self::IoError(_)
            | Self::WriteError { .. }
            | Self::ReplaceError { .. }
            | Self::SystemError { .. } => false,

            Self::ConfigError { .. }
            | Self::InvalidParameters { .. }
            | Self::SerdeError(_) => false,
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::UnsupportedFormat { file, .. }
            | Self::ImageTooLarge { file, .. }
            | Self::ValidationError { file, .. } => file.as_ref(),

            Self::FileTooLarge { file, .. } => Some(file),
            Self::WriteError { path, .. } | Self::ReplaceError { path, .. } => Some(path),

            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("File system error: {}", e),
            Self::ImageError(e) => format!("Image processing failed: {}", e),
            Self::UnsupportedFormat { format, .. } => {
                format!("Unsupported image format: {}. Only JPEG files can be resized", format)
            }
            Self::ImageTooLarge { width, height, limit, .. } => {
                format!(
                    "Image is too large ({}x{} = {} pixels). Maximum supported: {} pixels",
                    width,
                    height,
                    u64::from(*width) * u64::from(*height),
                    limit
                )
            }
            Self::FileTooLarge { size, limit, .. } => {
                format!(
                    "File is too large ({:.2} MB). Maximum supported: {:.2} MB",
                    *size as f64 / 1024.0 / 1024.0,
                    *limit as f64 / 1024.0 / 1024.0
                )
            }
            Self::WriteError { path, source } => {
                format!("Could not write {}: {}", path.display(), source)
            }
            Self::ReplaceError { path, source } => {
                format!(
                    "Could not replace {} (the original was left untouched): {}",
                    path.display(),
                    source
                )
            }
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for ResizeError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for ResizeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}

/// Error context extension for adding file path information
pub trait ErrorContext<T> {
    /// Add file context to an error
    fn with_file_context(self, file: PathBuf) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ResizeError>,
{
    fn with_file_context(self, file: PathBuf) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();

            match &mut error {
                ResizeError::UnsupportedFormat { file: f, .. }
                | ResizeError::ImageTooLarge { file: f, .. }
                | ResizeError::ValidationError { file: f, .. } => {
                    if f.is_none() {
                        *f = Some(file);
                    }
                }
                // A bare decode failure means the source itself is unreadable
                ResizeError::ImageError(inner) => {
                    error = ResizeError::validation(
                        format!("Failed to decode image: {}", inner),
                        Some(file),
                    );
                }
                _ => {}
            }

            error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = ResizeError::config("test message");
        assert!(matches!(err, ResizeError::ConfigError { .. }));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(ResizeError::validation("test", None).is_recoverable());
        assert!(ResizeError::unsupported_format("png", None).is_recoverable());
        assert!(!ResizeError::write(
            "out.jpg",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
        )
        .is_recoverable());
        assert!(!ResizeError::config("bad").is_recoverable());
    }

    #[test]
    fn test_user_messages() {
        let err = ResizeError::unsupported_format("png", None);
        let msg = err.user_message();
        assert!(msg.contains("Unsupported image format"));
        assert!(msg.contains("JPEG"));

        let err = ResizeError::replace(
            "/photos/a.jpg",
            std::io::Error::new(std::io::ErrorKind::Other, "locked"),
        );
        assert!(err.user_message().contains("left untouched"));
    }

    #[test]
    fn test_file_context() {
        let result: Result<()> = Err(ResizeError::validation("empty", None));
        let err = result
            .with_file_context(Path::new("test.jpg").to_path_buf())
            .unwrap_err();
        assert_eq!(err.file_path(), Some(&PathBuf::from("test.jpg")));
    }

    #[test]
    fn test_file_context_keeps_existing_path() {
        let result: Result<()> = Err(ResizeError::validation("empty", Some("a.jpg".into())));
        let err = result.with_file_context(PathBuf::from("b.jpg")).unwrap_err();
        assert_eq!(err.file_path(), Some(&PathBuf::from("a.jpg")));
    }
}
