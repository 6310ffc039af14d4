/*!
 * Error types for bag reading, creation and verification
 */

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BagitError>;

/// Errors raised while reading, creating or verifying a bag
///
/// Every variant is fail-fast at this layer. Per-file verification problems are
/// not errors; they are collected into a [`crate::verify::VerifyReport`].
#[derive(Error, Debug)]
pub enum BagitError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// `BagIt-Version` is not of the form MAJOR.MINOR
    #[error("Unparsable version: {0}")]
    UnparsableVersion(String),

    /// Manifest filename names a digest algorithm with no implementation
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// `Tag-File-Character-Encoding` names an encoding we cannot decode
    #[error("Unsupported tag file encoding: {0}")]
    UnsupportedEncoding(String),

    /// Manifest or fetch line is malformed
    #[error("Invalid bagit file format: {0}")]
    InvalidBagitFileFormat(String),

    /// A path escapes the bag root
    #[error("Malicious path: {0}")]
    MaliciousPath(String),

    /// Tag file key/value line does not split on its separator
    #[error("Invalid bag metadata: {0}")]
    InvalidMetadata(String),

    /// `Payload-Oxum` is not of the form BYTES.COUNT
    #[error("Invalid Payload-Oxum: {0}")]
    InvalidPayloadOxum(String),

    /// Bag root does not exist or is not a directory
    #[error("Bag root not found: {}", .0.display())]
    BagNotFound(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker pool could not be built
    #[error("Parallel processing error: {0}")]
    Parallel(String),

    /// Report could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BagitError {
    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        BagitError::InvalidBagitFileFormat(message.into())
    }

    pub fn malicious_path<S: Into<String>>(message: S) -> Self {
        BagitError::MaliciousPath(message.into())
    }

    pub fn invalid_metadata<S: Into<String>>(message: S) -> Self {
        BagitError::InvalidMetadata(message.into())
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            BagitError::Io(_) | BagitError::BagNotFound(_) => ErrorCategory::IoError,
            BagitError::UnparsableVersion(_)
            | BagitError::InvalidBagitFileFormat(_)
            | BagitError::InvalidMetadata(_)
            | BagitError::InvalidPayloadOxum(_)
            | BagitError::Serialization(_) => ErrorCategory::Format,
            BagitError::UnsupportedAlgorithm(_) | BagitError::UnsupportedEncoding(_) => {
                ErrorCategory::Unsupported
            }
            BagitError::MaliciousPath(_) => ErrorCategory::Security,
            BagitError::Config(_) => ErrorCategory::Configuration,
            BagitError::Parallel(_) => ErrorCategory::Concurrency,
        }
    }

    /// Security violations must never be downgraded to warnings
    pub fn is_security_violation(&self) -> bool {
        matches!(self, BagitError::MaliciousPath(_))
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Filesystem access errors
    IoError,
    /// Tag file or manifest content does not follow the format
    Format,
    /// Algorithm or encoding without an implementation
    Unsupported,
    /// Path containment violations
    Security,
    /// Configuration errors
    Configuration,
    /// Worker pool errors
    Concurrency,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Format => write!(f, "format"),
            ErrorCategory::Unsupported => write!(f, "unsupported"),
            ErrorCategory::Security => write!(f, "security"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Concurrency => write!(f, "concurrency"),
        }
    }
}

impl From<toml::de::Error> for BagitError {
    fn from(err: toml::de::Error) -> Self {
        BagitError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for BagitError {
    fn from(err: toml::ser::Error) -> Self {
        BagitError::Config(format!("TOML serialize error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BagitError::UnparsableVersion("1".to_string());
        assert_eq!(err.to_string(), "Unparsable version: 1");

        let err = BagitError::malicious_path("../etc/passwd");
        assert_eq!(err.to_string(), "Malicious path: ../etc/passwd");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            BagitError::malicious_path("x").category(),
            ErrorCategory::Security
        );
        assert_eq!(
            BagitError::invalid_metadata("x").category(),
            ErrorCategory::Format
        );
        assert_eq!(
            BagitError::UnsupportedAlgorithm("crc32".into()).category(),
            ErrorCategory::Unsupported
        );
        assert_eq!(
            BagitError::Io(io::Error::other("boom")).category(),
            ErrorCategory::IoError
        );
        assert_eq!(ErrorCategory::Security.to_string(), "security");
    }

    #[test]
    fn test_security_violation() {
        assert!(BagitError::malicious_path("x").is_security_violation());
        assert!(!BagitError::invalid_format("x").is_security_violation());
    }

    #[test]
    fn test_io_conversion() {
        let err: BagitError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, BagitError::Io(_)));
    }
}
