/*!
 * bagit - BagIt packaging: create, read and verify bags
 *
 * A bag is a payload directory tree together with checksum manifests and
 * descriptive tag files. This library provides:
 * - One-pass multi-algorithm hashing (MD5, SHA-1, SHA-2 family)
 * - In-place bag creation, in the `data/` and `.bagit/` layouts
 * - Reading of bagit.txt, manifests, bag-info.txt and fetch.txt with path
 *   containment checks against malicious entries
 * - Parallel verification tolerant of Unicode normalization differences
 */

pub mod concurrency;
pub mod config;
pub mod creator;
pub mod domain;
pub mod error;
pub mod hash;
pub mod logging;
pub mod reader;
pub mod verify;
pub mod writer;

// Re-export commonly used types
pub use config::{BagitConfig, LogLevel};
pub use creator::BagCreator;
pub use domain::{Bag, FetchItem, Manifest, Metadata, TagFileEncoding, Version};
pub use error::{BagitError, ErrorCategory, Result};
pub use hash::{AlgorithmNameMapping, StandardAlgorithmNameMapping, SupportedAlgorithm};
pub use reader::BagReader;
pub use verify::{BagVerifier, PayloadOxum, VerifyReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
