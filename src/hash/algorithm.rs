/*!
 * Digest algorithms known to the bag reader and creator
 */

use crate::error::{BagitError, Result};
use serde::{Deserialize, Serialize};
use sha2::digest::DynDigest;
use std::fmt;
use std::str::FromStr;

/// A digest function together with its manifest filename token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedAlgorithm {
    /// MD5 (legacy compatibility)
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl SupportedAlgorithm {
    pub const ALL: [SupportedAlgorithm; 6] = [
        SupportedAlgorithm::Md5,
        SupportedAlgorithm::Sha1,
        SupportedAlgorithm::Sha224,
        SupportedAlgorithm::Sha256,
        SupportedAlgorithm::Sha384,
        SupportedAlgorithm::Sha512,
    ];

    /// Token used in `manifest-<token>.txt` and `tagmanifest-<token>.txt`
    pub fn bagit_name(&self) -> &'static str {
        match self {
            SupportedAlgorithm::Md5 => "md5",
            SupportedAlgorithm::Sha1 => "sha1",
            SupportedAlgorithm::Sha224 => "sha224",
            SupportedAlgorithm::Sha256 => "sha256",
            SupportedAlgorithm::Sha384 => "sha384",
            SupportedAlgorithm::Sha512 => "sha512",
        }
    }

    /// Length of the hex encoded digest
    pub fn hex_len(&self) -> usize {
        match self {
            SupportedAlgorithm::Md5 => 32,
            SupportedAlgorithm::Sha1 => 40,
            SupportedAlgorithm::Sha224 => 56,
            SupportedAlgorithm::Sha256 => 64,
            SupportedAlgorithm::Sha384 => 96,
            SupportedAlgorithm::Sha512 => 128,
        }
    }

    pub fn payload_manifest_name(&self) -> String {
        format!("manifest-{}.txt", self.bagit_name())
    }

    pub fn tag_manifest_name(&self) -> String {
        format!("tagmanifest-{}.txt", self.bagit_name())
    }

    /// Fresh digest accumulator for this algorithm
    pub(crate) fn new_digest(&self) -> Box<dyn DynDigest + Send> {
        match self {
            SupportedAlgorithm::Md5 => Box::new(md5::Md5::default()),
            SupportedAlgorithm::Sha1 => Box::new(sha1::Sha1::default()),
            SupportedAlgorithm::Sha224 => Box::new(sha2::Sha224::default()),
            SupportedAlgorithm::Sha256 => Box::new(sha2::Sha256::default()),
            SupportedAlgorithm::Sha384 => Box::new(sha2::Sha384::default()),
            SupportedAlgorithm::Sha512 => Box::new(sha2::Sha512::default()),
        }
    }
}

impl fmt::Display for SupportedAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bagit_name())
    }
}

impl FromStr for SupportedAlgorithm {
    type Err = BagitError;

    fn from_str(s: &str) -> Result<Self> {
        StandardAlgorithmNameMapping.supported_algorithm(s)
    }
}

/// Maps the algorithm token of a manifest filename to an implementation
pub trait AlgorithmNameMapping: Send + Sync {
    fn supported_algorithm(&self, bagit_name: &str) -> Result<SupportedAlgorithm>;
}

/// Default mapping: case-insensitive, tolerant of `sha-256` style tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAlgorithmNameMapping;

impl AlgorithmNameMapping for StandardAlgorithmNameMapping {
    fn supported_algorithm(&self, bagit_name: &str) -> Result<SupportedAlgorithm> {
        let wanted: String = bagit_name
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        SupportedAlgorithm::ALL
            .iter()
            .copied()
            .find(|alg| alg.bagit_name() == wanted)
            .ok_or_else(|| BagitError::UnsupportedAlgorithm(bagit_name.to_string()))
    }
}
