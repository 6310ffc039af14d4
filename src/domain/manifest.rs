/*!
 * Checksum manifest: one algorithm, many files
 */

use crate::hash::SupportedAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Mapping from absolute file path to its checksum under one algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    algorithm: SupportedAlgorithm,
    file_to_checksum: BTreeMap<PathBuf, String>,
}

impl Manifest {
    pub fn new(algorithm: SupportedAlgorithm) -> Self {
        Self {
            algorithm,
            file_to_checksum: BTreeMap::new(),
        }
    }

    pub fn with_entries(algorithm: SupportedAlgorithm, entries: BTreeMap<PathBuf, String>) -> Self {
        Self {
            algorithm,
            file_to_checksum: entries,
        }
    }

    pub fn algorithm(&self) -> SupportedAlgorithm {
        self.algorithm
    }

    pub fn file_to_checksum_map(&self) -> &BTreeMap<PathBuf, String> {
        &self.file_to_checksum
    }

    /// Record a checksum, replacing any previous value for the path
    pub fn insert<P: Into<PathBuf>, S: Into<String>>(&mut self, path: P, checksum: S) -> Option<String> {
        self.file_to_checksum.insert(path.into(), checksum.into())
    }

    pub fn checksum(&self, path: &Path) -> Option<&str> {
        self.file_to_checksum.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.file_to_checksum.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &String)> {
        self.file_to_checksum.iter()
    }

    pub fn len(&self) -> usize {
        self.file_to_checksum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_to_checksum.is_empty()
    }
}

/// Compare two hex checksums ignoring ASCII case
pub fn checksums_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}
