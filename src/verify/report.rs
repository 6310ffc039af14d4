/*!
 * Verification results
 */

use super::oxum::PayloadOxum;
use crate::error::Result;
use crate::hash::SupportedAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A declared checksum that does not match the file on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumMismatch {
    pub path: PathBuf,
    pub algorithm: SupportedAlgorithm,
    pub expected: String,
    pub actual: String,
}

/// A listed file that could not be hashed
///
/// Covers payload files that exist but fail to read, and tag manifest entries
/// whose file is gone, since tag files skip the existence phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadableFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OxumMismatch {
    pub expected: PayloadOxum,
    pub actual: PayloadOxum,
}

/// A payload file absent from one payload manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlistedFile {
    pub path: PathBuf,
    pub algorithm: SupportedAlgorithm,
}

/// Every problem found while verifying a bag
///
/// Each list is sorted by path so reports are stable across runs regardless
/// of task scheduling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub missing_files: Vec<PathBuf>,
    pub checksum_mismatches: Vec<ChecksumMismatch>,
    pub unreadable_files: Vec<UnreadableFile>,
    pub oxum_mismatch: Option<OxumMismatch>,
    pub unlisted_files: Vec<UnlistedFile>,
}

impl VerifyReport {
    pub fn is_valid(&self) -> bool {
        self.problem_count() == 0
    }

    pub fn problem_count(&self) -> usize {
        self.missing_files.len()
            + self.checksum_mismatches.len()
            + self.unreadable_files.len()
            + usize::from(self.oxum_mismatch.is_some())
            + self.unlisted_files.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub(crate) fn sort(&mut self) {
        self.missing_files.sort();
        self.checksum_mismatches
            .sort_by(|a, b| (&a.path, a.algorithm).cmp(&(&b.path, b.algorithm)));
        self.unreadable_files.sort_by(|a, b| a.path.cmp(&b.path));
        self.unlisted_files
            .sort_by(|a, b| (&a.path, a.algorithm).cmp(&(&b.path, b.algorithm)));
    }
}
