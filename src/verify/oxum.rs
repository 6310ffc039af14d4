/*!
 * Payload-Oxum: `<total payload bytes>.<payload file count>`
 */

use crate::creator::visitor::{walk_file_tree, PayloadFileCollector};
use crate::error::{BagitError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadOxum {
    pub byte_count: u64,
    pub file_count: u64,
}

impl PayloadOxum {
    pub fn new(byte_count: u64, file_count: u64) -> Self {
        Self {
            byte_count,
            file_count,
        }
    }

    /// Measure the payload under `payload_dir` using the payload hidden-file rules
    pub fn compute(payload_dir: &Path, include_hidden: bool) -> Result<Self> {
        let mut collector = PayloadFileCollector::new(include_hidden);
        walk_file_tree(payload_dir, &mut collector)?;

        let files = collector.into_files();
        Ok(Self {
            byte_count: files.iter().map(|(_, size)| size).sum(),
            file_count: files.len() as u64,
        })
    }
}

impl fmt::Display for PayloadOxum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.byte_count, self.file_count)
    }
}

impl FromStr for PayloadOxum {
    type Err = BagitError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BagitError::InvalidPayloadOxum(s.to_string());
        let (bytes, count) = s.trim().split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            byte_count: bytes.parse().map_err(|_| invalid())?,
            file_count: count.parse().map_err(|_| invalid())?,
        })
    }
}
