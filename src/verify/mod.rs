/*!
 * Bag integrity verification
 *
 * [`BagVerifier::verify`] runs, in order:
 * 1. an existence check of every payload manifest entry (parallel),
 * 2. a checksum check of every payload and tag manifest entry (parallel),
 * 3. the Payload-Oxum comparison when bag-info declares one,
 * 4. a completeness check for payload files no manifest lists.
 *
 * Per-file problems are collected into a [`VerifyReport`]; only problems with
 * the bag as a whole (a malformed Payload-Oxum, an unreadable payload tree)
 * are returned as errors.
 */

pub mod checksum;
pub mod existence;
pub mod oxum;
pub mod report;

pub use existence::{file_exists, find_normalized};
pub use oxum::PayloadOxum;
pub use report::{ChecksumMismatch, OxumMismatch, UnlistedFile, UnreadableFile, VerifyReport};

use crate::concurrency::build_pool;
use crate::config::BagitConfig;
use crate::creator::visitor::{walk_file_tree, PayloadFileCollector};
use crate::domain::Bag;
use crate::error::{BagitError, Result};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

/// Verifies bags on a bounded worker pool
pub struct BagVerifier {
    pool: rayon::ThreadPool,
    include_hidden: bool,
}

impl BagVerifier {
    pub fn new(config: &BagitConfig) -> Result<Self> {
        Ok(Self {
            pool: build_pool(config.threads)?,
            include_hidden: config.include_hidden,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Full verification; see the module documentation for the phases
    pub fn verify(&self, bag: &Bag) -> Result<VerifyReport> {
        info!(root = %bag.root_dir().display(), threads = self.threads(), "Verifying bag");
        let mut report = VerifyReport::default();

        let payload_paths: BTreeSet<PathBuf> = bag
            .payload_manifests()
            .flat_map(|m| m.iter().map(|(path, _)| path.clone()))
            .collect();
        report.missing_files = existence::find_missing(payload_paths.into_iter().collect(), &self.pool);

        let skip: HashSet<PathBuf> = report.missing_files.iter().cloned().collect();
        let (mismatches, unreadable) = checksum::check_manifests(
            bag.payload_manifests().chain(bag.tag_manifests()),
            &skip,
            &self.pool,
        );
        report.checksum_mismatches = mismatches;
        report.unreadable_files = unreadable;

        report.oxum_mismatch = self.check_oxum(bag)?;
        report.unlisted_files = self.unlisted_files(bag)?;
        report.sort();

        if report.is_valid() {
            info!(root = %bag.root_dir().display(), "Bag is valid");
        } else {
            warn!(
                root = %bag.root_dir().display(),
                missing = report.missing_files.len(),
                mismatched = report.checksum_mismatches.len(),
                unreadable = report.unreadable_files.len(),
                oxum_mismatch = report.oxum_mismatch.is_some(),
                unlisted = report.unlisted_files.len(),
                "Bag is not valid"
            );
        }
        Ok(report)
    }

    /// A quick verify needs a Payload-Oxum and nothing left to fetch
    pub fn can_quick_verify(bag: &Bag) -> bool {
        bag.metadata.payload_oxum().is_some() && bag.items_to_fetch.is_empty()
    }

    /// Compare only the Payload-Oxum against the payload on disk
    pub fn quick_verify(&self, bag: &Bag) -> Result<VerifyReport> {
        if bag.metadata.payload_oxum().is_none() {
            return Err(BagitError::InvalidPayloadOxum(format!(
                "Payload-Oxum does not exist in the metadata of bag [{}]",
                bag.root_dir().display()
            )));
        }

        Ok(VerifyReport {
            oxum_mismatch: self.check_oxum(bag)?,
            ..VerifyReport::default()
        })
    }

    fn check_oxum(&self, bag: &Bag) -> Result<Option<OxumMismatch>> {
        let Some(raw) = bag.metadata.payload_oxum() else {
            return Ok(None);
        };
        let expected: PayloadOxum = raw.parse()?;
        let actual = PayloadOxum::compute(&bag.payload_dir(), self.include_hidden)?;

        if expected == actual {
            Ok(None)
        } else {
            warn!(%expected, %actual, "Payload-Oxum does not match the payload on disk");
            Ok(Some(OxumMismatch { expected, actual }))
        }
    }

    /// Payload files on disk that a payload manifest does not list
    fn unlisted_files(&self, bag: &Bag) -> Result<Vec<UnlistedFile>> {
        let payload_dir = bag.payload_dir();
        if !payload_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut collector = PayloadFileCollector::new(self.include_hidden);
        walk_file_tree(&payload_dir, &mut collector)?;
        let on_disk = collector.into_files();

        let mut unlisted = Vec::new();
        for manifest in bag.payload_manifests() {
            let listed: HashSet<String> = manifest.iter().map(|(path, _)| nfd_key(path)).collect();
            for (path, _) in &on_disk {
                if !manifest.contains(path) && !listed.contains(&nfd_key(path)) {
                    warn!(path = %path.display(), algorithm = %manifest.algorithm(), "Payload file is not listed in manifest");
                    unlisted.push(UnlistedFile {
                        path: path.clone(),
                        algorithm: manifest.algorithm(),
                    });
                }
            }
        }
        Ok(unlisted)
    }
}

fn nfd_key(path: &Path) -> String {
    path.to_string_lossy().nfd().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::BagCreator;
    use crate::domain::PAYLOAD_OXUM;
    use crate::hash::SupportedAlgorithm;
    use std::fs;
    use tempfile::TempDir;

    fn created_bag() -> (TempDir, Bag) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("dir")).unwrap();
        fs::write(temp.path().join("one.txt"), "one").unwrap();
        fs::write(temp.path().join("dir").join("two.txt"), "two").unwrap();
        let bag = BagCreator::bag_in_place(temp.path(), &[SupportedAlgorithm::Md5], false).unwrap();
        (temp, bag)
    }

    fn verifier() -> BagVerifier {
        BagVerifier::new(&BagitConfig::default().with_threads(2)).unwrap()
    }

    #[test]
    fn test_fresh_bag_is_valid() {
        let (_temp, bag) = created_bag();
        let report = verifier().verify(&bag).unwrap();
        assert!(report.is_valid(), "{:?}", report);
    }

    #[test]
    fn test_missing_file_not_double_reported() {
        let (temp, bag) = created_bag();
        let gone = temp.path().join("data").join("one.txt");
        fs::remove_file(&gone).unwrap();

        let report = verifier().verify(&bag).unwrap();
        assert_eq!(report.missing_files, vec![gone]);
        assert!(report.unreadable_files.is_empty());
        assert!(report.checksum_mismatches.is_empty());
        assert!(report.oxum_mismatch.is_some());
    }

    #[test]
    fn test_unlisted_file() {
        let (temp, bag) = created_bag();
        let extra = temp.path().join("data").join("extra.txt");
        fs::write(&extra, "extra").unwrap();

        let report = verifier().verify(&bag).unwrap();
        assert_eq!(
            report.unlisted_files,
            vec![UnlistedFile {
                path: extra,
                algorithm: SupportedAlgorithm::Md5
            }]
        );
    }

    #[test]
    fn test_quick_verify() {
        let (temp, bag) = created_bag();
        assert!(BagVerifier::can_quick_verify(&bag));
        assert!(verifier().quick_verify(&bag).unwrap().is_valid());

        fs::write(temp.path().join("data").join("one.txt"), "one more").unwrap();
        let report = verifier().quick_verify(&bag).unwrap();
        assert_eq!(
            report.oxum_mismatch,
            Some(OxumMismatch {
                expected: PayloadOxum::new(6, 2),
                actual: PayloadOxum::new(11, 2),
            })
        );
    }

    #[test]
    fn test_quick_verify_without_oxum() {
        let (_temp, mut bag) = created_bag();
        bag.metadata = crate::domain::Metadata::new();
        assert!(!BagVerifier::can_quick_verify(&bag));
        assert!(matches!(
            verifier().quick_verify(&bag),
            Err(BagitError::InvalidPayloadOxum(_))
        ));
    }

    #[test]
    fn test_malformed_oxum_is_error() {
        let (_temp, mut bag) = created_bag();
        bag.metadata.upsert(PAYLOAD_OXUM, "lots.of.bytes");
        assert!(matches!(
            verifier().verify(&bag),
            Err(BagitError::InvalidPayloadOxum(_))
        ));
    }
}
