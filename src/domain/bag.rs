/*!
 * In-memory representation of a bag on disk
 */

use super::encoding::TagFileEncoding;
use super::fetch::FetchItem;
use super::manifest::Manifest;
use super::metadata::Metadata;
use super::version::Version;
use crate::hash::SupportedAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DOT_BAGIT_DIR: &str = ".bagit";
pub const PAYLOAD_DIR: &str = "data";
pub const BAGIT_FILE: &str = "bagit.txt";
pub const BAG_INFO_FILE: &str = "bag-info.txt";
pub const PACKAGE_INFO_FILE: &str = "package-info.txt";
pub const FETCH_FILE: &str = "fetch.txt";

/// A bag: payload manifests, tag manifests, metadata and fetch list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    root_dir: PathBuf,
    tag_dir: PathBuf,
    pub version: Version,
    pub encoding: TagFileEncoding,
    payload_manifests: BTreeMap<SupportedAlgorithm, Manifest>,
    tag_manifests: BTreeMap<SupportedAlgorithm, Manifest>,
    pub metadata: Metadata,
    pub items_to_fetch: Vec<FetchItem>,
}

impl Bag {
    /// Bag with tag files directly under the root
    pub fn new<P: Into<PathBuf>>(root_dir: P, version: Version) -> Self {
        let root_dir = root_dir.into();
        Self {
            tag_dir: root_dir.clone(),
            root_dir,
            version,
            encoding: TagFileEncoding::default(),
            payload_manifests: BTreeMap::new(),
            tag_manifests: BTreeMap::new(),
            metadata: Metadata::new(),
            items_to_fetch: Vec::new(),
        }
    }

    /// Bag whose tag files live in `root/.bagit`
    pub fn with_dot_bagit<P: Into<PathBuf>>(root_dir: P, version: Version) -> Self {
        let mut bag = Self::new(root_dir, version);
        bag.tag_dir = bag.root_dir.join(DOT_BAGIT_DIR);
        bag
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Directory holding bagit.txt, manifests and other tag files
    pub fn tag_dir(&self) -> &Path {
        &self.tag_dir
    }

    pub(crate) fn set_tag_dir<P: Into<PathBuf>>(&mut self, tag_dir: P) {
        self.tag_dir = tag_dir.into();
    }

    pub fn is_dot_bagit(&self) -> bool {
        self.tag_dir != self.root_dir
    }

    /// Where payload files live: `data/`, or the root itself for `.bagit` bags
    pub fn payload_dir(&self) -> PathBuf {
        if self.is_dot_bagit() {
            self.root_dir.clone()
        } else {
            self.root_dir.join(PAYLOAD_DIR)
        }
    }

    /// Add a payload manifest, replacing any manifest of the same algorithm
    pub fn add_payload_manifest(&mut self, manifest: Manifest) -> Option<Manifest> {
        self.payload_manifests.insert(manifest.algorithm(), manifest)
    }

    /// Add a tag manifest, replacing any manifest of the same algorithm
    pub fn add_tag_manifest(&mut self, manifest: Manifest) -> Option<Manifest> {
        self.tag_manifests.insert(manifest.algorithm(), manifest)
    }

    pub fn payload_manifests(&self) -> impl Iterator<Item = &Manifest> {
        self.payload_manifests.values()
    }

    pub fn tag_manifests(&self) -> impl Iterator<Item = &Manifest> {
        self.tag_manifests.values()
    }

    pub fn payload_manifest(&self, algorithm: SupportedAlgorithm) -> Option<&Manifest> {
        self.payload_manifests.get(&algorithm)
    }

    pub fn tag_manifest(&self, algorithm: SupportedAlgorithm) -> Option<&Manifest> {
        self.tag_manifests.get(&algorithm)
    }

    pub fn payload_algorithms(&self) -> Vec<SupportedAlgorithm> {
        self.payload_manifests.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout() {
        let bag = Bag::new("/bags/one", Version::STANDARD);
        assert_eq!(bag.tag_dir(), Path::new("/bags/one"));
        assert_eq!(bag.payload_dir(), PathBuf::from("/bags/one/data"));
        assert!(!bag.is_dot_bagit());
        assert_eq!(bag.encoding, TagFileEncoding::Utf8);
    }

    #[test]
    fn test_dot_bagit_layout() {
        let bag = Bag::with_dot_bagit("/bags/two", Version::DOT_BAGIT);
        assert_eq!(bag.tag_dir(), Path::new("/bags/two/.bagit"));
        assert_eq!(bag.payload_dir(), PathBuf::from("/bags/two"));
        assert!(bag.is_dot_bagit());
    }

    #[test]
    fn test_one_manifest_per_algorithm() {
        let mut bag = Bag::new("/bags/one", Version::STANDARD);
        let mut first = Manifest::new(SupportedAlgorithm::Md5);
        first.insert("/bags/one/data/a", "1");
        assert!(bag.add_payload_manifest(first).is_none());

        let replaced = bag.add_payload_manifest(Manifest::new(SupportedAlgorithm::Md5));
        assert_eq!(replaced.map(|m| m.len()), Some(1));
        assert_eq!(bag.payload_manifests().count(), 1);

        bag.add_payload_manifest(Manifest::new(SupportedAlgorithm::Sha256));
        assert_eq!(
            bag.payload_algorithms(),
            vec![SupportedAlgorithm::Md5, SupportedAlgorithm::Sha256]
        );
        assert!(bag.tag_manifest(SupportedAlgorithm::Md5).is_none());
    }
}
