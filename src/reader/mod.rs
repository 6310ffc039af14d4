/*!
 * Reading a bag from the filesystem
 *
 * [`BagReader::read`] reconstructs a [`Bag`] from `bagit.txt`, every
 * payload and tag manifest, the bag metadata and `fetch.txt`. Any error
 * aborts the whole read; a partially populated bag is never returned.
 */

pub mod path;
pub mod tag_file;

use crate::domain::bag::{
    BAGIT_FILE, BAG_INFO_FILE, DOT_BAGIT_DIR, FETCH_FILE, PACKAGE_INFO_FILE,
};
use crate::domain::{Bag, FetchItem, Manifest, Metadata, TagFileEncoding, Version};
use crate::error::{BagitError, Result};
use crate::hash::{AlgorithmNameMapping, StandardAlgorithmNameMapping};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use crate::domain::parse_version;
pub use path::resolve;
pub use tag_file::{read_key_values, read_manifest_lines, LINE_SEPARATOR};

const TAG_MANIFEST_PREFIX: &str = "tagmanifest-";
const PAYLOAD_MANIFEST_PREFIX: &str = "manifest-";

/// Reads bags from disk
pub struct BagReader {
    name_mapping: Box<dyn AlgorithmNameMapping>,
}

impl Default for BagReader {
    fn default() -> Self {
        Self::new()
    }
}

impl BagReader {
    pub fn new() -> Self {
        Self::with_name_mapping(StandardAlgorithmNameMapping)
    }

    /// Use a custom mapping from manifest filename tokens to algorithms
    pub fn with_name_mapping<M: AlgorithmNameMapping + 'static>(name_mapping: M) -> Self {
        Self {
            name_mapping: Box::new(name_mapping),
        }
    }

    pub fn name_mapping(&self) -> &dyn AlgorithmNameMapping {
        self.name_mapping.as_ref()
    }

    /// Read the bag rooted at `root_dir`
    ///
    /// The returned bag's root, tag directory and manifest keys use the
    /// absolute, normalized spelling of `root_dir` (see [`path::bag_root`]).
    pub fn read(&self, root_dir: &Path) -> Result<Bag> {
        if !root_dir.is_dir() {
            return Err(BagitError::BagNotFound(root_dir.to_path_buf()));
        }
        let root = path::bag_root(root_dir)?;
        let root_dir = root.as_path();

        let dot_bagit = root_dir.join(DOT_BAGIT_DIR);
        let tag_dir = if dot_bagit.exists() {
            dot_bagit
        } else {
            root_dir.to_path_buf()
        };
        info!(root = %root_dir.display(), tag_dir = %tag_dir.display(), "Reading bag");

        let (version, encoding) = self.read_bagit_text_file(&tag_dir.join(BAGIT_FILE))?;
        let mut bag = Bag::new(root_dir, version);
        bag.set_tag_dir(&tag_dir);
        bag.encoding = encoding;

        self.read_all_manifests(&tag_dir, &mut bag)?;
        bag.metadata = self.read_bag_metadata(&tag_dir, encoding)?;

        let fetch_file = tag_dir.join(FETCH_FILE);
        if fetch_file.exists() {
            bag.items_to_fetch = self.read_fetch(&fetch_file, encoding, root_dir)?;
        }

        Ok(bag)
    }

    /// Read `bagit.txt`, returning the declared version and tag file encoding
    pub fn read_bagit_text_file(&self, bagit_file: &Path) -> Result<(Version, TagFileEncoding)> {
        debug!(file = %bagit_file.display(), "Reading bagit.txt file");
        let pairs = read_key_values(bagit_file, ":", TagFileEncoding::Utf8)?;

        let mut version = String::new();
        let mut encoding = TagFileEncoding::Utf8;
        for (key, value) in pairs {
            match key.as_str() {
                "BagIt-Version" => {
                    debug!(version = %value, "BagIt-Version");
                    version = value;
                }
                "Tag-File-Character-Encoding" => {
                    encoding = value.parse()?;
                    debug!(%encoding, "Tag-File-Character-Encoding");
                }
                _ => {}
            }
        }

        Ok((parse_version(&version)?, encoding))
    }

    /// Find every manifest in `tag_dir` and add it to the bag
    pub fn read_all_manifests(&self, tag_dir: &Path, bag: &mut Bag) -> Result<()> {
        info!("Attempting to find and read manifests");
        let root_dir = bag.root_dir().to_path_buf();

        for path in manifest_files(tag_dir)? {
            let filename = file_name(&path);
            if filename.starts_with(TAG_MANIFEST_PREFIX) {
                debug!(path = %path.display(), "Found tag manifest");
                bag.add_tag_manifest(self.read_manifest(&path, &root_dir, bag.encoding)?);
            } else if filename.starts_with(PAYLOAD_MANIFEST_PREFIX) {
                debug!(path = %path.display(), "Found payload manifest");
                bag.add_payload_manifest(self.read_manifest(&path, &root_dir, bag.encoding)?);
            }
        }

        Ok(())
    }

    /// Read one manifest file; the algorithm comes from its filename
    pub fn read_manifest(
        &self,
        manifest_file: &Path,
        bag_root: &Path,
        encoding: TagFileEncoding,
    ) -> Result<Manifest> {
        debug!(manifest = %manifest_file.display(), "Reading manifest");
        let filename = file_name(manifest_file);
        let token = algorithm_token(&filename);
        let algorithm = self.name_mapping.supported_algorithm(token)?;

        let entries = read_manifest_lines(manifest_file, bag_root, encoding)?;
        Ok(Manifest::with_entries(algorithm, entries))
    }

    /// Read `bag-info.txt`, or legacy `package-info.txt` when it is absent
    ///
    /// The two are never merged: when both files exist, `bag-info.txt` wins
    /// and `package-info.txt` is ignored.
    pub fn read_bag_metadata(&self, tag_dir: &Path, encoding: TagFileEncoding) -> Result<Metadata> {
        info!("Attempting to read bag metadata file");

        for name in [BAG_INFO_FILE, PACKAGE_INFO_FILE] {
            let file = tag_dir.join(name);
            if file.exists() {
                debug!(file = %file.display(), "Found metadata file");
                return Ok(Metadata::from_pairs(read_key_values(&file, ":", encoding)?));
            }
        }

        Ok(Metadata::new())
    }

    /// Read `fetch.txt`
    pub fn read_fetch(
        &self,
        fetch_file: &Path,
        encoding: TagFileEncoding,
        bag_root: &Path,
    ) -> Result<Vec<FetchItem>> {
        info!(file = %fetch_file.display(), "Attempting to read fetch file");
        tag_file::read_fetch_lines(fetch_file, bag_root, encoding)
    }
}

/// Manifest and tag manifest files in `dir`, sorted by name
fn manifest_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if (name.starts_with(TAG_MANIFEST_PREFIX) || name.starts_with(PAYLOAD_MANIFEST_PREFIX))
            && entry.file_type()?.is_file()
        {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Text between the first `-` and the following `.`
fn algorithm_token(filename: &str) -> &str {
    let after_dash = filename.split_once('-').map(|(_, rest)| rest).unwrap_or("");
    after_dash.split('.').next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::SupportedAlgorithm;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn minimal_bag(dir: &Path) {
        write(dir, "bagit.txt", "BagIt-Version: 0.97\nTag-File-Character-Encoding: UTF-8\n");
        std::fs::create_dir_all(dir.join("data")).unwrap();
        write(&dir.join("data"), "hello.txt", "hello");
        write(
            dir,
            "manifest-md5.txt",
            "5d41402abc4b2a76b9719d911017c592  data/hello.txt\n",
        );
    }

    #[test]
    fn test_algorithm_token() {
        assert_eq!(algorithm_token("manifest-sha256.txt"), "sha256");
        assert_eq!(algorithm_token("tagmanifest-md5.txt"), "md5");
        assert_eq!(algorithm_token("manifest-"), "");
    }

    #[test]
    fn test_read_minimal_bag() {
        let temp = TempDir::new().unwrap();
        minimal_bag(temp.path());

        let bag = BagReader::new().read(temp.path()).unwrap();
        assert_eq!(bag.version, Version::new(0, 97));
        assert_eq!(bag.encoding, TagFileEncoding::Utf8);
        assert!(!bag.is_dot_bagit());

        let manifest = bag.payload_manifest(SupportedAlgorithm::Md5).unwrap();
        assert_eq!(
            manifest.checksum(&temp.path().join("data").join("hello.txt")),
            Some("5d41402abc4b2a76b9719d911017c592")
        );
        assert!(bag.metadata.is_empty());
        assert!(bag.items_to_fetch.is_empty());
    }

    #[test]
    fn test_read_tag_manifest_and_metadata() {
        let temp = TempDir::new().unwrap();
        minimal_bag(temp.path());
        write(temp.path(), "bag-info.txt", "Payload-Oxum: 5.1\nContact-Name: Someone\n");
        write(temp.path(), "tagmanifest-sha1.txt", "abc  bagit.txt\n");

        let bag = BagReader::new().read(temp.path()).unwrap();
        assert_eq!(bag.tag_manifests().count(), 1);
        assert_eq!(bag.metadata.payload_oxum(), Some("5.1"));
        assert_eq!(bag.metadata.get("contact-name"), Some("Someone"));
    }

    #[test]
    fn test_read_legacy_package_info() {
        let temp = TempDir::new().unwrap();
        minimal_bag(temp.path());
        write(temp.path(), "package-info.txt", "Packing-Date: 2008-01-15\n");

        let metadata = BagReader::new()
            .read_bag_metadata(temp.path(), TagFileEncoding::Utf8)
            .unwrap();
        assert_eq!(metadata.get("Packing-Date"), Some("2008-01-15"));
    }

    #[test]
    fn test_bag_info_wins_over_package_info() {
        let temp = TempDir::new().unwrap();
        minimal_bag(temp.path());
        write(temp.path(), "bag-info.txt", "Source-Organization: current\n");
        write(temp.path(), "package-info.txt", "Source-Organization: legacy\n");

        let bag = BagReader::new().read(temp.path()).unwrap();
        assert_eq!(bag.metadata.get("Source-Organization"), Some("current"));
    }

    #[test]
    fn test_non_normalized_root_shares_one_spelling() {
        let temp = TempDir::new().unwrap();
        let bag_dir = temp.path().join("bag");
        std::fs::create_dir_all(temp.path().join("other")).unwrap();
        std::fs::create_dir_all(&bag_dir).unwrap();
        minimal_bag(&bag_dir);

        let spelled = temp.path().join(".").join("other").join("..").join("bag");
        let bag = BagReader::new().read(&spelled).unwrap();

        assert_eq!(bag.root_dir(), bag_dir.as_path());
        assert_eq!(bag.tag_dir(), bag_dir.as_path());
        assert_eq!(bag.payload_dir(), bag_dir.join("data"));
        assert!(bag
            .payload_manifest(SupportedAlgorithm::Md5)
            .unwrap()
            .contains(&bag_dir.join("data").join("hello.txt")));
    }

    #[test]
    fn test_read_dot_bagit_layout() {
        let temp = TempDir::new().unwrap();
        let tag_dir = temp.path().join(".bagit");
        std::fs::create_dir_all(&tag_dir).unwrap();
        write(&tag_dir, "bagit.txt", "BagIt-Version: 0.98\nTag-File-Character-Encoding: UTF-8\n");
        write(temp.path(), "file.txt", "hello");
        write(&tag_dir, "manifest-md5.txt", "5d41402abc4b2a76b9719d911017c592  file.txt\n");

        let bag = BagReader::new().read(temp.path()).unwrap();
        assert!(bag.is_dot_bagit());
        assert_eq!(bag.version, Version::DOT_BAGIT);
        let manifest = bag.payload_manifest(SupportedAlgorithm::Md5).unwrap();
        assert!(manifest.contains(&temp.path().join("file.txt")));
    }

    #[test]
    fn test_unsupported_algorithm() {
        let temp = TempDir::new().unwrap();
        minimal_bag(temp.path());
        write(temp.path(), "manifest-crc32.txt", "abc  data/hello.txt\n");

        let err = BagReader::new().read(temp.path()).unwrap_err();
        assert!(matches!(err, BagitError::UnsupportedAlgorithm(name) if name == "crc32"));
    }

    #[test]
    fn test_unparsable_version() {
        let temp = TempDir::new().unwrap();
        minimal_bag(temp.path());
        write(temp.path(), "bagit.txt", "BagIt-Version: 1\n");

        let err = BagReader::new().read(temp.path()).unwrap_err();
        assert!(matches!(err, BagitError::UnparsableVersion(_)));
    }

    #[test]
    fn test_missing_version_is_unparsable() {
        let temp = TempDir::new().unwrap();
        minimal_bag(temp.path());
        write(temp.path(), "bagit.txt", "Tag-File-Character-Encoding: UTF-8\n");

        assert!(matches!(
            BagReader::new().read(temp.path()),
            Err(BagitError::UnparsableVersion(_))
        ));
    }

    #[test]
    fn test_unsupported_encoding() {
        let temp = TempDir::new().unwrap();
        minimal_bag(temp.path());
        write(temp.path(), "bagit.txt", "BagIt-Version: 0.97\nTag-File-Character-Encoding: KOI8-R\n");

        assert!(matches!(
            BagReader::new().read(temp.path()),
            Err(BagitError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = BagReader::new().read(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, BagitError::BagNotFound(_)));
    }

    struct OnlySha1;

    impl AlgorithmNameMapping for OnlySha1 {
        fn supported_algorithm(&self, bagit_name: &str) -> Result<SupportedAlgorithm> {
            match bagit_name {
                "sha1" => Ok(SupportedAlgorithm::Sha1),
                other => Err(BagitError::UnsupportedAlgorithm(other.to_string())),
            }
        }
    }

    #[test]
    fn test_custom_name_mapping() {
        let temp = TempDir::new().unwrap();
        minimal_bag(temp.path());

        let reader = BagReader::with_name_mapping(OnlySha1);
        assert!(matches!(
            reader.read(temp.path()),
            Err(BagitError::UnsupportedAlgorithm(_))
        ));
        assert!(reader.name_mapping().supported_algorithm("sha1").is_ok());
    }
}
