/*!
 * Bag creation
 *
 * Two layouts are supported:
 * - [`BagCreator::bag_in_place`] moves the contents of a directory into
 *   `data/` and writes version 0.97 tag files next to it.
 * - [`BagCreator::create_dot_bagit`] leaves the payload where it is and writes
 *   version 0.98 tag files into a `.bagit/` directory.
 *
 * Creation moves files before hashing them; it must not run concurrently on
 * the same directory.
 */

pub mod visitor;

use crate::config::BagitConfig;
use crate::domain::bag::{DOT_BAGIT_DIR, PAYLOAD_DIR};
use crate::domain::{Bag, Manifest, Metadata, Version, BAGGING_DATE, PAYLOAD_OXUM};
use crate::error::{BagitError, Result};
use crate::hash::{hash_file, SupportedAlgorithm};
use crate::reader::path::bag_root;
use crate::verify::PayloadOxum;
use crate::writer;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use visitor::{
    is_hidden, walk_file_tree, FileVisitor, PayloadFileCollector, PayloadFilter,
    PayloadManifestVisitor, VisitResult,
};

const TAG_MANIFEST_PREFIX: &str = "tagmanifest-";

/// Creates bags on disk
pub struct BagCreator;

impl BagCreator {
    /// [`BagCreator::bag_in_place`] with the algorithms and hidden-file
    /// setting taken from `config`
    pub fn bag_in_place_with_config(root: &Path, config: &BagitConfig) -> Result<Bag> {
        config.validate()?;
        Self::bag_in_place(root, &config.algorithms, config.include_hidden)
    }

    /// [`BagCreator::create_dot_bagit`] with the algorithms and hidden-file
    /// setting taken from `config`
    pub fn create_dot_bagit_with_config(root: &Path, config: &BagitConfig) -> Result<Bag> {
        config.validate()?;
        Self::create_dot_bagit(root, &config.algorithms, config.include_hidden)
    }

    /// Turn `root` into a bag by moving its contents into `root/data`
    pub fn bag_in_place(
        root: &Path,
        algorithms: &[SupportedAlgorithm],
        include_hidden: bool,
    ) -> Result<Bag> {
        let root = &check_root(root)?;
        let data_dir = root.join(PAYLOAD_DIR);
        if data_dir.exists() {
            return Err(BagitError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", data_dir.display()),
            )));
        }

        info!(root = %root.display(), "Creating bag in place");
        let mut entries = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            if include_hidden || !is_hidden(&path) {
                entries.push((path, entry.file_name()));
            }
        }
        entries.sort();

        // Listed before `data` exists so it is never moved into itself
        fs::create_dir(&data_dir)?;
        for (source, name) in entries {
            let destination = data_dir.join(name);
            debug!(from = %source.display(), to = %destination.display(), "Moving into payload directory");
            fs::rename(&source, &destination)?;
        }

        let mut bag = Bag::new(root, Version::STANDARD);
        finish_bag(&mut bag, &data_dir, algorithms, include_hidden)?;
        Ok(bag)
    }

    /// Make `root` a bag by writing tag files into `root/.bagit`
    pub fn create_dot_bagit(
        root: &Path,
        algorithms: &[SupportedAlgorithm],
        include_hidden: bool,
    ) -> Result<Bag> {
        let root = &check_root(root)?;
        info!(root = %root.display(), "Creating .bagit bag");
        fs::create_dir_all(root.join(DOT_BAGIT_DIR))?;

        let mut bag = Bag::with_dot_bagit(root, Version::DOT_BAGIT);
        finish_bag(&mut bag, root, algorithms, include_hidden)?;
        Ok(bag)
    }
}

/// The normalized root, which must be an existing directory
fn check_root(root: &Path) -> Result<PathBuf> {
    if root.is_dir() {
        bag_root(root)
    } else {
        Err(BagitError::BagNotFound(root.to_path_buf()))
    }
}

/// Hash the payload, then write bagit.txt, manifests, bag-info.txt and tag manifests
fn finish_bag(
    bag: &mut Bag,
    payload_dir: &Path,
    algorithms: &[SupportedAlgorithm],
    include_hidden: bool,
) -> Result<()> {
    let mut visitor = PayloadManifestVisitor::new(algorithms, include_hidden);
    walk_file_tree(payload_dir, &mut visitor)?;

    let oxum = PayloadOxum::new(visitor.byte_count(), visitor.file_count());
    for manifest in visitor.into_manifests() {
        bag.add_payload_manifest(manifest);
    }
    bag.metadata = bag_info(oxum);

    let tag_dir = bag.tag_dir().to_path_buf();
    writer::write_bagit_file(bag.version, bag.encoding, &tag_dir)?;
    writer::write_payload_manifests(bag.payload_manifests(), &tag_dir, bag.root_dir(), bag.encoding)?;
    writer::write_bag_metadata(&bag.metadata, bag.version, &tag_dir, bag.encoding)?;

    for manifest in tag_manifests(&tag_dir, algorithms)? {
        bag.add_tag_manifest(manifest);
    }
    writer::write_tag_manifests(bag.tag_manifests(), &tag_dir, bag.root_dir(), bag.encoding)?;

    info!(
        root = %bag.root_dir().display(),
        payload_oxum = %oxum,
        "Finished creating bag"
    );
    Ok(())
}

fn bag_info(oxum: PayloadOxum) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.add(BAGGING_DATE, chrono::Local::now().format("%Y-%m-%d").to_string());
    metadata.add(PAYLOAD_OXUM, oxum.to_string());
    metadata
}

/// Manifests over every tag file in `tag_dir` except the tag manifests themselves
fn tag_manifests(tag_dir: &Path, algorithms: &[SupportedAlgorithm]) -> Result<Vec<Manifest>> {
    let mut manifests: Vec<Manifest> = algorithms.iter().map(|alg| Manifest::new(*alg)).collect();

    for file in tag_files(tag_dir)? {
        for (alg, checksum) in hash_file(&file, algorithms)? {
            if let Some(manifest) = manifests.iter_mut().find(|m| m.algorithm() == alg) {
                manifest.insert(file.clone(), checksum);
            }
        }
    }

    Ok(manifests)
}

fn tag_files(tag_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(tag_dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_file() && !name.starts_with(TAG_MANIFEST_PREFIX) && !is_hidden(&path)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
