/*!
 * Serialization of bags to their tag files
 *
 * Manifest and fetch paths are written relative to the bag root, `/`-delimited,
 * with `%`, CR and LF escaped so every entry stays on one line.
 */

use crate::domain::bag::{BAGIT_FILE, BAG_INFO_FILE, FETCH_FILE, PACKAGE_INFO_FILE};
use crate::domain::{Bag, FetchItem, Manifest, Metadata, TagFileEncoding, Version};
use crate::error::Result;
use crate::reader::path::to_manifest_path;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Write every tag file of `bag` into its tag directory
pub fn write_bag(bag: &Bag) -> Result<()> {
    info!(root = %bag.root_dir().display(), "Writing bag");
    let tag_dir = bag.tag_dir();
    fs::create_dir_all(tag_dir)?;

    write_bagit_file(bag.version, bag.encoding, tag_dir)?;
    write_payload_manifests(bag.payload_manifests(), tag_dir, bag.root_dir(), bag.encoding)?;
    if !bag.metadata.is_empty() {
        write_bag_metadata(&bag.metadata, bag.version, tag_dir, bag.encoding)?;
    }
    if !bag.items_to_fetch.is_empty() {
        write_fetch_file(&bag.items_to_fetch, tag_dir, bag.root_dir(), bag.encoding)?;
    }
    write_tag_manifests(bag.tag_manifests(), tag_dir, bag.root_dir(), bag.encoding)
}

/// Write `bagit.txt`; it is always UTF-8
pub fn write_bagit_file(version: Version, encoding: TagFileEncoding, output_dir: &Path) -> Result<()> {
    let file = output_dir.join(BAGIT_FILE);
    debug!(file = %file.display(), %version, "Writing bagit.txt");

    let contents = format!(
        "BagIt-Version: {}\nTag-File-Character-Encoding: {}\n",
        version,
        encoding.name()
    );
    fs::write(file, contents)?;
    Ok(())
}

pub fn write_payload_manifests<'a, I>(
    manifests: I,
    output_dir: &Path,
    bag_root: &Path,
    encoding: TagFileEncoding,
) -> Result<()>
where
    I: IntoIterator<Item = &'a Manifest>,
{
    for manifest in manifests {
        let file = output_dir.join(manifest.algorithm().payload_manifest_name());
        write_manifest(manifest, &file, bag_root, encoding)?;
    }
    Ok(())
}

pub fn write_tag_manifests<'a, I>(
    manifests: I,
    output_dir: &Path,
    bag_root: &Path,
    encoding: TagFileEncoding,
) -> Result<()>
where
    I: IntoIterator<Item = &'a Manifest>,
{
    for manifest in manifests {
        let file = output_dir.join(manifest.algorithm().tag_manifest_name());
        write_manifest(manifest, &file, bag_root, encoding)?;
    }
    Ok(())
}

fn write_manifest(
    manifest: &Manifest,
    file: &Path,
    bag_root: &Path,
    encoding: TagFileEncoding,
) -> Result<()> {
    debug!(file = %file.display(), entries = manifest.len(), "Writing manifest");
    let mut contents = String::new();
    for (path, checksum) in manifest.iter() {
        let _ = writeln!(contents, "{}  {}", checksum, to_manifest_path(bag_root, path)?);
    }
    fs::write(file, encoding.encode(&contents)?)?;
    Ok(())
}

/// Write `bag-info.txt` (`package-info.txt` for versions 0.93 to 0.95)
pub fn write_bag_metadata(
    metadata: &Metadata,
    version: Version,
    output_dir: &Path,
    encoding: TagFileEncoding,
) -> Result<()> {
    let name = if version.uses_package_info() {
        PACKAGE_INFO_FILE
    } else {
        BAG_INFO_FILE
    };
    let file = output_dir.join(name);
    debug!(file = %file.display(), entries = metadata.len(), "Writing bag metadata");

    let mut contents = String::new();
    for (key, value) in metadata.iter() {
        let _ = writeln!(contents, "{}: {}", key, continuation_lines(value));
    }
    fs::write(file, encoding.encode(&contents)?)?;
    Ok(())
}

/// Indent every line after the first so it reads back as a continuation
fn continuation_lines(value: &str) -> String {
    value.lines().collect::<Vec<_>>().join("\n  ")
}

pub fn write_fetch_file(
    items: &[FetchItem],
    output_dir: &Path,
    bag_root: &Path,
    encoding: TagFileEncoding,
) -> Result<()> {
    let file = output_dir.join(FETCH_FILE);
    debug!(file = %file.display(), items = items.len(), "Writing fetch file");

    let mut contents = String::new();
    for item in items {
        let _ = writeln!(
            contents,
            "{} {} {}",
            item.url,
            item.length_token(),
            to_manifest_path(bag_root, &item.path)?
        );
    }
    fs::write(file, encoding.encode(&contents)?)?;
    Ok(())
}
