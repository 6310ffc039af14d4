/*!
 * Directory tree visitor and the payload manifest builder
 *
 * [`walk_file_tree`] drives a [`FileVisitor`] over a sorted `walkdir`
 * traversal. Directory callbacks decide whether a subtree is entered, file
 * callbacks may stop the walk.
 */

use crate::domain::bag::DOT_BAGIT_DIR;
use crate::domain::Manifest;
use crate::error::Result;
use crate::hash::{hash_file, SupportedAlgorithm};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Placeholder file that keeps otherwise empty directories in a bag
pub const KEEP_FILE: &str = ".keep";

/// What the walk does after a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitResult {
    Continue,
    SkipSubtree,
    Terminate,
}

/// Callbacks invoked by [`walk_file_tree`]
pub trait FileVisitor {
    fn pre_visit_directory(&mut self, _dir: &Path) -> Result<VisitResult> {
        Ok(VisitResult::Continue)
    }

    fn visit_file(&mut self, file: &Path) -> Result<VisitResult>;

    fn post_visit_directory(&mut self, _dir: &Path) -> Result<VisitResult> {
        Ok(VisitResult::Continue)
    }
}

/// Walk `start` in file-name order; `start` itself is always entered
pub fn walk_file_tree<V: FileVisitor + ?Sized>(start: &Path, visitor: &mut V) -> Result<()> {
    let mut walker = WalkDir::new(start)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    // Directories entered so far, with their depth, awaiting post-visit
    let mut open_dirs: Vec<(usize, PathBuf)> = Vec::new();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(io::Error::from)?;

        while let Some((depth, _)) = open_dirs.last() {
            if *depth < entry.depth() {
                break;
            }
            if let Some((_, dir)) = open_dirs.pop() {
                if visitor.post_visit_directory(&dir)? == VisitResult::Terminate {
                    return Ok(());
                }
            }
        }

        let path = entry.path();
        if entry.file_type().is_dir() {
            match visitor.pre_visit_directory(path)? {
                VisitResult::Continue => open_dirs.push((entry.depth(), path.to_path_buf())),
                VisitResult::SkipSubtree => walker.skip_current_dir(),
                VisitResult::Terminate => return Ok(()),
            }
        } else if visitor.visit_file(path)? == VisitResult::Terminate {
            return Ok(());
        }
    }

    while let Some((_, dir)) = open_dirs.pop() {
        if visitor.post_visit_directory(&dir)? == VisitResult::Terminate {
            break;
        }
    }

    Ok(())
}

/// Hidden by name (leading `.`) or, on Windows, by file attribute
pub fn is_hidden(path: &Path) -> bool {
    let dot_name = path
        .file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false);
    dot_name || has_hidden_attribute(path)
}

#[cfg(windows)]
fn has_hidden_attribute(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    std::fs::symlink_metadata(path)
        .map(|meta| meta.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_path: &Path) -> bool {
    false
}

/// Which entries count as payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadFilter {
    include_hidden: bool,
}

impl PayloadFilter {
    pub fn new(include_hidden: bool) -> Self {
        Self { include_hidden }
    }

    /// `.bagit` is never payload; other hidden directories follow the flag
    pub fn directory_result(&self, dir: &Path) -> VisitResult {
        if dir.file_name().map(|n| n == DOT_BAGIT_DIR).unwrap_or(false) {
            debug!(dir = %dir.display(), "Skipping .bagit directory");
            return VisitResult::SkipSubtree;
        }
        if !self.include_hidden && is_hidden(dir) {
            debug!(dir = %dir.display(), "Skipping hidden directory");
            return VisitResult::SkipSubtree;
        }
        VisitResult::Continue
    }

    /// `.keep` placeholders always count; other hidden files follow the flag
    pub fn includes_file(&self, file: &Path) -> bool {
        if self.include_hidden || !is_hidden(file) {
            return true;
        }
        file.file_name().map(|n| n == KEEP_FILE).unwrap_or(false)
    }
}

/// Hashes every payload file into one manifest per algorithm
pub struct PayloadManifestVisitor {
    filter: PayloadFilter,
    algorithms: Vec<SupportedAlgorithm>,
    manifests: BTreeMap<SupportedAlgorithm, Manifest>,
    byte_count: u64,
    file_count: u64,
}

impl PayloadManifestVisitor {
    pub fn new(algorithms: &[SupportedAlgorithm], include_hidden: bool) -> Self {
        let manifests = algorithms
            .iter()
            .map(|alg| (*alg, Manifest::new(*alg)))
            .collect();
        Self {
            filter: PayloadFilter::new(include_hidden),
            algorithms: algorithms.to_vec(),
            manifests,
            byte_count: 0,
            file_count: 0,
        }
    }

    /// Total size of the hashed files
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    pub fn file_count(&self) -> u64 {
        self.file_count
    }

    pub fn into_manifests(self) -> Vec<Manifest> {
        self.manifests.into_values().collect()
    }
}

impl FileVisitor for PayloadManifestVisitor {
    fn pre_visit_directory(&mut self, dir: &Path) -> Result<VisitResult> {
        Ok(self.filter.directory_result(dir))
    }

    fn visit_file(&mut self, file: &Path) -> Result<VisitResult> {
        if !self.filter.includes_file(file) {
            debug!(file = %file.display(), "Skipping hidden file since hidden files are excluded");
            return Ok(VisitResult::Continue);
        }

        debug!(file = %file.display(), "Generating checksums");
        for (alg, checksum) in hash_file(file, &self.algorithms)? {
            debug!(%alg, %checksum, "Adding to manifest");
            if let Some(manifest) = self.manifests.get_mut(&alg) {
                manifest.insert(file, checksum);
            }
        }
        self.byte_count += std::fs::metadata(file)?.len();
        self.file_count += 1;

        Ok(VisitResult::Continue)
    }
}

/// Collects payload file paths and their sizes without hashing
#[derive(Debug)]
pub struct PayloadFileCollector {
    filter: PayloadFilter,
    files: Vec<(PathBuf, u64)>,
}

impl PayloadFileCollector {
    pub fn new(include_hidden: bool) -> Self {
        Self {
            filter: PayloadFilter::new(include_hidden),
            files: Vec::new(),
        }
    }

    pub fn into_files(self) -> Vec<(PathBuf, u64)> {
        self.files
    }
}

impl FileVisitor for PayloadFileCollector {
    fn pre_visit_directory(&mut self, dir: &Path) -> Result<VisitResult> {
        Ok(self.filter.directory_result(dir))
    }

    fn visit_file(&mut self, file: &Path) -> Result<VisitResult> {
        if self.filter.includes_file(file) {
            let size = std::fs::metadata(file)?.len();
            self.files.push((file.to_path_buf(), size));
        }
        Ok(VisitResult::Continue)
    }
}
