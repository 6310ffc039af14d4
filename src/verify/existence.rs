/*!
 * Existence checks tolerant of Unicode normalization differences
 *
 * A manifest written on one filesystem may name a file in NFC while another
 * filesystem stores it in NFD (or the reverse). A file only counts as missing
 * when neither a direct lookup nor a normalized comparison against its
 * siblings finds it.
 */

use crate::concurrency::{lock, CountDownLatch};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

/// Whether `path` exists, directly or under a differently normalized name
pub fn file_exists(path: &Path) -> bool {
    path.exists() || find_normalized(path).is_some()
}

/// On-disk sibling whose NFD form equals the NFD form of `path`'s file name
///
/// I/O errors while listing the parent are logged and treated as "not found".
pub fn find_normalized(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    let wanted: String = path.file_name()?.to_string_lossy().nfd().collect();

    let entries = match std::fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %parent.display(), error = %e, "Unable to list directory for normalized lookup");
            return None;
        }
    };

    for entry in entries {
        match entry {
            Ok(entry) => {
                let candidate: String = entry.file_name().to_string_lossy().nfd().collect();
                if candidate == wanted {
                    debug!(
                        manifest_path = %path.display(),
                        disk_path = %entry.path().display(),
                        "Found file under a differently normalized name"
                    );
                    return Some(entry.path());
                }
            }
            Err(e) => {
                warn!(dir = %parent.display(), error = %e, "Error reading directory entry");
            }
        }
    }

    None
}

/// Check every path on `pool`, returning the sorted missing ones
///
/// One task per path. Tasks only append to the shared list; the latch is
/// released by a drop guard so a panicking task cannot block the wait.
pub(crate) fn find_missing(paths: Vec<PathBuf>, pool: &rayon::ThreadPool) -> Vec<PathBuf> {
    let missing = Arc::new(Mutex::new(Vec::new()));
    let latch = CountDownLatch::new(paths.len());

    for path in paths {
        let missing = Arc::clone(&missing);
        let guard = latch.guard();
        pool.spawn(move || {
            let _guard = guard;
            if !file_exists(&path) {
                warn!(path = %path.display(), "File listed in manifest does not exist");
                record_missing(&missing, path);
            }
        });
    }

    latch.wait();

    let mut missing = std::mem::take(&mut *lock(&missing));
    missing.sort();
    missing
}

// A poisoned list still records the path, or the missing set would come up short.
fn record_missing(missing: &Mutex<Vec<PathBuf>>, path: PathBuf) {
    lock(missing).push(path);
}
