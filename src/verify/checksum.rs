/*!
 * Checksum phase of verification
 *
 * Every listed file is read once and hashed with all algorithms that list it.
 * Jobs flow to the worker pool over a `crossbeam-channel`; per-file outcomes
 * flow back over a second channel and are collected after the pool drains.
 */

use super::existence::find_normalized;
use super::report::{ChecksumMismatch, UnreadableFile};
use crate::domain::{checksums_match, Manifest};
use crate::hash::{hash_file, SupportedAlgorithm};
use crossbeam_channel::unbounded;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One file and every checksum declared for it
struct ChecksumJob {
    path: PathBuf,
    expected: Vec<(SupportedAlgorithm, String)>,
}

enum Outcome {
    Mismatch(ChecksumMismatch),
    Unreadable(UnreadableFile),
}

/// Re-hash every file listed in `manifests`, except those in `skip`
pub(crate) fn check_manifests<'a, I>(
    manifests: I,
    skip: &HashSet<PathBuf>,
    pool: &rayon::ThreadPool,
) -> (Vec<ChecksumMismatch>, Vec<UnreadableFile>)
where
    I: IntoIterator<Item = &'a Manifest>,
{
    let jobs = group_by_path(manifests, skip);
    debug!(files = jobs.len(), "Checking checksums");

    let (job_tx, job_rx) = unbounded::<ChecksumJob>();
    let (result_tx, result_rx) = unbounded::<Outcome>();

    for job in jobs {
        // The receiver is alive until the pool below finishes
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    pool.install(|| {
        job_rx
            .into_iter()
            .par_bridge()
            .for_each_with(result_tx, |tx, job| {
                for outcome in check_job(job) {
                    let _ = tx.send(outcome);
                }
            });
    });

    let mut mismatches = Vec::new();
    let mut unreadable = Vec::new();
    for outcome in result_rx {
        match outcome {
            Outcome::Mismatch(m) => mismatches.push(m),
            Outcome::Unreadable(u) => unreadable.push(u),
        }
    }
    (mismatches, unreadable)
}

fn group_by_path<'a, I>(manifests: I, skip: &HashSet<PathBuf>) -> Vec<ChecksumJob>
where
    I: IntoIterator<Item = &'a Manifest>,
{
    let mut by_path: BTreeMap<&Path, Vec<(SupportedAlgorithm, String)>> = BTreeMap::new();
    for manifest in manifests {
        for (path, checksum) in manifest.iter() {
            if skip.contains(path) {
                continue;
            }
            by_path
                .entry(path.as_path())
                .or_default()
                .push((manifest.algorithm(), checksum.clone()));
        }
    }

    by_path
        .into_iter()
        .map(|(path, expected)| ChecksumJob {
            path: path.to_path_buf(),
            expected,
        })
        .collect()
}

fn check_job(job: ChecksumJob) -> Vec<Outcome> {
    let algorithms: Vec<SupportedAlgorithm> = job.expected.iter().map(|(alg, _)| *alg).collect();

    let actual = match hash_on_disk(&job.path, &algorithms) {
        Ok(actual) => actual,
        Err(e) => {
            warn!(path = %job.path.display(), error = %e, "Unable to read file for checksum verification");
            return vec![Outcome::Unreadable(UnreadableFile {
                path: job.path,
                reason: e.to_string(),
            })];
        }
    };

    let mut outcomes = Vec::new();
    for (algorithm, expected) in job.expected {
        let computed = actual
            .iter()
            .find(|(alg, _)| *alg == algorithm)
            .map(|(_, hex)| hex.as_str())
            .unwrap_or_default();

        if checksums_match(&expected, computed) {
            debug!(path = %job.path.display(), %algorithm, "Checksum matches");
        } else {
            warn!(
                path = %job.path.display(),
                %algorithm,
                expected = %expected,
                actual = %computed,
                "Checksum mismatch"
            );
            outcomes.push(Outcome::Mismatch(ChecksumMismatch {
                path: job.path.clone(),
                algorithm,
                expected,
                actual: computed.to_string(),
            }));
        }
    }
    outcomes
}

/// Hash `path`, falling back to its differently normalized on-disk name
fn hash_on_disk(
    path: &Path,
    algorithms: &[SupportedAlgorithm],
) -> crate::error::Result<Vec<(SupportedAlgorithm, String)>> {
    match hash_file(path, algorithms) {
        Err(crate::error::BagitError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            match find_normalized(path) {
                Some(disk_path) => hash_file(&disk_path, algorithms),
                None => Err(e.into()),
            }
        }
        other => other,
    }
}
