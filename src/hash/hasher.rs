/*!
 * Streaming checksum calculation: one read pass feeds every requested digest
 */

use super::algorithm::SupportedAlgorithm;
use crate::error::Result;
use sha2::digest::DynDigest;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 64 * 1024; // 64KB buffer

/// Streaming hasher that updates several digests from the same buffers
pub struct MultiHasher {
    digests: Vec<(SupportedAlgorithm, Box<dyn DynDigest + Send>)>,
}

impl MultiHasher {
    /// Create a hasher for the given algorithms; duplicates are ignored
    pub fn new(algorithms: &[SupportedAlgorithm]) -> Self {
        let mut digests: Vec<(SupportedAlgorithm, Box<dyn DynDigest + Send>)> =
            Vec::with_capacity(algorithms.len());
        for alg in algorithms {
            if digests.iter().all(|(existing, _)| existing != alg) {
                digests.push((*alg, alg.new_digest()));
            }
        }
        Self { digests }
    }

    /// Update every digest with new data
    pub fn update(&mut self, data: &[u8]) {
        for (_, digest) in self.digests.iter_mut() {
            digest.update(data);
        }
    }

    /// Read the whole stream, updating every digest per buffer
    pub fn update_reader<R: Read>(&mut self, reader: &mut R) -> Result<u64> {
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut total = 0u64;

        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            self.update(&buffer[..n]);
            total += n as u64;
        }

        Ok(total)
    }

    /// Finalize and return lowercase hex digests in request order
    pub fn finalize(self) -> Vec<(SupportedAlgorithm, String)> {
        self.digests
            .into_iter()
            .map(|(alg, digest)| (alg, hex::encode(digest.finalize())))
            .collect()
    }
}

/// Hash a file with every algorithm in a single read pass
pub fn hash_file(path: &Path, algorithms: &[SupportedAlgorithm]) -> Result<Vec<(SupportedAlgorithm, String)>> {
    let mut file = BufReader::new(File::open(path)?);
    let mut hasher = MultiHasher::new(algorithms);
    hasher.update_reader(&mut file)?;
    Ok(hasher.finalize())
}

/// Calculate a single checksum of a file
pub fn calculate_checksum(path: &Path, algorithm: SupportedAlgorithm) -> Result<String> {
    let mut results = hash_file(path, &[algorithm])?;
    // MultiHasher yields exactly one entry per distinct algorithm
    Ok(results.pop().map(|(_, hex)| hex).unwrap_or_default())
}
