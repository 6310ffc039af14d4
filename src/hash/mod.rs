/*!
 * Digest algorithms and one-pass file hashing
 */

pub mod algorithm;
pub mod hasher;

pub use algorithm::{AlgorithmNameMapping, StandardAlgorithmNameMapping, SupportedAlgorithm};
pub use hasher::{calculate_checksum, hash_file, MultiHasher};
