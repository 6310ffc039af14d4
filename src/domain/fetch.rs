/*!
 * Items deferred to remote retrieval
 */

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// One line of `fetch.txt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchItem {
    pub url: Url,
    /// Declared byte length; `None` when the file says `-`
    pub length: Option<u64>,
    /// Destination, always inside the bag root
    pub path: PathBuf,
}

impl FetchItem {
    pub fn new(url: Url, length: Option<u64>, path: PathBuf) -> Self {
        Self { url, length, path }
    }

    /// Length token as written in `fetch.txt`
    pub fn length_token(&self) -> String {
        self.length
            .map(|len| len.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}
