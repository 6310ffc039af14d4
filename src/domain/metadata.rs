/*!
 * Ordered bag metadata (bag-info.txt)
 */

use serde::{Deserialize, Serialize};

pub const PAYLOAD_OXUM: &str = "Payload-Oxum";
pub const BAGGING_DATE: &str = "Bagging-Date";

/// Ordered `(key, value)` pairs; keys may repeat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    pub fn add<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.entries.push((key.into(), value.into()));
    }

    /// Replace every value for `key` with a single entry, keeping the first position
    pub fn upsert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter().position(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(index) => {
                self.entries[index].1 = value;
                let mut seen = 0;
                self.entries.retain(|(k, _)| {
                    if k.eq_ignore_ascii_case(&key) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.entries.push((key, value)),
        }
    }

    /// First value for `key`, compared case-insensitively
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn payload_oxum(&self) -> Option<&str> {
        self.get(PAYLOAD_OXUM)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
