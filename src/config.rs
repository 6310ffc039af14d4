/*!
 * Configuration for bag creation and verification
 */

use crate::error::{BagitError, Result};
use crate::hash::SupportedAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings shared by the creator and the verifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagitConfig {
    /// Digest algorithms used when creating manifests
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<SupportedAlgorithm>,

    /// Treat hidden files and directories as payload
    #[serde(default)]
    pub include_hidden: bool,

    /// Worker threads for verification (0 = available parallelism)
    #[serde(default)]
    pub threads: usize,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for BagitConfig {
    fn default() -> Self {
        Self {
            algorithms: default_algorithms(),
            include_hidden: false,
            threads: 0,
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
        }
    }
}

fn default_algorithms() -> Vec<SupportedAlgorithm> {
    vec![SupportedAlgorithm::Sha512]
}

impl BagitConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BagitConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Configuration with an explicit worker count
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Configuration that treats hidden entries as payload
    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Configuration with explicit manifest algorithms
    pub fn with_algorithms(mut self, algorithms: &[SupportedAlgorithm]) -> Self {
        self.algorithms = algorithms.to_vec();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.algorithms.is_empty() {
            return Err(BagitError::Config(
                "At least one manifest algorithm is required".to_string(),
            ));
        }

        for (i, alg) in self.algorithms.iter().enumerate() {
            if self.algorithms[..i].contains(alg) {
                return Err(BagitError::Config(format!(
                    "Algorithm {} is listed more than once",
                    alg
                )));
            }
        }

        Ok(())
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
