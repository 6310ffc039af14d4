/*!
 * BagIt-Version values and layout predicates
 */

use crate::error::{BagitError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `(major, minor)` pair, ordered lexicographically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    /// Version written by in-place creation
    pub const STANDARD: Version = Version::new(0, 97);

    /// First version that keeps tag files in a `.bagit` directory
    pub const DOT_BAGIT: Version = Version::new(0, 98);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Whether this version keeps tag files under `.bagit/`
    pub fn uses_dot_bagit(&self) -> bool {
        *self >= Self::DOT_BAGIT
    }

    /// Versions 0.93 to 0.95 name their metadata file `package-info.txt`
    pub fn uses_package_info(&self) -> bool {
        *self >= Version::new(0, 93) && *self <= Version::new(0, 95)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = BagitError;

    fn from_str(s: &str) -> Result<Self> {
        parse_version(s)
    }
}

/// Parse a `MAJOR.MINOR` version string
pub fn parse_version(version: &str) -> Result<Version> {
    let unparsable = || {
        BagitError::UnparsableVersion(format!(
            "Version must be in format MAJOR.MINOR but was [{}]",
            version
        ))
    };

    let (major, minor) = version.trim().split_once('.').ok_or_else(unparsable)?;
    let major = major.parse::<u32>().map_err(|_| unparsable())?;
    let minor = minor.parse::<u32>().map_err(|_| unparsable())?;

    Ok(Version::new(major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("0.97").unwrap(), Version::new(0, 97));
        assert_eq!(parse_version("1.0").unwrap(), Version::new(1, 0));
        assert_eq!(parse_version(" 0.96 ").unwrap(), Version::new(0, 96));
    }

    #[test]
    fn test_parse_version_without_dot() {
        for bad in ["", "1", "097", "one"] {
            let err = parse_version(bad).unwrap_err();
            assert!(matches!(err, BagitError::UnparsableVersion(_)), "{}", bad);
        }
    }

    #[test]
    fn test_parse_version_non_numeric() {
        assert!(matches!(
            parse_version("a.b"),
            Err(BagitError::UnparsableVersion(_))
        ));
        assert!(matches!(
            parse_version("1.2.3"),
            Err(BagitError::UnparsableVersion(_))
        ));
    }

    #[test]
    fn test_ordering() {
        assert!(Version::new(0, 97) < Version::new(0, 98));
        assert!(Version::new(0, 99) < Version::new(1, 0));
        assert!(Version::new(1, 0).uses_dot_bagit());
        assert!(!Version::STANDARD.uses_dot_bagit());
        assert!(Version::new(0, 95).uses_package_info());
        assert!(!Version::new(0, 96).uses_package_info());
    }

    #[test]
    fn test_display_round_trip() {
        let version: Version = "0.98".parse().unwrap();
        assert_eq!(version.to_string(), "0.98");
    }
}
