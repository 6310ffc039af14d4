/*!
 * Line parsers shared by bagit.txt, bag-info.txt, manifests and fetch.txt
 */

use super::path::resolve;
use crate::domain::{FetchItem, TagFileEncoding};
use crate::error::{BagitError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Separator inserted between a value and its continuation line
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Read and decode a whole tag file
pub fn read_text(file: &Path, encoding: TagFileEncoding) -> Result<String> {
    let bytes = std::fs::read(file)?;
    encoding.decode(&bytes).map_err(|e| match e {
        BagitError::InvalidBagitFileFormat(msg) => {
            BagitError::invalid_format(format!("{}: {}", file.display(), msg))
        }
        other => other,
    })
}

/// Read ordered key/value pairs, folding indented lines into the previous value
pub fn read_key_values(
    file: &Path,
    separator: &str,
    encoding: TagFileEncoding,
) -> Result<Vec<(String, String)>> {
    let text = read_text(file, encoding)?;
    parse_key_values(&text, separator)
}

/// Parse key/value text; see [`read_key_values`]
pub fn parse_key_values(text: &str, separator: &str) -> Result<Vec<(String, String)>> {
    let mut key_values: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.starts_with(char::is_whitespace) {
            let Some((key, value)) = key_values.last_mut() else {
                return Err(BagitError::invalid_metadata(format!(
                    "Line [{}] is indented but there is no preceding key to continue",
                    line
                )));
            };
            debug!(key = %key, "Found an indented line, merging it with the previous value");
            value.push_str(LINE_SEPARATOR);
            value.push_str(line.trim());
            continue;
        }

        let Some((key, value)) = line.split_once(separator) else {
            return Err(BagitError::invalid_metadata(format!(
                "Line [{}] is not a valid tag file line. It must follow the \
                 form <key>{}<value>, or be indented by a space or a tab if it continues the previous line",
                line, separator
            )));
        };

        let key = key.trim().to_string();
        let value = value.trim().to_string();
        debug!(key = %key, value = %value, "Found key/value pair");
        key_values.push((key, value));
    }

    Ok(key_values)
}

/// Read `<checksum> <path>` lines into a path → checksum map
pub fn read_manifest_lines(
    file: &Path,
    bag_root: &Path,
    encoding: TagFileEncoding,
) -> Result<BTreeMap<PathBuf, String>> {
    let text = read_text(file, encoding)?;
    let mut map = BTreeMap::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let (checksum, path_token) = split_manifest_line(line).ok_or_else(|| {
            BagitError::invalid_format(format!(
                "Line {} [{}] of manifest [{}] must be of the form <checksum> <path>",
                index + 1,
                line,
                file.display()
            ))
        })?;

        let path = resolve(bag_root, path_token)?;
        debug!(checksum, path = %path.display(), manifest = %file.display(), "Read manifest entry");
        map.insert(path, checksum.to_string());
    }

    Ok(map)
}

/// Split on the first whitespace run; `None` when the path part is missing
fn split_manifest_line(line: &str) -> Option<(&str, &str)> {
    let (checksum, rest) = line.split_once(char::is_whitespace)?;
    let path = rest.trim_start();
    if checksum.is_empty() || path.is_empty() {
        return None;
    }
    Some((checksum, path))
}

/// Read `<url> <length|-> <path>` lines
pub fn read_fetch_lines(
    file: &Path,
    bag_root: &Path,
    encoding: TagFileEncoding,
) -> Result<Vec<FetchItem>> {
    let text = read_text(file, encoding)?;
    let mut items = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let malformed = |reason: &str| {
            BagitError::invalid_format(format!(
                "Line {} [{}] of fetch file [{}]: {}",
                index + 1,
                line,
                file.display(),
                reason
            ))
        };

        let (url_token, length_token, path_token) =
            split_fetch_line(line).ok_or_else(|| malformed("expected <url> <length> <path>"))?;

        let path = resolve(bag_root, path_token)?;
        let length = match length_token {
            "-" => None,
            token => Some(
                token
                    .parse::<u64>()
                    .map_err(|_| malformed("length must be a number or -"))?,
            ),
        };
        let url = Url::parse(url_token).map_err(|e| malformed(&format!("invalid URL: {}", e)))?;

        debug!(url = %url, ?length, path = %path.display(), "Read fetch item");
        items.push(FetchItem::new(url, length, path));
    }

    Ok(items)
}

/// Split into at most three whitespace-separated fields; the path keeps inner spaces
fn split_fetch_line(line: &str) -> Option<(&str, &str, &str)> {
    let (url, rest) = line.trim_start().split_once(char::is_whitespace)?;
    let (length, path) = rest.trim_start().split_once(char::is_whitespace)?;
    let path = path.trim_start();
    if url.is_empty() || length.is_empty() || path.is_empty() {
        return None;
    }
    Some((url, length, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_key_values_in_order() {
        let pairs = parse_key_values("BagIt-Version: 0.97\nTag-File-Character-Encoding: UTF-8\n", ":")
            .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("BagIt-Version".to_string(), "0.97".to_string()),
                ("Tag-File-Character-Encoding".to_string(), "UTF-8".to_string()),
            ]
        );
    }

    #[test]
    fn test_key_values_continuation() {
        let pairs = parse_key_values("Key: value\n more text\n", ":").unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1, format!("value{}more text", LINE_SEPARATOR));
    }

    #[test]
    fn test_key_values_split_on_first_separator() {
        let pairs = parse_key_values("External-Identifier: urn:x:y", ":").unwrap();
        assert_eq!(pairs[0], ("External-Identifier".to_string(), "urn:x:y".to_string()));
    }

    #[test]
    fn test_key_values_missing_separator() {
        let err = parse_key_values("Key value", ":").unwrap_err();
        assert!(matches!(err, BagitError::InvalidMetadata(msg) if msg.contains("Key value")));
    }

    #[test]
    fn test_key_values_leading_continuation_rejected() {
        let err = parse_key_values("\torphan\nKey: value", ":").unwrap_err();
        assert!(matches!(err, BagitError::InvalidMetadata(_)));
    }

    #[test]
    fn test_key_values_crlf() {
        let pairs = parse_key_values("A: 1\r\nB: 2\r\n", ":").unwrap();
        assert_eq!(pairs[1], ("B".to_string(), "2".to_string()));
    }

    #[test]
    fn test_read_key_values_from_file() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "bag-info.txt", "Contact-Name: Jane\nExternal-Description: line one\n  line two\n");
        let pairs = read_key_values(&file, ":", TagFileEncoding::Utf8).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].1, format!("line one{}line two", LINE_SEPARATOR));
    }

    #[test]
    fn test_manifest_lines() {
        let dir = TempDir::new().unwrap();
        let file = write(
            &dir,
            "manifest-md5.txt",
            "d41d8cd98f00b204e9800998ecf8427e  data/empty.txt\n\nabc\tdata/with space.txt\n",
        );
        let map = read_manifest_lines(&file, dir.path(), TagFileEncoding::Utf8).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get(&dir.path().join("data").join("empty.txt")).map(String::as_str),
            Some("d41d8cd98f00b204e9800998ecf8427e")
        );
        assert!(map.contains_key(&dir.path().join("data").join("with space.txt")));
    }

    #[test]
    fn test_manifest_line_without_path() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "manifest-md5.txt", "d41d8cd98f00b204e9800998ecf8427e\n");
        let err = read_manifest_lines(&file, dir.path(), TagFileEncoding::Utf8).unwrap_err();
        assert!(matches!(err, BagitError::InvalidBagitFileFormat(_)));
    }

    #[test]
    fn test_manifest_malicious_line() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "manifest-md5.txt", "abc  ../../etc/passwd\n");
        let err = read_manifest_lines(&file, dir.path(), TagFileEncoding::Utf8).unwrap_err();
        assert!(matches!(err, BagitError::MaliciousPath(_)));
    }

    #[test]
    fn test_fetch_lines() {
        let dir = TempDir::new().unwrap();
        let file = write(
            &dir,
            "fetch.txt",
            "http://example.com/a.txt 42 data/a.txt\nhttps://example.com/b%20c - data/b c.txt\n",
        );
        let items = read_fetch_lines(&file, dir.path(), TagFileEncoding::Utf8).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].length, Some(42));
        assert_eq!(items[0].path, dir.path().join("data").join("a.txt"));
        assert_eq!(items[1].length, None);
        assert_eq!(items[1].path, dir.path().join("data").join("b c.txt"));
    }

    #[test]
    fn test_fetch_line_malformed() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "fetch.txt", "http://example.com/a.txt 42\n");
        assert!(matches!(
            read_fetch_lines(&file, dir.path(), TagFileEncoding::Utf8),
            Err(BagitError::InvalidBagitFileFormat(_))
        ));

        let file = write(&dir, "fetch.txt", "http://example.com/a.txt many data/a.txt\n");
        assert!(matches!(
            read_fetch_lines(&file, dir.path(), TagFileEncoding::Utf8),
            Err(BagitError::InvalidBagitFileFormat(_))
        ));
    }

    #[test]
    fn test_fetch_line_malicious_path() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "fetch.txt", "http://example.com/a 1 ../outside\n");
        assert!(matches!(
            read_fetch_lines(&file, dir.path(), TagFileEncoding::Utf8),
            Err(BagitError::MaliciousPath(_))
        ));
    }
}
