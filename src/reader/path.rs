/*!
 * Resolution of manifest and fetch path tokens against the bag root
 *
 * Every path read from a tag file passes through [`resolve`], which is the
 * defense against entries that try to reference files outside the bag
 * (`../` traversal, absolute paths, `~/`, `file://` URIs pointing elsewhere).
 */

use crate::error::{BagitError, Result};
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use url::Url;

/// Turn a raw path token into a normalized path under `bag_root`
pub fn resolve(bag_root: &Path, raw_token: &str) -> Result<PathBuf> {
    let mut token = raw_token;
    if let Some(stripped) = raw_token.strip_prefix('*') {
        warn!(
            path = raw_token,
            "Encountered path created by a non-bagit tool, removing leading *; please remove all * from manifest files"
        );
        token = stripped;
    }

    if raw_token.contains('\\') {
        return Err(BagitError::invalid_format(format!(
            "Path [{}] is invalid due to the use of the path separator [\\]",
            raw_token
        )));
    }

    if raw_token.contains("~/") {
        return Err(BagitError::malicious_path(format!(
            "Path [{}] is trying to access a file outside the bag",
            raw_token
        )));
    }

    let decoded = decode_filename(token);
    let root = normalize(bag_root);

    let file = if decoded.starts_with("file://") {
        let url = Url::parse(&decoded).map_err(|e| {
            BagitError::invalid_format(format!("Path [{}] is not a valid file URI: {}", raw_token, e))
        })?;
        url.to_file_path().map_err(|_| {
            BagitError::invalid_format(format!("Path [{}] is not a local file URI", raw_token))
        })?
    } else {
        root.join(&decoded)
    };

    let file = normalize(&file);
    if !file.starts_with(&root) {
        return Err(BagitError::malicious_path(format!(
            "Path [{}] is outside the bag root directory of [{}]",
            file.display(),
            root.display()
        )));
    }

    Ok(file)
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(Component::ParentDir),
            },
            other => out.push(other),
        }
    }
    out
}

/// Absolute, lexically normalized spelling of a bag root
///
/// Manifest keys, the tag directory and the payload walk all derive from this
/// one spelling, so `./bag`, `x/../bag` and `/abs/bag` name the same files.
/// Symlinks are left alone.
pub fn bag_root(root: &Path) -> Result<PathBuf> {
    if root.is_absolute() {
        Ok(normalize(root))
    } else {
        Ok(normalize(&std::env::current_dir()?.join(root)))
    }
}

/// Decode the BagIt filename escapes `%0A`, `%0D` and `%25`
pub fn decode_filename(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut rest = token;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let escape = rest.get(pos + 1..pos + 3);
        let decoded = match escape {
            Some(hex) if hex.eq_ignore_ascii_case("0A") => Some('\n'),
            Some(hex) if hex.eq_ignore_ascii_case("0D") => Some('\r'),
            Some(hex) if hex.eq_ignore_ascii_case("25") => Some('%'),
            _ => None,
        };

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[pos + 3..];
            }
            None => {
                out.push('%');
                rest = &rest[pos + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Escape `%`, CR and LF so a name survives a line-oriented tag file
pub fn encode_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' => out.push_str("%25"),
            '\n' => out.push_str("%0A"),
            '\r' => out.push_str("%0D"),
            other => out.push(other),
        }
    }
    out
}

/// Path of `file` relative to `bag_root`, `/`-delimited and escaped
pub fn to_manifest_path(bag_root: &Path, file: &Path) -> Result<String> {
    let relative = file.strip_prefix(bag_root).map_err(|_| {
        BagitError::malicious_path(format!(
            "Path [{}] is outside the bag root directory of [{}]",
            file.display(),
            bag_root.display()
        ))
    })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| encode_filename(&c.as_os_str().to_string_lossy()))
        .collect();

    Ok(parts.join("/"))
}
