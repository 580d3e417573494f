//! Mapping of untrusted URL paths onto the served root directory.
//!
//! [`resolve`] and [`resolve_child`] are the only places a [`ResolvedPath`] is built, so anything
//! holding one is guaranteed to point at the root or somewhere below it.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::ServerError;

/// A filesystem path that has been normalized and verified to live under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn file_name(&self) -> Option<String> {
        self.0.file_name().map(|n| n.to_string_lossy().into_owned())
    }

    pub fn is_markdown(&self) -> bool {
        is_markdown(&self.0)
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Percent-decode a URL path, replacing invalid UTF-8.
pub fn decode_request_path(request_path: &str) -> String {
    let decoded = urlencoding::decode_binary(request_path.as_bytes());
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Resolve a raw (percent-encoded) request path against a canonical `root`.
///
/// `..`, `.`, and symlinks are all resolved before the containment check, so
/// the only way to get `Ok` is for the final location to sit under `root`.
pub fn resolve(root: &Path, request_path: &str) -> Result<ResolvedPath, ServerError> {
    let decoded = decode_request_path(request_path);

    if decoded.contains('\0') {
        warn!("Path contains null byte: {:?}", request_path);
        return Err(ServerError::Traversal {
            path: request_path.to_string(),
        });
    }

    let relative = decoded.trim_start_matches(['/', '\\']);
    let joined = root.join(relative);
    let normalized = normalize(&joined);

    if !within_root(&normalized, root) {
        return Err(ServerError::Traversal {
            path: request_path.to_string(),
        });
    }

    Ok(ResolvedPath(normalized))
}

/// Resolve a fixed child name inside an already resolved directory.
///
/// The child may itself be a symlink, so containment is checked again.
pub fn resolve_child(
    root: &Path,
    parent: &ResolvedPath,
    name: &str,
) -> Result<ResolvedPath, ServerError> {
    let normalized = normalize(&parent.0.join(name));
    if !within_root(&normalized, root) {
        return Err(ServerError::Traversal {
            path: parent.0.join(name).display().to_string(),
        });
    }
    Ok(ResolvedPath(normalized))
}

/// The common prefix of `path` and `root` must be `root` itself.
fn within_root(path: &Path, root: &Path) -> bool {
    let common: PathBuf = path
        .components()
        .zip(root.components())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect();
    common == root
}

/// Canonicalize `path`, tolerating a missing tail.
///
/// The deepest ancestor that exists is canonicalized (which resolves any
/// symlinks in it) and the components below it are folded on lexically.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let mut missing: Vec<OsString> = Vec::new();
    let mut current = path.to_path_buf();
    let mut base = loop {
        match current.file_name() {
            Some(name) => {
                missing.push(name.to_os_string());
                if !current.pop() {
                    break PathBuf::new();
                }
            }
            // Trailing `..` in a missing tail: fold it away, then canonicalize again.
            None => return normalize(&lexical_normalize(path)),
        }
        if let Ok(canonical) = current.canonicalize() {
            break canonical;
        }
    };

    while let Some(name) = missing.pop() {
        base.push(name);
    }
    lexical_normalize(&base)
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
