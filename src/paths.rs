//! Path canonicalization helpers
//!
//! Workspace identity is the weakly canonical absolute path: symlinks are
//! resolved for the part of the path that exists, and the remainder is
//! normalized lexically. This lets configuration documents refer to files
//! that do not exist yet without breaking path comparisons.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Canonicalize a path without requiring every component to exist
pub fn weakly_canonical(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map(|d| d.join(path)).unwrap_or_else(|_| path.to_path_buf())
    };

    // Lexical normalization: the missing tail cannot contain symlinks, so
    // `.` and `..` resolve by popping
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    // Resolve symlinks for the longest existing prefix, then reattach the
    // missing tail
    let mut base = normalized.clone();
    let mut tail: Vec<OsString> = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(&base) {
            let mut result = canonical;
            for name in tail.iter().rev() {
                result.push(name);
            }
            return result;
        }
        match (base.parent(), base.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                base = parent.to_path_buf();
            }
            _ => return normalized,
        }
    }
}

/// Resolve a config-supplied path string against a base directory.
///
/// `/`-prefixed paths are absolute, `~/` resolves against `HOME`, everything
/// else is relative to `base_dir`. The result is weakly canonical.
pub fn resolve_config_path(base_dir: &Path, path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("/"));
        return weakly_canonical(&home.join(rest));
    }
    if path.starts_with('/') {
        return weakly_canonical(Path::new(path));
    }
    weakly_canonical(&base_dir.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_existing_path_canonicalizes() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.art");
        fs::write(&file, "").unwrap();
        assert_eq!(weakly_canonical(&file), fs::canonicalize(&file).unwrap());
    }

    #[test]
    fn test_missing_tail_is_normalized() {
        let dir = TempDir::new().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let path = dir.path().join("missing").join("..").join("other").join("b.art");
        assert_eq!(weakly_canonical(&path), root.join("other").join("b.art"));
    }

    #[test]
    fn test_resolve_relative() {
        let dir = TempDir::new().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        assert_eq!(resolve_config_path(&root, "sub/x.json"), root.join("sub").join("x.json"));
    }

    #[test]
    fn test_resolve_absolute() {
        let dir = TempDir::new().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let abs = root.join("abs.json");
        assert_eq!(resolve_config_path(Path::new("/elsewhere"), abs.to_str().unwrap()), abs);
    }
}
