//! Glob expander
//!
//! Expands one file pattern against a root directory into a deduplicated
//! list of absolute regular-file paths, preserving first-seen order. The
//! expander is a pure function over the filesystem: all failures are
//! reported into the supplied [`ConfigLog`] and never raised.
//!
//! Pattern language: segments split on `/`; a segment is either a literal
//! name, a wildcard (`*` matches any run of characters, `?` exactly one) or
//! the token `**`, which matches zero or more whole directory levels.

use crate::config::ConfigLog;
use std::collections::HashSet;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::weakly_canonical;

/// Stop descending once a single `**` expansion has visited this many
/// directories
const RECURSIVE_DIR_LIMIT: usize = 20_000;
/// Stop enumerating a directory for a wildcard segment after this many
/// entries
const WILDCARD_ENTRY_LIMIT: usize = 1_000;

/// Expand `pattern` against `root`
pub fn expand(root: &Path, pattern: &str, log: &mut ConfigLog) -> Vec<PathBuf> {
    expand_with_home(root, pattern, env::var_os("HOME"), log)
}

/// Like [`expand`], with the home directory passed in (testable)
pub fn expand_with_home(
    root: &Path,
    pattern: &str,
    home: Option<OsString>,
    log: &mut ConfigLog,
) -> Vec<PathBuf> {
    if pattern.is_empty() {
        return Vec::new();
    }

    let mut root = root.to_path_buf();
    let mut rest = pattern;
    if let Some(stripped) = rest.strip_prefix("~/") {
        match home {
            Some(home) => root = PathBuf::from(home),
            None => {
                log.warn(
                    format!("cannot expand ~ in pattern {}: $HOME is undefined", pattern),
                    Some(pattern),
                );
                root = PathBuf::from("/");
            }
        }
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('/') {
        root = PathBuf::from("/");
        rest = stripped;
    }

    if !root.is_dir() {
        log.error(format!("folder does not exist: {}", root.display()), Some(pattern));
        return Vec::new();
    }

    let mut walk = Walk {
        parts: rest.split('/').map(str::to_string).collect(),
        pattern,
        log,
        results: Vec::new(),
        seen: HashSet::new(),
        recursive_dirs: 0,
        recursive_capped: false,
    };
    walk.dfs(0, &root);
    walk.results
}

struct Walk<'a> {
    parts: Vec<String>,
    pattern: &'a str,
    log: &'a mut ConfigLog,
    results: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
    recursive_dirs: usize,
    recursive_capped: bool,
}

impl Walk<'_> {
    fn accept(&mut self, path: &Path) {
        if !path.is_file() {
            return;
        }
        let canonical = weakly_canonical(path);
        if self.seen.insert(canonical.clone()) {
            self.results.push(canonical);
        }
    }

    fn dfs(&mut self, idx: usize, base: &Path) {
        if idx == self.parts.len() {
            self.accept(base);
            return;
        }

        let part = self.parts[idx].clone();

        let last = idx + 1 == self.parts.len();

        // `**` as its own segment matches zero or more directory levels; as
        // the final segment it collects every regular file below `base`
        if part == "**" {
            // Match zero directories first, then recurse with the same index
            self.dfs(idx + 1, base);
            for entry in self.entries(base) {
                if !entry.is_dir() {
                    if last {
                        self.accept(&entry);
                    }
                    continue;
                }
                if self.recursive_capped {
                    return;
                }
                self.recursive_dirs += 1;
                if self.recursive_dirs > RECURSIVE_DIR_LIMIT {
                    self.recursive_capped = true;
                    self.log.warn(
                        "stopped expanding '**' due to excessive directories",
                        Some(part.as_str()),
                    );
                    return;
                }
                self.dfs(idx, &entry);
            }
            return;
        }

        // Literal segment: match by exact name
        if !is_wildcard(&part) {
            let next = base.join(&part);
            if last {
                // A missing literal file is not an error, the pattern just
                // matched nothing
                self.accept(&next);
            } else if next.is_dir() {
                self.dfs(idx + 1, &next);
            }
            return;
        }

        // Wildcard segment: enumerate this directory only
        let mut checked = 0usize;
        for entry in self.entries(base) {
            checked += 1;
            if checked > WILDCARD_ENTRY_LIMIT {
                self.log.warn("stopped expanding wildcard: too many entries", Some(part.as_str()));
                break;
            }
            let Some(name) = entry.file_name().map(OsStr::to_string_lossy) else { continue };
            if !fnmatch(&part, &name) {
                continue;
            }
            if last {
                self.accept(&entry);
            } else if entry.is_dir() {
                self.dfs(idx + 1, &entry);
            }
        }
    }

    /// Directory entries sorted by name, so expansion order is stable
    fn entries(&mut self, dir: &Path) -> Vec<PathBuf> {
        match fs::read_dir(dir) {
            Ok(iter) => {
                let mut entries: Vec<PathBuf> = iter.filter_map(|e| e.ok().map(|e| e.path())).collect();
                entries.sort();
                entries
            }
            Err(err) => {
                self.log.warn(
                    format!("failed to read directory {}: {}", dir.display(), err),
                    Some(self.pattern),
                );
                Vec::new()
            }
        }
    }
}

fn is_wildcard(segment: &str) -> bool {
    segment.contains('*') || segment.contains('?')
}

/// POSIX fnmatch for a single segment: `*` matches any run of characters,
/// `?` matches exactly one
fn fnmatch(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0usize, 0usize);
    let (mut star_p, mut star_n) = (None::<usize>, 0usize);

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star_p = Some(p);
            star_n = n;
            p += 1;
        } else if let Some(sp) = star_p {
            // Backtrack: let the last `*` swallow one more character
            p = sp + 1;
            star_n += 1;
            n = star_n;
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, rel: &str) {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
    }

    fn names(results: &[PathBuf], root: &Path) -> Vec<String> {
        let root = weakly_canonical(root);
        results
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_fnmatch() {
        assert!(fnmatch("*.art", "main.art"));
        assert!(fnmatch("a?c", "abc"));
        assert!(!fnmatch("a?c", "ac"));
        assert!(fnmatch("*", "anything"));
        assert!(fnmatch("a*b*c", "aXXbYYc"));
        assert!(!fnmatch("*.art", "main.impala"));
        assert!(fnmatch("**", "name"));
    }

    #[test]
    fn test_literal_segment() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "src/main.art");
        let mut log = ConfigLog::new();
        let results = expand(dir.path(), "src/main.art", &mut log);
        assert_eq!(names(&results, dir.path()), vec!["src/main.art"]);
        assert!(log.messages.is_empty());
    }

    #[test]
    fn test_missing_literal_is_empty_and_silent() {
        let dir = TempDir::new().unwrap();
        let mut log = ConfigLog::new();
        let results = expand(dir.path(), "src/missing.art", &mut log);
        assert!(results.is_empty());
        assert!(log.messages.is_empty());
    }

    #[test]
    fn test_wildcard_segment() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.art");
        touch(&dir, "b.art");
        touch(&dir, "c.impala");
        let mut log = ConfigLog::new();
        let results = expand(dir.path(), "*.art", &mut log);
        assert_eq!(names(&results, dir.path()), vec!["a.art", "b.art"]);
    }

    #[test]
    fn test_question_mark() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a1.art");
        touch(&dir, "a22.art");
        let mut log = ConfigLog::new();
        let results = expand(dir.path(), "a?.art", &mut log);
        assert_eq!(names(&results, dir.path()), vec!["a1.art"]);
    }

    #[test]
    fn test_recursive_collects_all_levels() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.art");
        touch(&dir, "sub/b.art");
        touch(&dir, "sub/deep/c.art");
        touch(&dir, "sub/deep/d.txt");
        let mut log = ConfigLog::new();
        let results = expand(dir.path(), "**/*.art", &mut log);
        assert_eq!(
            names(&results, dir.path()),
            vec!["a.art", "sub/b.art", "sub/deep/c.art"]
        );
    }

    #[test]
    fn test_trailing_recursive_collects_every_file() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.art");
        touch(&dir, "sub/b.txt");
        let mut log = ConfigLog::new();
        let results = expand(dir.path(), "**", &mut log);
        assert_eq!(names(&results, dir.path()), vec!["a.art", "sub/b.txt"]);
    }

    #[test]
    fn test_directory_is_not_accepted_as_file() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "src/a.art");
        let mut log = ConfigLog::new();
        let results = expand(dir.path(), "src", &mut log);
        assert!(results.is_empty());
    }

    #[test]
    fn test_nonexistent_root_is_error() {
        let mut log = ConfigLog::new();
        let results = expand(Path::new("/nonexistent-root-dir"), "*.art", &mut log);
        assert!(results.is_empty());
        assert!(log.has_errors());
    }

    #[test]
    fn test_empty_pattern() {
        let dir = TempDir::new().unwrap();
        let mut log = ConfigLog::new();
        assert!(expand(dir.path(), "", &mut log).is_empty());
        assert!(log.messages.is_empty());
    }

    #[test]
    fn test_home_unset_falls_back_to_root_with_warning() {
        let mut log = ConfigLog::new();
        let results =
            expand_with_home(Path::new("/tmp"), "~/nonexistent-dir-xyz/*.art", None, &mut log);
        assert!(results.is_empty());
        assert_eq!(log.messages.len(), 1);
        assert!(log.messages[0].message.contains("$HOME"));
    }

    #[test]
    fn test_determinism() {
        let dir = TempDir::new().unwrap();
        for name in ["z.art", "m.art", "a.art"] {
            touch(&dir, name);
        }
        let mut log = ConfigLog::new();
        let first = expand(dir.path(), "*.art", &mut log);
        let second = expand(dir.path(), "*.art", &mut log);
        assert_eq!(first, second);
        assert_eq!(names(&first, dir.path()), vec!["a.art", "m.art", "z.art"]);
    }
}
