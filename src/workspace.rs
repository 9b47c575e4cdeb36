//! Workspace resolver
//!
//! Owns the arena of `File`, `Project` and `ConfigDocument` records and
//! answers the central query: which files must be compiled together for a
//! given source file. Projects are discovered by walking the filesystem
//! upward from the file, loading every reachable configuration document,
//! and testing project membership transitively through dependencies.
//!
//! All records live until [`Workspace::reload`], which clears the arena;
//! the graph is rebuilt lazily by the next query.

use crate::config::{self, ConfigDocument, ConfigLog, Include, ProjectDefinition};
use crate::glob;
use crate::paths::weakly_canonical;
use crate::CONFIG_FILE_NAMES;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Handle to a file record in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(u32);

/// A tracked source file. The buffer, when present, overrides the on-disk
/// contents (the editor has unsaved changes); when absent the file is read
/// on next use.
#[derive(Debug)]
pub struct File {
    pub path: PathBuf,
    pub text: Option<String>,
}

/// A project with its lazily materialized file list
#[derive(Debug)]
pub struct Project {
    pub name: String,
    /// The config document that first defined this project
    pub origin: PathBuf,
    /// Base directory for relative file patterns
    pub root_dir: PathBuf,
    pub file_patterns: Vec<String>,
    /// Unresolved dependency names; resolved against the project table at
    /// traversal time so forward and cyclic references stay representable
    pub dependencies: Vec<String>,
    /// Include-recursion depth of the defining document
    pub depth: usize,
    /// Materialized file list, populated on first access
    files: Option<Vec<PathBuf>>,
}

impl Project {
    fn from_definition(def: ProjectDefinition, depth: usize) -> Self {
        Self {
            name: def.name,
            origin: def.origin,
            root_dir: def.root_dir,
            file_patterns: def.file_patterns,
            dependencies: def.dependencies,
            depth,
            files: None,
        }
    }
}

/// The workspace: arena plus resolution caches
#[derive(Debug, Default)]
pub struct Workspace {
    files: Vec<File>,
    file_ids: HashMap<PathBuf, FileId>,
    projects: HashMap<String, Project>,
    configs: HashMap<PathBuf, ConfigDocument>,
    /// Cache of successful project discoveries, valid until reload
    project_cache: HashMap<PathBuf, String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- arena ----

    /// Intern a file record; idempotent
    pub fn tracked_file(&mut self, path: &Path) -> FileId {
        let canonical = weakly_canonical(path);
        if let Some(&id) = self.file_ids.get(&canonical) {
            return id;
        }
        let id = FileId(self.files.len() as u32);
        self.files.push(File { path: canonical.clone(), text: None });
        self.file_ids.insert(canonical, id);
        id
    }

    pub fn file_path(&self, id: FileId) -> &Path {
        &self.files[id.0 as usize].path
    }

    /// The file's text: the in-memory buffer if the editor supplied one,
    /// otherwise read from disk and cached
    pub fn file_text(&mut self, id: FileId) -> Option<String> {
        let file = &mut self.files[id.0 as usize];
        if file.text.is_none() {
            file.text = fs::read_to_string(&file.path).ok();
        }
        file.text.clone()
    }

    /// Store editor-supplied contents for a file, interning it if needed
    pub fn set_file_content(&mut self, path: &Path, text: String) {
        let id = self.tracked_file(path);
        self.files[id.0 as usize].text = Some(text);
    }

    /// Drop the in-memory buffer so the next use re-reads the disk
    pub fn mark_file_dirty(&mut self, path: &Path) {
        let canonical = weakly_canonical(path);
        if let Some(&id) = self.file_ids.get(&canonical) {
            self.files[id.0 as usize].text = None;
        }
    }

    pub fn projects(&self) -> &HashMap<String, Project> {
        &self.projects
    }

    pub fn configs(&self) -> &HashMap<PathBuf, ConfigDocument> {
        &self.configs
    }

    pub fn is_tracked_config(&self, path: &Path) -> bool {
        self.configs.contains_key(&weakly_canonical(path))
    }

    // ---- lifecycle ----

    /// Clear the arena and every cache; the config graph is rebuilt lazily
    /// by the next query
    pub fn reload(&mut self) {
        debug!("reloading workspace");
        self.files.clear();
        self.file_ids.clear();
        self.projects.clear();
        self.configs.clear();
        self.project_cache.clear();
    }

    /// A config document was saved or changed on disk. Untracked documents
    /// cannot affect any resolution and are ignored; for tracked documents
    /// the whole workspace reloads, with the changed document re-loaded
    /// eagerly so its diagnostics are fresh.
    pub fn on_config_changed(&mut self, path: &Path, log: &mut ConfigLog) -> bool {
        let canonical = weakly_canonical(path);
        if !self.configs.contains_key(&canonical) {
            return false;
        }
        self.reload();
        self.load_config(&canonical, 0, log);
        true
    }

    // ---- compile-unit assembly ----

    /// Collect the ordered, deduplicated set of files that must be compiled
    /// together for `file`. The file itself is always a member: when it is
    /// not claimed by the resolved project (default-project fallback, or no
    /// project at all) it is appended as a synthetic member.
    pub fn collect_compile_unit(&mut self, file: &Path, log: &mut ConfigLog) -> Vec<FileId> {
        let file = weakly_canonical(file);
        let Some(project) = self.discover_project(&file, log) else {
            debug!(file = %file.display(), "no project found, compiling alone");
            return vec![self.tracked_file(&file)];
        };

        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect_project_files(&project, &mut out, &mut seen, &mut Vec::new(), log);

        let id = self.tracked_file(&file);
        let augmented = !seen.contains(&id);
        if augmented {
            out.push(id);
        }
        debug!(
            file = %file.display(),
            project = %project,
            files = out.len(),
            augmented,
            "assembled compilation unit"
        );
        out
    }

    /// Find the project that owns `file`, walking parent directories upward
    pub fn discover_project(&mut self, file: &Path, log: &mut ConfigLog) -> Option<String> {
        let file = weakly_canonical(file);
        if let Some(name) = self.project_cache.get(&file) {
            return Some(name.clone());
        }

        let mut dir = file.parent().map(Path::to_path_buf);
        while let Some(current) = dir {
            if current.as_os_str() == "/" {
                break;
            }
            if let Some(config_path) = self.find_config_in_dir(&current, log) {
                if let Some(project) = self.find_project_using_file(&config_path, &file, log) {
                    self.project_cache.insert(file, project.clone());
                    return Some(project);
                }
            }
            dir = current.parent().map(Path::to_path_buf);
        }
        None
    }

    /// Probe a directory for a config document, loading it on first contact
    fn find_config_in_dir(&mut self, dir: &Path, log: &mut ConfigLog) -> Option<PathBuf> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if !path.exists() {
                continue;
            }
            let canonical = weakly_canonical(&path);
            if self.configs.contains_key(&canonical) || self.load_config(&canonical, 0, log) {
                return Some(canonical);
            }
        }
        None
    }

    /// In declaration order, the first project of the document that uses the
    /// file; the document's default project if none does
    fn find_project_using_file(
        &mut self,
        config_path: &Path,
        file: &Path,
        log: &mut ConfigLog,
    ) -> Option<String> {
        let document = self.configs.get(config_path)?;
        let declared = document.projects.clone();
        let default = document.default_project.clone();

        for name in declared {
            if self.uses_file(&name, file, &mut Vec::new(), log) {
                return Some(name);
            }
        }
        default.filter(|name| self.projects.contains_key(name))
    }

    /// Load a config document and, transitively, its includes. The config
    /// table doubles as the visited set: a document is inserted before its
    /// includes are walked, so include cycles terminate silently.
    fn load_config(&mut self, path: &Path, depth: usize, log: &mut ConfigLog) -> bool {
        if self.configs.contains_key(path) {
            return true;
        }
        let raw = path.display().to_string();
        let Some(parsed) = config::parse_document(path, false, &raw, log) else {
            return false;
        };
        debug!(config = %path.display(), projects = parsed.projects.len(), "loaded config");

        let document = parsed.document;
        let includes = document.includes.clone();
        self.configs.insert(path.to_path_buf(), document);

        for def in parsed.projects {
            if let Some(existing) = self.projects.get(&def.name) {
                if existing.origin == def.origin {
                    // The same definition reached over two include routes
                    continue;
                }
                log.set_file(path);
                log.warn(
                    format!(
                        "ignoring duplicate definition of {} in {}",
                        def.name,
                        def.origin.display()
                    ),
                    Some(def.name.as_str()),
                );
                continue;
            }
            self.projects.insert(def.name.clone(), Project::from_definition(def, depth));
        }

        for include in includes {
            match include {
                Include::DeprecatedGlobal => {}
                Include::Path { target, raw } => {
                    if target.exists() {
                        if !self.load_config(&target, depth + 1, log) {
                            log.set_file(path);
                            log.error(
                                format!("failed to include config {}", target.display()),
                                Some(raw.as_str()),
                            );
                        }
                    } else {
                        log.set_file(path);
                        log.error(
                            format!("config file does not exist: \"{}\"", target.display()),
                            Some(raw.as_str()),
                        );
                    }
                }
                Include::OptionalPath { target, raw } => {
                    if target.exists() && !self.load_config(&target, depth + 1, log) {
                        log.set_file(path);
                        log.error(
                            format!("failed to include config {}", target.display()),
                            Some(raw.as_str()),
                        );
                    }
                }
            }
        }
        true
    }

    /// Whether `project` uses `file`, directly or through a dependency
    fn uses_file(
        &mut self,
        project: &str,
        file: &Path,
        stack: &mut Vec<String>,
        log: &mut ConfigLog,
    ) -> bool {
        if self.project_files(project, log).iter().any(|f| f == file) {
            return true;
        }
        stack.push(project.to_string());
        let deps = self.traversable_deps(project, stack, log);
        let used = deps.into_iter().any(|dep| self.uses_file(&dep, file, stack, log));
        stack.pop();
        used
    }

    /// Depth-first collection of a project's files and its dependencies',
    /// deduplicated preserving first-seen order
    fn collect_project_files(
        &mut self,
        project: &str,
        out: &mut Vec<FileId>,
        seen: &mut HashSet<FileId>,
        stack: &mut Vec<String>,
        log: &mut ConfigLog,
    ) {
        for path in self.project_files(project, log) {
            let id = self.tracked_file(&path);
            if seen.insert(id) {
                out.push(id);
            }
        }
        stack.push(project.to_string());
        for dep in self.traversable_deps(project, stack, log) {
            self.collect_project_files(&dep, out, seen, stack, log);
        }
        stack.pop();
    }

    /// The dependencies of `project` that are safe to traverse. An edge back
    /// into the current visit stack is a dependency cycle: it is reported at
    /// the offending literal and removed from the project so later
    /// traversals terminate without re-reporting. Unresolved names are
    /// reported and treated as not used, but the edge is kept.
    fn traversable_deps(
        &mut self,
        project: &str,
        stack: &[String],
        log: &mut ConfigLog,
    ) -> Vec<String> {
        let Some(record) = self.projects.get(project) else {
            return Vec::new();
        };
        let origin = record.origin.clone();
        let deps = record.dependencies.clone();

        let mut kept = Vec::new();
        let mut traversable = Vec::new();
        for dep in deps {
            if stack.contains(&dep) {
                log.set_file(&origin);
                log.error(format!("cyclic dependency on project {}", dep), Some(dep.as_str()));
                continue;
            }
            if !self.projects.contains_key(&dep) {
                log.set_file(&origin);
                log.error(format!("failed to resolve dependency {}", dep), Some(dep.as_str()));
                kept.push(dep);
                continue;
            }
            kept.push(dep.clone());
            traversable.push(dep);
        }
        if let Some(record) = self.projects.get_mut(project) {
            record.dependencies = kept;
        }
        traversable
    }

    /// The project's materialized file list. On first access every inclusion
    /// pattern is expanded, then every exclusion pattern is applied; the
    /// result is cached on the project until reload.
    fn project_files(&mut self, project: &str, log: &mut ConfigLog) -> Vec<PathBuf> {
        let Some(record) = self.projects.get(project) else {
            return Vec::new();
        };
        if let Some(files) = &record.files {
            return files.clone();
        }
        let origin = record.origin.clone();
        let root = record.root_dir.clone();
        let patterns = record.file_patterns.clone();
        log.set_file(&origin);

        let mut included: Vec<PathBuf> = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
            let matches = glob::expand(&root, pattern, log);
            if matches.is_empty() {
                log.warn("0 files", Some(pattern.as_str()));
                continue;
            }
            let mut added = 0usize;
            for path in matches {
                if seen.insert(path.clone()) {
                    included.push(path);
                    added += 1;
                }
            }
            log.info(format!("+ {} files", added), Some(pattern.as_str()));
        }
        for pattern in patterns.iter().filter(|p| p.starts_with('!')) {
            let matches = glob::expand(&root, &pattern[1..], log);
            if matches.is_empty() {
                log.warn("0 files excluded", Some(pattern.as_str()));
                continue;
            }
            let excluded: HashSet<PathBuf> = matches.into_iter().collect();
            let before = included.len();
            included.retain(|p| !excluded.contains(p));
            log.info(format!("- {} files", before - included.len()), Some(pattern.as_str()));
        }

        if let Some(record) = self.projects.get_mut(project) {
            record.files = Some(included.clone());
        }
        included
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Severity;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        weakly_canonical(&path)
    }

    fn unit_paths(ws: &mut Workspace, file: &Path, log: &mut ConfigLog) -> Vec<PathBuf> {
        ws.collect_compile_unit(file, log)
            .into_iter()
            .map(|id| ws.file_path(id).to_path_buf())
            .collect()
    }

    #[test]
    fn test_no_config_compiles_alone() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "work/foo.art", "fn f() {}");
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let unit = unit_paths(&mut ws, &file, &mut log);
        assert_eq!(unit, vec![file]);
        assert!(log.messages.iter().all(|m| m.severity != Severity::Error));
    }

    #[test]
    fn test_single_project_with_glob() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.art", "");
        let b = write(dir.path(), "sub/b.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "main", "files": ["**/*.art"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let unit = unit_paths(&mut ws, &a, &mut log);
        assert_eq!(unit, vec![a.clone(), b]);
        // a.art appears exactly once
        assert_eq!(unit.iter().filter(|p| **p == a).count(), 1);
    }

    #[test]
    fn test_dependency_chain() {
        let dir = TempDir::new().unwrap();
        let app = write(dir.path(), "app/main.art", "");
        let lib = write(dir.path(), "lib/lib.art", "");
        let core = write(dir.path(), "core/core.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [
                    { "name": "app",  "folder": "app",  "files": ["*.art"], "dependencies": ["lib"] },
                    { "name": "lib",  "folder": "lib",  "files": ["*.art"], "dependencies": ["core"] },
                    { "name": "core", "folder": "core", "files": ["*.art"] }
                 ] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let unit = unit_paths(&mut ws, &app, &mut log);
        assert_eq!(unit, vec![app, lib, core]);
    }

    #[test]
    fn test_dependency_file_resolves_to_first_using_project() {
        let dir = TempDir::new().unwrap();
        let _app = write(dir.path(), "app/main.art", "");
        let lib = write(dir.path(), "lib/lib.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [
                    { "name": "app", "folder": "app", "files": ["*.art"], "dependencies": ["lib"] },
                    { "name": "lib", "folder": "lib", "files": ["*.art"] }
                 ] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        // lib's file is used by app transitively, and app is declared first
        let project = ws.discover_project(&lib, &mut log).unwrap();
        assert_eq!(project, "app");
    }

    #[test]
    fn test_cyclic_dependency_terminates_with_diagnostic() {
        let dir = TempDir::new().unwrap();
        let x = write(dir.path(), "x/x.art", "");
        write(dir.path(), "y/y.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [
                    { "name": "x", "folder": "x", "files": ["*.art"], "dependencies": ["y"] },
                    { "name": "y", "folder": "y", "files": ["*.art"], "dependencies": ["x"] }
                 ] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let unit = unit_paths(&mut ws, &x, &mut log);
        assert_eq!(unit.len(), 2);
        let cycle_errors: Vec<_> = log
            .messages
            .iter()
            .filter(|m| m.severity == Severity::Error && m.message.contains("cyclic"))
            .collect();
        assert!(!cycle_errors.is_empty());
        // The offending edge was removed
        assert!(ws.projects()["y"].dependencies.is_empty());
    }

    #[test]
    fn test_optional_missing_include_is_silent() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "include": ["other.json?"],
                 "projects": [{ "name": "main", "files": ["*.art"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        unit_paths(&mut ws, &file, &mut log);
        assert!(log.messages.iter().all(|m| m.severity != Severity::Error), "{:?}", log.messages);
        assert_eq!(ws.configs().len(), 1);
    }

    #[test]
    fn test_missing_required_include_is_error() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "include": ["other.json"],
                 "projects": [{ "name": "main", "files": ["*.art"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        unit_paths(&mut ws, &file, &mut log);
        let err = log.messages.iter().find(|m| m.severity == Severity::Error).unwrap();
        assert!(err.message.contains("does not exist"));
        assert_eq!(err.context.as_deref(), Some("\"other.json\""));
    }

    #[test]
    fn test_includes_merge_projects() {
        let dir = TempDir::new().unwrap();
        let app = write(dir.path(), "main.art", "");
        let lib = write(dir.path(), "lib/lib.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "include": ["lib/artic.json"],
                 "projects": [{ "name": "app", "files": ["*.art"], "dependencies": ["lib"] }] }"#,
        );
        write(
            dir.path(),
            "lib/artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "lib", "files": ["*.art"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let unit = unit_paths(&mut ws, &app, &mut log);
        assert_eq!(unit, vec![app, lib]);
        assert_eq!(ws.configs().len(), 2);
    }

    #[test]
    fn test_include_cycle_loads_to_fixed_point() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "include": ["other.json"],
                 "projects": [{ "name": "main", "files": ["*.art"] }] }"#,
        );
        write(
            dir.path(),
            "other.json",
            r#"{ "artic-config": "2.0", "include": ["artic.json"] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        unit_paths(&mut ws, &file, &mut log);
        assert_eq!(ws.configs().len(), 2);
        assert!(log.messages.iter().all(|m| m.severity != Severity::Error), "{:?}", log.messages);
    }

    #[test]
    fn test_duplicate_project_name_keeps_first() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "include": ["other.json"],
                 "projects": [{ "name": "main", "files": ["*.art"] }] }"#,
        );
        write(
            dir.path(),
            "other.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "main", "files": ["*.impala"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        unit_paths(&mut ws, &file, &mut log);
        assert_eq!(ws.projects().len(), 1);
        let main = &ws.projects()["main"];
        assert_eq!(main.file_patterns, vec!["*.art"]);
        assert!(log
            .messages
            .iter()
            .any(|m| m.severity == Severity::Warning && m.message.contains("duplicate")));
    }

    #[test]
    fn test_default_project_augmented_with_file() {
        let dir = TempDir::new().unwrap();
        let other = write(dir.path(), "lib/other.art", "");
        let stray = write(dir.path(), "stray.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "lib", "folder": "lib", "files": ["*.art"] }],
                 "default-project": "lib" }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let unit = unit_paths(&mut ws, &stray, &mut log);
        // the default project's files, then the open file appended
        assert_eq!(unit, vec![other, stray]);
    }

    #[test]
    fn test_exclusion_wins_over_literal_include() {
        let dir = TempDir::new().unwrap();
        let keep = write(dir.path(), "keep.art", "");
        write(dir.path(), "gen.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "main", "files": ["keep.art", "gen.art", "!gen.art"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let unit = unit_paths(&mut ws, &keep, &mut log);
        assert_eq!(unit, vec![keep]);
    }

    #[test]
    fn test_exclusion_matching_nothing_warns() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "main", "files": ["*.art", "!nope/*.art"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let unit = unit_paths(&mut ws, &file, &mut log);
        assert_eq!(unit.len(), 1);
        assert!(log
            .messages
            .iter()
            .any(|m| m.severity == Severity::Warning && m.message.contains("0 files excluded")));
    }

    #[test]
    fn test_unresolved_dependency_reported_and_not_used() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "main", "files": ["*.art"], "dependencies": ["ghost"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let unit = unit_paths(&mut ws, &file, &mut log);
        assert_eq!(unit.len(), 1);
        let err = log.messages.iter().find(|m| m.severity == Severity::Error).unwrap();
        assert!(err.message.contains("ghost"));
        assert_eq!(err.context.as_deref(), Some("\"ghost\""));
        // The edge stays: it may resolve after the next reload
        assert_eq!(ws.projects()["main"].dependencies, vec!["ghost"]);
    }

    #[test]
    fn test_artic_lsp_preferred_over_artic_json() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.art", "");
        write(
            dir.path(),
            ".artic-lsp",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "preferred", "files": ["*.art"] }] }"#,
        );
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "fallback", "files": ["*.art"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let project = ws.discover_project(&file, &mut log).unwrap();
        assert_eq!(project, "preferred");
    }

    #[test]
    fn test_reload_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "main", "files": ["*.art"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let first = unit_paths(&mut ws, &file, &mut log);
        let projects_first: Vec<String> = {
            let mut names: Vec<_> = ws.projects().keys().cloned().collect();
            names.sort();
            names
        };

        ws.reload();
        let mut log = ConfigLog::new();
        let second = unit_paths(&mut ws, &file, &mut log);
        let projects_second: Vec<String> = {
            let mut names: Vec<_> = ws.projects().keys().cloned().collect();
            names.sort();
            names
        };
        assert_eq!(first, second);
        assert_eq!(projects_first, projects_second);
    }

    #[test]
    fn test_on_config_changed_untracked_is_ignored() {
        let dir = TempDir::new().unwrap();
        let config = write(dir.path(), "artic.json", r#"{ "artic-config": "2.0" }"#);
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        assert!(!ws.on_config_changed(&config, &mut log));
    }

    #[test]
    fn test_on_config_changed_tracked_reloads() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.art", "");
        let config = write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "main", "files": ["a.art"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        assert_eq!(unit_paths(&mut ws, &a, &mut log).len(), 1);

        // Add a file to the project and save the config
        let b = write(dir.path(), "b.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "main", "files": ["a.art", "b.art"] }] }"#,
        );
        let mut log = ConfigLog::new();
        assert!(ws.on_config_changed(&config, &mut log));
        let mut log = ConfigLog::new();
        let unit = unit_paths(&mut ws, &a, &mut log);
        assert_eq!(unit, vec![a, b]);
    }

    #[test]
    fn test_buffer_overrides_disk() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.art", "fn old() {}");
        let mut ws = Workspace::new();
        ws.set_file_content(&file, "fn new() {}".to_string());
        let id = ws.tracked_file(&file);
        assert_eq!(ws.file_text(id).unwrap(), "fn new() {}");
        ws.mark_file_dirty(&file);
        assert_eq!(ws.file_text(id).unwrap(), "fn old() {}");
    }

    #[test]
    fn test_discovery_cache_is_stable() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.art", "");
        write(
            dir.path(),
            "artic.json",
            r#"{ "artic-config": "2.0",
                 "projects": [{ "name": "main", "files": ["*.art"] }] }"#,
        );
        let mut ws = Workspace::new();
        let mut log = ConfigLog::new();
        let first = ws.discover_project(&file, &mut log);
        let second = ws.discover_project(&file, &mut log);
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("main"));
    }
}
