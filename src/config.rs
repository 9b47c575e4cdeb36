//! Configuration document parser
//!
//! Parses one `.artic-lsp` / `artic.json` document into its declared
//! projects, default project and include references. Parsing never panics
//! and never returns raw I/O or JSON errors: every problem becomes an entry
//! in the [`ConfigLog`], tagged with a literal that points back into the
//! JSON source so the LSP layer can attach it to a character range.

use crate::diag::Severity;
use crate::paths::{resolve_config_path, weakly_canonical};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Current config format version
pub const CURRENT_VERSION: &str = "2.0";
/// Still accepted, with a deprecation warning
pub const DEPRECATED_VERSION: &str = "1.0";

/// A single log entry about a configuration document
#[derive(Debug, Clone)]
pub struct ConfigMessage {
    pub severity: Severity,
    pub message: String,
    /// The config document the message is about
    pub file: PathBuf,
    /// A literal occurring in the document source, quoted. The LSP layer
    /// expands it into character ranges by scanning the document text.
    pub context: Option<String>,
}

/// Accumulates diagnostics across config parsing and workspace resolution
#[derive(Debug, Default)]
pub struct ConfigLog {
    file_context: PathBuf,
    pub messages: Vec<ConfigMessage>,
}

impl ConfigLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document that subsequent messages are tagged with
    pub fn set_file(&mut self, file: impl Into<PathBuf>) {
        self.file_context = file.into();
    }

    pub fn error(&mut self, message: impl Into<String>, context: Option<&str>) {
        self.push(Severity::Error, message.into(), context);
    }

    pub fn warn(&mut self, message: impl Into<String>, context: Option<&str>) {
        self.push(Severity::Warning, message.into(), context);
    }

    pub fn info(&mut self, message: impl Into<String>, context: Option<&str>) {
        self.push(Severity::Info, message.into(), context);
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, message: String, context: Option<&str>) {
        self.messages.push(ConfigMessage {
            severity,
            message,
            file: self.file_context.clone(),
            context: context.map(|c| format!("\"{}\"", c)),
        });
    }
}

/// An include directive of a config document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Include {
    /// A required include; a missing target is an error
    Path { target: PathBuf, raw: String },
    /// Marked with a trailing `?`; a missing target is silently skipped
    OptionalPath { target: PathBuf, raw: String },
    /// The legacy `<global>` sentinel; warned about, never expanded
    DeprecatedGlobal,
}

impl Include {
    /// The referenced document, if this include names one
    pub fn target(&self) -> Option<&Path> {
        match self {
            Include::Path { target, .. } | Include::OptionalPath { target, .. } => Some(target),
            Include::DeprecatedGlobal => None,
        }
    }
}

/// A parsed configuration document
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    /// Canonical path, the document's identity
    pub path: PathBuf,
    pub version: String,
    /// Names of the projects declared here, in declaration order
    pub projects: Vec<String>,
    pub default_project: Option<String>,
    pub includes: Vec<Include>,
}

/// A project as declared in a document, dependencies unresolved
#[derive(Debug, Clone)]
pub struct ProjectDefinition {
    pub name: String,
    /// The document that declared this project
    pub origin: PathBuf,
    /// Base directory for relative file patterns
    pub root_dir: PathBuf,
    /// Raw patterns; exclusions carry a leading `!`
    pub file_patterns: Vec<String>,
    /// Names of projects this one depends on, resolved at traversal time
    pub dependencies: Vec<String>,
}

/// The result of parsing one document
#[derive(Debug)]
pub struct ParsedConfig {
    pub document: ConfigDocument,
    pub projects: Vec<ProjectDefinition>,
}

/// Parse the document at `path`.
///
/// `optional` and `raw` describe the include that referenced the document;
/// a missing optional target returns `None` without logging.
pub fn parse_document(
    path: &Path,
    optional: bool,
    raw: &str,
    log: &mut ConfigLog,
) -> Option<ParsedConfig> {
    if path.as_os_str().is_empty() {
        log.error("config file path is empty", Some("include"));
        return None;
    }
    if !path.exists() {
        if !optional {
            log.error(
                format!("config file does not exist: \"{}\"", path.display()),
                Some(raw),
            );
        }
        return None;
    }
    log.set_file(path);

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            log.error(format!("failed to read {}: {}", path.display(), err), None);
            return None;
        }
    };
    let json: Value = match serde_json::from_str(&text) {
        Ok(json) => json,
        Err(err) => {
            log.error(format!("failed to parse {}: {}", path.display(), err), None);
            return None;
        }
    };
    let Value::Object(root) = &json else {
        log.error("config document must be a JSON object", None);
        return None;
    };

    let mut parser = DocumentParser {
        document: ConfigDocument {
            path: path.to_path_buf(),
            version: String::new(),
            projects: Vec::new(),
            default_project: None,
            includes: Vec::new(),
        },
        projects: Vec::new(),
    };

    let Some(version) = root.get("artic-config") else {
        log.error(
            "missing artic-config header\nExample: \"artic-config\": \"2.0\"",
            None,
        );
        return None;
    };
    let Some(version) = version.as_str() else {
        log.error("artic-config version must be a string", Some("artic-config"));
        return None;
    };
    parser.document.version = version.to_string();
    if version == DEPRECATED_VERSION {
        log.warn(
            format!("deprecated artic-config version (newest is {})", CURRENT_VERSION),
            Some("artic-config"),
        );
    } else if version != CURRENT_VERSION {
        log.warn(
            format!("unsupported artic-config version (newest is {})", CURRENT_VERSION),
            Some("artic-config"),
        );
    }

    for key in root.keys() {
        if !matches!(key.as_str(), "artic-config" | "projects" | "default-project" | "include") {
            log.error(format!("unknown json property \"{}\"", key), Some(key.as_str()));
        }
    }

    if let Some(projects) = root.get("projects") {
        match projects.as_array() {
            Some(entries) => {
                for entry in entries {
                    parser.parse_project_entry(entry, log);
                }
            }
            None => log.error("\"projects\" must be an array", Some("projects")),
        }
    }

    if let Some(default) = root.get("default-project") {
        if let Some(name) = default.as_str() {
            // Reference to a named project
            parser.document.default_project = Some(name.to_string());
        } else if default.is_object() {
            // Inline definition, also registered by name
            if let Some(name) = parser.parse_project_entry(default, log) {
                parser.document.default_project = Some(name);
            }
        } else {
            log.error(
                "\"default-project\" must be a project name or a project object",
                Some("default-project"),
            );
        }
    }

    if let Some(includes) = root.get("include") {
        match includes.as_array() {
            Some(entries) => {
                for entry in entries {
                    parser.parse_include_entry(entry, log);
                }
            }
            None => log.error("\"include\" must be an array of paths", Some("include")),
        }
    }

    Some(ParsedConfig { document: parser.document, projects: parser.projects })
}

struct DocumentParser {
    document: ConfigDocument,
    projects: Vec<ProjectDefinition>,
}

impl DocumentParser {
    /// Parse one project object; returns the project name on success
    fn parse_project_entry(&mut self, entry: &Value, log: &mut ConfigLog) -> Option<String> {
        let Some(object) = entry.as_object() else {
            log.error("project entry must be an object", Some("projects"));
            return None;
        };
        let Some(name) = object.get("name").and_then(Value::as_str) else {
            log.error(
                "every project must have a name\nExample: {\"name\": \"my_project\"}",
                Some("projects"),
            );
            return None;
        };

        let doc_dir = self
            .document
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let root_dir = match object.get("folder").and_then(Value::as_str) {
            Some(folder) if !folder.is_empty() => {
                let resolved = resolve_config_path(&doc_dir, folder);
                if resolved.is_dir() {
                    resolved
                } else {
                    log.error(
                        format!("project folder does not exist: {}", resolved.display()),
                        Some(folder),
                    );
                    doc_dir
                }
            }
            _ => doc_dir,
        };

        let dependencies = string_array(object.get("dependencies"), "dependencies", log);
        let file_patterns = string_array(object.get("files"), "files", log);

        self.projects.push(ProjectDefinition {
            name: name.to_string(),
            origin: self.document.path.clone(),
            root_dir,
            file_patterns,
            dependencies,
        });
        self.document.projects.push(name.to_string());
        Some(name.to_string())
    }

    fn parse_include_entry(&mut self, entry: &Value, log: &mut ConfigLog) {
        let Some(raw) = entry.as_str() else {
            log.error("include entry must be a string", Some("include"));
            return;
        };
        if raw == "<global>" {
            log.warn(
                "deprecated: including a global configuration file with '<global>' is no longer supported",
                Some("<global>"),
            );
            self.document.includes.push(Include::DeprecatedGlobal);
            return;
        }

        let doc_dir = self
            .document
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let include = match raw.strip_suffix('?') {
            Some(stripped) => Include::OptionalPath {
                target: weakly_canonical(&resolve_config_path(&doc_dir, stripped)),
                raw: raw.to_string(),
            },
            None => Include::Path {
                target: weakly_canonical(&resolve_config_path(&doc_dir, raw)),
                raw: raw.to_string(),
            },
        };
        self.document.includes.push(include);
    }
}

/// Read an optional array-of-strings property, diagnosing bad entries
fn string_array(value: Option<&Value>, key: &str, log: &mut ConfigLog) -> Vec<String> {
    let Some(value) = value else { return Vec::new() };
    let Some(entries) = value.as_array() else {
        log.error(format!("\"{}\" must be an array of strings", key), Some(key));
        return Vec::new();
    };
    let mut out = Vec::new();
    for entry in entries {
        match entry.as_str() {
            Some(s) => out.push(s.to_string()),
            None => log.error(format!("\"{}\" entries must be strings", key), Some(key)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        weakly_canonical(&path)
    }

    #[test]
    fn test_minimal_document() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "artic.json", r#"{ "artic-config": "2.0" }"#);
        let mut log = ConfigLog::new();
        let parsed = parse_document(&path, false, "artic.json", &mut log).unwrap();
        assert_eq!(parsed.document.version, "2.0");
        assert!(log.messages.is_empty());
    }

    #[test]
    fn test_deprecated_version_warns() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "artic.json", r#"{ "artic-config": "1.0" }"#);
        let mut log = ConfigLog::new();
        parse_document(&path, false, "artic.json", &mut log).unwrap();
        assert_eq!(log.messages.len(), 1);
        assert_eq!(log.messages[0].severity, Severity::Warning);
        assert!(log.messages[0].message.contains("deprecated"));
    }

    #[test]
    fn test_unknown_version_warns_and_continues() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "artic.json", r#"{ "artic-config": "3.0" }"#);
        let mut log = ConfigLog::new();
        assert!(parse_document(&path, false, "artic.json", &mut log).is_some());
        assert!(log.messages[0].message.contains("unsupported"));
    }

    #[test]
    fn test_unknown_key_is_error_with_context() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "artic.json",
            r#"{ "artic-config": "2.0", "prjects": [] }"#,
        );
        let mut log = ConfigLog::new();
        parse_document(&path, false, "artic.json", &mut log).unwrap();
        let msg = log.messages.iter().find(|m| m.severity == Severity::Error).unwrap();
        assert_eq!(msg.context.as_deref(), Some("\"prjects\""));
    }

    #[test]
    fn test_missing_header_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "artic.json", r#"{ "projects": [] }"#);
        let mut log = ConfigLog::new();
        assert!(parse_document(&path, false, "artic.json", &mut log).is_none());
        assert!(log.has_errors());
    }

    #[test]
    fn test_bad_json_is_single_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "artic.json", "{ not json");
        let mut log = ConfigLog::new();
        assert!(parse_document(&path, false, "artic.json", &mut log).is_none());
        assert_eq!(log.messages.len(), 1);
        assert_eq!(log.messages[0].severity, Severity::Error);
    }

    #[test]
    fn test_missing_optional_target_is_silent() {
        let mut log = ConfigLog::new();
        assert!(parse_document(Path::new("/nonexistent/x.json"), true, "x.json?", &mut log).is_none());
        assert!(log.messages.is_empty());
    }

    #[test]
    fn test_missing_required_target_is_error() {
        let mut log = ConfigLog::new();
        assert!(parse_document(Path::new("/nonexistent/x.json"), false, "x.json", &mut log).is_none());
        assert!(log.has_errors());
        assert_eq!(log.messages[0].context.as_deref(), Some("\"x.json\""));
    }

    #[test]
    fn test_project_parsing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let path = write_config(
            &dir,
            "artic.json",
            r#"{
                "artic-config": "2.0",
                "projects": [
                    {
                        "name": "main",
                        "folder": "src",
                        "files": ["**/*.art", "!gen/*.art"],
                        "dependencies": ["lib"]
                    }
                ]
            }"#,
        );
        let mut log = ConfigLog::new();
        let parsed = parse_document(&path, false, "artic.json", &mut log).unwrap();
        assert!(log.messages.is_empty(), "{:?}", log.messages);
        assert_eq!(parsed.projects.len(), 1);
        let project = &parsed.projects[0];
        assert_eq!(project.name, "main");
        assert!(project.root_dir.ends_with("src"));
        assert_eq!(project.file_patterns, vec!["**/*.art", "!gen/*.art"]);
        assert_eq!(project.dependencies, vec!["lib"]);
        assert_eq!(parsed.document.projects, vec!["main"]);
    }

    #[test]
    fn test_missing_folder_falls_back_to_document_dir() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "artic.json",
            r#"{
                "artic-config": "2.0",
                "projects": [{ "name": "p", "folder": "does-not-exist" }]
            }"#,
        );
        let mut log = ConfigLog::new();
        let parsed = parse_document(&path, false, "artic.json", &mut log).unwrap();
        assert!(log.has_errors());
        assert_eq!(parsed.projects[0].root_dir, path.parent().unwrap());
    }

    #[test]
    fn test_project_without_name_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "artic.json",
            r#"{ "artic-config": "2.0", "projects": [{ "files": ["*.art"] }] }"#,
        );
        let mut log = ConfigLog::new();
        let parsed = parse_document(&path, false, "artic.json", &mut log).unwrap();
        assert!(parsed.projects.is_empty());
        assert!(log.has_errors());
    }

    #[test]
    fn test_inline_default_project_is_registered() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "artic.json",
            r#"{
                "artic-config": "2.0",
                "default-project": { "name": "fallback", "files": ["*.art"] }
            }"#,
        );
        let mut log = ConfigLog::new();
        let parsed = parse_document(&path, false, "artic.json", &mut log).unwrap();
        assert_eq!(parsed.document.default_project.as_deref(), Some("fallback"));
        assert_eq!(parsed.document.projects, vec!["fallback"]);
        assert_eq!(parsed.projects.len(), 1);
    }

    #[test]
    fn test_include_grammar() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "artic.json",
            r#"{
                "artic-config": "2.0",
                "include": ["other.json", "maybe.json?", "<global>"]
            }"#,
        );
        let mut log = ConfigLog::new();
        let parsed = parse_document(&path, false, "artic.json", &mut log).unwrap();
        let doc_dir = path.parent().unwrap();
        assert_eq!(
            parsed.document.includes[0],
            Include::Path { target: doc_dir.join("other.json"), raw: "other.json".into() }
        );
        assert_eq!(
            parsed.document.includes[1],
            Include::OptionalPath { target: doc_dir.join("maybe.json"), raw: "maybe.json?".into() }
        );
        assert_eq!(parsed.document.includes[2], Include::DeprecatedGlobal);
        // only the <global> deprecation warning
        assert_eq!(log.messages.len(), 1);
        assert_eq!(log.messages[0].severity, Severity::Warning);
    }
}
