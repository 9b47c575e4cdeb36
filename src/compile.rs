//! Compile orchestrator
//!
//! Drives the frontend over the file set assembled by the workspace
//! resolver and owns the single cached [`CompileResult`]. Requests that can
//! be served from the cached result reuse it; everything else decides, per
//! the trigger matrix, whether to rebuild or answer empty.

use crate::ast::Decl;
use crate::binder::{self, NameMap, ParsedFile};
use crate::config::ConfigLog;
use crate::diag::{Severity, SourceDiagnostic};
use crate::parser;
use crate::paths::weakly_canonical;
use crate::span::LineIndex;
use crate::workspace::Workspace;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// One prepared input file: canonical path plus its effective text
pub struct SourceInput {
    pub path: PathBuf,
    pub text: String,
}

/// The frontend driver: lex, parse and bind a prepared file set
pub struct Compiler {
    /// Safe mode: files that fail to parse contribute no declarations
    pub skip_unparsed: bool,
}

impl Compiler {
    pub fn compile(&self, inputs: Vec<SourceInput>, active_file: PathBuf) -> CompileResult {
        let mut files = Vec::new();
        let mut line_indexes = HashMap::new();
        let mut asts = HashMap::new();
        let mut diagnostics = Vec::new();
        let mut parsed = Vec::new();
        let mut parsed_all = true;

        for input in inputs {
            let line_index = LineIndex::new(&input.text);
            let (decls, errors) = parser::parse(&input.text);
            let clean = errors.is_empty();
            if !clean {
                parsed_all = false;
            }
            for error in &errors {
                diagnostics.push(SourceDiagnostic {
                    file: input.path.clone(),
                    span: error.span(),
                    severity: Severity::Error,
                    message: error.to_string(),
                });
            }
            if clean || !self.skip_unparsed {
                parsed.push(ParsedFile { path: input.path.clone(), decls: decls.clone() });
            }
            asts.insert(input.path.clone(), decls);
            line_indexes.insert(input.path.clone(), line_index);
            files.push(input.path);
        }

        let (name_map, bind_diagnostics) = binder::bind(&parsed);
        diagnostics.extend(bind_diagnostics);

        CompileResult {
            files,
            active_file,
            name_map,
            asts,
            diagnostics,
            parsed_all,
            line_indexes,
        }
    }
}

/// The product of one frontend invocation
pub struct CompileResult {
    /// The compilation unit, in resolver order
    pub files: Vec<PathBuf>,
    /// The file whose request triggered this build
    pub active_file: PathBuf,
    pub name_map: NameMap,
    /// Parsed trees per file, kept for the AST debug request
    pub asts: HashMap<PathBuf, Vec<Decl>>,
    pub diagnostics: Vec<SourceDiagnostic>,
    /// Whether every file of the unit parsed without errors
    pub parsed_all: bool,
    line_indexes: HashMap<PathBuf, LineIndex>,
}

impl CompileResult {
    /// Whether requests about `path` can be served from this result
    pub fn covers(&self, path: &Path) -> bool {
        self.line_indexes.contains_key(path)
    }

    pub fn line_index(&self, path: &Path) -> Option<&LineIndex> {
        self.line_indexes.get(path)
    }

    /// Diagnostics grouped per file of the unit; files without diagnostics
    /// map to an empty list so stale editor markers get cleared
    pub fn diagnostics_by_file(&self) -> Vec<(&Path, Vec<&SourceDiagnostic>)> {
        let mut grouped: HashMap<&Path, Vec<&SourceDiagnostic>> = HashMap::new();
        for diag in &self.diagnostics {
            grouped.entry(diag.file.as_path()).or_default().push(diag);
        }
        self.files
            .iter()
            .map(|file| (file.as_path(), grouped.remove(file.as_path()).unwrap_or_default()))
            .collect()
    }
}

/// Failures surfaced to the LSP layer as request errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureError {
    #[error("file is not an Artic source file")]
    NotSourceFile,
    #[error("did not get a compilation result")]
    NoResult,
}

/// Owns the workspace and at most one compilation result
#[derive(Default)]
pub struct Orchestrator {
    workspace: Workspace,
    result: Option<CompileResult>,
    safe_mode: bool,
    generation: u64,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable safe mode; set from the `restartFromCrash` initialize option
    pub fn set_safe_mode(&mut self, on: bool) {
        self.safe_mode = on;
    }

    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    /// Bumped on every rebuild; lets tests observe result reuse
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn result(&self) -> Option<&CompileResult> {
        self.result.as_ref()
    }

    /// The cached result, if it covers `path`
    pub fn result_covering(&self, path: &Path) -> Option<&CompileResult> {
        let canonical = weakly_canonical(path);
        self.result.as_ref().filter(|r| r.covers(&canonical))
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    /// A source file was opened. Skipped when the current result already
    /// covers it: go-to-definition briefly opens documents, and rebuilding
    /// would invalidate the result the lookup is about to use.
    pub fn open_source(&mut self, path: &Path) -> Option<ConfigLog> {
        if self.result_covering(path).is_some() {
            return None;
        }
        Some(self.build(path))
    }

    /// A source file changed (full text sync): store the buffer, rebuild
    pub fn change_source(&mut self, path: &Path, text: String) -> ConfigLog {
        self.workspace.set_file_content(path, text);
        self.build(path)
    }

    /// A source file was closed: drop its buffer, the disk is authoritative
    pub fn close_source(&mut self, path: &Path) {
        self.workspace.mark_file_dirty(path);
    }

    /// A config file was opened, saved or changed. Tracked documents reload
    /// the workspace and invalidate the result without rebuilding eagerly;
    /// untracked ones are ignored.
    pub fn config_event(&mut self, path: &Path) -> Option<ConfigLog> {
        let mut log = ConfigLog::new();
        if self.workspace.on_config_changed(path, &mut log) {
            self.result = None;
            Some(log)
        } else {
            None
        }
    }

    /// Full reload: initialization, watched-file create/delete, or an
    /// explicit client command
    pub fn reload_workspace(&mut self) {
        self.workspace.reload();
        self.result = None;
    }

    /// Make sure the cached result covers `path`, rebuilding if needed.
    /// Returns the config log of a rebuild, `None` when the result was
    /// reused.
    pub fn ensure_result(&mut self, path: &Path) -> Result<Option<ConfigLog>, EnsureError> {
        if self.result_covering(path).is_some() {
            return Ok(None);
        }
        let log = self.build(path);
        if self.result.is_none() {
            return Err(EnsureError::NoResult);
        }
        Ok(Some(log))
    }

    /// Build for `path`: assemble the compile set, run the frontend, replace
    /// the cached result, and manage the safe-mode latch
    pub fn build(&mut self, path: &Path) -> ConfigLog {
        let mut log = ConfigLog::new();
        let active = weakly_canonical(path);
        let ids = self.workspace.collect_compile_unit(&active, &mut log);

        let mut inputs = Vec::new();
        for id in ids {
            match self.workspace.file_text(id) {
                Some(text) => {
                    inputs.push(SourceInput {
                        path: self.workspace.file_path(id).to_path_buf(),
                        text,
                    });
                }
                None => {
                    warn!(file = %self.workspace.file_path(id).display(), "cannot open file");
                }
            }
        }
        if inputs.is_empty() {
            info!("no input files to compile");
            return log;
        }

        info!(files = inputs.len(), safe_mode = self.safe_mode, "compiling");
        let compiler = Compiler { skip_unparsed: self.safe_mode };
        let result = compiler.compile(inputs, active);
        if self.safe_mode && result.parsed_all {
            info!("all files parsed, leaving safe mode");
            self.safe_mode = false;
        }
        self.generation += 1;
        self.result = Some(result);
        log
    }
}
