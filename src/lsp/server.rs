//! The language server
//!
//! Translates LSP requests and notifications into orchestrator operations.
//! All mutable state sits behind one FIFO mutex that each handler holds for
//! its whole body: messages are processed to completion in arrival order,
//! which is what lets semantic-token and inlay-hint requests trust the
//! result produced by the didChange right before them.

use crate::compile::{EnsureError, Orchestrator};
use crate::config::ConfigLog;
use crate::lsp::utils::{
    file_kind, line_col_to_position, literal_ranges, position_to_offset, severity_to_lsp,
    span_to_range, FileKind,
};
use crate::lsp::{completion, semantic_tokens};
use crate::paths::weakly_canonical;
use crate::span::Span;
use crate::VERSION;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::debug;

/// Run the server over stdio until the client disconnects
pub async fn run_stdio() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let (service, socket) = LspService::build(Backend::new)
        .custom_method("artic/debugAst", Backend::debug_ast)
        .finish();
    Server::new(stdin, stdout, socket).serve(service).await;
}

struct ServerState {
    orchestrator: Orchestrator,
    /// Config files currently showing diagnostics, so stale ones get cleared
    published_configs: HashSet<PathBuf>,
}

pub struct Backend {
    client: Client,
    state: Mutex<ServerState>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: Mutex::new(ServerState {
                orchestrator: Orchestrator::new(),
                published_configs: HashSet::new(),
            }),
        }
    }

    // ---- diagnostics ----

    /// One publication per file of the just-executed compile set; files
    /// without diagnostics get an empty list to clear stale markers
    async fn publish_compile_diagnostics(&self, state: &ServerState) {
        let Some(result) = state.orchestrator.result() else { return };
        for (file, diags) in result.diagnostics_by_file() {
            let Some(index) = result.line_index(file) else { continue };
            let Ok(uri) = Url::from_file_path(file) else { continue };
            let diagnostics = diags
                .iter()
                .map(|d| Diagnostic {
                    range: span_to_range(index, d.span),
                    severity: Some(severity_to_lsp(d.severity)),
                    source: Some("artic".to_string()),
                    message: d.message.clone(),
                    ..Default::default()
                })
                .collect();
            self.client.publish_diagnostics(uri, diagnostics, None).await;
        }
    }

    /// Expand each message's literal context into character ranges by
    /// scanning the referenced document, falling back to the document start
    async fn publish_config_diagnostics(&self, state: &mut ServerState, log: &ConfigLog) {
        let mut grouped: HashMap<PathBuf, Vec<Diagnostic>> = HashMap::new();
        let mut texts: HashMap<PathBuf, String> = HashMap::new();

        for message in &log.messages {
            if message.file.as_os_str().is_empty() {
                continue;
            }
            let text = texts
                .entry(message.file.clone())
                .or_insert_with(|| std::fs::read_to_string(&message.file).unwrap_or_default());

            let base = Diagnostic {
                range: Range::default(),
                severity: Some(severity_to_lsp(message.severity)),
                source: Some("artic-config".to_string()),
                message: message.message.clone(),
                ..Default::default()
            };
            let ranges = message
                .context
                .as_deref()
                .map(|literal| literal_ranges(text, literal))
                .unwrap_or_default();

            let entry = grouped.entry(message.file.clone()).or_default();
            if ranges.is_empty() {
                entry.push(base);
            } else {
                for range in ranges {
                    entry.push(Diagnostic { range, ..base.clone() });
                }
            }
        }

        let current: HashSet<PathBuf> = grouped.keys().cloned().collect();
        for (file, diagnostics) in grouped {
            if let Ok(uri) = Url::from_file_path(&file) {
                self.client.publish_diagnostics(uri, diagnostics, None).await;
            }
        }
        for stale in state.published_configs.difference(&current) {
            if let Ok(uri) = Url::from_file_path(stale) {
                self.client.publish_diagnostics(uri, Vec::new(), None).await;
            }
        }
        state.published_configs = current;
    }

    // ---- compilation ----

    /// Make the cached result cover `path`, publishing the diagnostics of a
    /// rebuild; request-level errors map to LSP error responses
    async fn ensure_compiled(&self, state: &mut ServerState, path: &Path) -> Result<()> {
        if file_kind(path) != FileKind::Source {
            return Err(Error::invalid_params("file is not an Artic source file"));
        }
        match state.orchestrator.ensure_result(path) {
            Ok(None) => Ok(()),
            Ok(Some(log)) => {
                self.publish_config_diagnostics(state, &log).await;
                self.publish_compile_diagnostics(state).await;
                Ok(())
            }
            Err(EnsureError::NotSourceFile) => {
                Err(Error::invalid_params("file is not an Artic source file"))
            }
            Err(EnsureError::NoResult) => Err(Error {
                code: ErrorCode::InternalError,
                message: "did not get a compilation result".into(),
                data: None,
            }),
        }
    }

    async fn rebuild_source(&self, state: &mut ServerState, path: &Path, text: Option<String>) {
        let log = match text {
            Some(text) => state.orchestrator.change_source(path, text),
            None => match state.orchestrator.open_source(path) {
                Some(log) => log,
                // Already covered: opening must not invalidate the result a
                // pending definition lookup is about to use
                None => return,
            },
        };
        self.publish_config_diagnostics(state, &log).await;
        self.publish_compile_diagnostics(state).await;
    }

    async fn config_changed(&self, state: &mut ServerState, path: &Path) {
        if let Some(log) = state.orchestrator.config_event(path) {
            self.publish_config_diagnostics(state, &log).await;
        }
    }

    // ---- symbol lookup ----

    fn occurrences(
        state: &ServerState,
        path: &Path,
        offset: usize,
        include_declaration: bool,
    ) -> Option<Occurrences> {
        let result = state.orchestrator.result()?;
        let map = &result.name_map;

        let (cursor_span, decl_id) = match map.find_ref_at(path, offset) {
            Some(reference) => (reference.span, reference.decl),
            None => {
                let id = map.find_decl_at(path, offset)?;
                (map.decl(id).span, id)
            }
        };
        let decl = map.decl(decl_id);
        let decl_path = map.path_of(decl.file).to_path_buf();
        let decl_location = location(result, &decl_path, decl.span)?;

        let mut all = Vec::new();
        if include_declaration {
            all.push(decl_location.clone());
        }
        for reference in map.refs_of(decl_id) {
            let ref_path = map.path_of(reference.file).to_path_buf();
            if let Some(loc) = location(result, &ref_path, reference.span) {
                all.push(loc);
            }
        }

        let index = result.line_index(path)?;
        Some(Occurrences {
            name: decl.name.clone(),
            decl_location,
            cursor_range: span_to_range(index, cursor_span),
            all,
        })
    }

    /// Custom request `artic/debugAst`: the parsed declaration at the cursor
    pub async fn debug_ast(&self, params: TextDocumentPositionParams) -> Result<Option<String>> {
        let path = uri_path(&params.text_document.uri)?;
        let mut state = self.state.lock().await;
        self.ensure_compiled(&mut state, &path).await?;

        let canonical = weakly_canonical(&path);
        let Some(result) = state.orchestrator.result_covering(&canonical) else {
            return Ok(None);
        };
        let Some(index) = result.line_index(&canonical) else { return Ok(None) };
        let offset = position_to_offset(index, params.position);

        let Some(decls) = result.asts.get(&canonical) else { return Ok(None) };
        let found = decls.iter().find(|d| d.span().contains(offset));
        Ok(found.map(|decl| format!("{:#?}", decl)))
    }
}

struct Occurrences {
    name: String,
    decl_location: Location,
    cursor_range: Range,
    all: Vec<Location>,
}

fn uri_path(uri: &Url) -> Result<PathBuf> {
    uri.to_file_path().map_err(|_| Error::invalid_params("unsupported URI"))
}

fn location(result: &crate::compile::CompileResult, file: &Path, span: Span) -> Option<Location> {
    let index = result.line_index(file)?;
    let uri = Url::from_file_path(file).ok()?;
    Some(Location { uri, range: span_to_range(index, span) })
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let restart_from_crash = params
            .initialization_options
            .as_ref()
            .and_then(|options| options.get("restartFromCrash"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut state = self.state.lock().await;
        state.orchestrator.set_safe_mode(restart_from_crash);

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "Artic Language Server".to_string(),
                version: Some(VERSION.to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(false),
                        })),
                        ..Default::default()
                    },
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string(), ":".to_string()]),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Right(RenameOptions {
                    prepare_provider: Some(true),
                    work_done_progress_options: Default::default(),
                })),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: semantic_tokens::legend(),
                            range: Some(true),
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            work_done_progress_options: Default::default(),
                        },
                    ),
                ),
                inlay_hint_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        let mut state = self.state.lock().await;
        state.orchestrator.reload_workspace();
        self.client
            .log_message(MessageType::INFO, "Artic language server initialized")
            .await;
        if state.orchestrator.safe_mode() {
            self.client
                .show_message(
                    MessageType::WARNING,
                    "artic-ls restarted after a crash; the first compile skips files that fail to parse",
                )
                .await;
        }
    }

    async fn shutdown(&self) -> Result<()> {
        debug!("shutdown requested");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let Ok(path) = params.text_document.uri.to_file_path() else { return };
        debug!(file = %path.display(), "did_open");
        let mut state = self.state.lock().await;
        match file_kind(&path) {
            FileKind::Source => self.rebuild_source(&mut state, &path, None).await,
            FileKind::Config => self.config_changed(&mut state, &path).await,
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Ok(path) = params.text_document.uri.to_file_path() else { return };
        if file_kind(&path) == FileKind::Config {
            // Config edits take effect on save
            return;
        }
        let Some(change) = params.content_changes.into_iter().next() else { return };
        debug!(file = %path.display(), "did_change");
        let mut state = self.state.lock().await;
        self.rebuild_source(&mut state, &path, Some(change.text)).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Ok(path) = params.text_document.uri.to_file_path() else { return };
        if file_kind(&path) == FileKind::Config {
            let mut state = self.state.lock().await;
            self.config_changed(&mut state, &path).await;
        }
        // Source saves are no-ops: didChange already updated the buffer
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let Ok(path) = params.text_document.uri.to_file_path() else { return };
        if file_kind(&path) == FileKind::Source {
            let mut state = self.state.lock().await;
            state.orchestrator.close_source(&path);
        }
    }

    async fn did_change_configuration(&self, _params: DidChangeConfigurationParams) {
        let mut state = self.state.lock().await;
        state.orchestrator.reload_workspace();
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        for change in params.changes {
            let Ok(path) = change.uri.to_file_path() else { continue };
            if change.typ == FileChangeType::CREATED || change.typ == FileChangeType::DELETED {
                let mut state = self.state.lock().await;
                state.orchestrator.reload_workspace();
                return;
            }
            if change.typ == FileChangeType::CHANGED && file_kind(&path) == FileKind::Config {
                let mut state = self.state.lock().await;
                self.config_changed(&mut state, &path).await;
            }
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let path = uri_path(&params.text_document_position_params.text_document.uri)?;
        let mut state = self.state.lock().await;
        self.ensure_compiled(&mut state, &path).await?;

        let canonical = weakly_canonical(&path);
        let Some(result) = state.orchestrator.result() else { return Ok(None) };
        let Some(index) = result.line_index(&canonical) else { return Ok(None) };
        let offset = position_to_offset(index, params.text_document_position_params.position);

        // On a reference: jump to the declaration
        if result.name_map.find_ref_at(&canonical, offset).is_some() {
            let occ = Self::occurrences(&state, &canonical, offset, false);
            return Ok(occ.map(|o| GotoDefinitionResponse::Scalar(o.decl_location)));
        }
        // On a declaration: list its references
        match Self::occurrences(&state, &canonical, offset, false) {
            Some(occ) if occ.all.is_empty() => {
                Ok(Some(GotoDefinitionResponse::Scalar(occ.decl_location)))
            }
            Some(occ) => Ok(Some(GotoDefinitionResponse::Array(occ.all))),
            None => Ok(None),
        }
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let path = uri_path(&params.text_document_position.text_document.uri)?;
        let mut state = self.state.lock().await;
        self.ensure_compiled(&mut state, &path).await?;

        let canonical = weakly_canonical(&path);
        let Some(result) = state.orchestrator.result() else { return Ok(None) };
        let Some(index) = result.line_index(&canonical) else { return Ok(None) };
        let offset = position_to_offset(index, params.text_document_position.position);

        let occ = Self::occurrences(
            &state,
            &canonical,
            offset,
            params.context.include_declaration,
        );
        Ok(occ.map(|o| o.all))
    }

    async fn prepare_rename(
        &self,
        params: TextDocumentPositionParams,
    ) -> Result<Option<PrepareRenameResponse>> {
        let path = uri_path(&params.text_document.uri)?;
        let mut state = self.state.lock().await;
        self.ensure_compiled(&mut state, &path).await?;

        let canonical = weakly_canonical(&path);
        let Some(result) = state.orchestrator.result() else { return Ok(None) };
        let Some(index) = result.line_index(&canonical) else { return Ok(None) };
        let offset = position_to_offset(index, params.position);

        Ok(Self::occurrences(&state, &canonical, offset, true).map(|occ| {
            PrepareRenameResponse::RangeWithPlaceholder {
                range: occ.cursor_range,
                placeholder: occ.name,
            }
        }))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let path = uri_path(&params.text_document_position.text_document.uri)?;
        let mut state = self.state.lock().await;
        self.ensure_compiled(&mut state, &path).await?;

        let canonical = weakly_canonical(&path);
        let Some(result) = state.orchestrator.result() else { return Ok(None) };
        let Some(index) = result.line_index(&canonical) else { return Ok(None) };
        let offset = position_to_offset(index, params.text_document_position.position);

        let Some(occ) = Self::occurrences(&state, &canonical, offset, true) else {
            return Ok(None);
        };
        let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();
        for loc in occ.all {
            changes
                .entry(loc.uri)
                .or_default()
                .push(TextEdit { range: loc.range, new_text: params.new_name.clone() });
        }
        Ok(Some(WorkspaceEdit { changes: Some(changes), ..Default::default() }))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let path = uri_path(&params.text_document_position.text_document.uri)?;
        let mut state = self.state.lock().await;
        self.ensure_compiled(&mut state, &path).await?;

        let canonical = weakly_canonical(&path);
        let Some(result) = state.orchestrator.result() else { return Ok(None) };
        let Some(index) = result.line_index(&canonical) else { return Ok(None) };
        let offset = position_to_offset(index, params.text_document_position.position);

        let items = completion::completions(result, &canonical, offset);
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let path = uri_path(&params.text_document.uri)?;
        let state = self.state.lock().await;
        // Never compiles: this request arrives right after a didChange and
        // must not invalidate the result the client is asking about
        let canonical = weakly_canonical(&path);
        let Some(result) = state.orchestrator.result_covering(&canonical) else {
            return Ok(None);
        };
        let data = semantic_tokens::collect(result, &canonical, None);
        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens { result_id: None, data })))
    }

    async fn semantic_tokens_range(
        &self,
        params: SemanticTokensRangeParams,
    ) -> Result<Option<SemanticTokensRangeResult>> {
        let path = uri_path(&params.text_document.uri)?;
        let state = self.state.lock().await;
        let canonical = weakly_canonical(&path);
        let Some(result) = state.orchestrator.result_covering(&canonical) else {
            return Ok(None);
        };
        let range = (params.range.start.line, params.range.end.line);
        let data = semantic_tokens::collect(result, &canonical, Some(range));
        Ok(Some(SemanticTokensRangeResult::Tokens(SemanticTokens { result_id: None, data })))
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> Result<Option<Vec<InlayHint>>> {
        let path = uri_path(&params.text_document.uri)?;
        let state = self.state.lock().await;
        // Same discipline as semantic tokens: reuse or answer empty
        let canonical = weakly_canonical(&path);
        let Some(result) = state.orchestrator.result_covering(&canonical) else {
            return Ok(None);
        };
        let Some(index) = result.line_index(&canonical) else { return Ok(None) };

        let mut hints = Vec::new();
        for hint in result.name_map.hints_in(&canonical) {
            let position = line_col_to_position(index.line_col(hint.span.end));
            if position < params.range.start || position > params.range.end {
                continue;
            }
            hints.push(InlayHint {
                position,
                label: InlayHintLabel::String(format!(": {}", hint.ty)),
                kind: Some(InlayHintKind::TYPE),
                text_edits: None,
                tooltip: None,
                padding_left: Some(false),
                padding_right: Some(true),
                data: None,
            });
        }
        Ok(Some(hints))
    }
}
