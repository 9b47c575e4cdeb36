//! Artic Language Server
//!
//! A language server for the Artic language. Source files are grouped into
//! projects by declarative JSON configuration documents; the server resolves
//! which files belong together, compiles them as one unit with the bundled
//! frontend, and answers LSP requests from the cached result.
//!
//! # Architecture
//!
//! ```text
//! LSP client (stdio)
//!       │
//!       ▼
//! ┌─────────────┐
//! │ LSP adapter │  lsp/server.rs
//! └─────────────┘
//!       │
//!       ▼
//! ┌──────────────┐
//! │ Orchestrator │  compile.rs — at most one cached CompileResult
//! └──────────────┘
//!       │
//!       ▼
//! ┌──────────────┐      ┌────────────────────────┐
//! │  Workspace   │─────▶│ config.rs + glob.rs    │
//! │  resolver    │      │ (config graph, globs)  │
//! └──────────────┘      └────────────────────────┘
//!       │
//!       ▼
//! ┌──────────────┐
//! │   Frontend   │  lexer → parser → binder
//! └──────────────┘
//! ```

pub mod ast;
pub mod binder;
pub mod compile;
pub mod config;
pub mod crash;
pub mod diag;
pub mod glob;
pub mod lexer;
pub mod lsp;
pub mod parser;
pub mod paths;
pub mod span;
pub mod token;
pub mod ty;
pub mod workspace;

pub use span::Span;

/// Server version reported at initialize
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extensions recognized as Artic source files
pub const SOURCE_EXTENSIONS: &[&str] = &["art", "impala"];

/// Configuration file names probed in each directory, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[".artic-lsp", "artic.json"];
