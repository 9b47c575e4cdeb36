//! Diagnostic primitives shared by the config log and the compile frontend

use crate::span::Span;
use std::fmt;
use std::path::PathBuf;

/// Diagnostic severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// A diagnostic produced by the compile frontend, tagged to a source span
#[derive(Debug, Clone)]
pub struct SourceDiagnostic {
    pub file: PathBuf,
    pub span: Span,
    pub severity: Severity,
    pub message: String,
}

impl SourceDiagnostic {
    pub fn error(file: PathBuf, span: Span, message: impl Into<String>) -> Self {
        Self {
            file,
            span,
            severity: Severity::Error,
            message: message.into(),
        }
    }
}
