//! Completion items
//!
//! Two contexts, decided by where the cursor is. At the top level the
//! interesting completions are declaration snippets; inside a function body
//! they are keywords, primitive types, the unit's module-level declarations
//! and the locals declared before the cursor.

use crate::ast::Decl;
use crate::binder::{DeclKind, Declaration};
use crate::compile::CompileResult;
use crate::ty::Ty;
use std::path::Path;
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, InsertTextFormat};

const KEYWORDS: &[&str] = &[
    "fn", "let", "mut", "if", "else", "match", "for", "while", "break", "continue", "return",
    "struct", "enum", "type", "static", "mod", "use", "as", "in", "true", "false",
];

const PRIM_TYPES: &[&str] =
    &["bool", "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f16", "f32", "f64"];

const TOP_LEVEL_SNIPPETS: &[(&str, &str, &str)] = &[
    ("fn", "Function Declaration", "fn ${1:name}($2) -> ${3:i32} {\n\t$0\n}"),
    ("struct", "Struct Declaration", "struct ${1:Name} {\n\t$0\n}"),
    ("enum", "Enum Declaration", "enum ${1:Name} {\n\t$0\n}"),
    ("mod", "Module Declaration", "mod ${1:name} {\n\t$0\n}"),
    ("static", "Static Declaration", "static ${1:NAME} = ${2:value};$0"),
    ("type", "Type Alias Declaration", "type ${1:Name} = ${2:i32};$0"),
    ("use", "Use Declaration", "use ${1:path} as ${2:alias};$0"),
];

/// Build the completion list for a cursor position
pub fn completions(result: &CompileResult, path: &Path, offset: usize) -> Vec<CompletionItem> {
    let mut items = Vec::new();

    if at_top_level(result, path, offset) {
        for (label, detail, snippet) in TOP_LEVEL_SNIPPETS {
            items.push(CompletionItem {
                label: (*label).to_string(),
                kind: Some(CompletionItemKind::KEYWORD),
                detail: Some((*detail).to_string()),
                insert_text: Some((*snippet).to_string()),
                insert_text_format: Some(InsertTextFormat::SNIPPET),
                ..Default::default()
            });
        }
        return items;
    }

    for keyword in KEYWORDS {
        items.push(CompletionItem {
            label: (*keyword).to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            sort_text: Some(format!("2_{}", keyword)),
            ..Default::default()
        });
    }
    for prim in PRIM_TYPES {
        items.push(CompletionItem {
            label: (*prim).to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            sort_text: Some(format!("2_{}", prim)),
            ..Default::default()
        });
    }

    // Module-level declarations across the whole unit
    for (_, decl) in result.name_map.all_decls() {
        if !decl.top_level || matches!(decl.kind, DeclKind::Field) {
            continue;
        }
        items.push(decl_item(decl, "1_"));
    }

    // Locals of this file declared before the cursor
    for (_, decl) in result.name_map.decls_in(path) {
        if decl.top_level || !matches!(decl.kind, DeclKind::Let | DeclKind::Param | DeclKind::TypeParam)
        {
            continue;
        }
        if decl.span.start < offset {
            items.push(decl_item(decl, "0_"));
        }
    }

    items
}

/// Whether the cursor is outside every function body
fn at_top_level(result: &CompileResult, path: &Path, offset: usize) -> bool {
    let Some(decls) = result.asts.get(path) else {
        return false;
    };
    !decls_contain(decls, offset)
}

fn decls_contain(decls: &[Decl], offset: usize) -> bool {
    decls.iter().any(|decl| match decl {
        Decl::Fn(f) => f.span.contains(offset),
        Decl::Static(s) => s.span.contains(offset),
        Decl::Mod(m) => decls_contain(&m.decls, offset),
        _ => false,
    })
}

fn decl_item(decl: &Declaration, sort_prefix: &str) -> CompletionItem {
    let detail = match &decl.ty {
        Ty::Unknown => None,
        ty => Some(ty.to_string()),
    };
    CompletionItem {
        label: decl.name.clone(),
        kind: Some(completion_kind(decl.kind)),
        detail,
        sort_text: Some(format!("{}{}", sort_prefix, decl.name)),
        ..Default::default()
    }
}

fn completion_kind(kind: DeclKind) -> CompletionItemKind {
    match kind {
        DeclKind::Fn => CompletionItemKind::FUNCTION,
        DeclKind::Struct => CompletionItemKind::STRUCT,
        DeclKind::Enum => CompletionItemKind::ENUM,
        DeclKind::Variant => CompletionItemKind::ENUM_MEMBER,
        DeclKind::Field => CompletionItemKind::FIELD,
        DeclKind::Mod | DeclKind::Use => CompletionItemKind::MODULE,
        DeclKind::Static | DeclKind::Let => CompletionItemKind::VARIABLE,
        DeclKind::Param => CompletionItemKind::VARIABLE,
        DeclKind::TypeAlias | DeclKind::TypeParam => CompletionItemKind::TYPE_PARAMETER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{Compiler, SourceInput};
    use std::path::PathBuf;

    fn compile(source: &str) -> CompileResult {
        let path = PathBuf::from("/t/a.art");
        let compiler = Compiler { skip_unparsed: false };
        compiler.compile(
            vec![SourceInput { path: path.clone(), text: source.to_string() }],
            path,
        )
    }

    #[test]
    fn test_top_level_offers_snippets() {
        let source = "fn f() {}\n";
        let result = compile(source);
        let items = completions(&result, Path::new("/t/a.art"), source.len());
        assert!(items.iter().any(|i| i.label == "fn"
            && i.insert_text_format == Some(InsertTextFormat::SNIPPET)));
        assert!(items.iter().all(|i| i.kind == Some(CompletionItemKind::KEYWORD)));
    }

    #[test]
    fn test_body_offers_module_decls_and_locals() {
        let source = "fn helper() {}\nfn f(a: i32) { let b = 1; b }";
        let result = compile(source);
        let cursor = source.rfind("b }").unwrap() + 1;
        let items = completions(&result, Path::new("/t/a.art"), cursor);
        assert!(items.iter().any(|i| i.label == "helper"));
        assert!(items.iter().any(|i| i.label == "a"));
        assert!(items.iter().any(|i| i.label == "b"));
        assert!(items.iter().any(|i| i.label == "let"));
        assert!(items.iter().any(|i| i.label == "i32"));
    }

    #[test]
    fn test_locals_after_cursor_are_hidden() {
        let source = "fn f() { let early = 1; early; let late = 2; late }";
        let result = compile(source);
        let cursor = source.find("early;").unwrap();
        let items = completions(&result, Path::new("/t/a.art"), cursor);
        assert!(items.iter().any(|i| i.label == "early"));
        assert!(!items.iter().any(|i| i.label == "late"));
    }

    #[test]
    fn test_function_detail_shows_signature() {
        let source = "fn add(a: i32, b: i32) -> i32 { a + b }\nfn f() { add(1, 2) }";
        let result = compile(source);
        let cursor = source.rfind("add").unwrap();
        let items = completions(&result, Path::new("/t/a.art"), cursor);
        let add = items.iter().find(|i| i.label == "add").unwrap();
        assert_eq!(add.detail.as_deref(), Some("fn (i32, i32) -> i32"));
    }
}
