//! Semantic token collection and encoding
//!
//! Tokens come from the NameMap's declaration and reference sites. The
//! token type is decided by the declaration kind and refined by its
//! resolved type: anything with a function type renders as `function`, and
//! a function whose codomain is the no-return marker renders as `keyword`,
//! reflecting continuation-like usage.

use crate::binder::{DeclKind, Declaration};
use crate::compile::CompileResult;
use crate::lsp::utils::line_col_to_position;
use std::path::Path;
use tower_lsp::lsp_types::{
    SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend,
};

/// Token types advertised in the legend; indices match [`token_type`]
pub const TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::NAMESPACE,      // 0
    SemanticTokenType::TYPE,           // 1
    SemanticTokenType::CLASS,          // 2
    SemanticTokenType::ENUM,           // 3
    SemanticTokenType::INTERFACE,      // 4
    SemanticTokenType::STRUCT,         // 5
    SemanticTokenType::TYPE_PARAMETER, // 6
    SemanticTokenType::PARAMETER,      // 7
    SemanticTokenType::VARIABLE,       // 8
    SemanticTokenType::PROPERTY,       // 9
    SemanticTokenType::ENUM_MEMBER,    // 10
    SemanticTokenType::EVENT,          // 11
    SemanticTokenType::FUNCTION,       // 12
    SemanticTokenType::METHOD,         // 13
    SemanticTokenType::MACRO,          // 14
    SemanticTokenType::KEYWORD,        // 15
    SemanticTokenType::MODIFIER,       // 16
    SemanticTokenType::COMMENT,        // 17
    SemanticTokenType::STRING,         // 18
    SemanticTokenType::NUMBER,         // 19
    SemanticTokenType::REGEXP,         // 20
    SemanticTokenType::OPERATOR,       // 21
];

const TYPE_NAMESPACE: u32 = 0;
const TYPE_TYPE: u32 = 1;
const TYPE_ENUM: u32 = 3;
const TYPE_STRUCT: u32 = 5;
const TYPE_TYPE_PARAMETER: u32 = 6;
const TYPE_PARAMETER: u32 = 7;
const TYPE_VARIABLE: u32 = 8;
const TYPE_PROPERTY: u32 = 9;
const TYPE_ENUM_MEMBER: u32 = 10;
const TYPE_FUNCTION: u32 = 12;
const TYPE_KEYWORD: u32 = 15;

/// Token modifiers advertised in the legend; bit positions match the flags
pub const TOKEN_MODIFIERS: &[SemanticTokenModifier] = &[
    SemanticTokenModifier::DECLARATION,     // 1 << 0
    SemanticTokenModifier::DEFINITION,      // 1 << 1
    SemanticTokenModifier::READONLY,        // 1 << 2
    SemanticTokenModifier::STATIC,          // 1 << 3
    SemanticTokenModifier::DEPRECATED,      // 1 << 4
    SemanticTokenModifier::ABSTRACT,        // 1 << 5
    SemanticTokenModifier::ASYNC,           // 1 << 6
    SemanticTokenModifier::MODIFICATION,    // 1 << 7
    SemanticTokenModifier::DOCUMENTATION,   // 1 << 8
    SemanticTokenModifier::DEFAULT_LIBRARY, // 1 << 9
];

const MOD_DECLARATION: u32 = 1 << 0;
const MOD_DEFINITION: u32 = 1 << 1;
const MOD_READONLY: u32 = 1 << 2;
const MOD_STATIC: u32 = 1 << 3;

pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: TOKEN_TYPES.to_vec(),
        token_modifiers: TOKEN_MODIFIERS.to_vec(),
    }
}

/// Classify a declaration into (token type, modifier bits)
fn classify(decl: &Declaration, is_decl_site: bool) -> (u32, u32) {
    let mut token_type = match decl.kind {
        DeclKind::Fn => TYPE_FUNCTION,
        DeclKind::Struct => TYPE_STRUCT,
        DeclKind::Enum => TYPE_ENUM,
        DeclKind::Variant => TYPE_ENUM_MEMBER,
        DeclKind::Field => TYPE_PROPERTY,
        DeclKind::Mod | DeclKind::Use => TYPE_NAMESPACE,
        DeclKind::Static | DeclKind::Let => TYPE_VARIABLE,
        DeclKind::Param => TYPE_PARAMETER,
        DeclKind::TypeAlias => TYPE_TYPE,
        DeclKind::TypeParam => TYPE_TYPE_PARAMETER,
    };

    let mut modifiers = 0;
    if matches!(decl.kind, DeclKind::Static | DeclKind::Let | DeclKind::Param) && !decl.mutable {
        modifiers |= MOD_READONLY;
    }
    if decl.kind == DeclKind::Static {
        modifiers |= MOD_STATIC;
    }
    if is_decl_site {
        modifiers |= MOD_DECLARATION | MOD_DEFINITION;
    }

    // The resolved type refines the syntactic kind: values of function type
    // highlight as functions, continuations as keywords
    if decl.ty.is_fn() {
        token_type = TYPE_FUNCTION;
    }
    if decl.ty.is_continuation() {
        token_type = TYPE_KEYWORD;
    }

    (token_type, modifiers)
}

struct RawToken {
    line: u32,
    start: u32,
    length: u32,
    token_type: u32,
    modifiers: u32,
}

/// Collect the delta-encoded semantic tokens for one file of the result,
/// optionally restricted to a 0-based line range (inclusive)
pub fn collect(
    result: &CompileResult,
    path: &Path,
    line_range: Option<(u32, u32)>,
) -> Vec<SemanticToken> {
    let Some(index) = result.line_index(path) else {
        return Vec::new();
    };
    let in_range = |line: u32| match line_range {
        Some((start, end)) => line >= start && line <= end,
        None => true,
    };

    let mut tokens = Vec::new();
    let mut push = |span: crate::span::Span, decl: &Declaration, is_decl_site: bool| {
        let position = line_col_to_position(index.line_col(span.start));
        if !in_range(position.line) {
            return;
        }
        let (token_type, modifiers) = classify(decl, is_decl_site);
        tokens.push(RawToken {
            line: position.line,
            start: position.character,
            length: span.len() as u32,
            token_type,
            modifiers,
        });
    };

    for reference in result.name_map.refs_in(path) {
        push(reference.span, result.name_map.decl(reference.decl), false);
    }
    for (_, decl) in result.name_map.decls_in(path) {
        push(decl.span, decl, true);
    }

    encode(tokens)
}

/// Sort by (line, start) and delta-encode as the LSP wire format requires
fn encode(mut tokens: Vec<RawToken>) -> Vec<SemanticToken> {
    tokens.sort_by(|a, b| a.line.cmp(&b.line).then(a.start.cmp(&b.start)));

    let mut data = Vec::with_capacity(tokens.len());
    let mut prev_line = 0;
    let mut prev_start = 0;
    for token in tokens {
        let delta_line = token.line - prev_line;
        let delta_start = if delta_line == 0 { token.start - prev_start } else { token.start };
        data.push(SemanticToken {
            delta_line,
            delta_start,
            length: token.length,
            token_type: token.token_type,
            token_modifiers_bitset: token.modifiers,
        });
        prev_line = token.line;
        prev_start = token.start;
    }
    data
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
    fn test_tokens_are_delta_encoded_in_order() {
        let result = compile("fn one() {}\nfn two() -> i32 { one(); 2 }");
        let tokens = collect(&result, Path::new("/t/a.art"), None);
        assert!(!tokens.is_empty());
        // First token is absolute, the rest are deltas; every token on a new
        // line resets delta_start
        let mut line = 0;
        for token in &tokens {
            line += token.delta_line;
        }
        assert_eq!(line, 1);
    }

    #[test]
    fn test_function_declaration_and_reference() {
        let source = "fn one() {}\nfn two() { one() }";
        let result = compile(source);
        let tokens = collect(&result, Path::new("/t/a.art"), None);
        // one (decl), two (decl), one (ref)
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.token_type == TYPE_FUNCTION));
        let decl_sites = tokens
            .iter()
            .filter(|t| t.token_modifiers_bitset & MOD_DECLARATION != 0)
            .count();
        assert_eq!(decl_sites, 2);
    }

    #[test]
    fn test_continuation_renders_as_keyword() {
        let source = "fn run(exit: fn (i32) -> !) { exit(0) }";
        let result = compile(source);
        let tokens = collect(&result, Path::new("/t/a.art"), None);
        let keywords: Vec<_> =
            tokens.iter().filter(|t| t.token_type == TYPE_KEYWORD).collect();
        // the `exit` parameter declaration and its reference
        assert_eq!(keywords.len(), 2);
    }

    #[test]
    fn test_readonly_and_static_modifiers() {
        let source = "static mut COUNT: i64 = 0;\nfn f() { let x = 1; }";
        let result = compile(source);
        let tokens = collect(&result, Path::new("/t/a.art"), None);
        let statics: Vec<_> =
            tokens.iter().filter(|t| t.token_modifiers_bitset & MOD_STATIC != 0).collect();
        assert_eq!(statics.len(), 1);
        // COUNT is mutable, so not readonly
        assert_eq!(statics[0].token_modifiers_bitset & MOD_READONLY, 0);
        let readonly: Vec<_> =
            tokens.iter().filter(|t| t.token_modifiers_bitset & MOD_READONLY != 0).collect();
        assert_eq!(readonly.len(), 1); // the immutable `x`
    }

    #[test]
    fn test_range_filter() {
        let source = "fn one() {}\nfn two() {}";
        let result = compile(source);
        let all = collect(&result, Path::new("/t/a.art"), None);
        let first_line = collect(&result, Path::new("/t/a.art"), Some((0, 0)));
        assert_eq!(all.len(), 2);
        assert_eq!(first_line.len(), 1);
    }

    #[test]
    fn test_unknown_file_is_empty() {
        let result = compile("fn f() {}");
        assert!(collect(&result, Path::new("/t/other.art"), None).is_empty());
    }
}
