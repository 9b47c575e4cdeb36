//! Abstract syntax tree for the Artic frontend
//!
//! Declarations are a closed set of variants; the binder and the LSP
//! features branch over them with exhaustive matches.

use crate::span::Span;

/// An identifier with its source span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), span }
    }
}

/// A `::`-separated path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<Ident>,
    pub span: Span,
}

impl Path {
    /// The last segment, which names the referenced item
    pub fn last(&self) -> &Ident {
        self.segments.last().expect("path has at least one segment")
    }
}

// ============ Declarations ============

#[derive(Debug, Clone)]
pub enum Decl {
    Fn(FnDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Mod(ModDecl),
    Static(StaticDecl),
    TypeAlias(TypeAliasDecl),
    Use(UseDecl),
    /// Placeholder emitted during error recovery
    Error(Span),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Fn(d) => d.span,
            Decl::Struct(d) => d.span,
            Decl::Enum(d) => d.span,
            Decl::Mod(d) => d.span,
            Decl::Static(d) => d.span,
            Decl::TypeAlias(d) => d.span,
            Decl::Use(d) => d.span,
            Decl::Error(span) => *span,
        }
    }

    /// The declared name, if the declaration has one
    pub fn ident(&self) -> Option<&Ident> {
        match self {
            Decl::Fn(d) => Some(&d.ident),
            Decl::Struct(d) => Some(&d.ident),
            Decl::Enum(d) => Some(&d.ident),
            Decl::Mod(d) => Some(&d.ident),
            Decl::Static(d) => Some(&d.ident),
            Decl::TypeAlias(d) => Some(&d.ident),
            Decl::Use(d) => d.alias.as_ref(),
            Decl::Error(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FnDecl {
    pub ident: Ident,
    pub type_params: Vec<Ident>,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub ident: Ident,
    pub mutable: bool,
    pub ty: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub ident: Ident,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub ident: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub ident: Ident,
    pub variants: Vec<VariantDecl>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VariantDecl {
    pub ident: Ident,
    pub fields: Vec<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ModDecl {
    pub ident: Ident,
    pub decls: Vec<Decl>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StaticDecl {
    pub ident: Ident,
    pub mutable: bool,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub ident: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct UseDecl {
    pub path: Path,
    pub alias: Option<Ident>,
    pub span: Span,
}

// ============ Type expressions ============

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    Prim(crate::ty::PrimTy),
    Path(Path),
    Fn { params: Vec<TypeExpr>, ret: Box<TypeExpr> },
    Tuple(Vec<TypeExpr>),
    Array(Box<TypeExpr>),
    /// The no-return marker `!`
    NoRet,
    Unit,
}

// ============ Expressions ============

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Path(Path),
    Literal(Literal),
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Proj { base: Box<Expr>, field: Ident },
    Index { base: Box<Expr>, index: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Assign { lhs: Box<Expr>, rhs: Box<Expr> },
    Tuple(Vec<Expr>),
    Block(Block),
    If { cond: Box<Expr>, then: Box<Expr>, els: Option<Box<Expr>> },
    Match { scrutinee: Box<Expr>, arms: Vec<MatchArm> },
    While { cond: Box<Expr>, body: Box<Expr> },
    For { binding: Pattern, iter: Box<Expr>, body: Box<Expr> },
    Return(Option<Box<Expr>>),
    Break,
    Continue,
    /// Placeholder emitted during error recovery
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Int,
    Float,
    Str,
    Char,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let(LetStmt),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct LetStmt {
    pub pattern: Pattern,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum PatternKind {
    /// A binding pattern, optionally `mut`
    Binding { ident: Ident, mutable: bool },
    Wildcard,
    Literal(Literal),
    Tuple(Vec<Pattern>),
    /// An enum-variant pattern: `Color::Red(r)`
    Variant { path: Path, fields: Vec<Pattern> },
}

impl Pattern {
    /// Collect every binding introduced by this pattern
    pub fn bindings(&self) -> Vec<(&Ident, bool)> {
        let mut out = Vec::new();
        self.collect_bindings(&mut out);
        out
    }

    fn collect_bindings<'a>(&'a self, out: &mut Vec<(&'a Ident, bool)>) {
        match &self.kind {
            PatternKind::Binding { ident, mutable } => out.push((ident, *mutable)),
            PatternKind::Tuple(elems) => {
                for e in elems {
                    e.collect_bindings(out);
                }
            }
            PatternKind::Variant { fields, .. } => {
                for f in fields {
                    f.collect_bindings(out);
                }
            }
            PatternKind::Wildcard | PatternKind::Literal(_) => {}
        }
    }
}
