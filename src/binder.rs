//! Name binder
//!
//! Builds the [`NameMap`] for a compilation unit: every declaration site,
//! every reference back to its declaration, and the type-hint sites for
//! un-annotated `let` bindings. Top-level declarations of all files in the
//! unit share one module scope, so a reference in one file resolves to a
//! declaration in a sibling file.

use crate::ast::*;
use crate::diag::{Severity, SourceDiagnostic};
use crate::span::Span;
use crate::ty::{PrimTy, Ty};
use std::collections::HashMap;
use std::path::{Path as FsPath, PathBuf};

/// Handle to a declaration in the [`NameMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

/// What kind of thing a declaration is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Fn,
    Struct,
    Enum,
    Variant,
    Field,
    Mod,
    Static,
    Let,
    Param,
    TypeAlias,
    TypeParam,
    Use,
}

/// A declaration site
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    /// Index into [`NameMap::files`]
    pub file: usize,
    /// Span of the declared identifier
    pub span: Span,
    pub kind: DeclKind,
    pub mutable: bool,
    pub top_level: bool,
    pub ty: Ty,
}

/// A reference site pointing back at its declaration
#[derive(Debug, Clone)]
pub struct Reference {
    pub file: usize,
    pub span: Span,
    pub decl: DeclId,
}

/// A site where an inferred type should be shown as an inlay hint
#[derive(Debug, Clone)]
pub struct TypeHint {
    pub file: usize,
    pub span: Span,
    pub ty: Ty,
}

#[derive(Debug, Default)]
struct FileNames {
    decls: Vec<DeclId>,
    refs: Vec<usize>,
    hints: Vec<usize>,
}

/// The symbol map of one compilation unit
#[derive(Debug, Default)]
pub struct NameMap {
    files: Vec<PathBuf>,
    file_index: HashMap<PathBuf, usize>,
    decls: Vec<Declaration>,
    refs: Vec<Reference>,
    hints: Vec<TypeHint>,
    per_file: Vec<FileNames>,
}

impl NameMap {
    pub fn file_id(&self, path: &FsPath) -> Option<usize> {
        self.file_index.get(path).copied()
    }

    pub fn contains_file(&self, path: &FsPath) -> bool {
        self.file_index.contains_key(path)
    }

    pub fn path_of(&self, file: usize) -> &FsPath {
        &self.files[file]
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.0 as usize]
    }

    /// All declarations, with their handles
    pub fn all_decls(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls.iter().enumerate().map(|(i, d)| (DeclId(i as u32), d))
    }

    /// Declarations whose identifier lives in the given file
    pub fn decls_in(&self, path: &FsPath) -> impl Iterator<Item = (DeclId, &Declaration)> {
        let ids = self
            .file_id(path)
            .map(|f| self.per_file[f].decls.as_slice())
            .unwrap_or(&[]);
        ids.iter().map(move |&id| (id, self.decl(id)))
    }

    /// References whose site lives in the given file
    pub fn refs_in(&self, path: &FsPath) -> impl Iterator<Item = &Reference> {
        let ids = self
            .file_id(path)
            .map(|f| self.per_file[f].refs.as_slice())
            .unwrap_or(&[]);
        ids.iter().map(move |&i| &self.refs[i])
    }

    /// Type-hint sites in the given file
    pub fn hints_in(&self, path: &FsPath) -> impl Iterator<Item = &TypeHint> {
        let ids = self
            .file_id(path)
            .map(|f| self.per_file[f].hints.as_slice())
            .unwrap_or(&[]);
        ids.iter().map(move |&i| &self.hints[i])
    }

    /// Find the declaration whose identifier contains the given offset
    pub fn find_decl_at(&self, path: &FsPath, offset: usize) -> Option<DeclId> {
        self.decls_in(path)
            .find(|(_, d)| d.span.contains(offset))
            .map(|(id, _)| id)
    }

    /// Find the reference whose span contains the given offset
    pub fn find_ref_at(&self, path: &FsPath, offset: usize) -> Option<&Reference> {
        self.refs_in(path).find(|r| r.span.contains(offset))
    }

    /// All reference sites of a declaration, across every file of the unit
    pub fn refs_of(&self, id: DeclId) -> impl Iterator<Item = &Reference> {
        self.refs.iter().filter(move |r| r.decl == id)
    }

    fn add_file(&mut self, path: PathBuf) -> usize {
        let index = self.files.len();
        self.file_index.insert(path.clone(), index);
        self.files.push(path);
        self.per_file.push(FileNames::default());
        index
    }

    fn add_decl(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.per_file[decl.file].decls.push(id);
        self.decls.push(decl);
        id
    }

    fn add_ref(&mut self, reference: Reference) {
        self.per_file[reference.file].refs.push(self.refs.len());
        self.refs.push(reference);
    }

    fn add_hint(&mut self, hint: TypeHint) {
        self.per_file[hint.file].hints.push(self.hints.len());
        self.hints.push(hint);
    }
}

/// One parsed file of the compilation unit
pub struct ParsedFile {
    pub path: PathBuf,
    pub decls: Vec<Decl>,
}

/// Bind every file of a compilation unit into one NameMap
pub fn bind(files: &[ParsedFile]) -> (NameMap, Vec<SourceDiagnostic>) {
    let mut binder = Binder {
        map: NameMap::default(),
        diagnostics: Vec::new(),
        module_scope: HashMap::new(),
        scopes: Vec::new(),
        current_file: 0,
    };

    for file in files {
        binder.map.add_file(file.path.clone());
    }

    // Pass 1: collect every top-level declaration into the shared module scope
    for (index, file) in files.iter().enumerate() {
        binder.current_file = index;
        for decl in &file.decls {
            binder.declare_top_level(decl);
        }
    }

    // Pass 2: walk bodies and type annotations, resolving references
    for (index, file) in files.iter().enumerate() {
        binder.current_file = index;
        for decl in &file.decls {
            binder.resolve_decl(decl);
        }
    }

    (binder.map, binder.diagnostics)
}

struct Binder {
    map: NameMap,
    diagnostics: Vec<SourceDiagnostic>,
    /// Top-level names merged across every file of the unit
    module_scope: HashMap<String, DeclId>,
    /// Lexical scopes inside the declaration currently being resolved
    scopes: Vec<HashMap<String, DeclId>>,
    current_file: usize,
}

impl Binder {
    fn error(&mut self, span: Span, message: String) {
        self.diagnostics.push(SourceDiagnostic {
            file: self.map.files[self.current_file].clone(),
            span,
            severity: Severity::Error,
            message,
        });
    }

    // ---- pass 1: declarations ----

    fn declare_top_level(&mut self, decl: &Decl) {
        match decl {
            Decl::Fn(f) => {
                let ty = fn_signature(f);
                self.declare(&f.ident, DeclKind::Fn, false, true, ty);
            }
            Decl::Struct(s) => {
                self.declare(&s.ident, DeclKind::Struct, false, true, Ty::Named(s.ident.name.clone()));
                for field in &s.fields {
                    self.declare(&field.ident, DeclKind::Field, false, false, lower_type(&field.ty));
                }
            }
            Decl::Enum(e) => {
                self.declare(&e.ident, DeclKind::Enum, false, true, Ty::Named(e.ident.name.clone()));
                for variant in &e.variants {
                    let ty = if variant.fields.is_empty() {
                        Ty::Named(e.ident.name.clone())
                    } else {
                        Ty::Fn {
                            params: variant.fields.iter().map(lower_type).collect(),
                            ret: Box::new(Ty::Named(e.ident.name.clone())),
                        }
                    };
                    self.declare(&variant.ident, DeclKind::Variant, false, true, ty);
                }
            }
            Decl::Mod(m) => {
                self.declare(&m.ident, DeclKind::Mod, false, true, Ty::Unknown);
                for inner in &m.decls {
                    self.declare_top_level(inner);
                }
            }
            Decl::Static(s) => {
                let ty = s.ty.as_ref().map(lower_type).unwrap_or(Ty::Unknown);
                self.declare(&s.ident, DeclKind::Static, s.mutable, true, ty);
            }
            Decl::TypeAlias(t) => {
                self.declare(&t.ident, DeclKind::TypeAlias, false, true, lower_type(&t.ty));
            }
            Decl::Use(u) => {
                if let Some(alias) = &u.alias {
                    self.declare(alias, DeclKind::Use, false, true, Ty::Unknown);
                }
            }
            Decl::Error(_) => {}
        }
    }

    fn declare(
        &mut self,
        ident: &Ident,
        kind: DeclKind,
        mutable: bool,
        top_level: bool,
        ty: Ty,
    ) -> DeclId {
        let id = self.map.add_decl(Declaration {
            name: ident.name.clone(),
            file: self.current_file,
            span: ident.span,
            kind,
            mutable,
            top_level,
            ty,
        });
        if top_level && !matches!(kind, DeclKind::Field) {
            // First definition wins, later ones are reported
            if self.module_scope.contains_key(&ident.name) {
                self.error(ident.span, format!("duplicate definition of `{}`", ident.name));
            } else {
                self.module_scope.insert(ident.name.clone(), id);
            }
        }
        id
    }

    // ---- pass 2: resolution ----

    fn resolve_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Fn(f) => self.resolve_fn(f),
            Decl::Struct(s) => {
                for field in &s.fields {
                    self.resolve_type_refs(&field.ty);
                }
            }
            Decl::Enum(e) => {
                for variant in &e.variants {
                    for ty in &variant.fields {
                        self.resolve_type_refs(ty);
                    }
                }
            }
            Decl::Mod(m) => {
                for inner in &m.decls {
                    self.resolve_decl(inner);
                }
            }
            Decl::Static(s) => {
                if let Some(ty) = &s.ty {
                    self.resolve_type_refs(ty);
                }
                if let Some(init) = &s.init {
                    self.walk_expr(init);
                }
            }
            Decl::TypeAlias(t) => self.resolve_type_refs(&t.ty),
            Decl::Use(_) | Decl::Error(_) => {}
        }
    }

    fn resolve_fn(&mut self, f: &FnDecl) {
        self.scopes.push(HashMap::new());
        for tp in &f.type_params {
            let id = self.declare(tp, DeclKind::TypeParam, false, false, Ty::Named(tp.name.clone()));
            self.bind_local(&tp.name, id);
        }
        for param in &f.params {
            if let Some(ty) = &param.ty {
                self.resolve_type_refs(ty);
            }
            let ty = param.ty.as_ref().map(lower_type).unwrap_or(Ty::Unknown);
            let id = self.declare(&param.ident, DeclKind::Param, param.mutable, false, ty);
            self.bind_local(&param.ident.name, id);
        }
        if let Some(ret) = &f.ret {
            self.resolve_type_refs(ret);
        }
        if let Some(body) = &f.body {
            self.walk_expr(body);
        }
        self.scopes.pop();
    }

    fn bind_local(&mut self, name: &str, id: DeclId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
    }

    fn lookup(&self, name: &str) -> Option<DeclId> {
        for scope in self.scopes.iter().rev() {
            if let Some(&id) = scope.get(name) {
                return Some(id);
            }
        }
        self.module_scope.get(name).copied()
    }

    /// Resolve the last segment of a path and record the reference
    fn resolve_path(&mut self, path: &Path) -> Option<DeclId> {
        let target = path.last();
        match self.lookup(&target.name) {
            Some(id) => {
                self.map.add_ref(Reference {
                    file: self.current_file,
                    span: target.span,
                    decl: id,
                });
                Some(id)
            }
            None => {
                self.error(target.span, format!("unknown identifier `{}`", target.name));
                None
            }
        }
    }

    /// Record references for the named types inside a type expression
    fn resolve_type_refs(&mut self, ty: &TypeExpr) {
        match &ty.kind {
            TypeExprKind::Path(path) => {
                let target = path.last();
                // Type paths that do not resolve stay silent: the frontend
                // does not track imported modules
                if let Some(id) = self.lookup(&target.name) {
                    self.map.add_ref(Reference {
                        file: self.current_file,
                        span: target.span,
                        decl: id,
                    });
                }
            }
            TypeExprKind::Fn { params, ret } => {
                for p in params {
                    self.resolve_type_refs(p);
                }
                self.resolve_type_refs(ret);
            }
            TypeExprKind::Tuple(elems) => {
                for e in elems {
                    self.resolve_type_refs(e);
                }
            }
            TypeExprKind::Array(elem) => self.resolve_type_refs(elem),
            TypeExprKind::Prim(_) | TypeExprKind::NoRet | TypeExprKind::Unit => {}
        }
    }

    /// Walk an expression, resolving references and returning a shallow type
    fn walk_expr(&mut self, expr: &Expr) -> Ty {
        match &expr.kind {
            ExprKind::Path(path) => match self.resolve_path(path) {
                Some(id) => self.map.decl(id).ty.clone(),
                None => Ty::Unknown,
            },
            ExprKind::Literal(lit) => literal_ty(*lit),
            ExprKind::Call { callee, args } => {
                let callee_ty = self.walk_expr(callee);
                for arg in args {
                    self.walk_expr(arg);
                }
                match callee_ty {
                    Ty::Fn { ret, .. } => *ret,
                    _ => Ty::Unknown,
                }
            }
            ExprKind::Proj { base, .. } => {
                // Field resolution would need full type information
                self.walk_expr(base);
                Ty::Unknown
            }
            ExprKind::Index { base, index } => {
                let base_ty = self.walk_expr(base);
                self.walk_expr(index);
                match base_ty {
                    Ty::Array(elem) => *elem,
                    _ => Ty::Unknown,
                }
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.walk_expr(operand);
                match op {
                    UnaryOp::Not => Ty::Prim(PrimTy::Bool),
                    UnaryOp::Neg => ty,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.walk_expr(lhs);
                self.walk_expr(rhs);
                use BinaryOp::*;
                match op {
                    Eq | NotEq | Lt | Gt | LtEq | GtEq | And | Or => Ty::Prim(PrimTy::Bool),
                    _ => lhs_ty,
                }
            }
            ExprKind::Assign { lhs, rhs } => {
                self.walk_expr(lhs);
                self.walk_expr(rhs);
                Ty::Unit
            }
            ExprKind::Tuple(elems) => {
                let tys = elems.iter().map(|e| self.walk_expr(e)).collect();
                Ty::Tuple(tys)
            }
            ExprKind::Block(block) => {
                self.scopes.push(HashMap::new());
                for stmt in &block.stmts {
                    match stmt {
                        Stmt::Let(l) => self.walk_let(l),
                        Stmt::Expr(e) => {
                            self.walk_expr(e);
                        }
                    }
                }
                self.scopes.pop();
                Ty::Unit
            }
            ExprKind::If { cond, then, els } => {
                self.walk_expr(cond);
                self.walk_expr(then);
                if let Some(els) = els {
                    self.walk_expr(els);
                }
                Ty::Unknown
            }
            ExprKind::Match { scrutinee, arms } => {
                self.walk_expr(scrutinee);
                for arm in arms {
                    self.scopes.push(HashMap::new());
                    self.bind_pattern(&arm.pattern, Ty::Unknown);
                    self.walk_expr(&arm.body);
                    self.scopes.pop();
                }
                Ty::Unknown
            }
            ExprKind::While { cond, body } => {
                self.walk_expr(cond);
                self.walk_expr(body);
                Ty::Unit
            }
            ExprKind::For { binding, iter, body } => {
                self.walk_expr(iter);
                self.scopes.push(HashMap::new());
                self.bind_pattern(binding, Ty::Unknown);
                self.walk_expr(body);
                self.scopes.pop();
                Ty::Unit
            }
            ExprKind::Return(value) => {
                if let Some(v) = value {
                    self.walk_expr(v);
                }
                Ty::NoRet
            }
            ExprKind::Break | ExprKind::Continue => Ty::NoRet,
            ExprKind::Error => Ty::Unknown,
        }
    }

    fn walk_let(&mut self, stmt: &LetStmt) {
        if let Some(ty) = &stmt.ty {
            self.resolve_type_refs(ty);
        }
        let init_ty = stmt.init.as_ref().map(|e| self.walk_expr(e));
        let ty = match (&stmt.ty, init_ty) {
            (Some(annotated), _) => lower_type(annotated),
            (None, Some(inferred)) => inferred,
            (None, None) => Ty::Unknown,
        };
        if stmt.ty.is_none() {
            self.map.add_hint(TypeHint {
                file: self.current_file,
                span: stmt.pattern.span,
                ty: ty.clone(),
            });
        }
        self.bind_pattern(&stmt.pattern, ty);
    }

    /// Declare every binding of a pattern in the innermost scope
    fn bind_pattern(&mut self, pattern: &Pattern, ty: Ty) {
        if let PatternKind::Variant { path, .. } = &pattern.kind {
            let _ = self.resolve_path(path);
        }
        let bindings = pattern.bindings().into_iter().map(|(i, m)| (i.clone(), m)).collect::<Vec<_>>();
        let single = bindings.len() == 1;
        for (ident, mutable) in bindings {
            let bound_ty = if single { ty.clone() } else { Ty::Unknown };
            let id = self.declare(&ident, DeclKind::Let, mutable, false, bound_ty);
            self.bind_local(&ident.name, id);
        }
    }
}

/// Lower a syntactic type expression to a shallow resolved type
fn lower_type(ty: &TypeExpr) -> Ty {
    match &ty.kind {
        TypeExprKind::Prim(p) => Ty::Prim(*p),
        TypeExprKind::Path(path) => Ty::Named(path.last().name.clone()),
        TypeExprKind::Fn { params, ret } => Ty::Fn {
            params: params.iter().map(lower_type).collect(),
            ret: Box::new(lower_type(ret)),
        },
        TypeExprKind::Tuple(elems) => Ty::Tuple(elems.iter().map(lower_type).collect()),
        TypeExprKind::Array(elem) => Ty::Array(Box::new(lower_type(elem))),
        TypeExprKind::NoRet => Ty::NoRet,
        TypeExprKind::Unit => Ty::Unit,
    }
}

fn fn_signature(f: &FnDecl) -> Ty {
    let params = f
        .params
        .iter()
        .map(|p| p.ty.as_ref().map(lower_type).unwrap_or(Ty::Unknown))
        .collect();
    let ret = f.ret.as_ref().map(lower_type).unwrap_or(Ty::Unit);
    Ty::Fn { params, ret: Box::new(ret) }
}

fn literal_ty(lit: Literal) -> Ty {
    match lit {
        Literal::Int => Ty::Prim(PrimTy::I32),
        Literal::Float => Ty::Prim(PrimTy::F64),
        Literal::Bool => Ty::Prim(PrimTy::Bool),
        Literal::Char => Ty::Prim(PrimTy::U8),
        Literal::Str => Ty::Named("str".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn bind_sources(sources: &[(&str, &str)]) -> (NameMap, Vec<SourceDiagnostic>) {
        let files: Vec<ParsedFile> = sources
            .iter()
            .map(|(path, text)| {
                let (decls, errors) = parser::parse(text);
                assert!(errors.is_empty(), "parse errors in fixture: {:?}", errors);
                ParsedFile { path: PathBuf::from(path), decls }
            })
            .collect();
        bind(&files)
    }

    #[test]
    fn test_local_resolution() {
        let src = "fn f(a: i32) -> i32 { let b = a; b }";
        let (map, diags) = bind_sources(&[("/t/a.art", src)]);
        assert!(diags.is_empty(), "{:?}", diags);

        // `a` at the use site resolves to the parameter
        let offset = src.find("let b = a").unwrap() + 8;
        let r = map.find_ref_at(FsPath::new("/t/a.art"), offset).expect("reference at cursor");
        assert_eq!(map.decl(r.decl).kind, DeclKind::Param);
    }

    #[test]
    fn test_cross_file_resolution() {
        let lib = "fn helper(x: i32) -> i32 { x }";
        let app = "fn main() -> i32 { helper(3) }";
        let (map, diags) = bind_sources(&[("/t/lib.art", lib), ("/t/app.art", app)]);
        assert!(diags.is_empty(), "{:?}", diags);

        let offset = app.find("helper").unwrap();
        let r = map.find_ref_at(FsPath::new("/t/app.art"), offset).expect("reference");
        let decl = map.decl(r.decl);
        assert_eq!(decl.kind, DeclKind::Fn);
        assert_eq!(map.path_of(decl.file), FsPath::new("/t/lib.art"));
    }

    #[test]
    fn test_unknown_identifier_reported() {
        let (_, diags) = bind_sources(&[("/t/a.art", "fn f() -> i32 { missing }")]);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unknown identifier"));
    }

    #[test]
    fn test_duplicate_definition_reported() {
        let (_, diags) = bind_sources(&[("/t/a.art", "fn f() {} fn f() {}")]);
        assert!(diags.iter().any(|d| d.message.contains("duplicate definition")));
    }

    #[test]
    fn test_let_hint_inferred_from_call() {
        let src = "fn mk() -> f64 { 1.0 } fn f() { let v = mk(); }";
        let (map, diags) = bind_sources(&[("/t/a.art", src)]);
        assert!(diags.is_empty(), "{:?}", diags);
        let hints: Vec<_> = map.hints_in(FsPath::new("/t/a.art")).collect();
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].ty.to_string(), "f64");
    }

    #[test]
    fn test_annotated_let_has_no_hint() {
        let src = "fn f() { let v: i32 = 1; }";
        let (map, _) = bind_sources(&[("/t/a.art", src)]);
        assert_eq!(map.hints_in(FsPath::new("/t/a.art")).count(), 0);
    }

    #[test]
    fn test_continuation_signature() {
        let src = "fn run(exit: fn (i32) -> !) { exit(0) }";
        let (map, diags) = bind_sources(&[("/t/a.art", src)]);
        assert!(diags.is_empty(), "{:?}", diags);
        let (_, param) = map
            .decls_in(FsPath::new("/t/a.art"))
            .find(|(_, d)| d.kind == DeclKind::Param)
            .unwrap();
        assert!(param.ty.is_continuation());
    }

    #[test]
    fn test_refs_of_collects_all_sites() {
        let src = "fn f(a: i32) -> i32 { a + a }";
        let (map, _) = bind_sources(&[("/t/a.art", src)]);
        let (id, _) = map
            .decls_in(FsPath::new("/t/a.art"))
            .find(|(_, d)| d.kind == DeclKind::Param)
            .unwrap();
        assert_eq!(map.refs_of(id).count(), 2);
    }

    #[test]
    fn test_match_variant_pattern_resolves() {
        let src = "enum E { A, B(i32) } fn f(e: E) -> i32 { match e { B(x) => x, _ => 0 } }";
        let (map, diags) = bind_sources(&[("/t/a.art", src)]);
        assert!(diags.is_empty(), "{:?}", diags);
        let offset = src.find("B(x) =>").unwrap();
        let r = map.find_ref_at(FsPath::new("/t/a.art"), offset).expect("variant reference");
        assert_eq!(map.decl(r.decl).kind, DeclKind::Variant);
    }
}
