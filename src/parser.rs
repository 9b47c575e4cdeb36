//! Parser for the Artic frontend
//!
//! A recursive descent parser that collects errors instead of failing: a
//! malformed declaration is replaced by an error placeholder and parsing
//! resumes at the next declaration keyword.

use crate::ast::*;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};
use crate::ty::PrimTy;
use thiserror::Error;

/// Parser errors
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        span: Span,
    },

    #[error("{message}")]
    Custom { message: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::Custom { span, .. } => *span,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a source file into its top-level declarations
pub fn parse(source: &str) -> (Vec<Decl>, Vec<ParseError>) {
    let mut parser = Parser::new(source);
    let decls = parser.parse_decls(TokenKind::Eof);
    let errors = parser.finish();
    (decls, errors)
}

/// The parser for Artic source text
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    previous: Token,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let previous = current.clone();
        Self { lexer, current, previous, errors: Vec::new() }
    }

    /// Drain accumulated parse and lex errors
    fn finish(mut self) -> Vec<ParseError> {
        for e in self.lexer.take_errors() {
            self.errors.push(ParseError::Custom { message: e.to_string(), span: e.span() });
        }
        self.errors
    }

    fn source(&self) -> &'src str {
        self.lexer.source()
    }

    fn advance(&mut self) -> Token {
        self.previous = self.current.clone();
        self.current = self.lexer.next_token();
        self.previous.clone()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: kind.to_string(),
                found: self.current.kind,
                span: self.current.span,
            })
        }
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Ident> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(Ident::new(token.text(self.source()), token.span))
    }

    // ============ Declarations ============

    /// Parse declarations until the closing token, recovering from errors
    fn parse_decls(&mut self, until: TokenKind) -> Vec<Decl> {
        let mut decls = Vec::new();
        while !self.check(until) && !self.is_at_end() {
            let start = self.current.span;
            match self.parse_decl() {
                Ok(decl) => decls.push(decl),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize(until);
                    decls.push(Decl::Error(start.merge(self.previous.span)));
                }
            }
        }
        decls
    }

    /// Skip tokens until the next declaration start or the closing token.
    /// Every declaration parser consumes its keyword before it can fail, so
    /// stopping on a declaration keyword cannot loop.
    fn synchronize(&mut self, until: TokenKind) {
        while !self.is_at_end() && !self.check(until) && !self.current.kind.starts_decl() {
            self.advance();
        }
    }

    fn parse_decl(&mut self) -> ParseResult<Decl> {
        match self.current.kind {
            TokenKind::Fn => self.parse_fn().map(Decl::Fn),
            TokenKind::Struct => self.parse_struct().map(Decl::Struct),
            TokenKind::Enum => self.parse_enum().map(Decl::Enum),
            TokenKind::Mod => self.parse_mod().map(Decl::Mod),
            TokenKind::Static => self.parse_static().map(Decl::Static),
            TokenKind::Type => self.parse_type_alias().map(Decl::TypeAlias),
            TokenKind::Use => self.parse_use().map(Decl::Use),
            _ => Err(ParseError::UnexpectedToken {
                expected: "declaration".to_string(),
                found: self.current.kind,
                span: self.current.span,
            }),
        }
    }

    fn parse_fn(&mut self) -> ParseResult<FnDecl> {
        let start = self.expect(TokenKind::Fn)?.span;
        // `fn @name` marks a function for forced inlining; the marker is
        // irrelevant to analysis
        self.consume(TokenKind::At);
        let ident = self.expect_ident()?;

        let mut type_params = Vec::new();
        if self.consume(TokenKind::LBracket) {
            while !self.check(TokenKind::RBracket) {
                type_params.push(self.expect_ident()?);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBracket)?;
        }

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) {
            params.push(self.parse_param()?);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        let ret = if self.consume(TokenKind::Arrow) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        let (body, end) = if self.check(TokenKind::LBrace) {
            let block = self.parse_block()?;
            let end = block.span;
            (Some(block), end)
        } else if self.consume(TokenKind::Eq) {
            // `fn f() = expr;` short form
            let expr = self.parse_expr()?;
            let end = expr.span;
            self.consume(TokenKind::Semi);
            (Some(expr), end)
        } else {
            self.consume(TokenKind::Semi);
            (None, self.previous.span)
        };

        Ok(FnDecl { ident, type_params, params, ret, body, span: start.merge(end) })
    }

    fn parse_param(&mut self) -> ParseResult<Param> {
        let mutable = self.consume(TokenKind::Mut);
        let ident = self.expect_ident()?;
        let ty = if self.consume(TokenKind::Colon) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        let end = ty.as_ref().map(|t| t.span).unwrap_or(ident.span);
        Ok(Param { span: ident.span.merge(end), ident, mutable, ty })
    }

    fn parse_struct(&mut self) -> ParseResult<StructDecl> {
        let start = self.expect(TokenKind::Struct)?.span;
        let ident = self.expect_ident()?;
        let mut fields = Vec::new();

        if self.consume(TokenKind::LParen) {
            // Record form: `struct Vec3(f32, f32, f32);`
            let mut index = 0usize;
            while !self.check(TokenKind::RParen) {
                let ty = self.parse_type_expr()?;
                let span = ty.span;
                fields.push(FieldDecl { ident: Ident::new(format!("_{}", index), span), ty, span });
                index += 1;
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
            self.consume(TokenKind::Semi);
        } else {
            self.expect(TokenKind::LBrace)?;
            while !self.check(TokenKind::RBrace) {
                let field_ident = self.expect_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type_expr()?;
                let span = field_ident.span.merge(ty.span);
                fields.push(FieldDecl { ident: field_ident, ty, span });
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace)?;
        }

        Ok(StructDecl { ident, fields, span: start.merge(self.previous.span) })
    }

    fn parse_enum(&mut self) -> ParseResult<EnumDecl> {
        let start = self.expect(TokenKind::Enum)?.span;
        let ident = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;
        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let v_ident = self.expect_ident()?;
            let mut v_fields = Vec::new();
            if self.consume(TokenKind::LParen) {
                while !self.check(TokenKind::RParen) {
                    v_fields.push(self.parse_type_expr()?);
                    if !self.consume(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
            }
            let span = v_ident.span.merge(self.previous.span);
            variants.push(VariantDecl { ident: v_ident, fields: v_fields, span });
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(EnumDecl { ident, variants, span: start.merge(self.previous.span) })
    }

    fn parse_mod(&mut self) -> ParseResult<ModDecl> {
        let start = self.expect(TokenKind::Mod)?.span;
        let ident = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;
        let decls = self.parse_decls(TokenKind::RBrace);
        self.expect(TokenKind::RBrace)?;
        Ok(ModDecl { ident, decls, span: start.merge(self.previous.span) })
    }

    fn parse_static(&mut self) -> ParseResult<StaticDecl> {
        let start = self.expect(TokenKind::Static)?.span;
        let mutable = self.consume(TokenKind::Mut);
        let ident = self.expect_ident()?;
        let ty = if self.consume(TokenKind::Colon) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        let init = if self.consume(TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.consume(TokenKind::Semi);
        Ok(StaticDecl { ident, mutable, ty, init, span: start.merge(self.previous.span) })
    }

    fn parse_type_alias(&mut self) -> ParseResult<TypeAliasDecl> {
        let start = self.expect(TokenKind::Type)?.span;
        let ident = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let ty = self.parse_type_expr()?;
        self.consume(TokenKind::Semi);
        Ok(TypeAliasDecl { ident, ty, span: start.merge(self.previous.span) })
    }

    fn parse_use(&mut self) -> ParseResult<UseDecl> {
        let start = self.expect(TokenKind::Use)?.span;
        let path = self.parse_path()?;
        let alias = if self.consume(TokenKind::As) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        self.consume(TokenKind::Semi);
        Ok(UseDecl { path, alias, span: start.merge(self.previous.span) })
    }

    // ============ Types ============

    fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        let start = self.current.span;
        let kind = match self.current.kind {
            TokenKind::Bang => {
                self.advance();
                TypeExprKind::NoRet
            }
            TokenKind::Amp => {
                // References are transparent to this analysis
                self.advance();
                self.consume(TokenKind::Mut);
                return self.parse_type_expr();
            }
            TokenKind::Fn => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let mut params = Vec::new();
                while !self.check(TokenKind::RParen) {
                    params.push(self.parse_type_expr()?);
                    if !self.consume(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
                let ret = if self.consume(TokenKind::Arrow) {
                    self.parse_type_expr()?
                } else {
                    TypeExpr { kind: TypeExprKind::Unit, span: self.previous.span }
                };
                TypeExprKind::Fn { params, ret: Box::new(ret) }
            }
            TokenKind::LParen => {
                self.advance();
                if self.consume(TokenKind::RParen) {
                    TypeExprKind::Unit
                } else {
                    let mut elems = vec![self.parse_type_expr()?];
                    while self.consume(TokenKind::Comma) {
                        if self.check(TokenKind::RParen) {
                            break;
                        }
                        elems.push(self.parse_type_expr()?);
                    }
                    self.expect(TokenKind::RParen)?;
                    if elems.len() == 1 {
                        return Ok(TypeExpr {
                            kind: elems.pop().unwrap().kind,
                            span: start.merge(self.previous.span),
                        });
                    }
                    TypeExprKind::Tuple(elems)
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let elem = self.parse_type_expr()?;
                // Optional fixed size: `[f32 * 4]`
                if self.consume(TokenKind::Star) {
                    self.expect(TokenKind::IntLiteral)?;
                }
                self.expect(TokenKind::RBracket)?;
                TypeExprKind::Array(Box::new(elem))
            }
            TokenKind::Ident => {
                let path = self.parse_path()?;
                // Type arguments are parsed and dropped
                if self.consume(TokenKind::LBracket) {
                    while !self.check(TokenKind::RBracket) && !self.is_at_end() {
                        self.parse_type_expr()?;
                        if !self.consume(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RBracket)?;
                }
                TypeExprKind::Path(path)
            }
            kind if kind.is_prim_type() => {
                let prim = prim_ty(kind);
                self.advance();
                TypeExprKind::Prim(prim)
            }
            found => {
                return Err(ParseError::UnexpectedToken {
                    expected: "type".to_string(),
                    found,
                    span: self.current.span,
                })
            }
        };
        Ok(TypeExpr { kind, span: start.merge(self.previous.span) })
    }

    fn parse_path(&mut self) -> ParseResult<Path> {
        let first = self.expect_ident()?;
        let start = first.span;
        let mut segments = vec![first];
        while self.consume(TokenKind::ColonColon) {
            segments.push(self.expect_ident()?);
        }
        Ok(Path { segments, span: start.merge(self.previous.span) })
    }

    // ============ Statements ============

    fn parse_block(&mut self) -> ParseResult<Expr> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.recover_in_block();
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        let span = start.merge(self.previous.span);
        Ok(Expr { kind: ExprKind::Block(Block { stmts, span }), span })
    }

    /// Skip to the next statement boundary inside a block
    fn recover_in_block(&mut self) {
        if !self.is_at_end() && !self.check(TokenKind::RBrace) {
            self.advance();
        }
        while !self.is_at_end() && !self.check(TokenKind::RBrace) {
            if self.consume(TokenKind::Semi) {
                return;
            }
            if self.check(TokenKind::Let) {
                return;
            }
            self.advance();
        }
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        if self.check(TokenKind::Let) {
            return self.parse_let().map(Stmt::Let);
        }
        let expr = self.parse_expr()?;
        let stmt = if self.consume(TokenKind::Eq) {
            let rhs = self.parse_expr()?;
            let span = expr.span.merge(rhs.span);
            Expr { kind: ExprKind::Assign { lhs: Box::new(expr), rhs: Box::new(rhs) }, span }
        } else {
            expr
        };
        self.consume(TokenKind::Semi);
        Ok(Stmt::Expr(stmt))
    }

    fn parse_let(&mut self) -> ParseResult<LetStmt> {
        let start = self.expect(TokenKind::Let)?.span;
        let pattern = self.parse_pattern()?;
        let ty = if self.consume(TokenKind::Colon) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        let init = if self.consume(TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.consume(TokenKind::Semi);
        Ok(LetStmt { pattern, ty, init, span: start.merge(self.previous.span) })
    }

    fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.current.span;
        let kind = match self.current.kind {
            TokenKind::Underscore => {
                self.advance();
                PatternKind::Wildcard
            }
            TokenKind::Mut => {
                self.advance();
                let ident = self.expect_ident()?;
                PatternKind::Binding { ident, mutable: true }
            }
            TokenKind::LParen => {
                self.advance();
                let mut elems = Vec::new();
                while !self.check(TokenKind::RParen) {
                    elems.push(self.parse_pattern()?);
                    if !self.consume(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
                PatternKind::Tuple(elems)
            }
            TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::StringLiteral
            | TokenKind::CharLiteral | TokenKind::True | TokenKind::False => {
                let lit = literal_kind(self.current.kind);
                self.advance();
                PatternKind::Literal(lit)
            }
            TokenKind::Ident => {
                let path = self.parse_path()?;
                if path.segments.len() > 1 || self.check(TokenKind::LParen) {
                    let mut fields = Vec::new();
                    if self.consume(TokenKind::LParen) {
                        while !self.check(TokenKind::RParen) {
                            fields.push(self.parse_pattern()?);
                            if !self.consume(TokenKind::Comma) {
                                break;
                            }
                        }
                        self.expect(TokenKind::RParen)?;
                    }
                    PatternKind::Variant { path, fields }
                } else {
                    let ident = path.segments.into_iter().next().unwrap();
                    PatternKind::Binding { ident, mutable: false }
                }
            }
            found => {
                return Err(ParseError::UnexpectedToken {
                    expected: "pattern".to_string(),
                    found,
                    span: self.current.span,
                })
            }
        };
        Ok(Pattern { kind, span: start.merge(self.previous.span) })
    }

    // ============ Expressions ============

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, prec)) = binary_op(self.current.kind) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(prec + 1)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr { kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.current.kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr { kind: ExprKind::Unary { op, operand: Box::new(operand) }, span });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current.kind {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    while !self.check(TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        if !self.consume(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    let span = expr.span.merge(self.previous.span);
                    expr = Expr { kind: ExprKind::Call { callee: Box::new(expr), args }, span };
                }
                TokenKind::Dot => {
                    self.advance();
                    let field = self.expect_ident()?;
                    let span = expr.span.merge(field.span);
                    expr = Expr { kind: ExprKind::Proj { base: Box::new(expr), field }, span };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    let span = expr.span.merge(self.previous.span);
                    expr = Expr {
                        kind: ExprKind::Index { base: Box::new(expr), index: Box::new(index) },
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.current.span;
        match self.current.kind {
            TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::StringLiteral
            | TokenKind::CharLiteral | TokenKind::True | TokenKind::False => {
                let lit = literal_kind(self.current.kind);
                self.advance();
                Ok(Expr { kind: ExprKind::Literal(lit), span: start })
            }
            TokenKind::Ident => {
                let path = self.parse_path()?;
                let span = path.span;
                Ok(Expr { kind: ExprKind::Path(path), span })
            }
            TokenKind::LParen => {
                self.advance();
                if self.consume(TokenKind::RParen) {
                    return Ok(Expr {
                        kind: ExprKind::Tuple(Vec::new()),
                        span: start.merge(self.previous.span),
                    });
                }
                let first = self.parse_expr()?;
                if self.consume(TokenKind::Comma) {
                    let mut elems = vec![first];
                    while !self.check(TokenKind::RParen) {
                        elems.push(self.parse_expr()?);
                        if !self.consume(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr { kind: ExprKind::Tuple(elems), span: start.merge(self.previous.span) })
                } else {
                    self.expect(TokenKind::RParen)?;
                    Ok(first)
                }
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => {
                self.advance();
                let cond = self.parse_expr()?;
                let then = self.parse_block()?;
                let els = if self.consume(TokenKind::Else) {
                    let e = if self.check(TokenKind::If) {
                        self.parse_primary()?
                    } else {
                        self.parse_block()?
                    };
                    Some(Box::new(e))
                } else {
                    None
                };
                let end = els.as_ref().map(|e| e.span).unwrap_or(then.span);
                Ok(Expr {
                    kind: ExprKind::If { cond: Box::new(cond), then: Box::new(then), els },
                    span: start.merge(end),
                })
            }
            TokenKind::Match => {
                self.advance();
                let scrutinee = self.parse_expr()?;
                self.expect(TokenKind::LBrace)?;
                let mut arms = Vec::new();
                while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                    let pattern = self.parse_pattern()?;
                    self.expect(TokenKind::FatArrow)?;
                    let body = self.parse_expr()?;
                    let span = pattern.span.merge(body.span);
                    arms.push(MatchArm { pattern, body, span });
                    if !self.consume(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBrace)?;
                Ok(Expr {
                    kind: ExprKind::Match { scrutinee: Box::new(scrutinee), arms },
                    span: start.merge(self.previous.span),
                })
            }
            TokenKind::While => {
                self.advance();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                let span = start.merge(body.span);
                Ok(Expr { kind: ExprKind::While { cond: Box::new(cond), body: Box::new(body) }, span })
            }
            TokenKind::For => {
                self.advance();
                let binding = self.parse_pattern()?;
                self.expect(TokenKind::In)?;
                let iter = self.parse_expr()?;
                let body = self.parse_block()?;
                let span = start.merge(body.span);
                Ok(Expr {
                    kind: ExprKind::For { binding, iter: Box::new(iter), body: Box::new(body) },
                    span,
                })
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semi)
                    || self.check(TokenKind::RBrace)
                    || self.is_at_end()
                {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                };
                let end = value.as_ref().map(|v| v.span).unwrap_or(start);
                Ok(Expr { kind: ExprKind::Return(value), span: start.merge(end) })
            }
            TokenKind::Break => {
                self.advance();
                Ok(Expr { kind: ExprKind::Break, span: start })
            }
            TokenKind::Continue => {
                self.advance();
                Ok(Expr { kind: ExprKind::Continue, span: start })
            }
            found => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found,
                span: self.current.span,
            }),
        }
    }
}

fn literal_kind(kind: TokenKind) -> Literal {
    match kind {
        TokenKind::IntLiteral => Literal::Int,
        TokenKind::FloatLiteral => Literal::Float,
        TokenKind::StringLiteral => Literal::Str,
        TokenKind::CharLiteral => Literal::Char,
        TokenKind::True | TokenKind::False => Literal::Bool,
        _ => unreachable!("not a literal token"),
    }
}

fn prim_ty(kind: TokenKind) -> PrimTy {
    match kind {
        TokenKind::Bool => PrimTy::Bool,
        TokenKind::I8 => PrimTy::I8,
        TokenKind::I16 => PrimTy::I16,
        TokenKind::I32 => PrimTy::I32,
        TokenKind::I64 => PrimTy::I64,
        TokenKind::U8 => PrimTy::U8,
        TokenKind::U16 => PrimTy::U16,
        TokenKind::U32 => PrimTy::U32,
        TokenKind::U64 => PrimTy::U64,
        TokenKind::F16 => PrimTy::F16,
        TokenKind::F32 => PrimTy::F32,
        TokenKind::F64 => PrimTy::F64,
        _ => unreachable!("not a primitive type token"),
    }
}

fn binary_op(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    let (op, prec) = match kind {
        TokenKind::OrOr => (BinaryOp::Or, 1),
        TokenKind::AndAnd => (BinaryOp::And, 2),
        TokenKind::EqEq => (BinaryOp::Eq, 3),
        TokenKind::NotEq => (BinaryOp::NotEq, 3),
        TokenKind::Lt => (BinaryOp::Lt, 3),
        TokenKind::Gt => (BinaryOp::Gt, 3),
        TokenKind::LtEq => (BinaryOp::LtEq, 3),
        TokenKind::GtEq => (BinaryOp::GtEq, 3),
        TokenKind::Pipe => (BinaryOp::BitOr, 4),
        TokenKind::Caret => (BinaryOp::BitXor, 5),
        TokenKind::Amp => (BinaryOp::BitAnd, 6),
        TokenKind::Shl => (BinaryOp::Shl, 7),
        TokenKind::Shr => (BinaryOp::Shr, 7),
        TokenKind::Plus => (BinaryOp::Add, 8),
        TokenKind::Minus => (BinaryOp::Sub, 8),
        TokenKind::Star => (BinaryOp::Mul, 9),
        TokenKind::Slash => (BinaryOp::Div, 9),
        TokenKind::Percent => (BinaryOp::Rem, 9),
        _ => return None,
    };
    Some((op, prec))
}
