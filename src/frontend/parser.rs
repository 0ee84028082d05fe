//! Parser for annotated Squirrel
//!
//! Recursive descent parser with Pratt parsing for expressions. Produces a
//! concrete syntax tree: every token ends up as a leaf, so any node's text
//! can be rebuilt from the tree.

use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::syntax::{NodeKind, SyntaxNode};
use crate::utils::{Error, Position, Result};

/// Binding power of `?:`, between assignment and `||`
const TERNARY_PRECEDENCE: u8 = 2;

/// Deepest recursion into statements, expressions and types before giving up
const MAX_NESTING: usize = 128;

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Create a new parser from a lexer
    pub fn new(mut lexer: Lexer) -> Result<Self> {
        Ok(Self {
            tokens: lexer.tokenize()?,
            pos: 0,
            depth: 0,
        })
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        // tokenize always ends with Eof, and advance never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn describe_current(&self) -> String {
        match self.current_kind() {
            TokenKind::Eof => "end of file".to_string(),
            _ => format!("'{}'", self.current().text),
        }
    }

    /// Consume the current token as a leaf
    fn leaf(&mut self) -> SyntaxNode {
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Ident(_) => NodeKind::Identifier,
            TokenKind::DotDotDot => NodeKind::VarParams,
            _ => NodeKind::Token,
        };
        SyntaxNode::token(kind, token.text, token.span.position)
    }

    fn expect(&mut self, expected: TokenKind, what: &str) -> Result<SyntaxNode> {
        if self.check(&expected) {
            Ok(self.leaf())
        } else {
            Err(Error::UnexpectedToken {
                expected: what.to_string(),
                got: self.describe_current(),
                span: self.current().span,
            })
        }
    }

    /// Consume the current token as a leaf if it matches
    fn consume(&mut self, kind: &TokenKind) -> Option<SyntaxNode> {
        if self.check(kind) {
            Some(self.leaf())
        } else {
            None
        }
    }

    /// Run a recursive production one nesting level down
    fn nested<R>(&mut self, parse: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        if self.depth >= MAX_NESTING {
            return Err(Error::NestingTooDeep { span: self.current().span });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn push_optional_semicolon(&mut self, children: &mut Vec<SyntaxNode>) {
        if let Some(semi) = self.consume(&TokenKind::Semicolon) {
            children.push(semi);
        }
    }

    fn ident(&mut self) -> Result<SyntaxNode> {
        match self.current_kind() {
            TokenKind::Ident(_) => Ok(self.leaf()),
            _ => Err(Error::ExpectedIdent {
                got: self.describe_current(),
                span: self.current().span,
            }),
        }
    }

    /// Member names after `.` may be keywords (`base.constructor`)
    fn member_name(&mut self) -> Result<SyntaxNode> {
        if self.current_kind().is_keyword() {
            let token = self.advance();
            return Ok(SyntaxNode::token(NodeKind::Identifier, token.text, token.span.position));
        }
        self.ident()
    }

    // ==================== Declarations ====================

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<SyntaxNode> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(SyntaxNode::node(NodeKind::Program, Position::new(1, 0), statements))
    }

    fn parse_statement(&mut self) -> Result<SyntaxNode> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Result<SyntaxNode> {
        match self.current_kind() {
            TokenKind::Local => {
                if matches!(self.peek_kind(), Some(TokenKind::Function)) {
                    let local = self.leaf();
                    return self.parse_function_statement(Some(local));
                }
                let mut node = self.parse_local_decls()?;
                if let Some(semi) = self.consume(&TokenKind::Semicolon) {
                    node = append(node, semi);
                }
                Ok(node)
            }
            TokenKind::Function if matches!(self.peek_kind(), Some(TokenKind::Ident(_))) => {
                self.parse_function_statement(None)
            }
            TokenKind::Class => self.parse_class_statement(),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Foreach => self.parse_foreach(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Enum => self.parse_enum(),
            TokenKind::Const => self.parse_const(),
            TokenKind::Return | TokenKind::Throw | TokenKind::Yield => {
                let mut children = vec![self.leaf()];
                if !self.at_statement_end() {
                    children.push(self.parse_expression()?);
                }
                self.push_optional_semicolon(&mut children);
                Ok(SyntaxNode::wrap(NodeKind::Statement, children))
            }
            TokenKind::Break | TokenKind::Continue | TokenKind::Semicolon => {
                let mut children = vec![self.leaf()];
                if !matches!(children[0].token_text(), Some(";")) {
                    self.push_optional_semicolon(&mut children);
                }
                Ok(SyntaxNode::wrap(NodeKind::Statement, children))
            }
            _ => {
                let mut children = vec![self.parse_expression()?];
                self.push_optional_semicolon(&mut children);
                Ok(SyntaxNode::wrap(NodeKind::Statement, children))
            }
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        )
    }

    /// `local a: T = e, b` without the trailing semicolon
    fn parse_local_decls(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.expect(TokenKind::Local, "'local'")?];
        loop {
            children.push(self.parse_local_decl()?);
            match self.consume(&TokenKind::Comma) {
                Some(comma) => children.push(comma),
                None => break,
            }
        }
        Ok(SyntaxNode::wrap(NodeKind::LocalDeclStatement, children))
    }

    fn parse_local_decl(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.ident()?];
        if self.check(&TokenKind::Colon) {
            children.push(self.parse_type_annotation()?);
        }
        if let Some(eq) = self.consume(&TokenKind::Eq) {
            children.push(eq);
            children.push(self.parse_expression()?);
        }
        Ok(SyntaxNode::wrap(NodeKind::LocalDecl, children))
    }

    fn parse_function_statement(&mut self, local: Option<SyntaxNode>) -> Result<SyntaxNode> {
        let mut children: Vec<SyntaxNode> = local.into_iter().collect();
        children.push(self.expect(TokenKind::Function, "'function'")?);
        children.push(self.ident()?);
        self.parse_signature_and_body(&mut children)?;
        Ok(SyntaxNode::wrap(NodeKind::FunctionStatement, children))
    }

    /// `(params) [: T] { body }`
    fn parse_signature_and_body(&mut self, children: &mut Vec<SyntaxNode>) -> Result<()> {
        children.push(self.parse_parameter_list()?);
        if self.check(&TokenKind::Colon) {
            children.push(self.parse_type_annotation()?);
        }
        children.push(self.parse_block()?);
        Ok(())
    }

    fn parse_parameter_list(&mut self) -> Result<SyntaxNode> {
        let open = self.expect(TokenKind::LParen, "'('")?;
        let mut children = vec![open];

        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            children.push(self.parse_parameter()?);
            match self.consume(&TokenKind::Comma) {
                Some(comma) => children.push(comma),
                None => break,
            }
        }

        children.push(self.expect(TokenKind::RParen, "')'")?);
        Ok(SyntaxNode::wrap(NodeKind::ParameterList, children))
    }

    fn parse_parameter(&mut self) -> Result<SyntaxNode> {
        if self.check(&TokenKind::DotDotDot) {
            let marker = self.leaf();
            return Ok(SyntaxNode::wrap(NodeKind::Parameter, vec![marker]));
        }

        let mut children = vec![self.ident()?];
        if self.check(&TokenKind::Colon) {
            children.push(self.parse_type_annotation()?);
        }
        if let Some(eq) = self.consume(&TokenKind::Eq) {
            children.push(eq);
            children.push(self.parse_expression()?);
        }
        Ok(SyntaxNode::wrap(NodeKind::Parameter, children))
    }

    fn parse_class_statement(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.expect(TokenKind::Class, "'class'")?];
        children.push(self.ident()?);
        self.parse_class_rest(&mut children)?;
        Ok(SyntaxNode::wrap(NodeKind::ClassStatement, children))
    }

    /// `class [extends Base] { ... }` in value position
    fn parse_class_expression(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.expect(TokenKind::Class, "'class'")?];
        self.parse_class_rest(&mut children)?;
        Ok(SyntaxNode::wrap(NodeKind::ClassExpression, children))
    }

    /// `[extends Base] { body }`
    fn parse_class_rest(&mut self, children: &mut Vec<SyntaxNode>) -> Result<()> {
        if let Some(extends) = self.consume(&TokenKind::Extends) {
            let base = self.parse_expression()?;
            children.push(SyntaxNode::wrap(NodeKind::Extends, vec![extends, base]));
        }
        children.push(self.parse_class_body()?);
        Ok(())
    }

    fn parse_class_body(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.expect(TokenKind::LBrace, "'{'")?];

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let member = match self.current_kind() {
                TokenKind::Static if matches!(self.peek_kind(), Some(TokenKind::Function)) => {
                    let mut parts = vec![self.leaf(), self.leaf()];
                    parts.push(self.ident()?);
                    self.parse_signature_and_body(&mut parts)?;
                    SyntaxNode::wrap(NodeKind::MethodDecl, parts)
                }
                TokenKind::Function => {
                    let mut parts = vec![self.leaf()];
                    parts.push(self.ident()?);
                    self.parse_signature_and_body(&mut parts)?;
                    SyntaxNode::wrap(NodeKind::MethodDecl, parts)
                }
                TokenKind::Constructor => {
                    let mut parts = vec![self.leaf()];
                    self.parse_signature_and_body(&mut parts)?;
                    SyntaxNode::wrap(NodeKind::ConstructorDecl, parts)
                }
                TokenKind::Semicolon => self.leaf(),
                _ => self.parse_field_decl()?,
            };
            children.push(member);
        }

        children.push(self.expect(TokenKind::RBrace, "'}'")?);
        Ok(SyntaxNode::wrap(NodeKind::ClassBody, children))
    }

    fn parse_field_decl(&mut self) -> Result<SyntaxNode> {
        let mut children = Vec::new();
        if let Some(modifier) = self.consume(&TokenKind::Static) {
            children.push(modifier);
        }
        children.push(self.ident()?);
        if self.check(&TokenKind::Colon) {
            children.push(self.parse_type_annotation()?);
        }
        if let Some(eq) = self.consume(&TokenKind::Eq) {
            children.push(eq);
            children.push(self.parse_expression()?);
        }
        self.push_optional_semicolon(&mut children);
        Ok(SyntaxNode::wrap(NodeKind::FieldDecl, children))
    }

    // ==================== Types ====================

    /// `: T`
    fn parse_type_annotation(&mut self) -> Result<SyntaxNode> {
        let colon = self.expect(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;
        Ok(SyntaxNode::wrap(NodeKind::TypeAnnotation, vec![colon, ty]))
    }

    fn parse_type(&mut self) -> Result<SyntaxNode> {
        self.nested(Self::parse_union_type)
    }

    fn parse_union_type(&mut self) -> Result<SyntaxNode> {
        let mut children = Vec::new();
        self.parse_type_atom(&mut children)?;
        while let Some(bar) = self.consume(&TokenKind::Or) {
            children.push(bar);
            self.parse_type_atom(&mut children)?;
        }
        Ok(SyntaxNode::wrap(NodeKind::Type, children))
    }

    fn parse_type_atom(&mut self, children: &mut Vec<SyntaxNode>) -> Result<()> {
        match self.current_kind() {
            TokenKind::Ident(_) => children.push(self.leaf()),
            // Keywords that double as type names
            TokenKind::Null | TokenKind::Function | TokenKind::Class => {
                let token = self.advance();
                children.push(SyntaxNode::token(NodeKind::Identifier, token.text, token.span.position));
            }
            _ => {
                return Err(Error::ExpectedType {
                    got: self.describe_current(),
                    span: self.current().span,
                })
            }
        }

        if let Some(open) = self.consume(&TokenKind::Lt) {
            children.push(open);
            loop {
                children.push(self.parse_type()?);
                match self.consume(&TokenKind::Comma) {
                    Some(comma) => children.push(comma),
                    None => break,
                }
            }
            children.push(self.expect_closing_angle()?);
        }

        while let Some(question) = self.consume(&TokenKind::Question) {
            children.push(question);
        }
        Ok(())
    }

    /// Accept `>`, splitting `>>` and `>>>` that close nested generics
    fn expect_closing_angle(&mut self) -> Result<SyntaxNode> {
        let rest = match self.current_kind() {
            TokenKind::Gt => return Ok(self.leaf()),
            TokenKind::Shr => TokenKind::Gt,
            TokenKind::UShr => TokenKind::Shr,
            TokenKind::Ge => TokenKind::Eq,
            _ => {
                return Err(Error::UnexpectedToken {
                    expected: "'>'".to_string(),
                    got: self.describe_current(),
                    span: self.current().span,
                })
            }
        };

        let token = self.current().clone();
        let closing = SyntaxNode::token(NodeKind::Token, ">", token.span.position);
        let mut remainder = token.clone();
        remainder.kind = rest;
        remainder.text = token.text[1..].to_string();
        remainder.span.start += 1;
        remainder.span.position.column += 1;
        self.tokens[self.pos] = remainder;
        Ok(closing)
    }

    // ==================== Statements ====================

    fn parse_block(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.expect(TokenKind::LBrace, "'{'")?];
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            children.push(self.parse_statement()?);
        }
        children.push(self.expect(TokenKind::RBrace, "'}'")?);
        Ok(SyntaxNode::wrap(NodeKind::Block, children))
    }

    fn parse_condition(&mut self, children: &mut Vec<SyntaxNode>) -> Result<()> {
        children.push(self.expect(TokenKind::LParen, "'('")?);
        children.push(self.parse_expression()?);
        children.push(self.expect(TokenKind::RParen, "')'")?);
        Ok(())
    }

    fn parse_if(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.leaf()];
        self.parse_condition(&mut children)?;
        children.push(self.parse_statement()?);
        if let Some(else_kw) = self.consume(&TokenKind::Else) {
            children.push(else_kw);
            children.push(self.parse_statement()?);
        }
        Ok(SyntaxNode::wrap(NodeKind::Statement, children))
    }

    fn parse_while(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.leaf()];
        self.parse_condition(&mut children)?;
        children.push(self.parse_statement()?);
        Ok(SyntaxNode::wrap(NodeKind::Statement, children))
    }

    fn parse_do_while(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.leaf()];
        children.push(self.parse_statement()?);
        children.push(self.expect(TokenKind::While, "'while'")?);
        self.parse_condition(&mut children)?;
        self.push_optional_semicolon(&mut children);
        Ok(SyntaxNode::wrap(NodeKind::Statement, children))
    }

    fn parse_for(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.leaf()];
        children.push(self.expect(TokenKind::LParen, "'('")?);

        if self.check(&TokenKind::Local) {
            children.push(self.parse_local_decls()?);
        } else if !self.check(&TokenKind::Semicolon) {
            children.push(self.parse_expression()?);
        }
        children.push(self.expect(TokenKind::Semicolon, "';'")?);

        if !self.check(&TokenKind::Semicolon) {
            children.push(self.parse_expression()?);
        }
        children.push(self.expect(TokenKind::Semicolon, "';'")?);

        if !self.check(&TokenKind::RParen) {
            children.push(self.parse_expression()?);
        }
        children.push(self.expect(TokenKind::RParen, "')'")?);
        children.push(self.parse_statement()?);
        Ok(SyntaxNode::wrap(NodeKind::Statement, children))
    }

    fn parse_foreach(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.leaf()];
        children.push(self.expect(TokenKind::LParen, "'('")?);
        children.push(self.ident()?);
        if let Some(comma) = self.consume(&TokenKind::Comma) {
            children.push(comma);
            children.push(self.ident()?);
        }
        children.push(self.expect(TokenKind::In, "'in'")?);
        children.push(self.parse_expression()?);
        children.push(self.expect(TokenKind::RParen, "')'")?);
        children.push(self.parse_statement()?);
        Ok(SyntaxNode::wrap(NodeKind::Statement, children))
    }

    fn parse_try(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.leaf()];
        children.push(self.parse_statement()?);
        children.push(self.expect(TokenKind::Catch, "'catch'")?);
        children.push(self.expect(TokenKind::LParen, "'('")?);
        children.push(self.ident()?);
        children.push(self.expect(TokenKind::RParen, "')'")?);
        children.push(self.parse_statement()?);
        Ok(SyntaxNode::wrap(NodeKind::Statement, children))
    }

    /// `switch (e) { case v: statements default: statements }`
    fn parse_switch(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.leaf()];
        self.parse_condition(&mut children)?;
        children.push(self.expect(TokenKind::LBrace, "'{'")?);

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let mut clause = match self.current_kind() {
                TokenKind::Case => {
                    let case = self.leaf();
                    vec![case, self.parse_expression()?]
                }
                TokenKind::Default => vec![self.leaf()],
                _ => {
                    return Err(Error::UnexpectedToken {
                        expected: "'case' or 'default'".to_string(),
                        got: self.describe_current(),
                        span: self.current().span,
                    })
                }
            };
            clause.push(self.expect(TokenKind::Colon, "':'")?);
            while !matches!(
                self.current_kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                clause.push(self.parse_statement()?);
            }
            children.push(SyntaxNode::wrap(NodeKind::Statement, clause));
        }

        children.push(self.expect(TokenKind::RBrace, "'}'")?);
        Ok(SyntaxNode::wrap(NodeKind::Statement, children))
    }

    /// `enum Name { A, B = 2 }`
    fn parse_enum(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.leaf()];
        children.push(self.ident()?);
        children.push(self.expect(TokenKind::LBrace, "'{'")?);

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            children.push(self.ident()?);
            if let Some(eq) = self.consume(&TokenKind::Eq) {
                children.push(eq);
                children.push(self.parse_expression()?);
            }
            if let Some(comma) = self.consume(&TokenKind::Comma) {
                children.push(comma);
            }
        }

        children.push(self.expect(TokenKind::RBrace, "'}'")?);
        self.push_optional_semicolon(&mut children);
        Ok(SyntaxNode::wrap(NodeKind::Statement, children))
    }

    /// `const NAME = e;`
    fn parse_const(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.leaf()];
        children.push(self.ident()?);
        children.push(self.expect(TokenKind::Eq, "'='")?);
        children.push(self.parse_expression()?);
        self.push_optional_semicolon(&mut children);
        Ok(SyntaxNode::wrap(NodeKind::Statement, children))
    }

    // ==================== Expressions ====================

    /// Parse an expression; the result is always an `Expression` node
    pub fn parse_expression(&mut self) -> Result<SyntaxNode> {
        self.parse_expr_bp(1)
    }

    fn parse_expr_bp(&mut self, min_prec: u8) -> Result<SyntaxNode> {
        self.nested(|parser| parser.parse_binary(min_prec))
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<SyntaxNode> {
        let mut lhs = self.parse_unary()?;

        loop {
            if self.check(&TokenKind::Question) && TERNARY_PRECEDENCE >= min_prec {
                let question = self.leaf();
                let then = self.parse_expression()?;
                let colon = self.expect(TokenKind::Colon, "':'")?;
                let otherwise = self.parse_expr_bp(TERNARY_PRECEDENCE)?;
                lhs = SyntaxNode::wrap(NodeKind::Expression, vec![lhs, question, then, colon, otherwise]);
                continue;
            }

            let prec = match self.current_kind().binary_precedence() {
                Some(prec) if prec >= min_prec => prec,
                _ => break,
            };
            let right_assoc = self.current_kind().is_assignment();
            let op = self.leaf();
            let rhs = self.parse_expr_bp(if right_assoc { prec } else { prec + 1 })?;
            lhs = SyntaxNode::wrap(NodeKind::Expression, vec![lhs, op, rhs]);
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<SyntaxNode> {
        self.nested(Self::parse_prefix)
    }

    fn parse_prefix(&mut self) -> Result<SyntaxNode> {
        match self.current_kind() {
            TokenKind::Minus
            | TokenKind::Not
            | TokenKind::Tilde
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus
            | TokenKind::Typeof
            | TokenKind::Clone
            | TokenKind::Delete
            | TokenKind::Resume => {
                let op = self.leaf();
                let operand = self.parse_unary()?;
                Ok(SyntaxNode::wrap(NodeKind::Expression, vec![op, operand]))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<SyntaxNode> {
        let mut expr = self.parse_primary()?;

        loop {
            let mut children = vec![expr];
            match self.current_kind() {
                TokenKind::Dot => {
                    children.push(self.leaf());
                    children.push(self.member_name()?);
                }
                TokenKind::LBracket => {
                    children.push(self.leaf());
                    children.push(self.parse_expression()?);
                    children.push(self.expect(TokenKind::RBracket, "']'")?);
                }
                TokenKind::LParen => {
                    children.push(self.leaf());
                    while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                        children.push(self.parse_expression()?);
                        match self.consume(&TokenKind::Comma) {
                            Some(comma) => children.push(comma),
                            None => break,
                        }
                    }
                    children.push(self.expect(TokenKind::RParen, "')'")?);
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => children.push(self.leaf()),
                _ => {
                    expr = children.remove(0);
                    break;
                }
            }
            expr = SyntaxNode::wrap(NodeKind::Expression, children);
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<SyntaxNode> {
        let children = match self.current_kind() {
            TokenKind::IntLit(_)
            | TokenKind::FloatLit(_)
            | TokenKind::StringLit(_)
            | TokenKind::CharLit(_)
            | TokenKind::Null
            | TokenKind::True
            | TokenKind::False
            | TokenKind::This
            | TokenKind::Base
            | TokenKind::Ident(_) => vec![self.leaf()],
            TokenKind::ColonColon => {
                let scope = self.leaf();
                vec![scope, self.ident()?]
            }
            TokenKind::LParen => {
                let open = self.leaf();
                let inner = self.parse_expression()?;
                vec![open, inner, self.expect(TokenKind::RParen, "')'")?]
            }
            TokenKind::LBracket => self.parse_array_literal()?,
            TokenKind::LBrace => self.parse_table_literal()?,
            TokenKind::Function => vec![self.parse_function_expression()?],
            TokenKind::Class => vec![self.parse_class_expression()?],
            _ => {
                return Err(Error::ExpectedExpr {
                    got: self.describe_current(),
                    span: self.current().span,
                })
            }
        };
        Ok(SyntaxNode::wrap(NodeKind::Expression, children))
    }

    fn parse_array_literal(&mut self) -> Result<Vec<SyntaxNode>> {
        let mut children = vec![self.leaf()];
        while !self.check(&TokenKind::RBracket) && !self.is_at_end() {
            children.push(self.parse_expression()?);
            if let Some(comma) = self.consume(&TokenKind::Comma) {
                children.push(comma);
            }
        }
        children.push(self.expect(TokenKind::RBracket, "']'")?);
        Ok(children)
    }

    fn parse_table_literal(&mut self) -> Result<Vec<SyntaxNode>> {
        let mut children = vec![self.leaf()];
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.current_kind() {
                TokenKind::Function => children.push(self.parse_function_expression()?),
                TokenKind::LBracket => {
                    children.push(self.leaf());
                    children.push(self.parse_expression()?);
                    children.push(self.expect(TokenKind::RBracket, "']'")?);
                    children.push(self.expect(TokenKind::Eq, "'='")?);
                    children.push(self.parse_expression()?);
                }
                TokenKind::StringLit(_) => {
                    children.push(self.leaf());
                    children.push(self.expect(TokenKind::Colon, "':'")?);
                    children.push(self.parse_expression()?);
                }
                _ => {
                    children.push(self.member_name()?);
                    children.push(self.expect(TokenKind::Eq, "'='")?);
                    children.push(self.parse_expression()?);
                }
            }
            if let Some(comma) = self.consume(&TokenKind::Comma) {
                children.push(comma);
            }
        }
        children.push(self.expect(TokenKind::RBrace, "'}'")?);
        Ok(children)
    }

    /// `function [name](params) [: T] { body }` in value position
    fn parse_function_expression(&mut self) -> Result<SyntaxNode> {
        let mut children = vec![self.expect(TokenKind::Function, "'function'")?];
        if matches!(self.current_kind(), TokenKind::Ident(_)) {
            children.push(self.leaf());
        }
        self.parse_signature_and_body(&mut children)?;
        Ok(SyntaxNode::wrap(NodeKind::FunctionExpression, children))
    }
}

fn append(node: SyntaxNode, extra: SyntaxNode) -> SyntaxNode {
    use crate::syntax::ParseTree;

    let kind = node.kind();
    let start = node.start();
    let mut children = node.children().to_vec();
    children.push(extra);
    SyntaxNode::node(kind, start, children)
}
