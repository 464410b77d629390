use crate::ast::{
    AstArena, BlockLiteral, Body, ClassDef, ExprId, ExprKind, ExprNode, Ident,
    KeywordPair, MethodBody, MethodDef, SourceFile, keyword_selector,
};
use crate::span::{Pos, Span};
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

impl std::error::Error for ParseError {}

type PResult<T> = Result<T, ParseError>;

/// Result of the unary/binary levels before `super` has received its
/// message. `super` is only meaningful as the receiver of a send.
enum Operand {
    Expr(ExprId),
    Super(Span),
}

/// Recursive-descent parser for a whole class file.
///
/// Syntax errors inside a class definition are recorded and the parser
/// resumes after that class's closing bracket, so one run can report
/// several broken classes.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    arena: AstArena,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| !t.kind.is_comment())
            .collect();
        if !tokens.last().is_some_and(Token::is_eof) {
            let end = tokens.last().map_or(Pos::origin(), |t| t.span.end);
            tokens.push(Token::new(TokenKind::Eof, Span::point(end), ""));
        }
        Self {
            tokens,
            pos: 0,
            arena: AstArena::default(),
            errors: Vec::new(),
        }
    }

    pub fn parse_file(mut self) -> Result<SourceFile, Vec<ParseError>> {
        let mut classes = Vec::new();
        while self.at_class_header() {
            let start = self.pos;
            match self.parse_class() {
                Ok(class) => classes.push(class),
                Err(err) => {
                    self.errors.push(err);
                    self.skip_class(start);
                }
            }
        }

        let main = match self.parse_body(&TokenKind::Eof) {
            Ok(body) => body,
            Err(err) => {
                self.errors.push(err);
                Body::default()
            }
        };

        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        Ok(SourceFile {
            classes,
            main,
            end: self.peek_span(),
            arena: self.arena,
        })
    }

    // ───────────────────────────────────────────────────────────
    //  Token access
    // ───────────────────────────────────────────────────────────

    fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek_nth(0).kind
    }

    fn peek_span(&self) -> Span {
        self.peek_nth(0).span
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek_nth(0).clone();
        if !tok.is_eof() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, expected: &TokenKind) -> PResult<Token> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected.name()))
        }
    }

    fn expect_ident(&mut self) -> PResult<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let tok = self.advance();
                Ok(Ident::new(name, tok.span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Error for the current token; lexer errors keep their own message.
    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.peek_nth(0);
        match &tok.kind {
            TokenKind::Error(message) => ParseError::new(message.clone(), tok.span),
            found => ParseError::new(
                format!("expected {expected}, found {}", found.name()),
                tok.span,
            ),
        }
    }

    fn alloc_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.arena.alloc(ExprNode { kind, span })
    }

    fn span_of(&self, id: ExprId) -> Span {
        self.arena.get(id).span
    }

    // ───────────────────────────────────────────────────────────
    //  Classes and methods
    // ───────────────────────────────────────────────────────────

    fn at_class_header(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Identifier(_) | TokenKind::NilKw)
            && matches!(&self.peek_nth(1).kind, TokenKind::Keyword(k) if k == "subclass:")
    }

    /// Resume after the bracketed body of the class starting at token `start`.
    fn skip_class(&mut self, start: usize) {
        self.pos = start;
        while !self.check(&TokenKind::LBracket) && !self.check(&TokenKind::Eof) {
            self.advance();
        }
        let mut depth = 0usize;
        loop {
            match self.advance().kind {
                TokenKind::LBracket => depth += 1,
                TokenKind::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
        }
    }

    fn parse_class(&mut self) -> PResult<ClassDef> {
        let head = self.advance();
        let superclass = match head.kind {
            TokenKind::Identifier(name) => Some(Ident::new(name, head.span)),
            _ => None,
        };
        self.advance();

        let name = match self.peek_kind().clone() {
            TokenKind::Symbol(name) => Ident::new(name, self.advance().span),
            _ => return Err(self.unexpected("class name symbol")),
        };
        self.expect(&TokenKind::LBracket)?;

        let fields = if self.check(&TokenKind::Pipe) {
            self.parse_var_list()?
        } else {
            Vec::new()
        };

        let mut methods = Vec::new();
        while !self.check(&TokenKind::RBracket) && !self.check(&TokenKind::Eof) {
            methods.push(self.parse_method()?);
        }
        let close = self.expect(&TokenKind::RBracket)?;

        Ok(ClassDef {
            name,
            superclass,
            fields,
            methods,
            span: head.span.merge(close.span),
        })
    }

    /// `| a b c |`
    fn parse_var_list(&mut self) -> PResult<Vec<Ident>> {
        self.expect(&TokenKind::Pipe)?;
        let mut names = Vec::new();
        while !self.check(&TokenKind::Pipe) {
            names.push(self.expect_ident()?);
        }
        self.advance();
        Ok(names)
    }

    fn parse_method(&mut self) -> PResult<MethodDef> {
        let start = self.peek_span();
        let is_class_method = matches!(self.peek_kind(), TokenKind::Identifier(c) if c == "class")
            && matches!(
                self.peek_nth(1).kind,
                TokenKind::Identifier(_)
                    | TokenKind::Keyword(_)
                    | TokenKind::Operator(_)
                    | TokenKind::Pipe
            );
        if is_class_method {
            self.advance();
        }

        let (selector, selector_span, params) = match self.peek_kind().clone() {
            TokenKind::Identifier(name) => (name, self.advance().span, Vec::new()),
            TokenKind::Operator(_) | TokenKind::Pipe => {
                let tok = self.advance();
                let param = self.expect_ident()?;
                (tok.lexeme, tok.span, vec![param])
            }
            TokenKind::Keyword(_) => {
                let mut selector = String::new();
                let mut span = self.peek_span();
                let mut params = Vec::new();
                while let TokenKind::Keyword(kw) = self.peek_kind().clone() {
                    span = span.merge(self.advance().span);
                    selector.push_str(&kw);
                    params.push(self.expect_ident()?);
                }
                (selector, span, params)
            }
            _ => return Err(self.unexpected("method definition")),
        };

        let (body, close) = match self.peek_kind() {
            TokenKind::LBracket => {
                self.advance();
                let body = self.parse_body(&TokenKind::RBracket)?;
                let close = self.expect(&TokenKind::RBracket)?.span;
                (MethodBody::Code(body), close)
            }
            TokenKind::Operator(op) if op == "<" => {
                self.advance();
                match self.peek_kind() {
                    TokenKind::Keyword(k) if k == "primitive:" => {
                        self.advance();
                    }
                    _ => return Err(self.unexpected("`primitive:`")),
                }
                let name = match self.peek_kind().clone() {
                    TokenKind::Symbol(name) => Ident::new(name, self.advance().span),
                    _ => return Err(self.unexpected("primitive name symbol")),
                };
                let close = match self.peek_kind() {
                    TokenKind::Operator(op) if op == ">" => self.advance().span,
                    _ => return Err(self.unexpected("`>`")),
                };
                (MethodBody::Primitive(name), close)
            }
            _ => return Err(self.unexpected("`[` or `<primitive:`")),
        };

        Ok(MethodDef {
            selector,
            selector_span,
            params,
            is_class_method,
            body,
            span: start.merge(close),
            close,
        })
    }

    // ───────────────────────────────────────────────────────────
    //  Bodies and statements
    // ───────────────────────────────────────────────────────────

    /// Parses temporaries and statements up to (not including) `end`.
    fn parse_body(&mut self, end: &TokenKind) -> PResult<Body> {
        let locals = if self.check(&TokenKind::Pipe) {
            self.parse_var_list()?
        } else {
            Vec::new()
        };

        let mut statements = Vec::new();
        loop {
            while self.check(&TokenKind::Dot) {
                self.advance();
            }
            if self.check(end) {
                break;
            }
            statements.push(self.parse_statement()?);
            if !self.check(&TokenKind::Dot) {
                break;
            }
        }

        if !self.check(end) {
            return Err(self.unexpected(&format!("`.` or {}", end.name())));
        }
        Ok(Body { locals, statements })
    }

    fn parse_statement(&mut self) -> PResult<ExprId> {
        if self.check(&TokenKind::Caret) {
            let caret = self.advance();
            let value = self.parse_expression()?;
            let span = caret.span.merge(self.span_of(value));
            return Ok(self.alloc_expr(ExprKind::Return(value), span));
        }

        if matches!(self.peek_nth(1).kind, TokenKind::Assign) {
            let tok = self.advance();
            let name = match tok.kind {
                TokenKind::Identifier(name) => name,
                other => {
                    return Err(ParseError::new(
                        format!("cannot assign to {}", other.name()),
                        tok.span,
                    ));
                }
            };
            self.advance();
            let target = self.alloc_expr(ExprKind::Ident(name), tok.span);
            let value = self.parse_expression()?;
            let span = tok.span.merge(self.span_of(value));
            return Ok(self.alloc_expr(ExprKind::Assignment { target, value }, span));
        }

        self.parse_expression()
    }

    // ───────────────────────────────────────────────────────────
    //  Expressions: keyword < binary < unary < primary
    // ───────────────────────────────────────────────────────────

    pub fn parse_expression(&mut self) -> PResult<ExprId> {
        let receiver = self.parse_binary_operand()?;
        if !matches!(self.peek_kind(), TokenKind::Keyword(_)) {
            return self.finish_operand(receiver);
        }

        let mut pairs = Vec::new();
        while let TokenKind::Keyword(keyword) = self.peek_kind().clone() {
            let kt = self.advance();
            let argument = self.parse_binary_level()?;
            pairs.push(KeywordPair {
                keyword,
                keyword_span: kt.span,
                span: kt.span.merge(self.span_of(argument)),
                argument,
            });
        }

        let first = pairs[0].keyword_span;
        let last = pairs[pairs.len() - 1].span;
        Ok(match receiver {
            Operand::Expr(receiver) => {
                let span = self.span_of(receiver).merge(last);
                self.alloc_expr(ExprKind::KeywordMessage { receiver, pairs }, span)
            }
            Operand::Super(span) => {
                let selector = keyword_selector(&pairs);
                let selector_span = first.merge(pairs[pairs.len() - 1].keyword_span);
                let arguments = pairs.iter().map(|p| p.argument).collect();
                self.alloc_expr(
                    ExprKind::SuperSend {
                        selector,
                        selector_span,
                        arguments,
                    },
                    span.merge(last),
                )
            }
        })
    }

    fn finish_operand(&self, operand: Operand) -> PResult<ExprId> {
        match operand {
            Operand::Expr(id) => Ok(id),
            Operand::Super(span) => Err(ParseError::new("expected message after `super`", span)),
        }
    }

    fn parse_binary_level(&mut self) -> PResult<ExprId> {
        let operand = self.parse_binary_operand()?;
        self.finish_operand(operand)
    }

    fn parse_binary_operand(&mut self) -> PResult<Operand> {
        let mut left = self.parse_unary_operand()?;
        while matches!(self.peek_kind(), TokenKind::Operator(_) | TokenKind::Pipe) {
            let op = self.advance();
            let argument = self.parse_unary_level()?;
            left = Operand::Expr(match left {
                Operand::Expr(receiver) => {
                    let span = self.span_of(receiver).merge(self.span_of(argument));
                    self.alloc_expr(
                        ExprKind::BinaryMessage {
                            receiver,
                            operator: op.lexeme,
                            operator_span: op.span,
                            argument,
                        },
                        span,
                    )
                }
                Operand::Super(span) => {
                    let span = span.merge(self.span_of(argument));
                    self.alloc_expr(
                        ExprKind::SuperSend {
                            selector: op.lexeme,
                            selector_span: op.span,
                            arguments: vec![argument],
                        },
                        span,
                    )
                }
            });
        }
        Ok(left)
    }

    fn parse_unary_level(&mut self) -> PResult<ExprId> {
        let operand = self.parse_unary_operand()?;
        self.finish_operand(operand)
    }

    fn parse_unary_operand(&mut self) -> PResult<Operand> {
        let mut operand = if self.check(&TokenKind::SuperKw) {
            Operand::Super(self.advance().span)
        } else {
            Operand::Expr(self.parse_primary()?)
        };

        while let TokenKind::Identifier(selector) = self.peek_kind().clone() {
            let tok = self.advance();
            operand = Operand::Expr(match operand {
                Operand::Expr(receiver) => {
                    let span = self.span_of(receiver).merge(tok.span);
                    self.alloc_expr(
                        ExprKind::UnaryMessage {
                            receiver,
                            selector,
                            selector_span: tok.span,
                        },
                        span,
                    )
                }
                Operand::Super(span) => self.alloc_expr(
                    ExprKind::SuperSend {
                        selector,
                        selector_span: tok.span,
                        arguments: Vec::new(),
                    },
                    span.merge(tok.span),
                ),
            });
        }
        Ok(operand)
    }

    fn parse_primary(&mut self) -> PResult<ExprId> {
        let tok = self.peek_nth(0).clone();
        let kind = match tok.kind {
            TokenKind::Integer(v) => {
                self.advance();
                ExprKind::Integer(int_literal(v, tok.span)?)
            }
            TokenKind::Float(v) => {
                self.advance();
                ExprKind::Float(v as f32)
            }
            TokenKind::Operator(ref op) if op == "-" => return self.parse_negative(),
            TokenKind::Char(c) => {
                self.advance();
                if c as u32 > u32::from(u16::MAX) {
                    return Err(ParseError::new(
                        "character literal does not fit in 16 bits",
                        tok.span,
                    ));
                }
                ExprKind::Char(c)
            }
            TokenKind::String(s) => {
                self.advance();
                ExprKind::String(s)
            }
            TokenKind::NilKw => {
                self.advance();
                ExprKind::Nil
            }
            TokenKind::TrueKw => {
                self.advance();
                ExprKind::True
            }
            TokenKind::FalseKw => {
                self.advance();
                ExprKind::False
            }
            TokenKind::SelfKw => {
                self.advance();
                ExprKind::SelfRef
            }
            TokenKind::Identifier(name) => {
                self.advance();
                ExprKind::Ident(name)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => return self.parse_block(),
            TokenKind::LBrace => return self.parse_array(),
            TokenKind::Caret => {
                return Err(ParseError::new(
                    "`^` is only allowed at the start of a statement",
                    tok.span,
                ));
            }
            TokenKind::Symbol(_) => {
                return Err(ParseError::new(
                    "symbol literals are only allowed in class headers and primitives",
                    tok.span,
                ));
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(self.alloc_expr(kind, tok.span))
    }

    /// `-` directly in operand position negates a numeric literal.
    fn parse_negative(&mut self) -> PResult<ExprId> {
        let minus = self.advance();
        let tok = self.peek_nth(0).clone();
        let span = minus.span.merge(tok.span);
        let kind = match tok.kind {
            TokenKind::Integer(v) => ExprKind::Integer(int_literal(-v, span)?),
            TokenKind::Float(v) => ExprKind::Float(-v as f32),
            _ => return Err(self.unexpected("number after `-`")),
        };
        self.advance();
        Ok(self.alloc_expr(kind, span))
    }

    fn parse_block(&mut self) -> PResult<ExprId> {
        let open = self.advance();
        let mut params = Vec::new();
        while let TokenKind::BlockArg(name) = self.peek_kind().clone() {
            params.push(Ident::new(name, self.advance().span));
        }
        if !params.is_empty() && !self.check(&TokenKind::RBracket) {
            self.expect(&TokenKind::Pipe)?;
        }

        let body = self.parse_body(&TokenKind::RBracket)?;
        let close = self.expect(&TokenKind::RBracket)?.span;
        Ok(self.alloc_expr(
            ExprKind::Block(BlockLiteral {
                params,
                body,
                close,
            }),
            open.span.merge(close),
        ))
    }

    fn parse_array(&mut self) -> PResult<ExprId> {
        let open = self.advance();
        let mut items = Vec::new();
        loop {
            while self.check(&TokenKind::Dot) {
                self.advance();
            }
            if self.check(&TokenKind::RBrace) {
                break;
            }
            items.push(self.parse_expression()?);
            if !self.check(&TokenKind::Dot) && !self.check(&TokenKind::RBrace) {
                return Err(self.unexpected("`.` or `}`"));
            }
        }
        let close = self.advance();
        Ok(self.alloc_expr(ExprKind::Array(items), open.span.merge(close.span)))
    }
}

fn int_literal(value: i64, span: Span) -> PResult<i32> {
    i32::try_from(value)
        .map_err(|_| ParseError::new("integer literal does not fit in 32 bits", span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> SourceFile {
        match Parser::new(Lexer::from_str(src)).parse_file() {
            Ok(file) => file,
            Err(errors) => panic!("parse failed: {errors:?}"),
        }
    }

    fn parse_errors(src: &str) -> Vec<ParseError> {
        Parser::new(Lexer::from_str(src))
            .parse_file()
            .expect_err("expected parse errors")
    }

    fn main_stmt(file: &SourceFile, i: usize) -> &ExprKind {
        &file.arena[file.main.statements[i]].kind
    }

    #[test]
    fn parse_class_header_and_fields() {
        let file = parse("Object subclass: #Point [ | x y | x [ ^x ] ]");
        assert_eq!(file.classes.len(), 1);
        let class = &file.classes[0];
        assert_eq!(class.name.name, "Point");
        assert_eq!(class.superclass.as_ref().map(|s| s.name.as_str()), Some("Object"));
        let fields: Vec<_> = class.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, ["x", "y"]);
        assert_eq!(class.methods[0].selector, "x");
    }

    #[test]
    fn parse_root_class() {
        let file = parse("nil subclass: #Object [ ]");
        assert!(file.classes[0].superclass.is_none());
    }

    #[test]
    fn parse_method_forms() {
        let file = parse(
            "Object subclass: #T [
                foo [ ]
                + other [ ^other ]
                at: i put: v [ ^v ]
                class new [ ^super new ]
                size <primitive: #T_size>
            ]",
        );
        let methods = &file.classes[0].methods;
        let sels: Vec<_> = methods.iter().map(|m| m.selector.as_str()).collect();
        assert_eq!(sels, ["foo", "+", "at:put:", "new", "size"]);
        assert_eq!(methods[2].params.len(), 2);
        assert!(methods[3].is_class_method);
        assert!(!methods[0].is_class_method);
        match &methods[4].body {
            MethodBody::Primitive(name) => assert_eq!(name.name, "T_size"),
            other => panic!("expected primitive, got {other:?}"),
        }
    }

    #[test]
    fn method_named_class() {
        let file = parse("Object subclass: #T [ class [ ^1 ] ]");
        let m = &file.classes[0].methods[0];
        assert_eq!(m.selector, "class");
        assert!(!m.is_class_method);
    }

    #[test]
    fn unary_binds_tighter_than_binary_tighter_than_keyword() {
        let file = parse("a at: b + c d");
        let ExprKind::KeywordMessage { receiver, pairs } = main_stmt(&file, 0) else {
            panic!("expected keyword message");
        };
        assert_eq!(file.arena[*receiver].kind, ExprKind::Ident("a".into()));
        let ExprKind::BinaryMessage { argument, .. } = &file.arena[pairs[0].argument].kind else {
            panic!("expected binary message");
        };
        assert!(matches!(
            &file.arena[*argument].kind,
            ExprKind::UnaryMessage { selector, .. } if selector == "d"
        ));
    }

    #[test]
    fn binary_is_left_associative_without_precedence() {
        let file = parse("1 + 2 * 3");
        let ExprKind::BinaryMessage { receiver, operator, .. } = main_stmt(&file, 0) else {
            panic!("expected binary message");
        };
        assert_eq!(operator, "*");
        assert!(matches!(
            &file.arena[*receiver].kind,
            ExprKind::BinaryMessage { operator, .. } if operator == "+"
        ));
    }

    #[test]
    fn super_forms() {
        let file = parse("super foo. super + 1. super at: 1 put: 2. super foo bar");
        let sel = |i: usize| match main_stmt(&file, i) {
            ExprKind::SuperSend {
                selector, arguments, ..
            } => (selector.clone(), arguments.len()),
            other => panic!("expected super send, got {other:?}"),
        };
        assert_eq!(sel(0), ("foo".into(), 0));
        assert_eq!(sel(1), ("+".into(), 1));
        assert_eq!(sel(2), ("at:put:".into(), 2));
        assert!(matches!(
            main_stmt(&file, 3),
            ExprKind::UnaryMessage { selector, .. } if selector == "bar"
        ));
    }

    #[test]
    fn bare_super_is_an_error() {
        let errors = parse_errors("x := super");
        assert!(errors[0].message.contains("super"));
    }

    #[test]
    fn assignment_and_return_statements() {
        let file = parse("| t | t := 3. ^t");
        assert_eq!(file.main.locals[0].name, "t");
        assert!(matches!(main_stmt(&file, 0), ExprKind::Assignment { .. }));
        assert!(matches!(main_stmt(&file, 1), ExprKind::Return(_)));
    }

    #[test]
    fn assigning_to_reserved_word_is_an_error() {
        let errors = parse_errors("self := 3");
        assert_eq!(errors[0].message, "cannot assign to `self`");
    }

    #[test]
    fn block_with_params_and_locals() {
        let file = parse("[:a :b | | t | t := a. b]");
        let ExprKind::Block(block) = main_stmt(&file, 0) else {
            panic!("expected block");
        };
        assert_eq!(block.params.len(), 2);
        assert_eq!(block.body.locals.len(), 1);
        assert_eq!(block.body.statements.len(), 2);
    }

    #[test]
    fn literals() {
        let file = parse("-5. 2.5. $a. 'hi'. nil. true. false. self. {1. 2}");
        assert_eq!(main_stmt(&file, 0), &ExprKind::Integer(-5));
        assert_eq!(main_stmt(&file, 1), &ExprKind::Float(2.5));
        assert_eq!(main_stmt(&file, 2), &ExprKind::Char('a'));
        assert_eq!(main_stmt(&file, 3), &ExprKind::String("hi".into()));
        assert_eq!(main_stmt(&file, 4), &ExprKind::Nil);
        assert!(matches!(main_stmt(&file, 8), ExprKind::Array(items) if items.len() == 2));
    }

    #[test]
    fn integer_out_of_range() {
        let errors = parse_errors("4294967296");
        assert!(errors[0].message.contains("32 bits"));
        parse("-2147483648");
    }

    #[test]
    fn recovers_at_class_boundaries() {
        let errors = parse_errors(
            "Object subclass: #A [ foo [ ^ ] ]
             Object subclass: #B [ bar [ ^1 ] ]
             Object subclass: #C [ baz [ ) ] ]",
        );
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].span.start.line, 1);
        assert_eq!(errors[1].span.start.line, 3);
    }

    #[test]
    fn lexer_errors_surface_with_their_message() {
        let errors = parse_errors("x := 'open");
        assert_eq!(errors[0].message, "unterminated string");
    }

    #[test]
    fn missing_statement_separator() {
        let errors = parse_errors("Object subclass: #A [ foo [ 1 2 ] ]");
        assert!(errors[0].message.starts_with("expected `.` or `]`"));
    }
}
