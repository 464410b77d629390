/// Lexer for Smalltalk class files.
///
/// The [`Lexer`] walks a source string and implements [`Iterator`] over
/// [`Token`]s, ending with exactly one [`TokenKind::Eof`]. Malformed input
/// never stops the iterator; it yields a [`TokenKind::Error`] token and
/// carries on, leaving it to the parser to report.
///
/// # Lexical syntax
///
/// | Syntax        | Token                         |
/// |---------------|-------------------------------|
/// | `"…"`         | comment                       |
/// | `'it''s'`     | string (`''` is one quote)    |
/// | `$c`          | character                     |
/// | `#Name`       | symbol                        |
/// | `at:`         | keyword                       |
/// | `:each`       | block parameter               |
/// | `16rFF`, `1.5e3` | integer, float             |
use crate::span::{Pos, Span};
use crate::token::{Token, TokenKind};

// ═══════════════════════════════════════════════════════════════════
// Character classes
// ═══════════════════════════════════════════════════════════════════

/// Characters that make up binary selectors. `|` is lexed on its own
/// as [`TokenKind::Pipe`] and promoted to an operator by the parser.
fn is_op_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '\\' | '<' | '>' | '=' | '~' | ',' | '@'
            | '%' | '&' | '?' | '!'
    )
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ═══════════════════════════════════════════════════════════════════
// Cursor: character stream with position tracking
// ═══════════════════════════════════════════════════════════════════

struct Cursor<'a> {
    rest: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.offset, self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// The character after [`Cursor::peek`].
    fn peek_second(&self) -> Option<char> {
        self.rest.chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        self.rest = &self.rest[c.len_utf8()..];
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, raw: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            raw.push(c);
            self.bump();
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Lexer
// ═══════════════════════════════════════════════════════════════════

/// A lexer over an in-memory source string.
///
/// ```rust
/// use parser::{Lexer, TokenKind};
///
/// let kinds: Vec<_> = Lexer::from_str("x at: 1").map(|t| t.kind).collect();
/// assert_eq!(kinds[1], TokenKind::Keyword("at:".into()));
/// ```
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    emitted_eof: bool,
}

impl<'a> Lexer<'a> {
    pub fn from_str(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
        }
    }

    fn token(&self, kind: TokenKind, start: Pos, raw: impl Into<String>) -> Token {
        Token::new(kind, Span::new(start, self.cursor.pos()), raw)
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.cursor.pos();
        let c = self.cursor.bump().unwrap_or_default();
        self.token(kind, start, c.to_string())
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.cursor.peek(), Some(c) if c.is_whitespace()) {
            self.cursor.bump();
        }
    }

    // ───────────────────────────────────────────────────────────
    //  Comments and strings
    // ───────────────────────────────────────────────────────────

    fn lex_comment(&mut self) -> Token {
        let start = self.cursor.pos();
        self.cursor.bump();
        let mut text = String::new();
        loop {
            match self.cursor.bump() {
                Some('"') => break,
                Some(c) => text.push(c),
                None => {
                    return self.token(
                        TokenKind::Error("unterminated comment".into()),
                        start,
                        format!("\"{text}"),
                    );
                }
            }
        }
        let raw = format!("\"{text}\"");
        self.token(TokenKind::Comment(text), start, raw)
    }

    fn lex_string(&mut self) -> Token {
        let start = self.cursor.pos();
        self.cursor.bump();
        let mut value = String::new();
        let mut raw = String::from("'");
        loop {
            match self.cursor.bump() {
                Some('\'') if self.cursor.peek() == Some('\'') => {
                    self.cursor.bump();
                    raw.push_str("''");
                    value.push('\'');
                }
                Some('\'') => {
                    raw.push('\'');
                    break;
                }
                Some(c) => {
                    raw.push(c);
                    value.push(c);
                }
                None => {
                    return self.token(
                        TokenKind::Error("unterminated string".into()),
                        start,
                        raw,
                    );
                }
            }
        }
        self.token(TokenKind::String(value), start, raw)
    }

    fn lex_char(&mut self) -> Token {
        let start = self.cursor.pos();
        self.cursor.bump();
        match self.cursor.bump() {
            Some(c) => self.token(TokenKind::Char(c), start, format!("${c}")),
            None => self.token(
                TokenKind::Error("expected character after `$`".into()),
                start,
                "$",
            ),
        }
    }

    fn lex_symbol(&mut self) -> Token {
        let start = self.cursor.pos();
        self.cursor.bump();
        let mut name = String::new();
        self.cursor.bump_while(&mut name, |c| is_ident_continue(c) || c == ':');
        if name.is_empty() {
            return self.token(
                TokenKind::Error("expected name after `#`".into()),
                start,
                "#",
            );
        }
        let raw = format!("#{name}");
        self.token(TokenKind::Symbol(name), start, raw)
    }

    // ───────────────────────────────────────────────────────────
    //  Numbers
    // ───────────────────────────────────────────────────────────

    /// Lex `123`, `16rFF`, `3.25` or `1e6` / `2.5e-3`.
    fn lex_number(&mut self) -> Token {
        let start = self.cursor.pos();
        let mut raw = String::new();
        self.cursor.bump_while(&mut raw, |c| c.is_ascii_digit());

        if matches!(self.cursor.peek(), Some('r'))
            && matches!(self.cursor.peek_second(), Some(c) if c.is_ascii_alphanumeric())
        {
            return self.lex_radix(start, raw);
        }

        let mut is_float = false;
        if self.cursor.peek() == Some('.')
            && matches!(self.cursor.peek_second(), Some(c) if c.is_ascii_digit())
        {
            is_float = true;
            raw.push('.');
            self.cursor.bump();
            self.cursor.bump_while(&mut raw, |c| c.is_ascii_digit());
        }

        if self.cursor.peek() == Some('e') {
            let next = self.cursor.peek_second();
            let signed_digit = next == Some('-') && {
                matches!(self.cursor.rest.chars().nth(2), Some(c) if c.is_ascii_digit())
            };
            if matches!(next, Some(c) if c.is_ascii_digit()) || signed_digit {
                is_float = true;
                raw.push('e');
                self.cursor.bump();
                if signed_digit {
                    raw.push('-');
                    self.cursor.bump();
                }
                self.cursor.bump_while(&mut raw, |c| c.is_ascii_digit());
            }
        }

        let kind = if is_float {
            match raw.parse::<f64>() {
                Ok(v) => TokenKind::Float(v),
                Err(e) => TokenKind::Error(format!("invalid float: {e}")),
            }
        } else {
            match raw.parse::<i64>() {
                Ok(v) => TokenKind::Integer(v),
                Err(e) => TokenKind::Error(format!("invalid integer: {e}")),
            }
        };
        self.token(kind, start, raw)
    }

    fn lex_radix(&mut self, start: Pos, mut raw: String) -> Token {
        let base = match raw.parse::<u32>() {
            Ok(b) if (2..=36).contains(&b) => b,
            _ => {
                return self.token(
                    TokenKind::Error(format!("invalid number base: {raw}")),
                    start,
                    raw,
                );
            }
        };
        raw.push('r');
        self.cursor.bump();
        let mut digits = String::new();
        self.cursor.bump_while(&mut digits, |c| c.is_ascii_alphanumeric());
        raw.push_str(&digits);
        let kind = match i64::from_str_radix(&digits, base) {
            Ok(v) => TokenKind::Integer(v),
            Err(_) => TokenKind::Error(format!("invalid digits for base {base}")),
        };
        self.token(kind, start, raw)
    }

    // ───────────────────────────────────────────────────────────
    //  Identifiers, keywords, block parameters
    // ───────────────────────────────────────────────────────────

    fn lex_word(&mut self) -> Token {
        let start = self.cursor.pos();
        let mut raw = String::new();
        self.cursor.bump_while(&mut raw, is_ident_continue);

        // `at:` is a keyword but `x:=` is an identifier followed by `:=`.
        if self.cursor.peek() == Some(':') && self.cursor.peek_second() != Some('=') {
            self.cursor.bump();
            raw.push(':');
            return self.token(TokenKind::Keyword(raw.clone()), start, raw);
        }

        let kind = TokenKind::reserved(&raw)
            .unwrap_or_else(|| TokenKind::Identifier(raw.clone()));
        self.token(kind, start, raw)
    }

    fn lex_colon(&mut self) -> Token {
        let start = self.cursor.pos();
        self.cursor.bump();
        if self.cursor.peek() == Some('=') {
            self.cursor.bump();
            return self.token(TokenKind::Assign, start, ":=");
        }
        let mut name = String::new();
        if matches!(self.cursor.peek(), Some(c) if is_ident_start(c)) {
            self.cursor.bump_while(&mut name, is_ident_continue);
        }
        if name.is_empty() {
            return self.token(
                TokenKind::Error("expected parameter name after `:`".into()),
                start,
                ":",
            );
        }
        let raw = format!(":{name}");
        self.token(TokenKind::BlockArg(name), start, raw)
    }

    fn lex_operator(&mut self) -> Token {
        let start = self.cursor.pos();
        let mut raw = String::new();
        self.cursor.bump_while(&mut raw, is_op_char);
        self.token(TokenKind::Operator(raw.clone()), start, raw)
    }

    // ───────────────────────────────────────────────────────────
    //  Main dispatch
    // ───────────────────────────────────────────────────────────

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, Span::point(start), "");
        };

        match c {
            '"' => self.lex_comment(),
            '\'' => self.lex_string(),
            '$' => self.lex_char(),
            '#' => self.lex_symbol(),
            ':' => self.lex_colon(),
            '^' => self.single(TokenKind::Caret),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '|' => self.single(TokenKind::Pipe),
            '.' => self.single(TokenKind::Dot),
            '0'..='9' => self.lex_number(),
            c if is_ident_start(c) => self.lex_word(),
            c if is_op_char(c) => self.lex_operator(),
            c => {
                self.cursor.bump();
                self.token(
                    TokenKind::Error(format!("unexpected character: {c:?}")),
                    start,
                    c.to_string(),
                )
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let tok = self.next_token();
        if tok.is_eof() {
            self.emitted_eof = true;
        }
        Some(tok)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════
