/// Tokens produced by the class-file lexer.
use crate::span::Span;

/// The kind of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Integer literal, e.g. `42`, `16rFF`. Range checking happens in the parser.
    Integer(i64),
    /// Floating-point literal, e.g. `3.14`, `1.5e3`.
    Float(f64),
    /// String literal without the surrounding quotes, `''` already unescaped.
    String(std::string::String),
    /// Character literal, e.g. `$a`.
    Char(char),
    /// Symbol, e.g. `#Point`. Only used in class headers and primitive pragmas.
    Symbol(std::string::String),

    /// An identifier, e.g. `x`, `Transcript`, `printOn`.
    Identifier(std::string::String),
    /// A keyword part including its colon, e.g. `at:`, `subclass:`.
    Keyword(std::string::String),
    /// A block parameter, e.g. `:each` (name stored without the colon).
    BlockArg(std::string::String),
    /// A binary selector, e.g. `+`, `<=`, `~=`, `,`.
    Operator(std::string::String),

    SelfKw,
    SuperKw,
    NilKw,
    TrueKw,
    FalseKw,

    /// `:=`
    Assign,
    /// `^`
    Caret,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `|`, both the variable-list delimiter and the binary selector.
    Pipe,
    /// `.`
    Dot,

    /// `"..."`, text without the quotes.
    Comment(std::string::String),

    Eof,
    /// An unrecognized character or malformed literal.
    Error(std::string::String),
}

impl TokenKind {
    /// Human-readable name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Char(_) => "character",
            Self::Symbol(_) => "symbol",
            Self::Identifier(_) => "identifier",
            Self::Keyword(_) => "keyword",
            Self::BlockArg(_) => "block parameter",
            Self::Operator(_) => "binary operator",
            Self::SelfKw => "`self`",
            Self::SuperKw => "`super`",
            Self::NilKw => "`nil`",
            Self::TrueKw => "`true`",
            Self::FalseKw => "`false`",
            Self::Assign => "`:=`",
            Self::Caret => "`^`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::Pipe => "`|`",
            Self::Dot => "`.`",
            Self::Comment(_) => "comment",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Maps a reserved word to its token, if `word` is one.
    pub fn reserved(word: &str) -> Option<TokenKind> {
        Some(match word {
            "self" => Self::SelfKw,
            "super" => Self::SuperKw,
            "nil" => Self::NilKw,
            "true" => Self::TrueKw,
            "false" => Self::FalseKw,
            _ => return None,
        })
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// The source text this token was lexed from.
    pub lexeme: std::string::String,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        span: Span,
        lexeme: impl Into<std::string::String>,
    ) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}
