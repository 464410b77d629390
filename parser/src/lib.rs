//! # Parser
//!
//! Lexer and recursive-descent parser for Smalltalk class files.
//!
//! ```text
//!  &str ──▶ Lexer ──(Token iterator)──▶ Parser ──▶ SourceFile
//! ```
//!
//! ```rust
//! use parser::parse_source;
//!
//! let file = parse_source("Object subclass: #T [ run [ ^3 ] ]").unwrap();
//! assert_eq!(file.classes[0].methods[0].selector, "run");
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::{
    AstArena, BlockLiteral, Body, ClassDef, ExprId, ExprKind, ExprNode, Ident,
    KeywordPair, MethodBody, MethodDef, SourceFile,
};
pub use lexer::Lexer;
pub use parser::{ParseError, Parser};
pub use span::{Pos, Span};
pub use token::{Token, TokenKind};

/// Lexes and parses a complete class file.
pub fn parse_source(source: &str) -> Result<SourceFile, Vec<ParseError>> {
    Parser::new(Lexer::from_str(source)).parse_file()
}
