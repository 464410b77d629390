use std::fmt;

use parser::{ParseError, Span};
use thiserror::Error;

/// A diagnostic produced while compiling one translation unit.
///
/// Everything except [`CompileError::Internal`] is a problem with the
/// input program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{span}: {message}")]
    Syntax { message: String, span: Span },

    #[error("{span}: redefinition of `{name}` in {scope}")]
    DuplicateDefinition {
        name: String,
        scope: String,
        span: Span,
    },

    #[error("{span}: cannot assign to `{name}`: not a field, argument or local")]
    InvalidAssignmentTarget { name: String, span: Span },

    #[error("{span}: unresolved reference to `{name}`")]
    UnresolvedReference { name: String, span: Span },

    #[error("{span}: class `{name}` inherits from itself")]
    CyclicInheritance { name: String, span: Span },

    #[error("{span}: too many {what} (at most 65535)")]
    LimitExceeded { what: &'static str, span: Span },

    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CompileError {
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Syntax { span, .. }
            | Self::DuplicateDefinition { span, .. }
            | Self::InvalidAssignmentTarget { span, .. }
            | Self::UnresolvedReference { span, .. }
            | Self::CyclicInheritance { span, .. }
            | Self::LimitExceeded { span, .. } => Some(*span),
            Self::Internal(_) => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        Self::Syntax {
            message: err.message,
            span: err.span,
        }
    }
}

/// Every diagnostic of a failed compilation, in the order found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, CompileError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileErrors {}

impl From<CompileError> for CompileErrors {
    fn from(err: CompileError) -> Self {
        Self(vec![err])
    }
}

impl From<Vec<ParseError>> for CompileErrors {
    fn from(errors: Vec<ParseError>) -> Self {
        Self(errors.into_iter().map(CompileError::from).collect())
    }
}

impl IntoIterator for CompileErrors {
    type Item = CompileError;
    type IntoIter = std::vec::IntoIter<CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
