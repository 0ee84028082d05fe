//! Error handling for sqtyped

use crate::utils::{Position, Span};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Analyzer error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexer Errors ====================

    #[error("Unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("Unterminated block comment")]
    UnterminatedComment { span: Span },

    #[error("Unexpected character '{ch}'")]
    UnexpectedChar { ch: char, span: Span },

    // ==================== Parser Errors ====================

    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Expected identifier, got {got}")]
    ExpectedIdent { got: String, span: Span },

    #[error("Expected type, got {got}")]
    ExpectedType { got: String, span: Span },

    #[error("Expected expression, got {got}")]
    ExpectedExpr { got: String, span: Span },

    #[error("Nesting too deep")]
    NestingTooDeep { span: Span },

    // ==================== Extraction Errors ====================

    #[error("Malformed {kind} at {position}: missing {missing}")]
    MalformedNode {
        kind: String,
        missing: &'static str,
        position: Position,
    },

    // ==================== Annotation Errors ====================

    #[error("Invalid type annotation '{text}': {reason}")]
    InvalidAnnotation { text: String, reason: String },
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnterminatedString { span } => Some(*span),
            Self::UnterminatedComment { span } => Some(*span),
            Self::UnexpectedChar { span, .. } => Some(*span),
            Self::UnexpectedToken { span, .. } => Some(*span),
            Self::ExpectedIdent { span, .. } => Some(*span),
            Self::ExpectedType { span, .. } => Some(*span),
            Self::ExpectedExpr { span, .. } => Some(*span),
            Self::NestingTooDeep { span } => Some(*span),
            Self::MalformedNode { .. } | Self::InvalidAnnotation { .. } => None,
        }
    }

    /// Get the source position associated with this error
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::MalformedNode { position, .. } => Some(*position),
            _ => self.span().map(|s| s.position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_of_parse_error() {
        let err = Error::ExpectedIdent {
            got: "'('".to_string(),
            span: Span::new(3, 4, Position::new(2, 7)),
        };
        assert_eq!(err.position(), Some(Position::new(2, 7)));
        assert_eq!(err.to_string(), "Expected identifier, got '('");
    }

    #[test]
    fn test_malformed_node_message() {
        let err = Error::MalformedNode {
            kind: "LocalDecl".to_string(),
            missing: "identifier",
            position: Position::new(4, 2),
        };
        assert_eq!(err.to_string(), "Malformed LocalDecl at 4:2: missing identifier");
        assert_eq!(err.span(), None);
        assert_eq!(err.position(), Some(Position::new(4, 2)));
    }
}
