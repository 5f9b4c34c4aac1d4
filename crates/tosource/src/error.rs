//! Error types for literal encoding and decoding.

use thiserror::Error;

/// Error codes grouping decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Malformed literal syntax
    Syntax,
    /// E002: Valid syntax outside the supported literal subset
    Unsupported,
    /// E003: Constructor argument rejected
    InvalidArgument,
    /// E004: Resource limit exceeded
    LimitExceeded,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::Syntax => "E001",
            ErrorCode::Unsupported => "E002",
            ErrorCode::InvalidArgument => "E003",
            ErrorCode::LimitExceeded => "E004",
        }
    }
}

/// Error during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("can not convert circular structures (cycle at `{path}`)")]
    CircularStructure { path: String },

    #[error("handle {handle} does not belong to this graph")]
    UnknownHandle { handle: u32 },
}

/// Error while evaluating literal text back into a value graph.
///
/// Offsets are byte positions into the text handed to the parser, which is
/// the sanitized text unless decoding ran in unsafe mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    // === E001: Syntax ===
    #[error("[E001] unexpected token `{found}` at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        offset: usize,
    },

    #[error("[E001] unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("[E001] invalid or unterminated token `{text}` at offset {offset}")]
    InvalidToken { text: String, offset: usize },

    #[error("[E001] invalid escape sequence in string literal at offset {offset}")]
    InvalidEscape { offset: usize },

    #[error("[E001] invalid numeric literal `{text}` at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("[E001] trailing input `{found}` at offset {offset}")]
    TrailingInput { found: String, offset: usize },

    // === E002: Unsupported ===
    #[error("[E002] `{name}` is not defined (offset {offset})")]
    UnknownIdentifier { name: String, offset: usize },

    #[error("[E002] unsupported constructor `{name}` at offset {offset}")]
    UnsupportedConstructor { name: String, offset: usize },

    #[error("[E002] unsupported expression at offset {offset}: {context}")]
    UnsupportedExpression {
        context: &'static str,
        offset: usize,
    },

    // === E003: Invalid argument ===
    #[error("[E003] invalid argument for {constructor} at offset {offset}: {reason}")]
    InvalidArgument {
        constructor: &'static str,
        reason: &'static str,
        offset: usize,
    },

    #[error("[E003] invalid base64 payload at offset {offset}: {message}")]
    InvalidBase64 { message: String, offset: usize },

    #[error("[E003] invalid regular expression flags `{flags}` at offset {offset}")]
    InvalidPatternFlags { flags: String, offset: usize },

    // === E004: Limits ===
    #[error("[E004] nesting depth exceeds maximum {max}")]
    DepthExceeded { max: usize },

    #[error("[E004] source length {len} exceeds maximum {max}")]
    SourceTooLarge { len: usize, max: usize },
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::UnexpectedToken { .. }
            | DecodeError::UnexpectedEnd { .. }
            | DecodeError::InvalidToken { .. }
            | DecodeError::InvalidEscape { .. }
            | DecodeError::InvalidNumber { .. }
            | DecodeError::TrailingInput { .. } => ErrorCode::Syntax,
            DecodeError::UnknownIdentifier { .. }
            | DecodeError::UnsupportedConstructor { .. }
            | DecodeError::UnsupportedExpression { .. } => ErrorCode::Unsupported,
            DecodeError::InvalidArgument { .. }
            | DecodeError::InvalidBase64 { .. }
            | DecodeError::InvalidPatternFlags { .. } => ErrorCode::InvalidArgument,
            DecodeError::DepthExceeded { .. } | DecodeError::SourceTooLarge { .. } => {
                ErrorCode::LimitExceeded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DecodeError::UnexpectedEnd { expected: "value" };
        assert_eq!(err.code(), ErrorCode::Syntax);
        assert_eq!(err.code().code(), "E001");

        let err = DecodeError::UnknownIdentifier {
            name: "alert".to_string(),
            offset: 0,
        };
        assert_eq!(err.code().code(), "E002");

        let err = DecodeError::DepthExceeded { max: 4 };
        assert_eq!(err.code(), ErrorCode::LimitExceeded);
    }

    #[test]
    fn test_circular_message() {
        let err = EncodeError::CircularStructure {
            path: ".a.b".to_string(),
        };
        assert!(err.to_string().starts_with("can not convert circular structures"));
    }
}
