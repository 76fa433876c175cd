use thiserror::Error;

use crate::value::Value;

/// Result alias used by every fallible collection operation
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Unified error type for collections, contracts and sequences
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// A key or value does not satisfy the declared type contract
    #[error("Invalid type: expected <{expected}>, got <{actual}> {value}")]
    InvalidType {
        expected: String,
        actual: String,
        value: String,
    },

    /// A type token is malformed, not permitted here, or names an unknown type
    #[error("Invalid type declaration `{token}`: {reason}")]
    InvalidTypeDeclaration { token: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Undefined key: {0}")]
    UndefinedKey(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Logic violation: {0}")]
    LogicViolation(String),
}

impl CollectionError {
    /// Build a type mismatch for `value` against the `expected` type name
    pub fn type_mismatch(value: &Value, expected: impl Into<String>) -> Self {
        CollectionError::InvalidType {
            expected: expected.into(),
            actual: value.type_name().to_string(),
            value: value.to_string(),
        }
    }

    pub fn declaration(token: impl Into<String>, reason: impl Into<String>) -> Self {
        CollectionError::InvalidTypeDeclaration {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Operation rejected up front because the sequence never ends
    pub fn infinite(operation: &str) -> Self {
        CollectionError::UnsupportedOperation(format!(
            "{operation} is not supported on an infinite sequence; bound it with take(), take_up_to() or take_while() first"
        ))
    }

    /// Both contract violations and malformed declarations are type errors
    pub fn is_invalid_type(&self) -> bool {
        matches!(
            self,
            CollectionError::InvalidType { .. } | CollectionError::InvalidTypeDeclaration { .. }
        )
    }
}
