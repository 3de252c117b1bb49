//! Model and expression errors.

use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised by expression parsing/evaluation and model mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Expression could not be parsed.
    #[error("parse error: {0}")]
    Parse(SmolStr),

    /// Member read through the missing sentinel.
    #[error("cannot read '{0}' of undefined")]
    MemberOfUndefined(SmolStr),

    /// Member read through null.
    #[error("cannot read '{0}' of null")]
    MemberOfNull(SmolStr),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Modulo by zero.
    #[error("modulo by zero")]
    ModuloByZero,

    /// A computed member resolved through itself.
    #[error("circular computed member")]
    CircularComputed,

    /// Mutation attempted on a value that is not a container.
    #[error("cannot mutate a {0}")]
    NotAContainer(SmolStr),

    /// Splice attempted on a value that is not an ordered collection.
    #[error("cannot splice a {0}")]
    NotOrdered(SmolStr),

    /// Ordered-collection key that is not a decimal index.
    #[error("invalid index '{0}'")]
    InvalidIndex(SmolStr),
}

impl ModelError {
    /// Parse error with the given message.
    #[must_use]
    pub fn parse(message: impl AsRef<str>) -> Self {
        ModelError::Parse(SmolStr::new(message.as_ref()))
    }
}
