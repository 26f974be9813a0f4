//! Error types for the differentiation core and the expression engine.

use crate::types::Method;
use thiserror::Error;

/// Failures of a single differentiation request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiffError {
    /// A dual-number division had a divisor whose value component is zero.
    #[error("division by zero in dual-number arithmetic")]
    DivisionByZero,

    /// The method cannot be used where it was requested, e.g. as the base of
    /// a Richardson extrapolation.
    #[error("method `{0}` is not valid here; expected `stencil3` or `stencil5`")]
    InvalidMethod(Method),

    /// The stencil step policy is unusable.
    #[error("invalid stencil configuration: {0}")]
    InvalidConfig(String),
}

/// Failures while parsing or compiling a textual expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),

    #[error("invalid number literal `{0}`")]
    InvalidNumber(String),

    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("trailing input starting at `{0}`")]
    TrailingInput(String),

    #[error("unknown variable or parameter `{0}`")]
    UnknownIdentifier(String),

    #[error("unknown function `{0}`; supported functions are sin, cos and exp")]
    UnknownFunction(String),

    #[error("exponent must be a non-negative integer literal")]
    UnsupportedExponent,
}
