//! Structured runtime errors for the query execution engine.
//!
//! Modeled directly on the teacher crate's `InternalError`: a single struct
//! carrying a stable `(class, origin)` pair plus a human message, rather than
//! a sprawling enum of ad-hoc variants. Call sites classify the failure once,
//! at the point it is raised, and every layer above propagates the same
//! value with `?`.

use std::fmt;
use thiserror::Error as ThisError;

///
/// EngineError
///
/// Not a stable API surface by itself; the `class`/`origin` pair is what
/// callers should match on, the `message` is diagnostic text only.
///

#[derive(Debug, Clone, ThisError)]
#[error("{origin}:{class}: {message}")]
pub struct EngineError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl EngineError {
    #[must_use]
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn compile(class: ErrorClass, message: impl Into<String>) -> Self {
        Self::new(class, ErrorOrigin::Compile, message)
    }

    #[must_use]
    pub fn unknown_function(name: &str) -> Self {
        Self::compile(ErrorClass::UnknownFunction, format!("unknown function: {name}"))
    }

    #[must_use]
    pub fn arity(name: &str, expected: &str, got: usize) -> Self {
        Self::compile(
            ErrorClass::Arity,
            format!("{name}() expects {expected} argument(s), got {got}"),
        )
    }

    #[must_use]
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::compile(ErrorClass::TypeMismatch, message)
    }

    #[must_use]
    pub fn unsupported_fill(fill: &str, kind: &str) -> Self {
        Self::compile(
            ErrorClass::UnsupportedFill,
            format!("fill({fill}) is not supported for {kind} fields"),
        )
    }

    #[must_use]
    pub fn factory(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::FactoryError, ErrorOrigin::Factory, message)
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorClass::Cancelled, ErrorOrigin::Runtime, "query cancelled")
    }

    /// True for the sentinel the engine hands back on every `next()` call
    /// made after cancellation, distinguishing it from ordinary EOF.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.class, ErrorClass::Cancelled)
    }
}

///
/// ErrorClass
/// Stable error taxonomy for runtime classification. May grow; never shrinks
/// silently underneath a caller's match.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    UnknownFunction,
    Arity,
    TypeMismatch,
    UnsupportedFill,
    FactoryError,
    Cancelled,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UnknownFunction => "unknown_function",
            Self::Arity => "arity",
            Self::TypeMismatch => "type_mismatch",
            Self::UnsupportedFill => "unsupported_fill",
            Self::FactoryError => "factory_error",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which pipeline stage raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Compile,
    Factory,
    Runtime,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Compile => "compile",
            Self::Factory => "factory",
            Self::Runtime => "runtime",
        };
        write!(f, "{label}")
    }
}
