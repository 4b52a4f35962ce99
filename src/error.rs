//! Error types shared across the crate.
//!
//! Everything returns `anyhow`-backed results. Where the caller needs to know what *kind* of
//! failure happened (to decide between blocking an action, showing a notice, or carrying on in
//! memory), the error is tagged with an `ErrorType` via `IntoResult::pub_result`.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The classes of failure a user can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Empty or invalid user input. The action is blocked and nothing changes.
    Validation,
    /// The generative backend or the weather source failed or returned unusable data.
    Backend,
    /// The durable snapshot could not be written. The session continues in memory.
    Persistence,
    /// The data directory or its configuration file is missing or invalid.
    Config,
    /// Any other file system failure.
    Io,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error carrying an `ErrorType` alongside the underlying cause.
pub struct TypedError {
    kind: ErrorType,
    inner: Error,
}

impl TypedError {
    pub fn kind(&self) -> ErrorType {
        self.kind
    }
}

impl Debug for TypedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.kind, self.inner)
    }
}

impl Display for TypedError {
    /// Only the outermost message. The causes are reached through `source`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for TypedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Tags a result's error with an `ErrorType`.
pub trait IntoResult<T> {
    fn pub_result(self, kind: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, kind: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let inner: Error = e.into();
            // Keep the innermost classification if the error was already tagged.
            if error_type(&inner).is_some() {
                inner
            } else {
                Error::new(TypedError { kind, inner })
            }
        })
    }
}

/// Builds a tagged `Validation` error from a message.
pub(crate) fn validation(message: impl Display) -> Error {
    Error::new(TypedError {
        kind: ErrorType::Validation,
        inner: anyhow::anyhow!("{message}"),
    })
}

/// Returns the `ErrorType` an error was tagged with, if any.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.chain()
        .find_map(|cause| cause.downcast_ref::<TypedError>())
        .map(TypedError::kind)
}
