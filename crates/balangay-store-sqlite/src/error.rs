//! Error plumbing across the `tokio_rusqlite::Connection::call` boundary.
//!
//! Closures run on the database thread and must return
//! [`tokio_rusqlite::Error`]; domain errors ride across in its `Other`
//! variant and are downcast back to [`balangay_core::Error`] on the async
//! side.

use balangay_core::Error;

/// Result type used inside `conn.call` closures and transaction helpers.
pub(crate) type CallResult<T> = std::result::Result<T, tokio_rusqlite::Error>;

/// Wrap a domain error for transport out of a closure.
pub(crate) fn domain(e: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

/// Unwrap a closure error back into the domain error it carries, or fold
/// database failures into [`Error::Storage`].
pub(crate) fn call_error(e: tokio_rusqlite::Error) -> Error {
  match e {
    tokio_rusqlite::Error::Other(inner) => match inner.downcast::<Error>() {
      Ok(err) => *err,
      Err(other) => Error::Storage(other.to_string()),
    },
    other => Error::Storage(other.to_string()),
  }
}

/// True when the error is a UNIQUE / PRIMARY KEY constraint violation.
pub(crate) fn is_constraint(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == rusqlite::ErrorCode::ConstraintViolation
  )
}
