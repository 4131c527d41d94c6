//! Failure classification shared by every layer.
//!
//! Each module keeps its own error enum with the detail it knows about; this
//! is the coarse grouping callers branch on (re-render a form, show a 404,
//! or log and give up).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced album or photo does not exist.
    NotFound,
    /// A uniqueness rule was violated (duplicate slug, duplicate filename).
    Conflict,
    /// The caller sent something malformed. Recoverable by fixing the input.
    InvalidInput,
    /// Storage or filesystem failure. Not retried here.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(label)
    }
}
