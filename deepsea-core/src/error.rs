//! Return values from fallible calls.
//!
//! The source library reports failures through a thread-local `errno` and a
//! `bool`/null return. We replace that with an explicit [`Result`], with
//! [`ErrorKind`] as the complete taxonomy of failure reasons.

use std::fmt;

/// The reason a call failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Null, zero, or otherwise malformed argument.
    InvalidArgument,
    /// An allocator could not satisfy a request.
    OutOfMemory,
    /// Wrong thread, wrong state, or a disabled feature.
    PermissionDenied,
    /// An index or range fell outside its container.
    OutOfRange,
    /// A supplied buffer was too small.
    SizeError,
    /// A requested entry does not exist.
    NotFound,
    /// A parse or link step failed.
    Format,
    /// `tryLock` found the lock held.
    Busy,
    /// A timed wait elapsed before the condition was met.
    Timeout,
    /// An insert collided with an existing entry.
    AlreadyExists,
    /// A path did not resolve to any archive entry.
    NoEntry,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::OutOfMemory => "out of memory",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::OutOfRange => "out of range",
            ErrorKind::SizeError => "buffer too small",
            ErrorKind::NotFound => "not found",
            ErrorKind::Format => "format error",
            ErrorKind::Busy => "busy",
            ErrorKind::Timeout => "timed out",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::NoEntry => "no such entry",
        };
        f.write_str(s)
    }
}

/// An error from a `deepsea-core` call, carrying its [`ErrorKind`] and a
/// human-readable message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct Error {
    /// The taxonomy slot this failure belongs to.
    pub kind: ErrorKind,
    message: String,
}

impl Error {
    /// Builds an error of the given kind with a message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Convenience alias used throughout `deepsea-core`.
pub type Result<T> = std::result::Result<T, Error>;

macro_rules! bail {
    ($kind:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::new($kind, format!($($arg)*)))
    };
}
pub(crate) use bail;
