/// An error that occurs while parsing flags, compiling a pattern or executing
/// a compiled pattern.
///
/// Every error is scoped to the single call that produced it. In particular:
///
/// * A [`ErrorKind::Parse`] error is never remembered by the cache. A later
/// compile of the same pattern parses it again, which matters when the
/// failure was caused by a parser resource limit such as
/// [`Config::nest_limit`](crate::Config::nest_limit).
/// * A [`ErrorKind::Execution`] error terminates one execution only. The
/// compiled pattern stays usable for future calls.
/// * A [`ErrorKind::OutOfMemory`] error leaves the cache exactly as it was
/// before the call.
///
/// The `Error::source` method (from the `std::error::Error` trait
/// implementation) returns the underlying syntax error for parse failures.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The kind of an [`Error`].
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An unknown or duplicated flag letter. Carries the offending character.
    BadFlag(char),
    /// The pattern text could not be parsed.
    Parse(regex_syntax::Error),
    /// An allocation failed, or generated code exceeded its size limit.
    OutOfMemory {
        /// The configured limit, when the failure was a size limit.
        size_limit: Option<usize>,
    },
    /// An execution could not run to completion.
    Execution(ExecutionError),
}

/// Why an execution failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecutionError {
    /// The interpreter exceeded its work stack.
    StackExhausted,
    /// The interpreter stopped because an interrupt was requested, but no
    /// interrupt was pending when the engine checked.
    Interrupted,
    /// The interrupt handler asked for the execution to be aborted.
    Aborted,
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// If this error was caused by an invalid flag letter, then this returns
    /// the offending character.
    pub fn bad_flag(&self) -> Option<char> {
        match self.kind {
            ErrorKind::BadFlag(ch) => Some(ch),
            _ => None,
        }
    }

    /// If this error corresponds to a syntax error, then a reference to it is
    /// returned by this method.
    pub fn syntax_error(&self) -> Option<&regex_syntax::Error> {
        match self.kind {
            ErrorKind::Parse(ref err) => Some(err),
            _ => None,
        }
    }

    /// If this error occurred because generated code exceeded the configured
    /// size limit, then this returns the configured size limit.
    pub fn size_limit(&self) -> Option<usize> {
        match self.kind {
            ErrorKind::OutOfMemory { size_limit } => size_limit,
            _ => None,
        }
    }

    /// If this error was raised by an execution, then this returns why.
    pub fn execution_error(&self) -> Option<ExecutionError> {
        match self.kind {
            ErrorKind::Execution(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn bad_flag_char(ch: char) -> Error {
        Error { kind: ErrorKind::BadFlag(ch) }
    }

    pub(crate) fn syntax(err: regex_syntax::Error) -> Error {
        Error { kind: ErrorKind::Parse(err) }
    }

    pub(crate) fn out_of_memory() -> Error {
        Error { kind: ErrorKind::OutOfMemory { size_limit: None } }
    }

    pub(crate) fn too_big(limit: usize) -> Error {
        Error { kind: ErrorKind::OutOfMemory { size_limit: Some(limit) } }
    }

    pub(crate) fn execution(err: ExecutionError) -> Error {
        Error { kind: ErrorKind::Execution(err) }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind {
            ErrorKind::Parse(ref err) => Some(err),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::BadFlag(ch) => write!(f, "invalid regular expression flag {}", ch),
            ErrorKind::Parse(_) => write!(f, "error parsing pattern"),
            ErrorKind::OutOfMemory { size_limit: None } => write!(f, "out of memory"),
            ErrorKind::OutOfMemory { size_limit: Some(limit) } => {
                write!(f, "compiled pattern exceeds size limit of {} bytes", limit)
            }
            ErrorKind::Execution(err) => write!(f, "regex execution failed: {}", err),
        }
    }
}

impl core::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            ExecutionError::StackExhausted => write!(f, "too much recursion"),
            ExecutionError::Interrupted => write!(f, "interrupted"),
            ExecutionError::Aborted => write!(f, "aborted by interrupt handler"),
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Error {
        Error::out_of_memory()
    }
}
