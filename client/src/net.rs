//! Shared I/O plumbing: transient-signal retries and errno classification

use crate::error::ClientError;
use std::fmt;
use std::io;
use tracing::debug;

/// Which half of an exchange a failing system call belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    Read,
    Write,
}

impl fmt::Display for IoDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IoDirection::Read => "read",
            IoDirection::Write => "write",
        })
    }
}

/// A failed read or write, kept with its direction for classification
#[derive(Debug)]
pub struct IoFailure {
    pub direction: IoDirection,
    pub error: io::Error,
}

impl IoFailure {
    pub fn read(error: io::Error) -> Self {
        Self {
            direction: IoDirection::Read,
            error,
        }
    }

    pub fn write(error: io::Error) -> Self {
        Self {
            direction: IoDirection::Write,
            error,
        }
    }
}

/// Reissue an I/O call for as long as it is aborted by a transient signal.
///
/// Interruption is absorbed here and never reaches the classifier.
pub fn retry_interrupted<T>(mut operation: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    loop {
        match operation() {
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {
                debug!("system call interrupted by a signal, retrying");
            }
            result => return result,
        }
    }
}

/// Map a failed read or write onto the result taxonomy.
pub fn classify(failure: &IoFailure) -> ClientError {
    match failure.error.raw_os_error() {
        Some(libc::ECONNRESET) => ClientError::ConnectionBroken,
        Some(libc::ENOBUFS) | Some(libc::ENOMEM) => ClientError::TemporaryResourceShortage,
        _ => ClientError::Failure,
    }
}

/// Map a failed socket creation onto the result taxonomy.
///
/// Descriptor and buffer exhaustion are worth retrying later; everything
/// else is permanent.
pub fn classify_creation(error: &io::Error) -> ClientError {
    match error.raw_os_error() {
        Some(libc::ENFILE) | Some(libc::EMFILE) | Some(libc::ENOBUFS) | Some(libc::ENOMEM) => {
            ClientError::TemporaryResourceShortage
        }
        _ => ClientError::Failure,
    }
}
