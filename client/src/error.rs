//! Classified results returned by the client core

use protocol::EndpointError;
use thiserror::Error;

/// Everything a start or send operation can report to the front-end.
///
/// `ConnectionBroken` is the only failure that mutates session state when
/// reported; the front-end answers it by starting the client again.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    #[error("client is already started")]
    AlreadyStarted,

    #[error("client is not started")]
    NotStarted,

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error("local resources are exhausted, retry later")]
    TemporaryResourceShortage,

    #[error("connection to the server is broken")]
    ConnectionBroken,

    #[error("no data to send")]
    NoDataToSend,

    #[error("request failed")]
    Failure,
}
