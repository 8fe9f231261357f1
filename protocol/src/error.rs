//! Protocol error types

use thiserror::Error;

/// Rejections raised while parsing an endpoint descriptor string
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EndpointError {
    #[error("endpoint descriptor needs <TCP|UDP>,<ipv4>,<port>")]
    MissingParameters,

    #[error("transport must be the literal TCP or UDP")]
    InvalidProtocol,

    #[error("server address is not a dotted-quad IPv4 address")]
    InvalidAddress,

    #[error("server port is not a clean decimal 16-bit number")]
    InvalidPort,
}

/// Reasons an inbound datagram is discarded during reassembly
///
/// None of these abort an exchange; the receive loop logs the reject and
/// keeps waiting for the remaining fragments.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FragmentReject {
    #[error("datagram of {len} bytes is shorter than the fragment header")]
    TooShort { len: usize },

    #[error("datagram does not open with the protey magic")]
    ForeignMagic,

    #[error("fragment {sequence} was already received")]
    Duplicate { sequence: u16 },

    #[error("fragment {sequence} lies outside the declared count {count}")]
    OutOfRange { sequence: u16, count: u16 },

    #[error("mid-message fragment {sequence} is {len} bytes instead of a full packet")]
    Damaged { sequence: u16, len: usize },
}
