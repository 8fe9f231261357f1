//! Protey Protocol Library
//!
//! Shared wire-format definitions for the protey client: endpoint descriptor
//! parsing, the TCP line-framing rules, and the UDP fragment layout with its
//! reassembly logic. No sockets here; the client crate drives the I/O.

pub mod constants;
pub mod endpoint;
pub mod error;
pub mod fragment;
pub mod framing;

pub use constants::*;
pub use endpoint::{EndpointDescriptor, Transport};
pub use error::{EndpointError, FragmentReject};
pub use fragment::{FragmentHeader, Reassembly, build_fragment, fragment_count};
