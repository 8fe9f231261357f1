//! Wire-format constants for the protey datagram protocol

/// Magic prefix opening every protey datagram
pub const FRAGMENT_MAGIC: &[u8; 12] = b"proteyclient";

/// Fragment-count field offset (big-endian u16)
pub const COUNT_OFFSET: usize = FRAGMENT_MAGIC.len();

/// Fragment-sequence field offset (big-endian u16, zero-based)
pub const SEQUENCE_OFFSET: usize = COUNT_OFFSET + 2;

/// Declared-packet-size field offset (big-endian u16)
pub const DECLARED_SIZE_OFFSET: usize = SEQUENCE_OFFSET + 2;

/// Total header size in bytes
pub const HEADER_SIZE: usize = DECLARED_SIZE_OFFSET + 2;

/// Fixed on-wire datagram size; only the trailing fragment of a message may
/// be shorter
pub const PACKET_SIZE: usize = 64;

/// Payload bytes carried by a full fragment
pub const PAYLOAD_CAPACITY: usize = PACKET_SIZE - HEADER_SIZE;

/// Scratch size for inbound datagrams; generous so that oversized foreign
/// traffic is still read in one piece and can be rejected whole
pub const MAX_DATAGRAM_SIZE: usize = 1024;
