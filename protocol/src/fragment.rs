//! UDP fragment layout and multi-fragment answer reassembly

use crate::constants::{
    COUNT_OFFSET, DECLARED_SIZE_OFFSET, FRAGMENT_MAGIC, HEADER_SIZE, PACKET_SIZE, PAYLOAD_CAPACITY,
    SEQUENCE_OFFSET,
};
use crate::error::FragmentReject;
use std::collections::HashSet;

/// Header fields following the magic prefix of every fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentHeader {
    /// Total fragments in the message
    pub count: u16,
    /// Zero-based index of this fragment
    pub sequence: u16,
    /// Declared packet size; written as the wire constant, ignored on receive
    pub declared_size: u16,
}

impl FragmentHeader {
    pub const SIZE: usize = HEADER_SIZE;

    pub fn new(count: u16, sequence: u16) -> Self {
        Self {
            count,
            sequence,
            declared_size: PACKET_SIZE as u16,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..COUNT_OFFSET].copy_from_slice(FRAGMENT_MAGIC);
        bytes[COUNT_OFFSET..SEQUENCE_OFFSET].copy_from_slice(&self.count.to_be_bytes());
        bytes[SEQUENCE_OFFSET..DECLARED_SIZE_OFFSET].copy_from_slice(&self.sequence.to_be_bytes());
        bytes[DECLARED_SIZE_OFFSET..HEADER_SIZE].copy_from_slice(&self.declared_size.to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FragmentReject> {
        if bytes.len() < Self::SIZE {
            return Err(FragmentReject::TooShort { len: bytes.len() });
        }
        if bytes[..COUNT_OFFSET] != FRAGMENT_MAGIC[..] {
            return Err(FragmentReject::ForeignMagic);
        }
        Ok(Self {
            count: u16::from_be_bytes([bytes[COUNT_OFFSET], bytes[COUNT_OFFSET + 1]]),
            sequence: u16::from_be_bytes([bytes[SEQUENCE_OFFSET], bytes[SEQUENCE_OFFSET + 1]]),
            declared_size: u16::from_be_bytes([
                bytes[DECLARED_SIZE_OFFSET],
                bytes[DECLARED_SIZE_OFFSET + 1],
            ]),
        })
    }
}

/// Number of fragments needed for a message, if it fits the count field
pub fn fragment_count(message_len: usize) -> Option<u16> {
    u16::try_from(message_len.div_ceil(PAYLOAD_CAPACITY)).ok()
}

/// Build one outbound fragment datagram around a payload slice.
///
/// Every fragment is full-size except the trailing one, which carries the
/// remainder of the message unpadded.
pub fn build_fragment(count: u16, sequence: u16, payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= PAYLOAD_CAPACITY);
    let mut datagram = Vec::with_capacity(HEADER_SIZE + payload.len());
    datagram.extend_from_slice(&FragmentHeader::new(count, sequence).to_bytes());
    datagram.extend_from_slice(payload);
    datagram
}

/// Reconstructs one answer from fragments arriving in any order.
///
/// The first accepted fragment declares the expected count and sizes the
/// buffer to `count * PAYLOAD_CAPACITY`; the fragment carrying the last
/// index trims it to the exact answer length. No fragment is applied twice.
#[derive(Debug, Default)]
pub struct Reassembly {
    expected: Option<u16>,
    received: HashSet<u16>,
    buffer: Vec<u8>,
}

impl Reassembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one inbound datagram, or say why it was discarded.
    ///
    /// The declared count stays provisional until a fragment passes every
    /// check; a rejected datagram leaves the reassembly untouched.
    pub fn accept(&mut self, datagram: &[u8]) -> Result<FragmentHeader, FragmentReject> {
        let header = FragmentHeader::from_bytes(datagram)?;
        if self.received.contains(&header.sequence) {
            return Err(FragmentReject::Duplicate {
                sequence: header.sequence,
            });
        }

        let count = self.expected.unwrap_or(header.count);
        if header.sequence >= count {
            return Err(FragmentReject::OutOfRange {
                sequence: header.sequence,
                count,
            });
        }
        let payload = &datagram[HEADER_SIZE..];
        if header.sequence != count - 1 && datagram.len() != PACKET_SIZE {
            return Err(FragmentReject::Damaged {
                sequence: header.sequence,
                len: datagram.len(),
            });
        }

        if self.expected.is_none() {
            self.expected = Some(count);
            self.buffer.resize(count as usize * PAYLOAD_CAPACITY, 0);
        }
        if header.sequence == count - 1 {
            // The trailing fragment fixes the exact answer length.
            let answer_len = (count as usize - 1) * PAYLOAD_CAPACITY + payload.len();
            self.buffer.resize(answer_len, 0);
        }

        let offset = header.sequence as usize * PAYLOAD_CAPACITY;
        self.buffer[offset..offset + payload.len()].copy_from_slice(payload);
        self.received.insert(header.sequence);
        Ok(header)
    }

    /// True once every declared fragment has arrived
    pub fn is_complete(&self) -> bool {
        self.expected
            .is_some_and(|count| self.received.len() == count as usize)
    }

    /// The reassembled answer, trimmed to its exact length
    pub fn into_message(self) -> Vec<u8> {
        self.buffer
    }
}
