//! TCP framer: delimited request writes and terminator-driven reads

use crate::net::{IoFailure, retry_interrupted};
use protocol::framing;
use std::io::{Read, Write};
use std::net::TcpStream;
use tracing::debug;

/// Scratch size for response reads
const READ_CHUNK_SIZE: usize = 256;

/// Send one framed request and collect the framed answer.
///
/// The answer is read chunk by chunk until its last byte is the protocol
/// terminator. A zero-byte read is just a non-terminating chunk; the peer
/// owes us a terminator, so reading continues.
pub fn exchange(stream: &mut TcpStream, message: &str) -> Result<String, IoFailure> {
    write_fully(stream, message.as_bytes())?;
    write_fully(stream, &[framing::TERMINATOR])?;
    debug!("request of {} bytes written", message.len());

    let mut answer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    while !framing::is_complete(&answer) {
        let received = retry_interrupted(|| stream.read(&mut chunk)).map_err(IoFailure::read)?;
        debug!("read {received} bytes");
        answer.extend_from_slice(&chunk[..received]);
    }

    let answer = framing::finish_answer(answer);
    Ok(String::from_utf8_lossy(&answer).into_owned())
}

/// Write a whole buffer, advancing past partial writes and retrying
/// transient-signal interruptions at the same offset.
fn write_fully(stream: &mut TcpStream, buffer: &[u8]) -> Result<(), IoFailure> {
    let mut written = 0;
    while written < buffer.len() {
        let accepted =
            retry_interrupted(|| stream.write(&buffer[written..])).map_err(IoFailure::write)?;
        debug!("wrote {accepted} bytes");
        written += accepted;
    }
    Ok(())
}
