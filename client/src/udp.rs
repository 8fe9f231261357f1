//! UDP fragmenter/reassembler I/O loops

use crate::net::{IoFailure, retry_interrupted};
use protocol::{MAX_DATAGRAM_SIZE, PAYLOAD_CAPACITY, Reassembly, build_fragment, fragment_count};
use std::io;
use std::net::{SocketAddrV4, UdpSocket};
use tracing::debug;

/// Fragment one request onto the wire and reassemble the answer.
pub fn exchange(
    socket: &UdpSocket,
    server: SocketAddrV4,
    message: &str,
) -> Result<String, IoFailure> {
    send_fragments(socket, server, message.as_bytes())?;
    let answer = receive_answer(socket)?;
    Ok(String::from_utf8_lossy(&answer).into_owned())
}

/// Send each fragment as one unconnected datagram to the server.
///
/// Success here only means hand-off to the kernel; loss on the wire is not
/// this layer's problem. A truncated hand-off resends the whole fragment,
/// never a tail of it.
fn send_fragments(
    socket: &UdpSocket,
    server: SocketAddrV4,
    message: &[u8],
) -> Result<(), IoFailure> {
    let count = fragment_count(message.len()).ok_or_else(|| {
        IoFailure::write(io::Error::new(
            io::ErrorKind::InvalidInput,
            "message needs more fragments than the count field can carry",
        ))
    })?;
    debug!("sending {count} fragments");

    for sequence in 0..count {
        let offset = sequence as usize * PAYLOAD_CAPACITY;
        let payload = &message[offset..(offset + PAYLOAD_CAPACITY).min(message.len())];
        let datagram = build_fragment(count, sequence, payload);
        loop {
            let sent =
                retry_interrupted(|| socket.send_to(&datagram, server)).map_err(IoFailure::write)?;
            if sent == datagram.len() {
                break;
            }
            debug!(
                "short datagram write ({sent} of {} bytes), resending fragment {sequence}",
                datagram.len()
            );
        }
    }
    Ok(())
}

/// Collect datagrams until every declared fragment has arrived.
///
/// Noise, duplicates, and damaged fragments are discarded without
/// disturbing the reassembly in progress.
fn receive_answer(socket: &UdpSocket) -> Result<Vec<u8>, IoFailure> {
    let mut reassembly = Reassembly::new();
    let mut scratch = [0u8; MAX_DATAGRAM_SIZE];
    while !reassembly.is_complete() {
        let (received, sender) =
            retry_interrupted(|| socket.recv_from(&mut scratch)).map_err(IoFailure::read)?;
        if received == 0 {
            debug!("zero-length read, continuing");
            continue;
        }
        match reassembly.accept(&scratch[..received]) {
            Ok(header) => debug!("fragment {} of {} accepted", header.sequence, header.count),
            Err(reject) => debug!("datagram from {sender} discarded: {reject}"),
        }
    }
    Ok(reassembly.into_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::thread;

    fn bind_v4(socket: &UdpSocket) -> SocketAddrV4 {
        match socket.local_addr().unwrap() {
            SocketAddr::V4(address) => address,
            SocketAddr::V6(_) => panic!("loopback test socket must be IPv4"),
        }
    }

    /// Reassemble one request, then answer with `make_reply`'s fragments.
    fn echo_server(
        server: UdpSocket,
        make_reply: impl FnOnce(&[u8]) -> Vec<Vec<u8>> + Send + 'static,
    ) -> thread::JoinHandle<Vec<u8>> {
        thread::spawn(move || {
            let mut reassembly = Reassembly::new();
            let mut scratch = [0u8; MAX_DATAGRAM_SIZE];
            let mut peer = None;
            while !reassembly.is_complete() {
                let (received, sender) = server.recv_from(&mut scratch).unwrap();
                peer = Some(sender);
                reassembly.accept(&scratch[..received]).unwrap();
            }
            let request = reassembly.into_message();
            for datagram in make_reply(&request) {
                server.send_to(&datagram, peer.unwrap()).unwrap();
            }
            request
        })
    }

    fn fragments_of(message: &[u8]) -> Vec<Vec<u8>> {
        let count = fragment_count(message.len()).unwrap();
        (0..count)
            .map(|sequence| {
                let offset = sequence as usize * PAYLOAD_CAPACITY;
                let end = (offset + PAYLOAD_CAPACITY).min(message.len());
                build_fragment(count, sequence, &message[offset..end])
            })
            .collect()
    }

    #[test]
    fn test_multi_fragment_round_trip() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let server_address = bind_v4(&server);
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();

        let message: String = (0..120).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let expected = message.clone();
        let handle = echo_server(server, |request| fragments_of(request));

        let answer = exchange(&client, server_address, &message).unwrap();
        assert_eq!(answer, expected);
        assert_eq!(handle.join().unwrap(), expected.as_bytes());
    }

    #[test]
    fn test_answer_survives_reordering_duplicates_and_noise() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let server_address = bind_v4(&server);
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();

        let handle = echo_server(server, |request| {
            let mut reply = fragments_of(request);
            reply.reverse();
            // one duplicate and two flavors of noise in the middle
            reply.insert(1, reply[0].clone());
            reply.insert(2, b"not even a header".to_vec());
            reply.insert(3, vec![0u8; MAX_DATAGRAM_SIZE / 2]);
            reply
        });

        let message = "0".repeat(3 * PAYLOAD_CAPACITY + 5);
        let answer = exchange(&client, server_address, &message).unwrap();
        assert_eq!(answer, message);
        handle.join().unwrap();
    }

    #[test]
    fn test_single_fragment_message() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let server_address = bind_v4(&server);
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();

        let handle = echo_server(server, |request| fragments_of(request));
        let answer = exchange(&client, server_address, "hi").unwrap();
        assert_eq!(answer, "hi");
        assert_eq!(handle.join().unwrap(), b"hi");
    }
}
