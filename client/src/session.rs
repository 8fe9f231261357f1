//! Transport session: socket lifecycle and connection establishment

use crate::error::ClientError;
use crate::net::{self, IoFailure};
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use protocol::{EndpointDescriptor, Transport};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{TcpStream, UdpSocket};
use std::os::fd::AsFd;
use tracing::{debug, info, warn};

/// Lifecycle of the one socket a session owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NotStarted,
    Started,
    Broken,
}

/// The live socket, one variant per transport
#[derive(Debug)]
pub enum SessionSocket {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

/// Owns at most one live socket and tracks whether it is usable.
///
/// The handle is scoped ownership: dropping the session, or replacing the
/// handle on any path, closes the descriptor. No exit leaves one behind.
#[derive(Debug, Default)]
pub struct Session {
    handle: Option<SessionSocket>,
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.state == SessionState::Started
    }

    pub fn socket_mut(&mut self) -> Option<&mut SessionSocket> {
        self.handle.as_mut()
    }

    /// Open a socket for `endpoint` and, for TCP, connect it.
    ///
    /// Allowed from `NotStarted` and from `Broken`, where it dials a fresh
    /// socket against the same descriptor.
    pub fn start(&mut self, endpoint: &EndpointDescriptor) -> Result<(), ClientError> {
        if self.is_started() {
            return Err(ClientError::AlreadyStarted);
        }

        let (socket_type, protocol) = match endpoint.transport {
            Transport::Tcp => (Type::STREAM, Protocol::TCP),
            Transport::Udp => (Type::DGRAM, Protocol::UDP),
        };
        let socket = Socket::new(Domain::IPV4, socket_type, Some(protocol)).map_err(|error| {
            warn!("socket creation failed: {error}");
            net::classify_creation(&error)
        })?;
        debug!("{} socket created", endpoint.transport);

        self.handle = Some(match endpoint.transport {
            Transport::Tcp => {
                connect(&socket, endpoint)?;
                info!("connected to TCP server {}", endpoint.socket_addr());
                SessionSocket::Tcp(socket.into())
            }
            // UDP is connectionless; creation alone suffices.
            Transport::Udp => SessionSocket::Udp(socket.into()),
        });
        self.state = SessionState::Started;
        Ok(())
    }

    /// Report a classified I/O failure and apply its session side effect.
    ///
    /// A broken connection is the only classification that touches state:
    /// the handle is closed and the caller must start the session again.
    pub fn fail(&mut self, failure: IoFailure) -> ClientError {
        let classified = net::classify(&failure);
        match classified {
            ClientError::ConnectionBroken => {
                warn!("connection is broken, closing the socket");
                self.handle = None;
                self.state = SessionState::Broken;
            }
            _ => warn!("{} failed: {}", failure.direction, failure.error),
        }
        classified
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.handle.is_some() {
            debug!("session dropped, closing the socket");
        }
    }
}

/// Synchronous connect with recovery from a transient-signal interruption.
///
/// An interrupted connect keeps progressing in the kernel, so it is not a
/// failure: completion is awaited by polling for writability and probing
/// the pending socket error.
fn connect(socket: &Socket, endpoint: &EndpointDescriptor) -> Result<(), ClientError> {
    let address = endpoint.socket_addr();
    match socket.connect(&address.into()) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::Interrupted => {
            debug!("connect interrupted by a signal, waiting for completion");
            await_connect(socket)
        }
        Err(error) => {
            warn!("connect to {address} failed: {error}");
            Err(ClientError::Failure)
        }
    }
}

/// Block on the descriptor until the in-flight connect resolves.
///
/// The wait has no deadline; the socket carries none either.
fn await_connect(socket: &Socket) -> Result<(), ClientError> {
    let mut poll_set = [PollFd::new(socket.as_fd(), PollFlags::POLLOUT)];
    loop {
        match poll(&mut poll_set, PollTimeout::NONE) {
            Err(Errno::EINTR) => {
                debug!("poll interrupted by a signal, retrying");
                continue;
            }
            Err(errno) => {
                warn!("poll for connect completion failed: {errno}");
                return Err(ClientError::Failure);
            }
            Ok(_) => {}
        }

        let revents = poll_set[0].revents().unwrap_or(PollFlags::empty());
        if !revents.contains(PollFlags::POLLOUT) || revents.contains(PollFlags::POLLERR) {
            warn!("socket flagged an error while completing the connect");
            return Err(ClientError::Failure);
        }
        return match socket.take_error() {
            Ok(None) => Ok(()),
            Ok(Some(error)) => {
                warn!("connect failed after interruption: {error}");
                Err(ClientError::Failure)
            }
            Err(error) => {
                warn!("could not read the pending socket error: {error}");
                Err(ClientError::Failure)
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::EndpointDescriptor;
    use std::net::TcpListener;

    fn udp_endpoint() -> EndpointDescriptor {
        EndpointDescriptor::parse("UDP,127.0.0.1,9").unwrap()
    }

    #[test]
    fn test_udp_start_needs_no_peer() {
        let mut session = Session::new();
        session.start(&udp_endpoint()).unwrap();
        assert!(session.is_started());
        assert!(matches!(session.socket_mut(), Some(SessionSocket::Udp(_))));
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut session = Session::new();
        session.start(&udp_endpoint()).unwrap();
        assert_eq!(
            session.start(&udp_endpoint()),
            Err(ClientError::AlreadyStarted)
        );
    }

    #[test]
    fn test_tcp_start_connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let descriptor = format!("TCP,127.0.0.1,{port}");
        let endpoint = EndpointDescriptor::parse(&descriptor).unwrap();

        let mut session = Session::new();
        session.start(&endpoint).unwrap();
        assert!(session.is_started());
        assert!(matches!(session.socket_mut(), Some(SessionSocket::Tcp(_))));
    }

    #[test]
    fn test_refused_connect_is_a_failure_and_leaves_no_handle() {
        // Grab a free port and close it again so the connect is refused.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let descriptor = format!("TCP,127.0.0.1,{port}");
        let endpoint = EndpointDescriptor::parse(&descriptor).unwrap();
        let mut session = Session::new();
        assert_eq!(session.start(&endpoint), Err(ClientError::Failure));
        assert!(!session.is_started());
        assert!(session.socket_mut().is_none());
    }

    #[test]
    fn test_broken_session_can_be_restarted() {
        let mut session = Session::new();
        session.start(&udp_endpoint()).unwrap();

        let classified = session.fail(IoFailure::read(io::Error::from_raw_os_error(
            libc::ECONNRESET,
        )));
        assert_eq!(classified, ClientError::ConnectionBroken);
        assert_eq!(session.state(), SessionState::Broken);
        assert!(session.socket_mut().is_none());

        session.start(&udp_endpoint()).unwrap();
        assert!(session.is_started());
    }

    #[test]
    fn test_other_failures_keep_the_socket() {
        let mut session = Session::new();
        session.start(&udp_endpoint()).unwrap();

        let classified =
            session.fail(IoFailure::write(io::Error::from_raw_os_error(libc::EPIPE)));
        assert_eq!(classified, ClientError::Failure);
        assert!(session.is_started());
        assert!(session.socket_mut().is_some());
    }
}
