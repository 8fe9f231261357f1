//! Client façade wiring the session, framer, and fragmenter together

use crate::error::ClientError;
use crate::session::{Session, SessionSocket};
use crate::{tcp, udp};
use protocol::{EndpointDescriptor, EndpointError};
use tracing::{debug, info};

/// Point-to-point protey client for a single configured server.
///
/// Owns the one session and the last completed answer. Not safe for
/// concurrent use; the caller serializes `start` and `send`.
#[derive(Debug, Default)]
pub struct Client {
    endpoint: Option<EndpointDescriptor>,
    session: Session,
    last_answer: String,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an endpoint descriptor and open the session against it.
    pub fn start(&mut self, params: &str) -> Result<(), ClientError> {
        if self.session.is_started() {
            return Err(ClientError::AlreadyStarted);
        }
        let endpoint = EndpointDescriptor::parse(params)?;
        self.endpoint = Some(endpoint);
        self.session.start(&endpoint)
    }

    /// Reopen the session against the previously validated descriptor.
    pub fn restart(&mut self) -> Result<(), ClientError> {
        match self.endpoint {
            Some(ref endpoint) => self.session.start(endpoint),
            None => Err(ClientError::Endpoint(EndpointError::MissingParameters)),
        }
    }

    /// Send one request and block until its answer is complete.
    ///
    /// The previous answer is discarded as soon as the send begins.
    pub fn send(&mut self, message: &str) -> Result<&str, ClientError> {
        let server = match self.endpoint {
            Some(ref endpoint) if self.session.is_started() => endpoint.socket_addr(),
            _ => return Err(ClientError::NotStarted),
        };
        if message.is_empty() {
            return Err(ClientError::NoDataToSend);
        }

        self.last_answer.clear();
        debug!("sending a request of {} bytes", message.len());
        let result = match self.session.socket_mut() {
            Some(SessionSocket::Tcp(stream)) => tcp::exchange(stream, message),
            Some(SessionSocket::Udp(socket)) => udp::exchange(socket, server, message),
            None => return Err(ClientError::NotStarted),
        };

        match result {
            Ok(answer) => {
                info!("received an answer of {} bytes", answer.len());
                self.last_answer = answer;
                Ok(&self.last_answer)
            }
            Err(failure) => Err(self.session.fail(failure)),
        }
    }

    /// The most recently completed answer
    pub fn last_answer(&self) -> &str {
        &self.last_answer
    }
}
