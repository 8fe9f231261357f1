//! Endpoint descriptor: transport choice plus validated server address

use crate::error::EndpointError;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

/// Longest textual dotted-quad address
const MAX_ADDRESS_LEN: usize = 15;

/// Transport literals accepted by the descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transport::Tcp => "TCP",
            Transport::Udp => "UDP",
        })
    }
}

/// Validated `<proto>,<ipv4>,<port>` descriptor, immutable once parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub transport: Transport,
    pub address: Ipv4Addr,
    pub port: u16,
}

impl EndpointDescriptor {
    /// Parse a descriptor string.
    ///
    /// The transport literal is matched case-sensitively and the port must be
    /// a clean decimal u16; trailing garbage is rejected, not truncated.
    pub fn parse(params: &str) -> Result<Self, EndpointError> {
        let first = params.find(',').ok_or(EndpointError::MissingParameters)?;
        if first == params.len() - 1 {
            return Err(EndpointError::MissingParameters);
        }
        let second = params[first + 1..]
            .find(',')
            .map(|position| first + 1 + position)
            .ok_or(EndpointError::MissingParameters)?;

        let transport = match &params[..first] {
            "TCP" => Transport::Tcp,
            "UDP" => Transport::Udp,
            _ => return Err(EndpointError::InvalidProtocol),
        };

        let address = &params[first + 1..second];
        if address.len() > MAX_ADDRESS_LEN {
            return Err(EndpointError::InvalidAddress);
        }
        let address: Ipv4Addr = address.parse().map_err(|_| EndpointError::InvalidAddress)?;

        let port = &params[second + 1..];
        if port.is_empty() || !port.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(EndpointError::InvalidPort);
        }
        let port: u16 = port.parse().map_err(|_| EndpointError::InvalidPort)?;

        Ok(Self {
            transport,
            address,
            port,
        })
    }

    /// The socket address this descriptor dials
    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_descriptors() {
        let tcp = EndpointDescriptor::parse("TCP,1.2.3.4,80").unwrap();
        assert_eq!(tcp.transport, Transport::Tcp);
        assert_eq!(tcp.address, Ipv4Addr::new(1, 2, 3, 4));
        assert_eq!(tcp.port, 80);

        let udp = EndpointDescriptor::parse("UDP,10.10.10.10,5555").unwrap();
        assert_eq!(udp.transport, Transport::Udp);
        assert_eq!(udp.socket_addr().to_string(), "10.10.10.10:5555");
    }

    #[test]
    fn test_address_and_port_round_trip() {
        let parsed = EndpointDescriptor::parse("UDP,192.168.0.1,65535").unwrap();
        let rendered = format!("UDP,{},{}", parsed.address, parsed.port);
        assert_eq!(EndpointDescriptor::parse(&rendered).unwrap(), parsed);
    }

    #[test]
    fn test_transport_literal_is_case_sensitive() {
        assert_eq!(
            EndpointDescriptor::parse("tcp,1.2.3.4,80"),
            Err(EndpointError::InvalidProtocol)
        );
        assert_eq!(
            EndpointDescriptor::parse("Udp,1.2.3.4,80"),
            Err(EndpointError::InvalidProtocol)
        );
        assert!(EndpointDescriptor::parse("UDP,1.2.3.4,80").is_ok());
    }

    #[test]
    fn test_missing_parameters() {
        assert_eq!(
            EndpointDescriptor::parse("TCP,1.2.3.4"),
            Err(EndpointError::MissingParameters)
        );
        assert_eq!(
            EndpointDescriptor::parse("TCP,"),
            Err(EndpointError::MissingParameters)
        );
        assert_eq!(
            EndpointDescriptor::parse("TCP"),
            Err(EndpointError::MissingParameters)
        );
    }

    #[test]
    fn test_invalid_address() {
        assert_eq!(
            EndpointDescriptor::parse("TCP,999.1.1.1,80"),
            Err(EndpointError::InvalidAddress)
        );
        assert_eq!(
            EndpointDescriptor::parse("TCP,1.2.3,80"),
            Err(EndpointError::InvalidAddress)
        );
        // longer than any dotted quad can be
        assert_eq!(
            EndpointDescriptor::parse("TCP,111.222.333.4444,80"),
            Err(EndpointError::InvalidAddress)
        );
    }

    #[test]
    fn test_invalid_port() {
        assert_eq!(
            EndpointDescriptor::parse("TCP,1.2.3.4,"),
            Err(EndpointError::InvalidPort)
        );
        assert_eq!(
            EndpointDescriptor::parse("TCP,1.2.3.4,99999"),
            Err(EndpointError::InvalidPort)
        );
        assert_eq!(
            EndpointDescriptor::parse("TCP,1.2.3.4,80x"),
            Err(EndpointError::InvalidPort)
        );
        assert_eq!(
            EndpointDescriptor::parse("TCP,1.2.3.4,-1"),
            Err(EndpointError::InvalidPort)
        );
    }
}
