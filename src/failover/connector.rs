//! Connector capability and a plain TCP implementation.
//!
//! # Responsibilities
//! - Open a connection to one named peer
//! - Classify failures as connection-level or fatal
//! - Enforce a per-attempt deadline (the selector imposes none)

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::PoolConfig;
use crate::failover::types::ConnectError;
use crate::health::peer::PeerId;

/// Opens connections to individual peers on behalf of the selector.
pub trait Connector: Send + Sync {
    type Connection: Send;

    fn connect(&self, peer: &PeerId) -> impl Future<Output = Result<Self::Connection, ConnectError>> + Send;
}

/// Connects to peers over TCP using the addresses from pool configuration.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addresses: HashMap<PeerId, String>,
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(addresses: HashMap<PeerId, String>, connect_timeout: Duration) -> Self {
        Self {
            addresses,
            connect_timeout,
        }
    }

    pub fn from_pool_config(config: &PoolConfig) -> Self {
        let addresses = config
            .peers
            .iter()
            .map(|peer| (PeerId::from(peer.name.as_str()), peer.address.clone()))
            .collect();
        Self::new(addresses, config.connect_timeout())
    }

    pub fn address(&self, peer: &PeerId) -> Option<&str> {
        self.addresses.get(peer).map(String::as_str)
    }
}

impl Connector for TcpConnector {
    type Connection = TcpStream;

    async fn connect(&self, peer: &PeerId) -> Result<TcpStream, ConnectError> {
        let address = self
            .address(peer)
            .ok_or_else(|| ConnectError::Misconfigured(format!("no address configured for peer {}", peer)))?;

        match timeout(self.connect_timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => {
                tracing::debug!(peer = %peer, address = %address, "TCP connection established");
                Ok(stream)
            }
            Ok(Err(e)) => Err(classify_io_error(address, e)),
            Err(_) => Err(ConnectError::Timeout(self.connect_timeout)),
        }
    }
}

fn classify_io_error(address: &str, err: io::Error) -> ConnectError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => ConnectError::Refused(format!("{}: {}", address, err)),
        io::ErrorKind::TimedOut => ConnectError::Unreachable(format!("{}: {}", address, err)),
        io::ErrorKind::InvalidInput => ConnectError::Misconfigured(format!("{}: {}", address, err)),
        _ => ConnectError::Unreachable(format!("{}: {}", address, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connects_to_listening_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let connector = TcpConnector::new(
            HashMap::from([(PeerId::from("a"), addr.to_string())]),
            Duration::from_secs(2),
        );

        let stream = connector.connect(&PeerId::from("a")).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap(), addr);
    }

    #[tokio::test]
    async fn test_refused_is_connection_failure() {
        // Bind then drop to get a port with nothing listening.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let connector = TcpConnector::new(
            HashMap::from([(PeerId::from("a"), addr.to_string())]),
            Duration::from_secs(2),
        );

        let err = connector.connect(&PeerId::from("a")).await.unwrap_err();
        assert!(err.is_connection_failure(), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn test_unknown_peer_is_misconfigured() {
        let connector = TcpConnector::new(HashMap::new(), Duration::from_secs(1));
        let err = connector.connect(&PeerId::from("ghost")).await.unwrap_err();
        assert!(matches!(err, ConnectError::Misconfigured(_)));
    }

    #[test]
    fn test_io_error_classification() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert!(matches!(classify_io_error("x:1", refused), ConnectError::Refused(_)));

        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(matches!(classify_io_error("x:1", reset), ConnectError::Unreachable(_)));
    }
}
