//! TCP listener for hosting a match
//!
//! The host binds, waits for exactly one guest, and stops listening once the
//! guest is accepted. Later connection attempts are refused by the OS.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::address::PeerAddress;
use crate::channel::Channel;
use crate::error::Result;

/// A bound, not-yet-connected host
pub struct HostListener {
    listener: TcpListener,
    addr: SocketAddr,
}

impl HostListener {
    /// Bind on all interfaces; port 0 picks a free port
    pub async fn bind(port: u16) -> Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, "Waiting for opponent");

        Ok(Self {
            listener,
            addr: bound_addr,
        })
    }

    /// Get the listener's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the guest; consumes the listener
    pub async fn accept(self) -> Result<(Channel<TcpStream>, SocketAddr)> {
        let (stream, peer_addr) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        info!(peer = %peer_addr, "Opponent connected");
        Ok((Channel::new(stream), peer_addr))
    }
}

/// Connect to a host as the guest
pub async fn connect(addr: &PeerAddress) -> Result<(Channel<TcpStream>, SocketAddr)> {
    debug!(addr = %addr, "Connecting to host");
    let stream = TcpStream::connect((addr.host.as_str(), addr.port)).await?;
    stream.set_nodelay(true)?;
    let peer_addr = stream.peer_addr()?;
    info!(peer = %peer_addr, "Connected to host");
    Ok((Channel::new(stream), peer_addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Received;

    #[tokio::test]
    async fn test_host_start() {
        let host = HostListener::bind(0).await.unwrap();
        assert!(host.addr().port() > 0);
    }

    #[tokio::test]
    async fn test_accept_and_connect() {
        let host = HostListener::bind(0).await.unwrap();
        let target = PeerAddress::new("127.0.0.1", host.addr().port());

        let (accepted, connected) = tokio::join!(host.accept(), connect(&target));
        let (mut host_side, _) = accepted.unwrap();
        let (mut guest_side, peer) = connected.unwrap();
        assert_eq!(peer.port(), target.port);

        host_side.send("hi").await.unwrap();
        assert_eq!(
            guest_side.receive_line().await.unwrap(),
            Received::Line("hi".into())
        );
    }
}
