//! Module `data_channel`
//!
//! A passive data channel is a one-shot TCP listener opened by `PASV`. It
//! hands out exactly one accepted connection; any further inbound
//! connection is accepted and closed straight away without touching the
//! first. Dropping the channel closes the listener.

use log::{debug, info, warn};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::error::TransferError;
use crate::transfer::TransferType;

/// Pending passive data channel owned by a single session
#[derive(Debug)]
pub struct PassiveDataChannel {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    transfer_type: TransferType,
    rejector: Option<JoinHandle<()>>,
}

impl PassiveDataChannel {
    /// Bind an ephemeral-port listener on `ip`, the address the control
    /// connection was accepted on.
    pub async fn open(ip: IpAddr, transfer_type: TransferType) -> Result<Self, TransferError> {
        let ipv4 = match ip {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(v6) => v6
                .to_ipv4_mapped()
                .ok_or(TransferError::UnsupportedAddress(ip))?,
        };

        let bind_addr = SocketAddr::from((ipv4, 0));
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| TransferError::PortBindingFailed(bind_addr, e))?;
        let local_addr = listener.local_addr()?;

        debug!("Passive listener bound on {}", local_addr);

        Ok(Self {
            listener: Some(listener),
            local_addr,
            transfer_type,
            rejector: None,
        })
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn ip(&self) -> Ipv4Addr {
        match self.local_addr.ip() {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(v6) => v6.to_ipv4_mapped().unwrap_or(Ipv4Addr::UNSPECIFIED),
        }
    }

    /// Transfer type copied from the session when the channel was opened
    pub fn transfer_type(&self) -> TransferType {
        self.transfer_type
    }

    /// The `227` reply advertising this channel
    pub fn pasv_reply(&self) -> String {
        format_pasv_reply(self.ip(), self.port())
    }

    /// Wait for the single client connection. Later connection attempts are
    /// closed by a background task that lives as long as the channel.
    pub async fn accept(&mut self, timeout: Duration) -> Result<TcpStream, TransferError> {
        let listener = self.listener.take().ok_or(TransferError::AlreadyConsumed)?;
        let port = self.port();

        let (stream, peer) = tokio::time::timeout(timeout, listener.accept())
            .await
            .map_err(|_| TransferError::ConnectionTimeout(port))??;

        info!("Data connection accepted from {} on port {}", peer, port);
        self.rejector = Some(tokio::spawn(reject_extra_connections(listener, port)));
        Ok(stream)
    }
}

impl Drop for PassiveDataChannel {
    fn drop(&mut self) {
        if let Some(rejector) = self.rejector.take() {
            rejector.abort();
        }
        debug!("Passive data channel on port {} closed", self.local_addr.port());
    }
}

async fn reject_extra_connections(listener: TcpListener, port: u16) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                warn!(
                    "Passive channel on port {} already accepted a connection; closing {}",
                    port, peer
                );
                drop(stream);
            }
            Err(e) => {
                debug!("Passive listener on port {} stopped: {}", port, e);
                break;
            }
        }
    }
}

/// `227 Entering Passive Mode. (h1,h2,h3,h4,p1,p2)` with the port split
/// into its high and low byte.
pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    let p1 = port / 256;
    let p2 = port - p1 * 256;
    format!("227 Entering Passive Mode. ({h1},{h2},{h3},{h4},{p1},{p2})\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn port_bytes(reply: &str) -> (u16, u16) {
        let inner = reply
            .trim_end()
            .rsplit('(')
            .next()
            .unwrap()
            .trim_end_matches(')');
        let parts: Vec<u16> = inner.split(',').map(|p| p.parse().unwrap()).collect();
        (parts[4], parts[5])
    }

    #[test]
    fn encodes_port_bytes() {
        let reply = format_pasv_reply(Ipv4Addr::new(127, 0, 0, 1), 49170);
        assert_eq!(reply, "227 Entering Passive Mode. (127,0,0,1,192,18)\r\n");
    }

    #[test]
    fn port_bytes_round_trip_for_every_port() {
        for port in 0..=u16::MAX {
            let (p1, p2) = port_bytes(&format_pasv_reply(Ipv4Addr::LOCALHOST, port));
            assert!(p2 < 256);
            assert_eq!(p1 as u32 * 256 + p2 as u32, port as u32);
        }
    }

    async fn open_local(transfer_type: TransferType) -> PassiveDataChannel {
        PassiveDataChannel::open(IpAddr::V4(Ipv4Addr::LOCALHOST), transfer_type)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_one_connection_and_closes_the_rest() {
        let mut channel = open_local(TransferType::Binary).await;
        let addr = SocketAddr::from((channel.ip(), channel.port()));

        let mut first = TcpStream::connect(addr).await.unwrap();
        let mut second = TcpStream::connect(addr).await.unwrap();

        let mut accepted = channel.accept(Duration::from_secs(5)).await.unwrap();

        let mut buf = [0u8; 8];
        let extra = second.read(&mut buf).await;
        assert!(matches!(extra, Ok(0) | Err(_)));

        accepted.write_all(b"payload").await.unwrap();
        accepted.shutdown().await.unwrap();
        let mut received = Vec::new();
        first.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"payload");

        assert!(matches!(
            channel.accept(Duration::from_millis(10)).await,
            Err(TransferError::AlreadyConsumed)
        ));
    }

    #[tokio::test]
    async fn accept_times_out_without_client() {
        let mut channel = open_local(TransferType::Ascii).await;
        assert!(matches!(
            channel.accept(Duration::from_millis(50)).await,
            Err(TransferError::ConnectionTimeout(_))
        ));
    }

    #[tokio::test]
    async fn dropping_the_channel_closes_the_listener() {
        let channel = open_local(TransferType::Binary).await;
        let addr = SocketAddr::from((channel.ip(), channel.port()));
        drop(channel);

        assert!(TcpStream::connect(addr).await.is_err());
    }
}
