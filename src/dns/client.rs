use crate::dns::{codec, Codec, Message, Qr, Question};

use futures::{SinkExt, StreamExt};
use tokio::net::UdpSocket;
use tokio_util::udp::UdpFramed;

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] codec::Error),
    #[error("failed to bind local UDP socket")]
    Bind(#[source] io::Error),
    #[error("no response from {server} within {timeout:?}")]
    Timeout { server: SocketAddr, timeout: Duration },
    #[error("socket closed before a response arrived")]
    Closed,
}

/// Stub resolver talking to a single name server over UDP.
#[derive(Debug, Clone)]
pub struct Client {
    server: SocketAddr,
    timeout: Duration,
    max_message_len: usize,
}

impl Client {
    pub fn new(server: SocketAddr, timeout: Duration, max_message_len: usize) -> Self {
        Self {
            server,
            timeout,
            max_message_len,
        }
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Asks the server a single question under a random message id.
    pub async fn query(&self, question: Question) -> Result<Message, Error> {
        self.send(Message::query(rand::random(), question)).await
    }

    /// Sends `query` from a fresh ephemeral socket and waits for the response
    /// carrying the same id. Datagrams from other peers and responses to other
    /// ids are skipped.
    pub async fn send(&self, query: Message) -> Result<Message, Error> {
        let local: SocketAddr = if self.server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await.map_err(Error::Bind)?;
        let mut framed = UdpFramed::new(socket, Codec::new(self.max_message_len));

        let id = query.header.id;
        log::debug!("Sending query {} to {}.", id, self.server);
        framed.send((query, self.server)).await?;

        match tokio::time::timeout(self.timeout, self.receive(&mut framed, id)).await {
            Ok(response) => response,
            Err(_) => Err(Error::Timeout {
                server: self.server,
                timeout: self.timeout,
            }),
        }
    }

    async fn receive(&self, framed: &mut UdpFramed<Codec>, id: u16) -> Result<Message, Error> {
        while let Some(frame) = framed.next().await {
            let (decoded, peer) = frame?;

            if peer != self.server {
                log::warn!("Ignoring datagram from unexpected peer {}.", peer);
                continue;
            }
            let msg = decoded.map_err(codec::Error::from)?;
            if msg.header.qr != Qr::Response || msg.header.id != id {
                log::warn!(
                    "Ignoring message {} from {}, waiting for response {}.",
                    msg.header.id,
                    peer,
                    id
                );
                continue;
            }

            log::debug!("Received response {} from {}.", id, peer);
            return Ok(msg);
        }

        Err(Error::Closed)
    }
}
