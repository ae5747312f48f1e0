use std::time::Duration;

use bytes::Bytes;
use protocol::framing;
use protocol::TransportError;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_INTERVAL_MS: u64 = 1000;

/// Fixed-interval connect retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_RETRY_INTERVAL_MS),
        }
    }
}

/// A framed byte stream to the core.
pub struct Connection<S = TcpStream> {
    stream: S,
    peer: String,
}

impl Connection<TcpStream> {
    /// Connect to `host:port`, retrying per `policy`.
    pub async fn connect(
        host: &str,
        port: u16,
        policy: &RetryPolicy,
    ) -> Result<Self, TransportError> {
        let address = format!("{}:{}", host, port);
        let max_attempts = policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match TcpStream::connect(&address).await {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    info!(address = %address, attempt, "Connected to core");
                    return Ok(Self {
                        stream,
                        peer: address,
                    });
                }
                Err(e) if attempt < max_attempts => {
                    warn!(
                        address = %address,
                        error = %e,
                        "Connect failed, retrying in {}ms (attempt {}/{})",
                        policy.interval.as_millis(),
                        attempt,
                        max_attempts
                    );
                    tokio::time::sleep(policy.interval).await;
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "Connect failed, giving up");
                }
            }
        }

        Err(TransportError::RetriesExhausted {
            address,
            attempts: max_attempts,
        })
    }

    /// Accept one connection from the core.
    pub async fn accept(listener: &TcpListener) -> Result<Self, TransportError> {
        let (stream, peer) = listener.accept().await?;
        stream.set_nodelay(true)?;
        info!(peer = %peer, "Accepted connection from core");
        Ok(Self {
            stream,
            peer: peer.to_string(),
        })
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn from_stream(stream: S, peer: impl Into<String>) -> Self {
        Self {
            stream,
            peer: peer.into(),
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub async fn send_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        debug!(peer = %self.peer, len = payload.len(), "Sending frame");
        framing::write_frame(&mut self.stream, payload).await
    }

    /// `None` once the peer has closed the stream cleanly.
    pub async fn recv_frame(&mut self) -> Result<Option<Bytes>, TransportError> {
        framing::read_frame(&mut self.stream).await
    }

    pub async fn send<M: prost::Message>(&mut self, message: &M) -> Result<(), TransportError> {
        self.send_frame(&message.encode_to_vec()).await
    }

    pub async fn recv<M: prost::Message + Default>(&mut self) -> protocol::Result<Option<M>> {
        framing::read_message(&mut self.stream).await
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{message, Message, MessageType, StepNamesRequest};

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.interval, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_message_exchange_over_duplex() {
        let (left, right) = tokio::io::duplex(256);
        let mut core = Connection::from_stream(left, "core");
        let mut runner = Connection::from_stream(right, "runner");

        let request = Message::new(
            MessageType::StepNamesRequest,
            3,
            message::Body::StepNamesRequest(StepNamesRequest {}),
        );
        core.send(&request).await.unwrap();

        let received: Message = runner.recv().await.unwrap().unwrap();
        assert_eq!(received, request);
        assert_eq!(runner.peer(), "runner");
    }

    #[tokio::test]
    async fn test_recv_after_close_is_none() {
        let (left, right) = tokio::io::duplex(64);
        let mut runner = Connection::from_stream(right, "runner");
        drop(left);

        assert!(runner.recv_frame().await.unwrap().is_none());
    }
}
