use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use vela_core::VelaError;

/// One live, framed text connection to an upstream feed.
///
/// The session driver only ever needs text frames; pings, pongs, and binary
/// frames are transport noise handled below this seam.
#[async_trait]
pub trait FeedSocket: Send {
    /// Send one text frame (e.g. a subscribe message).
    async fn send_text(&mut self, frame: String) -> Result<(), VelaError>;

    /// Receive the next text frame.
    ///
    /// `Ok(None)` signals a clean close by the peer; an error signals a
    /// broken transport. Both cause the session to reconnect.
    async fn next_text(&mut self) -> Result<Option<String>, VelaError>;
}

/// Dialer for push feeds.
///
/// Abstracted so tests can inject scripted sockets; production uses
/// [`WsTransport`].
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Establish a connection to `endpoint`.
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn FeedSocket>, VelaError>;
}

/// `tokio-tungstenite` transport used by all production push connectors.
pub struct WsTransport {
    connector: &'static str,
}

impl WsTransport {
    /// Create a transport whose errors are tagged with `connector`.
    #[must_use]
    pub const fn new(connector: &'static str) -> Self {
        Self { connector }
    }
}

struct WsSocket {
    connector: &'static str,
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushTransport for WsTransport {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn FeedSocket>, VelaError> {
        let (inner, _response) = connect_async(endpoint)
            .await
            .map_err(|e| VelaError::transport(self.connector, format!("dial: {e}")))?;
        Ok(Box::new(WsSocket {
            connector: self.connector,
            inner,
        }))
    }
}

#[async_trait]
impl FeedSocket for WsSocket {
    async fn send_text(&mut self, frame: String) -> Result<(), VelaError> {
        self.inner
            .send(Message::text(frame))
            .await
            .map_err(|e| VelaError::transport(self.connector, format!("write: {e}")))
    }

    async fn next_text(&mut self) -> Result<Option<String>, VelaError> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                // Control and binary frames are not trade payloads.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_))) => {}
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    return Err(VelaError::transport(self.connector, format!("read: {e}")));
                }
            }
        }
    }
}
