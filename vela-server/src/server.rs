//! WebSocket streaming endpoint.
//!
//! One subscription per connection: the first client frame is a JSON
//! [`SubscribeRequest`]; on success the connection becomes a one-way candle
//! stream until the client disconnects or the service shuts down, at which
//! point the hub subscription detaches.

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use vela::Hub;
use vela_core::stream::stopped;
use vela_core::{VelaError, normalize_symbol};

/// First frame a subscriber sends after connecting.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    /// Symbol to stream; required.
    #[serde(default)]
    pub symbol: String,
    /// Requested window size in milliseconds. Zero (or omitted) accepts the
    /// engine's configured interval; any other value must match it exactly,
    /// since one instance serves exactly one window size.
    #[serde(default)]
    pub interval_ms: i64,
}

#[derive(Debug, Serialize)]
struct ErrorReply<'a> {
    error: &'a str,
}

/// Accept subscriber connections until the stop watch flips.
pub async fn serve(
    listener: TcpListener,
    hub: Hub,
    engine_interval_ms: i64,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let accepted = tokio::select! {
            () = stopped(&mut stop) => break,
            res = listener.accept() => res,
        };
        match accepted {
            Ok((stream, peer)) => {
                tracing::debug!(%peer, "subscriber connected");
                tokio::spawn(handle_connection(
                    stream,
                    hub.clone(),
                    engine_interval_ms,
                    stop.clone(),
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    hub: Hub,
    engine_interval_ms: i64,
    mut stop: watch::Receiver<bool>,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(error = %e, "websocket handshake failed");
            return;
        }
    };
    let (mut sink, mut frames) = ws.split();

    // First frame carries the subscription request.
    let request = tokio::select! {
        () = stopped(&mut stop) => return,
        maybe = frames.next() => maybe,
    };
    let request = match request {
        Some(Ok(Message::Text(text))) => serde_json::from_str::<SubscribeRequest>(&text).ok(),
        _ => None,
    };
    let Some(request) = request else {
        reject(&mut sink, &"invalid subscribe request").await;
        return;
    };
    if request.symbol.trim().is_empty() {
        reject(&mut sink, &VelaError::SymbolRequired).await;
        return;
    }
    if request.interval_ms != 0 && request.interval_ms != engine_interval_ms {
        let err = VelaError::IntervalMismatch {
            requested_ms: request.interval_ms,
            engine_ms: engine_interval_ms,
        };
        reject(&mut sink, &err).await;
        return;
    }

    let symbol = normalize_symbol(&request.symbol);
    let mut subscription = hub.subscribe(&symbol);
    tracing::debug!(%symbol, "subscription attached");

    loop {
        tokio::select! {
            () = stopped(&mut stop) => break,
            maybe = subscription.recv() => match maybe {
                Some(candle) => {
                    let Ok(body) = serde_json::to_string(&candle) else {
                        continue;
                    };
                    if sink.send(Message::text(body)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            maybe = frames.next() => match maybe {
                // Anything readable keeps the stream; close or a read error
                // ends it.
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    subscription.detach();
    tracing::debug!(%symbol, "subscription detached");
}

async fn reject<S>(sink: &mut S, reason: &(dyn std::fmt::Display + Send + Sync))
where
    S: SinkExt<Message> + Unpin,
{
    let reason = reason.to_string();
    let body = serde_json::to_string(&ErrorReply {
        error: reason.as_str(),
    })
    .unwrap_or_else(|_| format!("{{\"error\":\"{reason}\"}}"));
    let _ = sink.send(Message::text(body)).await;
    let _ = sink.send(Message::Close(None)).await;
}
