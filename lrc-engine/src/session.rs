//! WebSocket session for one channel connection.
//!
//! Owns both live streams and the background tasks around them:
//!
//! ```text
//! document socket ──► reader task ──┐
//!                                   ├──► SessionEvent mpsc ──► update loop
//! signet socket ────► reader task ──┘
//!
//! update loop ──► outbound mpsc ──► writer task ──► document socket
//! ```
//!
//! All three tasks get their channel ends at spawn time — the session
//! is plain data, instantiable and testable with no process-wide
//! state. Per-stream ordering is preserved end to end; nothing is
//! guaranteed *between* the two streams, which is why draft
//! correlation tolerates arbitrary interleaving.
//!
//! Every task stops and reports a typed terminal event on its first
//! read/decode/write failure. Nothing here retries: reconnection is
//! the surrounding application's decision.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use lrc_proto::{Event, SignetView, TypedRecord, SIGNET_VIEW_TYPE};

use crate::error::EngineError;

/// Topic probe sentinel sent in the connect-time `Get`. The host
/// answers with the real topic filled in.
pub const TOPIC_SENTINEL: &str = "?";

/// Session configuration: where to connect and who we claim to be.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// URL of the binary document-event stream.
    pub document_url: String,
    /// URL of the JSON identity-correlation stream.
    pub signet_url: String,
    /// Subprotocol offered on the document socket.
    pub subprotocol: Option<String>,
    /// Identity announced on connect (Set, then Get).
    pub nick: Option<String>,
    pub handle: Option<String>,
    pub color: Option<u32>,
    /// Outbound frame buffer before senders block.
    pub outbound_capacity: usize,
    /// Inbound event buffer before readers block.
    pub event_capacity: usize,
}

impl SessionConfig {
    pub fn new(document_url: impl Into<String>, signet_url: impl Into<String>) -> Self {
        Self {
            document_url: document_url.into(),
            signet_url: signet_url.into(),
            subprotocol: Some("lrc.v1".to_string()),
            nick: None,
            handle: None,
            color: None,
            outbound_capacity: 256,
            event_capacity: 256,
        }
    }
}

/// Events delivered to the update loop, in per-stream wire order.
#[derive(Debug)]
pub enum SessionEvent {
    /// A decoded document-stream event.
    Document(Event),
    /// A signet view from the identity-correlation stream.
    Signet(SignetView),
    /// Terminal failure of one of the background tasks.
    Fault(EngineError),
    /// A stream closed cleanly.
    Closed,
}

/// A live channel connection.
///
/// Hold it to send; take the event receiver once and drain it from
/// the update loop. Dropping or [`close`](Self::close)-ing the
/// session closes the outbound channel (the writer drains, then
/// exits) and tears the readers down.
pub struct ConnectionSession {
    outbound: Option<mpsc::Sender<Vec<u8>>>,
    events: Option<mpsc::Receiver<SessionEvent>>,
    writer: JoinHandle<()>,
    document_reader: JoinHandle<()>,
    signet_reader: JoinHandle<()>,
}

impl ConnectionSession {
    /// Connect both streams, announce identity (`Set` then `Get` with
    /// the topic sentinel), and spawn the background tasks.
    pub async fn connect(config: SessionConfig) -> Result<Self, EngineError> {
        let mut request = config
            .document_url
            .as_str()
            .into_client_request()
            .map_err(|e| EngineError::Socket(e.to_string()))?;
        if let Some(protocol) = &config.subprotocol {
            let value = HeaderValue::from_str(protocol)
                .map_err(|e| EngineError::Socket(e.to_string()))?;
            request
                .headers_mut()
                .insert("Sec-WebSocket-Protocol", value);
        }

        let (document_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| EngineError::Socket(e.to_string()))?;
        let (signet_stream, _) = tokio_tungstenite::connect_async(config.signet_url.as_str())
            .await
            .map_err(|e| EngineError::Socket(e.to_string()))?;
        log::info!(
            "connected to {} (signets via {})",
            config.document_url,
            config.signet_url
        );

        let (mut document_sink, document_source) = document_stream.split();

        // Identity announcement goes out before anything can race it.
        for event in [
            Event::set(config.nick.clone(), config.handle.clone(), config.color),
            Event::get_topic(TOPIC_SENTINEL),
        ] {
            let frame = event.encode().map_err(EngineError::from)?;
            document_sink
                .send(Message::Binary(frame.into()))
                .await
                .map_err(|e| EngineError::Socket(e.to_string()))?;
        }

        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(config.event_capacity);
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Vec<u8>>(config.outbound_capacity);

        // Writer: pre-encoded payloads, written in arrival order,
        // stopping on the first write error. A closed channel means
        // drain and exit.
        let writer_events = event_tx.clone();
        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = document_sink.send(Message::Binary(frame.into())).await {
                    log::warn!("document stream write failed: {e}");
                    let _ = writer_events
                        .send(SessionEvent::Fault(EngineError::Socket(e.to_string())))
                        .await;
                    return;
                }
            }
        });

        let document_events = event_tx.clone();
        let document_reader = tokio::spawn(async move {
            read_document_stream(document_source, document_events).await;
        });

        let signet_events = event_tx;
        let signet_reader = tokio::spawn(async move {
            read_signet_stream(signet_stream, signet_events).await;
        });

        Ok(Self {
            outbound: Some(outbound_tx),
            events: Some(event_rx),
            writer,
            document_reader,
            signet_reader,
        })
    }

    /// Take the inbound event receiver (can only be taken once).
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<SessionEvent>> {
        self.events.take()
    }

    /// Encode and queue an event for the document stream.
    pub async fn send(&self, event: &Event) -> Result<(), EngineError> {
        let frame = event.encode().map_err(EngineError::from)?;
        match &self.outbound {
            Some(tx) => tx.send(frame).await.map_err(|_| EngineError::Closed),
            None => Err(EngineError::Closed),
        }
    }

    /// Close the session: the writer channel closes so queued frames
    /// drain, then both readers are torn down.
    pub async fn close(mut self) {
        drop(self.outbound.take());
        let _ = self.writer.await;
        self.document_reader.abort();
        self.signet_reader.abort();
    }
}

async fn read_document_stream<S>(mut source: S, events: mpsc::Sender<SessionEvent>)
where
    S: futures_util::Stream<
            Item = Result<Message, tokio_tungstenite::tungstenite::Error>,
        > + Unpin,
{
    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Binary(data)) => match Event::decode(&data) {
                Ok(event) => {
                    if events.send(SessionEvent::Document(event)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    log::warn!("document stream decode failed: {e}");
                    let _ = events.send(SessionEvent::Fault(e.into())).await;
                    return;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                let _ = events
                    .send(SessionEvent::Fault(EngineError::Socket(e.to_string())))
                    .await;
                return;
            }
        }
    }
    let _ = events.send(SessionEvent::Closed).await;
}

async fn read_signet_stream<S>(mut source: S, events: mpsc::Sender<SessionEvent>)
where
    S: futures_util::Stream<
            Item = Result<Message, tokio_tungstenite::tungstenite::Error>,
        > + Unpin,
{
    while let Some(frame) = source.next().await {
        let raw = match frame {
            Ok(Message::Text(text)) => text.as_str().as_bytes().to_vec(),
            Ok(Message::Binary(data)) => data.into(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                let _ = events
                    .send(SessionEvent::Fault(EngineError::Socket(e.to_string())))
                    .await;
                return;
            }
        };
        // Peek at the discriminator first; unknown record kinds are
        // not ours to understand and are skipped.
        let typed: TypedRecord = match serde_json::from_slice(&raw) {
            Ok(typed) => typed,
            Err(e) => {
                let _ = events
                    .send(SessionEvent::Fault(EngineError::Decode(e.to_string())))
                    .await;
                return;
            }
        };
        if typed.record_type != SIGNET_VIEW_TYPE {
            continue;
        }
        match serde_json::from_slice::<SignetView>(&raw) {
            Ok(view) => {
                if events.send(SessionEvent::Signet(view)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                let _ = events
                    .send(SessionEvent::Fault(EngineError::Decode(e.to_string())))
                    .await;
                return;
            }
        }
    }
    let _ = events.send(SessionEvent::Closed).await;
}
