use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::{net::TcpStream, sync::Mutex};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::events::{
    extract_order_names, ChannelMessageEvent, DispatchError, EventContext, EventDispatcher,
    SlackEnvelope, SlackEvent,
};
use crate::web::SlackWebClient;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
    #[error("connection closed by slack: {0}")]
    Closed(String),
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// `Ok(None)` from `next_envelope` means the stream was shut down locally and
/// the runner should stop; a Slack-initiated close is `TransportError::Closed`.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError>;
    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum SocketFrame {
    Hello,
    Disconnect { reason: String },
    Envelope(SlackEnvelope),
    Other { frame_type: String },
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    frame_type: String,
    envelope_id: Option<String>,
    reason: Option<String>,
    payload: Option<RawPayload>,
}

#[derive(Deserialize)]
struct RawPayload {
    event: Option<RawEvent>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    channel: Option<String>,
    ts: Option<String>,
    thread_ts: Option<String>,
    user: Option<String>,
    bot_id: Option<String>,
    subtype: Option<String>,
    text: Option<String>,
}

impl RawEvent {
    fn into_slack_event(self) -> SlackEvent {
        if self.event_type != "message" {
            return SlackEvent::Unsupported { event_type: self.event_type };
        }
        match (self.channel, self.ts) {
            (Some(channel_id), Some(ts)) => {
                SlackEvent::ChannelMessage(ChannelMessageEvent {
                    channel_id,
                    ts,
                    thread_ts: self.thread_ts,
                    user_id: self.user,
                    bot_id: self.bot_id,
                    subtype: self.subtype,
                    text: self.text.unwrap_or_default(),
                })
            }
            _ => SlackEvent::Unsupported { event_type: self.event_type },
        }
    }
}

/// Decodes one Socket Mode text frame.
pub fn parse_socket_frame(text: &str) -> Result<SocketFrame, TransportError> {
    let frame: RawFrame = serde_json::from_str(text)
        .map_err(|error| TransportError::Receive(format!("malformed socket frame: {error}")))?;

    match frame.frame_type.as_str() {
        "hello" => return Ok(SocketFrame::Hello),
        "disconnect" => {
            return Ok(SocketFrame::Disconnect {
                reason: frame.reason.unwrap_or_else(|| "unspecified".to_owned()),
            })
        }
        _ => {}
    }

    let Some(envelope_id) = frame.envelope_id else {
        return Ok(SocketFrame::Other { frame_type: frame.frame_type });
    };

    let payload_event = frame.payload.and_then(|payload| payload.event);
    let event = match payload_event {
        Some(event) if frame.frame_type == "events_api" => event.into_slack_event(),
        _ => SlackEvent::Unsupported { event_type: frame.frame_type },
    };
    Ok(SocketFrame::Envelope(SlackEnvelope { envelope_id, event }))
}

type SocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Socket Mode over a WebSocket opened through `apps.connections.open`.
pub struct SlackSocketTransport {
    web: SlackWebClient,
    app_token: SecretString,
    stream: Mutex<Option<SocketStream>>,
}

impl SlackSocketTransport {
    pub fn new(web: SlackWebClient, app_token: SecretString) -> Self {
        Self { web, app_token, stream: Mutex::new(None) }
    }
}

#[async_trait]
impl SocketTransport for SlackSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let url = self
            .web
            .open_socket_url(&self.app_token)
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        *self.stream.lock().await = Some(stream);
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        let mut guard = self.stream.lock().await;
        loop {
            let Some(stream) = guard.as_mut() else {
                return Ok(None);
            };
            let Some(message) = stream.next().await else {
                *guard = None;
                return Err(TransportError::Closed("websocket stream ended".to_owned()));
            };

            match message.map_err(|error| TransportError::Receive(error.to_string()))? {
                Message::Text(text) => match parse_socket_frame(text.as_str()) {
                    Err(error) => warn!(
                        event_name = "ingress.slack.frame_skipped",
                        error = %error,
                        "skipping undecodable socket frame"
                    ),
                    Ok(SocketFrame::Hello) => {
                        debug!(event_name = "ingress.slack.hello", "socket hello")
                    }
                    Ok(SocketFrame::Disconnect { reason }) => {
                        *guard = None;
                        return Err(TransportError::Closed(reason));
                    }
                    Ok(SocketFrame::Envelope(envelope)) => return Ok(Some(envelope)),
                    Ok(SocketFrame::Other { frame_type }) => {
                        debug!(frame_type = %frame_type, "skipping socket frame without envelope")
                    }
                },
                Message::Close(frame) => {
                    *guard = None;
                    let reason = frame
                        .map(|frame| frame.reason.as_str().to_owned())
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| "close frame".to_owned());
                    return Err(TransportError::Closed(reason));
                }
                _ => {}
            }
        }
    }

    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .ok_or_else(|| TransportError::Acknowledge("socket is not connected".to_owned()))?;
        let ack = json!({ "envelope_id": envelope_id }).to_string();
        stream
            .send(Message::text(ack))
            .await
            .map_err(|error| TransportError::Acknowledge(error.to_string()))
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let Some(mut stream) = self.stream.lock().await.take() else {
            return Ok(());
        };
        stream.close(None).await.map_err(|error| TransportError::Disconnect(error.to_string()))
    }
}

const RECENT_DELIVERY_CAPACITY: usize = 512;

/// Remembers recently dispatched messages so a redelivery from Slack, sent
/// when an ack arrives late, is acknowledged but not handled twice.
#[derive(Default)]
struct RecentDeliveries {
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl RecentDeliveries {
    /// Returns `false` when the key was already recorded.
    fn record(&mut self, key: String) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        if self.order.len() == RECENT_DELIVERY_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(key.clone());
        self.order.push_back(key);
        true
    }
}

/// Messages are keyed by channel and timestamp since a redelivered event may
/// arrive under a fresh envelope id.
fn delivery_key(envelope: &SlackEnvelope) -> String {
    match &envelope.event {
        SlackEvent::ChannelMessage(event) => format!("message:{}:{}", event.channel_id, event.ts),
        SlackEvent::Unsupported { .. } => format!("envelope:{}", envelope.envelope_id),
    }
}

pub struct SocketModeRunner {
    transport: Arc<dyn SocketTransport>,
    dispatcher: EventDispatcher,
    reconnect_policy: ReconnectPolicy,
}

impl SocketModeRunner {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Runs until the transport is shut down or connection retries run out.
    /// Retries are only spent on consecutive failures: every successful
    /// connect resets the budget, and a close initiated by Slack reconnects
    /// immediately.
    pub async fn start(&self) -> Result<()> {
        let mut attempt = 0;
        let mut deliveries = RecentDeliveries::default();
        loop {
            match self.connect_and_pump(&mut attempt, &mut deliveries).await {
                Ok(()) => return Ok(()),
                Err(TransportError::Closed(reason)) => {
                    info!(
                        event_name = "ingress.slack.reconnect",
                        reason = %reason,
                        "slack closed the socket; reconnecting"
                    );
                    attempt = 0;
                }
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "socket mode transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "socket mode retries exhausted; stopping runner"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn connect_and_pump(
        &self,
        attempt: &mut u32,
        deliveries: &mut RecentDeliveries,
    ) -> Result<(), TransportError> {
        info!(attempt = *attempt, "opening socket mode transport connection");
        self.transport.connect().await?;
        info!(attempt = *attempt, "socket mode transport connected");
        *attempt = 0;

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!("socket mode transport stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };
            let (order_name, thread_id) = correlation_fields(&envelope);

            info!(
                event_name = "ingress.slack.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                order_name = order_name.as_deref().unwrap_or("unknown"),
                thread_id = thread_id.as_deref().unwrap_or("unknown"),
                "received slack envelope"
            );

            if let Err(error) = self.transport.acknowledge(&envelope.envelope_id).await {
                warn!(
                    event_name = "ingress.slack.ack_failed",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    error = %error,
                    "failed to acknowledge slack envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    "acknowledged slack envelope"
                );
            }

            if !deliveries.record(delivery_key(&envelope)) {
                info!(
                    event_name = "ingress.slack.duplicate_skipped",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    "skipping redelivered slack message"
                );
                continue;
            }

            let context = EventContext { correlation_id: envelope.envelope_id.clone() };
            if let Err(error) = self.dispatcher.dispatch(&envelope, &context).await {
                warn!(
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    order_name = order_name.as_deref().unwrap_or("unknown"),
                    thread_id = thread_id.as_deref().unwrap_or("unknown"),
                    error = %error,
                    "event dispatch failed; continuing socket loop"
                );
            }
        }
    }
}

fn correlation_fields(envelope: &SlackEnvelope) -> (Option<String>, Option<String>) {
    match &envelope.event {
        SlackEvent::ChannelMessage(event) => (
            extract_order_names(&event.text).into_iter().next(),
            Some(event.reply_thread_ts().to_owned()),
        ),
        SlackEvent::Unsupported { .. } => (None, None),
    }
}
