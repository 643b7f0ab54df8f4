/*
[INPUT]:  WebSocket URL, subscribe/unsubscribe/ping requests
[OUTPUT]: Decoded events (or decode errors) delivered over an mpsc channel
[POS]:    WebSocket layer - public feed connection handling
[UPDATE]: When changing connection logic or request types
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info};
use url::Url;

use crate::decode::decode_frame;
use crate::error::{DecodeError, WsError};
use crate::types::{AssetPair, ChannelName, ControlEvent, Event, PingMessage, SubscriptionRequest};

pub const PUBLIC_STREAM_URL: &str = "wss://ws.kraken.com";
const CHANNEL_CAPACITY: usize = 100;
const MESSAGE_SAMPLE_LIMIT: usize = 3;
const SUBSCRIPTION_LOG_LIMIT: usize = 10;
const IGNORED_LOG_LIMIT: usize = 3;
const DECODE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

static MESSAGE_SAMPLE_COUNT: AtomicUsize = AtomicUsize::new(0);
static SUBSCRIBE_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);
static IGNORED_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);
static DECODE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// One decoded frame, or the reason it could not be decoded
pub type FeedMessage = Result<Event, DecodeError>;

/// WebSocket client for the Kraken public feed.
///
/// One client serves one connection: the receiver from [`take_receiver`](Self::take_receiver)
/// yields `None` once that connection's task has exited.
#[derive(Debug)]
pub struct KrakenWebSocket {
    url: String,
    message_tx: Mutex<Option<mpsc::Sender<FeedMessage>>>,
    message_rx: Option<mpsc::Receiver<FeedMessage>>,
    outbound_tx: Arc<Mutex<Option<mpsc::Sender<WsMessage>>>>,
    next_reqid: AtomicU64,
}

impl KrakenWebSocket {
    /// Create a client for the public endpoint
    pub fn new() -> Self {
        Self::with_checked_url(PUBLIC_STREAM_URL.to_string())
    }

    /// Create a client for a custom endpoint
    pub fn with_url(url: &str) -> Result<Self, WsError> {
        let parsed = Url::parse(url)?;
        Ok(Self::with_checked_url(parsed.into()))
    }

    fn with_checked_url(url: String) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            url,
            message_tx: Mutex::new(Some(tx)),
            message_rx: Some(rx),
            outbound_tx: Arc::new(Mutex::new(None)),
            next_reqid: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the message receiver
    pub fn take_receiver(&mut self) -> Option<mpsc::Receiver<FeedMessage>> {
        self.message_rx.take()
    }

    pub async fn is_connected(&self) -> bool {
        self.outbound_tx.lock().await.is_some()
    }

    /// Open the connection and start the read/write task
    pub async fn connect(&self) -> Result<(), WsError> {
        if self.is_connected().await {
            return Err(WsError::AlreadyConnected);
        }

        // handshake without holding the slot lock; re-check once it completes
        info!(url = %self.url, "connecting to Kraken public feed");
        let (ws_stream, _response) = connect_async(self.url.as_str()).await?;

        let mut guard = self.outbound_tx.lock().await;
        if guard.is_some() {
            return Err(WsError::AlreadyConnected);
        }
        let message_tx = self
            .message_tx
            .lock()
            .await
            .take()
            .ok_or(WsError::ChannelClosed)?;
        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let own_tx = outbound_tx.downgrade();
        *guard = Some(outbound_tx);
        drop(guard);

        let outbound_state = self.outbound_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outbound = outbound_rx.recv() => {
                        match outbound {
                            Some(message) => {
                                if write.send(message).await.is_err() {
                                    break;
                                }
                            }
                            None => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                        }
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Close(_))) => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                            Some(Ok(message)) => {
                                if let Some(decoded) = Self::parse_message(message)
                                    && message_tx.send(decoded).await.is_err()
                                {
                                    break;
                                }
                            }
                            Some(Err(err)) => {
                                debug!(error = %err, "Kraken feed read failed");
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }

            // only clear the slot if a newer connection has not replaced it
            let mut guard = outbound_state.lock().await;
            if let Some(own) = own_tx.upgrade()
                && guard.as_ref().is_some_and(|current| current.same_channel(&own))
            {
                *guard = None;
            }
            info!("Kraken feed connection closed");
        });

        Ok(())
    }

    /// Close the connection; the read task sends a close frame and exits
    pub async fn disconnect(&self) {
        let mut guard = self.outbound_tx.lock().await;
        guard.take();
    }

    /// Subscribe `pairs` to `channel`; returns the request id
    pub async fn subscribe(
        &self,
        channel: ChannelName,
        pairs: impl IntoIterator<Item = AssetPair>,
    ) -> Result<u64, WsError> {
        let reqid = self.next_reqid();
        let request = SubscriptionRequest::new(channel, pairs).with_reqid(reqid);
        self.send_request(&ControlEvent::Subscribe(request)).await?;
        Ok(reqid)
    }

    /// Unsubscribe `pairs` from `channel`; returns the request id
    pub async fn unsubscribe(
        &self,
        channel: ChannelName,
        pairs: impl IntoIterator<Item = AssetPair>,
    ) -> Result<u64, WsError> {
        let reqid = self.next_reqid();
        let request = SubscriptionRequest::new(channel, pairs).with_reqid(reqid);
        self.send_request(&ControlEvent::Unsubscribe(request)).await?;
        Ok(reqid)
    }

    /// Application-level ping; the feed answers with a `pong` carrying the same id
    pub async fn ping(&self) -> Result<u64, WsError> {
        let reqid = self.next_reqid();
        self.send_request(&ControlEvent::Ping(PingMessage { reqid: Some(reqid) }))
            .await?;
        Ok(reqid)
    }

    fn next_reqid(&self) -> u64 {
        self.next_reqid.fetch_add(1, Ordering::Relaxed)
    }

    async fn send_request(&self, request: &ControlEvent) -> Result<(), WsError> {
        let body = serde_json::to_string(request)?;
        let sender = {
            let guard = self.outbound_tx.lock().await;
            guard.clone().ok_or(WsError::NotConnected)?
        };

        sender
            .send(WsMessage::Text(body.into()))
            .await
            .map_err(|_| WsError::ChannelClosed)?;

        log_request_sent(request);

        Ok(())
    }

    /// Decode a transport message; control frames of the socket itself yield `None`
    pub(crate) fn parse_message(message: WsMessage) -> Option<FeedMessage> {
        let text: String = match message {
            WsMessage::Text(text) => text.to_string(),
            WsMessage::Binary(bytes) => String::from_utf8(bytes.to_vec()).ok()?,
            _ => return None,
        };

        let decoded = decode_frame(&text);
        match &decoded {
            Ok(event) => log_message_sample_once(event),
            Err(err) if err.is_ignorable() => log_ignored_message_once(err, &text),
            Err(err) => log_decode_fail_once(err, &text),
        }
        Some(decoded)
    }
}

impl Default for KrakenWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

fn log_request_sent(request: &ControlEvent) {
    let count = SUBSCRIBE_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= SUBSCRIPTION_LOG_LIMIT {
        return;
    }

    match request {
        ControlEvent::Subscribe(body) | ControlEvent::Unsubscribe(body) => {
            let pairs = body
                .pair
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let channel = body
                .subscription
                .channel()
                .map(|channel| channel.to_string())
                .unwrap_or_else(|_| body.subscription.name.to_string());
            info!(
                sample_index = count + 1,
                sample_limit = SUBSCRIPTION_LOG_LIMIT,
                action = request.event_name(),
                channel = %channel,
                pairs = %pairs,
                reqid = body.reqid,
                "ws request sent"
            );
        }
        other => {
            info!(
                sample_index = count + 1,
                sample_limit = SUBSCRIPTION_LOG_LIMIT,
                action = other.event_name(),
                "ws request sent"
            );
        }
    }
}

fn log_message_sample_once(event: &Event) {
    let count = MESSAGE_SAMPLE_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= MESSAGE_SAMPLE_LIMIT {
        return;
    }

    match event {
        Event::Market(market) => {
            info!(
                sample_index = count + 1,
                sample_limit = MESSAGE_SAMPLE_LIMIT,
                channel = %market.channel,
                channel_id = market.channel_id,
                pair = %market.pair,
                "ws message sample"
            );
        }
        Event::Control(control) => {
            info!(
                sample_index = count + 1,
                sample_limit = MESSAGE_SAMPLE_LIMIT,
                event = control.event_name(),
                "ws message sample"
            );
        }
    }
}

fn log_ignored_message_once(err: &DecodeError, raw: &str) {
    let count = IGNORED_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < IGNORED_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = IGNORED_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            "ws message event unrecognized"
        );
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = IGNORED_LOG_LIMIT,
            bytes = raw.len(),
            message = %preview,
            "ws message event unrecognized"
        );
    }
}

fn log_decode_fail_once(err: &DecodeError, raw: &str) {
    let count = DECODE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < DECODE_FAIL_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = DECODE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            "ws message decode failed"
        );
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = DECODE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            message = %preview,
            "ws message decode failed"
        );
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut cut = max_len;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = String::with_capacity(cut + 3);
    out.push_str(&value[..cut]);
    out.push_str("...");
    out
}
