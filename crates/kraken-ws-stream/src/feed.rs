/*
[INPUT]:  StreamConfig (endpoint, subscriptions, toggle) + shutdown token.
[OUTPUT]: Decoded feed events logged and counted; connection state via `watch`.
[POS]:    Runtime layer - connection lifecycle around the feed client (no decoding here).
[UPDATE]: When changing subscription flow, reconnection backoff, or shutdown semantics.
*/

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::{Instant, Interval, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kraken_ws_adapter::{
    ControlEvent, DecodeError, Event, FeedMessage, KrakenWebSocket, MarketEvent, MarketPayload,
    SubscriptionStatus, WsError,
};

use crate::config::{StreamConfig, ToggleConfig};
use crate::metrics::{FeedMetrics, FeedMetricsSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected { retry_count: u32 },
    Connecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamExit {
    Disconnected,
    Shutdown,
}

/// Feed runner: connects, subscribes, decodes, logs; reconnects with backoff.
#[derive(Debug)]
pub struct FeedRunner {
    config: StreamConfig,
    connection_state: watch::Sender<ConnectionState>,
    metrics: Arc<Mutex<FeedMetrics>>,
    shutdown: CancellationToken,
}

impl FeedRunner {
    pub fn new(config: StreamConfig, shutdown: CancellationToken) -> Self {
        let (connection_state, _rx) =
            watch::channel(ConnectionState::Disconnected { retry_count: 0 });

        Self {
            config,
            connection_state,
            metrics: Arc::new(Mutex::new(FeedMetrics::default())),
            shutdown,
        }
    }

    /// Subscribe to connection state changes.
    pub fn subscribe_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection_state.subscribe()
    }

    pub fn metrics(&self) -> Arc<Mutex<FeedMetrics>> {
        self.metrics.clone()
    }

    pub async fn metrics_snapshot(&self) -> FeedMetricsSnapshot {
        self.metrics.lock().await.snapshot()
    }

    /// Run until shutdown; fails once `max_retries` consecutive connects have failed.
    pub async fn run(&self) -> Result<()> {
        let mut retry_count: u32 = 0;

        loop {
            if self.shutdown.is_cancelled() {
                self.set_state(ConnectionState::Disconnected { retry_count });
                return Ok(());
            }

            self.set_state(ConnectionState::Connecting);

            match self.connect_once().await {
                Ok((ws, mut rx)) => {
                    retry_count = 0;
                    self.set_state(ConnectionState::Connected);
                    self.metrics.lock().await.record_connection();
                    info!(url = %ws.url(), "Kraken feed connected");

                    let exit = self.stream_loop(&ws, &mut rx).await;
                    ws.disconnect().await;

                    match exit {
                        StreamExit::Shutdown => {
                            self.set_state(ConnectionState::Disconnected { retry_count });
                            return Ok(());
                        }
                        StreamExit::Disconnected => {
                            warn!("Kraken feed disconnected; reconnecting");
                            continue;
                        }
                    }
                }
                Err(err) => {
                    retry_count = retry_count.saturating_add(1);
                    self.set_state(ConnectionState::Disconnected { retry_count });

                    if retry_count >= self.config.max_retries {
                        warn!(retry_count, max_retries = self.config.max_retries, error = %err, "Kraken feed gave up reconnecting");
                        return Err(anyhow!(err)
                            .context(format!("gave up after {retry_count} connection attempts")));
                    }

                    let backoff = backoff_duration(retry_count);
                    warn!(retry_count, ?backoff, error = %err, retryable = err.is_retryable(), "Kraken feed connect failed; retrying with backoff");

                    tokio::select! {
                        _ = self.shutdown.cancelled() => {
                            self.set_state(ConnectionState::Disconnected { retry_count });
                            return Ok(());
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let _ = self.connection_state.send(state);
    }

    async fn connect_once(&self) -> Result<(KrakenWebSocket, mpsc::Receiver<FeedMessage>), WsError> {
        let mut ws = KrakenWebSocket::with_url(&self.config.url)?;
        let rx = ws.take_receiver().ok_or(WsError::ChannelClosed)?;

        info!(url = %self.config.url, "Connecting to Kraken public feed");
        ws.connect().await?;
        self.subscribe_all(&ws).await?;

        Ok((ws, rx))
    }

    async fn subscribe_all(&self, ws: &KrakenWebSocket) -> Result<(), WsError> {
        for subscription in &self.config.subscriptions {
            let reqid = ws
                .subscribe(subscription.channel, subscription.pairs.clone())
                .await?;
            info!(channel = %subscription.channel, pairs = subscription.pairs.len(), reqid, "subscribe sent");
        }

        if let Some(toggle) = &self.config.toggle
            && !self.config.covers(&toggle.channel, &toggle.pair)
        {
            let reqid = ws
                .subscribe(toggle.channel, [toggle.pair.clone()])
                .await?;
            info!(channel = %toggle.channel, pair = %toggle.pair, reqid, "toggle subscribe sent");
        }

        Ok(())
    }

    async fn stream_loop(
        &self,
        ws: &KrakenWebSocket,
        rx: &mut mpsc::Receiver<FeedMessage>,
    ) -> StreamExit {
        let mut toggle = self.config.toggle.as_ref().map(ToggleState::new);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("Kraken feed shutdown requested");
                    return StreamExit::Shutdown;
                }
                _ = next_toggle_tick(&mut toggle) => {
                    if let Some(state) = toggle.as_mut()
                        && let Err(err) = state.flip(ws).await
                    {
                        warn!(error = %err, "toggle request failed");
                        return StreamExit::Disconnected;
                    }
                }
                msg = rx.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message).await,
                        None => {
                            warn!("Kraken feed stream ended");
                            return StreamExit::Disconnected;
                        }
                    }
                }
            }
        }
    }

    async fn handle_message(&self, message: FeedMessage) {
        match message {
            Ok(Event::Control(control)) => self.handle_control(control).await,
            Ok(Event::Market(event)) => {
                log_market_event(&event);
                self.metrics.lock().await.record_market(&event);
            }
            Err(err) => {
                log_decode_error(&err);
                self.metrics.lock().await.record_error(&err);
            }
        }
    }

    async fn handle_control(&self, control: ControlEvent) {
        let mut metrics = self.metrics.lock().await;
        match control {
            ControlEvent::Heartbeat => {
                debug!("heartbeat");
                metrics.record_heartbeat();
                return;
            }
            ControlEvent::SystemStatus(status) => {
                info!(connection_id = ?status.connection_id, status = ?status.status, version = ?status.version, "system status");
            }
            ControlEvent::SubscriptionStatus(status) => {
                let channel = status.channel_name.as_ref().map(ToString::to_string);
                let pair = status.pair.as_ref().map(ToString::to_string);
                if status.status == Some(SubscriptionStatus::Error) {
                    warn!(?channel, ?pair, reqid = ?status.reqid, error = ?status.error_message, "subscription rejected");
                } else {
                    info!(channel_id = ?status.channel_id, ?channel, ?pair, status = ?status.status, "subscription status");
                }
            }
            ControlEvent::Error(error) => {
                warn!(reqid = ?error.reqid, error = ?error.error_message, "feed error");
            }
            other => {
                debug!(event = other.event_name(), "control event");
            }
        }
        metrics.record_control();
    }
}

/// Alternates unsubscribe and subscribe of one pair; the pair starts subscribed.
#[derive(Debug)]
struct ToggleState {
    config: ToggleConfig,
    ticker: Interval,
    subscribed: bool,
}

impl ToggleState {
    fn new(config: &ToggleConfig) -> Self {
        let period = Duration::from_secs(config.period_secs);
        Self {
            config: config.clone(),
            ticker: interval_at(Instant::now() + period, period),
            subscribed: true,
        }
    }

    async fn flip(&mut self, ws: &KrakenWebSocket) -> Result<(), WsError> {
        let channel = self.config.channel;
        let pair = self.config.pair.clone();
        let reqid = if self.subscribed {
            ws.unsubscribe(channel, [pair]).await?
        } else {
            ws.subscribe(channel, [pair]).await?
        };
        self.subscribed = !self.subscribed;
        info!(channel = %self.config.channel, pair = %self.config.pair, subscribed = self.subscribed, reqid, "toggle");
        Ok(())
    }
}

async fn next_toggle_tick(toggle: &mut Option<ToggleState>) {
    match toggle {
        Some(state) => {
            state.ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn log_market_event(event: &MarketEvent) {
    let pair = event.pair.to_string();
    match &event.payload {
        MarketPayload::Ticker(ticker) => {
            info!(%pair, bid = %ticker.bid.price, ask = %ticker.ask.price, close = %ticker.close.price, "ticker");
        }
        MarketPayload::Ohlc(ohlc) => {
            info!(%pair, channel = %event.channel, close = %ohlc.close, vwap = %ohlc.vwap, count = ohlc.count, "ohlc");
        }
        MarketPayload::Trade(batch) => {
            for rejected in &batch.rejected {
                warn!(%pair, error = %rejected, "trade row rejected");
            }
            if let Some(last) = batch.trades.last() {
                info!(%pair, trades = batch.trades.len(), last_price = %last.price, side = ?last.side, "trade");
            }
        }
        MarketPayload::Spread(spread) => {
            debug!(%pair, bid = %spread.bid, ask = %spread.ask, "spread");
        }
        MarketPayload::Book(book) => {
            debug!(%pair, kind = ?book.kind, asks = book.asks.len(), bids = book.bids.len(), checksum = ?book.checksum, "book");
        }
    }
}

fn log_decode_error(err: &DecodeError) {
    if err.is_ignorable() {
        debug!(error = %err, "ignored feed message");
    } else {
        warn!(error = %err, "failed to decode feed message");
    }
}

pub fn backoff_duration(retry_count: u32) -> Duration {
    let exp = retry_count.saturating_sub(1).min(63);
    let secs = 1u64 << exp;
    Duration::from_secs(secs.min(30))
}
