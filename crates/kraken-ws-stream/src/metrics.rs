/*
[INPUT]:  Decoded feed messages and decode failures
[OUTPUT]: Snapshot-friendly feed counters for logging and tests
[POS]:    Shared runtime metrics between the feed loop and its owner
[UPDATE]: When adding/removing feed-level runtime signals
*/

use std::time::Instant;

use kraken_ws_adapter::{DecodeError, MarketEvent, MarketPayload};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedMetricsSnapshot {
    pub connections: u64,
    pub control_events: u64,
    pub market_events: u64,
    pub trades: u64,
    pub rejected_rows: u64,
    pub ignored: u64,
    pub decode_failures: u64,
    pub last_trade_price: Option<Decimal>,
    pub last_heartbeat: Option<Instant>,
    pub last_update: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct FeedMetrics {
    connections: u64,
    control_events: u64,
    market_events: u64,
    trades: u64,
    rejected_rows: u64,
    ignored: u64,
    decode_failures: u64,
    last_trade_price: Option<Decimal>,
    last_heartbeat: Option<Instant>,
    last_update: Option<Instant>,
}

impl FeedMetrics {
    pub fn snapshot(&self) -> FeedMetricsSnapshot {
        FeedMetricsSnapshot {
            connections: self.connections,
            control_events: self.control_events,
            market_events: self.market_events,
            trades: self.trades,
            rejected_rows: self.rejected_rows,
            ignored: self.ignored,
            decode_failures: self.decode_failures,
            last_trade_price: self.last_trade_price,
            last_heartbeat: self.last_heartbeat,
            last_update: self.last_update,
        }
    }

    pub fn record_connection(&mut self) {
        self.connections += 1;
        self.last_update = Some(Instant::now());
    }

    pub fn record_control(&mut self) {
        self.control_events += 1;
        self.last_update = Some(Instant::now());
    }

    pub fn record_heartbeat(&mut self) {
        self.control_events += 1;
        self.last_heartbeat = Some(Instant::now());
        self.last_update = Some(Instant::now());
    }

    pub fn record_market(&mut self, event: &MarketEvent) {
        self.market_events += 1;
        if let MarketPayload::Trade(batch) = &event.payload {
            self.trades += batch.trades.len() as u64;
            self.rejected_rows += batch.rejected.len() as u64;
            if let Some(last) = batch.trades.last() {
                self.last_trade_price = Some(last.price);
            }
        }
        self.last_update = Some(Instant::now());
    }

    pub fn record_error(&mut self, err: &DecodeError) {
        if err.is_ignorable() {
            self.ignored += 1;
        } else {
            self.decode_failures += 1;
        }
        self.last_update = Some(Instant::now());
    }
}
