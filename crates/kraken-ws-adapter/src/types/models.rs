/*
[INPUT]:  Positional market-data payloads after coercion
[OUTPUT]: Typed Rust structs for ticker, OHLC, trade, spread and book data plus the event envelope
[POS]:    Data layer - decoded market data and envelope definitions
[UPDATE]: When payload layouts change or new market channels are added
*/

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::channel::{AssetPair, ChannelName};
use super::enums::{OrderType, Side};
use super::responses::ControlEvent;
use crate::error::DecodeError;

/// Today / rolling-24h pair used throughout the ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window<T> {
    pub today: T,
    pub last_24h: T,
}

/// Best ask or bid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub whole_lot_volume: u64,
    pub lot_volume: Decimal,
}

/// Last trade closed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastTrade {
    pub price: Decimal,
    pub lot_volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticker {
    pub ask: PriceLevel,
    pub bid: PriceLevel,
    pub close: LastTrade,
    pub volume: Window<Decimal>,
    pub vwap: Window<Decimal>,
    pub trades: Window<u64>,
    pub low: Window<Decimal>,
    pub high: Window<Decimal>,
    pub open: Window<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ohlc {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub vwap: Decimal,
    pub volume: Decimal,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub price: Decimal,
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub order_type: OrderType,
    pub misc: String,
}

/// Decoded rows of one trade message together with the rows that failed
#[derive(Debug, Default)]
pub struct TradeBatch {
    pub trades: Vec<Trade>,
    /// Each entry is a `DecodeError::RowDecode`
    pub rejected: Vec<DecodeError>,
}

impl TradeBatch {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spread {
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: DateTime<Utc>,
    pub bid_volume: Decimal,
    pub ask_volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Level re-sent after falling back into scope, not a fresh update
    pub republish: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookUpdateKind {
    Snapshot,
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookUpdate {
    pub kind: BookUpdateKind,
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
    pub checksum: Option<u32>,
}

#[derive(Debug)]
pub enum MarketPayload {
    Ticker(Ticker),
    Ohlc(Ohlc),
    Trade(TradeBatch),
    Spread(Spread),
    Book(BookUpdate),
}

/// Array-shaped data message after decoding
#[derive(Debug)]
pub struct MarketEvent {
    pub channel_id: u64,
    pub channel: ChannelName,
    pub pair: AssetPair,
    pub payload: MarketPayload,
}

/// Decoded content of one frame
#[derive(Debug)]
pub enum Event {
    Control(ControlEvent),
    Market(MarketEvent),
}

impl Event {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Control(control) => control.event_name(),
            Event::Market(market) => market.channel.subscription_name().as_str(),
        }
    }
}
