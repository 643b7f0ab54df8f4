/*
[INPUT]:  Kraken public feed vocabulary (subscription names, intervals, depths, statuses, trade codes)
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - closed value sets used by channels, requests and payloads
[UPDATE]: When Kraken adds intervals, depths or status values
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};

/// Base kind of a subscription, as sent in `subscription.name`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionName {
    Ticker,
    Ohlc,
    Trade,
    Spread,
    Book,
    OwnTrades,
    OpenOrders,
}

impl SubscriptionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionName::Ticker => "ticker",
            SubscriptionName::Ohlc => "ohlc",
            SubscriptionName::Trade => "trade",
            SubscriptionName::Spread => "spread",
            SubscriptionName::Book => "book",
            SubscriptionName::OwnTrades => "ownTrades",
            SubscriptionName::OpenOrders => "openOrders",
        }
    }

    /// Private feeds need an auth token and never carry public market data
    pub fn is_private(&self) -> bool {
        matches!(
            self,
            SubscriptionName::OwnTrades | SubscriptionName::OpenOrders
        )
    }
}

impl fmt::Display for SubscriptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionName {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ticker" => Ok(SubscriptionName::Ticker),
            "ohlc" => Ok(SubscriptionName::Ohlc),
            "trade" => Ok(SubscriptionName::Trade),
            "spread" => Ok(SubscriptionName::Spread),
            "book" => Ok(SubscriptionName::Book),
            "ownTrades" => Ok(SubscriptionName::OwnTrades),
            "openOrders" => Ok(SubscriptionName::OpenOrders),
            other => Err(DecodeError::InvalidChannel(other.to_string())),
        }
    }
}

/// OHLC candle interval in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum OhlcInterval {
    OneMinute = 1,
    FiveMinutes = 5,
    FifteenMinutes = 15,
    ThirtyMinutes = 30,
    OneHour = 60,
    FourHours = 240,
    OneDay = 1440,
    OneWeek = 10080,
    FifteenDays = 21600,
}

impl OhlcInterval {
    pub const ALL: [OhlcInterval; 9] = [
        OhlcInterval::OneMinute,
        OhlcInterval::FiveMinutes,
        OhlcInterval::FifteenMinutes,
        OhlcInterval::ThirtyMinutes,
        OhlcInterval::OneHour,
        OhlcInterval::FourHours,
        OhlcInterval::OneDay,
        OhlcInterval::OneWeek,
        OhlcInterval::FifteenDays,
    ];

    pub fn minutes(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for OhlcInterval {
    type Error = String;

    fn try_from(minutes: u32) -> std::result::Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|interval| interval.minutes() == minutes)
            .ok_or_else(|| format!("unsupported OHLC interval {minutes}"))
    }
}

impl From<OhlcInterval> for u32 {
    fn from(interval: OhlcInterval) -> Self {
        interval.minutes()
    }
}

/// Order book depth in price levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BookDepth {
    Ten = 10,
    TwentyFive = 25,
    OneHundred = 100,
    FiveHundred = 500,
    OneThousand = 1000,
}

impl BookDepth {
    pub const ALL: [BookDepth; 5] = [
        BookDepth::Ten,
        BookDepth::TwentyFive,
        BookDepth::OneHundred,
        BookDepth::FiveHundred,
        BookDepth::OneThousand,
    ];

    pub fn levels(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for BookDepth {
    type Error = String;

    fn try_from(levels: u32) -> std::result::Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|depth| depth.levels() == levels)
            .ok_or_else(|| format!("unsupported book depth {levels}"))
    }
}

impl From<BookDepth> for u32 {
    fn from(depth: BookDepth) -> Self {
        depth.levels()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    Online,
    Maintenance,
    CancelOnly,
    LimitOnly,
    PostOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Subscribed,
    Unsubscribed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Decode the trade-row side code (`b` / `s`)
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "b" | "buy" => Ok(Side::Buy),
            "s" | "sell" => Ok(Side::Sell),
            other => Err(DecodeError::UnrecognizedCode {
                field: "side",
                code: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    /// Decode the trade-row order type code (`m` / `l`)
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "m" | "market" => Ok(OrderType::Market),
            "l" | "limit" => Ok(OrderType::Limit),
            other => Err(DecodeError::UnrecognizedCode {
                field: "order type",
                code: other.to_string(),
            }),
        }
    }
}
