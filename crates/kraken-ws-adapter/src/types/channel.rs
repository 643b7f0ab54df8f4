/*
[INPUT]:  Channel name strings ("ohlc-5", "book-100", "trade") and pair strings ("XBT/USD")
[OUTPUT]: Validated ChannelName and AssetPair values
[POS]:    Data layer - identifiers shared by control and market-data messages
[UPDATE]: When channel naming or pair format changes
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::enums::{BookDepth, OhlcInterval, SubscriptionName};
use crate::error::{DecodeError, Result};

/// Channel identifier: a subscription kind plus the qualifier that kind requires.
///
/// Only `Ohlc` carries an interval and only `Book` carries a depth, so a
/// qualifier can never be attached to the wrong kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChannelName {
    Ticker,
    Ohlc(OhlcInterval),
    Trade,
    Spread,
    Book(BookDepth),
    OwnTrades,
    OpenOrders,
}

impl ChannelName {
    pub fn subscription_name(&self) -> SubscriptionName {
        match self {
            ChannelName::Ticker => SubscriptionName::Ticker,
            ChannelName::Ohlc(_) => SubscriptionName::Ohlc,
            ChannelName::Trade => SubscriptionName::Trade,
            ChannelName::Spread => SubscriptionName::Spread,
            ChannelName::Book(_) => SubscriptionName::Book,
            ChannelName::OwnTrades => SubscriptionName::OwnTrades,
            ChannelName::OpenOrders => SubscriptionName::OpenOrders,
        }
    }

    pub fn interval(&self) -> Option<OhlcInterval> {
        match self {
            ChannelName::Ohlc(interval) => Some(*interval),
            _ => None,
        }
    }

    pub fn depth(&self) -> Option<BookDepth> {
        match self {
            ChannelName::Book(depth) => Some(*depth),
            _ => None,
        }
    }

    /// Rebuild a channel from a subscription name and its optional qualifiers
    pub fn from_parts(
        name: SubscriptionName,
        interval: Option<OhlcInterval>,
        depth: Option<BookDepth>,
    ) -> Result<Self> {
        let unexpected = |reason: &str| DecodeError::InvalidQualifier {
            channel: name.to_string(),
            reason: reason.to_string(),
        };

        match (name, interval, depth) {
            (SubscriptionName::Ohlc, Some(interval), None) => Ok(ChannelName::Ohlc(interval)),
            (SubscriptionName::Ohlc, None, _) => Err(unexpected("missing interval")),
            (SubscriptionName::Book, None, Some(depth)) => Ok(ChannelName::Book(depth)),
            (SubscriptionName::Book, _, None) => Err(unexpected("missing depth")),
            (_, None, None) => {
                Self::unqualified(name).ok_or_else(|| unexpected("missing qualifier"))
            }
            _ => Err(unexpected("qualifier not accepted by this channel")),
        }
    }

    fn unqualified(name: SubscriptionName) -> Option<Self> {
        match name {
            SubscriptionName::Ticker => Some(ChannelName::Ticker),
            SubscriptionName::Trade => Some(ChannelName::Trade),
            SubscriptionName::Spread => Some(ChannelName::Spread),
            SubscriptionName::OwnTrades => Some(ChannelName::OwnTrades),
            SubscriptionName::OpenOrders => Some(ChannelName::OpenOrders),
            SubscriptionName::Ohlc | SubscriptionName::Book => None,
        }
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelName::Ohlc(interval) => write!(f, "ohlc-{}", interval.minutes()),
            ChannelName::Book(depth) => write!(f, "book-{}", depth.levels()),
            other => f.write_str(other.subscription_name().as_str()),
        }
    }
}

impl FromStr for ChannelName {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        let (base, qualifier) = match s.split_once('-') {
            Some((base, qualifier)) => (base, Some(qualifier)),
            None => (s, None),
        };

        let name: SubscriptionName = base
            .parse()
            .map_err(|_| DecodeError::InvalidChannel(s.to_string()))?;

        let invalid = |reason: String| DecodeError::InvalidQualifier {
            channel: s.to_string(),
            reason,
        };

        match name {
            SubscriptionName::Ohlc => {
                let minutes = parse_qualifier(qualifier).map_err(invalid)?;
                OhlcInterval::try_from(minutes)
                    .map(ChannelName::Ohlc)
                    .map_err(invalid)
            }
            SubscriptionName::Book => {
                let levels = parse_qualifier(qualifier).map_err(invalid)?;
                BookDepth::try_from(levels)
                    .map(ChannelName::Book)
                    .map_err(invalid)
            }
            _ => match qualifier {
                Some(extra) => Err(invalid(format!("unexpected qualifier {extra:?}"))),
                None => Self::unqualified(name)
                    .ok_or_else(|| invalid("missing qualifier".to_string())),
            },
        }
    }
}

fn parse_qualifier(qualifier: Option<&str>) -> std::result::Result<u32, String> {
    let raw = qualifier.ok_or_else(|| "missing qualifier".to_string())?;
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("non-numeric qualifier {raw:?}"));
    }
    raw.parse::<u32>()
        .map_err(|_| format!("qualifier out of range {raw:?}"))
}

impl TryFrom<String> for ChannelName {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ChannelName> for String {
    fn from(channel: ChannelName) -> Self {
        channel.to_string()
    }
}

/// Asset pair such as `XBT/USD`; both components are non-empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetPair {
    base: String,
    quote: String,
}

impl AssetPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Result<Self> {
        let base = base.into();
        let quote = quote.into();
        if base.is_empty() || quote.is_empty() || base.contains('/') || quote.contains('/') {
            return Err(DecodeError::InvalidPair(format!("{base}/{quote}")));
        }
        Ok(Self { base, quote })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for AssetPair {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        let mut pieces = s.split('/');
        match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(base), Some(quote), None) if !base.is_empty() && !quote.is_empty() => Ok(Self {
                base: base.to_string(),
                quote: quote.to_string(),
            }),
            _ => Err(DecodeError::InvalidPair(s.to_string())),
        }
    }
}

impl TryFrom<String> for AssetPair {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AssetPair> for String {
    fn from(pair: AssetPair) -> Self {
        pair.to_string()
    }
}
