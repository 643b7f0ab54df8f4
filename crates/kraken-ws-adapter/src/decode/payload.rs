/*
[INPUT]:  Payload elements of an array frame plus its parsed ChannelName
[OUTPUT]: MarketPayload per channel kind (ticker, ohlc, trade, spread, book)
[POS]:    Decode layer - one decoder per market-data channel
[UPDATE]: When a channel's positional layout changes
*/

use serde_json::{Map, Value};

use super::fields::{Fields, parse_integer};
use crate::error::{DecodeError, ExpectedType, Result};
use crate::types::{
    BookLevel, BookUpdate, BookUpdateKind, ChannelName, LastTrade, MarketPayload, Ohlc, OrderType,
    PriceLevel, Side, Spread, Ticker, Trade, TradeBatch, Window,
};

/// Frame elements that are not payload: channel id, channel name, pair
const ENVELOPE_ELEMENTS: usize = 3;

/// (key, ask side, snapshot)
const BOOK_SIDES: [(&str, bool, bool); 4] = [
    ("as", true, true),
    ("bs", false, true),
    ("a", true, false),
    ("b", false, false),
];

/// Route a payload to the decoder for its channel kind
pub fn decode_payload(channel: &ChannelName, payload: &[Value]) -> Result<MarketPayload> {
    match channel {
        ChannelName::Ticker => decode_ticker(single(payload)?).map(MarketPayload::Ticker),
        ChannelName::Ohlc(_) => decode_ohlc(single(payload)?).map(MarketPayload::Ohlc),
        ChannelName::Trade => decode_trades(single(payload)?).map(MarketPayload::Trade),
        ChannelName::Spread => decode_spread(single(payload)?).map(MarketPayload::Spread),
        ChannelName::Book(_) => decode_book(payload).map(MarketPayload::Book),
        ChannelName::OwnTrades | ChannelName::OpenOrders => {
            Err(DecodeError::InvalidChannel(channel.to_string()))
        }
    }
}

fn single(payload: &[Value]) -> Result<&Value> {
    match payload {
        [value] => Ok(value),
        _ => Err(DecodeError::MalformedArrayMessage {
            len: payload.len() + ENVELOPE_ELEMENTS,
            reason: "expected exactly one payload element",
        }),
    }
}

/// `{"a": [price, wholeLotVolume, lotVolume], "b": [..], "c": [price, lotVolume], "v": [today, 24h], ..}`
pub fn decode_ticker(payload: &Value) -> Result<Ticker> {
    let object = payload
        .as_object()
        .ok_or_else(|| DecodeError::field(0, ExpectedType::Object))?;

    Ok(Ticker {
        ask: price_level(object, "a")?,
        bid: price_level(object, "b")?,
        close: {
            let close = Fields::keyed(object, "c")?;
            LastTrade {
                price: close.decimal(0)?,
                lot_volume: close.decimal(1)?,
            }
        },
        volume: decimal_window(object, "v")?,
        vwap: decimal_window(object, "p")?,
        trades: {
            let trades = Fields::keyed(object, "t")?;
            Window {
                today: trades.integer(0)?,
                last_24h: trades.integer(1)?,
            }
        },
        low: decimal_window(object, "l")?,
        high: decimal_window(object, "h")?,
        open: decimal_window(object, "o")?,
    })
}

fn price_level(object: &Map<String, Value>, key: &'static str) -> Result<PriceLevel> {
    let level = Fields::keyed(object, key)?;
    Ok(PriceLevel {
        price: level.decimal(0)?,
        whole_lot_volume: level.integer(1)?,
        lot_volume: level.decimal(2)?,
    })
}

fn decimal_window(
    object: &Map<String, Value>,
    key: &'static str,
) -> Result<Window<rust_decimal::Decimal>> {
    let window = Fields::keyed(object, key)?;
    Ok(Window {
        today: window.decimal(0)?,
        last_24h: window.decimal(1)?,
    })
}

/// `[time, etime, open, high, low, close, vwap, volume, count]`
pub fn decode_ohlc(payload: &Value) -> Result<Ohlc> {
    let fields = as_positional(payload)?;
    Ok(Ohlc {
        start: fields.timestamp(0)?,
        end: fields.timestamp(1)?,
        open: fields.decimal(2)?,
        high: fields.decimal(3)?,
        low: fields.decimal(4)?,
        close: fields.decimal(5)?,
        vwap: fields.decimal(6)?,
        volume: fields.decimal(7)?,
        count: fields.integer(8)?,
    })
}

/// `[[price, volume, time, side, orderType, misc], ..]`; bad rows are collected, not fatal
pub fn decode_trades(payload: &Value) -> Result<TradeBatch> {
    let rows = as_positional(payload)?;
    let mut batch = TradeBatch::default();

    for (row, value) in rows.values().iter().enumerate() {
        match decode_trade_row(value) {
            Ok(trade) => batch.trades.push(trade),
            Err(err) => batch.rejected.push(DecodeError::RowDecode {
                row,
                source: Box::new(err),
            }),
        }
    }

    Ok(batch)
}

fn decode_trade_row(value: &Value) -> Result<Trade> {
    let fields = as_positional(value)?;
    Ok(Trade {
        price: fields.decimal(0)?,
        volume: fields.decimal(1)?,
        timestamp: fields.timestamp(2)?,
        side: Side::from_code(fields.str(3)?)?,
        order_type: OrderType::from_code(fields.str(4)?)?,
        misc: match fields.values().get(5) {
            Some(_) => fields.str(5)?.to_string(),
            None => String::new(),
        },
    })
}

/// `[bid, ask, timestamp, bidVolume, askVolume]`
pub fn decode_spread(payload: &Value) -> Result<Spread> {
    let fields = as_positional(payload)?;
    Ok(Spread {
        bid: fields.decimal(0)?,
        ask: fields.decimal(1)?,
        timestamp: fields.timestamp(2)?,
        bid_volume: fields.decimal(3)?,
        ask_volume: fields.decimal(4)?,
    })
}

/// Snapshot `{"as": [..], "bs": [..]}` or one/two update objects `{"a": [..]}`, `{"b": [..], "c": "checksum"}`;
/// every object must carry at least one side
pub fn decode_book(payload: &[Value]) -> Result<BookUpdate> {
    if payload.is_empty() || payload.len() > 2 {
        return Err(DecodeError::MalformedArrayMessage {
            len: payload.len() + ENVELOPE_ELEMENTS,
            reason: "expected one or two book payload objects",
        });
    }

    let parts = Fields::positional(payload);
    let mut book = BookUpdate {
        kind: BookUpdateKind::Update,
        asks: Vec::new(),
        bids: Vec::new(),
        checksum: None,
    };

    for index in 0..payload.len() {
        let object = parts.object(index)?;
        if !BOOK_SIDES.iter().any(|(key, ..)| object.contains_key(*key)) {
            return Err(parts.error(index, ExpectedType::Object));
        }
        for (key, is_ask, is_snapshot) in BOOK_SIDES {
            if !object.contains_key(key) {
                continue;
            }
            let levels = book_levels(object, key)?;
            if is_snapshot {
                book.kind = BookUpdateKind::Snapshot;
            }
            if is_ask {
                book.asks.extend(levels);
            } else {
                book.bids.extend(levels);
            }
        }
        if let Some(raw) = object.get("c") {
            let checksum = parse_integer(raw)
                .and_then(|value| u32::try_from(value).ok())
                .ok_or_else(|| DecodeError::keyed_field("c", 0, ExpectedType::Integer))?;
            book.checksum = Some(checksum);
        }
    }

    Ok(book)
}

fn book_levels(object: &Map<String, Value>, key: &'static str) -> Result<Vec<BookLevel>> {
    let rows = Fields::keyed(object, key)?;
    rows.values()
        .iter()
        .enumerate()
        .map(|(index, row)| -> Result<BookLevel> {
            let level = row
                .as_array()
                .map(|values| Fields::keyed_row(values, key))
                .ok_or_else(|| rows.error(index, ExpectedType::Array))?;
            decode_book_level(level).map_err(|err| DecodeError::RowDecode {
                row: index,
                source: Box::new(err),
            })
        })
        .collect()
}

fn decode_book_level(level: Fields<'_>) -> Result<BookLevel> {
    Ok(BookLevel {
        price: level.decimal(0)?,
        volume: level.decimal(1)?,
        timestamp: level.timestamp(2)?,
        republish: level.values().get(3).and_then(Value::as_str) == Some("r"),
    })
}

fn as_positional(value: &Value) -> Result<Fields<'_>> {
    value
        .as_array()
        .map(Vec::as_slice)
        .map(Fields::positional)
        .ok_or_else(|| DecodeError::field(0, ExpectedType::Array))
}
