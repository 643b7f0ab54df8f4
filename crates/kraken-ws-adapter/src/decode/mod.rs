/*
[INPUT]:  Raw text frames from the public feed
[OUTPUT]: Event envelopes (control or market data) or typed DecodeError values
[POS]:    Decode layer - frame classification and top-level dispatch
[UPDATE]: When the frame layout or set of control events changes
*/

//! Stateless decoder for Kraken public WebSocket frames.
//!
//! Objects are control messages keyed by `event`. Arrays are market data laid
//! out as `[channelID, payload.., channelName, pair]`. Every failure is
//! returned as a [`DecodeError`]; nothing here logs, blocks or holds state.

mod fields;
pub mod payload;

use serde_json::{Map, Value};

use crate::error::{DecodeError, Result};
use crate::types::{AssetPair, ChannelName, ControlEvent, Event, MarketEvent};

pub use payload::decode_payload;

/// channel id + at least one payload element + channel name + pair
const MIN_ARRAY_LEN: usize = 4;

/// Frame after classification, before payload decoding
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Control(ControlEvent),
    Market(RawMarketFrame),
}

/// Array frame with its envelope parsed and its payload still raw
#[derive(Debug, Clone, PartialEq)]
pub struct RawMarketFrame {
    pub channel_id: u64,
    pub channel: ChannelName,
    pub pair: AssetPair,
    pub payload: Vec<Value>,
}

/// Decode one text frame into an event
pub fn decode_frame(text: &str) -> Result<Event> {
    dispatch(classify_frame(text)?)
}

/// Parse the frame as JSON and split it by shape
pub fn classify_frame(text: &str) -> Result<Frame> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Object(object) => decode_control(object).map(Frame::Control),
        Value::Array(items) => split_market_frame(items).map(Frame::Market),
        Value::Null => Err(DecodeError::UnsupportedMessageShape { kind: "null" }),
        Value::Bool(_) => Err(DecodeError::UnsupportedMessageShape { kind: "boolean" }),
        Value::Number(_) => Err(DecodeError::UnsupportedMessageShape { kind: "number" }),
        Value::String(_) => Err(DecodeError::UnsupportedMessageShape { kind: "string" }),
    }
}

/// Route a classified frame to its payload decoder
pub fn dispatch(frame: Frame) -> Result<Event> {
    match frame {
        Frame::Control(control) => Ok(Event::Control(control)),
        Frame::Market(raw) => {
            let payload = decode_payload(&raw.channel, &raw.payload)?;
            Ok(Event::Market(MarketEvent {
                channel_id: raw.channel_id,
                channel: raw.channel,
                pair: raw.pair,
                payload,
            }))
        }
    }
}

fn decode_control(object: Map<String, Value>) -> Result<ControlEvent> {
    match object.get("event") {
        Some(Value::String(name)) if ControlEvent::is_known_event(name) => {}
        Some(Value::String(name)) => {
            return Err(DecodeError::UnknownControlEvent(Some(name.clone())));
        }
        Some(other) => return Err(DecodeError::UnknownControlEvent(Some(other.to_string()))),
        None => return Err(DecodeError::UnknownControlEvent(None)),
    }

    Ok(serde_json::from_value(Value::Object(object))?)
}

fn split_market_frame(mut items: Vec<Value>) -> Result<RawMarketFrame> {
    let len = items.len();
    let malformed = |reason: &'static str| DecodeError::MalformedArrayMessage { len, reason };

    if len < MIN_ARRAY_LEN {
        return Err(malformed("expected at least 4 elements"));
    }

    let channel_id = items[0]
        .as_u64()
        .ok_or_else(|| malformed("channel id is not an unsigned integer"))?;
    let pair: AssetPair = items[len - 1]
        .as_str()
        .ok_or_else(|| malformed("pair is not a string"))?
        .parse()?;
    let channel: ChannelName = items[len - 2]
        .as_str()
        .ok_or_else(|| malformed("channel name is not a string"))?
        .parse()?;

    let payload = items.drain(1..len - 2).collect();

    Ok(RawMarketFrame {
        channel_id,
        channel,
        pair,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OhlcInterval;

    #[test]
    fn test_classify_keeps_payload_raw() {
        let frame = classify_frame(r#"[7,{"a":[]},{"b":[]},"book-10","XBT/USD"]"#).unwrap();
        let Frame::Market(raw) = frame else {
            panic!("Expected market frame");
        };
        assert_eq!(raw.channel_id, 7);
        assert_eq!(raw.payload.len(), 2);
        assert_eq!(raw.pair.to_string(), "XBT/USD");
    }

    #[test]
    fn test_short_array_is_malformed() {
        assert!(matches!(
            classify_frame(r#"[1,"trade","XBT/USD"]"#),
            Err(DecodeError::MalformedArrayMessage { len: 3, .. })
        ));
    }

    #[test]
    fn test_non_integer_channel_id_is_malformed() {
        assert!(matches!(
            classify_frame(r#"["42",[],"ohlc-5","BTC/USD"]"#),
            Err(DecodeError::MalformedArrayMessage { len: 4, .. })
        ));
    }

    #[test]
    fn test_envelope_errors_surface_from_parsers() {
        assert!(matches!(
            classify_frame(r#"[1,[],"ohlc-7","BTC/USD"]"#),
            Err(DecodeError::InvalidQualifier { .. })
        ));
        assert!(matches!(
            classify_frame(r#"[1,[],"candles","BTC/USD"]"#),
            Err(DecodeError::InvalidChannel(_))
        ));
        assert!(matches!(
            classify_frame(r#"[1,[],"trade","BTCUSD"]"#),
            Err(DecodeError::InvalidPair(_))
        ));
    }

    #[test]
    fn test_dispatch_passes_control_through() {
        let event = dispatch(Frame::Control(ControlEvent::Heartbeat)).unwrap();
        assert!(matches!(event, Event::Control(ControlEvent::Heartbeat)));
    }

    #[test]
    fn test_dispatch_keeps_envelope() {
        let raw = RawMarketFrame {
            channel_id: 42,
            channel: ChannelName::Ohlc(OhlcInterval::FiveMinutes),
            pair: "BTC/USD".parse().unwrap(),
            payload: vec![serde_json::json!([
                "1542057314.748456",
                "1542057360.435743",
                "1", "2", "0.5", "1.5", "1.2", "10", 3
            ])],
        };
        let Event::Market(event) = dispatch(Frame::Market(raw)).unwrap() else {
            panic!("Expected market event");
        };
        assert_eq!(event.channel_id, 42);
        assert_eq!(event.channel.interval(), Some(OhlcInterval::FiveMinutes));
    }
}
