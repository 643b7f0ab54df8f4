/*
[INPUT]:  Channel and pair strings as they appear on the wire
[OUTPUT]: Test results for channel identifier and asset pair parsing
[POS]:    Integration tests - envelope parsers
[UPDATE]: When channel kinds or qualifier sets change
*/

use kraken_ws_adapter::{
    AssetPair, BookDepth, ChannelName, DecodeError, OhlcInterval, Subscription, SubscriptionName,
    SubscriptionRequest,
};
use rstest::rstest;
use tokio_test::{assert_err, assert_ok};

#[rstest]
#[case("XBT/USD")]
#[case("BTC/EUR")]
#[case("ETH/XBT")]
#[case("DOT.S/USD")]
fn test_pair_roundtrip(#[case] raw: &str) {
    let pair = assert_ok!(raw.parse::<AssetPair>());
    assert_eq!(pair.to_string(), raw);
}

#[rstest]
#[case("XBTUSD")]
#[case("/USD")]
#[case("XBT/")]
#[case("XBT/USD/EUR")]
#[case("")]
fn test_pair_rejects_bad_shapes(#[case] raw: &str) {
    let err = assert_err!(raw.parse::<AssetPair>());
    assert!(matches!(err, DecodeError::InvalidPair(ref value) if value == raw));
}

#[test]
fn test_every_ohlc_interval_roundtrips() {
    for interval in OhlcInterval::ALL {
        let raw = format!("ohlc-{}", interval.minutes());
        let channel = assert_ok!(raw.parse::<ChannelName>());
        assert_eq!(channel.interval(), Some(interval));
        assert_eq!(channel.to_string(), raw);
    }
}

#[rstest]
#[case("ohlc-2")]
#[case("ohlc-0")]
#[case("ohlc-61")]
#[case("ohlc-")]
#[case("ohlc")]
#[case("ohlc-five")]
#[case("ohlc-+5")]
#[case("ohlc-99999999999")]
fn test_ohlc_rejects_unknown_intervals(#[case] raw: &str) {
    let err = assert_err!(raw.parse::<ChannelName>());
    assert!(matches!(err, DecodeError::InvalidQualifier { ref channel, .. } if channel == raw));
}

#[rstest]
#[case("book-10", BookDepth::Ten)]
#[case("book-25", BookDepth::TwentyFive)]
#[case("book-100", BookDepth::OneHundred)]
#[case("book-500", BookDepth::FiveHundred)]
#[case("book-1000", BookDepth::OneThousand)]
fn test_book_depths(#[case] raw: &str, #[case] depth: BookDepth) {
    let channel = assert_ok!(raw.parse::<ChannelName>());
    assert_eq!(channel, ChannelName::Book(depth));
    assert_eq!(channel.to_string(), raw);
}

#[rstest]
#[case("book-5")]
#[case("book")]
#[case("trade-5")]
#[case("ticker-1")]
fn test_qualifier_errors(#[case] raw: &str) {
    assert!(matches!(
        raw.parse::<ChannelName>(),
        Err(DecodeError::InvalidQualifier { .. })
    ));
}

#[rstest]
#[case("candles")]
#[case("Trade")]
#[case("")]
#[case("level3-10")]
fn test_unknown_channels(#[case] raw: &str) {
    assert!(matches!(
        raw.parse::<ChannelName>(),
        Err(DecodeError::InvalidChannel(ref value)) if value == raw
    ));
}

#[rstest]
#[case(ChannelName::Ticker, r#"{"name":"ticker"}"#)]
#[case(ChannelName::Ohlc(OhlcInterval::OneHour), r#"{"name":"ohlc","interval":60}"#)]
#[case(ChannelName::Book(BookDepth::TwentyFive), r#"{"name":"book","depth":25}"#)]
fn test_subscription_wire_form(#[case] channel: ChannelName, #[case] expected: &str) {
    let subscription = Subscription::from(channel);
    assert_eq!(assert_ok!(serde_json::to_string(&subscription)), expected);
    assert_eq!(assert_ok!(subscription.channel()), channel);
}

#[test]
fn test_subscription_rejects_mismatched_qualifier() {
    let subscription = Subscription {
        name: SubscriptionName::Trade,
        interval: Some(OhlcInterval::OneMinute),
        depth: None,
        token: None,
    };
    assert!(matches!(
        subscription.channel(),
        Err(DecodeError::InvalidQualifier { .. })
    ));
}

#[test]
fn test_subscription_request_without_pairs_omits_field() {
    let request = SubscriptionRequest::new(ChannelName::Spread, Vec::new());
    let body = assert_ok!(serde_json::to_value(&request));
    assert!(body.get("pair").is_none());
    assert!(body.get("reqid").is_none());
}
