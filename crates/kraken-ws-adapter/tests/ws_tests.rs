/*
[INPUT]:  Local WebSocket server scenarios
[OUTPUT]: Test results for the feed client
[POS]:    Integration tests - WebSocket
[UPDATE]: When WebSocket client changes
*/

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::spawn_feed_server;
use kraken_ws_adapter::{
    AssetPair, ChannelName, ControlEvent, DecodeError, Event, KrakenWebSocket, MarketPayload,
    OhlcInterval, PUBLIC_STREAM_URL, WsError,
};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_websocket_creation() {
    let mut ws = KrakenWebSocket::new();
    assert_eq!(ws.url(), PUBLIC_STREAM_URL);
    assert!(ws.take_receiver().is_some());
}

#[test]
fn test_websocket_default() {
    let mut ws: KrakenWebSocket = Default::default();
    assert!(ws.take_receiver().is_some());
}

#[test]
fn test_websocket_receiver_take_once() {
    let mut ws = KrakenWebSocket::new();
    assert!(ws.take_receiver().is_some());
    assert!(ws.take_receiver().is_none());
}

#[test]
fn test_websocket_rejects_bad_url() {
    let err = assert_err!(KrakenWebSocket::with_url("not a url"));
    assert!(matches!(err, WsError::UrlParse(_)));
}

#[tokio::test]
async fn test_subscribe_before_connect() {
    let ws = KrakenWebSocket::new();
    let err = assert_err!(ws.subscribe(ChannelName::Ticker, Vec::new()).await);
    assert!(matches!(err, WsError::NotConnected));
    assert!(!ws.is_connected().await);
}

#[tokio::test]
async fn test_receives_decoded_frames() {
    let (url, _requests) =
        spawn_feed_server(vec![common::HEARTBEAT, "not json", common::OHLC]).await;
    let mut ws = assert_ok!(KrakenWebSocket::with_url(&url));
    let mut rx = ws.take_receiver().expect("receiver available");
    assert_ok!(ws.connect().await);
    assert!(ws.is_connected().await);

    let first = timeout(WAIT, rx.recv()).await.expect("heartbeat in time");
    assert!(matches!(first, Some(Ok(Event::Control(ControlEvent::Heartbeat)))));

    let second = timeout(WAIT, rx.recv()).await.expect("error in time");
    assert!(matches!(second, Some(Err(DecodeError::Json(_)))));

    let third = timeout(WAIT, rx.recv()).await.expect("ohlc in time");
    match third {
        Some(Ok(Event::Market(event))) => {
            assert_eq!(event.channel, ChannelName::Ohlc(OhlcInterval::FiveMinutes));
            assert!(matches!(event.payload, MarketPayload::Ohlc(_)));
        }
        other => panic!("Expected ohlc event, got {other:?}"),
    }

    ws.disconnect().await;
    assert!(!ws.is_connected().await);

    let closed = timeout(WAIT, rx.recv()).await.expect("receiver closes in time");
    assert!(closed.is_none());
}

#[tokio::test]
async fn test_subscribe_sends_request() {
    let (url, mut requests) = spawn_feed_server(Vec::new()).await;
    let ws = assert_ok!(KrakenWebSocket::with_url(&url));
    assert_ok!(ws.connect().await);

    let pair = assert_ok!("XBT/USD".parse::<AssetPair>());
    let reqid = assert_ok!(
        ws.subscribe(ChannelName::Ohlc(OhlcInterval::FiveMinutes), vec![pair])
            .await
    );

    let body = timeout(WAIT, requests.recv())
        .await
        .expect("request in time")
        .expect("request received");
    let value: serde_json::Value = assert_ok!(serde_json::from_str(&body));
    assert_eq!(
        value,
        serde_json::json!({
            "event": "subscribe",
            "reqid": reqid,
            "pair": ["XBT/USD"],
            "subscription": { "name": "ohlc", "interval": 5 }
        })
    );

    let ping_id = assert_ok!(ws.ping().await);
    assert_eq!(ping_id, reqid + 1);
    let body = timeout(WAIT, requests.recv())
        .await
        .expect("ping in time")
        .expect("ping received");
    assert_eq!(body, format!(r#"{{"event":"ping","reqid":{ping_id}}}"#));
}

#[tokio::test]
async fn test_connect_twice_is_rejected() {
    let (url, _requests) = spawn_feed_server(Vec::new()).await;
    let ws = assert_ok!(KrakenWebSocket::with_url(&url));
    assert_ok!(ws.connect().await);
    let err = assert_err!(ws.connect().await);
    assert!(matches!(err, WsError::AlreadyConnected));
}

#[tokio::test]
async fn test_pending_handshake_does_not_block_client() {
    // accepts TCP but never answers the upgrade request
    let listener = assert_ok!(TcpListener::bind("127.0.0.1:0").await);
    let addr = assert_ok!(listener.local_addr());
    let server = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.expect("accept");
        std::future::pending::<()>().await;
    });

    let ws = Arc::new(assert_ok!(KrakenWebSocket::with_url(&format!("ws://{addr}"))));
    let connecting = tokio::spawn({
        let ws = Arc::clone(&ws);
        async move { ws.connect().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let connected = assert_ok!(timeout(Duration::from_millis(500), ws.is_connected()).await);
    assert!(!connected);
    assert_ok!(timeout(Duration::from_millis(500), ws.disconnect()).await);
    assert!(!connecting.is_finished());

    connecting.abort();
    server.abort();
}
