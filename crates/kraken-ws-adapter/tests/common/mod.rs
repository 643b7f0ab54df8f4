/*
[INPUT]:  Captured Kraken public feed frames
[OUTPUT]: Shared fixtures and a local WebSocket server for transport tests
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new fixtures or server behaviours
*/

//! Common test utilities for kraken-ws-adapter tests

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const HEARTBEAT: &str = r#"{"event":"heartbeat"}"#;

pub const SYSTEM_STATUS: &str =
    r#"{"connectionID":8628615390848610000,"event":"systemStatus","status":"online","version":"1.0.0"}"#;

pub const SUBSCRIPTION_STATUS: &str = r#"{"channelID":10001,"channelName":"ohlc-5","event":"subscriptionStatus","pair":"XBT/EUR","reqid":42,"status":"subscribed","subscription":{"interval":5,"name":"ohlc"}}"#;

pub const SUBSCRIPTION_ERROR: &str = r#"{"errorMessage":"Currency pair not supported","event":"subscriptionStatus","pair":"XBT/ABC","status":"error","subscription":{"name":"ticker"}}"#;

pub const SUBSCRIPTION_DEPTH_ERROR: &str = r#"{"errorMessage":"Subscription depth not supported","event":"subscriptionStatus","pair":"XBT/USD","status":"error","subscription":{"depth":42,"name":"book"}}"#;

pub const TRADE: &str =
    r#"[340,[["5698.40000","1.00000000","1542057314.748456","s","l",""]],"trade","XBT/USD"]"#;

pub const TRADE_WITH_SHORT_ROW: &str = r#"[340,[["5541.20000","0.15850568","1534614057.321597","s","l",""],["5542.50000","0.40100000"]],"trade","XBT/USD"]"#;

pub const OHLC: &str = r#"[42,["5698.4","5700.0","1542057314.748456","1542057316.748456","5690","5705","5699","2.5",12],"ohlc-5","BTC/USD"]"#;

pub const TICKER: &str = r#"[0,{"a":["5525.40000",1,"1.000"],"b":["5525.10000",1,"1.000"],"c":["5525.10000","0.00398963"],"v":["2634.11501494","3591.17907851"],"p":["5631.44067","5653.78939"],"t":[11493,16267],"l":["5505.00000","5505.00000"],"h":["5783.00000","5783.00000"],"o":["5760.70000","5763.40000"]},"ticker","XBT/USD"]"#;

pub const SPREAD: &str =
    r#"[0,["5698.40000","5700.00000","1542057299.545897","1.01234567","0.98765432"],"spread","XBT/USD"]"#;

pub const BOOK_SNAPSHOT: &str = r#"[0,{"as":[["5541.30000","2.50700000","1534614248.123678"],["5541.80000","0.33000000","1534614098.345543"]],"bs":[["5541.20000","1.52900000","1534614248.765567"]]},"book-10","XBT/USD"]"#;

pub const BOOK_UPDATE: &str = r#"[1234,{"a":[["5541.30000","2.50700000","1534614248.456738"]]},{"b":[["5541.30000","0.00000000","1534614335.345903","r"]],"c":"974942666"},"book-10","XBT/USD"]"#;

/// Start a one-shot WebSocket server on an ephemeral port.
///
/// Once a client connects the server pushes `frames` as text messages, then
/// forwards every text frame it receives to the returned channel.
pub async fn spawn_feed_server(frames: Vec<&'static str>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local listener");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(mut ws) = accept_async(stream).await else {
            return;
        };

        for frame in frames {
            if ws.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }

        while let Some(Ok(message)) = ws.next().await {
            match message {
                Message::Text(text) => {
                    if tx.send(text.to_string()).await.is_err() {
                        return;
                    }
                }
                Message::Close(_) => return,
                _ => {}
            }
        }
    });

    (format!("ws://{addr}"), rx)
}
