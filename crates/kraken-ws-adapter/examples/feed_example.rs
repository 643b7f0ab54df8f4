/*
[INPUT]:  Public Kraken WebSocket endpoint
[OUTPUT]: Decoded ticker, ohlc and trade events printed to stdout
[POS]:    Examples - public feed subscription and decoding
[UPDATE]: When the client or event types change
*/

use kraken_ws_adapter::*;
use tokio::time::{Duration, timeout};

const MESSAGE_LIMIT: usize = 20;

/// Example: subscribe to a few public channels and print what arrives
///
/// No credentials are needed; every channel used here is public.
#[tokio::main]
async fn main() {
    println!("=== Kraken Public Feed Example ===\n");

    let mut ws = KrakenWebSocket::new();
    let mut receiver = match ws.take_receiver() {
        Some(rx) => rx,
        None => {
            eprintln!("Receiver already taken");
            return;
        }
    };

    if let Err(e) = ws.connect().await {
        eprintln!("Failed to connect to {}: {}", ws.url(), e);
        return;
    }
    println!("✓ Connected to {}", ws.url());

    let pair = match "XBT/USD".parse::<AssetPair>() {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Bad pair: {}", e);
            return;
        }
    };

    for channel in [
        ChannelName::Ticker,
        ChannelName::Ohlc(OhlcInterval::FiveMinutes),
        ChannelName::Trade,
    ] {
        match ws.subscribe(channel, [pair.clone()]).await {
            Ok(reqid) => println!("✓ Subscribed to {} (reqid {})", channel, reqid),
            Err(e) => println!("✗ Subscribe to {} failed: {}", channel, e),
        }
    }

    println!("\nPrinting the first {} messages...\n", MESSAGE_LIMIT);
    for _ in 0..MESSAGE_LIMIT {
        let message = match timeout(Duration::from_secs(30), receiver.recv()).await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(_) => {
                println!("✗ No message within 30s");
                break;
            }
        };

        match message {
            Ok(Event::Control(control)) => println!("control  {:?}", control),
            Ok(Event::Market(event)) => match event.payload {
                MarketPayload::Ticker(ticker) => {
                    println!("ticker   {} bid={} ask={}", event.pair, ticker.bid.price, ticker.ask.price)
                }
                MarketPayload::Ohlc(ohlc) => {
                    println!("ohlc     {} close={} vwap={}", event.pair, ohlc.close, ohlc.vwap)
                }
                MarketPayload::Trade(batch) => {
                    for trade in &batch.trades {
                        println!(
                            "trade    {} {:?} {} @ {}",
                            event.pair, trade.side, trade.volume, trade.price
                        );
                    }
                }
                other => println!("market   {:?}", other),
            },
            Err(e) if e.is_ignorable() => println!("ignored  {}", e),
            Err(e) => println!("✗ decode {}", e),
        }
    }

    ws.disconnect().await;
    println!("\n✓ Feed example complete");
}
