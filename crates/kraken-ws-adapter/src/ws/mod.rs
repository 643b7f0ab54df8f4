/*
[INPUT]:  Endpoint URL and subscription requests
[OUTPUT]: Decoded feed events over an mpsc channel
[POS]:    WebSocket layer - public feed transport
[UPDATE]: When adding request kinds or changing connection logic
*/

pub mod client;

pub use client::{FeedMessage, KrakenWebSocket, PUBLIC_STREAM_URL};
