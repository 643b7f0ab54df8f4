/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Kraken feed adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod decode;
pub mod error;
pub mod types;
pub mod ws;

// Re-export commonly used types from decode
pub use decode::{Frame, RawMarketFrame, classify_frame, decode_frame, decode_payload, dispatch};

// Re-export error types
pub use error::{DecodeError, ExpectedType, Result, WsError};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{FeedMessage, KrakenWebSocket, PUBLIC_STREAM_URL};
