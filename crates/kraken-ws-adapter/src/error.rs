/*
[INPUT]:  Failure sources (JSON parsing, frame layout, channel/pair grammar, payload fields, transport)
[OUTPUT]: Structured error types returned by the decoder and the WebSocket transport
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new failure sources or changing error messages
*/

use std::fmt;

use thiserror::Error;

/// Shape a payload field was expected to coerce into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    Decimal,
    Integer,
    Timestamp,
    String,
    Array,
    Object,
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpectedType::Decimal => "decimal",
            ExpectedType::Integer => "integer",
            ExpectedType::Timestamp => "timestamp",
            ExpectedType::String => "string",
            ExpectedType::Array => "array",
            ExpectedType::Object => "object",
        };
        f.write_str(name)
    }
}

/// Error produced while decoding a single frame
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Frame is not valid JSON, or a control message has mistyped fields
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level JSON value is neither an object nor an array
    #[error("unsupported message shape: {kind}")]
    UnsupportedMessageShape { kind: &'static str },

    /// Array frame does not follow `[channelID, payload.., channelName, pair]`
    #[error("malformed array message ({len} elements): {reason}")]
    MalformedArrayMessage { len: usize, reason: &'static str },

    /// Channel name base token is not a known subscription, or has no public decoder
    #[error("invalid channel: {0}")]
    InvalidChannel(String),

    /// Interval or depth qualifier missing, non-numeric, unsupported or unexpected
    #[error("invalid qualifier for channel {channel}: {reason}")]
    InvalidQualifier { channel: String, reason: String },

    /// Asset pair is not of the form BASE/QUOTE
    #[error("invalid asset pair: {0:?}")]
    InvalidPair(String),

    /// Positional payload field missing or not coercible
    #[error("payload field {}[{index}]: expected {expected}", .key.unwrap_or(""))]
    PayloadField {
        key: Option<&'static str>,
        index: usize,
        expected: ExpectedType,
    },

    /// Side / order type code outside the known set
    #[error("unrecognized {field} code: {code:?}")]
    UnrecognizedCode { field: &'static str, code: String },

    /// Object frame with a missing or unknown `event` field
    #[error("unknown control event: {}", .0.as_deref().unwrap_or("<missing>"))]
    UnknownControlEvent(Option<String>),

    /// One row of a trade batch failed to decode
    #[error("row {row}: {source}")]
    RowDecode {
        row: usize,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Check if the frame can be skipped without reporting it as a failure
    pub fn is_ignorable(&self) -> bool {
        matches!(self, DecodeError::UnknownControlEvent(_))
    }

    /// Create a positional field error for an array payload
    pub fn field(index: usize, expected: ExpectedType) -> Self {
        DecodeError::PayloadField {
            key: None,
            index,
            expected,
        }
    }

    /// Create a field error for an element of a keyed object payload
    pub fn keyed_field(key: &'static str, index: usize, expected: ExpectedType) -> Self {
        DecodeError::PayloadField {
            key: Some(key),
            index,
            expected,
        }
    }
}

/// Error raised by the WebSocket transport
#[derive(Error, Debug)]
pub enum WsError {
    /// Connecting or upgrading the socket failed
    #[error("WebSocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    /// Endpoint URL could not be parsed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A connection is already open on this client
    #[error("WebSocket already connected")]
    AlreadyConnected,

    /// No connection is open
    #[error("WebSocket not connected")]
    NotConnected,

    /// Connection task is gone
    #[error("WebSocket send channel closed")]
    ChannelClosed,

    /// Outgoing request could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WsError {
    /// Check if reconnecting may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WsError::Connect(_) | WsError::NotConnected | WsError::ChannelClosed
        )
    }
}

/// Result type alias for decoding operations
pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_control_event_is_ignorable() {
        assert!(DecodeError::UnknownControlEvent(None).is_ignorable());
        assert!(!DecodeError::InvalidPair("XBTUSD".into()).is_ignorable());
    }

    #[test]
    fn test_payload_field_message() {
        let err = DecodeError::field(3, ExpectedType::Decimal);
        assert_eq!(err.to_string(), "payload field [3]: expected decimal");

        let err = DecodeError::keyed_field("a", 0, ExpectedType::Decimal);
        assert_eq!(err.to_string(), "payload field a[0]: expected decimal");
    }

    #[test]
    fn test_row_decode_wraps_source() {
        let err = DecodeError::RowDecode {
            row: 1,
            source: Box::new(DecodeError::field(2, ExpectedType::Timestamp)),
        };
        assert_eq!(err.to_string(), "row 1: payload field [2]: expected timestamp");
    }

    #[test]
    fn test_ws_error_retryable() {
        assert!(WsError::NotConnected.is_retryable());
        assert!(!WsError::AlreadyConnected.is_retryable());
    }
}
