/*
[INPUT]:  Object-shaped control messages keyed by `event`
[OUTPUT]: ControlEvent enum with explicit optional fields per event kind
[POS]:    Data layer - control message definitions (both directions)
[UPDATE]: When Kraken adds control events or fields
*/

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::channel::{AssetPair, ChannelName};
use super::enums::{SubscriptionStatus, SystemStatus};
use super::requests::{PingMessage, Subscription, SubscriptionRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatusMessage {
    #[serde(rename = "connectionID", default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SystemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatusMessage {
    #[serde(rename = "channelID", default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<u64>,
    #[serde(rename = "channelName", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<ChannelName>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub pair: Option<AssetPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    #[serde(rename = "errorMessage", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reqid: Option<u64>,
}

/// An `error` status echoes the rejected request, so an invalid echoed field becomes `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "errorMessage", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reqid: Option<u64>,
}

/// Control message, tagged by its `event` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ControlEvent {
    Ping(PingMessage),
    Pong(PingMessage),
    Heartbeat,
    SystemStatus(SystemStatusMessage),
    Subscribe(SubscriptionRequest),
    Unsubscribe(SubscriptionRequest),
    SubscriptionStatus(SubscriptionStatusMessage),
    Error(ErrorMessage),
}

impl ControlEvent {
    pub const EVENT_NAMES: [&'static str; 8] = [
        "ping",
        "pong",
        "heartbeat",
        "systemStatus",
        "subscribe",
        "unsubscribe",
        "subscriptionStatus",
        "error",
    ];

    pub fn is_known_event(name: &str) -> bool {
        Self::EVENT_NAMES.contains(&name)
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ControlEvent::Ping(_) => "ping",
            ControlEvent::Pong(_) => "pong",
            ControlEvent::Heartbeat => "heartbeat",
            ControlEvent::SystemStatus(_) => "systemStatus",
            ControlEvent::Subscribe(_) => "subscribe",
            ControlEvent::Unsubscribe(_) => "unsubscribe",
            ControlEvent::SubscriptionStatus(_) => "subscriptionStatus",
            ControlEvent::Error(_) => "error",
        }
    }
}
