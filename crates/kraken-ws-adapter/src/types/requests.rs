/*
[INPUT]:  Channels and pairs chosen by the caller
[OUTPUT]: Serializable subscribe/unsubscribe/ping request bodies
[POS]:    Data layer - request type definitions
[UPDATE]: When request parameters change
*/

use serde::{Deserialize, Serialize};

use super::channel::{AssetPair, ChannelName};
use super::enums::{BookDepth, OhlcInterval, SubscriptionName};
use crate::error::Result;

/// `subscription` object of a subscribe request or status message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub name: SubscriptionName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<OhlcInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<BookDepth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Subscription {
    /// Channel this subscription produces data on
    pub fn channel(&self) -> Result<ChannelName> {
        ChannelName::from_parts(self.name, self.interval, self.depth)
    }
}

impl From<ChannelName> for Subscription {
    fn from(channel: ChannelName) -> Self {
        Self {
            name: channel.subscription_name(),
            interval: channel.interval(),
            depth: channel.depth(),
            token: None,
        }
    }
}

/// Body shared by `subscribe` and `unsubscribe`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reqid: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pair: Vec<AssetPair>,
    pub subscription: Subscription,
}

impl SubscriptionRequest {
    pub fn new(channel: ChannelName, pairs: impl IntoIterator<Item = AssetPair>) -> Self {
        Self {
            reqid: None,
            pair: pairs.into_iter().collect(),
            subscription: channel.into(),
        }
    }

    pub fn with_reqid(mut self, reqid: u64) -> Self {
        self.reqid = Some(reqid);
        self
    }
}

/// Body of `ping` and `pong`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reqid: Option<u64>,
}
