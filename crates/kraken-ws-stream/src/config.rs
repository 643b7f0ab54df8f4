/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed and validated feed configuration
[POS]:    Configuration layer - connection and subscription setup
[UPDATE]: When adding new configuration options
*/

use anyhow::{Context, bail, ensure};
use serde::{Deserialize, Serialize};

use kraken_ws_adapter::{AssetPair, ChannelName, KrakenWebSocket, PUBLIC_STREAM_URL};

/// Top-level configuration for the feed runner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// WebSocket endpoint
    #[serde(default = "default_url")]
    pub url: String,
    /// Consecutive failed connects before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Channels to subscribe on every (re)connect
    pub subscriptions: Vec<SubscriptionConfig>,
    /// Optional periodic unsubscribe/resubscribe of one pair
    #[serde(default)]
    pub toggle: Option<ToggleConfig>,
}

/// One channel and the pairs subscribed to it, e.g. `ohlc-5` for `[XBT/USD]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionConfig {
    pub channel: ChannelName,
    pub pairs: Vec<AssetPair>,
}

/// Resubscription exercise: flips one pair off and on every `period_secs`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToggleConfig {
    pub channel: ChannelName,
    pub pair: AssetPair,
    #[serde(default = "default_toggle_period_secs")]
    pub period_secs: u64,
}

fn default_url() -> String {
    PUBLIC_STREAM_URL.to_string()
}

fn default_max_retries() -> u32 {
    10
}

fn default_toggle_period_secs() -> u64 {
    10
}

impl StreamConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("read config file {path}"))?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse config yaml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        KrakenWebSocket::with_url(&self.url).with_context(|| format!("invalid url {}", self.url))?;
        ensure!(self.max_retries > 0, "max_retries must be at least 1");
        ensure!(!self.subscriptions.is_empty(), "at least one subscription is required");

        for subscription in &self.subscriptions {
            ensure!(
                !subscription.pairs.is_empty(),
                "subscription {} has no pairs",
                subscription.channel
            );
            if subscription.channel.subscription_name().is_private() {
                bail!("{} is a private channel", subscription.channel);
            }
        }

        if let Some(toggle) = &self.toggle {
            ensure!(toggle.period_secs > 0, "toggle period_secs must be at least 1");
            if toggle.channel.subscription_name().is_private() {
                bail!("{} is a private channel", toggle.channel);
            }
        }

        Ok(())
    }

    /// Whether `pair` is already part of the subscription for `channel`
    pub fn covers(&self, channel: &ChannelName, pair: &AssetPair) -> bool {
        self.subscriptions
            .iter()
            .any(|subscription| &subscription.channel == channel && subscription.pairs.contains(pair))
    }

    /// Total number of (channel, pair) subscriptions requested on connect
    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .iter()
            .map(|subscription| subscription.pairs.len())
            .sum()
    }
}
