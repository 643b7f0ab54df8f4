/*
[INPUT]:  Public API exports for kraken-ws-stream crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod feed;
pub mod metrics;

// Re-export main types for convenience
pub use config::StreamConfig;
pub use feed::{ConnectionState, FeedRunner};
pub use metrics::{FeedMetrics, FeedMetricsSnapshot};
