//! Source of raw train-position records.

mod seoul;

pub use seoul::SeoulOpenApi;

use anyhow::Result;

/// One record as delivered by the feed, before normalization.
pub type RawPosition = serde_json::Value;

/// Abstraction over a realtime train-position provider.
#[async_trait::async_trait]
pub trait PositionFeed: Send + Sync {
    /// Returns the current position records for one line.
    async fn fetch_positions(&self, line: &str) -> Result<Vec<RawPosition>>;
}
