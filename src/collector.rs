//! Write path: feed → normalizer → store, one line at a time.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::feed::PositionFeed;
use crate::normalize::normalize_batch;
use crate::stats::LineSample;
use crate::store::ObservationStore;

/// Polls every line once and stores what the feed returned.
///
/// A failure on one line is recorded in its [`LineSample`] and never stops
/// the remaining lines. `request_delay` is slept between lines.
#[tracing::instrument(skip(feed, store, lines), fields(lines = lines.len()))]
pub async fn collect_once<F, S>(
    feed: &F,
    store: &S,
    lines: &[String],
    collected_at: DateTime<Utc>,
    request_delay: Duration,
) -> Vec<LineSample>
where
    F: PositionFeed + ?Sized,
    S: ObservationStore + ?Sized,
{
    let mut samples = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        if i > 0 && !request_delay.is_zero() {
            tokio::time::sleep(request_delay).await;
        }

        let records = match feed.fetch_positions(line).await {
            Ok(records) => records,
            Err(e) => {
                error!(line = %line, error = %e, "Position fetch failed");
                samples.push(LineSample::from_error(collected_at, "fetch_error", &format!("{e:#}")).with_line(line));
                continue;
            }
        };

        if records.is_empty() {
            samples.push(LineSample { timestamp: collected_at, ..Default::default() }.with_line(line));
            continue;
        }

        let batch = normalize_batch(&records, collected_at);
        if batch.dropped > 0 {
            warn!(line = %line, dropped = batch.dropped, "Some records were unusable");
        }
        let sample = LineSample::from_batch(collected_at, records.len(), &batch).with_line(line);

        match store.append(&batch.observations) {
            Ok(stored) => {
                info!(line = %line, received = records.len(), stored, "Line collected");
                samples.push(sample.with_stored(stored));
            }
            Err(e) => {
                error!(line = %line, error = %e, "Storing observations failed");
                let mut failed = LineSample::from_error(collected_at, "store_error", &format!("{e:#}")).with_line(line);
                failed.received = sample.received;
                failed.dropped = sample.dropped;
                samples.push(failed);
            }
        }
    }

    samples
}
