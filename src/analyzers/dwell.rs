//! Dwell-interval reconstruction.
//!
//! The feed never reports explicit arrivals or departures, only repeated
//! sightings. Sightings sharing `(line, station, train, direction)` are folded
//! into one interval spanning the first to the last sighting. Intervals are
//! rebuilt from scratch on every run; nothing links them across runs, and a
//! train number reused after midnight lands in the same group.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ConfigError;
use crate::observation::Observation;

/// Grouping key of a dwell interval.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DwellKey {
    pub line_name: Option<String>,
    pub station_name: Option<String>,
    pub train_number: String,
    pub direction: Option<String>,
}

impl DwellKey {
    pub fn of(observation: &Observation) -> Self {
        Self {
            line_name: observation.line_name.clone(),
            station_name: observation.station_name.clone(),
            train_number: observation.train_number.clone(),
            direction: observation.direction.clone(),
        }
    }
}

/// How long one train stayed observable at one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DwellInterval {
    pub line_name: Option<String>,
    pub station_name: Option<String>,
    pub train_number: String,
    pub direction: Option<String>,
    pub arrival_time: NaiveDateTime,
    pub last_seen_time: NaiveDateTime,
    pub sample_count: usize,
    /// Status of the latest sighting.
    pub status: Option<String>,
    pub dwell_seconds: i64,
}

impl DwellInterval {
    pub fn dwell_minutes(&self) -> f64 {
        self.dwell_seconds as f64 / 60.0
    }

    pub fn key(&self) -> DwellKey {
        DwellKey {
            line_name: self.line_name.clone(),
            station_name: self.station_name.clone(),
            train_number: self.train_number.clone(),
            direction: self.direction.clone(),
        }
    }
}

/// Intervals rebuilt from one window of observations.
#[derive(Debug, Default)]
pub struct Reconstruction {
    pub intervals: Vec<DwellInterval>,
    /// Observations left out because `observed_at` was missing or malformed.
    pub unparseable: usize,
}

struct Group {
    arrival: NaiveDateTime,
    last_seen: NaiveDateTime,
    last_collected: DateTime<Utc>,
    status: Option<String>,
    count: usize,
}

/// Groups observations into dwell intervals, ordered by key.
///
/// The status of an interval comes from the sighting with the latest
/// `observed_at` regardless of input order; equal receipt times fall back to
/// the later `collected_at`, then to the later position in the input.
pub fn reconstruct(observations: &[Observation]) -> Reconstruction {
    let mut groups: BTreeMap<DwellKey, Group> = BTreeMap::new();
    let mut unparseable = 0usize;

    for observation in observations {
        let Some(seen) = observation.observed_time() else {
            unparseable += 1;
            continue;
        };

        groups
            .entry(DwellKey::of(observation))
            .and_modify(|g| {
                g.count += 1;
                if seen < g.arrival {
                    g.arrival = seen;
                }
                if (seen, observation.collected_at) >= (g.last_seen, g.last_collected) {
                    g.last_seen = seen;
                    g.last_collected = observation.collected_at;
                    g.status = observation.status.clone();
                }
            })
            .or_insert_with(|| Group {
                arrival: seen,
                last_seen: seen,
                last_collected: observation.collected_at,
                status: observation.status.clone(),
                count: 1,
            });
    }

    if unparseable > 0 {
        debug!(unparseable, "Observations without a usable receipt time");
    }

    let intervals = groups
        .into_iter()
        .map(|(key, g)| DwellInterval {
            line_name: key.line_name,
            station_name: key.station_name,
            train_number: key.train_number,
            direction: key.direction,
            arrival_time: g.arrival,
            last_seen_time: g.last_seen,
            sample_count: g.count,
            status: g.status,
            dwell_seconds: (g.last_seen - g.arrival).num_seconds(),
        })
        .collect();

    Reconstruction {
        intervals,
        unparseable,
    }
}

/// Drops intervals shorter than a minimum dwell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseFilter {
    min_dwell_seconds: f64,
}

impl NoiseFilter {
    /// Keeps everything with at least one sighting.
    pub const OFF: Self = Self {
        min_dwell_seconds: 0.0,
    };
    pub const TEN_SECONDS: Self = Self {
        min_dwell_seconds: 10.0,
    };

    pub fn new(min_dwell_seconds: f64) -> Result<Self, ConfigError> {
        if !min_dwell_seconds.is_finite() || min_dwell_seconds < 0.0 {
            return Err(ConfigError::InvalidNoiseThreshold(min_dwell_seconds));
        }
        Ok(Self { min_dwell_seconds })
    }

    pub fn min_dwell_seconds(&self) -> f64 {
        self.min_dwell_seconds
    }

    pub fn passes(&self, interval: &DwellInterval) -> bool {
        interval.dwell_seconds as f64 >= self.min_dwell_seconds
    }

    pub fn apply(&self, intervals: Vec<DwellInterval>) -> Vec<DwellInterval> {
        intervals.into_iter().filter(|i| self.passes(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sighting(train: &str, station: &str, at: &str, status: &str) -> Observation {
        Observation {
            collected_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            line_id: "1001".into(),
            line_name: Some("Line A".into()),
            station_name: Some(station.into()),
            train_number: train.into(),
            observed_at: Some(at.into()),
            direction: Some("0".into()),
            status: Some(status.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input() {
        let r = reconstruct(&[]);
        assert!(r.intervals.is_empty());
        assert_eq!(r.unparseable, 0);
    }

    #[test]
    fn test_three_sightings_make_one_interval() {
        let observations = vec![
            sighting("101", "Station X", "2024-01-01 10:00:15", "1"),
            sighting("101", "Station X", "2024-01-01 10:04:20", "2"),
            sighting("101", "Station X", "2024-01-01 10:00:00", "0"),
        ];

        let r = reconstruct(&observations);
        assert_eq!(r.intervals.len(), 1);

        let interval = &r.intervals[0];
        assert_eq!(interval.dwell_seconds, 260);
        assert_eq!(interval.sample_count, 3);
        // Latest by receipt time, not by input order.
        assert_eq!(interval.status.as_deref(), Some("2"));
        assert_eq!(interval.arrival_time.to_string(), "2024-01-01 10:00:00");
        assert_eq!(interval.last_seen_time.to_string(), "2024-01-01 10:04:20");
    }

    #[test]
    fn test_single_sighting_has_zero_dwell() {
        let r = reconstruct(&[sighting("7", "Station Y", "2024-01-01 08:00:00", "1")]);
        assert_eq!(r.intervals[0].sample_count, 1);
        assert_eq!(r.intervals[0].dwell_seconds, 0);
    }

    #[test]
    fn test_grouping_is_a_partition() {
        let mut other_direction = sighting("101", "Station X", "2024-01-01 10:01:00", "1");
        other_direction.direction = Some("1".into());
        let mut no_line = sighting("101", "Station X", "2024-01-01 10:01:00", "1");
        no_line.line_name = None;

        let observations = vec![
            sighting("101", "Station X", "2024-01-01 10:00:00", "0"),
            sighting("101", "Station X", "2024-01-01 10:00:30", "1"),
            sighting("102", "Station X", "2024-01-01 10:00:00", "1"),
            sighting("101", "Station Z", "2024-01-01 10:05:00", "1"),
            other_direction,
            no_line,
        ];

        let r = reconstruct(&observations);
        assert_eq!(r.intervals.len(), 5);
        let total: usize = r.intervals.iter().map(|i| i.sample_count).sum();
        assert_eq!(total, observations.len());

        let mut keys: Vec<_> = observations.iter().map(DwellKey::of).collect();
        keys.sort();
        keys.dedup();
        let produced: Vec<_> = r.intervals.iter().map(DwellInterval::key).collect();
        assert_eq!(produced, keys);

        assert!(r.intervals.iter().all(|i| i.dwell_seconds >= 0));
        assert!(
            r.intervals
                .iter()
                .filter(|i| i.sample_count == 1)
                .all(|i| i.dwell_seconds == 0)
        );
    }

    #[test]
    fn test_unparseable_times_are_counted_not_grouped() {
        let mut missing = sighting("101", "Station X", "", "1");
        missing.observed_at = None;
        let observations = vec![
            sighting("101", "Station X", "2024-01-01 10:00:00", "1"),
            sighting("101", "Station X", "yesterday", "1"),
            missing,
        ];

        let r = reconstruct(&observations);
        assert_eq!(r.unparseable, 2);
        assert_eq!(r.intervals.len(), 1);
        assert_eq!(r.intervals[0].sample_count, 1);
    }

    #[test]
    fn test_equal_times_prefer_latest_collection() {
        let mut early = sighting("101", "Station X", "2024-01-01 10:00:00", "1");
        let mut late = sighting("101", "Station X", "2024-01-01 10:00:00", "2");
        early.collected_at = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 20).unwrap();
        late.collected_at = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 40).unwrap();

        let forward = reconstruct(&[early.clone(), late.clone()]);
        let backward = reconstruct(&[late, early]);
        assert_eq!(forward.intervals[0].status.as_deref(), Some("2"));
        assert_eq!(backward.intervals[0].status.as_deref(), Some("2"));
    }

    #[test]
    fn test_noise_filter_thresholds() {
        let r = reconstruct(&[
            sighting("1", "A", "2024-01-01 10:00:00", "1"),
            sighting("2", "A", "2024-01-01 10:00:00", "1"),
            sighting("2", "A", "2024-01-01 10:00:10", "1"),
            sighting("3", "A", "2024-01-01 10:00:00", "1"),
            sighting("3", "A", "2024-01-01 10:00:09", "1"),
        ]);

        let strict = NoiseFilter::new(10.0).unwrap().apply(r.intervals.clone());
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].train_number, "2");

        let open = NoiseFilter::new(0.0).unwrap().apply(r.intervals.clone());
        assert_eq!(open.len(), 3);
    }

    #[test]
    fn test_noise_filter_is_idempotent() {
        let r = reconstruct(&[
            sighting("1", "A", "2024-01-01 10:00:00", "1"),
            sighting("1", "A", "2024-01-01 10:00:30", "1"),
            sighting("2", "A", "2024-01-01 10:00:00", "1"),
        ]);
        let filter = NoiseFilter::new(10.0).unwrap();

        let once = filter.apply(r.intervals);
        let twice = filter.apply(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_noise_filter_rejects_negative() {
        assert_eq!(
            NoiseFilter::new(-0.5),
            Err(ConfigError::InvalidNoiseThreshold(-0.5))
        );
    }
}
