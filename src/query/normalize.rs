use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use crate::common::{LabelSet, TimeRange};
use crate::error::ProtocolError;
use crate::prompb::Sample;

/// Handling of samples that share a timestamp within one series.
#[derive(Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// keep every sample, in the order storage returned them
    #[default]
    Keep,
    /// keep the first sample returned for the timestamp
    First,
    /// keep the last sample returned for the timestamp
    Last,
}

impl Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::Keep => write!(f, "keep"),
            DuplicatePolicy::First => write!(f, "first"),
            DuplicatePolicy::Last => write!(f, "last"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keep" => Ok(DuplicatePolicy::Keep),
            "first" => Ok(DuplicatePolicy::First),
            "last" => Ok(DuplicatePolicy::Last),
            _ => Err(ProtocolError::InvalidConfiguration(format!(
                "invalid duplicate policy: {s}"
            ))),
        }
    }
}

/// Drops samples outside `range`.
pub fn clamp_samples(samples: &mut Vec<Sample>, range: TimeRange) {
    samples.retain(|s| range.contains(s.timestamp));
}

/// Stable sort by timestamp; equal timestamps keep their relative order.
pub fn sort_samples(samples: &mut [Sample]) {
    if samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
        return;
    }
    samples.sort_by_key(|s| s.timestamp);
}

/// Applies `policy` to runs of equal timestamps. `samples` must be sorted.
pub fn dedup_samples(samples: &mut Vec<Sample>, policy: DuplicatePolicy) {
    match policy {
        DuplicatePolicy::Keep => {}
        DuplicatePolicy::First => samples.dedup_by(|cur, prev| cur.timestamp == prev.timestamp),
        DuplicatePolicy::Last => samples.dedup_by(|cur, prev| {
            if cur.timestamp == prev.timestamp {
                std::mem::swap(cur, prev);
                return true;
            }
            false
        }),
    }
}

pub fn normalize_samples(samples: &mut Vec<Sample>, range: TimeRange, policy: DuplicatePolicy) {
    clamp_samples(samples, range);
    for s in samples.iter_mut() {
        s.unknown_fields.clear();
    }
    sort_samples(samples);
    dedup_samples(samples, policy);
}

/// Merges entries with equal label sets and orders the result by label set.
///
/// Samples of merged entries are concatenated in input order before the stable sort,
/// so duplicates resolve the same way regardless of how storage split the data.
pub fn merge_series(
    mut series: Vec<(LabelSet, Vec<Sample>)>,
    policy: DuplicatePolicy,
) -> Vec<(LabelSet, Vec<Sample>)> {
    series.sort_by(|a, b| a.0.compare(&b.0));

    let mut result: Vec<(LabelSet, Vec<Sample>)> = Vec::with_capacity(series.len());
    let mut merged = false;
    for (labels, samples) in series {
        match result.last_mut() {
            Some((last_labels, last_samples)) if *last_labels == labels => {
                last_samples.extend(samples);
                merged = true;
            }
            _ => {
                if merged {
                    finish_merge(result.last_mut(), policy);
                    merged = false;
                }
                result.push((labels, samples));
            }
        }
    }
    if merged {
        finish_merge(result.last_mut(), policy);
    }
    result
}

fn finish_merge(entry: Option<&mut (LabelSet, Vec<Sample>)>, policy: DuplicatePolicy) {
    if let Some((_, samples)) = entry {
        sort_samples(samples);
        dedup_samples(samples, policy);
    }
}
