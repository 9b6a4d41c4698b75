use ahash::RandomState;
use papaya::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use crate::common::LabelSet;
use crate::error::StorageResult;
use crate::prompb::{Sample, TimeSeries};
use crate::query::SERIES_FUNC;
use super::{Deadline, SelectRequest, Storage};

/// How many series are scanned between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 1024;

type SeriesSamples = Arc<Mutex<Vec<Sample>>>;

/// In-memory [`Storage`] keyed by label set.
///
/// Samples are appended as they arrive; ordering and duplicate handling are left to
/// the read path. Honours the `series` hint by returning label-only series.
pub struct MemoryStorage {
    series: HashMap<LabelSet, SeriesSamples, RandomState>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            series: HashMap::with_hasher(RandomState::new()),
        }
    }

    /// Number of distinct series.
    pub fn len(&self) -> usize {
        self.series.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_samples(&self) -> usize {
        let map = self.series.pin();
        map.iter().map(|(_, samples)| lock(samples).len()).sum()
    }

    /// Returns a copy of the samples stored for `labels`, in arrival order.
    pub fn get(&self, labels: &LabelSet) -> Option<Vec<Sample>> {
        let map = self.series.pin();
        map.get(labels).map(|samples| lock(samples).clone())
    }
}

// A panic while holding the lock leaves a valid Vec behind.
fn lock(samples: &Mutex<Vec<Sample>>) -> MutexGuard<'_, Vec<Sample>> {
    samples.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Storage for MemoryStorage {
    fn ingest(&self, series: TimeSeries, deadline: &Deadline) -> StorageResult<()> {
        deadline.check()?;
        let labels = LabelSet::from(series.labels);
        let map = self.series.pin();
        let entry = match map.get(&labels) {
            Some(entry) => entry.clone(),
            None => {
                let fresh: SeriesSamples = Arc::new(Mutex::new(Vec::new()));
                map.get_or_insert(labels, fresh).clone()
            }
        };
        lock(&entry).extend(series.samples.into_iter().map(|mut s| {
            s.unknown_fields.clear();
            s
        }));
        Ok(())
    }

    fn select(&self, req: &SelectRequest<'_>, deadline: &Deadline) -> StorageResult<Vec<TimeSeries>> {
        deadline.check()?;
        let labels_only = req.hint_func() == Some(SERIES_FUNC);
        let map = self.series.pin();
        let mut result = Vec::new();
        for (i, (labels, samples)) in map.iter().enumerate() {
            if i % DEADLINE_CHECK_INTERVAL == DEADLINE_CHECK_INTERVAL - 1 {
                deadline.check()?;
            }
            if !req.matchers.matches_all(labels) {
                continue;
            }
            let samples = if labels_only {
                Vec::new()
            } else {
                let samples = lock(samples);
                let selected: Vec<Sample> = samples
                    .iter()
                    .filter(|s| req.range.contains(s.timestamp))
                    .cloned()
                    .collect();
                if selected.is_empty() {
                    continue;
                }
                selected
            };
            result.push(TimeSeries::from_label_set(labels.clone(), samples));
        }
        Ok(result)
    }

    fn supports_hint(&self, func: &str) -> bool {
        func == SERIES_FUNC
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TimeRange;
    use crate::config::Settings;
    use crate::error::StorageError;
    use crate::matchers::MatcherEngine;
    use crate::prompb::{Label, LabelMatcher, ReadHints};

    fn series(job: &str, samples: &[(i64, f64)]) -> TimeSeries {
        TimeSeries::new(
            vec![Label::new("job", job), Label::new("__name__", "up")],
            samples.iter().map(|(t, v)| Sample::new(*t, *v)).collect(),
        )
    }

    #[test]
    fn ingest_appends_to_existing_series() {
        let storage = MemoryStorage::new();
        let deadline = Deadline::none();
        storage.ingest(series("api", &[(1, 1.0)]), &deadline).unwrap();
        storage.ingest(series("api", &[(2, 2.0)]), &deadline).unwrap();
        storage.ingest(series("web", &[(1, 1.0)]), &deadline).unwrap();
        assert_eq!(storage.len(), 2);
        assert_eq!(storage.num_samples(), 3);
        let labels = LabelSet::from_pairs(&[("__name__", "up"), ("job", "api")]);
        assert_eq!(storage.get(&labels).unwrap().len(), 2);
    }

    #[test]
    fn select_filters_by_matchers_and_range() {
        let storage = MemoryStorage::new();
        let deadline = Deadline::none();
        storage.ingest(series("api", &[(50, 1.0), (150, 2.0)]), &deadline).unwrap();
        storage.ingest(series("web", &[(150, 3.0)]), &deadline).unwrap();
        storage.ingest(series("db", &[(500, 3.0)]), &deadline).unwrap();

        let engine = MatcherEngine::new(&Settings::default());
        let matchers = engine.compile_all(&[LabelMatcher::re("job", "api|db")]).unwrap();
        let req = SelectRequest::new(TimeRange::new(100, 200), &matchers);
        let result = storage.select(&req, &deadline).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].samples, vec![Sample::new(150, 2.0)]);
    }

    #[test]
    fn series_hint_returns_labels_only() {
        let storage = MemoryStorage::new();
        let deadline = Deadline::none();
        storage.ingest(series("api", &[(5, 1.0)]), &deadline).unwrap();

        let matchers = MatcherEngine::new(&Settings::default())
            .compile_all(&[])
            .unwrap();
        let hints = ReadHints {
            func: SERIES_FUNC.to_string(),
            ..Default::default()
        };
        let req = SelectRequest::new(TimeRange::new(100, 200), &matchers).with_hints(&hints);
        let result = storage.select(&req, &deadline).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].samples.is_empty());
        assert!(storage.supports_hint(SERIES_FUNC));
        assert!(!storage.supports_hint("rate"));
    }

    #[test]
    fn cancelled_deadline_stops_work() {
        let storage = MemoryStorage::new();
        let deadline = Deadline::none();
        deadline.cancel();
        assert_eq!(
            storage.ingest(series("api", &[(1, 1.0)]), &deadline),
            Err(StorageError::Cancelled)
        );
        assert!(storage.is_empty());
    }
}
