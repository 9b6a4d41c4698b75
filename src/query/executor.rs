use std::fmt::Display;
use crate::common::{LabelSet, TimeRange};
use crate::config::Settings;
use crate::error::{ProtocolError, ProtocolResult};
use crate::matchers::{MatcherEngine, MatcherSet};
use crate::prompb::{Query, QueryResult, ReadHints, TimeSeries};
use crate::storage::{Deadline, SelectRequest, Storage};
use super::hints::{resolve_hints, SERIES_FUNC};
use super::normalize::{merge_series, normalize_samples};

/// Lifecycle of a single query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryState {
    Received,
    Validated,
    Executing,
    Completed,
    Failed,
}

impl QueryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryState::Completed | QueryState::Failed)
    }

    pub fn can_transition_to(&self, next: QueryState) -> bool {
        use QueryState::*;
        matches!(
            (self, next),
            (Received, Validated)
                | (Received, Failed)
                | (Validated, Executing)
                | (Validated, Failed)
                | (Executing, Completed)
                | (Executing, Failed)
        )
    }
}

impl Display for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueryState::Received => "received",
            QueryState::Validated => "validated",
            QueryState::Executing => "executing",
            QueryState::Completed => "completed",
            QueryState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

struct StateTracker {
    index: usize,
    state: QueryState,
}

impl StateTracker {
    fn new(index: usize) -> Self {
        tracing::trace!(query = index, state = %QueryState::Received, "query state");
        Self {
            index,
            state: QueryState::Received,
        }
    }

    fn advance(&mut self, next: QueryState) {
        debug_assert!(self.state.can_transition_to(next), "{} -> {}", self.state, next);
        tracing::trace!(query = self.index, from = %self.state, to = %next, "query state");
        self.state = next;
    }

    fn fail<T>(&mut self, err: ProtocolError) -> ProtocolResult<T> {
        self.advance(QueryState::Failed);
        Err(err)
    }
}

/// A query that passed validation, with matchers compiled and hints resolved.
#[derive(Clone, Debug)]
pub struct ValidatedQuery<'a> {
    pub index: usize,
    pub range: TimeRange,
    pub matchers: MatcherSet,
    /// Hints to delegate to storage.
    pub hints: Option<&'a ReadHints>,
}

impl ValidatedQuery<'_> {
    pub fn is_series_only(&self) -> bool {
        self.hints.is_some_and(|h| h.func == SERIES_FUNC)
    }

    /// An aggregation computed by storage may drop or rewrite labels, so its output
    /// is not re-checked against the matchers.
    fn is_aggregated(&self) -> bool {
        self.hints.is_some() && !self.is_series_only()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryOutput {
    pub result: QueryResult,
    /// Set when storage honoured the read hints.
    pub hints_applied: bool,
}

/// Runs single queries against a storage collaborator.
pub struct QueryExecutor<'a> {
    storage: &'a dyn Storage,
    engine: &'a MatcherEngine,
    settings: &'a Settings,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(storage: &'a dyn Storage, engine: &'a MatcherEngine, settings: &'a Settings) -> Self {
        Self {
            storage,
            engine,
            settings,
        }
    }

    /// Checks time bounds and compiles matchers. `index` is the position of the query
    /// in its request and is only used for diagnostics.
    pub fn validate<'q>(&self, index: usize, query: &'q Query) -> ProtocolResult<ValidatedQuery<'q>> {
        let range = TimeRange::new(query.start_timestamp_ms, query.end_timestamp_ms);
        if !range.is_valid() {
            return Err(ProtocolError::InvalidQuery(format!(
                "start {} is after end {}",
                range.start, range.end
            )));
        }
        let matchers = self.engine.compile_all(&query.matchers)?;
        let hints = resolve_hints(index, query.hints.as_ref(), self.storage);
        Ok(ValidatedQuery {
            index,
            range,
            matchers,
            hints,
        })
    }

    pub fn execute(&self, index: usize, query: &Query, deadline: &Deadline) -> ProtocolResult<QueryOutput> {
        let mut tracker = StateTracker::new(index);

        let validated = match self.validate(index, query) {
            Ok(v) => v,
            Err(err) => return tracker.fail(err),
        };
        tracker.advance(QueryState::Validated);

        tracker.advance(QueryState::Executing);
        match self.run(&validated, deadline) {
            Ok(output) => {
                tracker.advance(QueryState::Completed);
                Ok(output)
            }
            Err(err) => {
                tracing::warn!(query = index, error = %err, "query failed");
                tracker.fail(err)
            }
        }
    }

    fn run(&self, query: &ValidatedQuery<'_>, deadline: &Deadline) -> ProtocolResult<QueryOutput> {
        let index = query.index;
        deadline.check().map_err(|e| ProtocolError::query(index, e))?;

        let mut req = SelectRequest::new(query.range, &query.matchers);
        if let Some(hints) = query.hints {
            req = req.with_hints(hints);
        }
        let raw = self
            .storage
            .select(&req, deadline)
            .map_err(|e| ProtocolError::query(index, e))?;
        deadline.check().map_err(|e| ProtocolError::query(index, e))?;

        let timeseries = self.normalize(query, raw);
        Ok(QueryOutput {
            result: QueryResult::new(timeseries),
            hints_applied: query.hints.is_some(),
        })
    }

    fn normalize(&self, query: &ValidatedQuery<'_>, raw: Vec<TimeSeries>) -> Vec<TimeSeries> {
        let verify = self.settings.verify_storage_results && !query.is_aggregated();
        let policy = self.settings.duplicate_policy;

        let mut rejected = 0usize;
        let mut series = Vec::with_capacity(raw.len());
        for ts in raw {
            let labels = LabelSet::from(ts.labels);
            if verify && !query.matchers.matches_all(&labels) {
                rejected += 1;
                continue;
            }
            let mut samples = ts.samples;
            normalize_samples(&mut samples, query.range, policy);
            series.push((labels, samples));
        }
        if rejected > 0 {
            tracing::warn!(query = query.index, rejected, "storage returned series not matching the query");
        }

        let keep_empty = query.is_series_only();
        merge_series(series, policy)
            .into_iter()
            .filter(|(_, samples)| keep_empty || !samples.is_empty())
            .map(|(labels, samples)| TimeSeries::from_label_set(labels, samples))
            .collect()
    }
}
