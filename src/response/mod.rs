//! Request level assembly: batches of queries into a `ReadResponse`, batches of series
//! into storage writes.
mod handler;

pub use handler::*;

use ahash::AHashMap;
use rayon::prelude::*;
use std::sync::Arc;
use crate::common::LabelSet;
use crate::config::Settings;
use crate::error::{ProtocolError, ProtocolResult};
use crate::matchers::MatcherEngine;
use crate::prompb::{ReadRequest, ReadResponse, ResponseType, TimeSeries, WriteRequest};
use crate::query::{sort_samples, QueryExecutor, QueryOutput};
use crate::storage::{Deadline, Storage};

/// Per-query results of a read, aligned with the request's queries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadOutcome {
    pub results: Vec<ProtocolResult<QueryOutput>>,
}

impl ReadOutcome {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.is_ok())
    }

    /// Indices and errors of the failed queries, in request order.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &ProtocolError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
    }

    /// Builds the wire response, failing with the first query error. The wire format
    /// has no per-query error slot.
    pub fn into_response(self) -> ProtocolResult<ReadResponse> {
        let results = self
            .results
            .into_iter()
            .map(|r| r.map(|output| output.result))
            .collect::<ProtocolResult<Vec<_>>>()?;
        Ok(ReadResponse::new(results))
    }

    /// Builds the wire response with an empty result in place of every failed query.
    pub fn into_lossy_response(self) -> ReadResponse {
        let results = self
            .results
            .into_iter()
            .map(|r| r.map(|output| output.result).unwrap_or_default())
            .collect();
        ReadResponse::new(results)
    }
}

/// Acknowledgement of a write: how many series were accepted, and which failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub accepted: usize,
    /// Failed series by index in the request, ascending.
    pub failures: Vec<(usize, ProtocolError)>,
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|(i, _)| *i).collect()
    }

    /// Fails with the first error, if any.
    pub fn into_result(self) -> ProtocolResult<usize> {
        match self.failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(self.accepted),
        }
    }
}

pub struct ResponseAssembler {
    storage: Arc<dyn Storage>,
    engine: MatcherEngine,
    settings: Settings,
}

impl ResponseAssembler {
    pub fn new(storage: Arc<dyn Storage>, settings: Settings) -> ProtocolResult<Self> {
        settings.validate()?;
        Ok(Self {
            engine: MatcherEngine::new(&settings),
            storage,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn engine(&self) -> &MatcherEngine {
        &self.engine
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor::new(self.storage.as_ref(), &self.engine, &self.settings)
    }

    /// Evaluates every query of `req`. A failing query never affects its siblings; the
    /// request itself fails only when no supported response type was offered.
    pub fn read(&self, req: &ReadRequest, deadline: &Deadline) -> ProtocolResult<ReadOutcome> {
        ResponseType::negotiate(&req.accepted_response_types)?;
        tracing::debug!(queries = req.queries.len(), "read request");

        let executor = self.executor();
        let run = |(index, query)| executor.execute(index, query, deadline);
        let results: Vec<ProtocolResult<QueryOutput>> = if self.settings.parallel_queries {
            req.queries.par_iter().enumerate().map(run).collect()
        } else {
            req.queries.iter().enumerate().map(run).collect()
        };
        Ok(ReadOutcome { results })
    }

    /// Forwards each series of `req` to storage. Failures are collected per series
    /// index and never abort the rest of the batch. Series sharing a label set reach
    /// storage in request order, also when ingest runs in parallel.
    pub fn write(&self, req: WriteRequest, deadline: &Deadline) -> WriteOutcome {
        tracing::debug!(series = req.timeseries.len(), "write request");

        let results: Vec<ProtocolResult<()>> = if self.settings.parallel_ingest {
            self.ingest_grouped(req.timeseries, deadline)
        } else {
            req.timeseries
                .into_iter()
                .enumerate()
                .map(|(index, series)| {
                    let (_, series) = prepare_series(index, series)?;
                    self.forward(index, series, deadline)
                })
                .collect()
        };

        let mut outcome = WriteOutcome::default();
        for (index, res) in results.into_iter().enumerate() {
            match res {
                Ok(()) => outcome.accepted += 1,
                Err(err) => outcome.failures.push((index, err)),
            }
        }
        if !outcome.failures.is_empty() {
            tracing::warn!(
                accepted = outcome.accepted,
                failed = outcome.failures.len(),
                "write request partially failed"
            );
        }
        outcome
    }

    /// Groups series by label set and runs the groups in parallel. Within a group the
    /// series are ingested one after another in request order.
    fn ingest_grouped(&self, timeseries: Vec<TimeSeries>, deadline: &Deadline) -> Vec<ProtocolResult<()>> {
        let prepared: Vec<ProtocolResult<(u64, TimeSeries)>> = timeseries
            .into_par_iter()
            .enumerate()
            .map(|(index, series)| prepare_series(index, series))
            .collect();

        let mut results: Vec<ProtocolResult<()>> = Vec::with_capacity(prepared.len());
        let mut group_of: AHashMap<u64, usize> = AHashMap::new();
        let mut groups: Vec<Vec<(usize, TimeSeries)>> = Vec::new();
        for (index, res) in prepared.into_iter().enumerate() {
            match res {
                Ok((fingerprint, series)) => {
                    let slot = *group_of.entry(fingerprint).or_insert_with(|| {
                        groups.push(Vec::new());
                        groups.len() - 1
                    });
                    groups[slot].push((index, series));
                    results.push(Ok(()));
                }
                Err(err) => results.push(Err(err)),
            }
        }

        let forwarded: Vec<(usize, ProtocolResult<()>)> = groups
            .into_par_iter()
            .flat_map_iter(|group| {
                group
                    .into_iter()
                    .map(|(index, series)| (index, self.forward(index, series, deadline)))
            })
            .collect();
        for (index, res) in forwarded {
            results[index] = res;
        }
        results
    }

    fn forward(&self, index: usize, series: TimeSeries, deadline: &Deadline) -> ProtocolResult<()> {
        self.storage.ingest(series, deadline).map_err(|err| {
            tracing::warn!(series = index, error = %err, "ingest failed");
            ProtocolError::ingest(index, err)
        })
    }
}

/// Validates a series for ingest and puts it in canonical form: labels sorted with
/// duplicates resolved last-wins, samples stable-sorted by timestamp. Returns the
/// fingerprint of the canonical label set alongside the series.
fn prepare_series(index: usize, series: TimeSeries) -> ProtocolResult<(u64, TimeSeries)> {
    if series.labels.is_empty() {
        return Err(ProtocolError::InvalidSeries(format!("series {index} has no labels")));
    }
    let labels = LabelSet::from(series.labels);
    if labels.find_empty_name().is_some() {
        return Err(ProtocolError::InvalidSeries(format!(
            "series {index} has a label with an empty name"
        )));
    }
    let fingerprint = labels.fingerprint();
    let mut samples = series.samples;
    sort_samples(&mut samples);
    let mut prepared = TimeSeries::from_label_set(labels, samples);
    prepared.unknown_fields = series.unknown_fields;
    Ok((fingerprint, prepared))
}
