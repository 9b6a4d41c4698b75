//! The storage collaborator seam.
//!
//! The protocol core never persists or indexes anything itself. Writes are forwarded
//! series by series through [`Storage::ingest`]; reads call [`Storage::select`] with
//! compiled matchers and, when delegated, the read hints.
mod deadline;
mod memory;

pub use deadline::*;
pub use memory::*;

use crate::common::TimeRange;
use crate::error::StorageResult;
use crate::matchers::MatcherSet;
use crate::prompb::{ReadHints, TimeSeries};

/// Read path arguments handed to the collaborator.
#[derive(Clone, Copy, Debug)]
pub struct SelectRequest<'a> {
    pub range: TimeRange,
    pub matchers: &'a MatcherSet,
    /// Present only when the hint function is supported and delegated; the
    /// collaborator may then aggregate instead of returning raw samples.
    pub hints: Option<&'a ReadHints>,
}

impl<'a> SelectRequest<'a> {
    pub fn new(range: TimeRange, matchers: &'a MatcherSet) -> Self {
        Self {
            range,
            matchers,
            hints: None,
        }
    }

    pub fn with_hints(mut self, hints: &'a ReadHints) -> Self {
        self.hints = Some(hints);
        self
    }

    pub fn hint_func(&self) -> Option<&str> {
        self.hints.map(|h| h.func.as_str())
    }
}

/// Storage backend consumed by the protocol core.
///
/// Implementations must be safe to call from several threads at once; writes of
/// distinct label sets may arrive concurrently.
pub trait Storage: Send + Sync {
    /// Persists one series. Labels arrive canonicalised and samples sorted by timestamp.
    fn ingest(&self, series: TimeSeries, deadline: &Deadline) -> StorageResult<()>;

    /// Returns series matching `req.matchers` with samples in `req.range`. Returned
    /// data is re-checked and normalised by the caller, so it may be unsorted or
    /// include samples outside the range.
    fn select(&self, req: &SelectRequest<'_>, deadline: &Deadline) -> StorageResult<Vec<TimeSeries>>;

    /// Whether the collaborator can honour the given hint function.
    fn supports_hint(&self, _func: &str) -> bool {
        false
    }
}
