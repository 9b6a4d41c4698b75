//! Protocol core for Prometheus remote write and remote read.
//!
//! Wire bytes are decoded by [`codec`] into [`prompb`] messages. Reads flow through
//! the [`matchers`] and the [`query`] executor to a [`storage::Storage`] collaborator,
//! writes are forwarded to it series by series, and [`response`] assembles the
//! results. [`response::RemoteHandler`] wires the whole path from request bytes to
//! response bytes.
pub mod codec;
pub mod common;
pub mod config;
pub mod error;
pub mod matchers;
pub mod prompb;
pub mod query;
pub mod response;
pub mod storage;

#[cfg(test)]
mod tests;

pub use codec::WireMessage;
pub use common::{LabelSet, Timestamp, METRIC_NAME_LABEL};
pub use config::Settings;
pub use error::{DecodeError, ProtocolError, ProtocolResult, StorageError, StorageResult};
pub use matchers::{MatcherEngine, MatcherSet};
pub use query::{DuplicatePolicy, QueryExecutor, QueryOutput, QueryState};
pub use response::{ReadOutcome, RemoteHandler, ResponseAssembler, WriteOutcome};
pub use storage::{Deadline, MemoryStorage, SelectRequest, Storage};
