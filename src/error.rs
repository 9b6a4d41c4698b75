use thiserror::Error;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
/// Errors raised while decoding untrusted wire bytes. None of them is fatal outside the
/// message being decoded.
pub enum DecodeError {
  #[error("Malformed input: {0}")]
  Malformed(#[from] prost::DecodeError),

  #[error("Malformed input: message of {size} bytes exceeds limit of {limit} bytes.")]
  MessageTooLarge { size: usize, limit: usize },
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
/// Failures reported by the storage collaborator. The cause is opaque to the core and
/// is surfaced verbatim to the caller.
pub enum StorageError {
  #[error("Storage unavailable. {0}")]
  Unavailable(String),

  #[error("Storage rejected request. {0}")]
  Rejected(String),

  #[error("Operation cancelled")]
  Cancelled,

  #[error("Deadline exceeded")]
  DeadlineExceeded,

  #[error("{0}")]
  Other(String),
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
/// Error taxonomy of the protocol core.
pub enum ProtocolError {
  #[error(transparent)]
  Decode(#[from] DecodeError),

  #[error("Invalid matcher. {0}")]
  InvalidMatcher(String),

  #[error("Invalid query. {0}")]
  InvalidQuery(String),

  #[error("Invalid series. {0}")]
  InvalidSeries(String),

  #[error("Invalid configuration. {0}")]
  InvalidConfiguration(String),

  #[error("Ingest failed for series {index}: {source}")]
  Ingest { index: usize, source: StorageError },

  #[error("Query {index} failed: {source}")]
  Query { index: usize, source: StorageError },
}

impl ProtocolError {
  /// Attaches a request index to a collaborator error raised on the read path.
  pub fn query(index: usize, source: StorageError) -> Self {
    ProtocolError::Query { index, source }
  }

  /// Attaches a series index to a collaborator error raised on the write path.
  pub fn ingest(index: usize, source: StorageError) -> Self {
    ProtocolError::Ingest { index, source }
  }

  pub fn is_cancellation(&self) -> bool {
    matches!(
      self,
      ProtocolError::Query {
        source: StorageError::Cancelled | StorageError::DeadlineExceeded,
        ..
      } | ProtocolError::Ingest {
        source: StorageError::Cancelled | StorageError::DeadlineExceeded,
        ..
      }
    )
  }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
pub type DecodeResult<T> = Result<T, DecodeError>;
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn malformed_input_keeps_field_context() {
    let mut inner = prost::DecodeError::new("invalid varint");
    inner.push("Sample", "timestamp");
    let err = ProtocolError::from(DecodeError::from(inner));
    assert!(matches!(err, ProtocolError::Decode(DecodeError::Malformed(_))));
    assert!(err.to_string().starts_with("Malformed input: "));
    assert!(err.to_string().contains("Sample.timestamp"));
  }

  #[test]
  fn cancellation_covers_both_paths() {
    assert!(ProtocolError::ingest(3, StorageError::DeadlineExceeded).is_cancellation());
    assert!(ProtocolError::query(0, StorageError::Cancelled).is_cancellation());
    assert!(!ProtocolError::query(0, StorageError::Other("boom".into())).is_cancellation());
  }
}
