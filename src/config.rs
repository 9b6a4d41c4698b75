use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::{ProtocolError, ProtocolResult};
use crate::query::DuplicatePolicy;

pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 32 * 1024 * 1024;
pub const DEFAULT_REGEX_CACHE_MAX_ENTRIES: usize = 4096;
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Largest encoded message accepted by the decoder, in bytes.
    pub max_message_size: usize,

    /// Number of distinct regex patterns kept compiled. Once reached, new patterns are
    /// compiled per use and not cached. Cached entries are never evicted.
    pub regex_cache_max_entries: usize,

    /// Upper bound on the size of a compiled regex program, in bytes.
    pub regex_size_limit: usize,

    /// How samples sharing a timestamp within one returned series are handled.
    pub duplicate_policy: DuplicatePolicy,

    /// Evaluate the queries of a single ReadRequest in parallel.
    pub parallel_queries: bool,

    /// Ingest the series of a single WriteRequest in parallel. Requires a storage
    /// collaborator that is safe for concurrent writes to distinct label sets.
    pub parallel_ingest: bool,

    /// Re-check series returned by storage against the query matchers and drop the
    /// ones that do not match.
    pub verify_storage_results: bool,

    /// Deadline applied to each request handled through `RemoteHandler` when the
    /// caller does not provide one.
    pub query_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            regex_cache_max_entries: DEFAULT_REGEX_CACHE_MAX_ENTRIES,
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
            duplicate_policy: DuplicatePolicy::default(),
            parallel_queries: true,
            parallel_ingest: true,
            verify_storage_results: true,
            query_timeout: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.max_message_size == 0 {
            return Err(ProtocolError::InvalidConfiguration(
                "max_message_size must be greater than 0".to_string(),
            ));
        }
        if self.regex_size_limit == 0 {
            return Err(ProtocolError::InvalidConfiguration(
                "regex_size_limit must be greater than 0".to_string(),
            ));
        }
        if let Some(timeout) = self.query_timeout {
            if timeout.is_zero() {
                return Err(ProtocolError::InvalidConfiguration(
                    "query_timeout must be non-zero when set".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel_queries = false;
        self.parallel_ingest = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"duplicate_policy": "last", "parallel_ingest": false}"#).unwrap();
        assert_eq!(settings.duplicate_policy, DuplicatePolicy::Last);
        assert!(!settings.parallel_ingest);
        assert!(settings.parallel_queries);
        assert_eq!(settings.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn rejects_zero_message_size() {
        let settings = Settings {
            max_message_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ProtocolError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        let settings = Settings::default().with_query_timeout(Duration::ZERO);
        assert!(settings.validate().is_err());
    }
}
