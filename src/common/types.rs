/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Well-known label holding the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Inclusive time range in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts <= self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}
