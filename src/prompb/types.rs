use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use crate::common::{LabelSet, Timestamp};
use crate::error::{ProtocolError, ProtocolResult};
use super::UnknownFields;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    pub name: String,
    pub value: String,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unknown_fields: UnknownFields::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub labels: Vec<Label>,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// A single data point. Staleness markers are NaN values.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sample {
    pub value: f64,
    pub timestamp: Timestamp,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl Sample {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self {
            value,
            timestamp,
            unknown_fields: UnknownFields::default(),
        }
    }
}

// Values compare by bit pattern so NaN payloads survive equality checks.
impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.value.to_bits() == other.value.to_bits()
            && self.unknown_fields == other.unknown_fields
    }
}

impl Eq for Sample {}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeries {
    pub labels: Vec<Label>,
    pub samples: Vec<Sample>,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl TimeSeries {
    pub fn new(labels: Vec<Label>, samples: Vec<Sample>) -> Self {
        Self {
            labels,
            samples,
            unknown_fields: UnknownFields::default(),
        }
    }

    pub fn from_label_set(labels: LabelSet, samples: Vec<Sample>) -> Self {
        Self::new(labels.into_labels(), samples)
    }

    pub fn label_set(&self) -> LabelSet {
        LabelSet::from_slice(&self.labels)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MatcherType {
    #[default]
    Eq = 0,
    Neq = 1,
    Re = 2,
    Nre = 3,
}

impl MatcherType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(MatcherType::Eq),
            1 => Some(MatcherType::Neq),
            2 => Some(MatcherType::Re),
            3 => Some(MatcherType::Nre),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherType::Eq => "=",
            MatcherType::Neq => "!=",
            MatcherType::Re => "=~",
            MatcherType::Nre => "!~",
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, MatcherType::Re | MatcherType::Nre)
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, MatcherType::Neq | MatcherType::Nre)
    }
}

impl Display for MatcherType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i32> for MatcherType {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        MatcherType::from_i32(value)
            .ok_or_else(|| ProtocolError::InvalidMatcher(format!("unknown matcher type {value}")))
    }
}

/// Matcher as carried on the wire. `type` is kept as the raw enum value so unknown
/// types survive decoding and are rejected at validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelMatcher {
    pub r#type: i32,
    pub name: String,
    pub value: String,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl LabelMatcher {
    pub fn new(matcher_type: MatcherType, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            r#type: matcher_type as i32,
            name: name.into(),
            value: value.into(),
            unknown_fields: UnknownFields::default(),
        }
    }

    pub fn eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(MatcherType::Eq, name, value)
    }

    pub fn neq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(MatcherType::Neq, name, value)
    }

    pub fn re(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(MatcherType::Re, name, value)
    }

    pub fn nre(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(MatcherType::Nre, name, value)
    }

    pub fn matcher_type(&self) -> ProtocolResult<MatcherType> {
        MatcherType::try_from(self.r#type)
    }
}

impl Display for LabelMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match MatcherType::from_i32(self.r#type) {
            Some(op) => write!(f, "{}{}{:?}", self.name, op, self.value),
            None => write!(f, "{}<{}>{:?}", self.name, self.r#type, self.value),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadHints {
    /// Query step size in milliseconds.
    pub step_ms: i64,
    /// String representation of the surrounding function or aggregation.
    pub func: String,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Labels used in the surrounding aggregation.
    pub grouping: Vec<String>,
    /// `true` for `by`, `false` for `without`.
    pub by: bool,
    /// Range vector selector range in milliseconds.
    pub range_ms: i64,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub start_timestamp_ms: i64,
    pub end_timestamp_ms: i64,
    pub matchers: Vec<LabelMatcher>,
    pub hints: Option<ReadHints>,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl Query {
    pub fn new(start: Timestamp, end: Timestamp, matchers: Vec<LabelMatcher>) -> Self {
        Self {
            start_timestamp_ms: start,
            end_timestamp_ms: end,
            matchers,
            hints: None,
            unknown_fields: UnknownFields::default(),
        }
    }

    pub fn with_hints(mut self, hints: ReadHints) -> Self {
        self.hints = Some(hints);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryResult {
    pub timeseries: Vec<TimeSeries>,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl QueryResult {
    pub fn new(timeseries: Vec<TimeSeries>) -> Self {
        Self {
            timeseries,
            unknown_fields: UnknownFields::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteRequest {
    pub timeseries: Vec<TimeSeries>,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl WriteRequest {
    pub fn new(timeseries: Vec<TimeSeries>) -> Self {
        Self {
            timeseries,
            unknown_fields: UnknownFields::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResponseType {
    /// Plain samples in `ReadResponse`.
    #[default]
    Samples = 0,
    /// Chunked XOR streaming. Never produced by this crate.
    StreamedXorChunks = 1,
}

impl ResponseType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ResponseType::Samples),
            1 => Some(ResponseType::StreamedXorChunks),
            _ => None,
        }
    }

    /// Picks the response type for a request. Only `Samples` can be produced; an empty
    /// list means the client predates negotiation and accepts samples.
    pub fn negotiate(accepted: &[i32]) -> ProtocolResult<ResponseType> {
        if accepted.is_empty() || accepted.contains(&(ResponseType::Samples as i32)) {
            return Ok(ResponseType::Samples);
        }
        Err(ProtocolError::InvalidQuery(format!(
            "none of the accepted response types {accepted:?} is supported"
        )))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadRequest {
    pub queries: Vec<Query>,
    pub accepted_response_types: Vec<i32>,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl ReadRequest {
    pub fn new(queries: Vec<Query>) -> Self {
        Self {
            queries,
            accepted_response_types: Vec::new(),
            unknown_fields: UnknownFields::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadResponse {
    pub results: Vec<QueryResult>,
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl ReadResponse {
    pub fn new(results: Vec<QueryResult>) -> Self {
        Self {
            results,
            unknown_fields: UnknownFields::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_equality_is_bitwise() {
        let a = Sample::new(1, f64::NAN);
        let b = Sample::new(1, f64::NAN);
        assert_eq!(a, b);
        assert_ne!(Sample::new(1, 0.0), Sample::new(1, -0.0));
    }

    #[test]
    fn unknown_matcher_type_is_rejected() {
        let m = LabelMatcher {
            r#type: 7,
            name: "job".to_string(),
            ..Default::default()
        };
        assert!(matches!(m.matcher_type(), Err(ProtocolError::InvalidMatcher(_))));
        assert_eq!(m.to_string(), r#"job<7>"""#);
    }

    #[test]
    fn matcher_display() {
        assert_eq!(LabelMatcher::re("job", "api.*").to_string(), r#"job=~"api.*""#);
        assert_eq!(LabelMatcher::neq("env", "").to_string(), r#"env!="""#);
    }

    #[test]
    fn negotiate_response_type() {
        assert_eq!(ResponseType::negotiate(&[]).unwrap(), ResponseType::Samples);
        assert_eq!(ResponseType::negotiate(&[1, 0]).unwrap(), ResponseType::Samples);
        assert!(ResponseType::negotiate(&[1]).is_err());
    }

    #[test]
    fn query_from_json() {
        let query: Query = serde_json::from_str(
            r#"{
                "start_timestamp_ms": 100,
                "end_timestamp_ms": 200,
                "matchers": [{"type": 2, "name": "__name__", "value": "http_.*"}],
                "hints": {"func": "rate", "step_ms": 15000}
            }"#,
        )
        .unwrap();
        assert_eq!(query.matchers[0].matcher_type().unwrap(), MatcherType::Re);
        let hints = query.hints.unwrap();
        assert_eq!(hints.func, "rate");
        assert_eq!(hints.step_ms, 15000);
        assert!(!hints.by);
    }
}
