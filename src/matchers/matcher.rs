use std::fmt::{Display, Formatter};
use std::sync::Arc;
use crate::common::{LabelSet, METRIC_NAME_LABEL};
use crate::config::Settings;
use crate::error::{ProtocolError, ProtocolResult};
use crate::prompb::{Label, LabelMatcher, MatcherType};
use super::match_handlers::StringMatchHandler;
use super::regex_cache::RegexCache;

/// Compiles and evaluates label matchers. Owns the regex cache shared by every query
/// evaluated through it.
pub struct MatcherEngine {
    cache: RegexCache,
}

impl MatcherEngine {
    pub fn new(settings: &Settings) -> Self {
        Self {
            cache: RegexCache::new(settings.regex_cache_max_entries, settings.regex_size_limit),
        }
    }

    pub fn cache(&self) -> &RegexCache {
        &self.cache
    }

    pub fn compile(&self, matcher: &LabelMatcher) -> ProtocolResult<CompiledMatcher> {
        let matcher_type = matcher.matcher_type()?;
        let handler = if matcher_type.is_regex() {
            let handler = self.cache.get_or_compile(&matcher.value).map_err(|err| {
                ProtocolError::InvalidMatcher(format!("{matcher}: {err}"))
            })?;
            Some(handler)
        } else {
            None
        };
        Ok(CompiledMatcher {
            name: matcher.name.clone(),
            value: matcher.value.clone(),
            matcher_type,
            handler,
        })
    }

    /// Compiles every matcher; the first invalid one fails the whole set.
    pub fn compile_all(&self, matchers: &[LabelMatcher]) -> ProtocolResult<MatcherSet> {
        let compiled = matchers
            .iter()
            .map(|m| self.compile(m))
            .collect::<ProtocolResult<Vec<_>>>()?;
        Ok(MatcherSet(compiled))
    }

    /// Evaluates a single matcher against a label value; `None` is an absent label.
    pub fn matches(&self, matcher: &LabelMatcher, value: Option<&str>) -> ProtocolResult<bool> {
        Ok(self.compile(matcher)?.matches(value))
    }

    pub fn matches_all(&self, matchers: &[LabelMatcher], labels: &LabelSet) -> ProtocolResult<bool> {
        Ok(self.compile_all(matchers)?.matches_all(labels))
    }
}

#[derive(Clone, Debug)]
pub struct CompiledMatcher {
    name: String,
    value: String,
    matcher_type: MatcherType,
    handler: Option<Arc<StringMatchHandler>>,
}

impl CompiledMatcher {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn matcher_type(&self) -> MatcherType {
        self.matcher_type
    }

    /// Absent labels are matched as the empty string.
    pub fn matches(&self, value: Option<&str>) -> bool {
        let value = value.unwrap_or("");
        match (self.matcher_type, &self.handler) {
            (MatcherType::Eq, _) => value == self.value,
            (MatcherType::Neq, _) => value != self.value,
            (MatcherType::Re, Some(handler)) => handler.matches(value),
            (MatcherType::Nre, Some(handler)) => !handler.matches(value),
            // regex matchers are only built with a handler
            (MatcherType::Re, None) => false,
            (MatcherType::Nre, None) => true,
        }
    }

    pub fn matches_labels(&self, labels: &LabelSet) -> bool {
        self.matches(labels.get(&self.name))
    }

    /// Whether a series lacking the label passes this matcher.
    pub fn matches_empty(&self) -> bool {
        self.matches(None)
    }

    pub fn to_label_matcher(&self) -> LabelMatcher {
        LabelMatcher::new(self.matcher_type, self.name.clone(), self.value.clone())
    }
}

impl Display for CompiledMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{:?}", self.name, self.matcher_type, self.value)
    }
}

/// Conjunction of compiled matchers. An empty set matches every label set.
#[derive(Clone, Debug, Default)]
pub struct MatcherSet(Vec<CompiledMatcher>);

impl MatcherSet {
    pub fn new(matchers: Vec<CompiledMatcher>) -> Self {
        Self(matchers)
    }

    pub fn matches_all(&self, labels: &LabelSet) -> bool {
        self.0.iter().all(|m| m.matches_labels(labels))
    }

    /// Evaluates raw wire labels, resolving duplicate names last-wins.
    pub fn matches_raw(&self, labels: &[Label]) -> bool {
        self.matches_all(&LabelSet::from_slice(labels))
    }

    /// Returns the metric name when the set pins it with an equality matcher.
    pub fn metric_name(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|m| m.matcher_type == MatcherType::Eq && m.name == METRIC_NAME_LABEL)
            .map(|m| m.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledMatcher> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for MatcherSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, m) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{m}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn engine() -> MatcherEngine {
        MatcherEngine::new(&Settings::default())
    }

    #[test_case(LabelMatcher::eq("job", "api"), Some("api"), true; "eq present")]
    #[test_case(LabelMatcher::eq("job", "api"), Some("web"), false; "eq other")]
    #[test_case(LabelMatcher::eq("job", ""), None, true; "eq empty absent")]
    #[test_case(LabelMatcher::eq("job", "api"), None, false; "eq absent")]
    #[test_case(LabelMatcher::neq("job", ""), None, false; "neq empty absent")]
    #[test_case(LabelMatcher::neq("job", "api"), None, true; "neq absent")]
    #[test_case(LabelMatcher::re("job", "foo"), Some("foo"), true; "re literal")]
    #[test_case(LabelMatcher::re("job", "foo"), Some("foobar"), false; "re is anchored at end")]
    #[test_case(LabelMatcher::re("job", "bar"), Some("foobar"), false; "re is anchored at start")]
    #[test_case(LabelMatcher::re("job", "fo+"), Some("xfoo"), false; "re engine anchored")]
    #[test_case(LabelMatcher::re("job", ".*"), None, true; "re dot star absent")]
    #[test_case(LabelMatcher::re("job", ".+"), None, false; "re dot plus absent")]
    #[test_case(LabelMatcher::re("job", "a.c"), Some("a\nc"), true; "re dot matches newline")]
    #[test_case(LabelMatcher::nre("job", "api|web"), Some("db"), true; "nre other")]
    #[test_case(LabelMatcher::nre("job", "api|web"), Some("web"), false; "nre alternate")]
    #[test_case(LabelMatcher::nre("job", ""), None, false; "nre empty absent")]
    fn single_matcher(matcher: LabelMatcher, value: Option<&str>, expected: bool) {
        assert_eq!(engine().matches(&matcher, value).unwrap(), expected);
    }

    #[test]
    fn complements() {
        let engine = engine();
        let values = ["", "api", "api-1", "web", "API", "a\nb"];
        let patterns = ["api", "api.*", ".+", "a.b", "(?i)api", "web|api", "[a-z]+"];
        for v in values {
            for p in patterns {
                let eq = engine.matches(&LabelMatcher::eq("n", p), Some(v)).unwrap();
                let neq = engine.matches(&LabelMatcher::neq("n", p), Some(v)).unwrap();
                assert_ne!(eq, neq, "eq/neq {p:?} on {v:?}");
                let re = engine.matches(&LabelMatcher::re("n", p), Some(v)).unwrap();
                let nre = engine.matches(&LabelMatcher::nre("n", p), Some(v)).unwrap();
                assert_ne!(re, nre, "re/nre {p:?} on {v:?}");
            }
        }
    }

    #[test]
    fn empty_matcher_list_matches_everything() {
        let engine = engine();
        assert!(engine.matches_all(&[], &LabelSet::default()).unwrap());
        assert!(engine
            .matches_all(&[], &LabelSet::from_pairs(&[("__name__", "up")]))
            .unwrap());
    }

    #[test]
    fn conjunction() {
        let engine = engine();
        let labels = LabelSet::from_pairs(&[("__name__", "http_requests_total"), ("job", "api")]);
        let matchers = vec![
            LabelMatcher::eq("__name__", "http_requests_total"),
            LabelMatcher::re("job", "api|web"),
            LabelMatcher::eq("env", ""),
        ];
        assert!(engine.matches_all(&matchers, &labels).unwrap());
        let set = engine.compile_all(&matchers).unwrap();
        assert_eq!(set.metric_name(), Some("http_requests_total"));

        let matchers = vec![LabelMatcher::re("job", "api|web"), LabelMatcher::neq("job", "api")];
        assert!(!engine.matches_all(&matchers, &labels).unwrap());
    }

    #[test]
    fn duplicate_raw_labels_resolve_last_wins() {
        let set = engine().compile_all(&[LabelMatcher::eq("job", "b")]).unwrap();
        assert!(set.matches_raw(&[Label::new("job", "a"), Label::new("job", "b")]));
        assert!(!set.matches_raw(&[Label::new("job", "b"), Label::new("job", "a")]));
    }

    #[test_case("a("; "unclosed group")]
    #[test_case("a)|(b"; "group escape")]
    #[test_case("[z-a]"; "bad range")]
    #[test_case("x{2,1}"; "bad repetition")]
    fn invalid_regex(pattern: &str) {
        let err = engine().compile(&LabelMatcher::re("job", pattern)).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMatcher(_)), "{err:?}");
    }

    #[test]
    fn invalid_value_is_fine_for_equality() {
        assert!(engine().compile(&LabelMatcher::eq("job", "a(")).is_ok());
    }

    #[test]
    fn unknown_type() {
        let matcher = LabelMatcher {
            r#type: 9,
            name: "job".to_string(),
            value: "api".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            engine().compile(&matcher),
            Err(ProtocolError::InvalidMatcher(_))
        ));
    }

    #[test]
    fn compiled_patterns_are_cached() {
        let engine = engine();
        for _ in 0..3 {
            engine.compile(&LabelMatcher::re("job", "api.+")).unwrap();
            engine.compile(&LabelMatcher::nre("env", "api.+")).unwrap();
        }
        assert_eq!(engine.cache().len(), 1);
        assert_eq!(engine.cache().misses(), 1);
        assert_eq!(engine.cache().requests(), 6);
    }

    #[test]
    fn display() {
        let set = engine()
            .compile_all(&[LabelMatcher::eq("__name__", "up"), LabelMatcher::nre("job", "a.*")])
            .unwrap();
        assert_eq!(set.to_string(), r#"{__name__="up", job!~"a.*"}"#);
    }
}
