use regex::Regex;

pub type MatchFn = fn(pattern: &str, candidate: &str) -> bool;

/// Full-string matcher for a regex pattern. Common pattern shapes are answered with
/// plain string operations; the rest go through an anchored `Regex`.
#[derive(Clone, Debug)]
pub enum StringMatchHandler {
    DotStar,
    DotPlus,
    Literal(String),
    Alternates(Vec<String>),
    MatchFn(MatchFnHandler),
    Regex(Regex),
}

impl StringMatchHandler {
    pub fn match_fn(pattern: String, match_fn: MatchFn) -> Self {
        Self::MatchFn(MatchFnHandler::new(pattern, match_fn))
    }

    pub fn alternates(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            return Self::Literal(values.remove(0));
        }
        values.sort();
        values.dedup();
        Self::Alternates(values)
    }

    pub fn prefix(prefix: String, is_dot_star: bool) -> Self {
        Self::match_fn(prefix, if is_dot_star { prefix_dot_star } else { prefix_dot_plus })
    }

    pub fn suffix(suffix: String, is_dot_star: bool) -> Self {
        Self::match_fn(suffix, if is_dot_star { suffix_dot_star } else { suffix_dot_plus })
    }

    /// `.*middle.*` and its `.+` variants.
    pub fn middle(prefix_dot_star: bool, pattern: String, suffix_dot_star: bool) -> Self {
        match (prefix_dot_star, suffix_dot_star) {
            (true, true) => Self::match_fn(pattern, dot_star_dot_star),
            (true, false) => Self::match_fn(pattern, dot_star_dot_plus),
            (false, true) => Self::match_fn(pattern, dot_plus_dot_star),
            (false, false) => Self::match_fn(pattern, dot_plus_dot_plus),
        }
    }

    pub fn matches(&self, s: &str) -> bool {
        match self {
            StringMatchHandler::DotStar => true,
            StringMatchHandler::DotPlus => !s.is_empty(),
            StringMatchHandler::Literal(lit) => lit.as_str() == s,
            StringMatchHandler::Alternates(alts) => matches_alternates(alts, s),
            StringMatchHandler::MatchFn(m) => m.matches(s),
            StringMatchHandler::Regex(re) => re.is_match(s),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, StringMatchHandler::Regex(_))
    }
}

#[derive(Clone, Debug)]
pub struct MatchFnHandler {
    pattern: String,
    match_fn: MatchFn,
}

impl MatchFnHandler {
    pub(super) fn new(pattern: String, match_fn: MatchFn) -> Self {
        Self { pattern, match_fn }
    }

    pub(super) fn matches(&self, s: &str) -> bool {
        (self.match_fn)(&self.pattern, s)
    }
}

fn matches_alternates(or_values: &[String], s: &str) -> bool {
    or_values
        .binary_search_by(|v| v.as_str().cmp(s))
        .is_ok()
}

// 'prefix.*'
fn prefix_dot_star(prefix: &str, candidate: &str) -> bool {
    candidate.starts_with(prefix)
}

// 'prefix.+'
fn prefix_dot_plus(prefix: &str, candidate: &str) -> bool {
    candidate.len() > prefix.len() && candidate.starts_with(prefix)
}

// '.*suffix'
fn suffix_dot_star(suffix: &str, candidate: &str) -> bool {
    candidate.ends_with(suffix)
}

// '.+suffix'
fn suffix_dot_plus(suffix: &str, candidate: &str) -> bool {
    candidate.len() > suffix.len() && candidate.ends_with(suffix)
}

// '.*middle.*'
fn dot_star_dot_star(pattern: &str, candidate: &str) -> bool {
    candidate.contains(pattern)
}

// '.+middle.*'
fn dot_plus_dot_star(pattern: &str, candidate: &str) -> bool {
    candidate.len() > pattern.len() && skip_first_char(candidate).contains(pattern)
}

// '.*middle.+'
fn dot_star_dot_plus(pattern: &str, candidate: &str) -> bool {
    candidate.len() > pattern.len() && skip_last_char(candidate).contains(pattern)
}

// '.+middle.+'
fn dot_plus_dot_plus(pattern: &str, candidate: &str) -> bool {
    candidate.len() > pattern.len() + 1 && skip_first_and_last_char(candidate).contains(pattern)
}

fn skip_first_char(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next();
    chars.as_str()
}

fn skip_last_char(s: &str) -> &str {
    match s.char_indices().next_back() {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn skip_first_and_last_char(value: &str) -> &str {
    let mut chars = value.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(StringMatchHandler::prefix("foo".into(), true), "foo", true; "prefix dot star exact")]
    #[test_case(StringMatchHandler::prefix("foo".into(), false), "foo", false; "prefix dot plus exact")]
    #[test_case(StringMatchHandler::prefix("foo".into(), false), "foox", true; "prefix dot plus longer")]
    #[test_case(StringMatchHandler::suffix("bar".into(), true), "bar", true; "suffix dot star exact")]
    #[test_case(StringMatchHandler::suffix("bar".into(), false), "bar", false; "suffix dot plus exact")]
    #[test_case(StringMatchHandler::suffix("bar".into(), false), "xbar", true; "suffix dot plus longer")]
    #[test_case(StringMatchHandler::middle(true, "mid".into(), true), "mid", true; "contains exact")]
    #[test_case(StringMatchHandler::middle(false, "mid".into(), true), "mid", false; "dot plus middle exact")]
    #[test_case(StringMatchHandler::middle(false, "mid".into(), true), "xmid", true; "dot plus middle leading")]
    #[test_case(StringMatchHandler::middle(true, "mid".into(), false), "midx", true; "middle dot plus trailing")]
    #[test_case(StringMatchHandler::middle(false, "mid".into(), false), "xmid", false; "surrounded missing trailing")]
    #[test_case(StringMatchHandler::middle(false, "mid".into(), false), "xmidx", true; "surrounded")]
    #[test_case(StringMatchHandler::middle(false, "é".into(), false), "éé", false; "surrounded multibyte")]
    #[test_case(StringMatchHandler::DotPlus, "", false; "dot plus empty")]
    #[test_case(StringMatchHandler::DotStar, "", true; "dot star empty")]
    fn handler_matches(handler: StringMatchHandler, candidate: &str, expected: bool) {
        assert_eq!(handler.matches(candidate), expected);
    }

    #[test]
    fn alternates_are_exact() {
        let handler = StringMatchHandler::alternates(vec!["foo".into(), "bar".into(), "foo".into()]);
        assert!(handler.matches("foo"));
        assert!(handler.matches("bar"));
        assert!(!handler.matches("foobar"));
        assert!(!handler.matches(""));
        assert!(matches!(
            StringMatchHandler::alternates(vec!["x".into()]),
            StringMatchHandler::Literal(_)
        ));
    }
}
