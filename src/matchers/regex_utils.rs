use regex::RegexBuilder;
use regex_syntax::hir::{Class, Hir, HirKind};
use regex_syntax::ParserBuilder;
use super::match_handlers::StringMatchHandler;

/// Past this many alternatives a compiled regex is cheaper than a list lookup.
const MAX_OR_VALUES: usize = 10;

/// Parses `pattern` the way it is later compiled: `.` matches any character, newlines
/// included.
pub(super) fn build_hir(pattern: &str) -> Result<Hir, String> {
    ParserBuilder::new()
        .dot_matches_new_line(true)
        .build()
        .parse(pattern)
        .map_err(|err| err.to_string())
}

/// Compiles `pattern` into a full-string matcher.
///
/// The pattern is validated on its own before being anchored, so input such as
/// `a)|(b` cannot escape the anchoring group.
pub fn compile_match_handler(pattern: &str, size_limit: usize) -> Result<StringMatchHandler, String> {
    let hir = build_hir(pattern)?;
    if let Some(handler) = get_optimized_match_handler(&hir) {
        return Ok(handler);
    }
    let anchored = format!("^(?s:{pattern})$");
    RegexBuilder::new(&anchored)
        .size_limit(size_limit)
        .build()
        .map(StringMatchHandler::Regex)
        .map_err(|err| err.to_string())
}

/// Returns a matcher answering common pattern shapes without the regex engine:
///
///	'.*'
///	'.+'
///	'literal'
///	'foo|bar|baz'
///	'literal.*'
///	'literal.+'
///	'.*literal'
///	'.+literal'
///	'.*literal.*' and its '.+' variants
pub(super) fn get_optimized_match_handler(sre: &Hir) -> Option<StringMatchHandler> {
    if is_dot_star(sre) {
        return Some(StringMatchHandler::DotStar);
    }
    if is_dot_plus(sre) {
        return Some(StringMatchHandler::DotPlus);
    }
    match sre.kind() {
        HirKind::Capture(cap) => return get_optimized_match_handler(cap.sub.as_ref()),
        HirKind::Concat(subs) if subs.len() == 2 => {
            let (first, second) = (&subs[0], &subs[1]);
            if let Some(prefix) = literal_to_string(first) {
                if is_dot_star(second) {
                    return Some(StringMatchHandler::prefix(prefix, true));
                }
                if is_dot_plus(second) {
                    return Some(StringMatchHandler::prefix(prefix, false));
                }
            }
            if let Some(suffix) = literal_to_string(second) {
                if is_dot_star(first) {
                    return Some(StringMatchHandler::suffix(suffix, true));
                }
                if is_dot_plus(first) {
                    return Some(StringMatchHandler::suffix(suffix, false));
                }
            }
        }
        HirKind::Concat(subs) if subs.len() == 3 => {
            let (first, third) = (&subs[0], &subs[2]);
            if let Some(middle) = literal_to_string(&subs[1]) {
                let first_star = is_dot_star(first);
                let third_star = is_dot_star(third);
                if (first_star || is_dot_plus(first)) && (third_star || is_dot_plus(third)) {
                    return Some(StringMatchHandler::middle(first_star, middle, third_star));
                }
            }
        }
        _ => {}
    }
    get_or_values(sre).map(StringMatchHandler::alternates)
}

/// Returns the finite set of strings matched by `sre`, or `None` when the set is
/// unbounded or larger than `MAX_OR_VALUES`.
///
/// It returns ["foo", "bar"] for "foo|bar", ["foo"] for "foo" and [""] for "".
pub(super) fn get_or_values(sre: &Hir) -> Option<Vec<String>> {
    use HirKind::*;
    match sre.kind() {
        Empty => Some(vec!["".to_string()]),
        Capture(cap) => get_or_values(cap.sub.as_ref()),
        Literal(literal) => String::from_utf8(literal.0.to_vec()).ok().map(|s| vec![s]),
        Alternation(alt) => {
            let mut a = Vec::with_capacity(alt.len());
            for sub in alt.iter() {
                a.extend(get_or_values(sub)?);
                if a.len() > MAX_OR_VALUES {
                    return None;
                }
            }
            Some(a)
        }
        Concat(concat) => {
            let mut values = vec!["".to_string()];
            for sub in concat.iter() {
                let suffixes = get_or_values(sub)?;
                if values.len() * suffixes.len() > MAX_OR_VALUES {
                    return None;
                }
                let mut next = Vec::with_capacity(values.len() * suffixes.len());
                for prefix in values.iter() {
                    for suffix in suffixes.iter() {
                        next.push(format!("{prefix}{suffix}"));
                    }
                }
                values = next;
            }
            Some(values)
        }
        Class(class) => class_values(class),
        _ => None,
    }
}

fn class_values(class: &Class) -> Option<Vec<String>> {
    match class {
        Class::Unicode(uni) => {
            let count: u64 = uni
                .iter()
                .map(|r| r.end() as u64 - r.start() as u64 + 1)
                .sum();
            if count > MAX_OR_VALUES as u64 {
                return None;
            }
            Some(
                uni.iter()
                    .flat_map(|r| r.start()..=r.end())
                    .map(|c| c.to_string())
                    .collect(),
            )
        }
        Class::Bytes(bytes) => {
            let count: usize = bytes
                .iter()
                .map(|r| r.end() as usize - r.start() as usize + 1)
                .sum();
            if count > MAX_OR_VALUES {
                return None;
            }
            let mut a = Vec::with_capacity(count);
            for c in bytes.iter().flat_map(|r| r.start()..=r.end()) {
                if !c.is_ascii() {
                    return None;
                }
                a.push((c as char).to_string());
            }
            Some(a)
        }
    }
}

fn literal_to_string(sre: &Hir) -> Option<String> {
    match sre.kind() {
        HirKind::Literal(lit) => String::from_utf8(lit.0.to_vec()).ok(),
        HirKind::Capture(cap) => literal_to_string(cap.sub.as_ref()),
        HirKind::Class(class) => class.literal().and_then(|b| String::from_utf8(b).ok()),
        _ => None,
    }
}

fn is_any_char(sre: &Hir) -> bool {
    match sre.kind() {
        HirKind::Capture(cap) => is_any_char(cap.sub.as_ref()),
        HirKind::Class(Class::Unicode(uni)) => {
            let ranges = uni.ranges();
            ranges.len() == 1 && ranges[0].start() == '\0' && ranges[0].end() == char::MAX
        }
        _ => false,
    }
}

fn is_dot_star(sre: &Hir) -> bool {
    match sre.kind() {
        HirKind::Capture(cap) => is_dot_star(cap.sub.as_ref()),
        HirKind::Alternation(alternate) => alternate.iter().any(is_dot_star),
        HirKind::Repetition(rep) => rep.min == 0 && rep.max.is_none() && is_any_char(&rep.sub),
        _ => false,
    }
}

fn is_dot_plus(sre: &Hir) -> bool {
    match sre.kind() {
        HirKind::Capture(cap) => is_dot_plus(cap.sub.as_ref()),
        HirKind::Repetition(rep) => rep.min == 1 && rep.max.is_none() && is_any_char(&rep.sub),
        _ => false,
    }
}
