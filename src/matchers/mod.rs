//! Label matcher evaluation.
//!
//! Regex matchers always match the full label value. Patterns are compiled once per
//! distinct string and kept in a [`RegexCache`] owned by the [`MatcherEngine`].
mod match_handlers;
mod matcher;
mod regex_cache;
mod regex_utils;

pub use match_handlers::*;
pub use matcher::*;
pub use regex_cache::*;
pub use regex_utils::compile_match_handler;
