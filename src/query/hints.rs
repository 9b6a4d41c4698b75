use phf::phf_set;
use crate::prompb::ReadHints;
use crate::storage::Storage;

/// Hint function asking only for the label sets of matching series.
pub const SERIES_FUNC: &str = "series";

static KNOWN_FUNCS: phf::Set<&'static str> = phf_set! {
    "series",
    // aggregations
    "sum",
    "min",
    "max",
    "avg",
    "group",
    "stddev",
    "stdvar",
    "count",
    "count_values",
    "bottomk",
    "topk",
    "quantile",
    // range functions
    "rate",
    "irate",
    "increase",
    "delta",
    "idelta",
    "deriv",
    "changes",
    "resets",
    "predict_linear",
    "holt_winters",
    "avg_over_time",
    "min_over_time",
    "max_over_time",
    "sum_over_time",
    "count_over_time",
    "quantile_over_time",
    "stddev_over_time",
    "stdvar_over_time",
    "last_over_time",
    "present_over_time",
    "absent_over_time",
};

pub fn is_known_func(func: &str) -> bool {
    KNOWN_FUNCS.contains(func)
}

/// Checks that the hint fields are self-consistent.
pub fn validate_hints(hints: &ReadHints) -> Result<(), String> {
    if hints.start_ms > hints.end_ms {
        return Err(format!(
            "start_ms {} is after end_ms {}",
            hints.start_ms, hints.end_ms
        ));
    }
    if hints.step_ms < 0 {
        return Err(format!("negative step_ms {}", hints.step_ms));
    }
    if hints.range_ms < 0 {
        return Err(format!("negative range_ms {}", hints.range_ms));
    }
    Ok(())
}

/// Returns the hints to forward to storage, or `None` when raw data is to be read.
///
/// Hints are advisory: invalid hints, unknown functions and functions the storage
/// cannot honour all fall back to raw series.
pub fn resolve_hints<'a>(
    index: usize,
    hints: Option<&'a ReadHints>,
    storage: &dyn Storage,
) -> Option<&'a ReadHints> {
    let hints = hints?;
    if let Err(reason) = validate_hints(hints) {
        tracing::warn!(query = index, %reason, "dropping invalid read hints");
        return None;
    }
    let func = hints.func.as_str();
    if func.is_empty() {
        return None;
    }
    if !is_known_func(func) {
        tracing::debug!(query = index, func, "unknown hint function, reading raw series");
        return None;
    }
    if !storage.supports_hint(func) {
        tracing::debug!(query = index, func, "hint not supported by storage, reading raw series");
        return None;
    }
    Some(hints)
}
