use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::Hasher;
use xxhash_rust::xxh3::Xxh3;
use crate::common::METRIC_NAME_LABEL;
use crate::prompb::Label;

const SEP: u8 = b'\xff';

/// Canonical label set: labels sorted by name, names unique.
///
/// Duplicate names are resolved last-write-wins, i.e. the value that appears last in the
/// input sequence is kept. Unknown wire fields carried by the input labels are dropped,
/// so two label sets are equal iff they hold the same name/value pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet(Vec<Label>);

impl LabelSet {
    pub fn new<I: IntoIterator<Item = Label>>(labels: I) -> Self {
        let mut labels: Vec<Label> = labels.into_iter().collect();
        // stable, so equal names stay in encounter order
        labels.sort_by(|a, b| a.name.cmp(&b.name));

        let mut result: Vec<Label> = Vec::with_capacity(labels.len());
        for mut label in labels {
            label.unknown_fields.clear();
            match result.last_mut() {
                Some(last) if last.name == label.name => *last = label,
                _ => result.push(label),
            }
        }
        LabelSet(result)
    }

    pub fn from_slice(labels: &[Label]) -> Self {
        Self::new(labels.iter().cloned())
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(pairs.iter().map(|(name, value)| Label::new(*name, *value)))
    }

    /// Returns the value of the label with the given name, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .binary_search_by(|label| label.name.as_str().cmp(name))
            .ok()
            .map(|idx| self.0[idx].value.as_str())
    }

    /// Returns the label value, treating a missing label as the empty string.
    pub fn value_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn metric_name(&self) -> Option<&str> {
        self.get(METRIC_NAME_LABEL)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Label] {
        &self.0
    }

    pub fn into_labels(self) -> Vec<Label> {
        self.0
    }

    /// Returns the first label with an empty name, which the wire contract forbids.
    pub fn find_empty_name(&self) -> Option<&Label> {
        // empty string sorts first
        self.0.first().filter(|label| label.name.is_empty())
    }

    /// Stable 64-bit hash of the name/value pairs.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher: Xxh3 = Xxh3::with_seed(0);
        for label in self.0.iter() {
            hasher.write(label.name.as_bytes());
            hasher.write(&[SEP]);
            hasher.write(label.value.as_bytes());
            hasher.write(&[SEP]);
        }
        hasher.digest()
    }

    /// Orders label sets the way Prometheus orders series: pairwise by name, then value,
    /// with a shorter set sorting first when it is a prefix of the other.
    pub fn compare(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let ord = a.name.cmp(&b.name).then_with(|| a.value.cmp(&b.value));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl From<Vec<Label>> for LabelSet {
    fn from(labels: Vec<Label>) -> Self {
        LabelSet::new(labels)
    }
}

impl From<&[Label]> for LabelSet {
    fn from(labels: &[Label]) -> Self {
        LabelSet::from_slice(labels)
    }
}

impl Display for LabelSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let metric_name = self.metric_name().unwrap_or("");
        write!(f, "{metric_name}{{")?;
        let mut first = true;
        for label in self.0.iter().filter(|l| l.name != METRIC_NAME_LABEL) {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}={:?}", label.name, label.value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_name() {
        let ls = LabelSet::from_pairs(&[("job", "api"), ("__name__", "up"), ("instance", "a:9090")]);
        let names: Vec<&str> = ls.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["__name__", "instance", "job"]);
    }

    #[test]
    fn duplicate_names_are_last_wins() {
        let ls = LabelSet::from_pairs(&[("job", "first"), ("env", "prod"), ("job", "second")]);
        assert_eq!(ls.len(), 2);
        assert_eq!(ls.get("job"), Some("second"));
    }

    #[test]
    fn missing_label_reads_as_empty() {
        let ls = LabelSet::from_pairs(&[("job", "api")]);
        assert_eq!(ls.get("env"), None);
        assert_eq!(ls.value_or_empty("env"), "");
    }

    #[test]
    fn equality_ignores_input_order_and_unknown_fields() {
        let mut label = Label::new("job", "api");
        label.unknown_fields.push_varint(9, 1);
        let a = LabelSet::new(vec![label, Label::new("env", "prod")]);
        let b = LabelSet::from_pairs(&[("env", "prod"), ("job", "api")]);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_separates_names_and_values() {
        let a = LabelSet::from_pairs(&[("ab", "c")]);
        let b = LabelSet::from_pairs(&[("a", "bc")]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn finds_empty_name() {
        let ls = LabelSet::from_pairs(&[("", "x"), ("job", "api")]);
        assert!(ls.find_empty_name().is_some());
        let ls = LabelSet::from_pairs(&[("job", "api")]);
        assert!(ls.find_empty_name().is_none());
    }

    #[test]
    fn compare_orders_prefix_first() {
        let a = LabelSet::from_pairs(&[("__name__", "up")]);
        let b = LabelSet::from_pairs(&[("__name__", "up"), ("job", "api")]);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn display_as_selector() {
        let ls = LabelSet::from_pairs(&[("__name__", "up"), ("job", "api")]);
        assert_eq!(ls.to_string(), r#"up{job="api"}"#);
    }
}
