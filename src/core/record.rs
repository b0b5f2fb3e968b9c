//! Output containers shared by every operation.

use std::ops::Index;

/// Ordered mapping from fixed string keys to values.
///
/// Keys keep their insertion order so that a record reads the same way
/// every time an operation is run. Inserting an existing key overwrites
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    entries: Vec<(String, f64)>,
}

impl FeatureRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Create a record where every key maps to NaN.
    pub fn nan_filled<S: AsRef<str>>(keys: &[S]) -> Self {
        keys.iter().map(|k| (k.as_ref().to_string(), f64::NAN)).collect()
    }

    /// Insert or overwrite a value.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Copy every entry of `other` under `prefix`.
    pub fn extend_prefixed(&mut self, prefix: &str, other: &FeatureRecord) {
        for (key, value) in other.iter() {
            self.insert(format!("{prefix}{key}"), value);
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    /// True when the record is non-empty and every value is NaN.
    ///
    /// Batch callers treat such a record as a skipped feature.
    pub fn all_nan(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|(_, v)| v.is_nan())
    }
}

impl Index<&str> for FeatureRecord {
    type Output = f64;

    fn index(&self, key: &str) -> &f64 {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .unwrap_or_else(|| panic!("no feature named '{key}' in record"))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureRecord {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut record = FeatureRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl IntoIterator for FeatureRecord {
    type Item = (String, f64);
    type IntoIter = std::vec::IntoIter<(String, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Result of an operation: a single scalar or a named record.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Scalar(f64),
    Record(FeatureRecord),
}

impl FeatureValue {
    /// The scalar value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            FeatureValue::Scalar(v) => Some(*v),
            FeatureValue::Record(_) => None,
        }
    }

    /// The record, if this is a record.
    pub fn as_record(&self) -> Option<&FeatureRecord> {
        match self {
            FeatureValue::Scalar(_) => None,
            FeatureValue::Record(r) => Some(r),
        }
    }

    /// True for a NaN scalar or an all-NaN record.
    pub fn is_nan(&self) -> bool {
        match self {
            FeatureValue::Scalar(v) => v.is_nan(),
            FeatureValue::Record(r) => r.all_nan(),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Scalar(value)
    }
}

impl From<FeatureRecord> for FeatureValue {
    fn from(record: FeatureRecord) -> Self {
        FeatureValue::Record(record)
    }
}
