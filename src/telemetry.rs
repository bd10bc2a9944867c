//! Fire-and-forget metric sink.
//!
//! The client reports numeric samples here and never looks at the result.
//! A sink must not panic or block; whatever it does cannot change the outcome
//! of a request.

use std::collections::BTreeMap;
use std::fmt;

/// Key/value labels attached to a sample.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    values: BTreeMap<String, String>,
}

impl Tags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag. Blank keys or values are dropped rather than reported.
    #[must_use]
    pub fn add(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        if !key.trim().is_empty() && !value.trim().is_empty() {
            self.values.insert(key, value);
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `key:value` strings, sorted by key.
    #[must_use]
    pub fn to_raw(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{k}:{v}")).collect()
    }
}

/// Receives samples recorded by the client.
pub trait Telemetry: Send + Sync + fmt::Debug {
    fn record(&self, metric: &str, value: f64, tags: &Tags);
}

/// Discards every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn record(&self, _metric: &str, _value: f64, _tags: &Tags) {}
}

/// Forwards samples to the global [`metrics`] recorder as histograms.
#[cfg(feature = "metrics")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsTelemetry;

#[cfg(feature = "metrics")]
impl Telemetry for MetricsTelemetry {
    fn record(&self, metric: &str, value: f64, tags: &Tags) {
        let labels: Vec<metrics::Label> = tags
            .iter()
            .map(|(k, v)| metrics::Label::new(k.to_owned(), v.to_owned()))
            .collect();
        metrics::histogram!(metric.to_owned(), labels).record(value);
    }
}
