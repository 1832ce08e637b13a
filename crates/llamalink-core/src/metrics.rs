//! Decoder for the Prometheus text exposition served by `GET /metrics`.
//!
//! llama-server prefixes its metrics with a `llamacpp:` namespace. Names are
//! keyed without it: `llamacpp:prompt_tokens_total` becomes
//! `prompt_tokens_total`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

static SAMPLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_:][A-Za-z0-9_:]*)(?:\{([^}]*)\})?\s+(\S+)")
        .expect("metrics line pattern is valid")
});

static LABEL_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*"((?:[^"\\]|\\.)*)""#)
        .expect("label pattern is valid")
});

/// A sample value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricNumber {
    Int(i64),
    Float(f64),
}

impl MetricNumber {
    /// Parse a sample value. Text containing `.` is a float; anything else
    /// is tried as an integer first, then as a float (`NaN`, `+Inf`, `1e3`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.contains('.') {
            return raw.parse().ok().map(Self::Float);
        }
        raw.parse()
            .map(Self::Int)
            .or_else(|_| raw.parse().map(Self::Float))
            .ok()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> f64 {
        match self {
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }
}

impl std::fmt::Display for MetricNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// One decoded metric: a bare scalar, or a value with its labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(MetricNumber),
    Labeled {
        value: MetricNumber,
        labels: BTreeMap<String, String>,
    },
}

impl MetricValue {
    #[must_use]
    pub const fn value(&self) -> MetricNumber {
        match self {
            Self::Scalar(value) | Self::Labeled { value, .. } => *value,
        }
    }

    #[must_use]
    pub const fn labels(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Scalar(_) => None,
            Self::Labeled { labels, .. } => Some(labels),
        }
    }
}

/// Decoded metrics keyed by bare name. When a name repeats, the last sample wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, MetricValue>);

impl Metrics {
    /// Decode exposition text. Never fails; unparseable lines are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut metrics = BTreeMap::new();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(caps) = SAMPLE_LINE.captures(line) else {
                debug!(line, "Skipping unrecognized metrics line");
                continue;
            };

            let raw_value = &caps[3];
            let Some(value) = MetricNumber::parse(raw_value) else {
                debug!(line, value = raw_value, "Skipping metrics line with bad value");
                continue;
            };

            let name = bare_name(&caps[1]).to_string();
            let entry = match caps.get(2) {
                Some(labels) => MetricValue::Labeled {
                    value,
                    labels: parse_labels(labels.as_str()),
                },
                None => MetricValue::Scalar(value),
            };
            metrics.insert(name, entry);
        }

        Self(metrics)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricValue)> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, MetricValue> {
        self.0
    }
}

/// Strip everything up to and including the first `:`.
fn bare_name(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, rest)| rest)
}

fn parse_labels(raw: &str) -> BTreeMap<String, String> {
    LABEL_PAIR
        .captures_iter(raw)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}
