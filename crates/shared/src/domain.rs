use std::{fmt, marker::PhantomData};

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{Map, Number, Value};

/// String-keyed map that keeps the server's key order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value in place when the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Per-class metrics as emitted by a scikit-learn style classification report.
///
/// Numbers stay as [`Number`] so `10` and `10.0` serialize back as sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall: Option<Number>,
    #[serde(
        rename = "f1-score",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub f1_score: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A classification report value. Summary rows such as `accuracy` arrive as
/// bare numbers and are carried as `Scalar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportEntry {
    Metrics(ClassMetrics),
    Scalar(Value),
}

impl ReportEntry {
    pub fn metrics(&self) -> Option<&ClassMetrics> {
        match self {
            Self::Metrics(metrics) => Some(metrics),
            Self::Scalar(_) => None,
        }
    }
}

pub type ClassificationReport = OrderedMap<ReportEntry>;

/// Feature name to contribution score for one flagged record.
pub type AnomalyExplanation = OrderedMap<Option<Number>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prediction {
    Normal,
    Anomaly,
}

impl Prediction {
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            Self::Anomaly
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_report: Option<ClassificationReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_explanations: Option<Vec<AnomalyExplanation>>,
    /// Fields this client does not interpret, kept so the stored result
    /// matches the response body.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    /// Entries of the classification report that carry per-class metrics.
    pub fn class_metrics(&self) -> impl Iterator<Item = (&str, &ClassMetrics)> {
        self.classification_report
            .iter()
            .flat_map(|report| report.iter())
            .filter_map(|(label, entry)| entry.metrics().map(|metrics| (label, metrics)))
    }

    pub fn explanations(&self) -> &[AnomalyExplanation] {
        self.anomaly_explanations.as_deref().unwrap_or_default()
    }

    pub fn predictions(&self) -> impl Iterator<Item = Prediction> + '_ {
        self.predictions
            .iter()
            .flatten()
            .map(|label| Prediction::from_label(*label))
    }
}
