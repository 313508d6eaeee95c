//! Canonical metric model shared by the normalizer and the delivery adapters.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Grouping used for display and for the `category` column on the wire.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    Vitals,
    Activity,
    Nutrition,
    /// Reserved. No quantity type currently classifies here.
    Sleep,
    Lab,
    Other,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 6] = [
        MetricCategory::Vitals,
        MetricCategory::Activity,
        MetricCategory::Nutrition,
        MetricCategory::Sleep,
        MetricCategory::Lab,
        MetricCategory::Other,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            MetricCategory::Vitals => "Vitals",
            MetricCategory::Activity => "Activity",
            MetricCategory::Nutrition => "Nutrition",
            MetricCategory::Sleep => "Sleep",
            MetricCategory::Lab => "Lab Results",
            MetricCategory::Other => "Other",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MetricCategory::Vitals => {
                "Heart rate, blood pressure, respiratory rate, body temperature"
            }
            MetricCategory::Activity => "Steps, distance, active energy, flights climbed",
            MetricCategory::Nutrition => "Dietary metrics, water intake, macronutrients",
            MetricCategory::Sleep => "Sleep analysis and sleep stages",
            MetricCategory::Lab => "Blood glucose, cholesterol, lab results",
            MetricCategory::Other => "Uncategorized or custom metrics",
        }
    }
}

/// A normalized, unit-converted measurement.
///
/// The `id` is generated on construction and never leaves the process: it is
/// skipped on serialization, regenerated on deserialization and ignored by
/// equality.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalMetric {
    #[serde(skip, default = "Uuid::new_v4")]
    id: Uuid,
    name: String,
    identifier: String,
    value: f64,
    unit: String,
    timestamp: DateTime<Utc>,
    category: MetricCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CanonicalMetric {
    pub fn new(
        name: impl Into<String>,
        identifier: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        timestamp: DateTime<Utc>,
        category: MetricCategory,
        source: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            identifier: identifier.into(),
            value,
            unit: unit.into(),
            timestamp,
            category,
            source,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Human-readable name, e.g. "Heart Rate".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw type identifier the metric was produced from.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn category(&self) -> MetricCategory {
        self.category
    }

    /// App or device that recorded the sample.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Value with at most two fraction digits followed by the unit label.
    pub fn formatted_value(&self) -> String {
        let mut number = format!("{:.2}", self.value);
        if number.contains('.') {
            let trimmed = number.trim_end_matches('0').trim_end_matches('.').len();
            number.truncate(trimmed);
        }
        if number == "-0" {
            number = "0".to_string();
        }
        if self.unit.is_empty() {
            number
        } else {
            format!("{} {}", number, self.unit)
        }
    }

    /// Whether the measurement was taken within the 24 hours before `now`.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        self.timestamp > now - Duration::hours(24)
    }
}

impl PartialEq for CanonicalMetric {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.identifier == other.identifier
            && self.value == other.value
            && self.unit == other.unit
            && self.timestamp == other.timestamp
            && self.category == other.category
            && self.source == other.source
    }
}

/// JSON Schema of the request body a destination receives: an array of
/// canonical metrics.
pub fn batch_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(Vec<CanonicalMetric>)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn heart_rate(value: f64) -> CanonicalMetric {
        CanonicalMetric::new(
            "Heart Rate",
            "HKQuantityTypeIdentifierHeartRate",
            value,
            "bpm",
            Utc.with_ymd_and_hms(2025, 7, 7, 10, 30, 0).unwrap(),
            MetricCategory::Vitals,
            Some("Apple Watch".into()),
        )
    }

    #[test]
    fn category_set_is_closed() {
        assert_eq!(MetricCategory::ALL.len(), 6);
        assert_eq!(MetricCategory::Lab.display_name(), "Lab Results");
        assert!(MetricCategory::Sleep.description().contains("Sleep"));
    }

    #[test]
    fn category_serializes_lowercase() {
        let encoded = serde_json::to_value(MetricCategory::Nutrition).unwrap();
        assert_eq!(encoded, json!("nutrition"));
    }

    #[test]
    fn equality_ignores_generated_id() {
        let a = heart_rate(72.0);
        let b = heart_rate(72.0);
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
        assert_ne!(a, heart_rate(73.0));
    }

    #[test]
    fn wire_format_omits_id_and_absent_source() {
        let metric = CanonicalMetric::new(
            "Step Count",
            "HKQuantityTypeIdentifierStepCount",
            8542.0,
            "steps",
            Utc.with_ymd_and_hms(2025, 7, 7, 8, 0, 0).unwrap(),
            MetricCategory::Activity,
            None,
        );
        let encoded = serde_json::to_value(&metric).unwrap();
        let obj = encoded.as_object().unwrap();
        assert!(!obj.contains_key("id"));
        assert!(!obj.contains_key("source"));
        assert_eq!(obj["identifier"], json!("HKQuantityTypeIdentifierStepCount"));
        assert_eq!(obj["timestamp"], json!("2025-07-07T08:00:00Z"));
        assert_eq!(obj["category"], json!("activity"));
    }

    #[test]
    fn decode_restores_fields_with_fresh_id() {
        let metric = heart_rate(61.5);
        let text = serde_json::to_string(&metric).unwrap();
        let decoded: CanonicalMetric = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, metric);
        assert_ne!(decoded.id(), metric.id());
        assert_eq!(decoded.source(), Some("Apple Watch"));
    }

    #[test]
    fn formatted_value_trims_fraction() {
        assert_eq!(heart_rate(72.0).formatted_value(), "72 bpm");
        assert_eq!(heart_rate(70.256).formatted_value(), "70.26 bpm");
        assert_eq!(heart_rate(70.5).formatted_value(), "70.5 bpm");
    }

    #[test]
    fn recency_uses_trailing_day() {
        let metric = heart_rate(72.0);
        let now = metric.timestamp() + Duration::hours(3);
        assert!(metric.is_recent(now));
        assert!(!metric.is_recent(metric.timestamp() + Duration::hours(25)));
    }

    #[test]
    fn batch_schema_describes_wire_fields() {
        let schema = batch_schema();
        let text = schema.to_string();
        assert_eq!(schema["type"], "array");
        for field in ["name", "identifier", "value", "unit", "timestamp", "category", "source"] {
            assert!(text.contains(&format!("\"{field}\"")), "missing {field}");
        }
        assert!(!text.contains("\"id\""));
    }
}
