//! Raw sample to canonical metric normalization.
//!
//! Normalization is total and side-effect free: every quantity sample yields
//! a metric. Types missing from the quantity table fall back to the `count`
//! conversion, an empty unit label and their raw identifier as name. When a
//! sample's unit cannot be converted into the target, the raw value is kept.

use crate::metric::{CanonicalMetric, MetricCategory};
use crate::quantity::{Conversion, QuantityType};
use crate::sample::{QuantitySample, RawSample};
use crate::units;
use tracing::debug;

/// Normalizer for converting raw samples to canonical metrics
pub struct MetricNormalizer;

impl MetricNormalizer {
    /// Category of a raw type identifier. Unknown identifiers map to `Other`.
    pub fn classify(type_identifier: &str) -> MetricCategory {
        QuantityType::from_identifier(type_identifier)
            .map(QuantityType::category)
            .unwrap_or(MetricCategory::Other)
    }

    pub fn display_name(type_identifier: &str) -> String {
        QuantityType::from_identifier(type_identifier)
            .map(|t| t.display_name().to_string())
            .unwrap_or_else(|| type_identifier.to_string())
    }

    pub fn unit_label(type_identifier: &str) -> &'static str {
        QuantityType::from_identifier(type_identifier)
            .map(QuantityType::unit_label)
            .unwrap_or("")
    }

    /// Normalize any raw sample. Only quantity samples produce a metric.
    pub fn normalize(sample: &RawSample) -> Option<CanonicalMetric> {
        sample.as_quantity().map(Self::normalize_quantity)
    }

    pub fn normalize_quantity(sample: &QuantitySample) -> CanonicalMetric {
        let kind = QuantityType::from_identifier(&sample.type_identifier);
        let conversion = kind
            .map(QuantityType::conversion)
            .unwrap_or(Conversion::DEFAULT);

        CanonicalMetric::new(
            Self::display_name(&sample.type_identifier),
            sample.type_identifier.clone(),
            normalized_value(sample, conversion),
            Self::unit_label(&sample.type_identifier),
            sample.start_date,
            Self::classify(&sample.type_identifier),
            sample.source.clone(),
        )
    }
}

fn normalized_value(sample: &QuantitySample, conversion: Conversion) -> f64 {
    let converted = match conversion {
        Conversion::To(target) => units::convert(sample.value, &sample.unit, target),
        Conversion::Percent => units::convert(sample.value, &sample.unit, "%").map(|v| v * 100.0),
    };
    converted.unwrap_or_else(|| {
        debug!(
            identifier = %sample.type_identifier,
            unit = %sample.unit,
            ?conversion,
            "unit not convertible, keeping raw value"
        );
        sample.value
    })
}
