use chrono::{TimeZone, Utc};
use health_sync_core::quantity::Conversion;
use health_sync_core::sample::CategorySample;
use health_sync_core::{MetricCategory, MetricNormalizer, QuantitySample, QuantityType, RawSample};

fn at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 20, 6, 45, 30).unwrap()
}

#[test]
fn every_known_type_normalizes_to_its_table_row() {
    for &kind in QuantityType::ALL {
        let (unit, raw_value, expected) = match kind.conversion() {
            Conversion::To(unit) => (unit, 2.5, 2.5),
            Conversion::Percent => ("%", 0.25, 25.0),
        };
        let sample = QuantitySample::new(kind.identifier(), raw_value, unit, at());
        let metric = MetricNormalizer::normalize(&RawSample::from(sample))
            .unwrap_or_else(|| panic!("{} did not normalize", kind.identifier()));

        assert_eq!(metric.category(), MetricNormalizer::classify(kind.identifier()));
        assert_eq!(metric.category(), kind.category());
        assert_eq!(metric.unit(), kind.unit_label());
        assert_eq!(metric.name(), kind.display_name());
        assert_eq!(metric.identifier(), kind.identifier());
        assert_eq!(metric.timestamp(), at());
        assert!(
            (metric.value() - expected).abs() < 1e-9,
            "{}: {} != {}",
            kind.identifier(),
            metric.value(),
            expected
        );
    }
}

#[test]
fn classification_is_total() {
    for id in ["", "HKQuantityTypeIdentifierMadeUp", "steps", "\u{1F600}"] {
        assert_eq!(MetricNormalizer::classify(id), MetricCategory::Other);
    }
    assert!(
        QuantityType::ALL
            .iter()
            .all(|k| k.category() != MetricCategory::Sleep)
    );
}

#[test]
fn platform_units_convert_into_canonical_units() {
    let cases = [
        ("HKQuantityTypeIdentifierBodyMass", 154.0, "lb", 69.853_224_98),
        ("HKQuantityTypeIdentifierBodyTemperature", 98.6, "degF", 37.0),
        ("HKQuantityTypeIdentifierHeartRate", 1.2, "count/s", 72.0),
        ("HKQuantityTypeIdentifierDistanceWalkingRunning", 1.0, "mi", 1_609.344),
        ("HKQuantityTypeIdentifierOxygenSaturation", 0.97, "%", 97.0),
    ];
    for (id, value, unit, expected) in cases {
        let metric = MetricNormalizer::normalize_quantity(&QuantitySample::new(id, value, unit, at()));
        assert!(
            (metric.value() - expected).abs() < 1e-6,
            "{id}: {} != {expected}",
            metric.value()
        );
    }
}

#[test]
fn category_samples_are_skipped() {
    let sample = RawSample::Category(CategorySample {
        type_identifier: "HKCategoryTypeIdentifierSleepAnalysis".into(),
        value: 3,
        start_date: at(),
        end_date: at(),
        source: None,
    });
    assert!(MetricNormalizer::normalize(&sample).is_none());
}

#[test]
fn overflowing_unit_exponents_keep_raw_value() {
    for unit in ["m^127*m", "1/m^-128"] {
        let metric = MetricNormalizer::normalize_quantity(&QuantitySample::new(
            "HKQuantityTypeIdentifierHeight",
            1.75,
            unit,
            at(),
        ));
        assert_eq!(metric.value(), 1.75, "{unit}");
        assert_eq!(metric.unit(), "m");
    }
}

#[test]
fn perfusion_index_keeps_fraction_with_index_label() {
    let metric = MetricNormalizer::normalize_quantity(&QuantitySample::new(
        "HKQuantityTypeIdentifierPeripheralPerfusionIndex",
        0.02,
        "%",
        at(),
    ));
    assert!((metric.value() - 0.02).abs() < 1e-12);
    assert_eq!(metric.unit(), "index");
    assert_eq!(metric.category(), MetricCategory::Vitals);
}
