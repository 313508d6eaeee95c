//! The closed set of quantity types understood by the normalizer.
//!
//! One row per type: platform identifier, display name, category, target
//! conversion and the unit label written on the canonical metric.

use crate::metric::MetricCategory;

/// How a raw quantity is brought into its canonical unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// Convert into the given unit expression.
    To(&'static str),
    /// Convert into a fraction and multiply by 100.
    Percent,
}

impl Conversion {
    /// Conversion applied to identifiers missing from the table.
    pub const DEFAULT: Conversion = Conversion::To("count");
}

const fn to(unit: &'static str) -> Conversion {
    Conversion::To(unit)
}

const PERCENT: Conversion = Conversion::Percent;

macro_rules! quantity_types {
    ($( $variant:ident => $id:literal, $name:literal, $category:ident, $conversion:expr, $label:literal; )*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum QuantityType {
            $( $variant, )*
        }

        impl QuantityType {
            /// Every known type, in table order.
            pub const ALL: &'static [QuantityType] = &[ $( QuantityType::$variant, )* ];

            /// Platform identifier, e.g. `HKQuantityTypeIdentifierHeartRate`.
            pub fn identifier(self) -> &'static str {
                match self {
                    $( QuantityType::$variant => $id, )*
                }
            }

            pub fn display_name(self) -> &'static str {
                match self {
                    $( QuantityType::$variant => $name, )*
                }
            }

            pub fn category(self) -> MetricCategory {
                match self {
                    $( QuantityType::$variant => MetricCategory::$category, )*
                }
            }

            pub fn conversion(self) -> Conversion {
                match self {
                    $( QuantityType::$variant => $conversion, )*
                }
            }

            pub fn unit_label(self) -> &'static str {
                match self {
                    $( QuantityType::$variant => $label, )*
                }
            }
        }
    };
}

quantity_types! {
    // Vitals
    HeartRate => "HKQuantityTypeIdentifierHeartRate", "Heart Rate", Vitals, to("count/min"), "bpm";
    RestingHeartRate => "HKQuantityTypeIdentifierRestingHeartRate", "Resting Heart Rate", Vitals, to("count/min"), "bpm";
    WalkingHeartRateAverage => "HKQuantityTypeIdentifierWalkingHeartRateAverage", "Walking Heart Rate Average", Vitals, to("count/min"), "bpm";
    HeartRateVariabilitySdnn => "HKQuantityTypeIdentifierHeartRateVariabilitySDNN", "Heart Rate Variability", Vitals, to("ms"), "ms";
    BloodPressureSystolic => "HKQuantityTypeIdentifierBloodPressureSystolic", "Systolic Blood Pressure", Vitals, to("mmHg"), "mmHg";
    BloodPressureDiastolic => "HKQuantityTypeIdentifierBloodPressureDiastolic", "Diastolic Blood Pressure", Vitals, to("mmHg"), "mmHg";
    RespiratoryRate => "HKQuantityTypeIdentifierRespiratoryRate", "Respiratory Rate", Vitals, to("count/min"), "breaths/min";
    BodyTemperature => "HKQuantityTypeIdentifierBodyTemperature", "Body Temperature", Vitals, to("degC"), "°C";
    BasalBodyTemperature => "HKQuantityTypeIdentifierBasalBodyTemperature", "Basal Body Temperature", Vitals, to("degC"), "°C";
    OxygenSaturation => "HKQuantityTypeIdentifierOxygenSaturation", "Oxygen Saturation", Vitals, PERCENT, "%";
    PeripheralPerfusionIndex => "HKQuantityTypeIdentifierPeripheralPerfusionIndex", "Peripheral Perfusion Index", Vitals, to("%"), "index";
    BodyMass => "HKQuantityTypeIdentifierBodyMass", "Body Weight", Vitals, to("kg"), "kg";
    BodyMassIndex => "HKQuantityTypeIdentifierBodyMassIndex", "Body Mass Index", Vitals, to("count"), "kg/m²";
    BodyFatPercentage => "HKQuantityTypeIdentifierBodyFatPercentage", "Body Fat Percentage", Vitals, PERCENT, "%";
    LeanBodyMass => "HKQuantityTypeIdentifierLeanBodyMass", "Lean Body Mass", Vitals, to("kg"), "kg";
    Height => "HKQuantityTypeIdentifierHeight", "Height", Vitals, to("m"), "m";
    WaistCircumference => "HKQuantityTypeIdentifierWaistCircumference", "Waist Circumference", Vitals, to("cm"), "cm";

    // Activity
    StepCount => "HKQuantityTypeIdentifierStepCount", "Step Count", Activity, to("count"), "steps";
    DistanceWalkingRunning => "HKQuantityTypeIdentifierDistanceWalkingRunning", "Walking + Running Distance", Activity, to("m"), "m";
    DistanceCycling => "HKQuantityTypeIdentifierDistanceCycling", "Cycling Distance", Activity, to("m"), "m";
    DistanceWheelchair => "HKQuantityTypeIdentifierDistanceWheelchair", "Wheelchair Distance", Activity, to("m"), "m";
    BasalEnergyBurned => "HKQuantityTypeIdentifierBasalEnergyBurned", "Basal Energy Burned", Activity, to("kcal"), "kcal";
    ActiveEnergyBurned => "HKQuantityTypeIdentifierActiveEnergyBurned", "Active Energy Burned", Activity, to("kcal"), "kcal";
    FlightsClimbed => "HKQuantityTypeIdentifierFlightsClimbed", "Flights Climbed", Activity, to("count"), "flights";
    NikeFuel => "HKQuantityTypeIdentifierNikeFuel", "NikeFuel", Activity, to("count"), "NikeFuel";
    AppleExerciseTime => "HKQuantityTypeIdentifierAppleExerciseTime", "Exercise Time", Activity, to("min"), "min";
    PushCount => "HKQuantityTypeIdentifierPushCount", "Push Count", Activity, to("count"), "pushes";
    DistanceSwimming => "HKQuantityTypeIdentifierDistanceSwimming", "Swimming Distance", Activity, to("m"), "m";
    SwimmingStrokeCount => "HKQuantityTypeIdentifierSwimmingStrokeCount", "Swimming Stroke Count", Activity, to("count"), "strokes";
    Vo2Max => "HKQuantityTypeIdentifierVO2Max", "VO₂ Max", Activity, to("mL/(kg*min)"), "mL/kg⋅min";
    DistanceDownhillSnowSports => "HKQuantityTypeIdentifierDistanceDownhillSnowSports", "Downhill Snow Sports Distance", Activity, to("m"), "m";

    // Nutrition
    DietaryEnergyConsumed => "HKQuantityTypeIdentifierDietaryEnergyConsumed", "Energy Consumed", Nutrition, to("kcal"), "kcal";
    DietaryWater => "HKQuantityTypeIdentifierDietaryWater", "Water", Nutrition, to("L"), "L";
    DietaryFatTotal => "HKQuantityTypeIdentifierDietaryFatTotal", "Total Fat", Nutrition, to("g"), "g";
    DietaryFatSaturated => "HKQuantityTypeIdentifierDietaryFatSaturated", "Saturated Fat", Nutrition, to("g"), "g";
    DietaryFatMonounsaturated => "HKQuantityTypeIdentifierDietaryFatMonounsaturated", "Monounsaturated Fat", Nutrition, to("g"), "g";
    DietaryFatPolyunsaturated => "HKQuantityTypeIdentifierDietaryFatPolyunsaturated", "Polyunsaturated Fat", Nutrition, to("g"), "g";
    DietaryCholesterol => "HKQuantityTypeIdentifierDietaryCholesterol", "Cholesterol", Nutrition, to("g"), "g";
    DietarySodium => "HKQuantityTypeIdentifierDietarySodium", "Sodium", Nutrition, to("g"), "g";
    DietaryCarbohydrates => "HKQuantityTypeIdentifierDietaryCarbohydrates", "Carbohydrates", Nutrition, to("g"), "g";
    DietaryFiber => "HKQuantityTypeIdentifierDietaryFiber", "Fiber", Nutrition, to("g"), "g";
    DietarySugar => "HKQuantityTypeIdentifierDietarySugar", "Sugar", Nutrition, to("g"), "g";
    DietaryProtein => "HKQuantityTypeIdentifierDietaryProtein", "Protein", Nutrition, to("g"), "g";
    DietaryVitaminA => "HKQuantityTypeIdentifierDietaryVitaminA", "Vitamin A", Nutrition, to("mg"), "mg";
    DietaryVitaminB6 => "HKQuantityTypeIdentifierDietaryVitaminB6", "Vitamin B6", Nutrition, to("mg"), "mg";
    DietaryVitaminB12 => "HKQuantityTypeIdentifierDietaryVitaminB12", "Vitamin B12", Nutrition, to("mg"), "mg";
    DietaryVitaminC => "HKQuantityTypeIdentifierDietaryVitaminC", "Vitamin C", Nutrition, to("mg"), "mg";
    DietaryVitaminD => "HKQuantityTypeIdentifierDietaryVitaminD", "Vitamin D", Nutrition, to("mg"), "mg";
    DietaryVitaminE => "HKQuantityTypeIdentifierDietaryVitaminE", "Vitamin E", Nutrition, to("mg"), "mg";
    DietaryVitaminK => "HKQuantityTypeIdentifierDietaryVitaminK", "Vitamin K", Nutrition, to("mg"), "mg";
    DietaryCalcium => "HKQuantityTypeIdentifierDietaryCalcium", "Calcium", Nutrition, to("mg"), "mg";
    DietaryIron => "HKQuantityTypeIdentifierDietaryIron", "Iron", Nutrition, to("mg"), "mg";
    DietaryThiamin => "HKQuantityTypeIdentifierDietaryThiamin", "Thiamin", Nutrition, to("mg"), "mg";
    DietaryRiboflavin => "HKQuantityTypeIdentifierDietaryRiboflavin", "Riboflavin", Nutrition, to("mg"), "mg";
    DietaryNiacin => "HKQuantityTypeIdentifierDietaryNiacin", "Niacin", Nutrition, to("mg"), "mg";
    DietaryFolate => "HKQuantityTypeIdentifierDietaryFolate", "Folate", Nutrition, to("mg"), "mg";
    DietaryBiotin => "HKQuantityTypeIdentifierDietaryBiotin", "Biotin", Nutrition, to("mg"), "mg";
    DietaryPantothenicAcid => "HKQuantityTypeIdentifierDietaryPantothenicAcid", "Pantothenic Acid", Nutrition, to("mg"), "mg";
    DietaryPhosphorus => "HKQuantityTypeIdentifierDietaryPhosphorus", "Phosphorus", Nutrition, to("mg"), "mg";
    DietaryIodine => "HKQuantityTypeIdentifierDietaryIodine", "Iodine", Nutrition, to("mg"), "mg";
    DietaryMagnesium => "HKQuantityTypeIdentifierDietaryMagnesium", "Magnesium", Nutrition, to("mg"), "mg";
    DietaryZinc => "HKQuantityTypeIdentifierDietaryZinc", "Zinc", Nutrition, to("mg"), "mg";
    DietarySelenium => "HKQuantityTypeIdentifierDietarySelenium", "Selenium", Nutrition, to("mg"), "mg";
    DietaryCopper => "HKQuantityTypeIdentifierDietaryCopper", "Copper", Nutrition, to("mg"), "mg";
    DietaryManganese => "HKQuantityTypeIdentifierDietaryManganese", "Manganese", Nutrition, to("mg"), "mg";
    DietaryChromium => "HKQuantityTypeIdentifierDietaryChromium", "Chromium", Nutrition, to("mg"), "mg";
    DietaryMolybdenum => "HKQuantityTypeIdentifierDietaryMolybdenum", "Molybdenum", Nutrition, to("mg"), "mg";
    DietaryChloride => "HKQuantityTypeIdentifierDietaryChloride", "Chloride", Nutrition, to("mg"), "mg";
    DietaryPotassium => "HKQuantityTypeIdentifierDietaryPotassium", "Potassium", Nutrition, to("mg"), "mg";
    DietaryCaffeine => "HKQuantityTypeIdentifierDietaryCaffeine", "Caffeine", Nutrition, to("mg"), "mg";

    // Lab results
    BloodGlucose => "HKQuantityTypeIdentifierBloodGlucose", "Blood Glucose", Lab, to("mg/dL"), "mg/dL";
    BloodAlcoholContent => "HKQuantityTypeIdentifierBloodAlcoholContent", "Blood Alcohol Content", Lab, PERCENT, "%";
    ForcedVitalCapacity => "HKQuantityTypeIdentifierForcedVitalCapacity", "Forced Vital Capacity", Lab, to("L"), "L";
    ForcedExpiratoryVolume1 => "HKQuantityTypeIdentifierForcedExpiratoryVolume1", "Forced Expiratory Volume", Lab, to("L"), "L";
    PeakExpiratoryFlowRate => "HKQuantityTypeIdentifierPeakExpiratoryFlowRate", "Peak Expiratory Flow Rate", Lab, to("L/min"), "L/min";
    ElectrodermalActivity => "HKQuantityTypeIdentifierElectrodermalActivity", "Electrodermal Activity", Lab, to("mcS"), "µS";
    InhalerUsage => "HKQuantityTypeIdentifierInhalerUsage", "Inhaler Usage", Lab, to("count"), "units";
    InsulinDelivery => "HKQuantityTypeIdentifierInsulinDelivery", "Insulin Delivery", Lab, to("IU"), "units";

    // Environment and other
    NumberOfTimesFallen => "HKQuantityTypeIdentifierNumberOfTimesFallen", "Number of Times Fallen", Other, to("count"), "count";
    EnvironmentalAudioExposure => "HKQuantityTypeIdentifierEnvironmentalAudioExposure", "Environmental Audio Exposure", Other, to("dBASPL"), "dB";
    HeadphoneAudioExposure => "HKQuantityTypeIdentifierHeadphoneAudioExposure", "Headphone Audio Exposure", Other, to("dBASPL"), "dB";
    UvExposure => "HKQuantityTypeIdentifierUVExposure", "UV Exposure", Other, to("count"), "index";
}

impl QuantityType {
    /// Look up a type by its platform identifier.
    pub fn from_identifier(identifier: &str) -> Option<QuantityType> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.identifier() == identifier)
    }
}
