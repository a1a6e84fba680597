// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Garmin activity table schema.
//!
//! The feed table has a fixed, ordered set of columns. Every column is
//! described once here: the raw Garmin field it comes from, the display
//! name stored in MySQL, the property name exposed over OData, its EDM
//! type, and the unit conversion applied during the transform.

/// Raw table holding activities as fetched (nested values JSON-encoded).
pub const INGESTED_ACTIVITIES_TABLE: &str = "ingested_garmin_connect_activities";

/// Transformed table consumed by the activity feed.
pub const ACTIVITIES_TABLE: &str = "garmin_connect_activities";

/// Raw columns that hold JSON-encoded objects or lists.
pub const JSON_COLUMNS: [&str; 8] = [
    "activityType",
    "eventType",
    "privacy",
    "userRoles",
    "summarizedDiveInfo",
    "splitSummaries",
    "summarizedExerciseSets",
    "unitOfPoolLength",
];

/// Column holding the per-activity exercise set list.
pub const EXERCISE_SETS_COLUMN: &str = "summarizedExerciseSets";

/// Source field used as the unique row key.
pub const KEY_COLUMN: &str = "startTimeLocal";

/// Fixed timestamps of the two chart-anchoring placeholder rows.
pub const PLACEHOLDER_START_TIMES: [&str; 2] =
    ["2022-01-03T00:00:00.000Z", "2025-12-30T00:00:00.000Z"];

/// Activity type carried by the placeholder rows.
pub const PLACEHOLDER_ACTIVITY_TYPE: &str = "Running";

/// EDM property type advertised in the metadata document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdmType {
    String,
    Double,
}

impl EdmType {
    pub fn as_str(self) -> &'static str {
        match self {
            EdmType::String => "Edm.String",
            EdmType::Double => "Edm.Double",
        }
    }
}

/// Conversion applied to a raw field before projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    None,
    /// Seconds → `H:MM:SS[.ffffff]`, missing treated as zero.
    ElapsedTime,
    /// Meters → miles.
    MetersToMiles,
    /// Celsius → Fahrenheit.
    CelsiusToFahrenheit,
    /// `{typeKey}` → title-cased words.
    TypeKeyTitle,
    /// `{typeKey}` → the key as-is.
    TypeKey,
}

/// One column of the activity feed table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    /// Field name in the raw (or flattened) activity.
    pub source: &'static str,
    /// Column name in the persisted table.
    pub display: &'static str,
    /// Property name exposed over OData.
    pub odata: &'static str,
    pub edm: EdmType,
    pub conversion: Conversion,
}

const fn col(
    source: &'static str,
    display: &'static str,
    odata: &'static str,
    edm: EdmType,
    conversion: Conversion,
) -> ColumnSpec {
    ColumnSpec {
        source,
        display,
        odata,
        edm,
        conversion,
    }
}

use Conversion as C;
use EdmType::{Double as D, String as S};

/// The activity feed schema, in output order.
pub const ACTIVITY_COLUMNS: [ColumnSpec; 58] = [
    col("activityType", "Activity Type", "ActivityType", S, C::TypeKeyTitle),
    col("activityName", "Activity Name", "ActivityName", S, C::None),
    col("locationName", "Location Name", "LocationName", S, C::None),
    col("description", "Description", "Description", S, C::None),
    col("startTimeLocal", "Date", "Date", S, C::None),
    col("distance", "Distance (miles)", "DistanceMiles", D, C::MetersToMiles),
    col("duration", "Duration (HH:MM:SS.sss)", "Duration", S, C::ElapsedTime),
    col(
        "elapsedDuration",
        "Elapsed Duration (H:MM:SS.sss)",
        "ElapsedDuration",
        S,
        C::ElapsedTime,
    ),
    col(
        "movingDuration",
        "Moving Duration (HH:MM:SS.sss)",
        "MovingDuration",
        S,
        C::ElapsedTime,
    ),
    col("elevationGain", "Elevation Gain - meters", "ElevationGainMeters", D, C::None),
    col("elevationLoss", "Elevation Loss - meters", "ElevationLossMeters", D, C::None),
    col("averageSpeed", "Average Speed", "AverageSpeed", D, C::None),
    col("maxSpeed", "Max Speed", "MaxSpeed", D, C::None),
    col("calories", "Calories", "Calories", D, C::None),
    col("bmrCalories", "BMR Calories", "BMRCalories", D, C::None),
    col("averageHR", "Average HR", "AverageHR", D, C::None),
    col("maxHR", "Max HR", "MaxHR", D, C::None),
    col(
        "averageRunningCadenceInStepsPerMinute",
        "Average Running Cadence In Steps Per Minute",
        "AverageRunningCadenceInStepsPerMinute",
        D,
        C::None,
    ),
    col(
        "maxRunningCadenceInStepsPerMinute",
        "Max Running Cadence In Steps Per Minute",
        "MaxRunningCadenceInStepsPerMinute",
        D,
        C::None,
    ),
    col("steps", "Steps", "Steps", D, C::None),
    col("privacy", "Privacy Setting", "PrivacySetting", S, C::TypeKey),
    col("aerobicTrainingEffect", "Aerobic Training Effect", "AerobicTrainingEffect", D, C::None),
    col(
        "anaerobicTrainingEffect",
        "Anaerobic Training Effect",
        "AnaerobicTrainingEffect",
        D,
        C::None,
    ),
    col("avgStrideLength", "Avg Stride Length", "AvgStrideLength", D, C::None),
    col("minTemperature", "Min Temperature", "MinTemperature", D, C::CelsiusToFahrenheit),
    col("maxTemperature", "Max Temperature", "MaxTemperature", D, C::CelsiusToFahrenheit),
    col("minElevation", "Min Elevation", "MinElevation", D, C::None),
    col("maxElevation", "Max Elevation", "MaxElevation", D, C::None),
    col("maxDoubleCadence", "Max Double Cadence", "MaxDoubleCadence", D, C::None),
    col("maxVerticalSpeed", "Max Vertical Speed", "MaxVerticalSpeed", D, C::None),
    col("lapCount", "Lap Count", "LapCount", D, C::None),
    col("waterEstimated", "Water Estimated", "WaterEstimated", D, C::None),
    col("trainingEffectLabel", "Training Effect Label", "TrainingEffectLabel", S, C::None),
    col("activityTrainingLoad", "Activity Training Load", "ActivityTrainingLoad", D, C::None),
    col(
        "minActivityLapDuration",
        "Min Activity Lap Duration",
        "MinActivityLapDuration",
        D,
        C::None,
    ),
    col(
        "aerobicTrainingEffectMessage",
        "Aerobic Training Effect Message",
        "AerobicTrainingEffectMessage",
        S,
        C::None,
    ),
    col(
        "anaerobicTrainingEffectMessage",
        "Anaerobic Training Effect Message",
        "AnaerobicTrainingEffectMessage",
        S,
        C::None,
    ),
    col(
        "moderateIntensityMinutes",
        "Moderate Intensity Minutes",
        "ModerateIntensityMinutes",
        D,
        C::None,
    ),
    col(
        "vigorousIntensityMinutes",
        "Vigorous Intensity Minutes",
        "VigorousIntensityMinutes",
        D,
        C::None,
    ),
    col("fastestSplit_1000", "Fastest Split 1000", "FastestSplit1000", D, C::None),
    col("pr", "PR", "PR", S, C::None),
    col("manualActivity", "Manual Activity", "ManualActivity", S, C::None),
    col("vO2MaxValue", "VO2 Max Value", "VO2MaxValue", D, C::None),
    col("reps", "Reps", "Reps", D, C::None),
    col("volume", "Volume", "Volume", D, C::None),
    col("sets", "Sets", "Sets", D, C::None),
    col("avg_weight_per_rep", "Avg Weight Per Rep", "AvgWeightPerRep", D, C::None),
    col("avgVerticalSpeed", "Avg Vertical Speed", "AvgVerticalSpeed", D, C::None),
    col("caloriesConsumed", "Calories Consumed", "CaloriesConsumed", D, C::None),
    col("waterConsumed", "Water Consumed", "WaterConsumed", D, C::None),
    col("minRespirationRate", "Min Respiration Rate", "MinRespirationRate", D, C::None),
    col("maxRespirationRate", "Max Respiration Rate", "MaxRespirationRate", D, C::None),
    col("avgRespirationRate", "Avg Respiration Rate", "AvgRespirationRate", D, C::None),
    col("avgStress", "Avg Stress", "AvgStress", D, C::None),
    col("startStress", "Start Stress", "StartStress", D, C::None),
    col("endStress", "End Stress", "EndStress", D, C::None),
    col("differenceStress", "Difference Stress", "DifferenceStress", D, C::None),
    col("maxStress", "Max Stress", "MaxStress", D, C::None),
];

/// Columns produced by flattening the first exercise set; always present
/// after the transform even when no activity carried sets.
pub const EXERCISE_SET_COLUMNS: [&str; 4] = ["reps", "volume", "sets", "avg_weight_per_rep"];

/// Display column names, in table order.
pub fn display_columns() -> Vec<&'static str> {
    ACTIVITY_COLUMNS.iter().map(|c| c.display).collect()
}

/// Look up the OData property name for a persisted column.
pub fn odata_name_for_display(display: &str) -> Option<&'static str> {
    ACTIVITY_COLUMNS
        .iter()
        .find(|c| c.display == display)
        .map(|c| c.odata)
}
