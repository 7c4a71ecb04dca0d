use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::RawPlayRecord;
use crate::schema::{
    FEATURE_FIELDS, FIELD_GOAL_RANGE_MAX_YD, FIELD_GOAL_SNAP_YARDS, LATE_GAME_SECS,
    ONE_SCORE_MARGIN, category_default, feature_position, numeric_default,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeriveError {
    #[error("missing core field `{field}`")]
    MissingCoreField { field: &'static str },
    #[error("core field `{field}` is not numeric")]
    NonNumericCoreField { field: &'static str },
}

impl DeriveError {
    pub fn field(&self) -> &'static str {
        match self {
            DeriveError::MissingCoreField { field } | DeriveError::NonNumericCoreField { field } => {
                field
            }
        }
    }
}

/// Model-facing view of a 4th-down situation.
///
/// Field declaration order matches `FEATURE_FIELDS`; flags are stored as 0.0/1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionState {
    pub quarter: f64,
    pub game_seconds_remaining: f64,
    pub half_seconds_remaining: f64,
    pub yardline_100: f64,
    pub yards_to_go: f64,
    pub score_differential: f64,
    pub receive_2h_ko: f64,
    pub timeouts_off: f64,
    pub timeouts_def: f64,
    pub timeouts_total: f64,
    pub timeouts_diff: f64,
    pub temperature: f64,
    pub wind: f64,
    pub spread_line: f64,
    pub field_goal_distance_yd: f64,
    pub in_field_goal_range: f64,
    pub one_score_game: f64,
    pub late_game: f64,
    pub second_half: f64,
    pub roof: String,
    pub surface: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            FeatureValue::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Number(_) => None,
            FeatureValue::Category(v) => Some(v),
        }
    }
}

/// Name-keyed features in canonical order; serializes as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap {
    entries: Vec<(&'static str, FeatureValue)>,
}

impl FeatureMap {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        let idx = feature_position(name)?;
        self.entries.get(idx).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeatureValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FeatureMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl DecisionState {
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        let number = match name {
            "quarter" => self.quarter,
            "game_seconds_remaining" => self.game_seconds_remaining,
            "half_seconds_remaining" => self.half_seconds_remaining,
            "yardline_100" => self.yardline_100,
            "yards_to_go" => self.yards_to_go,
            "score_differential" => self.score_differential,
            "receive_2h_ko" => self.receive_2h_ko,
            "timeouts_off" => self.timeouts_off,
            "timeouts_def" => self.timeouts_def,
            "timeouts_total" => self.timeouts_total,
            "timeouts_diff" => self.timeouts_diff,
            "temperature" => self.temperature,
            "wind" => self.wind,
            "spread_line" => self.spread_line,
            "field_goal_distance_yd" => self.field_goal_distance_yd,
            "in_field_goal_range" => self.in_field_goal_range,
            "one_score_game" => self.one_score_game,
            "late_game" => self.late_game,
            "second_half" => self.second_half,
            "roof" => return Some(FeatureValue::Category(self.roof.clone())),
            "surface" => return Some(FeatureValue::Category(self.surface.clone())),
            _ => return None,
        };
        Some(FeatureValue::Number(number))
    }

    pub fn features(&self) -> FeatureMap {
        let entries = FEATURE_FIELDS
            .iter()
            .filter_map(|name| self.get(name).map(|value| (*name, value)))
            .collect();
        FeatureMap { entries }
    }
}

/// Turns one raw play into its decision state.
///
/// Depends on nothing but its arguments, so the batch build and a live request produce
/// the same vector for the same play.
pub fn derive(record: &RawPlayRecord, receive_2h_ko: bool) -> Result<DecisionState, DeriveError> {
    let quarter = core("quarter", record.quarter)?;
    let game_seconds_remaining = core("game_seconds_remaining", record.game_seconds_remaining)?;
    let half_seconds_remaining = core("half_seconds_remaining", record.half_seconds_remaining)?;
    let yardline_100 = core("yardline_100", record.yardline_100)?;
    let yards_to_go = core("yards_to_go", record.yards_to_go)?;

    let score_differential = or_default("score_differential", record.score_differential);
    let timeouts_off = or_default("timeouts_off", record.timeouts_off);
    let timeouts_def = or_default("timeouts_def", record.timeouts_def);
    let field_goal_distance_yd = yardline_100 + FIELD_GOAL_SNAP_YARDS;

    Ok(DecisionState {
        quarter,
        game_seconds_remaining,
        half_seconds_remaining,
        yardline_100,
        yards_to_go,
        score_differential,
        receive_2h_ko: flag(receive_2h_ko),
        timeouts_off,
        timeouts_def,
        timeouts_total: timeouts_off + timeouts_def,
        timeouts_diff: timeouts_off - timeouts_def,
        temperature: or_default("temperature", record.temperature),
        wind: or_default("wind", record.wind),
        spread_line: or_default("spread_line", record.spread_line),
        field_goal_distance_yd,
        in_field_goal_range: flag(field_goal_distance_yd <= FIELD_GOAL_RANGE_MAX_YD),
        one_score_game: flag(score_differential.abs() <= ONE_SCORE_MARGIN),
        late_game: flag(game_seconds_remaining < LATE_GAME_SECS),
        second_half: flag(quarter > 2.0),
        roof: normalize_category("roof", record.roof.as_deref()),
        surface: normalize_category("surface", record.surface.as_deref()),
    })
}

/// Lower-cases a venue category, substituting the table default when absent.
/// Unknown values are kept as-is.
pub fn normalize_category(feature: &str, raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value.to_lowercase(),
        None => category_default(feature).unwrap_or_default().to_string(),
    }
}

fn core(field: &'static str, value: Option<f64>) -> Result<f64, DeriveError> {
    match value {
        None => Err(DeriveError::MissingCoreField { field }),
        Some(v) if !v.is_finite() => Err(DeriveError::NonNumericCoreField { field }),
        Some(v) => Ok(v),
    }
}

fn or_default(feature: &str, value: Option<f64>) -> f64 {
    value
        .filter(|v| v.is_finite())
        .or_else(|| numeric_default(feature))
        .unwrap_or(0.0)
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
