use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const FIELD_GOAL_SNAP_YARDS: f64 = 17.0;
pub const FIELD_GOAL_RANGE_MAX_YD: f64 = 60.0;
pub const ONE_SCORE_MARGIN: f64 = 8.0;
pub const LATE_GAME_SECS: f64 = 600.0;
pub const QUARTER_SECS: u32 = 900;
pub const OVERTIME_QUARTER: u8 = 5;

/// Source columns kept from the play-by-play feed, in load order.
pub const RAW_COLUMNS: [&str; 24] = [
    "season",
    "game_id",
    "play_id",
    "qtr",
    "game_seconds_remaining",
    "half_seconds_remaining",
    "yardline_100",
    "ydstogo",
    "score_differential",
    "posteam",
    "defteam",
    "home_team",
    "away_team",
    "week",
    "posteam_timeouts_remaining",
    "defteam_timeouts_remaining",
    "roof",
    "surface",
    "temp",
    "wind",
    "spread_line",
    "down",
    "play_type",
    "season_type",
];

/// A raw file without one of these cannot feed the pipeline at all.
pub const REQUIRED_RAW_COLUMNS: [&str; 10] = [
    "season",
    "game_id",
    "qtr",
    "down",
    "season_type",
    "posteam",
    "yardline_100",
    "ydstogo",
    "game_seconds_remaining",
    "half_seconds_remaining",
];

pub const PROVENANCE_COLUMNS: [&str; 9] = [
    "season",
    "game_id",
    "play_id",
    "week",
    "season_type",
    "posteam",
    "defteam",
    "home_team",
    "away_team",
];

/// Canonical feature order shared by the batch output and the live feature map.
pub const FEATURE_FIELDS: [&str; 21] = [
    "quarter",
    "game_seconds_remaining",
    "half_seconds_remaining",
    "yardline_100",
    "yards_to_go",
    "score_differential",
    "receive_2h_ko",
    "timeouts_off",
    "timeouts_def",
    "timeouts_total",
    "timeouts_diff",
    "temperature",
    "wind",
    "spread_line",
    "field_goal_distance_yd",
    "in_field_goal_range",
    "one_score_game",
    "late_game",
    "second_half",
    "roof",
    "surface",
];

pub const CATEGORICAL_FEATURES: [&str; 2] = ["roof", "surface"];

pub const ROOF_OPTIONS: [&str; 4] = ["outdoors", "dome", "closed", "open"];
pub const SURFACE_OPTIONS: [&str; 2] = ["grass", "turf"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    /// No sensible default: derivation fails when the value is absent.
    Required,
    Number(f64),
    Category(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldPolicy {
    pub feature: &'static str,
    pub source: &'static str,
    pub fallback: Fallback,
}

/// Missing-value policy for every feature read straight from a raw record.
///
/// Computed features are absent here on purpose; they inherit whatever their
/// inputs resolved to.
pub static FIELD_POLICIES: [FieldPolicy; 13] = [
    FieldPolicy {
        feature: "quarter",
        source: "qtr",
        fallback: Fallback::Required,
    },
    FieldPolicy {
        feature: "game_seconds_remaining",
        source: "game_seconds_remaining",
        fallback: Fallback::Required,
    },
    FieldPolicy {
        feature: "half_seconds_remaining",
        source: "half_seconds_remaining",
        fallback: Fallback::Required,
    },
    FieldPolicy {
        feature: "yardline_100",
        source: "yardline_100",
        fallback: Fallback::Required,
    },
    FieldPolicy {
        feature: "yards_to_go",
        source: "ydstogo",
        fallback: Fallback::Required,
    },
    FieldPolicy {
        feature: "score_differential",
        source: "score_differential",
        fallback: Fallback::Number(0.0),
    },
    FieldPolicy {
        feature: "timeouts_off",
        source: "posteam_timeouts_remaining",
        fallback: Fallback::Number(3.0),
    },
    FieldPolicy {
        feature: "timeouts_def",
        source: "defteam_timeouts_remaining",
        fallback: Fallback::Number(3.0),
    },
    FieldPolicy {
        feature: "temperature",
        source: "temp",
        fallback: Fallback::Number(70.0),
    },
    FieldPolicy {
        feature: "wind",
        source: "wind",
        fallback: Fallback::Number(0.0),
    },
    FieldPolicy {
        feature: "spread_line",
        source: "spread_line",
        fallback: Fallback::Number(0.0),
    },
    FieldPolicy {
        feature: "roof",
        source: "roof",
        fallback: Fallback::Category("outdoors"),
    },
    FieldPolicy {
        feature: "surface",
        source: "surface",
        fallback: Fallback::Category("grass"),
    },
];

static FEATURE_POSITIONS: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    FEATURE_FIELDS
        .iter()
        .enumerate()
        .map(|(idx, name)| (*name, idx))
        .collect()
});

pub fn feature_position(name: &str) -> Option<usize> {
    FEATURE_POSITIONS.get(name).copied()
}

pub fn raw_column_index(name: &str) -> Option<usize> {
    RAW_COLUMNS.iter().position(|c| *c == name)
}

pub fn policy(feature: &str) -> Option<&'static FieldPolicy> {
    FIELD_POLICIES.iter().find(|p| p.feature == feature)
}

pub fn numeric_default(feature: &str) -> Option<f64> {
    match policy(feature)?.fallback {
        Fallback::Number(v) => Some(v),
        _ => None,
    }
}

pub fn category_default(feature: &str) -> Option<&'static str> {
    match policy(feature)?.fallback {
        Fallback::Category(v) => Some(v),
        _ => None,
    }
}

pub fn is_required(feature: &str) -> bool {
    policy(feature).is_some_and(|p| p.fallback == Fallback::Required)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonType {
    Regular,
    Post,
    Pre,
    Other,
}

impl SeasonType {
    pub fn from_code(raw: &str) -> Self {
        let code = raw.trim();
        if code.eq_ignore_ascii_case("REG") {
            SeasonType::Regular
        } else if code.eq_ignore_ascii_case("POST") {
            SeasonType::Post
        } else if code.eq_ignore_ascii_case("PRE") {
            SeasonType::Pre
        } else {
            SeasonType::Other
        }
    }

    pub fn is_competitive(self) -> bool {
        matches!(self, SeasonType::Regular | SeasonType::Post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_policy_names_a_feature_and_a_raw_column() {
        for p in &FIELD_POLICIES {
            assert!(feature_position(p.feature).is_some(), "{}", p.feature);
            assert!(raw_column_index(p.source).is_some(), "{}", p.source);
        }
    }

    #[test]
    fn required_fields_are_the_geometry_and_clock_fields() {
        let required = FIELD_POLICIES
            .iter()
            .filter(|p| p.fallback == Fallback::Required)
            .map(|p| p.feature)
            .collect::<Vec<_>>();
        assert_eq!(
            required,
            vec![
                "quarter",
                "game_seconds_remaining",
                "half_seconds_remaining",
                "yardline_100",
                "yards_to_go"
            ]
        );
    }

    #[test]
    fn categorical_defaults() {
        assert_eq!(category_default("roof"), Some("outdoors"));
        assert_eq!(category_default("surface"), Some("grass"));
        assert_eq!(category_default("wind"), None);
        assert_eq!(numeric_default("wind"), Some(0.0));
        assert!(is_required("yardline_100"));
        assert!(!is_required("temperature"));
    }

    #[test]
    fn season_type_codes() {
        assert!(SeasonType::from_code("REG").is_competitive());
        assert!(SeasonType::from_code(" post ").is_competitive());
        assert!(!SeasonType::from_code("PRE").is_competitive());
        assert_eq!(SeasonType::from_code("EXH"), SeasonType::Other);
    }
}
