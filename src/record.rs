use serde::{Deserialize, Serialize};

use crate::schema::raw_column_index;

/// A single cell as read from a raw table, before any casting.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Null,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Text that does not parse as a number comes back as NaN so the deriver can tell
    /// "present but not numeric" apart from "absent".
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Null => None,
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                Some(trimmed.parse::<f64>().unwrap_or(f64::NAN))
            }
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        let v = self.as_number()?;
        if !v.is_finite() {
            return None;
        }
        Some(v.round() as i64)
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Number(v) if v.is_finite() => Some(v.to_string()),
            Cell::Number(_) => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

/// One observed play, as delivered by the play-by-play feed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawPlayRecord {
    pub season: Option<i32>,
    pub game_id: String,
    pub play_id: Option<i64>,
    pub quarter: Option<f64>,
    pub game_seconds_remaining: Option<f64>,
    pub half_seconds_remaining: Option<f64>,
    pub yardline_100: Option<f64>,
    pub yards_to_go: Option<f64>,
    pub score_differential: Option<f64>,
    pub down: Option<f64>,
    pub play_type: Option<String>,
    pub season_type: Option<String>,
    pub posteam: Option<String>,
    pub defteam: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub week: Option<i32>,
    pub timeouts_off: Option<f64>,
    pub timeouts_def: Option<f64>,
    pub roof: Option<String>,
    pub surface: Option<String>,
    pub temperature: Option<f64>,
    pub wind: Option<f64>,
    pub spread_line: Option<f64>,
}

impl RawPlayRecord {
    /// Builds a record from cells laid out in `RAW_COLUMNS` order.
    pub fn from_row(cells: &[Cell]) -> Self {
        let get = |name: &str| raw_column_index(name).and_then(|idx| cells.get(idx));
        let num = |name: &str| get(name).and_then(Cell::as_number);
        let int = |name: &str| get(name).and_then(Cell::as_int);
        let text = |name: &str| get(name).and_then(Cell::as_text);

        Self {
            season: int("season").and_then(|v| i32::try_from(v).ok()),
            game_id: text("game_id").unwrap_or_default(),
            play_id: int("play_id"),
            quarter: num("qtr"),
            game_seconds_remaining: num("game_seconds_remaining"),
            half_seconds_remaining: num("half_seconds_remaining"),
            yardline_100: num("yardline_100"),
            yards_to_go: num("ydstogo"),
            score_differential: num("score_differential"),
            down: num("down"),
            play_type: text("play_type"),
            season_type: text("season_type"),
            posteam: text("posteam"),
            defteam: text("defteam"),
            home_team: text("home_team"),
            away_team: text("away_team"),
            week: int("week").and_then(|v| i32::try_from(v).ok()),
            timeouts_off: num("posteam_timeouts_remaining"),
            timeouts_def: num("defteam_timeouts_remaining"),
            roof: text("roof"),
            surface: text("surface"),
            temperature: num("temp"),
            wind: num("wind"),
            spread_line: num("spread_line"),
        }
    }

    /// Scrimmage plays carry a down; kickoffs, timeouts and the like do not.
    pub fn is_scrimmage(&self) -> bool {
        self.down.is_some_and(f64::is_finite)
    }

    pub fn quarter_value(&self) -> Option<f64> {
        self.quarter.filter(|q| q.is_finite())
    }

    pub fn possession(&self) -> Option<&str> {
        self.posteam.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn label(&self) -> String {
        match self.play_id {
            Some(play_id) => format!("{}#{play_id}", self.game_id),
            None => format!("{}#?", self.game_id),
        }
    }
}
