use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::derive::{DecisionState, DeriveError, derive};
use crate::receiver::in_first_half;
use crate::record::RawPlayRecord;
use crate::schema::{OVERTIME_QUARTER, QUARTER_SECS, ROOF_OPTIONS, SURFACE_OPTIONS};

pub const LIVE_GAME_ID: &str = "live";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiveInputError {
    #[error("quarter must be 1-4 or 5 for overtime, got {0}")]
    Quarter(u8),
    #[error("clock must look like MM:SS, got `{0}`")]
    ClockFormat(String),
    #[error("clock {0}s exceeds a 15:00 quarter")]
    ClockRange(u32),
    #[error("yardline_100 must be within 0-100, got {0}")]
    Yardline(f64),
    #[error("yards_to_go must be at least 1, got {0}")]
    YardsToGo(f64),
    #[error("{side} timeouts must be within 0-3, got {value}")]
    Timeouts { side: &'static str, value: u8 },
    #[error("`{0}` must be a finite number")]
    NotFinite(&'static str),
    #[error(transparent)]
    Derive(#[from] DeriveError),
}

/// A hypothetical decision point as entered by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveInput {
    pub quarter: u8,
    /// Time left in the quarter, `MM:SS`.
    pub clock: String,
    pub yardline_100: f64,
    pub yards_to_go: f64,
    pub score_differential: f64,
    /// Offense receives the second-half kickoff; ignored from the 3rd quarter on.
    pub receive_2h_ko: bool,
    pub timeouts_off: u8,
    pub timeouts_def: u8,
    #[serde(default)]
    pub roof: Option<String>,
    #[serde(default)]
    pub surface: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub wind: Option<f64>,
    #[serde(default)]
    pub spread_line: Option<f64>,
}

impl LiveInput {
    /// Builds the single raw record the batch pipeline would have seen for this situation.
    pub fn to_record(&self) -> Result<RawPlayRecord, LiveInputError> {
        if !(1..=OVERTIME_QUARTER).contains(&self.quarter) {
            return Err(LiveInputError::Quarter(self.quarter));
        }
        let clock = parse_clock(&self.clock)?;
        finite("yardline_100", self.yardline_100)?;
        finite("yards_to_go", self.yards_to_go)?;
        finite("score_differential", self.score_differential)?;
        if !(0.0..=100.0).contains(&self.yardline_100) {
            return Err(LiveInputError::Yardline(self.yardline_100));
        }
        if self.yards_to_go < 1.0 {
            return Err(LiveInputError::YardsToGo(self.yards_to_go));
        }
        check_timeouts("offense", self.timeouts_off)?;
        check_timeouts("defense", self.timeouts_def)?;
        for (name, value) in [
            ("temperature", self.temperature),
            ("wind", self.wind),
            ("spread_line", self.spread_line),
        ] {
            if let Some(v) = value {
                finite(name, v)?;
            }
        }
        note_unseen("roof", self.roof.as_deref(), &ROOF_OPTIONS);
        note_unseen("surface", self.surface.as_deref(), &SURFACE_OPTIONS);

        let (game_seconds, half_seconds) = remaining_seconds(self.quarter, clock);
        Ok(RawPlayRecord {
            game_id: LIVE_GAME_ID.to_string(),
            quarter: Some(f64::from(self.quarter)),
            game_seconds_remaining: Some(f64::from(game_seconds)),
            half_seconds_remaining: Some(f64::from(half_seconds)),
            yardline_100: Some(self.yardline_100),
            yards_to_go: Some(self.yards_to_go),
            score_differential: Some(self.score_differential),
            down: Some(4.0),
            season_type: Some("REG".to_string()),
            timeouts_off: Some(f64::from(self.timeouts_off)),
            timeouts_def: Some(f64::from(self.timeouts_def)),
            roof: self.roof.clone(),
            surface: self.surface.clone(),
            temperature: self.temperature,
            wind: self.wind,
            spread_line: self.spread_line,
            ..Default::default()
        })
    }
}

/// Derives the decision state for a live request through the shared deriver.
///
/// The receiver flag only applies in the first half, exactly as in the batch build; a
/// second-half request with the flag set derives `receive_2h_ko = 0`.
pub fn derive_live(input: &LiveInput) -> Result<DecisionState, LiveInputError> {
    let record = input.to_record()?;
    let receive_2h_ko = input.receive_2h_ko && in_first_half(&record);
    Ok(derive(&record, receive_2h_ko)?)
}

/// Parses `MM:SS` into seconds left in the quarter.
pub fn parse_clock(raw: &str) -> Result<u32, LiveInputError> {
    let bad = || LiveInputError::ClockFormat(raw.to_string());
    let (mins, secs) = raw.trim().split_once(':').ok_or_else(bad)?;
    let mins = mins.trim().parse::<u32>().map_err(|_| bad())?;
    let secs = secs.trim().parse::<u32>().map_err(|_| bad())?;
    if secs >= 60 {
        return Err(bad());
    }
    let total = mins.saturating_mul(60).saturating_add(secs);
    if total > QUARTER_SECS {
        return Err(LiveInputError::ClockRange(total));
    }
    Ok(total)
}

/// Game and half clocks implied by the quarter and the time left in it.
///
/// Overtime has no later quarters, so both clocks equal the time left in the period.
pub fn remaining_seconds(quarter: u8, clock: u32) -> (u32, u32) {
    if quarter >= OVERTIME_QUARTER {
        return (clock, clock);
    }
    let quarter = u32::from(quarter);
    let half_end = if quarter <= 2 { 2 } else { 4 };
    let game = (4 - quarter) * QUARTER_SECS + clock;
    let half = (half_end - quarter) * QUARTER_SECS + clock;
    (game, half)
}

fn finite(name: &'static str, value: f64) -> Result<(), LiveInputError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LiveInputError::NotFinite(name))
    }
}

fn check_timeouts(side: &'static str, value: u8) -> Result<(), LiveInputError> {
    if value > 3 {
        return Err(LiveInputError::Timeouts { side, value });
    }
    Ok(())
}

fn note_unseen(feature: &str, raw: Option<&str>, known: &[&str]) {
    let Some(value) = raw.map(|v| v.trim().to_lowercase()) else {
        return;
    };
    if !value.is_empty() && !known.contains(&value.as_str()) {
        debug!(feature, value = %value, "category not seen in training data");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock() {
        assert_eq!(parse_clock("12:00"), Ok(720));
        assert_eq!(parse_clock(" 0:07 "), Ok(7));
        assert_eq!(parse_clock("15:00"), Ok(900));
        assert_eq!(parse_clock("15:01"), Err(LiveInputError::ClockRange(901)));
        assert!(matches!(
            parse_clock("7:75"),
            Err(LiveInputError::ClockFormat(_))
        ));
        assert!(matches!(
            parse_clock("twelve"),
            Err(LiveInputError::ClockFormat(_))
        ));
    }

    #[test]
    fn clocks_follow_quarter() {
        assert_eq!(remaining_seconds(1, 720), (3420, 1620));
        assert_eq!(remaining_seconds(2, 330), (2130, 330));
        assert_eq!(remaining_seconds(3, 900), (1800, 1800));
        assert_eq!(remaining_seconds(4, 45), (45, 45));
        assert_eq!(remaining_seconds(5, 300), (300, 300));
    }
}
