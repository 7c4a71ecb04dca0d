use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_RAW_DIR: &str = "data/raw";
pub const DEFAULT_OUT_DIR: &str = "data/interim";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeasonSelectorError {
    #[error("season selector is empty")]
    Empty,
    #[error("invalid season `{0}`")]
    InvalidSeason(String),
    #[error("season range {start}..{end} selects nothing")]
    EmptyRange { start: i32, end: i32 },
}

/// Which seasons a batch run covers: `2016-2024`, `2016..2025` or `2019,2021 2023`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeasonSelector {
    Closed { start: i32, end: i32 },
    HalfOpen { start: i32, end: i32 },
    List { seasons: Vec<i32> },
}

impl SeasonSelector {
    pub fn contains(&self, season: i32) -> bool {
        match self {
            SeasonSelector::Closed { start, end } => (*start..=*end).contains(&season),
            SeasonSelector::HalfOpen { start, end } => (*start..*end).contains(&season),
            SeasonSelector::List { seasons } => seasons.contains(&season),
        }
    }

    pub fn seasons(&self) -> Vec<i32> {
        match self {
            SeasonSelector::Closed { start, end } => (*start..=*end).collect(),
            SeasonSelector::HalfOpen { start, end } => (*start..*end).collect(),
            SeasonSelector::List { seasons } => seasons.clone(),
        }
    }
}

impl FromStr for SeasonSelector {
    type Err = SeasonSelectorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(SeasonSelectorError::Empty);
        }
        if let Some((a, b)) = text.split_once("..") {
            let (start, end) = (parse_season(a)?, parse_season(b)?);
            if start >= end {
                return Err(SeasonSelectorError::EmptyRange { start, end });
            }
            return Ok(SeasonSelector::HalfOpen { start, end });
        }
        if let Some((a, b)) = text.split_once('-') {
            let (start, end) = (parse_season(a)?, parse_season(b)?);
            if start > end {
                return Err(SeasonSelectorError::EmptyRange { start, end });
            }
            return Ok(SeasonSelector::Closed { start, end });
        }

        let mut seasons = Vec::new();
        for part in text.split([',', ';', ' ', '\t']).filter(|p| !p.is_empty()) {
            let season = parse_season(part)?;
            if !seasons.contains(&season) {
                seasons.push(season);
            }
        }
        if seasons.is_empty() {
            return Err(SeasonSelectorError::Empty);
        }
        Ok(SeasonSelector::List { seasons })
    }
}

impl fmt::Display for SeasonSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonSelector::Closed { start, end } => write!(f, "{start}-{end}"),
            SeasonSelector::HalfOpen { start, end } => write!(f, "{start}..{end}"),
            SeasonSelector::List { seasons } => {
                let parts = seasons.iter().map(|s| s.to_string()).collect::<Vec<_>>();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

fn parse_season(raw: &str) -> Result<i32, SeasonSelectorError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| SeasonSelectorError::InvalidSeason(raw.trim().to_string()))
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub seasons: SeasonSelector,
    pub raw_dir: PathBuf,
    pub out_dir: PathBuf,
    pub workbook: bool,
}

impl BuildConfig {
    pub fn new(seasons: SeasonSelector) -> Self {
        Self {
            seasons,
            raw_dir: PathBuf::from(DEFAULT_RAW_DIR),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            workbook: false,
        }
    }
}
