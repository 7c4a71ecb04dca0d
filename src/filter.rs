use crate::record::RawPlayRecord;
use crate::schema::SeasonType;

pub const DECISION_DOWN: f64 = 4.0;

/// A raw record with its resolved second-half receiver flag attached.
#[derive(Debug, Clone, Copy)]
pub struct FlaggedRecord<'a> {
    pub record: &'a RawPlayRecord,
    pub receive_2h_ko: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Qualifies,
    NotDecisionPoint,
    Incomplete,
}

#[derive(Debug, Default)]
pub struct Selection<'a> {
    pub kept: Vec<FlaggedRecord<'a>>,
    pub not_decision_points: usize,
    pub incomplete: usize,
}

pub fn is_decision_point(record: &RawPlayRecord) -> bool {
    let fourth_down = record.down == Some(DECISION_DOWN);
    let competitive = record
        .season_type
        .as_deref()
        .is_some_and(|code| SeasonType::from_code(code).is_competitive());
    fourth_down && competitive
}

pub fn has_required_fields(record: &RawPlayRecord) -> bool {
    record.yardline_100.is_some()
        && record.yards_to_go.is_some()
        && record.quarter.is_some()
        && record.game_seconds_remaining.is_some()
}

pub fn classify(record: &RawPlayRecord) -> FilterOutcome {
    if !is_decision_point(record) {
        FilterOutcome::NotDecisionPoint
    } else if !has_required_fields(record) {
        FilterOutcome::Incomplete
    } else {
        FilterOutcome::Qualifies
    }
}

/// Keeps 4th-down plays from regular and post season games, in input order.
pub fn select_decision_points<'a, I>(records: I) -> Selection<'a>
where
    I: IntoIterator<Item = FlaggedRecord<'a>>,
{
    let mut selection = Selection::default();
    for flagged in records {
        match classify(flagged.record) {
            FilterOutcome::Qualifies => selection.kept.push(flagged),
            FilterOutcome::NotDecisionPoint => selection.not_decision_points += 1,
            FilterOutcome::Incomplete => selection.incomplete += 1,
        }
    }
    selection
}
