use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::record::RawPlayRecord;

/// Finalized game id -> second-half kickoff receiver table.
///
/// Built in one pass over the whole corpus before any row is derived; there is no way to
/// add to it afterwards.
#[derive(Debug, Clone, Default)]
pub struct GameReceiverIndex {
    receivers: HashMap<String, String>,
    unresolved: BTreeSet<String>,
}

impl GameReceiverIndex {
    pub fn build(records: &[RawPlayRecord]) -> Self {
        let mut games: BTreeMap<&str, Vec<&RawPlayRecord>> = BTreeMap::new();
        for record in records {
            games.entry(record.game_id.as_str()).or_default().push(record);
        }

        let resolved = games
            .into_par_iter()
            .map(|(game_id, plays)| (game_id, resolve_receiver(&plays)))
            .collect::<Vec<_>>();

        let mut receivers = HashMap::with_capacity(resolved.len());
        let mut unresolved = BTreeSet::new();
        for (game_id, receiver) in resolved {
            match receiver {
                Some(team) => {
                    receivers.insert(game_id.to_string(), team.to_string());
                }
                None => {
                    unresolved.insert(game_id.to_string());
                }
            }
        }

        if !unresolved.is_empty() {
            warn!(
                games = unresolved.len(),
                "no second-half receiver resolvable; receive_2h_ko defaults to false"
            );
            for game_id in &unresolved {
                debug!(game_id = %game_id, "ambiguous second-half receiver");
            }
        }

        Self {
            receivers,
            unresolved,
        }
    }

    pub fn receiver(&self, game_id: &str) -> Option<&str> {
        self.receivers.get(game_id).map(String::as_str)
    }

    pub fn receives_second_half_kickoff(&self, record: &RawPlayRecord) -> bool {
        receive_2h_ko(record, self.receiver(&record.game_id))
    }

    pub fn resolved_games(&self) -> usize {
        self.receivers.len()
    }

    pub fn unresolved_games(&self) -> impl Iterator<Item = &str> {
        self.unresolved.iter().map(String::as_str)
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }
}

/// Possession team of the first scrimmage play at quarter 3 or later.
///
/// Plays are ordered by quarter ascending then game clock descending; ties keep their
/// input order. A candidate without a possession team is skipped in favour of the next.
pub fn resolve_receiver<'a>(plays: &[&'a RawPlayRecord]) -> Option<&'a str> {
    let mut candidates = plays
        .iter()
        .copied()
        .filter(|p| p.is_scrimmage() && p.quarter_value().is_some_and(|q| q >= 3.0))
        .collect::<Vec<_>>();
    candidates.sort_by(|a, b| chronological(a, b));
    candidates.into_iter().find_map(|p| p.possession())
}

/// Only first-half plays carry the expectation; second-half plays are always false.
pub fn receive_2h_ko(record: &RawPlayRecord, receiver: Option<&str>) -> bool {
    match (receiver, record.possession()) {
        (Some(receiver), Some(posteam)) => in_first_half(record) && posteam == receiver,
        _ => false,
    }
}

/// Quarters 1 and 2. A record without a quarter is not in the first half.
pub fn in_first_half(record: &RawPlayRecord) -> bool {
    record.quarter_value().is_some_and(|q| q <= 2.0)
}

fn chronological(a: &RawPlayRecord, b: &RawPlayRecord) -> Ordering {
    let qa = a.quarter_value().unwrap_or(f64::INFINITY);
    let qb = b.quarter_value().unwrap_or(f64::INFINITY);
    qa.total_cmp(&qb)
        .then_with(|| clock_descending(a.game_seconds_remaining, b.game_seconds_remaining))
}

// Missing clocks sort last.
fn clock_descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.filter(|v| v.is_finite());
    let b = b.filter(|v| v.is_finite());
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
