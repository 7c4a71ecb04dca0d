use std::path::PathBuf;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::derive::{DecisionState, DeriveError, derive};
use crate::export::{self, RunManifest};
use crate::filter::{FlaggedRecord, select_decision_points};
use crate::ingest;
use crate::receiver::GameReceiverIndex;
use crate::record::RawPlayRecord;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no qualifying input: {0}")]
    NoQualifyingInput(String),
}

/// Identifying metadata carried next to a decision state, never fed to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub season: Option<i32>,
    pub game_id: String,
    pub play_id: Option<i64>,
    pub week: Option<i32>,
    pub season_type: Option<String>,
    pub posteam: Option<String>,
    pub defteam: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
}

impl Provenance {
    pub fn from_record(record: &RawPlayRecord) -> Self {
        Self {
            season: record.season,
            game_id: record.game_id.clone(),
            play_id: record.play_id,
            week: record.week,
            season_type: record.season_type.clone(),
            posteam: record.posteam.clone(),
            defteam: record.defteam.clone(),
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateRow {
    pub provenance: Provenance,
    pub state: DecisionState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedRecord {
    pub game_id: String,
    pub play_id: Option<i64>,
    pub field: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub raw_records: usize,
    pub games: usize,
    pub resolved_games: usize,
    pub ambiguous_games: usize,
    pub not_decision_points: usize,
    pub incomplete: usize,
    pub qualifying: usize,
    pub emitted: usize,
    pub excluded: Vec<ExcludedRecord>,
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub rows: Vec<StateRow>,
    pub report: BuildReport,
}

#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub states_path: PathBuf,
    pub manifest_path: PathBuf,
    pub workbook_path: Option<PathBuf>,
    pub files: Vec<PathBuf>,
    pub rows_read: usize,
    pub rows_outside_seasons: usize,
    pub rows_without_season: usize,
    pub report: BuildReport,
    pub digest: String,
}

/// Turns a raw corpus into decision states.
///
/// The receiver index is finished before the first row is derived. Rows come back in
/// input order no matter how rayon schedules the derivation.
pub fn build(records: &[RawPlayRecord]) -> Result<BuildOutput, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::NoQualifyingInput(
            "corpus contains no plays".to_string(),
        ));
    }

    let index = GameReceiverIndex::build(records);
    let selection = select_decision_points(records.iter().map(|record| FlaggedRecord {
        record,
        receive_2h_ko: index.receives_second_half_kickoff(record),
    }));

    let derived = selection
        .kept
        .par_iter()
        .map(|flagged| (flagged.record, derive(flagged.record, flagged.receive_2h_ko)))
        .collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(derived.len());
    let mut excluded = Vec::new();
    for (record, result) in derived {
        match result {
            Ok(state) => rows.push(StateRow {
                provenance: Provenance::from_record(record),
                state,
            }),
            Err(err) => {
                warn!(play = %record.label(), error = %err, "excluding play");
                excluded.push(excluded_record(record, err));
            }
        }
    }

    let report = BuildReport {
        raw_records: records.len(),
        games: index.resolved_games() + index.unresolved_count(),
        resolved_games: index.resolved_games(),
        ambiguous_games: index.unresolved_count(),
        not_decision_points: selection.not_decision_points,
        incomplete: selection.incomplete,
        qualifying: selection.kept.len(),
        emitted: rows.len(),
        excluded,
    };

    if rows.is_empty() {
        return Err(PipelineError::NoQualifyingInput(format!(
            "none of {} plays produced a decision state",
            records.len()
        )));
    }
    Ok(BuildOutput { rows, report })
}

/// Loads the configured corpus, builds decision states and persists them.
pub fn run(config: &BuildConfig) -> Result<BuildSummary> {
    info!(seasons = %config.seasons, raw_dir = %config.raw_dir.display(), "starting build");
    let files = ingest::discover_raw_files(&config.raw_dir)?;
    let corpus = ingest::load_corpus(&files, &config.seasons)?;
    if corpus.records.is_empty() {
        return Err(PipelineError::NoQualifyingInput(format!(
            "{} rows read, none in seasons {} ({} outside, {} without a season)",
            corpus.rows_read,
            config.seasons,
            corpus.rows_outside_seasons,
            corpus.rows_without_season
        ))
        .into());
    }
    let output = build(&corpus.records)?;

    let states_path = config.out_dir.join(export::STATES_FILE);
    let digest = export::write_states_csv(&states_path, &output.rows)?;

    let workbook_path = if config.workbook {
        let path = config.out_dir.join(export::WORKBOOK_FILE);
        export::write_workbook(&path, &output.rows, &output.report)?;
        Some(path)
    } else {
        None
    };

    let manifest = RunManifest::new(
        &config.seasons,
        &corpus,
        &output.report,
        &states_path,
        &digest,
    );
    let manifest_path = config.out_dir.join(export::MANIFEST_FILE);
    export::write_manifest(&manifest_path, &manifest).context("write run manifest")?;

    info!(
        rows = output.report.emitted,
        excluded = output.report.excluded.len(),
        path = %states_path.display(),
        "saved decision states"
    );

    Ok(BuildSummary {
        states_path,
        manifest_path,
        workbook_path,
        files: corpus.files,
        rows_read: corpus.rows_read,
        rows_outside_seasons: corpus.rows_outside_seasons,
        rows_without_season: corpus.rows_without_season,
        report: output.report,
        digest,
    })
}

fn excluded_record(record: &RawPlayRecord, err: DeriveError) -> ExcludedRecord {
    ExcludedRecord {
        game_id: record.game_id.clone(),
        play_id: record.play_id,
        field: err.field(),
        reason: err.to_string(),
    }
}
