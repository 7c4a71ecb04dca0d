use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::SeasonSelector;
use crate::derive::FeatureValue;
use crate::ingest::Corpus;
use crate::pipeline::{BuildReport, Provenance, StateRow};
use crate::schema::{FEATURE_FIELDS, PROVENANCE_COLUMNS};
use crate::table::{format_number, push_row_line};

pub const STATES_FILE: &str = "fourthdown_states.csv";
pub const MANIFEST_FILE: &str = "fourthdown_states.manifest.json";
pub const WORKBOOK_FILE: &str = "fourthdown_states.xlsx";
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub version: u32,
    pub generated_at: String,
    pub seasons: SeasonSelector,
    pub source_files: Vec<String>,
    pub rows_read: usize,
    pub rows_outside_seasons: usize,
    pub rows_without_season: usize,
    pub raw_records: usize,
    pub games: usize,
    pub ambiguous_games: usize,
    pub qualifying: usize,
    pub incomplete: usize,
    pub excluded: usize,
    pub emitted: usize,
    pub states_file: String,
    pub states_sha256: String,
    pub columns: Vec<&'static str>,
}

impl RunManifest {
    pub fn new(
        seasons: &SeasonSelector,
        corpus: &Corpus,
        report: &BuildReport,
        states_path: &Path,
        digest: &str,
    ) -> Self {
        Self {
            version: MANIFEST_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            seasons: seasons.clone(),
            source_files: corpus
                .files
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            rows_read: corpus.rows_read,
            rows_outside_seasons: corpus.rows_outside_seasons,
            rows_without_season: corpus.rows_without_season,
            raw_records: report.raw_records,
            games: report.games,
            ambiguous_games: report.ambiguous_games,
            qualifying: report.qualifying,
            incomplete: report.incomplete,
            excluded: report.excluded.len(),
            emitted: report.emitted,
            states_file: states_path.display().to_string(),
            states_sha256: digest.to_string(),
            columns: output_columns(),
        }
    }
}

pub fn output_columns() -> Vec<&'static str> {
    PROVENANCE_COLUMNS
        .iter()
        .chain(FEATURE_FIELDS.iter())
        .copied()
        .collect()
}

pub fn render_states_csv(rows: &[StateRow]) -> String {
    let mut out = String::new();
    push_row_line(&mut out, &output_columns());
    for row in rows {
        push_row_line(&mut out, &state_row_cells(row));
    }
    out
}

/// Writes the states table and returns the SHA-256 of its bytes.
pub fn write_states_csv(path: &Path, rows: &[StateRow]) -> Result<String> {
    let body = render_states_csv(rows);
    write_atomic(path, body.as_bytes())?;
    Ok(sha256_hex(body.as_bytes()))
}

pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest).context("serialize manifest")?;
    write_atomic(path, json.as_bytes())
}

pub fn write_workbook(path: &Path, rows: &[StateRow], report: &BuildReport) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("States")?;
        write_states_sheet(sheet, rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        let summary = [
            ("raw_records", report.raw_records),
            ("games", report.games),
            ("ambiguous_games", report.ambiguous_games),
            ("not_decision_points", report.not_decision_points),
            ("incomplete", report.incomplete),
            ("qualifying", report.qualifying),
            ("excluded", report.excluded.len()),
            ("emitted", report.emitted),
        ];
        for (idx, (label, count)) in summary.iter().enumerate() {
            sheet
                .write_string(idx as u32, 0, *label)
                .with_context(|| format!("write summary label {label}"))?;
            sheet
                .write_number(idx as u32, 1, *count as f64)
                .with_context(|| format!("write summary count {label}"))?;
        }
    }

    let bytes = workbook
        .save_to_buffer()
        .with_context(|| format!("failed rendering workbook for {}", path.display()))?;
    write_atomic(path, &bytes)
}

fn write_states_sheet(sheet: &mut Worksheet, rows: &[StateRow]) -> Result<()> {
    for (col, name) in output_columns().iter().enumerate() {
        sheet
            .write_string(0, col as u16, *name)
            .with_context(|| format!("write header {name}"))?;
    }
    let provenance_width = PROVENANCE_COLUMNS.len();
    for (idx, row) in rows.iter().enumerate() {
        let row_idx = (idx + 1) as u32;
        for (col, value) in provenance_cells(&row.provenance).iter().enumerate() {
            sheet
                .write_string(row_idx, col as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col})"))?;
        }
        for (offset, (_, value)) in row.state.features().iter().enumerate() {
            let col = (provenance_width + offset) as u16;
            let written = match value {
                FeatureValue::Number(v) => sheet.write_number(row_idx, col, *v),
                FeatureValue::Category(v) => sheet.write_string(row_idx, col, v),
            };
            written.with_context(|| format!("write cell ({row_idx},{col})"))?;
        }
    }
    Ok(())
}

fn state_row_cells(row: &StateRow) -> Vec<String> {
    let mut cells = provenance_cells(&row.provenance);
    cells.extend(row.state.features().iter().map(|(_, value)| match value {
        FeatureValue::Number(v) => format_number(*v),
        FeatureValue::Category(v) => v.clone(),
    }));
    cells
}

fn provenance_cells(p: &Provenance) -> Vec<String> {
    vec![
        opt_to_string(p.season),
        p.game_id.clone(),
        opt_to_string(p.play_id),
        opt_to_string(p.week),
        p.season_type.clone().unwrap_or_default(),
        p.posteam.clone().unwrap_or_default(),
        p.defteam.clone().unwrap_or_default(),
        p.home_team.clone().unwrap_or_default(),
        p.away_team.clone().unwrap_or_default(),
    ]
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename into {}", path.display()))?;
    Ok(())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
