use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use parquet::schema::types::{Type, TypePtr};
use tracing::{debug, info, warn};

use crate::config::SeasonSelector;
use crate::pipeline::PipelineError;
use crate::record::{Cell, RawPlayRecord};
use crate::schema::{RAW_COLUMNS, REQUIRED_RAW_COLUMNS, raw_column_index};
use crate::table;

pub const RAW_FILE_PREFIX: &str = "pbp_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFormat {
    Parquet,
    Csv,
}

impl RawFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "parquet" => Some(RawFormat::Parquet),
            "csv" => Some(RawFormat::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub files: Vec<PathBuf>,
    pub records: Vec<RawPlayRecord>,
    pub rows_read: usize,
    pub rows_outside_seasons: usize,
    /// Rows dropped because their `season` cell was empty.
    pub rows_without_season: usize,
}

/// Raw play-by-play files (`pbp_*.parquet` / `pbp_*.csv`) in `dir`, sorted by path.
pub fn discover_raw_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read raw directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("list raw directory {}", dir.display()))?
            .path();
        let is_raw = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(RAW_FILE_PREFIX));
        if is_raw && path.is_file() && RawFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads every file and concatenates the rows in file order, keeping the selected seasons.
pub fn load_corpus(files: &[PathBuf], seasons: &SeasonSelector) -> Result<Corpus> {
    if files.is_empty() {
        return Err(PipelineError::NoQualifyingInput(
            "no raw play-by-play files found; run the acquisition step first".to_string(),
        )
        .into());
    }

    let mut corpus = Corpus {
        files: files.to_vec(),
        ..Default::default()
    };
    for path in files {
        let records = read_raw_file(path)?;
        let total = records.len();
        corpus.rows_read += total;
        let (mut kept, mut outside, mut unknown) = (0usize, 0usize, 0usize);
        for record in records {
            match record.season {
                Some(season) if seasons.contains(season) => {
                    corpus.records.push(record);
                    kept += 1;
                }
                Some(_) => outside += 1,
                None => unknown += 1,
            }
        }
        corpus.rows_outside_seasons += outside;
        corpus.rows_without_season += unknown;
        if unknown > 0 {
            warn!(file = %path.display(), rows = unknown, "dropping plays without a season");
        }
        info!(file = %path.display(), rows = total, kept, "loaded raw plays");
    }
    Ok(corpus)
}

pub fn read_raw_file(path: &Path) -> Result<Vec<RawPlayRecord>> {
    match RawFormat::from_path(path) {
        Some(RawFormat::Parquet) => read_parquet(path),
        Some(RawFormat::Csv) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            parse_csv_plays(&raw).with_context(|| format!("parse {}", path.display()))
        }
        None => Err(anyhow!("unsupported raw file type: {}", path.display())),
    }
}

pub fn parse_csv_plays(raw: &str) -> Result<Vec<RawPlayRecord>> {
    let mut rows = table::parse_rows(raw)?.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let header = header.iter().map(|h| h.trim()).collect::<Vec<_>>();
    check_required_columns(|name| header.contains(&name))?;

    // header position -> RAW_COLUMNS position
    let mapping = header
        .iter()
        .map(|name| raw_column_index(name))
        .collect::<Vec<_>>();

    let mut out = Vec::new();
    for row in rows {
        let mut cells = vec![Cell::Null; RAW_COLUMNS.len()];
        for (value, target) in row.into_iter().zip(&mapping) {
            let Some(idx) = target else {
                continue;
            };
            cells[*idx] = csv_cell(value);
        }
        out.push(RawPlayRecord::from_row(&cells));
    }
    Ok(out)
}

fn csv_cell(value: String) -> Cell {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "NA" {
        Cell::Null
    } else {
        Cell::Text(value)
    }
}

fn read_parquet(path: &Path) -> Result<Vec<RawPlayRecord>> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("open parquet reader {}", path.display()))?;

    let schema = reader.metadata().file_metadata().schema();
    let kept: Vec<TypePtr> = schema
        .get_fields()
        .iter()
        .filter(|f| RAW_COLUMNS.contains(&f.name()))
        .cloned()
        .collect();
    check_required_columns(|name| kept.iter().any(|f| f.name() == name))
        .with_context(|| format!("schema of {}", path.display()))?;
    let projection = Type::group_type_builder(schema.name())
        .with_fields(kept)
        .build()
        .context("build parquet projection")?;

    let iter = reader
        .get_row_iter(Some(projection))
        .with_context(|| format!("iterate rows of {}", path.display()))?;
    let mut out = Vec::new();
    for (idx, row) in iter.enumerate() {
        let row = row.with_context(|| format!("decode row {idx} of {}", path.display()))?;
        let mut cells = vec![Cell::Null; RAW_COLUMNS.len()];
        for (name, field) in row.get_column_iter() {
            if let Some(col) = raw_column_index(name) {
                cells[col] = parquet_cell(field);
            }
        }
        out.push(RawPlayRecord::from_row(&cells));
    }
    debug!(file = %path.display(), rows = out.len(), "decoded parquet");
    Ok(out)
}

fn parquet_cell(field: &Field) -> Cell {
    match field {
        Field::Null => Cell::Null,
        Field::Bool(v) => Cell::Number(if *v { 1.0 } else { 0.0 }),
        Field::Byte(v) => Cell::Number(f64::from(*v)),
        Field::Short(v) => Cell::Number(f64::from(*v)),
        Field::Int(v) => Cell::Number(f64::from(*v)),
        Field::Long(v) => Cell::Number(*v as f64),
        Field::UByte(v) => Cell::Number(f64::from(*v)),
        Field::UShort(v) => Cell::Number(f64::from(*v)),
        Field::UInt(v) => Cell::Number(f64::from(*v)),
        Field::ULong(v) => Cell::Number(*v as f64),
        Field::Float(v) => Cell::Number(f64::from(*v)),
        Field::Double(v) => Cell::Number(*v),
        Field::Str(s) => Cell::Text(s.clone()),
        _ => Cell::Null,
    }
}

fn check_required_columns(has: impl Fn(&str) -> bool) -> Result<()> {
    let missing = REQUIRED_RAW_COLUMNS
        .iter()
        .copied()
        .filter(|name| !has(name))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("missing required columns: {}", missing.join(", ")))
    }
}
