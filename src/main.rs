use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fourthdown_dwp::config::{BuildConfig, DEFAULT_OUT_DIR, DEFAULT_RAW_DIR, SeasonSelector};
use fourthdown_dwp::live::{LiveInput, derive_live};
use fourthdown_dwp::pipeline;
use fourthdown_dwp::scoring::{Action, LinearScorer, recommend};

/// 4th-down decision states: historical training set and live requests
#[derive(Parser, Debug)]
#[command(name = "fourthdown_dwp")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the historical decision-state table from raw play-by-play files
    Build(BuildArgs),
    /// Derive the decision state for one hypothetical 4th down and optionally score it
    Recommend(RecommendArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Seasons to include: `2016-2024`, `2016..2025` or `2019,2021`
    #[arg(long, env = "FOURTHDOWN_SEASONS")]
    seasons: SeasonSelector,

    /// Directory holding pbp_*.parquet / pbp_*.csv files
    #[arg(long, env = "FOURTHDOWN_RAW_DIR", default_value = DEFAULT_RAW_DIR)]
    raw_dir: PathBuf,

    /// Directory receiving the states table and manifest
    #[arg(long, env = "FOURTHDOWN_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Also write an .xlsx copy of the table
    #[arg(long)]
    xlsx: bool,
}

#[derive(Args, Debug)]
struct RecommendArgs {
    /// Quarter (1-4, 5 for overtime)
    #[arg(long)]
    quarter: u8,

    /// Time left in the quarter, MM:SS
    #[arg(long, default_value = "12:00")]
    clock: String,

    /// Yards from the opponent goal line
    #[arg(long)]
    yardline: f64,

    #[arg(long)]
    ydstogo: f64,

    /// Offense score minus defense score
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    score_diff: f64,

    /// Offense receives the second-half kickoff
    #[arg(long)]
    receive_2h_ko: bool,

    #[arg(long, default_value_t = 3)]
    timeouts_off: u8,

    #[arg(long, default_value_t = 3)]
    timeouts_def: u8,

    #[arg(long)]
    roof: Option<String>,

    #[arg(long)]
    surface: Option<String>,

    /// Temperature in °F
    #[arg(long, allow_hyphen_values = true)]
    temp: Option<f64>,

    /// Wind in mph
    #[arg(long)]
    wind: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    spread: Option<f64>,

    /// Linear scorer artifact (JSON); without it only the features are printed
    #[arg(long, env = "FOURTHDOWN_MODEL")]
    model: Option<PathBuf>,
}

impl RecommendArgs {
    fn to_input(&self) -> LiveInput {
        LiveInput {
            quarter: self.quarter,
            clock: self.clock.clone(),
            yardline_100: self.yardline,
            yards_to_go: self.ydstogo,
            score_differential: self.score_diff,
            receive_2h_ko: self.receive_2h_ko,
            timeouts_off: self.timeouts_off,
            timeouts_def: self.timeouts_def,
            roof: self.roof.clone(),
            surface: self.surface.clone(),
            temperature: self.temp,
            wind: self.wind,
            spread_line: self.spread,
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => run_build(args),
        Command::Recommend(args) => run_recommend(&args),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fourthdown_dwp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_build(args: BuildArgs) -> Result<()> {
    let config = BuildConfig {
        seasons: args.seasons,
        raw_dir: args.raw_dir,
        out_dir: args.out_dir,
        workbook: args.xlsx,
    };
    let summary = pipeline::run(&config)?;
    let report = &summary.report;

    println!("Decision-state build complete");
    println!("Seasons: {}", config.seasons);
    println!("Files: {}", summary.files.len());
    println!(
        "Rows read: {} (outside seasons: {}, no season: {})",
        summary.rows_read, summary.rows_outside_seasons, summary.rows_without_season
    );
    println!(
        "Games: {} (no second-half receiver: {})",
        report.games, report.ambiguous_games
    );
    println!(
        "4th downs: {} qualifying, {} incomplete, {} excluded",
        report.qualifying,
        report.incomplete,
        report.excluded.len()
    );
    for item in report.excluded.iter().take(8) {
        println!(
            " - {} play {}: {}",
            item.game_id,
            item.play_id.map(|id| id.to_string()).unwrap_or_default(),
            item.reason
        );
    }
    println!(
        "Saved {} rows at {}",
        report.emitted,
        summary.states_path.display()
    );
    println!("sha256: {}", summary.digest);
    println!("Manifest: {}", summary.manifest_path.display());
    if let Some(path) = &summary.workbook_path {
        println!("Workbook: {}", path.display());
    }
    Ok(())
}

fn run_recommend(args: &RecommendArgs) -> Result<()> {
    let input = args.to_input();
    let Some(model_path) = &args.model else {
        let state = derive_live(&input)?;
        let json = serde_json::to_string_pretty(&state.features()).context("serialize features")?;
        println!("{json}");
        return Ok(());
    };

    let scorer = LinearScorer::load(model_path)?;
    let rec = recommend(&scorer, &input)?;
    let json = serde_json::to_string_pretty(&rec).context("serialize recommendation")?;
    println!("{json}");
    for action in Action::ALL {
        println!(
            "{:<11} {:>6.1}%",
            action.label(),
            rec.probabilities.get(action) * 100.0
        );
    }
    println!("Best choice: {}", rec.best.label());
    Ok(())
}
