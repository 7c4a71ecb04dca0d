use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use fourthdown_dwp::derive::derive;
use fourthdown_dwp::export::render_states_csv;
use fourthdown_dwp::ingest::parse_csv_plays;
use fourthdown_dwp::live::{LiveInput, derive_live};
use fourthdown_dwp::pipeline::build;
use fourthdown_dwp::receiver::GameReceiverIndex;
use fourthdown_dwp::record::RawPlayRecord;
use fourthdown_dwp::schema::RAW_COLUMNS;
use fourthdown_dwp::table::{format_number, push_row_line};

const TEAMS: [&str; 8] = ["BUF", "MIA", "NE", "NYJ", "KC", "LV", "LAC", "DEN"];
const ROOFS: [&str; 4] = ["outdoors", "dome", "closed", "open"];

// Roughly a season's worth of play-by-play: 272 games, ~160 plays each.
fn synthetic_corpus(games: usize, plays_per_game: usize) -> Vec<RawPlayRecord> {
    let mut rng = StdRng::seed_from_u64(26);
    let mut records = Vec::with_capacity(games * plays_per_game);
    for game in 0..games {
        let home = TEAMS[game % TEAMS.len()];
        let away = TEAMS[(game + 3) % TEAMS.len()];
        let roof = ROOFS[rng.gen_range(0..ROOFS.len())];
        for idx in 0..plays_per_game {
            let elapsed = 3600.0 * idx as f64 / plays_per_game as f64;
            let game_secs = (3600.0 - elapsed).round();
            let quarter = (elapsed / 900.0).floor() + 1.0;
            let half_secs = if quarter <= 2.0 {
                game_secs - 1800.0
            } else {
                game_secs
            };
            let (posteam, defteam) = if rng.gen_bool(0.5) {
                (home, away)
            } else {
                (away, home)
            };
            let down = if rng.gen_bool(0.05) {
                None
            } else {
                Some(f64::from(rng.gen_range(1..=4i32)))
            };
            records.push(RawPlayRecord {
                season: Some(2023),
                game_id: format!("2023_{game:03}_{away}_{home}"),
                play_id: Some(idx as i64),
                week: Some((game / 16) as i32 + 1),
                quarter: Some(quarter.min(4.0)),
                game_seconds_remaining: Some(game_secs),
                half_seconds_remaining: Some(half_secs),
                yardline_100: Some(f64::from(rng.gen_range(1..=99i32))),
                yards_to_go: Some(f64::from(rng.gen_range(1..=15i32))),
                score_differential: Some(f64::from(rng.gen_range(-21..=21i32))),
                down,
                season_type: Some("REG".to_string()),
                posteam: Some(posteam.to_string()),
                defteam: Some(defteam.to_string()),
                home_team: Some(home.to_string()),
                away_team: Some(away.to_string()),
                timeouts_off: Some(f64::from(rng.gen_range(0..=3i32))),
                timeouts_def: Some(f64::from(rng.gen_range(0..=3i32))),
                roof: Some(roof.to_string()),
                surface: Some("grass".to_string()),
                temperature: rng.gen_bool(0.8).then(|| f64::from(rng.gen_range(10..=95i32))),
                wind: rng.gen_bool(0.8).then(|| f64::from(rng.gen_range(0..=25i32))),
                spread_line: Some(f64::from(rng.gen_range(-14..=14i32)) / 2.0),
                ..Default::default()
            });
        }
    }
    records
}

fn corpus_csv(records: &[RawPlayRecord]) -> String {
    let mut out = String::new();
    push_row_line(&mut out, &RAW_COLUMNS);
    let num = |v: Option<f64>| v.map(format_number).unwrap_or_else(|| "NA".to_string());
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "NA".to_string());
    for r in records {
        let cells = vec![
            r.season.map(|s| s.to_string()).unwrap_or_default(),
            r.game_id.clone(),
            r.play_id.map(|p| p.to_string()).unwrap_or_default(),
            num(r.quarter),
            num(r.game_seconds_remaining),
            num(r.half_seconds_remaining),
            num(r.yardline_100),
            num(r.yards_to_go),
            num(r.score_differential),
            text(&r.posteam),
            text(&r.defteam),
            text(&r.home_team),
            text(&r.away_team),
            r.week.map(|w| w.to_string()).unwrap_or_default(),
            num(r.timeouts_off),
            num(r.timeouts_def),
            text(&r.roof),
            text(&r.surface),
            num(r.temperature),
            num(r.wind),
            num(r.spread_line),
            num(r.down),
            text(&r.play_type),
            text(&r.season_type),
        ];
        push_row_line(&mut out, &cells);
    }
    out
}

fn bench_derive(c: &mut Criterion) {
    let records = synthetic_corpus(1, 200);
    let record = records
        .iter()
        .find(|r| r.down == Some(4.0))
        .cloned()
        .unwrap_or_else(|| records[0].clone());
    c.bench_function("derive_single", |b| {
        b.iter(|| {
            let state = derive(black_box(&record), black_box(true)).unwrap();
            black_box(state.field_goal_distance_yd);
        })
    });
}

fn bench_live(c: &mut Criterion) {
    let input = LiveInput {
        quarter: 4,
        clock: "03:12".to_string(),
        yardline_100: 34.0,
        yards_to_go: 2.0,
        score_differential: -3.0,
        receive_2h_ko: false,
        timeouts_off: 2,
        timeouts_def: 1,
        roof: Some("Dome".to_string()),
        surface: None,
        temperature: None,
        wind: None,
        spread_line: Some(-2.5),
    };
    c.bench_function("derive_live", |b| {
        b.iter(|| {
            let state = derive_live(black_box(&input)).unwrap();
            black_box(state.features().len());
        })
    });
}

fn bench_receiver_index(c: &mut Criterion) {
    let records = synthetic_corpus(272, 160);
    c.bench_function("receiver_index_season", |b| {
        b.iter(|| {
            let index = GameReceiverIndex::build(black_box(&records));
            black_box(index.resolved_games());
        })
    });
}

fn bench_pipeline_build(c: &mut Criterion) {
    let records = synthetic_corpus(272, 160);
    c.bench_function("pipeline_build_season", |b| {
        b.iter(|| {
            let output = build(black_box(&records)).unwrap();
            black_box(output.rows.len());
        })
    });
}

fn bench_csv_round(c: &mut Criterion) {
    let records = synthetic_corpus(64, 160);
    let raw = corpus_csv(&records);
    let rows = build(&records).unwrap().rows;
    c.bench_function("parse_csv_plays", |b| {
        b.iter(|| {
            let parsed = parse_csv_plays(black_box(&raw)).unwrap();
            black_box(parsed.len());
        })
    });
    c.bench_function("render_states_csv", |b| {
        b.iter(|| {
            let body = render_states_csv(black_box(&rows));
            black_box(body.len());
        })
    });
}

criterion_group!(
    benches,
    bench_derive,
    bench_live,
    bench_receiver_index,
    bench_pipeline_build,
    bench_csv_round
);
criterion_main!(benches);
