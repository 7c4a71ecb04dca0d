use fourthdown_dwp::live::{LiveInput, LiveInputError, derive_live};
use fourthdown_dwp::pipeline::build;
use fourthdown_dwp::record::RawPlayRecord;
use fourthdown_dwp::schema::FEATURE_FIELDS;

fn live_input() -> LiveInput {
    LiveInput {
        quarter: 2,
        clock: "05:30".to_string(),
        yardline_100: 41.0,
        yards_to_go: 4.0,
        score_differential: -3.0,
        receive_2h_ko: true,
        timeouts_off: 2,
        timeouts_def: 1,
        roof: Some("Dome".to_string()),
        surface: Some("Turf".to_string()),
        temperature: Some(72.0),
        wind: None,
        spread_line: Some(-1.5),
    }
}

fn historical_game() -> Vec<RawPlayRecord> {
    let fourth_down = RawPlayRecord {
        season: Some(2023),
        game_id: "2023_10_DET_LAC".to_string(),
        play_id: Some(1500),
        quarter: Some(2.0),
        game_seconds_remaining: Some(2130.0),
        half_seconds_remaining: Some(330.0),
        yardline_100: Some(41.0),
        yards_to_go: Some(4.0),
        score_differential: Some(-3.0),
        down: Some(4.0),
        season_type: Some("REG".to_string()),
        posteam: Some("DET".to_string()),
        defteam: Some("LAC".to_string()),
        timeouts_off: Some(2.0),
        timeouts_def: Some(1.0),
        roof: Some("dome".to_string()),
        surface: Some("turf".to_string()),
        temperature: Some(72.0),
        spread_line: Some(-1.5),
        ..Default::default()
    };
    let second_half_snap = RawPlayRecord {
        play_id: Some(2100),
        quarter: Some(3.0),
        game_seconds_remaining: Some(1795.0),
        half_seconds_remaining: Some(1795.0),
        down: Some(1.0),
        yards_to_go: Some(10.0),
        ..fourth_down.clone()
    };
    vec![fourth_down, second_half_snap]
}

#[test]
fn live_and_batch_paths_agree() {
    let live = derive_live(&live_input()).unwrap();
    let output = build(&historical_game()).unwrap();
    assert_eq!(output.rows.len(), 1);
    let batch = &output.rows[0].state;

    assert_eq!(batch.receive_2h_ko, 1.0);
    assert_eq!(&live, batch);
    assert_eq!(live.features(), batch.features());
}

#[test]
fn live_clock_translation() {
    let live = derive_live(&live_input()).unwrap();
    assert_eq!(live.game_seconds_remaining, 2130.0);
    assert_eq!(live.half_seconds_remaining, 330.0);
    assert_eq!(live.wind, 0.0);

    let mut input = live_input();
    input.quarter = 5;
    input.clock = "08:00".to_string();
    let overtime = derive_live(&input).unwrap();
    assert_eq!(overtime.game_seconds_remaining, 480.0);
    assert_eq!(overtime.half_seconds_remaining, 480.0);
    assert_eq!(overtime.late_game, 1.0);
    assert_eq!(overtime.second_half, 1.0);
}

#[test]
fn live_input_is_validated() {
    let mut input = live_input();
    input.quarter = 0;
    assert_eq!(derive_live(&input), Err(LiveInputError::Quarter(0)));

    let mut input = live_input();
    input.clock = "5m".to_string();
    assert!(matches!(
        derive_live(&input),
        Err(LiveInputError::ClockFormat(_))
    ));

    let mut input = live_input();
    input.yardline_100 = 104.0;
    assert_eq!(derive_live(&input), Err(LiveInputError::Yardline(104.0)));

    let mut input = live_input();
    input.yards_to_go = 0.0;
    assert_eq!(derive_live(&input), Err(LiveInputError::YardsToGo(0.0)));

    let mut input = live_input();
    input.timeouts_def = 4;
    assert_eq!(
        derive_live(&input),
        Err(LiveInputError::Timeouts {
            side: "defense",
            value: 4
        })
    );

    let mut input = live_input();
    input.wind = Some(f64::INFINITY);
    assert_eq!(derive_live(&input), Err(LiveInputError::NotFinite("wind")));
}

#[test]
fn unknown_venue_passes_through() {
    let mut input = live_input();
    input.roof = Some("Retractable".to_string());
    input.surface = None;
    let state = derive_live(&input).unwrap();
    assert_eq!(state.roof, "retractable");
    assert_eq!(state.surface, "grass");
}

#[test]
fn second_half_request_never_carries_the_receiver_flag() {
    for quarter in [3u8, 4, 5] {
        let mut input = live_input();
        input.quarter = quarter;
        input.clock = "10:00".to_string();
        input.receive_2h_ko = true;
        let live = derive_live(&input).unwrap();
        assert_eq!(live.receive_2h_ko, 0.0, "quarter {quarter}");

        input.receive_2h_ko = false;
        let unflagged = derive_live(&input).unwrap();
        assert_eq!(live, unflagged);
    }
}

#[test]
fn second_half_live_matches_batch() {
    let mut game = historical_game();
    let first_half = game[0].clone();
    // the offense's own 3rd-quarter 4th down, after it took the first 2nd-half snap
    game.push(RawPlayRecord {
        play_id: Some(2400),
        quarter: Some(3.0),
        game_seconds_remaining: Some(1500.0),
        half_seconds_remaining: Some(1500.0),
        down: Some(4.0),
        yards_to_go: Some(4.0),
        ..first_half
    });
    let output = build(&game).unwrap();
    let batch = &output.rows.last().unwrap().state;
    assert_eq!(batch.receive_2h_ko, 0.0);

    let mut input = live_input();
    input.quarter = 3;
    input.clock = "10:00".to_string();
    let live = derive_live(&input).unwrap();
    for name in FEATURE_FIELDS {
        assert_eq!(live.get(name), batch.get(name), "{name}");
    }
}
