use chrono::Utc;
use matchday_backend::config::SettlementConfig;
use matchday_backend::models::{GroupRules, MatchState, Prediction};
use matchday_backend::scoring::{
    score_prediction, FixtureScores, KoRoundMode, PointsAward, PredictionMode, ScorePair,
    ScoringRules,
};
use matchday_backend::services::compute_standings;
use uuid::Uuid;

fn default_rules() -> ScoringRules {
    ScoringRules {
        mode: PredictionMode::CorrectScore,
        ko_mode: KoRoundMode::FullTime,
        points_exact: 4,
        points_difference: 3,
        points_outcome: 2,
    }
}

fn finished_full_time(home: i32, away: i32) -> FixtureScores {
    FixtureScores {
        finished: true,
        full_time: Some(ScorePair::new(home, away)),
        ..FixtureScores::default()
    }
}

/// Unit tests for the scoring cascade
#[test]
fn test_scoring_tier_cascade_order() {
    let rules = default_rules();
    let actual = finished_full_time(2, 1);

    // Exact score
    let exact = score_prediction("2:1", &actual, &rules);
    assert_eq!(exact.points, 4);
    assert!(exact.exact_hit && exact.tendency_hit);

    // Same goal difference, different score
    let diff = score_prediction("3:2", &actual, &rules);
    assert_eq!(diff.points, 3);
    assert!(!diff.exact_hit && diff.tendency_hit);

    // Same outcome, different difference
    let outcome = score_prediction("1:0", &actual, &rules);
    assert_eq!(outcome.points, 2);
    assert!(!outcome.exact_hit && outcome.tendency_hit);

    // Complete miss
    assert_eq!(score_prediction("0:2", &actual, &rules), PointsAward::zero());
}

#[test]
fn test_scoring_extra_time_fallback_matches_full_time() {
    // Fixture without overtime: ExtraTime rules must score like FullTime
    let actual = finished_full_time(2, 1);
    let extra_time_rules = ScoringRules {
        ko_mode: KoRoundMode::ExtraTime,
        ..default_rules()
    };
    for guess in ["2:1", "3:2", "1:0", "0:2"] {
        assert_eq!(
            score_prediction(guess, &actual, &extra_time_rules),
            score_prediction(guess, &actual, &default_rules()),
            "guess {}",
            guess
        );
    }
}

#[test]
fn test_scoring_penalties_shootout_decides_winner() {
    let rules = ScoringRules {
        ko_mode: KoRoundMode::Penalties,
        ..default_rules()
    };
    let scores = FixtureScores {
        finished: true,
        full_time: Some(ScorePair::new(1, 1)),
        extra_time: Some(ScorePair::new(1, 1)),
        penalties: Some(ScorePair::new(4, 3)),
        ..FixtureScores::default()
    };

    // Home won on penalties: home-win guesses earn outcome points
    assert_eq!(score_prediction("1:0", &scores, &rules).points, 2);
    // A guessed draw scores zero
    assert_eq!(score_prediction("1:1", &scores, &rules), PointsAward::zero());
}

/// Unit tests for rules row accessors
#[test]
fn test_unknown_ko_mode_degrades_to_full_time() {
    let row = GroupRules {
        group_id: Uuid::new_v4(),
        mode: "correct_score".to_string(),
        ko_mode: "golden_goal".to_string(),
        points_exact: 4,
        points_difference: 3,
        points_outcome: 2,
        created_at: Utc::now().naive_utc(),
    };

    assert_eq!(row.ko_mode_enum(), KoRoundMode::FullTime);

    // The degraded rules score exactly like a full-time group
    let award = score_prediction("2:1", &finished_full_time(2, 1), &row.scoring_rules());
    assert_eq!(award.points, 4);
    assert!(award.exact_hit);
}

#[test]
fn test_unknown_prediction_mode_degrades_to_correct_score() {
    let row = GroupRules {
        group_id: Uuid::new_v4(),
        mode: "lottery".to_string(),
        ko_mode: "full_time".to_string(),
        points_exact: 4,
        points_difference: 3,
        points_outcome: 2,
        created_at: Utc::now().naive_utc(),
    };

    assert_eq!(row.mode_enum(), PredictionMode::CorrectScore);
}

/// Unit tests for match state transitions
#[test]
fn test_terminal_match_states() {
    assert!(MatchState::Finished.is_terminal());
    assert!(MatchState::Cancelled.is_terminal());
    assert!(MatchState::Interrupted.is_terminal());
    assert!(!MatchState::Scheduled.is_terminal());
    assert!(!MatchState::InPlay.is_terminal());
}

/// Unit tests for standings computation
#[test]
fn test_standings_competition_ranking_with_ties() {
    let alice = (Uuid::new_v4(), "alice".to_string());
    let charlie = (Uuid::new_v4(), "charlie".to_string());
    let dave = (Uuid::new_v4(), "dave".to_string());

    let now = Utc::now().naive_utc();
    let settled = |user_id: Uuid, points: i32| Prediction {
        id: Uuid::new_v4(),
        group_id: Uuid::new_v4(),
        group_fixture_id: Uuid::new_v4(),
        user_id,
        guess: "1:0".to_string(),
        points,
        exact_hit: false,
        tendency_hit: points > 0,
        settled_at: Some(now),
        created_at: now,
        updated_at: now,
    };

    let predictions = vec![
        settled(alice.0, 2),
        settled(charlie.0, 2),
        settled(dave.0, 1),
    ];

    let standings = compute_standings(
        &[dave.clone(), charlie.clone(), alice.clone()],
        &predictions,
    );

    // alice and charlie tie on every count: shared rank 1, alphabetical order
    assert_eq!(standings[0].username, "alice");
    assert_eq!(standings[0].rank, 1);
    assert_eq!(standings[1].username, "charlie");
    assert_eq!(standings[1].rank, 1);
    // dave is rank 3: the tie consumed rank 2
    assert_eq!(standings[2].username, "dave");
    assert_eq!(standings[2].rank, 3);
}

#[test]
fn test_standings_include_members_without_predictions() {
    let alice = (Uuid::new_v4(), "alice".to_string());
    let idle = (Uuid::new_v4(), "idle".to_string());

    let standings = compute_standings(&[alice, idle], &[]);

    assert_eq!(standings.len(), 2);
    for entry in &standings {
        assert_eq!(entry.points, 0);
        assert_eq!(entry.predictions, 0);
        assert_eq!(entry.rank, 1);
    }
}

/// Unit tests for configuration
#[test]
fn test_settlement_config_defaults() {
    let config = SettlementConfig::default();
    assert_eq!(config.notify_top_ranks, 3);
    assert!(config.chat_webhook_url.is_none());
    assert!(config.cache_service_url.is_none());
}
