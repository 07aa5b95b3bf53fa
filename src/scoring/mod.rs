//! Pure scoring of predictions against finished fixtures.
//!
//! Everything in this module is deterministic and free of I/O: the
//! settlement service loads rows, builds the inputs and persists the
//! outputs, while the point arithmetic lives here.

use serde::{Deserialize, Serialize};

/// Outcome of a match from the home side's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    HomeWin,
    AwayWin,
    Draw,
}

/// A "home:away" goal pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePair {
    pub home: i32,
    pub away: i32,
}

impl ScorePair {
    pub fn new(home: i32, away: i32) -> Self {
        Self { home, away }
    }

    /// Outcome encoded by this pair
    pub fn outcome(&self) -> MatchOutcome {
        if self.home > self.away {
            MatchOutcome::HomeWin
        } else if self.home < self.away {
            MatchOutcome::AwayWin
        } else {
            MatchOutcome::Draw
        }
    }

    /// Goal difference (home - away)
    pub fn difference(&self) -> i32 {
        self.home - self.away
    }
}

/// Prediction mode configured per group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    /// Tiered scoring: exact score, goal difference, outcome
    CorrectScore,
    /// Outcome-only scoring
    MatchWinner,
}

impl PredictionMode {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "correct_score" => Ok(PredictionMode::CorrectScore),
            "match_winner" => Ok(PredictionMode::MatchWinner),
            _ => Err(format!("Invalid prediction mode: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionMode::CorrectScore => "correct_score",
            PredictionMode::MatchWinner => "match_winner",
        }
    }
}

/// Which phase of a knockout match governs scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KoRoundMode {
    /// Always the 90-minute score
    FullTime,
    /// Extra-time score when the match went to overtime
    ExtraTime,
    /// Outcome decided by the full knockout resolution including the
    /// penalty shootout; outcome-only scoring
    Penalties,
}

impl KoRoundMode {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "full_time" => Ok(KoRoundMode::FullTime),
            "extra_time" => Ok(KoRoundMode::ExtraTime),
            "penalties" => Ok(KoRoundMode::Penalties),
            _ => Err(format!("Invalid knockout round mode: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            KoRoundMode::FullTime => "full_time",
            KoRoundMode::ExtraTime => "extra_time",
            KoRoundMode::Penalties => "penalties",
        }
    }
}

/// Plain rules value consumed by [`score_prediction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pub mode: PredictionMode,
    pub ko_mode: KoRoundMode,
    pub points_exact: i32,
    pub points_difference: i32,
    pub points_outcome: i32,
}

/// Result payload of one fixture as the provider left it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureScores {
    pub finished: bool,
    pub full_time: Option<ScorePair>,
    /// Present only if the match went to overtime
    pub extra_time: Option<ScorePair>,
    /// Shootout goal counts, present only if overtime ended level
    pub penalties: Option<ScorePair>,
    /// Freeform result string, parsed when the structured full-time
    /// fields are null
    pub result_text: Option<String>,
}

/// Point award for one prediction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointsAward {
    pub points: i32,
    pub exact_hit: bool,
    pub tendency_hit: bool,
}

impl PointsAward {
    /// Zero points, no hit flags
    pub fn zero() -> Self {
        Self::default()
    }

    fn hit(points: i32, exact_hit: bool) -> Self {
        Self {
            points,
            exact_hit,
            tendency_hit: true,
        }
    }
}

/// Parse a "home:away" pair of non-negative integers.
///
/// Anything else (missing separator, extra fields, signs, garbage) is
/// rejected; a malformed guess settles to zero rather than failing the run.
pub fn parse_score_pair(s: &str) -> Option<ScorePair> {
    let mut parts = s.split(':');
    let home = parts.next()?.trim().parse::<u16>().ok()?;
    let away = parts.next()?.trim().parse::<u16>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ScorePair::new(i32::from(home), i32::from(away)))
}

/// Resolve the authoritative full-time score of a fixture.
///
/// Ordered fallback chain, used by both scoring and settlement: the
/// structured full-time columns first, then the leading "H:A" token of the
/// freeform result text. `None` means the fixture has no resolvable score
/// and its predictions must be skipped.
pub fn resolve_full_time(scores: &FixtureScores) -> Option<ScorePair> {
    if let Some(pair) = scores.full_time {
        return Some(pair);
    }
    scores
        .result_text
        .as_deref()
        .and_then(|text| text.split_whitespace().next())
        .and_then(parse_score_pair)
}

/// Outcome of a knockout match resolved through all phases: extra time
/// decides unless it ended level, then the shootout, then the full-time
/// score for matches that never went to overtime.
fn knockout_outcome(scores: &FixtureScores) -> Option<MatchOutcome> {
    match (scores.extra_time, scores.penalties) {
        (Some(extra), _) if extra.outcome() != MatchOutcome::Draw => Some(extra.outcome()),
        (_, Some(shootout)) => Some(shootout.outcome()),
        // Level after extra time with no shootout recorded
        (Some(extra), None) => Some(extra.outcome()),
        (None, None) => resolve_full_time(scores).map(|pair| pair.outcome()),
    }
}

/// Score one prediction against one fixture result under a group's rules.
///
/// Pure and deterministic. Callers only settle finished fixtures, but an
/// unfinished payload still returns zero here.
pub fn score_prediction(guess: &str, scores: &FixtureScores, rules: &ScoringRules) -> PointsAward {
    if !scores.finished {
        return PointsAward::zero();
    }

    let guess = match parse_score_pair(guess) {
        Some(pair) => pair,
        None => return PointsAward::zero(),
    };

    // Penalties mode bypasses the tier cascade entirely: only the resolved
    // winner of the knockout tie is compared.
    if rules.ko_mode == KoRoundMode::Penalties {
        return match knockout_outcome(scores) {
            Some(actual) if guess.outcome() == actual => {
                PointsAward::hit(rules.points_outcome, false)
            }
            _ => PointsAward::zero(),
        };
    }

    let actual = match rules.ko_mode {
        KoRoundMode::ExtraTime => scores.extra_time.or_else(|| resolve_full_time(scores)),
        _ => resolve_full_time(scores),
    };
    let actual = match actual {
        Some(pair) => pair,
        None => return PointsAward::zero(),
    };

    match rules.mode {
        PredictionMode::MatchWinner => {
            if guess.outcome() == actual.outcome() {
                PointsAward::hit(rules.points_outcome, false)
            } else {
                PointsAward::zero()
            }
        }
        PredictionMode::CorrectScore => score_cascade(guess, actual, rules),
    }
}

/// Ordered tier cascade for `CorrectScore` groups; the first matching tier
/// wins, no double-award.
fn score_cascade(guess: ScorePair, actual: ScorePair, rules: &ScoringRules) -> PointsAward {
    if guess == actual {
        PointsAward::hit(rules.points_exact, true)
    } else if guess.difference() == actual.difference() {
        PointsAward::hit(rules.points_difference, false)
    } else if guess.outcome() == actual.outcome() {
        PointsAward::hit(rules.points_outcome, false)
    } else {
        PointsAward::zero()
    }
}
