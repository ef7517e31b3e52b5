use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    Confidence, Difficulty, Session, SessionKind, Subject, SubjectWeights,
};
use crate::time::Clock;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// E-folding time of recentness decay, in days.
///
/// Not a 30-day half-life: the factor drops to 1/e after 30 days, which
/// puts the half-life at roughly 20.8 days.
pub const DECAY_EFOLD_DAYS: f64 = 30.0;

/// Blend weights for practice vs. mock means. Mock performance carries
/// 1.5x the predictive weight of free practice.
const PRACTICE_BLEND: f64 = 0.4;
const MOCK_BLEND: f64 = 0.6;

/// Guesswork can shave at most this fraction off a session score.
const MAX_GUESS_PENALTY: f64 = 0.3;

//
// ─── EFFECT MULTIPLIERS ────────────────────────────────────────────────────────
//

/// Difficulty and confidence effect sizes applied to session accuracy.
///
/// Immutable once constructed and injected into the `ScoreEngine` rather
/// than read as an ambient global, so tests can substitute alternate
/// tables. The canonical table is `EffectMultipliers::default()`:
///
/// | axis       | low/easy | medium | high/hard |
/// |------------|----------|--------|-----------|
/// | difficulty | 1.0      | 1.2    | 1.4       |
/// | confidence | 0.8      | 1.0    | 1.2       |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectMultipliers {
    easy: f64,
    medium: f64,
    hard: f64,
    low_confidence: f64,
    medium_confidence: f64,
    high_confidence: f64,
}

impl EffectMultipliers {
    #[must_use]
    pub fn new(
        easy: f64,
        medium: f64,
        hard: f64,
        low_confidence: f64,
        medium_confidence: f64,
        high_confidence: f64,
    ) -> Self {
        Self {
            easy,
            medium,
            hard,
            low_confidence,
            medium_confidence,
            high_confidence,
        }
    }

    /// Effect multiplier for the session's difficulty.
    #[must_use]
    pub fn difficulty(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    /// Effect multiplier for the session's confidence.
    #[must_use]
    pub fn confidence(&self, confidence: Confidence) -> f64 {
        match confidence {
            Confidence::Low => self.low_confidence,
            Confidence::Medium => self.medium_confidence,
            Confidence::High => self.high_confidence,
        }
    }
}

impl Default for EffectMultipliers {
    fn default() -> Self {
        Self::new(1.0, 1.2, 1.4, 0.8, 1.0, 1.2)
    }
}

//
// ─── RECENTNESS DECAY ──────────────────────────────────────────────────────────
//

/// Exponential down-weighting of a record by age: `exp(-age_days / 30)`.
///
/// Always in `(0, 1]`: a brand-new record scores 1.0 and older records
/// decay toward (never reaching) zero. Age is clamped at zero, so a record
/// with a future timestamp (clock skew) scores as brand-new instead of
/// exceeding 1.0; this keeps the factor monotonically non-increasing in
/// age for all inputs.
#[must_use]
pub fn recentness_factor(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = now.signed_duration_since(created_at).num_seconds();

    // `num_seconds()` is i64; precision loss only matters far beyond the
    // timescales a study tracker sees.
    #[allow(clippy::cast_precision_loss)]
    let age_days = (seconds.max(0) as f64) / SECONDS_PER_DAY;

    (-age_days / DECAY_EFOLD_DAYS).exp()
}

/// Round to two decimal places, half away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//
// ─── SUBJECT SCORE ─────────────────────────────────────────────────────────────
//

/// Per-subject derived view for dashboards: bucket means, the blended
/// score, and the curriculum weight that feeds the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectScore {
    pub subject: Subject,
    pub practice_mean: f64,
    pub mock_mean: f64,
    pub blended: f64,
    pub weight: u32,
}

//
// ─── SCORE ENGINE ──────────────────────────────────────────────────────────────
//

/// The scoring core: converts raw session records into session scores,
/// per-subject blended scores, and the overall 0-100 prep score.
///
/// Pure and stateless apart from the injected clock; every call recomputes
/// from the session set it is given. Constructed once with the weight and
/// multiplier tables (injected, per-test replaceable) and shared by the
/// dashboard, the post-write snapshot, and the leaderboard so all three
/// agree on one canonical algorithm.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    clock: Clock,
    weights: SubjectWeights,
    multipliers: EffectMultipliers,
}

impl ScoreEngine {
    /// Engine with the canonical weight and multiplier tables and the
    /// system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Clock::default(),
            weights: SubjectWeights::default(),
            multipliers: EffectMultipliers::default(),
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Substitute an alternate subject-weight table.
    #[must_use]
    pub fn with_weights(mut self, weights: SubjectWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Substitute an alternate multiplier table.
    #[must_use]
    pub fn with_multipliers(mut self, multipliers: EffectMultipliers) -> Self {
        self.multipliers = multipliers;
        self
    }

    /// Current time according to the engine's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn weights(&self) -> &SubjectWeights {
        &self.weights
    }

    /// Fractional score for one session, generally in `[0, ~1.68]`.
    ///
    /// `accuracy * difficulty * confidence * guess_factor * recentness`,
    /// where `guess_factor = 1 - (guess_percent / 100) * 0.3`. The session
    /// passed boundary validation on construction, so accuracy is always
    /// defined; this function does not re-validate.
    #[must_use]
    pub fn session_score(&self, session: &Session) -> f64 {
        self.session_score_at(session, self.clock.now())
    }

    /// `session_score` against an explicit "now", for callers that must
    /// score a whole set against a single instant.
    #[must_use]
    pub fn session_score_at(&self, session: &Session, now: DateTime<Utc>) -> f64 {
        let guess_factor =
            1.0 - (f64::from(session.guess_percent()) / 100.0) * MAX_GUESS_PENALTY;

        session.accuracy()
            * self.multipliers.difficulty(session.difficulty())
            * self.multipliers.confidence(session.confidence())
            * guess_factor
            * recentness_factor(session.created_at(), now)
    }

    /// Blend per-kind session score means into one subject score.
    ///
    /// An empty bucket contributes exactly 0 (never NaN), so a subject
    /// with only mock sessions still blends cleanly. The result stays in
    /// the fractional session-score range; rescaling to 0-100 happens in
    /// `overall_prep_score`.
    #[must_use]
    pub fn subject_blended_score(&self, practice: &[Session], mock: &[Session]) -> f64 {
        let now = self.clock.now();
        let practice_mean = self.kind_mean_at(practice, now);
        let mock_mean = self.kind_mean_at(mock, now);
        blend_means(practice_mean, mock_mean)
    }

    /// Overall prep score over the full session set, on the 0-100 scale.
    ///
    /// Every subject in the weight table lands in the denominator whether
    /// or not it has sessions; absent subjects contribute 0 to the
    /// numerator. Rounded to two decimals. The result is deliberately
    /// unclamped: with every multiplier maximal and zero decay the
    /// theoretical ceiling is ~168, an accepted saturation characteristic
    /// that realistic inputs do not approach.
    #[must_use]
    pub fn overall_prep_score(&self, sessions: &[Session]) -> f64 {
        self.overall_from_breakdown(&self.subject_breakdown(sessions))
    }

    /// Collapse an already-computed breakdown into the overall score, so a
    /// dashboard can render the rows and the headline number from one
    /// consistent computation.
    #[must_use]
    pub fn overall_from_breakdown(&self, breakdown: &[SubjectScore]) -> f64 {
        let mut weighted_sum = 0.0;
        for row in breakdown {
            weighted_sum += row.blended * f64::from(row.weight);
        }

        let weight_sum = f64::from(self.weights.total());
        if weight_sum == 0.0 {
            // Only reachable with a custom all-zero table.
            return 0.0;
        }

        round2(weighted_sum / weight_sum * 100.0)
    }

    /// Per-subject score rows for all subjects in the fixed table, scored
    /// against a single instant so one dashboard render is self-consistent.
    #[must_use]
    pub fn subject_breakdown(&self, sessions: &[Session]) -> Vec<SubjectScore> {
        let now = self.clock.now();

        Subject::ALL
            .iter()
            .map(|&subject| {
                let mut practice_sum = 0.0;
                let mut practice_count = 0_u32;
                let mut mock_sum = 0.0;
                let mut mock_count = 0_u32;

                for session in sessions.iter().filter(|s| s.subject() == subject) {
                    let score = self.session_score_at(session, now);
                    match session.kind() {
                        SessionKind::Practice => {
                            practice_sum += score;
                            practice_count += 1;
                        }
                        SessionKind::Mock => {
                            mock_sum += score;
                            mock_count += 1;
                        }
                    }
                }

                let practice_mean = mean_of(practice_sum, practice_count);
                let mock_mean = mean_of(mock_sum, mock_count);

                SubjectScore {
                    subject,
                    practice_mean,
                    mock_mean,
                    blended: blend_means(practice_mean, mock_mean),
                    weight: self.weights.weight(subject),
                }
            })
            .collect()
    }

    fn kind_mean_at(&self, sessions: &[Session], now: DateTime<Utc>) -> f64 {
        if sessions.is_empty() {
            return 0.0;
        }
        let sum: f64 = sessions
            .iter()
            .map(|s| self.session_score_at(s, now))
            .sum();

        #[allow(clippy::cast_precision_loss)]
        let count = sessions.len() as f64;
        sum / count
    }
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Arithmetic mean with the load-bearing empty-bucket convention: an empty
/// collection yields exactly 0, never NaN, so it cannot poison downstream
/// weighted sums.
fn mean_of(sum: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

fn blend_means(practice_mean: f64, mock_mean: f64) -> f64 {
    practice_mean * PRACTICE_BLEND + mock_mean * MOCK_BLEND
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
