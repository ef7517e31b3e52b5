use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{SessionId, UserId};
use crate::model::subject::Subject;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Boundary validation errors for session records.
///
/// The scoring functions assume these invariants hold and do not
/// re-validate; rejecting bad shapes here is what keeps the scoring core
/// total.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionValidationError {
    #[error("session must cover at least one question")]
    NoQuestions,

    #[error("correct questions ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("guess percent must be within 0..=100, got {0}")]
    GuessPercentOutOfRange(u32),

    #[error("guess percent must be a step of 5, got {0}")]
    GuessPercentNotStepOfFive(u32),

    #[error("time taken must be at least one minute")]
    ZeroTimeTaken,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseEnumError {
    #[error("unknown {field}: {value}")]
    Unknown { field: &'static str, value: String },
}

//
// ─── SESSION ENUMS ─────────────────────────────────────────────────────────────
//

/// Self-reported difficulty of the practiced material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Lenient decode for persisted values.
    ///
    /// Unrecognized text maps to `Easy`, whose effect multiplier is the
    /// neutral 1.0. Deliberate leniency at the storage boundary, not an
    /// error.
    #[must_use]
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            // "easy" and anything unrecognized score as neutral.
            _ => Difficulty::Easy,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseEnumError::Unknown {
                field: "difficulty",
                value: s.to_string(),
            }),
        }
    }
}

/// Self-reported confidence while answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }

    /// Lenient decode for persisted values.
    ///
    /// Unrecognized text maps to `Medium`, whose effect multiplier is the
    /// neutral 1.0.
    #[must_use]
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "low" => Confidence::Low,
            "high" => Confidence::High,
            // "medium" and anything unrecognized score as neutral.
            _ => Confidence::Medium,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            _ => Err(ParseEnumError::Unknown {
                field: "confidence",
                value: s.to_string(),
            }),
        }
    }
}

/// Whether a session was free practice or a timed mock exam.
///
/// Mock sessions weigh 1.5x practice sessions when blending subject
/// scores. There is no neutral fallback; an unknown stored kind is a
/// storage serialization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Practice,
    Mock,
}

impl SessionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Practice => "practice",
            SessionKind::Mock => "mock",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "practice" => Ok(SessionKind::Practice),
            "mock" => Ok(SessionKind::Mock),
            _ => Err(ParseEnumError::Unknown {
                field: "session kind",
                value: s.to_string(),
            }),
        }
    }
}

//
// ─── SESSION DRAFT ─────────────────────────────────────────────────────────────
//

/// User-submitted session fields, prior to boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub user_id: UserId,
    pub subject: Subject,
    pub correct_questions: u32,
    pub total_questions: u32,
    pub difficulty: Difficulty,
    pub confidence: Confidence,
    pub guess_percent: u32,
    pub time_taken_minutes: u32,
    pub kind: SessionKind,
}

impl SessionDraft {
    /// Validate the draft against the record invariants.
    ///
    /// `now` becomes the session's `created_at` and later feeds recentness
    /// decay.
    ///
    /// # Errors
    ///
    /// Returns `SessionValidationError` if any invariant fails:
    /// at least one question, correct within total, guess percent within
    /// 0..=100 in steps of 5, and positive time taken.
    pub fn validate(
        self,
        now: DateTime<Utc>,
    ) -> Result<ValidatedSession, SessionValidationError> {
        if self.total_questions == 0 {
            return Err(SessionValidationError::NoQuestions);
        }
        if self.correct_questions > self.total_questions {
            return Err(SessionValidationError::CorrectExceedsTotal {
                correct: self.correct_questions,
                total: self.total_questions,
            });
        }
        if self.guess_percent > 100 {
            return Err(SessionValidationError::GuessPercentOutOfRange(
                self.guess_percent,
            ));
        }
        if self.guess_percent % 5 != 0 {
            return Err(SessionValidationError::GuessPercentNotStepOfFive(
                self.guess_percent,
            ));
        }
        if self.time_taken_minutes == 0 {
            return Err(SessionValidationError::ZeroTimeTaken);
        }

        Ok(ValidatedSession {
            draft: self,
            created_at: now,
        })
    }
}

/// A draft that passed validation but has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    draft: SessionDraft,
    created_at: DateTime<Utc>,
}

impl ValidatedSession {
    /// Attach the storage-assigned id, producing the immutable record.
    #[must_use]
    pub fn assign_id(self, id: SessionId) -> Session {
        Session {
            id,
            user_id: self.draft.user_id,
            subject: self.draft.subject,
            correct_questions: self.draft.correct_questions,
            total_questions: self.draft.total_questions,
            difficulty: self.draft.difficulty,
            confidence: self.draft.confidence,
            guess_percent: self.draft.guess_percent,
            time_taken_minutes: self.draft.time_taken_minutes,
            kind: self.draft.kind,
            created_at: self.created_at,
        }
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn draft(&self) -> &SessionDraft {
        &self.draft
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One logged practice or mock-test attempt for a subject.
///
/// Immutable once created; the only lifecycle transitions are creation and
/// deletion. All derived scores are recomputed from the full session set,
/// never stored back onto the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    id: SessionId,
    user_id: UserId,
    subject: Subject,
    correct_questions: u32,
    total_questions: u32,
    difficulty: Difficulty,
    confidence: Confidence,
    guess_percent: u32,
    time_taken_minutes: u32,
    kind: SessionKind,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Rehydrate a session from persisted storage, re-checking invariants.
    ///
    /// # Errors
    ///
    /// Returns `SessionValidationError` if the stored row violates the
    /// record invariants (e.g. hand-edited database).
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        subject: Subject,
        correct_questions: u32,
        total_questions: u32,
        difficulty: Difficulty,
        confidence: Confidence,
        guess_percent: u32,
        time_taken_minutes: u32,
        kind: SessionKind,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SessionValidationError> {
        let draft = SessionDraft {
            user_id,
            subject,
            correct_questions,
            total_questions,
            difficulty,
            confidence,
            guess_percent,
            time_taken_minutes,
            kind,
        };
        Ok(draft.validate(created_at)?.assign_id(id))
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn correct_questions(&self) -> u32 {
        self.correct_questions
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    #[must_use]
    pub fn guess_percent(&self) -> u32 {
        self.guess_percent
    }

    #[must_use]
    pub fn time_taken_minutes(&self) -> u32 {
        self.time_taken_minutes
    }

    #[must_use]
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Fraction of questions answered correctly, in `[0, 1]`.
    ///
    /// Total questions is at least 1 by construction, so this never
    /// divides by zero.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        f64::from(self.correct_questions) / f64::from(self.total_questions)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft() -> SessionDraft {
        SessionDraft {
            user_id: UserId::new_random(),
            subject: Subject::Medicine,
            correct_questions: 8,
            total_questions: 10,
            difficulty: Difficulty::Medium,
            confidence: Confidence::High,
            guess_percent: 0,
            time_taken_minutes: 25,
            kind: SessionKind::Mock,
        }
    }

    #[test]
    fn valid_draft_becomes_session() {
        let session = draft().validate(fixed_now()).unwrap().assign_id(SessionId::new(1));
        assert_eq!(session.id(), SessionId::new(1));
        assert_eq!(session.subject(), Subject::Medicine);
        assert_eq!(session.created_at(), fixed_now());
        assert!((session.accuracy() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_zero_total_questions() {
        let mut d = draft();
        d.total_questions = 0;
        d.correct_questions = 0;
        let err = d.validate(fixed_now()).unwrap_err();
        assert_eq!(err, SessionValidationError::NoQuestions);
    }

    #[test]
    fn rejects_correct_above_total() {
        let mut d = draft();
        d.correct_questions = 11;
        let err = d.validate(fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            SessionValidationError::CorrectExceedsTotal {
                correct: 11,
                total: 10
            }
        ));
    }

    #[test]
    fn rejects_guess_percent_over_100() {
        let mut d = draft();
        d.guess_percent = 105;
        let err = d.validate(fixed_now()).unwrap_err();
        assert_eq!(err, SessionValidationError::GuessPercentOutOfRange(105));
    }

    #[test]
    fn rejects_guess_percent_off_step() {
        let mut d = draft();
        d.guess_percent = 12;
        let err = d.validate(fixed_now()).unwrap_err();
        assert_eq!(err, SessionValidationError::GuessPercentNotStepOfFive(12));
    }

    #[test]
    fn rejects_zero_time_taken() {
        let mut d = draft();
        d.time_taken_minutes = 0;
        let err = d.validate(fixed_now()).unwrap_err();
        assert_eq!(err, SessionValidationError::ZeroTimeTaken);
    }

    #[test]
    fn from_persisted_rechecks_invariants() {
        let err = Session::from_persisted(
            SessionId::new(1),
            UserId::new_random(),
            Subject::Anatomy,
            5,
            0,
            Difficulty::Easy,
            Confidence::Low,
            0,
            10,
            SessionKind::Practice,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, SessionValidationError::NoQuestions);
    }

    #[test]
    fn strict_parse_rejects_unknown_values() {
        assert!("impossible".parse::<Difficulty>().is_err());
        assert!("shaky".parse::<Confidence>().is_err());
        assert!("quiz".parse::<SessionKind>().is_err());
    }

    #[test]
    fn lenient_decode_falls_back_to_neutral() {
        assert_eq!(Difficulty::from_db_str("hard"), Difficulty::Hard);
        assert_eq!(Difficulty::from_db_str("impossible"), Difficulty::Easy);
        assert_eq!(Confidence::from_db_str("low"), Confidence::Low);
        assert_eq!(Confidence::from_db_str("shaky"), Confidence::Medium);
    }

    #[test]
    fn session_serializes_for_read_models_only() {
        let session = draft()
            .validate(fixed_now())
            .unwrap()
            .assign_id(SessionId::new(7));
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["subject"], "medicine");
        assert_eq!(json["kind"], "mock");
        assert_eq!(json["total_questions"], 10);
        // No Deserialize impl: rehydration goes through `from_persisted`
        // so the record invariants always hold.
    }

    #[test]
    fn enum_string_roundtrip() {
        for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(d.as_str().parse::<Difficulty>().unwrap(), d);
        }
        for c in [Confidence::Low, Confidence::Medium, Confidence::High] {
            assert_eq!(c.as_str().parse::<Confidence>().unwrap(), c);
        }
        for k in [SessionKind::Practice, SessionKind::Mock] {
            assert_eq!(k.as_str().parse::<SessionKind>().unwrap(), k);
        }
    }
}
