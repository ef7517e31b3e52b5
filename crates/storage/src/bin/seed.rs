use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use prep_core::model::{
    Confidence, Difficulty, SessionDraft, SessionKind, Subject, UserId,
};
use storage::repository::{NewSessionRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    sessions: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidSessions { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => {
                write!(f, "invalid --user value (expected UUID): {raw}")
            }
            ArgsError::InvalidSessions { raw } => write!(f, "invalid --sessions value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PREP_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut user_id = std::env::var("PREP_USER_ID")
            .ok()
            .and_then(|value| UserId::from_str(&value).ok())
            .unwrap_or_else(UserId::new_random);
        let mut sessions = std::env::var("PREP_SESSIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(24);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = UserId::from_str(&value)
                        .map_err(|_| ArgsError::InvalidUserId { raw: value })?;
                }
                "--sessions" => {
                    let value = require_value(&mut args, "--sessions")?;
                    sessions = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidSessions { raw: value })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value })?;
                    now = Some(parsed.with_timezone(&Utc));
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            sessions,
            now,
        })
    }
}

/// Deterministic spread of drafts: subjects rotate through the full
/// curriculum, every third session is a mock, and ages fan out a few days
/// apart so recentness decay is visible on the dashboard.
fn sample_drafts(user_id: UserId, count: u32, now: DateTime<Utc>) -> Vec<NewSessionRecord> {
    let difficulties = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
    let confidences = [Confidence::Low, Confidence::Medium, Confidence::High];

    (0..count)
        .map(|i| {
            let subject = Subject::ALL[(i as usize) % Subject::ALL.len()];
            let kind = if i % 3 == 0 {
                SessionKind::Mock
            } else {
                SessionKind::Practice
            };
            let total = 10 + (i % 3) * 5;
            let correct = total - (i % 4).min(total);
            let created_at = now - Duration::days(i64::from(i) * 3);

            let validated = SessionDraft {
                user_id,
                subject,
                correct_questions: correct,
                total_questions: total,
                difficulty: difficulties[(i as usize) % difficulties.len()],
                confidence: confidences[(i as usize + 1) % confidences.len()],
                guess_percent: (i % 5) * 5,
                time_taken_minutes: 15 + (i % 6) * 10,
                kind,
            }
            .validate(created_at)
            .expect("sample drafts satisfy the record invariants");

            NewSessionRecord::from_validated(&validated)
        })
        .collect()
}

#[tokio::main]
async fn main() {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("seed: {err}");
            std::process::exit(2);
        }
    };

    let storage = match Storage::sqlite(&args.db_url).await {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("seed: failed to open {}: {err}", args.db_url);
            std::process::exit(1);
        }
    };

    let now = args.now.unwrap_or_else(Utc::now);
    let drafts = sample_drafts(args.user_id, args.sessions, now);
    let total = drafts.len();

    for record in drafts {
        if let Err(err) = storage.sessions.insert_session(record).await {
            eprintln!("seed: insert failed: {err}");
            std::process::exit(1);
        }
    }

    println!(
        "seeded {total} sessions for user {} into {}",
        args.user_id, args.db_url
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::time::fixed_now;

    #[test]
    fn sample_drafts_cover_every_subject() {
        let drafts = sample_drafts(UserId::new_random(), 34, fixed_now());
        for subject in Subject::ALL {
            assert!(drafts.iter().any(|d| d.subject == subject));
        }
    }

    #[test]
    fn sample_drafts_mix_kinds_and_ages() {
        let drafts = sample_drafts(UserId::new_random(), 12, fixed_now());
        assert!(drafts.iter().any(|d| d.kind == SessionKind::Mock));
        assert!(drafts.iter().any(|d| d.kind == SessionKind::Practice));
        assert!(drafts.iter().any(|d| d.created_at < fixed_now()));
    }
}
