use prep_core::model::{
    Confidence, Difficulty, Session, SessionId, SessionKind, Subject, UserId,
};
use sqlx::Row;
use std::str::FromStr;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_str(s: &str) -> Result<UserId, StorageError> {
    UserId::from_str(s).map_err(|_| StorageError::Serialization(format!("invalid user_id: {s}")))
}

/// Subjects are a closed set; an unknown stored subject is corrupt data,
/// not a lenient default.
pub(crate) fn parse_subject(s: &str) -> Result<Subject, StorageError> {
    Subject::from_str(s).map_err(ser)
}

pub(crate) fn parse_kind(s: &str) -> Result<SessionKind, StorageError> {
    SessionKind::from_str(s).map_err(ser)
}

pub(crate) fn map_session_row(row: &sqlx::sqlite::SqliteRow) -> Result<Session, StorageError> {
    let id = SessionId::new(row.try_get::<i64, _>("id").map_err(ser)?);
    let user_id = user_id_from_str(row.try_get::<String, _>("user_id").map_err(ser)?.as_str())?;
    let subject = parse_subject(row.try_get::<String, _>("subject").map_err(ser)?.as_str())?;

    let correct_questions = u32_from_i64(
        "correct_questions",
        row.try_get::<i64, _>("correct_questions").map_err(ser)?,
    )?;
    let total_questions = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;

    // Difficulty and confidence decode leniently: unrecognized text maps
    // to the neutral-multiplier variant instead of failing the row.
    let difficulty =
        Difficulty::from_db_str(row.try_get::<String, _>("difficulty").map_err(ser)?.as_str());
    let confidence =
        Confidence::from_db_str(row.try_get::<String, _>("confidence").map_err(ser)?.as_str());

    let guess_percent = u32_from_i64(
        "guess_percent",
        row.try_get::<i64, _>("guess_percent").map_err(ser)?,
    )?;
    let time_taken_minutes = u32_from_i64(
        "time_taken_minutes",
        row.try_get::<i64, _>("time_taken_minutes").map_err(ser)?,
    )?;

    let kind = parse_kind(row.try_get::<String, _>("kind").map_err(ser)?.as_str())?;
    let created_at = row.try_get("created_at").map_err(ser)?;

    Session::from_persisted(
        id,
        user_id,
        subject,
        correct_questions,
        total_questions,
        difficulty,
        confidence,
        guess_percent,
        time_taken_minutes,
        kind,
        created_at,
    )
    .map_err(ser)
}
