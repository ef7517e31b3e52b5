mod ids;
mod session;
mod subject;

pub use ids::{ParseIdError, SessionId, UserId};
pub use session::{
    Confidence, Difficulty, ParseEnumError, Session, SessionDraft, SessionKind,
    SessionValidationError, ValidatedSession,
};
pub use subject::{Subject, SubjectError, SubjectWeights};
