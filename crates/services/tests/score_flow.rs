use chrono::Duration;
use prep_core::Clock;
use prep_core::model::{
    Confidence, Difficulty, SessionDraft, SessionKind, Subject, UserId,
};
use prep_core::time::fixed_now;
use services::AppServices;
use storage::repository::{PrepScoreRepository, Storage};

fn draft(
    user_id: UserId,
    subject: Subject,
    correct: u32,
    kind: SessionKind,
) -> SessionDraft {
    SessionDraft {
        user_id,
        subject,
        correct_questions: correct,
        total_questions: 10,
        difficulty: Difficulty::Medium,
        confidence: Confidence::High,
        guess_percent: 0,
        time_taken_minutes: 30,
        kind,
    }
}

#[tokio::test]
async fn log_dashboard_delete_flow_stays_consistent() {
    let storage = Storage::in_memory();
    let app = AppServices::with_storage(storage.clone(), Clock::fixed(fixed_now()));
    let user = UserId::new_random();

    // The worked example: one fresh Medicine mock at 8/10 lands on 11.78.
    let logged = app
        .sessions()
        .log_session(draft(user, Subject::Medicine, 8, SessionKind::Mock))
        .await
        .unwrap();
    assert!((logged.overall_score - 11.78).abs() < 1e-9);

    let dashboard = app.dashboard().dashboard_for(user).await.unwrap();
    assert_eq!(dashboard.overall_score, logged.overall_score);
    assert_eq!(dashboard.subjects.len(), 17);

    let snapshot = storage.scores.get_score(user).await.unwrap().unwrap();
    assert_eq!(snapshot.score, logged.overall_score);

    // Adding a practice session in another subject raises the overall.
    let second = app
        .sessions()
        .log_session(draft(user, Subject::Anatomy, 7, SessionKind::Practice))
        .await
        .unwrap();
    assert!(second.overall_score > logged.overall_score);

    // Deleting it restores the previous score exactly; deletion of a
    // non-negative-scoring record never raises a subject score.
    let after_delete = app
        .sessions()
        .delete_session(user, second.session.id())
        .await
        .unwrap();
    assert!((after_delete - logged.overall_score).abs() < 1e-9);
}

#[tokio::test]
async fn scores_decay_when_viewed_later() {
    let storage = Storage::in_memory();
    let at_creation = AppServices::with_storage(storage.clone(), Clock::fixed(fixed_now()));
    let user = UserId::new_random();

    let logged = at_creation
        .sessions()
        .log_session(draft(user, Subject::Medicine, 8, SessionKind::Mock))
        .await
        .unwrap();

    // Same session set, same storage, viewed 30 days later: no new data,
    // lower score.
    let later = AppServices::with_storage(
        storage,
        Clock::fixed(fixed_now() + Duration::days(30)),
    );
    let dashboard = later.dashboard().dashboard_for(user).await.unwrap();

    assert!(dashboard.overall_score > 0.0);
    assert!(dashboard.overall_score < logged.overall_score);
}

#[tokio::test]
async fn leaderboard_matches_dashboard_scores() {
    let storage = Storage::in_memory();
    let app = AppServices::with_storage(storage, Clock::fixed(fixed_now()));

    let strong = UserId::new_random();
    let weak = UserId::new_random();
    let idle = UserId::new_random();

    app.sessions()
        .log_session(draft(strong, Subject::Medicine, 9, SessionKind::Mock))
        .await
        .unwrap();
    app.sessions()
        .log_session(draft(weak, Subject::Medicine, 3, SessionKind::Practice))
        .await
        .unwrap();
    // A zero-accuracy session leaves `idle` with score 0 ("no data").
    app.sessions()
        .log_session(draft(idle, Subject::Surgery, 0, SessionKind::Practice))
        .await
        .unwrap();

    let standings = app.leaderboard().standings().await.unwrap();
    assert_eq!(standings.len(), 3);
    assert_eq!(standings[0].user_id, strong);
    assert_eq!(standings[1].user_id, weak);
    assert_eq!(standings[2].user_id, idle);
    assert_eq!(standings[2].score, 0.0);
    assert_eq!(
        standings.iter().map(|e| e.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    // The leaderboard entry for each user equals their own dashboard
    // headline: one canonical algorithm on both paths.
    for entry in &standings {
        let dashboard = app.dashboard().dashboard_for(entry.user_id).await.unwrap();
        assert_eq!(dashboard.overall_score, entry.score);
    }
}
