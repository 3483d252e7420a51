use chrono::{Duration, NaiveDate};
use progress_core::model::{PracticeSession, StudentEmail, Subject};
use progress_core::policy::ProgressPolicy;
use services::{AppServices, Clock};

fn start_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 30).unwrap()
}

fn services_on(storage: &storage::Storage, day: NaiveDate) -> AppServices {
    AppServices::from_storage(storage, Clock::fixed_on(day), ProgressPolicy::default())
}

#[tokio::test]
async fn streak_follows_calendar_days() {
    let storage = storage::Storage::in_memory();
    let email = StudentEmail::parse("streaky@x.io").unwrap();
    let day0 = start_day();

    let app = services_on(&storage, day0);
    app.progress()
        .ensure_student_record(&email, "Streaky", None)
        .await
        .unwrap();

    let s1 = app
        .progress()
        .complete_practice_session(&email, PracticeSession::new(1, 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(s1.streak, 1);

    let s2 = app
        .progress()
        .complete_practice_session(&email, PracticeSession::new(1, 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(s2.streak, 1);

    let next_day = services_on(&storage, day0 + Duration::days(1));
    let s3 = next_day
        .progress()
        .complete_practice_session(&email, PracticeSession::new(1, 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(s3.streak, 2);

    // Skip two full days.
    let later = services_on(&storage, day0 + Duration::days(4));
    let s4 = later
        .progress()
        .complete_practice_session(&email, PracticeSession::new(1, 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(s4.streak, 1);
    assert_eq!(s4.last_session_date, Some(day0 + Duration::days(4)));
}

#[tokio::test]
async fn eight_of_ten_on_fresh_topic() {
    let app = AppServices::in_memory(Clock::fixed_on(start_day()), ProgressPolicy::default());
    let email = StudentEmail::parse("acc@x.io").unwrap();
    app.progress()
        .ensure_student_record(&email, "Acc", None)
        .await
        .unwrap();

    let record = app
        .progress()
        .complete_practice_session(&email, PracticeSession::new(8, 2))
        .await
        .unwrap()
        .unwrap();

    let topic = &record.topics[0];
    assert_eq!(topic.recent_score, 80);
    assert_eq!(topic.progress, 4);
    assert_eq!(topic.questions_completed, 10);
    assert_eq!(record.total_questions, 10);
}

#[tokio::test]
async fn sessions_never_decrease_counters_or_progress() {
    let app = AppServices::in_memory(Clock::fixed_on(start_day()), ProgressPolicy::default());
    let email = StudentEmail::parse("mono@x.io").unwrap();
    let mut previous = app
        .progress()
        .ensure_student_record(&email, "Mono", None)
        .await
        .unwrap();

    let sessions = [
        PracticeSession::new(10, 0).with_subject(Subject::Logical),
        PracticeSession::new(0, 10).with_subject(Subject::Logical),
        PracticeSession::new(0, 0),
        PracticeSession::new(7, 3).with_subject(Subject::Verbal),
        PracticeSession::new(50, 0).with_subject(Subject::Logical),
    ];

    for session in sessions {
        let next = app
            .progress()
            .complete_practice_session(&email, session)
            .await
            .unwrap()
            .unwrap();
        assert!(next.total_questions >= previous.total_questions);
        for (before, after) in previous.topics.iter().zip(&next.topics) {
            assert!(after.progress >= before.progress);
            assert!(after.questions_completed >= before.questions_completed);
            assert!(after.progress <= 100 && after.recent_score <= 100);
        }
        previous = next;
    }

    assert_eq!(previous.topics[1].progress, 10);
    assert_eq!(previous.topics[1].recent_score, 100);
    assert_eq!(previous.topics[2].recent_score, 70);
}

#[tokio::test]
async fn progress_saturates_at_one_hundred() {
    let app = AppServices::in_memory(Clock::fixed_on(start_day()), ProgressPolicy::default());
    let email = StudentEmail::parse("max@x.io").unwrap();
    app.progress()
        .ensure_student_record(&email, "Max", None)
        .await
        .unwrap();

    let mut last = None;
    for _ in 0..25 {
        last = app
            .progress()
            .complete_practice_session(&email, PracticeSession::new(5, 0))
            .await
            .unwrap();
    }
    let record = last.unwrap();
    assert_eq!(record.topics[0].progress, 100);
    assert_eq!(record.overall_progress, 33);
}

// Study time is credited forever; nothing resets it at a day boundary.
#[tokio::test]
async fn study_time_accumulates_across_days() {
    let storage = storage::Storage::in_memory();
    let email = StudentEmail::parse("time@x.io").unwrap();
    let day0 = start_day();

    let first = services_on(&storage, day0);
    first
        .progress()
        .ensure_student_record(&email, "Time", None)
        .await
        .unwrap();
    first
        .progress()
        .complete_practice_session(&email, PracticeSession::new(3, 2))
        .await
        .unwrap();

    let second = services_on(&storage, day0 + Duration::days(3));
    let record = second
        .progress()
        .complete_practice_session(&email, PracticeSession::new(1, 0).with_minutes(15))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.study_time_today_minutes, 10 + 15);
}

#[tokio::test]
async fn diagnostics_are_untouched_by_sessions() {
    let app = AppServices::in_memory(Clock::fixed_on(start_day()), ProgressPolicy::default());
    let email = StudentEmail::parse("diag@x.io").unwrap();
    let created = app
        .progress()
        .ensure_student_record(&email, "Diag", None)
        .await
        .unwrap();
    let after = app
        .progress()
        .complete_practice_session(&email, PracticeSession::new(9, 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.diagnostics, after.diagnostics);
}

#[tokio::test]
async fn sign_in_then_practice_then_overview() {
    let app = AppServices::in_memory(Clock::fixed_on(start_day()), ProgressPolicy::default());
    let user = app
        .auth()
        .sign_in("Pia", "pia@x.io", progress_core::model::Role::Student)
        .await
        .unwrap();

    app.progress()
        .complete_practice_session(
            &user.email,
            PracticeSession::new(6, 4).with_subject(Subject::Quant),
        )
        .await
        .unwrap()
        .unwrap();

    let overview = app
        .classes()
        .class_overview(ProgressPolicy::default().default_class_id())
        .await
        .unwrap();
    assert_eq!(overview.student_count, 1);
    assert_eq!(overview.active_students, 1);
    assert_eq!(overview.average_progress, 1);
    assert_eq!(overview.needs_attention.len(), 1);
    assert_eq!(overview.subject_averages[0].average_progress, 3);
}
