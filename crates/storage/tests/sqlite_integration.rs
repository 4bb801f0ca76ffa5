use chrono::Duration;
use storage::repository::{
    ExerciseRepository, HistoryRepository, ProfileStatsRepository, SessionRepository,
    StorageError, TemplateRepository,
};
use storage::sqlite::SqliteRepository;
use workout_core::model::{
    Effort, Exercise, ExerciseId, MeasureType, SessionExercise, SetPath, Template,
    TemplateExercise, TemplateId, Weight, WorkoutSession,
};
use workout_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn squat() -> Exercise {
    Exercise::new(ExerciseId::new(1), "Back Squat", "Legs", MeasureType::WeightReps).unwrap()
}

fn plank() -> Exercise {
    Exercise::new(ExerciseId::new(2), "Plank", "Core", MeasureType::TimeOnly).unwrap()
}

fn squat_session(kg: &[(f64, bool)], minutes_ago: i64) -> WorkoutSession {
    let started = fixed_now() - Duration::minutes(minutes_ago);
    let mut session = WorkoutSession::new("Legs", Some(TemplateId::new(1)), started)
        .append_exercises([SessionExercise::new(
            squat(),
            u32::try_from(kg.len()).unwrap(),
            Some(120),
        )]);
    for (i, (w, done)) in kg.iter().enumerate() {
        session = session.update_set(SetPath::new(0, i), |s| {
            s.with_weight(Weight::from_kg(*w).unwrap())
                .with_reps(5)
                .with_completed(*done)
        });
    }
    session
}

#[tokio::test]
async fn templates_roundtrip_in_slot_order() {
    let repo = connect("memdb_templates").await;
    repo.upsert_exercise(&squat()).await.unwrap();
    repo.upsert_exercise(&plank()).await.unwrap();

    let template = Template::new(
        TemplateId::new(7),
        "Legs & Core",
        vec![
            TemplateExercise::new(plank(), 2, 0).with_note("hold 60s"),
            TemplateExercise::new(squat(), 4, 5).with_rest_secs(180),
        ],
    )
    .unwrap();
    repo.upsert_template(&template).await.unwrap();

    let fetched = repo.get_template(TemplateId::new(7)).await.unwrap();
    assert_eq!(fetched, template);

    // Replacing a template drops slots that are no longer present.
    let trimmed = Template::new(
        TemplateId::new(7),
        "Legs",
        vec![TemplateExercise::new(squat(), 3, 5)],
    )
    .unwrap();
    repo.upsert_template(&trimmed).await.unwrap();
    let listed = repo.list_templates().await.unwrap();
    assert_eq!(listed, vec![trimmed]);

    let err = repo.get_template(TemplateId::new(8)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sessions_roundtrip_with_sets_and_effort() {
    let repo = connect("memdb_sessions").await;
    let session = squat_session(&[(100.0, true), (102.5, true), (105.0, false)], 30)
        .update_set(SetPath::new(0, 1), |s| {
            s.with_effort(Some(Effort::rpe(8.5).unwrap()))
        })
        .append_exercises([SessionExercise::new(plank(), 1, None)])
        .update_set(SetPath::new(1, 0), |s| {
            s.with_time_secs(Some(60)).with_completed(true)
        })
        .with_note(Some("felt strong".into()));

    repo.save_session(&session).await.unwrap();
    let fetched = repo.get_session(session.id()).await.unwrap();
    assert_eq!(fetched, session);
    assert_eq!(
        fetched.set(SetPath::new(0, 1)).effort(),
        Some(Effort::rpe(8.5).unwrap())
    );

    let err = repo.save_session(&session).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn history_reads_latest_session_and_completed_best() {
    let repo = connect("memdb_history").await;
    let older = squat_session(&[(120.0, true), (140.0, false)], 600);
    let newer = squat_session(&[(110.0, true)], 60);
    repo.save_session(&newer).await.unwrap();
    repo.save_session(&older).await.unwrap();

    let last = repo
        .last_session_for_exercise(ExerciseId::new(1))
        .await
        .unwrap()
        .expect("history");
    assert_eq!(last.id(), newer.id());

    let best = repo.best_weight(ExerciseId::new(1)).await.unwrap();
    assert_eq!(best, Some(Weight::from_kg(120.0).unwrap()));

    assert!(
        repo.last_session_for_exercise(ExerciseId::new(99))
            .await
            .unwrap()
            .is_none()
    );
    assert!(repo.best_weight(ExerciseId::new(99)).await.unwrap().is_none());

    // Unloaded work of any measure still has a best of zero.
    let core = WorkoutSession::new("Core", None, fixed_now())
        .append_exercises([SessionExercise::new(plank(), 1, None)])
        .update_set(SetPath::new(0, 0), |s| {
            s.with_time_secs(Some(60)).with_completed(true)
        });
    repo.save_session(&core).await.unwrap();
    assert_eq!(
        repo.best_weight(ExerciseId::new(2)).await.unwrap(),
        Some(Weight::from_grams(0))
    );
}

#[tokio::test]
async fn profile_stats_start_empty_and_accumulate() {
    let repo = connect("memdb_stats").await;
    assert_eq!(repo.get_stats().await.unwrap().workouts, 0);

    repo.record_workout_completed(2400.0, 1800, 2).await.unwrap();
    repo.record_workout_completed(600.0, 900, 1).await.unwrap();

    let stats = repo.get_stats().await.unwrap();
    assert_eq!(stats.workouts, 2);
    assert_eq!(stats.total_duration_secs, 2700);
    assert_eq!(stats.total_prs, 3);
    assert!((stats.total_volume_kg - 3000.0).abs() < 1e-9);
}
