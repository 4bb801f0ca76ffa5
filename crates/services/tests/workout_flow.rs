use services::{Clock, SessionError, WorkoutService};
use storage::repository::{InMemoryRepository, SessionRepository, Storage};
use workout_core::finish::FinishError;
use workout_core::model::{
    Effort, Exercise, ExerciseId, MeasureType, SessionSettings, SetPath, Template,
    TemplateExercise, TemplateId, Weight,
};
use workout_core::time::fixed_now;

fn kg(value: f64) -> Weight {
    Weight::from_kg(value).unwrap()
}

fn deadlift() -> Exercise {
    Exercise::new(ExerciseId::new(1), "Deadlift", "Back", MeasureType::WeightReps).unwrap()
}

fn rower() -> Exercise {
    Exercise::new(ExerciseId::new(2), "Rowing Machine", "Cardio", MeasureType::DistanceTime)
        .unwrap()
}

async fn seed(storage: &Storage) {
    storage.exercises.upsert_exercise(&deadlift()).await.unwrap();
    storage.exercises.upsert_exercise(&rower()).await.unwrap();
    let template = Template::new(
        TemplateId::new(1),
        "Pull Day",
        vec![
            TemplateExercise::new(deadlift(), 3, 5).with_rest_secs(180),
            TemplateExercise::new(rower(), 1, 0),
        ],
    )
    .unwrap();
    storage.templates.upsert_template(&template).await.unwrap();
}

#[tokio::test]
async fn two_workouts_build_history_and_records() {
    let repo = InMemoryRepository::new();
    let storage = Storage::from_repository(repo.clone());
    seed(&storage).await;
    let service = WorkoutService::from_storage(
        Clock::fixed(fixed_now()),
        SessionSettings::default(),
        &storage,
    );

    let mut first = service
        .start_from_template(TemplateId::new(1))
        .await
        .unwrap()
        .expect("template");
    for (set, weight) in [140.0, 150.0, 150.0].into_iter().enumerate() {
        let path = SetPath::new(0, set);
        first.set_weight(path, kg(weight)).unwrap();
        first.set_reps(path, 5).unwrap();
        first.set_completed(path, true).unwrap();
    }
    first.set_distance(SetPath::new(1, 0), Some(2000.0)).unwrap();
    first.set_time(SetPath::new(1, 0), Some(480)).unwrap();
    first.set_completed(SetPath::new(1, 0), true).unwrap();
    let first_done = first.finish().await.unwrap();

    // No history: both 150 kg sets tie the maximum, and the unloaded row counts too.
    assert_eq!(first_done.stats.pr_count, 3);
    assert!(first_done.session.set(SetPath::new(0, 1)).is_personal_record());
    assert!(first_done.session.set(SetPath::new(1, 0)).is_personal_record());

    let mut second = service
        .start_from_template(TemplateId::new(1))
        .await
        .unwrap()
        .expect("template");
    let ghosts = second.ghost_sets(0).await;
    assert_eq!(
        ghosts.iter().map(|g| g.weight).collect::<Vec<_>>(),
        vec![kg(140.0), kg(150.0), kg(150.0)]
    );

    let top = SetPath::new(0, 0);
    second.set_weight(top, kg(150.0)).unwrap();
    second.set_reps(top, 3).unwrap();
    second
        .set_effort(top, Some(Effort::rpe(9.5).unwrap()))
        .unwrap();
    second.set_completed(top, true).unwrap();
    let second_done = second.finish().await.unwrap();

    // Matching the old best is not a record; untouched entries stay in the tree.
    assert_eq!(second_done.stats.pr_count, 0);
    assert_eq!(second_done.session.exercises().len(), 2);
    assert_eq!(second_done.session.exercises()[0].sets().len(), 3);

    let saved = repo.get_session(second_done.session.id()).await.unwrap();
    assert_eq!(saved, second_done.session);

    let stats = storage.stats.get_stats().await.unwrap();
    assert_eq!(stats.workouts, 2);
    assert_eq!(stats.total_prs, 3);
    assert_eq!(repo.session_count().unwrap(), 2);
}

#[tokio::test]
async fn sqlite_backed_quick_workout_round_trips() {
    let storage = Storage::sqlite("sqlite:file:memdb_workout_flow?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    seed(&storage).await;
    let service = WorkoutService::from_storage(
        Clock::fixed(fixed_now()),
        SessionSettings::default(),
        &storage,
    );

    let mut workout = service.start_quick().await;
    let rejected = workout.finish().await.unwrap_err();
    assert!(matches!(
        rejected,
        SessionError::Finish(FinishError::NoCompletedExercises)
    ));

    workout.add_exercises([deadlift()]).unwrap();
    workout.set_weight(SetPath::new(0, 0), kg(100.0)).unwrap();
    workout.set_reps(SetPath::new(0, 0), 5).unwrap();
    workout.set_completed(SetPath::new(0, 0), true).unwrap();
    workout.set_note(Some("grip gave out".into())).unwrap();
    let done = workout.finish().await.unwrap();

    let saved = storage.sessions.get_session(done.session.id()).await.unwrap();
    assert_eq!(saved, done.session);
    assert!(saved.is_quick());
    assert_eq!(saved.note(), Some("grip gave out"));
    assert!(saved.set(SetPath::new(0, 0)).is_personal_record());

    let best = storage.history.best_weight(ExerciseId::new(1)).await.unwrap();
    assert_eq!(best, Some(kg(100.0)));
    let stats = storage.stats.get_stats().await.unwrap();
    assert_eq!(stats.workouts, 1);
    assert!((stats.total_volume_kg - 500.0).abs() < 1e-9);
}
