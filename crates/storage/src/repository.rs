use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use workout_core::model::{
    Exercise, ExerciseId, SessionId, Template, TemplateId, Weight, WorkoutSession,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Accumulated profile totals across finished workouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProfileStats {
    pub workouts: u32,
    pub total_volume_kg: f64,
    pub total_duration_secs: u64,
    pub total_prs: u32,
}

impl ProfileStats {
    fn record(&mut self, volume_kg: f64, duration_secs: u64, pr_count: u32) {
        self.workouts = self.workouts.saturating_add(1);
        self.total_volume_kg += volume_kg;
        self.total_duration_secs = self.total_duration_secs.saturating_add(duration_secs);
        self.total_prs = self.total_prs.saturating_add(pr_count);
    }
}

/// Catalog of exercise definitions.
#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    /// Persist or update an exercise definition.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the exercise cannot be stored.
    async fn upsert_exercise(&self, exercise: &Exercise) -> Result<(), StorageError>;

    /// Fetch an exercise by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, StorageError>;

    /// List all exercises ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_exercises(&self) -> Result<Vec<Exercise>, StorageError>;
}

/// Source of workout templates.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Persist or replace a template and its exercise slots.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the template cannot be stored.
    async fn upsert_template(&self, template: &Template) -> Result<(), StorageError>;

    /// Fetch a template by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_template(&self, id: TemplateId) -> Result<Template, StorageError>;

    /// List all templates ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_templates(&self) -> Result<Vec<Template>, StorageError>;
}

/// Read access to finished workouts for ghost values and prior records.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Most recent finished session containing the exercise, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn last_session_for_exercise(
        &self,
        exercise_id: ExerciseId,
    ) -> Result<Option<WorkoutSession>, StorageError>;

    /// Heaviest completed weight ever recorded for the exercise, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn best_weight(&self, exercise_id: ExerciseId) -> Result<Option<Weight>, StorageError>;
}

/// Sink for finished workouts.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a finished session with its exercises and sets.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the session was already saved.
    async fn save_session(&self, session: &WorkoutSession) -> Result<(), StorageError>;

    /// Fetch a finished session by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_session(&self, id: SessionId) -> Result<WorkoutSession, StorageError>;
}

/// Sink for profile totals.
#[async_trait]
pub trait ProfileStatsRepository: Send + Sync {
    /// Fold one finished workout into the profile totals.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the totals cannot be updated.
    async fn record_workout_completed(
        &self,
        volume_kg: f64,
        duration_secs: u64,
        pr_count: u32,
    ) -> Result<(), StorageError>;

    /// Current totals; zeroed when nothing was recorded yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_stats(&self) -> Result<ProfileStats, StorageError>;
}

/// Heaviest completed load for an exercise in one session.
pub(crate) fn session_best(session: &WorkoutSession, exercise_id: ExerciseId) -> Option<Weight> {
    session
        .exercises()
        .iter()
        .filter(|e| e.exercise_id() == exercise_id)
        .flat_map(|e| e.completed_sets().map(|s| s.weight()))
        .max()
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    exercises: Arc<Mutex<HashMap<ExerciseId, Exercise>>>,
    templates: Arc<Mutex<HashMap<TemplateId, Template>>>,
    sessions: Arc<Mutex<Vec<WorkoutSession>>>,
    stats: Arc<Mutex<ProfileStats>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saved sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn session_count(&self) -> Result<usize, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl ExerciseRepository for InMemoryRepository {
    async fn upsert_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        let mut guard = self
            .exercises
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(exercise.id(), exercise.clone());
        Ok(())
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, StorageError> {
        let guard = self
            .exercises
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_exercises(&self) -> Result<Vec<Exercise>, StorageError> {
        let guard = self
            .exercises
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out: Vec<_> = guard.values().cloned().collect();
        out.sort_by_key(Exercise::id);
        Ok(out)
    }
}

#[async_trait]
impl TemplateRepository for InMemoryRepository {
    async fn upsert_template(&self, template: &Template) -> Result<(), StorageError> {
        let mut guard = self
            .templates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(template.id(), template.clone());
        Ok(())
    }

    async fn get_template(&self, id: TemplateId) -> Result<Template, StorageError> {
        let guard = self
            .templates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_templates(&self) -> Result<Vec<Template>, StorageError> {
        let guard = self
            .templates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out: Vec<_> = guard.values().cloned().collect();
        out.sort_by_key(Template::id);
        Ok(out)
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn last_session_for_exercise(
        &self,
        exercise_id: ExerciseId,
    ) -> Result<Option<WorkoutSession>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        // Later saves win ties on `started_at`.
        let latest = guard
            .iter()
            .enumerate()
            .filter(|(_, s)| s.find_exercise(exercise_id).is_some())
            .max_by_key(|(idx, s)| (s.started_at(), *idx))
            .map(|(_, s)| s.clone());
        Ok(latest)
    }

    async fn best_weight(&self, exercise_id: ExerciseId) -> Result<Option<Weight>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter_map(|s| session_best(s, exercise_id))
            .max())
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn save_session(&self, session: &WorkoutSession) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|s| s.id() == session.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(session.clone());
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<WorkoutSession, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|s| s.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ProfileStatsRepository for InMemoryRepository {
    async fn record_workout_completed(
        &self,
        volume_kg: f64,
        duration_secs: u64,
        pr_count: u32,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.record(volume_kg, duration_secs, pr_count);
        Ok(())
    }

    async fn get_stats(&self) -> Result<ProfileStats, StorageError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub exercises: Arc<dyn ExerciseRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub stats: Arc<dyn ProfileStatsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Wire every repository slot to one backend.
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: ExerciseRepository
            + TemplateRepository
            + HistoryRepository
            + SessionRepository
            + ProfileStatsRepository
            + Clone
            + 'static,
    {
        Self {
            exercises: Arc::new(repo.clone()),
            templates: Arc::new(repo.clone()),
            history: Arc::new(repo.clone()),
            sessions: Arc::new(repo.clone()),
            stats: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use workout_core::model::{MeasureType, SessionExercise, SetPath};
    use workout_core::time::fixed_now;

    fn squat() -> Exercise {
        Exercise::new(ExerciseId::new(1), "Squat", "Legs", MeasureType::WeightReps).unwrap()
    }

    fn finished_session(kg: &[(f64, bool)], minutes_ago: i64) -> WorkoutSession {
        let started = fixed_now() - Duration::minutes(minutes_ago);
        let mut session = WorkoutSession::new("Legs", None, started).append_exercises([
            SessionExercise::new(squat(), u32::try_from(kg.len()).unwrap(), None),
        ]);
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
    async fn history_returns_latest_session_and_best_completed_weight() {
        let repo = InMemoryRepository::new();
        let older = finished_session(&[(100.0, true), (140.0, false)], 120);
        let newer = finished_session(&[(110.0, true)], 10);
        repo.save_session(&newer).await.unwrap();
        repo.save_session(&older).await.unwrap();

        let last = repo
            .last_session_for_exercise(ExerciseId::new(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(last.id(), newer.id());

        let best = repo.best_weight(ExerciseId::new(1)).await.unwrap();
        assert_eq!(best, Some(Weight::from_kg(110.0).unwrap()));

        assert!(
            repo.best_weight(ExerciseId::new(2))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn best_weight_includes_unloaded_and_untimed_measures() {
        let repo = InMemoryRepository::new();
        let plank = Exercise::new(ExerciseId::new(2), "Plank", "Core", MeasureType::TimeOnly)
            .unwrap();
        let session = WorkoutSession::new("Core", None, fixed_now())
            .append_exercises([SessionExercise::new(plank, 2, None)])
            .update_set(SetPath::new(0, 0), |s| {
                s.with_time_secs(Some(60)).with_completed(true)
            })
            .update_set(SetPath::new(0, 1), |s| {
                s.with_weight(Weight::from_kg(10.0).unwrap())
            });
        repo.save_session(&session).await.unwrap();

        let best = repo.best_weight(ExerciseId::new(2)).await.unwrap();
        assert_eq!(best, Some(Weight::from_grams(0)));
    }

    #[tokio::test]
    async fn saving_twice_conflicts() {
        let repo = InMemoryRepository::new();
        let session = finished_session(&[(60.0, true)], 0);
        repo.save_session(&session).await.unwrap();
        let err = repo.save_session(&session).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(repo.session_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn stats_accumulate() {
        let repo = InMemoryRepository::new();
        repo.record_workout_completed(1000.0, 1800, 2).await.unwrap();
        repo.record_workout_completed(500.0, 600, 0).await.unwrap();
        let stats = repo.get_stats().await.unwrap();
        assert_eq!(stats.workouts, 2);
        assert_eq!(stats.total_duration_secs, 2400);
        assert_eq!(stats.total_prs, 2);
        assert!((stats.total_volume_kg - 1500.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn missing_template_is_not_found() {
        let storage = Storage::in_memory();
        let err = storage
            .templates
            .get_template(TemplateId::new(9))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
