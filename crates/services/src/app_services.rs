use std::sync::Arc;

use storage::repository::{
    ExerciseRepository, HistoryRepository, ProfileStats, ProfileStatsRepository, Storage,
    TemplateRepository,
};
use workout_core::model::{
    Exercise, ExerciseId, SessionSettings, Template, TemplateId, WorkoutSession,
};

use crate::Clock;
use crate::error::AppServicesError;
use crate::workouts::WorkoutService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    exercises: Arc<dyn ExerciseRepository>,
    templates: Arc<dyn TemplateRepository>,
    history: Arc<dyn HistoryRepository>,
    stats: Arc<dyn ProfileStatsRepository>,
    workouts: Arc<WorkoutService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: SessionSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: SessionSettings) -> Self {
        Self {
            exercises: Arc::clone(&storage.exercises),
            templates: Arc::clone(&storage.templates),
            history: Arc::clone(&storage.history),
            stats: Arc::clone(&storage.stats),
            workouts: Arc::new(WorkoutService::from_storage(clock, settings, storage)),
        }
    }

    #[must_use]
    pub fn workouts(&self) -> Arc<WorkoutService> {
        Arc::clone(&self.workouts)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` on read failures.
    pub async fn list_exercises(&self) -> Result<Vec<Exercise>, AppServicesError> {
        Ok(self.exercises.list_exercises().await?)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` on read failures.
    pub async fn list_templates(&self) -> Result<Vec<Template>, AppServicesError> {
        Ok(self.templates.list_templates().await?)
    }

    /// The preferred template if it exists, otherwise the first one stored.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` on read failures.
    pub async fn resolve_template(
        &self,
        preferred: Option<TemplateId>,
    ) -> Result<Option<TemplateId>, AppServicesError> {
        let existing = self.templates.list_templates().await?;
        if let Some(id) = preferred {
            if existing.iter().any(|t| t.id() == id) {
                return Ok(Some(id));
            }
        }
        Ok(existing.first().map(Template::id))
    }

    /// Most recent finished workout containing the exercise.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` on read failures.
    pub async fn last_workout_for(
        &self,
        exercise_id: ExerciseId,
    ) -> Result<Option<WorkoutSession>, AppServicesError> {
        Ok(self.history.last_session_for_exercise(exercise_id).await?)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` on read failures.
    pub async fn profile_stats(&self) -> Result<ProfileStats, AppServicesError> {
        Ok(self.stats.get_stats().await?)
    }
}
