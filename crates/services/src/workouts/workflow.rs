use std::sync::Arc;

use storage::repository::{
    HistoryRepository, ProfileStatsRepository, SessionRepository, Storage, StorageError,
    TemplateRepository,
};
use tokio::runtime::Handle;
use workout_core::hydrate::Hydrator;
use workout_core::model::{SessionSettings, TemplateId, WorkoutSession};

use super::active::ActiveWorkout;
use super::history::HistoryLookup;
use crate::Clock;
use crate::error::SessionError;

/// Starts workouts from templates or from scratch.
#[derive(Clone)]
pub struct WorkoutService {
    clock: Clock,
    settings: SessionSettings,
    templates: Arc<dyn TemplateRepository>,
    history: Arc<dyn HistoryRepository>,
    sessions: Arc<dyn SessionRepository>,
    stats: Arc<dyn ProfileStatsRepository>,
}

impl WorkoutService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: SessionSettings,
        templates: Arc<dyn TemplateRepository>,
        history: Arc<dyn HistoryRepository>,
        sessions: Arc<dyn SessionRepository>,
        stats: Arc<dyn ProfileStatsRepository>,
    ) -> Self {
        Self {
            clock,
            settings,
            templates,
            history,
            sessions,
            stats,
        }
    }

    /// Wire every repository from one `Storage` bundle.
    #[must_use]
    pub fn from_storage(clock: Clock, settings: SessionSettings, storage: &Storage) -> Self {
        Self::new(
            clock,
            settings,
            Arc::clone(&storage.templates),
            Arc::clone(&storage.history),
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.stats),
        )
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Start a workout hydrated from the template.
    ///
    /// Returns `Ok(None)` when the template does not exist.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` for other storage failures.
    pub async fn start_from_template(
        &self,
        template_id: TemplateId,
    ) -> Result<Option<ActiveWorkout>, SessionError> {
        let template = match self.templates.get_template(template_id).await {
            Ok(template) => template,
            Err(StorageError::NotFound) => {
                tracing::info!(%template_id, "template unavailable");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let session = Hydrator::new(&self.settings).from_template(&template, self.clock.now());
        tracing::info!(
            session_id = %session.id(),
            %template_id,
            exercises = session.exercises().len(),
            "workout started from template"
        );
        Ok(Some(self.begin(session)))
    }

    /// Start an empty ad hoc workout.
    pub async fn start_quick(&self) -> ActiveWorkout {
        let session = Hydrator::new(&self.settings).quick(self.clock.now());
        tracing::info!(session_id = %session.id(), "quick workout started");
        self.begin(session)
    }

    fn begin(&self, session: WorkoutSession) -> ActiveWorkout {
        ActiveWorkout::begin(
            session,
            self.settings.clone(),
            HistoryLookup::new(Arc::clone(&self.history)),
            Arc::clone(&self.sessions),
            Arc::clone(&self.stats),
            &Handle::current(),
        )
    }
}
