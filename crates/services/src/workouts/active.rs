use std::sync::Arc;

use storage::repository::{ProfileStatsRepository, SessionRepository};
use tokio::runtime::Handle;
use tokio::sync::watch;
use workout_core::finish::{FinishedWorkout, finalize};
use workout_core::hydrate::Hydrator;
use workout_core::model::{Effort, Exercise, SessionSettings, SetPath, Weight, WorkoutSession};

use super::history::{GhostSet, HistoryLookup};
use crate::error::SessionError;
use crate::session_clock::SessionClock;
use crate::timer::{RestTimer, TimerState};

//
// ─── LIFECYCLE ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
enum Phase {
    Active,
    // Session row written; profile totals still pending.
    Saved(FinishedWorkout),
    Finished,
}

//
// ─── ACTIVE WORKOUT ────────────────────────────────────────────────────────────
//

/// A workout in progress: the session tree plus its rest timer and clock.
///
/// The tree has a single owner. Every edit takes `&mut self` and swaps in a
/// new immutable snapshot; timer and clock run on their own tasks.
pub struct ActiveWorkout {
    session: WorkoutSession,
    settings: SessionSettings,
    history: HistoryLookup,
    sessions: Arc<dyn SessionRepository>,
    stats: Arc<dyn ProfileStatsRepository>,
    timer: RestTimer,
    clock: SessionClock,
    phase: Phase,
}

impl std::fmt::Debug for ActiveWorkout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveWorkout")
            .field("session_id", &self.session.id())
            .field("exercises", &self.session.exercises().len())
            .field("timer", &self.timer.state())
            .field("elapsed_secs", &self.clock.elapsed_secs())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl ActiveWorkout {
    pub(crate) fn begin(
        session: WorkoutSession,
        settings: SessionSettings,
        history: HistoryLookup,
        sessions: Arc<dyn SessionRepository>,
        stats: Arc<dyn ProfileStatsRepository>,
        runtime: &Handle,
    ) -> Self {
        Self {
            session,
            settings,
            history,
            sessions,
            stats,
            timer: RestTimer::new(runtime.clone()),
            clock: SessionClock::start(runtime),
            phase: Phase::Active,
        }
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    /// Owned copy of the current tree; cheap, subtrees are shared.
    #[must_use]
    pub fn snapshot(&self) -> WorkoutSession {
        self.session.clone()
    }

    #[must_use]
    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    #[must_use]
    pub fn timer_updates(&self) -> watch::Receiver<TimerState> {
        self.timer.subscribe()
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.clock.elapsed_secs()
    }

    #[must_use]
    pub fn elapsed_updates(&self) -> watch::Receiver<u64> {
        self.clock.subscribe()
    }

    #[must_use]
    pub fn is_clock_running(&self) -> bool {
        self.clock.is_running()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Last logged values for the exercise at `exercise`, empty without history.
    ///
    /// # Panics
    ///
    /// Panics if `exercise` is out of range.
    pub async fn ghost_sets(&self, exercise: usize) -> Vec<GhostSet> {
        let entries = self.session.exercises();
        assert!(
            exercise < entries.len(),
            "exercise index {exercise} out of range for session with {} exercises",
            entries.len()
        );
        self.history.ghost_sets(entries[exercise].exercise_id()).await
    }

    //
    // ─── SET EDITS ─────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn set_weight(&mut self, path: SetPath, weight: Weight) -> Result<(), SessionError> {
        self.edit(|s| s.update_set(path, |set| set.with_weight(weight)))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn set_reps(&mut self, path: SetPath, reps: u32) -> Result<(), SessionError> {
        self.edit(|s| s.update_set(path, |set| set.with_reps(reps)))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn set_effort(
        &mut self,
        path: SetPath,
        effort: Option<Effort>,
    ) -> Result<(), SessionError> {
        self.edit(|s| s.update_set(path, |set| set.with_effort(effort)))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn set_time(&mut self, path: SetPath, secs: Option<u32>) -> Result<(), SessionError> {
        self.edit(|s| s.update_set(path, |set| set.with_time_secs(secs)))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn set_distance(&mut self, path: SetPath, meters: Option<f64>) -> Result<(), SessionError> {
        self.edit(|s| s.update_set(path, |set| set.with_distance_m(meters)))
    }

    /// Mark a set done or not done.
    ///
    /// Completing a set that was not completed starts the rest countdown with
    /// the exercise's rest, or the configured default. Un-completing leaves a
    /// running countdown alone.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    ///
    /// # Panics
    ///
    /// Panics if either index of `path` is out of range.
    pub fn set_completed(&mut self, path: SetPath, completed: bool) -> Result<(), SessionError> {
        self.ensure_active()?;
        let was_completed = self.session.set(path).is_completed();
        let rest = self.session.exercises()[path.exercise].rest_secs();

        self.session = self
            .session
            .update_set(path, |set| set.with_completed(completed));

        if completed && !was_completed {
            self.timer.start(self.settings.rest_for(rest));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn add_set(&mut self, exercise: usize) -> Result<(), SessionError> {
        self.edit(|s| s.add_set(exercise))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn remove_set(&mut self, path: SetPath) -> Result<(), SessionError> {
        self.edit(|s| s.remove_set(path))
    }

    //
    // ─── EXERCISE & SESSION EDITS ──────────────────────────────────────────────
    //

    /// Append picked exercises, each seeded with the configured number of sets.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn add_exercises(
        &mut self,
        exercises: impl IntoIterator<Item = Exercise>,
    ) -> Result<(), SessionError> {
        self.ensure_active()?;
        let added = Hydrator::new(&self.settings).added_exercises(exercises);
        self.session = self.session.append_exercises(added);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn remove_exercise(&mut self, index: usize) -> Result<(), SessionError> {
        self.edit(|s| s.remove_exercise(index))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn set_exercise_note(
        &mut self,
        index: usize,
        note: Option<String>,
    ) -> Result<(), SessionError> {
        self.edit(|s| s.update_exercise(index, |e| e.with_note(note)))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn set_note(&mut self, note: Option<String>) -> Result<(), SessionError> {
        self.edit(|s| s.with_note(note))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the workout was finished.
    pub fn rename(&mut self, name: &str) -> Result<(), SessionError> {
        self.edit(|s| s.with_name(name))
    }

    //
    // ─── REST TIMER ────────────────────────────────────────────────────────────
    //

    /// Start a manual countdown, replacing any running one.
    pub fn start_rest(&self, secs: u32) {
        if self.is_active() {
            self.timer.start(secs);
        }
    }

    pub fn add_rest_time(&self, secs: u32) {
        self.timer.add_time(secs);
    }

    pub fn stop_rest(&self) {
        self.timer.stop();
    }

    //
    // ─── END OF WORKOUT ────────────────────────────────────────────────────────
    //

    /// Finalize, persist once, and stop the timer and clock.
    ///
    /// A rejected finish leaves the workout running and editable. A storage
    /// failure also leaves it unfinished so the call can be retried; a
    /// session that was already written is not written again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finish` when nothing was completed,
    /// `SessionError::Storage` when persistence fails, and
    /// `SessionError::Completed` if the workout was already finished.
    pub async fn finish(&mut self) -> Result<FinishedWorkout, SessionError> {
        let saved = match &self.phase {
            Phase::Finished => return Err(SessionError::Completed),
            Phase::Saved(finished) => Some(finished.clone()),
            Phase::Active => None,
        };

        let finished = match saved {
            Some(finished) => finished,
            None => {
                let prior = self.history.prior_bests(&self.session).await;
                let duration_secs = self.clock.elapsed_secs();
                let session_id = self.session.id();
                let finished = finalize(&self.session, &prior, duration_secs).inspect_err(|err| {
                    tracing::info!(%session_id, error = %err, "finish rejected");
                })?;
                self.sessions.save_session(&finished.session).await?;
                self.phase = Phase::Saved(finished.clone());
                finished
            }
        };

        self.stats
            .record_workout_completed(
                finished.stats.volume_kg,
                finished.stats.duration_secs,
                finished.stats.pr_count,
            )
            .await?;

        self.phase = Phase::Finished;
        self.timer.stop();
        self.clock.shutdown().await;
        self.session = finished.session.clone();

        tracing::info!(
            session_id = %finished.session.id(),
            duration_secs = finished.stats.duration_secs,
            volume_kg = finished.stats.volume_kg,
            pr_count = finished.stats.pr_count,
            "workout finished"
        );
        Ok(finished)
    }

    /// Abandon the workout without persisting anything.
    pub async fn discard(mut self) {
        self.timer.stop();
        self.clock.shutdown().await;
        tracing::info!(session_id = %self.session.id(), "workout discarded");
    }

    fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active)
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(SessionError::Completed)
        }
    }

    fn edit<F>(&mut self, f: F) -> Result<(), SessionError>
    where
        F: FnOnce(&WorkoutSession) -> WorkoutSession,
    {
        self.ensure_active()?;
        self.session = f(&self.session);
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
