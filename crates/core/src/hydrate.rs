//! Builds the initial session tree for a workout attempt.

use chrono::{DateTime, Utc};

use crate::model::{Exercise, SessionExercise, SessionSettings, Template, WorkoutSession};

/// Creates session trees from templates, from nothing, or extends a live one.
pub struct Hydrator<'a> {
    settings: &'a SessionSettings,
}

impl<'a> Hydrator<'a> {
    #[must_use]
    pub fn new(settings: &'a SessionSettings) -> Self {
        Self { settings }
    }

    /// One exercise entry per template slot, in template order, each with
    /// exactly `target_sets` fresh empty sets.
    #[must_use]
    pub fn from_template(&self, template: &Template, started_at: DateTime<Utc>) -> WorkoutSession {
        let entries = template.exercises().iter().map(|slot| {
            let entry =
                SessionExercise::new(slot.exercise.clone(), slot.target_sets, slot.rest_secs);
            match slot.note.as_ref() {
                Some(note) => entry.with_note(Some(note.clone())),
                None => entry,
            }
        });
        WorkoutSession::new(template.name(), Some(template.id()), started_at)
            .append_exercises(entries)
    }

    /// An ad hoc session with no exercises and the configured default name.
    #[must_use]
    pub fn quick(&self, started_at: DateTime<Utc>) -> WorkoutSession {
        WorkoutSession::new(self.settings.quick_workout_name(), None, started_at)
    }

    /// Entries for exercises picked while the session is running.
    #[must_use]
    pub fn added_exercises(
        &self,
        exercises: impl IntoIterator<Item = Exercise>,
    ) -> Vec<SessionExercise> {
        exercises
            .into_iter()
            .map(|exercise| {
                SessionExercise::new(exercise, self.settings.added_exercise_sets(), None)
            })
            .collect()
    }
}
