use serde::Serialize;
use thiserror::Error;

use crate::model::exercise::Exercise;
use crate::model::ids::{ExerciseId, TemplateId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateError {
    #[error("template name cannot be empty")]
    EmptyName,

    #[error("too many target sets for {exercise}: {sets}")]
    TooManySets { exercise: ExerciseId, sets: u32 },
}

/// Upper bound on planned sets for one exercise.
pub const MAX_TARGET_SETS: u32 = 50;

/// One exercise slot inside a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateExercise {
    pub exercise: Exercise,
    pub target_sets: u32,
    pub target_reps: u32,
    pub rest_secs: Option<u32>,
    pub note: Option<String>,
}

impl TemplateExercise {
    #[must_use]
    pub fn new(exercise: Exercise, target_sets: u32, target_reps: u32) -> Self {
        Self {
            exercise,
            target_sets,
            target_reps,
            rest_secs: None,
            note: None,
        }
    }

    #[must_use]
    pub fn with_rest_secs(mut self, rest_secs: u32) -> Self {
        self.rest_secs = Some(rest_secs);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn exercise_id(&self) -> ExerciseId {
        self.exercise.id()
    }
}

/// A reusable, named blueprint for a workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    id: TemplateId,
    name: String,
    exercises: Vec<TemplateExercise>,
}

impl Template {
    /// # Errors
    ///
    /// Returns `TemplateError` if the name is blank or a slot plans too many sets.
    pub fn new(
        id: TemplateId,
        name: impl Into<String>,
        exercises: Vec<TemplateExercise>,
    ) -> Result<Self, TemplateError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(TemplateError::EmptyName);
        }
        if let Some(slot) = exercises.iter().find(|e| e.target_sets > MAX_TARGET_SETS) {
            return Err(TemplateError::TooManySets {
                exercise: slot.exercise_id(),
                sets: slot.target_sets,
            });
        }
        Ok(Self {
            id,
            name,
            exercises,
        })
    }

    #[must_use]
    pub fn id(&self) -> TemplateId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn exercises(&self) -> &[TemplateExercise] {
        &self.exercises
    }
}
