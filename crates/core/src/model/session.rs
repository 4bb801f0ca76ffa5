use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::model::exercise::Exercise;
use crate::model::ids::{ExerciseId, SessionExerciseId, SessionId, TemplateId};
use crate::model::set::WorkoutSet;

//
// ─── PATH ──────────────────────────────────────────────────────────────────────
//

/// Address of one set inside a session tree: exercise index, then set index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetPath {
    pub exercise: usize,
    pub set: usize,
}

impl SetPath {
    #[must_use]
    pub fn new(exercise: usize, set: usize) -> Self {
        Self { exercise, set }
    }
}

//
// ─── SESSION EXERCISE ──────────────────────────────────────────────────────────
//

/// One exercise instance inside a session; owns its sets.
///
/// The position of a set in `sets` is its authoritative index. `order_index`
/// on the set records creation order and is not renumbered on removal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionExercise {
    id: SessionExerciseId,
    exercise: Exercise,
    sets: Vec<Arc<WorkoutSet>>,
    note: Option<String>,
    rest_secs: Option<u32>,
}

impl SessionExercise {
    /// A new exercise entry seeded with `set_count` empty sets.
    #[must_use]
    pub fn new(exercise: Exercise, set_count: u32, rest_secs: Option<u32>) -> Self {
        let sets = (0..set_count)
            .map(|i| Arc::new(WorkoutSet::empty(i)))
            .collect();
        Self {
            id: SessionExerciseId::generate(),
            exercise,
            sets,
            note: None,
            rest_secs,
        }
    }

    /// Rehydrate an exercise entry from persisted storage.
    #[must_use]
    pub fn from_persisted(
        id: SessionExerciseId,
        exercise: Exercise,
        sets: Vec<WorkoutSet>,
        note: Option<String>,
        rest_secs: Option<u32>,
    ) -> Self {
        Self {
            id,
            exercise,
            sets: sets.into_iter().map(Arc::new).collect(),
            note,
            rest_secs,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionExerciseId {
        self.id
    }

    #[must_use]
    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    #[must_use]
    pub fn exercise_id(&self) -> ExerciseId {
        self.exercise.id()
    }

    #[must_use]
    pub fn sets(&self) -> &[Arc<WorkoutSet>] {
        &self.sets
    }

    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    #[must_use]
    pub fn rest_secs(&self) -> Option<u32> {
        self.rest_secs
    }

    pub fn completed_sets(&self) -> impl Iterator<Item = &WorkoutSet> {
        self.sets
            .iter()
            .map(|s| &**s)
            .filter(|s| s.is_completed())
    }

    #[must_use]
    pub fn with_note(&self, note: Option<String>) -> Self {
        Self {
            note: normalize_note(note),
            ..self.clone()
        }
    }

    /// Returns a copy with the set at `index` replaced by `f(set)`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn update_set<F>(&self, index: usize, f: F) -> Self
    where
        F: FnOnce(WorkoutSet) -> WorkoutSet,
    {
        assert!(
            index < self.sets.len(),
            "set index {index} out of range for exercise with {} sets",
            self.sets.len()
        );
        let mut sets = self.sets.clone();
        sets[index] = Arc::new(f(WorkoutSet::clone(&self.sets[index])));
        self.with_sets(sets)
    }

    /// Returns a copy with one fresh empty set appended.
    #[must_use]
    pub fn push_empty_set(&self) -> Self {
        let next_order = self
            .sets
            .iter()
            .map(|s| s.order_index() + 1)
            .max()
            .unwrap_or(0);
        let mut sets = self.sets.clone();
        sets.push(Arc::new(WorkoutSet::empty(next_order)));
        self.with_sets(sets)
    }

    /// Returns a copy without the set at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn remove_set(&self, index: usize) -> Self {
        assert!(
            index < self.sets.len(),
            "set index {index} out of range for exercise with {} sets",
            self.sets.len()
        );
        let mut sets = self.sets.clone();
        sets.remove(index);
        self.with_sets(sets)
    }

    pub(crate) fn with_sets(&self, sets: Vec<Arc<WorkoutSet>>) -> Self {
        Self {
            id: self.id,
            exercise: self.exercise.clone(),
            sets,
            note: self.note.clone(),
            rest_secs: self.rest_secs,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Aggregate root of a workout.
///
/// A session is an immutable value. Every edit returns a new session that
/// rebuilds only the path to the changed node and shares every sibling
/// subtree through `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSession {
    id: SessionId,
    template_id: Option<TemplateId>,
    name: String,
    started_at: DateTime<Utc>,
    duration_secs: u64,
    exercises: Vec<Arc<SessionExercise>>,
    note: Option<String>,
}

impl WorkoutSession {
    /// An empty session with a fresh identifier and zero duration.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        template_id: Option<TemplateId>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            template_id,
            name: name.into(),
            started_at,
            duration_secs: 0,
            exercises: Vec::new(),
            note: None,
        }
    }

    /// Rehydrate a session from persisted storage.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: SessionId,
        template_id: Option<TemplateId>,
        name: String,
        started_at: DateTime<Utc>,
        duration_secs: u64,
        exercises: Vec<SessionExercise>,
        note: Option<String>,
    ) -> Self {
        Self {
            id,
            template_id,
            name,
            started_at,
            duration_secs,
            exercises: exercises.into_iter().map(Arc::new).collect(),
            note,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn template_id(&self) -> Option<TemplateId> {
        self.template_id
    }

    /// True for ad hoc sessions that did not come from a template.
    #[must_use]
    pub fn is_quick(&self) -> bool {
        self.template_id.is_none()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    #[must_use]
    pub fn exercises(&self) -> &[Arc<SessionExercise>] {
        &self.exercises
    }

    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Borrow the set at `path`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn set(&self, path: SetPath) -> &WorkoutSet {
        let exercise = self.exercise_at(path.exercise);
        assert!(
            path.set < exercise.sets.len(),
            "set index {} out of range for exercise with {} sets",
            path.set,
            exercise.sets.len()
        );
        &exercise.sets[path.set]
    }

    /// Find the first entry for a catalog exercise.
    #[must_use]
    pub fn find_exercise(&self, exercise_id: ExerciseId) -> Option<&SessionExercise> {
        self.exercises
            .iter()
            .map(|e| &**e)
            .find(|e| e.exercise_id() == exercise_id)
    }

    /// Number of completed sets across all exercises.
    #[must_use]
    pub fn completed_set_count(&self) -> usize {
        self.exercises
            .iter()
            .map(|e| e.completed_sets().count())
            .sum()
    }

    /// Σ weight × reps over completed sets, in kilograms.
    #[must_use]
    pub fn completed_volume_kg(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| e.completed_sets())
            .map(WorkoutSet::volume_kg)
            .sum()
    }

    /// Returns a new session where the set at `path` is replaced by `f(set)`.
    ///
    /// Every field edit (weight, reps, effort, completion, time, distance)
    /// goes through this primitive.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn update_set<F>(&self, path: SetPath, f: F) -> Self
    where
        F: FnOnce(WorkoutSet) -> WorkoutSet,
    {
        self.update_exercise(path.exercise, |exercise| exercise.update_set(path.set, f))
    }

    /// Returns a new session where the exercise at `index` is replaced by `f(exercise)`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn update_exercise<F>(&self, index: usize, f: F) -> Self
    where
        F: FnOnce(&SessionExercise) -> SessionExercise,
    {
        let current = self.exercise_at(index);
        let mut exercises = self.exercises.clone();
        exercises[index] = Arc::new(f(current));
        self.with_exercises(exercises)
    }

    /// Returns a new session with an empty set appended to exercise `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn add_set(&self, exercise: usize) -> Self {
        self.update_exercise(exercise, SessionExercise::push_empty_set)
    }

    /// Returns a new session without the set at `path`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn remove_set(&self, path: SetPath) -> Self {
        self.update_exercise(path.exercise, |exercise| exercise.remove_set(path.set))
    }

    /// Returns a new session with `added` appended after the existing exercises.
    #[must_use]
    pub fn append_exercises(&self, added: impl IntoIterator<Item = SessionExercise>) -> Self {
        let mut exercises = self.exercises.clone();
        exercises.extend(added.into_iter().map(Arc::new));
        self.with_exercises(exercises)
    }

    /// Returns a new session without the exercise at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn remove_exercise(&self, index: usize) -> Self {
        let _ = self.exercise_at(index);
        let mut exercises = self.exercises.clone();
        exercises.remove(index);
        self.with_exercises(exercises)
    }

    #[must_use]
    pub fn with_note(&self, note: Option<String>) -> Self {
        let mut next = self.with_exercises(self.exercises.clone());
        next.note = normalize_note(note);
        next
    }

    /// Returns a renamed session; a blank name keeps the current one.
    #[must_use]
    pub fn with_name(&self, name: &str) -> Self {
        let mut next = self.with_exercises(self.exercises.clone());
        let name = name.trim();
        if !name.is_empty() {
            next.name = name.to_string();
        }
        next
    }

    pub(crate) fn with_exercises(&self, exercises: Vec<Arc<SessionExercise>>) -> Self {
        Self {
            id: self.id,
            template_id: self.template_id,
            name: self.name.clone(),
            started_at: self.started_at,
            duration_secs: self.duration_secs,
            exercises,
            note: self.note.clone(),
        }
    }

    pub(crate) fn with_duration_secs(mut self, duration_secs: u64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    fn exercise_at(&self, index: usize) -> &SessionExercise {
        assert!(
            index < self.exercises.len(),
            "exercise index {index} out of range for session with {} exercises",
            self.exercises.len()
        );
        &self.exercises[index]
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MeasureType, Weight};
    use crate::time::fixed_now;

    fn exercise(id: u64) -> Exercise {
        Exercise::new(ExerciseId::new(id), format!("Ex {id}"), "Test", MeasureType::WeightReps)
            .unwrap()
    }

    fn session_with(counts: &[u32]) -> WorkoutSession {
        let entries = counts
            .iter()
            .enumerate()
            .map(|(i, n)| SessionExercise::new(exercise(i as u64 + 1), *n, None));
        WorkoutSession::new("Test", None, fixed_now()).append_exercises(entries)
    }

    #[test]
    fn update_set_shares_untouched_exercises() {
        let before = session_with(&[3, 2, 4]);
        let after = before.update_set(SetPath::new(1, 0), |s| s.with_reps(8));

        assert!(Arc::ptr_eq(&before.exercises()[0], &after.exercises()[0]));
        assert!(Arc::ptr_eq(&before.exercises()[2], &after.exercises()[2]));
        assert!(!Arc::ptr_eq(&before.exercises()[1], &after.exercises()[1]));

        // Sibling sets inside the edited exercise are shared too.
        assert!(Arc::ptr_eq(
            &before.exercises()[1].sets()[1],
            &after.exercises()[1].sets()[1]
        ));
        assert_eq!(after.set(SetPath::new(1, 0)).reps(), 8);
        assert_eq!(before.set(SetPath::new(1, 0)).reps(), 0);
    }

    #[test]
    fn update_set_keeps_session_identity() {
        let before = session_with(&[1]);
        let after = before.update_set(SetPath::new(0, 0), |s| {
            s.with_weight(Weight::from_kg(60.0).unwrap())
        });
        assert_eq!(before.id(), after.id());
        assert_eq!(before.exercises()[0].id(), after.exercises()[0].id());
        assert_eq!(
            before.set(SetPath::new(0, 0)).id(),
            after.set(SetPath::new(0, 0)).id()
        );
    }

    #[test]
    fn remove_set_preserves_order_and_ids() {
        let session = session_with(&[3]);
        let ids: Vec<_> = session.exercises()[0].sets().iter().map(|s| s.id()).collect();

        let after = session.remove_set(SetPath::new(0, 1));
        let remaining: Vec<_> = after.exercises()[0].sets().iter().map(|s| s.id()).collect();
        assert_eq!(remaining, vec![ids[0], ids[2]]);
        assert_eq!(after.exercises()[0].sets()[1].order_index(), 2);
    }

    #[test]
    fn add_set_appends_after_highest_order_index() {
        let session = session_with(&[3]).remove_set(SetPath::new(0, 2));
        let after = session.add_set(0);
        let sets = after.exercises()[0].sets();
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[2].order_index(), 2);
        assert!(sets[2].weight().is_zero());
        assert!(!sets[2].is_completed());
    }

    #[test]
    fn append_exercises_never_reorders() {
        let session = session_with(&[1, 1]);
        let first = session.exercises()[0].id();
        let second = session.exercises()[1].id();
        let after = session.append_exercises([SessionExercise::new(exercise(9), 3, None)]);
        assert_eq!(after.exercises()[0].id(), first);
        assert_eq!(after.exercises()[1].id(), second);
        assert_eq!(after.exercises()[2].exercise_id(), ExerciseId::new(9));
    }

    #[test]
    #[should_panic(expected = "exercise index 5 out of range")]
    fn out_of_range_exercise_panics() {
        let session = session_with(&[1]);
        let _ = session.update_set(SetPath::new(5, 0), |s| s);
    }

    #[test]
    #[should_panic(expected = "set index 3 out of range")]
    fn out_of_range_set_panics() {
        let session = session_with(&[3]);
        let _ = session.remove_set(SetPath::new(0, 3));
    }

    #[test]
    fn rename_ignores_blank_names() {
        let session = session_with(&[2]);
        let renamed = session.with_name("  Push Day ");
        assert_eq!(renamed.name(), "Push Day");
        assert!(Arc::ptr_eq(&session.exercises()[0], &renamed.exercises()[0]));
        assert_eq!(renamed.with_name("   ").name(), "Push Day");
    }

    #[test]
    fn blank_notes_are_cleared() {
        let session = session_with(&[1]).with_note(Some("   ".into()));
        assert_eq!(session.note(), None);
        let noted = session.update_exercise(0, |e| e.with_note(Some(" slow eccentric ".into())));
        assert_eq!(noted.exercises()[0].note(), Some("slow eccentric"));
    }
}
