//! Turns a live session tree into the persistable result.
//!
//! Per exercise, in session order: exercises without sets are dropped,
//! incomplete sets are kept untouched, and every completed set that ties the
//! session maximum is flagged as a personal record when that maximum strictly
//! beats the prior best (or there is no prior best).

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::model::{ExerciseId, SessionExercise, Weight, WorkoutSession, WorkoutSet};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FinishError {
    #[error("workout has no completed exercises")]
    NoCompletedExercises,
}

/// Best known prior weight per exercise, as reported by history.
///
/// An exercise without an entry has no history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorBests(HashMap<ExerciseId, Weight>);

impl PriorBests {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the lookup result for one exercise; `None` means no history.
    pub fn insert(&mut self, exercise_id: ExerciseId, best: Option<Weight>) {
        match best {
            Some(weight) => {
                self.0.insert(exercise_id, weight);
            }
            None => {
                self.0.remove(&exercise_id);
            }
        }
    }

    #[must_use]
    pub fn get(&self, exercise_id: ExerciseId) -> Option<Weight> {
        self.0.get(&exercise_id).copied()
    }
}

impl FromIterator<(ExerciseId, Option<Weight>)> for PriorBests {
    fn from_iter<T: IntoIterator<Item = (ExerciseId, Option<Weight>)>>(iter: T) -> Self {
        let mut bests = Self::new();
        for (id, best) in iter {
            bests.insert(id, best);
        }
        bests
    }
}

/// Profile-stat deltas produced by one finished workout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkoutStatsDelta {
    pub volume_kg: f64,
    pub duration_secs: u64,
    pub pr_count: u32,
    pub workouts: u32,
}

/// The finalized session plus its stat deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedWorkout {
    pub session: WorkoutSession,
    pub stats: WorkoutStatsDelta,
}

/// Validate, prune and flag personal records.
///
/// The input tree is not modified; a rejected finish leaves the caller's
/// session exactly as it was.
///
/// # Errors
///
/// Returns `FinishError::NoCompletedExercises` if nothing completed survives pruning.
pub fn finalize(
    session: &WorkoutSession,
    prior: &PriorBests,
    duration_secs: u64,
) -> Result<FinishedWorkout, FinishError> {
    let exercises: Vec<Arc<SessionExercise>> = session
        .exercises()
        .iter()
        .filter(|entry| !entry.sets().is_empty())
        .map(|entry| flag_records(entry, prior.get(entry.exercise_id())))
        .collect();

    let finished = session
        .with_exercises(exercises)
        .with_duration_secs(duration_secs);

    if finished.completed_set_count() == 0 {
        return Err(FinishError::NoCompletedExercises);
    }

    let pr_count = finished
        .exercises()
        .iter()
        .flat_map(|e| e.sets().iter())
        .filter(|s| s.is_personal_record())
        .count();

    let stats = WorkoutStatsDelta {
        volume_kg: finished.completed_volume_kg(),
        duration_secs,
        pr_count: u32::try_from(pr_count).unwrap_or(u32::MAX),
        workouts: 1,
    };

    Ok(FinishedWorkout {
        session: finished,
        stats,
    })
}

/// Heaviest completed load for an exercise; `None` when nothing was completed.
#[must_use]
pub fn record_candidate(entry: &SessionExercise) -> Option<Weight> {
    entry.completed_sets().map(WorkoutSet::weight).max()
}

fn flag_records(
    entry: &Arc<SessionExercise>,
    prior_best: Option<Weight>,
) -> Arc<SessionExercise> {
    let record = record_candidate(entry).filter(|max| match prior_best {
        Some(best) => *max > best,
        None => true,
    });

    let sets = entry
        .sets()
        .iter()
        .map(|set| {
            let is_pr = set.is_completed() && Some(set.weight()) == record;
            if set.is_personal_record() == is_pr {
                Arc::clone(set)
            } else {
                Arc::new(WorkoutSet::clone(set).with_personal_record(is_pr))
            }
        })
        .collect();

    Arc::new(entry.with_sets(sets))
}
