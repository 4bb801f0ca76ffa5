use std::sync::Arc;

use serde::Serialize;
use storage::repository::HistoryRepository;
use workout_core::finish::{PriorBests, record_candidate};
use workout_core::model::{ExerciseId, Weight, WorkoutSession};

/// Read-only hint showing what was logged for a set last time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GhostSet {
    pub weight: Weight,
    pub reps: u32,
    pub time_secs: Option<u32>,
    pub distance_m: Option<f64>,
}

/// History reads with failures degraded to "no history".
#[derive(Clone)]
pub struct HistoryLookup {
    history: Arc<dyn HistoryRepository>,
}

impl HistoryLookup {
    #[must_use]
    pub fn new(history: Arc<dyn HistoryRepository>) -> Self {
        Self { history }
    }

    /// Sets of the exercise in its most recent finished session, in set order.
    pub async fn ghost_sets(&self, exercise_id: ExerciseId) -> Vec<GhostSet> {
        let last = match self.history.last_session_for_exercise(exercise_id).await {
            Ok(last) => last,
            Err(err) => {
                tracing::warn!(
                    %exercise_id,
                    error = %err,
                    "history lookup failed; no ghost values"
                );
                None
            }
        };
        last.as_ref()
            .and_then(|session| session.find_exercise(exercise_id))
            .map(|entry| {
                entry
                    .sets()
                    .iter()
                    .map(|set| GhostSet {
                        weight: set.weight(),
                        reps: set.reps(),
                        time_secs: set.time_secs(),
                        distance_m: set.distance_m(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Prior best weight for every exercise in `session` with a completed set.
    ///
    /// A failed lookup counts as no prior record for that exercise.
    pub async fn prior_bests(&self, session: &WorkoutSession) -> PriorBests {
        let mut prior = PriorBests::new();
        let mut seen: Vec<ExerciseId> = Vec::new();
        for entry in session.exercises() {
            let exercise_id = entry.exercise_id();
            if seen.contains(&exercise_id) || record_candidate(entry).is_none() {
                continue;
            }
            seen.push(exercise_id);

            let best = match self.history.best_weight(exercise_id).await {
                Ok(best) => best,
                Err(err) => {
                    tracing::warn!(
                        %exercise_id,
                        error = %err,
                        "prior best lookup failed; treating as none"
                    );
                    None
                }
            };
            prior.insert(exercise_id, best);
        }
        prior
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use storage::repository::{InMemoryRepository, SessionRepository, StorageError};
    use workout_core::model::{Exercise, MeasureType, SessionExercise, SetPath};
    use workout_core::time::fixed_now;

    struct FailingHistory;

    #[async_trait]
    impl HistoryRepository for FailingHistory {
        async fn last_session_for_exercise(
            &self,
            _exercise_id: ExerciseId,
        ) -> Result<Option<WorkoutSession>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn best_weight(
            &self,
            _exercise_id: ExerciseId,
        ) -> Result<Option<Weight>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    fn row() -> Exercise {
        Exercise::new(ExerciseId::new(3), "Barbell Row", "Back", MeasureType::WeightReps).unwrap()
    }

    fn logged(kg: &[f64]) -> WorkoutSession {
        let mut session = WorkoutSession::new("Pull", None, fixed_now() - Duration::days(2))
            .append_exercises([SessionExercise::new(row(), kg.len() as u32, None)]);
        for (i, w) in kg.iter().enumerate() {
            session = session.update_set(SetPath::new(0, i), |s| {
                s.with_weight(Weight::from_kg(*w).unwrap())
                    .with_reps(8)
                    .with_completed(true)
            });
        }
        session
    }

    #[tokio::test]
    async fn ghost_sets_mirror_the_last_session() {
        let repo = InMemoryRepository::new();
        repo.save_session(&logged(&[60.0, 65.0])).await.unwrap();
        let lookup = HistoryLookup::new(Arc::new(repo));

        let ghosts = lookup.ghost_sets(ExerciseId::new(3)).await;
        assert_eq!(ghosts.len(), 2);
        assert_eq!(ghosts[1].weight, Weight::from_kg(65.0).unwrap());
        assert_eq!(ghosts[1].reps, 8);

        assert!(lookup.ghost_sets(ExerciseId::new(4)).await.is_empty());
    }

    #[tokio::test]
    async fn failures_degrade_to_no_history() {
        let lookup = HistoryLookup::new(Arc::new(FailingHistory));
        assert!(lookup.ghost_sets(ExerciseId::new(3)).await.is_empty());

        let prior = lookup.prior_bests(&logged(&[70.0])).await;
        assert_eq!(prior.get(ExerciseId::new(3)), None);
    }

    #[tokio::test]
    async fn prior_bests_skip_exercises_without_candidates() {
        let repo = InMemoryRepository::new();
        repo.save_session(&logged(&[90.0])).await.unwrap();
        let lookup = HistoryLookup::new(Arc::new(repo));

        let untouched = WorkoutSession::new("Pull", None, fixed_now())
            .append_exercises([SessionExercise::new(row(), 2, None)]);
        assert_eq!(lookup.prior_bests(&untouched).await.get(ExerciseId::new(3)), None);

        let prior = lookup.prior_bests(&logged(&[50.0])).await;
        assert_eq!(
            prior.get(ExerciseId::new(3)),
            Some(Weight::from_kg(90.0).unwrap())
        );
    }
}
