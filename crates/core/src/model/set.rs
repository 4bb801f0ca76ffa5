use serde::Serialize;
use thiserror::Error;

use crate::model::ids::SetId;
use crate::model::weight::Weight;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum EffortError {
    #[error("RPE must be between 1 and 10, got {0}")]
    InvalidRpe(f32),

    #[error("RIR must be between 0 and 10, got {0}")]
    InvalidRir(u8),
}

/// Perceived effort for a set: either RPE (1–10, half steps allowed) or reps in reserve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Effort {
    Rpe(f32),
    Rir(u8),
}

impl Effort {
    /// # Errors
    ///
    /// Returns `EffortError::InvalidRpe` if outside `1.0..=10.0`.
    pub fn rpe(value: f32) -> Result<Self, EffortError> {
        if !value.is_finite() || !(1.0..=10.0).contains(&value) {
            return Err(EffortError::InvalidRpe(value));
        }
        Ok(Self::Rpe(value))
    }

    /// # Errors
    ///
    /// Returns `EffortError::InvalidRir` if above 10.
    pub fn rir(value: u8) -> Result<Self, EffortError> {
        if value > 10 {
            return Err(EffortError::InvalidRir(value));
        }
        Ok(Self::Rir(value))
    }
}

/// One performed (or planned) set.
///
/// Values are immutable; every edit produces a new set through the `with_*`
/// methods. `is_personal_record` is only ever set by the finish engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSet {
    id: SetId,
    order_index: u32,
    weight: Weight,
    reps: u32,
    completed: bool,
    effort: Option<Effort>,
    is_personal_record: bool,
    time_secs: Option<u32>,
    distance_m: Option<f64>,
}

impl WorkoutSet {
    /// A fresh, empty set with a new identifier.
    #[must_use]
    pub fn empty(order_index: u32) -> Self {
        Self {
            id: SetId::generate(),
            order_index,
            weight: Weight::ZERO,
            reps: 0,
            completed: false,
            effort: None,
            is_personal_record: false,
            time_secs: None,
            distance_m: None,
        }
    }

    /// Rehydrate a set from persisted storage.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: SetId,
        order_index: u32,
        weight: Weight,
        reps: u32,
        completed: bool,
        effort: Option<Effort>,
        is_personal_record: bool,
        time_secs: Option<u32>,
        distance_m: Option<f64>,
    ) -> Self {
        Self {
            id,
            order_index,
            weight,
            reps,
            completed,
            effort,
            is_personal_record,
            time_secs,
            distance_m,
        }
    }

    #[must_use]
    pub fn id(&self) -> SetId {
        self.id
    }

    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    #[must_use]
    pub fn weight(&self) -> Weight {
        self.weight
    }

    #[must_use]
    pub fn reps(&self) -> u32 {
        self.reps
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn effort(&self) -> Option<Effort> {
        self.effort
    }

    #[must_use]
    pub fn is_personal_record(&self) -> bool {
        self.is_personal_record
    }

    #[must_use]
    pub fn time_secs(&self) -> Option<u32> {
        self.time_secs
    }

    #[must_use]
    pub fn distance_m(&self) -> Option<f64> {
        self.distance_m
    }

    /// Load moved by this set in kilogram-reps.
    #[must_use]
    pub fn volume_kg(&self) -> f64 {
        self.weight.kg() * f64::from(self.reps)
    }

    #[must_use]
    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub fn with_reps(mut self, reps: u32) -> Self {
        self.reps = reps;
        self
    }

    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    #[must_use]
    pub fn with_effort(mut self, effort: Option<Effort>) -> Self {
        self.effort = effort;
        self
    }

    #[must_use]
    pub fn with_time_secs(mut self, time_secs: Option<u32>) -> Self {
        self.time_secs = time_secs;
        self
    }

    #[must_use]
    pub fn with_distance_m(mut self, distance_m: Option<f64>) -> Self {
        self.distance_m = distance_m.filter(|d| d.is_finite() && *d >= 0.0);
        self
    }

    pub(crate) fn with_personal_record(mut self, is_pr: bool) -> Self {
        self.is_personal_record = is_pr;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_zeroed_fields() {
        let set = WorkoutSet::empty(2);
        assert_eq!(set.order_index(), 2);
        assert!(set.weight().is_zero());
        assert_eq!(set.reps(), 0);
        assert!(!set.is_completed());
        assert!(set.effort().is_none());
        assert!(!set.is_personal_record());
    }

    #[test]
    fn edits_keep_identifier() {
        let set = WorkoutSet::empty(0);
        let id = set.id();
        let edited = set
            .with_weight(Weight::from_kg(100.0).unwrap())
            .with_reps(5)
            .with_completed(true);
        assert_eq!(edited.id(), id);
        assert_eq!(edited.volume_kg(), 500.0);
    }

    #[test]
    fn effort_bounds() {
        assert!(Effort::rpe(8.5).is_ok());
        assert!(Effort::rpe(0.5).is_err());
        assert!(Effort::rpe(f32::NAN).is_err());
        assert!(Effort::rir(2).is_ok());
        assert!(Effort::rir(11).is_err());
    }

    #[test]
    fn negative_distance_is_dropped() {
        let set = WorkoutSet::empty(0).with_distance_m(Some(-3.0));
        assert_eq!(set.distance_m(), None);
    }
}
