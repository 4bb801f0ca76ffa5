use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ExerciseId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise name cannot be empty")]
    EmptyName,
}

/// How performance of an exercise is measured.
///
/// Sets do not carry their own measure; they inherit it from the exercise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureType {
    #[default]
    WeightReps,
    RepsOnly,
    TimeOnly,
    DistanceTime,
}

impl MeasureType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureType::WeightReps => "weight_reps",
            MeasureType::RepsOnly => "reps_only",
            MeasureType::TimeOnly => "time_only",
            MeasureType::DistanceTime => "distance_time",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "weight_reps" => Some(Self::WeightReps),
            "reps_only" => Some(Self::RepsOnly),
            "time_only" => Some(Self::TimeOnly),
            "distance_time" => Some(Self::DistanceTime),
            _ => None,
        }
    }

    /// Whether the load column is meaningful for this measure.
    #[must_use]
    pub fn uses_weight(&self) -> bool {
        matches!(self, MeasureType::WeightReps)
    }
}

/// A catalog exercise definition.
///
/// Owned by the catalog; sessions hold a snapshot and never edit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    id: ExerciseId,
    name: String,
    category: String,
    measure: MeasureType,
}

impl Exercise {
    /// # Errors
    ///
    /// Returns `ExerciseError::EmptyName` if the trimmed name is empty.
    pub fn new(
        id: ExerciseId,
        name: impl Into<String>,
        category: impl Into<String>,
        measure: MeasureType,
    ) -> Result<Self, ExerciseError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ExerciseError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            category: category.into().trim().to_string(),
            measure,
        })
    }

    #[must_use]
    pub fn id(&self) -> ExerciseId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn measure(&self) -> MeasureType {
        self.measure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank_names() {
        let ok = Exercise::new(ExerciseId::new(1), "  Squat ", "Legs", MeasureType::WeightReps)
            .unwrap();
        assert_eq!(ok.name(), "Squat");

        let err = Exercise::new(ExerciseId::new(2), "   ", "Legs", MeasureType::RepsOnly)
            .unwrap_err();
        assert_eq!(err, ExerciseError::EmptyName);
    }

    #[test]
    fn measure_type_string_roundtrip() {
        for m in [
            MeasureType::WeightReps,
            MeasureType::RepsOnly,
            MeasureType::TimeOnly,
            MeasureType::DistanceTime,
        ] {
            assert_eq!(MeasureType::parse(m.as_str()), Some(m));
        }
        assert_eq!(MeasureType::parse("bogus"), None);
    }
}
