use thiserror::Error;

/// Rest applied when an exercise has no configured rest duration.
pub const DEFAULT_REST_SECS: u32 = 90;
/// Sets seeded for an exercise added mid-session.
pub const DEFAULT_ADDED_EXERCISE_SETS: u32 = 3;
pub const DEFAULT_QUICK_WORKOUT_NAME: &str = "Quick Workout";

/// Tunables for the active-session engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    default_rest_secs: u32,
    quick_workout_name: String,
    added_exercise_sets: u32,
}

#[derive(Clone, Debug, Default)]
pub struct SessionSettingsDraft {
    pub default_rest_secs: Option<u32>,
    pub quick_workout_name: Option<String>,
    pub added_exercise_sets: Option<u32>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("default rest must be between 1 and 3600 seconds")]
    InvalidRestSecs,

    #[error("sets for an added exercise must be between 1 and 20")]
    InvalidAddedExerciseSets,
}

impl SessionSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and fill defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a provided value is out of range.
    pub fn validate(self) -> Result<SessionSettings, SettingsError> {
        let default_rest_secs = self.default_rest_secs.unwrap_or(DEFAULT_REST_SECS);
        if !(1..=3600).contains(&default_rest_secs) {
            return Err(SettingsError::InvalidRestSecs);
        }

        let added_exercise_sets = self
            .added_exercise_sets
            .unwrap_or(DEFAULT_ADDED_EXERCISE_SETS);
        if !(1..=20).contains(&added_exercise_sets) {
            return Err(SettingsError::InvalidAddedExerciseSets);
        }

        let quick_workout_name = self
            .quick_workout_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_QUICK_WORKOUT_NAME.to_string());

        Ok(SessionSettings {
            default_rest_secs,
            quick_workout_name,
            added_exercise_sets,
        })
    }
}

impl SessionSettings {
    #[must_use]
    pub fn default_rest_secs(&self) -> u32 {
        self.default_rest_secs
    }

    #[must_use]
    pub fn quick_workout_name(&self) -> &str {
        &self.quick_workout_name
    }

    #[must_use]
    pub fn added_exercise_sets(&self) -> u32 {
        self.added_exercise_sets
    }

    /// Rest to use for an exercise, falling back to the default.
    #[must_use]
    pub fn rest_for(&self, configured: Option<u32>) -> u32 {
        configured
            .filter(|secs| *secs > 0)
            .unwrap_or(self.default_rest_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_rest_secs: DEFAULT_REST_SECS,
            quick_workout_name: DEFAULT_QUICK_WORKOUT_NAME.to_string(),
            added_exercise_sets: DEFAULT_ADDED_EXERCISE_SETS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_matches_default() {
        let settings = SessionSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, SessionSettings::default());
        assert_eq!(settings.default_rest_secs(), 90);
        assert_eq!(settings.added_exercise_sets(), 3);
    }

    #[test]
    fn blank_quick_name_falls_back() {
        let settings = SessionSettingsDraft {
            quick_workout_name: Some("   ".into()),
            ..SessionSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.quick_workout_name(), DEFAULT_QUICK_WORKOUT_NAME);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = SessionSettingsDraft {
            default_rest_secs: Some(0),
            ..SessionSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, SettingsError::InvalidRestSecs);

        let err = SessionSettingsDraft {
            added_exercise_sets: Some(40),
            ..SessionSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, SettingsError::InvalidAddedExerciseSets);
    }

    #[test]
    fn rest_for_prefers_configured_value() {
        let settings = SessionSettings::default();
        assert_eq!(settings.rest_for(Some(120)), 120);
        assert_eq!(settings.rest_for(Some(0)), 90);
        assert_eq!(settings.rest_for(None), 90);
    }
}
