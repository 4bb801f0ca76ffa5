mod exercise;
mod ids;
mod session;
mod set;
mod settings;
mod template;
mod weight;

pub use ids::{ExerciseId, ParseIdError, SessionExerciseId, SessionId, SetId, TemplateId};

pub use exercise::{Exercise, ExerciseError, MeasureType};
pub use session::{SessionExercise, SetPath, WorkoutSession};
pub use set::{Effort, EffortError, WorkoutSet};
pub use settings::{
    DEFAULT_ADDED_EXERCISE_SETS, DEFAULT_QUICK_WORKOUT_NAME, DEFAULT_REST_SECS, SessionSettings,
    SessionSettingsDraft, SettingsError,
};
pub use template::{MAX_TARGET_SETS, Template, TemplateError, TemplateExercise};
pub use weight::{Weight, WeightError};
