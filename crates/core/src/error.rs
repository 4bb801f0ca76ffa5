use thiserror::Error;

use crate::finish::FinishError;
use crate::model::{EffortError, ExerciseError, SettingsError, TemplateError, WeightError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Weight(#[from] WeightError),
    #[error(transparent)]
    Effort(#[from] EffortError),
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Finish(#[from] FinishError),
}
