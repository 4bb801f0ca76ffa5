mod active;
mod history;
mod workflow;

// Public API of the workout subsystem.
pub use crate::error::SessionError;
pub use active::ActiveWorkout;
pub use history::{GhostSet, HistoryLookup};
pub use workflow::WorkoutService;
