#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod session_clock;
pub mod timer;
pub mod workouts;

pub use workout_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, SessionError};
pub use session_clock::SessionClock;
pub use timer::{RestTimer, TimerState};
pub use workouts::{ActiveWorkout, GhostSet, HistoryLookup, WorkoutService};
