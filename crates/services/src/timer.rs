//! Cancellable rest countdown between sets.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

const TICK: Duration = Duration::from_secs(1);

/// Observable state of the rest timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimerState {
    pub is_running: bool,
    pub remaining_secs: u32,
    pub total_secs: u32,
}

impl TimerState {
    /// Remaining over total; zero when no countdown was ever started.
    ///
    /// Not clamped: extending a countdown can push it above 1.0.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        f64::from(self.remaining_secs) / f64::from(self.total_secs)
    }
}

struct Countdown {
    generation: u64,
    state: TimerState,
    task: Option<JoinHandle<()>>,
}

/// Single owner of the rest countdown.
///
/// At most one countdown task exists at a time. Every `start` bumps the
/// generation under the same lock that guards the state, and a tick only
/// applies while its generation is current.
pub struct RestTimer {
    runtime: Handle,
    inner: Arc<Mutex<Countdown>>,
    updates: Arc<watch::Sender<TimerState>>,
}

impl std::fmt::Debug for RestTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTimer")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RestTimer {
    /// Create an idle timer that spawns its countdowns on `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        let (updates, _) = watch::channel(TimerState::default());
        Self {
            runtime,
            inner: Arc::new(Mutex::new(Countdown {
                generation: 0,
                state: TimerState::default(),
                task: None,
            })),
            updates: Arc::new(updates),
        }
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        lock(&self.inner).state
    }

    /// Receiver that observes every published state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.updates.subscribe()
    }

    /// Cancel any running countdown and start a new one of `secs` seconds.
    ///
    /// `start(0)` leaves the timer untouched.
    pub fn start(&self, secs: u32) {
        if secs == 0 {
            return;
        }

        let mut guard = lock(&self.inner);
        if let Some(task) = guard.task.take() {
            task.abort();
        }
        guard.generation = guard.generation.wrapping_add(1);
        guard.state = TimerState {
            is_running: true,
            remaining_secs: secs,
            total_secs: secs,
        };
        self.updates.send_replace(guard.state);

        let generation = guard.generation;
        let first_tick = Instant::now() + TICK;
        let inner = Arc::clone(&self.inner);
        let updates = Arc::clone(&self.updates);
        let countdown = run_countdown(inner, updates, generation, first_tick);
        guard.task = Some(self.runtime.spawn(countdown));
        tracing::debug!(secs, generation, "rest timer started");
    }

    /// Extend the running countdown. Ignored while idle; `total_secs` is kept.
    pub fn add_time(&self, secs: u32) {
        let mut guard = lock(&self.inner);
        if !guard.state.is_running {
            return;
        }
        guard.state.remaining_secs = guard.state.remaining_secs.saturating_add(secs);
        self.updates.send_replace(guard.state);
    }

    /// Return to idle, dropping the current countdown.
    pub fn stop(&self) {
        let mut guard = lock(&self.inner);
        if let Some(task) = guard.task.take() {
            task.abort();
        }
        guard.generation = guard.generation.wrapping_add(1);
        if guard.state.is_running {
            guard.state.is_running = false;
            guard.state.remaining_secs = 0;
            self.updates.send_replace(guard.state);
            tracing::debug!("rest timer stopped");
        }
    }

    /// True while a countdown task is alive.
    #[must_use]
    pub fn has_task(&self) -> bool {
        lock(&self.inner)
            .task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for RestTimer {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.inner).task.take() {
            task.abort();
        }
    }
}

fn lock(inner: &Mutex<Countdown>) -> MutexGuard<'_, Countdown> {
    // The guarded data is plain state; a panic mid-update cannot leave it torn.
    inner
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Ticks are scheduled from `first_tick`, fixed when the countdown started,
/// so a late first poll does not shift the countdown.
async fn run_countdown(
    inner: Arc<Mutex<Countdown>>,
    updates: Arc<watch::Sender<TimerState>>,
    generation: u64,
    first_tick: Instant,
) {
    let mut ticks = interval_at(first_tick, TICK);
    loop {
        ticks.tick().await;

        let mut guard = lock(&inner);
        if guard.generation != generation {
            return;
        }
        guard.state.remaining_secs = guard.state.remaining_secs.saturating_sub(1);
        if guard.state.remaining_secs == 0 {
            guard.state.is_running = false;
            guard.task = None;
            updates.send_replace(guard.state);
            tracing::debug!(generation, "rest timer finished");
            return;
        }
        updates.send_replace(guard.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance_secs(secs: u64) {
        for _ in 0..secs {
            tokio::time::advance(Duration::from_secs(1)).await;
            settle().await;
        }
    }

    #[test]
    fn progress_handles_zero_total_and_extension() {
        assert!(TimerState::default().progress().abs() < f64::EPSILON);
        let extended = TimerState {
            is_running: true,
            remaining_secs: 90,
            total_secs: 60,
        };
        assert!((extended.progress() - 1.5).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_to_idle() {
        let timer = RestTimer::new(Handle::current());
        timer.start(3);
        assert_eq!(
            timer.state(),
            TimerState {
                is_running: true,
                remaining_secs: 3,
                total_secs: 3
            }
        );

        advance_secs(1).await;
        assert_eq!(timer.state().remaining_secs, 2);

        advance_secs(2).await;
        let state = timer.state();
        assert!(!state.is_running);
        assert_eq!(state.remaining_secs, 0);
        assert_eq!(state.total_secs, 3);
        assert!(!timer.has_task());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_the_running_countdown() {
        let timer = RestTimer::new(Handle::current());
        timer.start(60);
        tokio::time::advance(Duration::from_millis(500)).await;
        settle().await;
        timer.start(30);

        // The first countdown would have ticked here.
        tokio::time::advance(Duration::from_millis(500)).await;
        settle().await;
        assert_eq!(timer.state().remaining_secs, 30);
        assert_eq!(timer.state().total_secs, 30);

        tokio::time::advance(Duration::from_millis(500)).await;
        settle().await;
        assert_eq!(timer.state().remaining_secs, 29);

        for expected in (25..29).rev() {
            advance_secs(1).await;
            let state = timer.state();
            assert_eq!(state.total_secs, 30);
            assert_eq!(state.remaining_secs, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn watchers_see_only_the_new_countdown_after_restart() {
        let timer = RestTimer::new(Handle::current());
        let mut rx = timer.subscribe();
        timer.start(60);
        timer.start(30);
        assert_eq!(rx.borrow_and_update().total_secs, 30);

        for _ in 0..5 {
            advance_secs(1).await;
            let seen = *rx.borrow_and_update();
            assert_eq!(seen.total_secs, 30);
        }
        assert_eq!(rx.borrow().remaining_secs, 25);
    }

    #[tokio::test(start_paused = true)]
    async fn add_time_extends_only_while_running() {
        let timer = RestTimer::new(Handle::current());
        timer.add_time(30);
        assert_eq!(timer.state(), TimerState::default());

        timer.start(60);
        advance_secs(10).await;
        timer.add_time(30);
        let state = timer.state();
        assert_eq!(state.remaining_secs, 80);
        assert_eq!(state.total_secs, 60);
        assert!(state.progress() > 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_goes_idle_and_ignores_later_ticks() {
        let timer = RestTimer::new(Handle::current());
        timer.start(60);
        advance_secs(2).await;
        timer.stop();
        let stopped = timer.state();
        assert!(!stopped.is_running);

        advance_secs(5).await;
        assert_eq!(timer.state(), stopped);
        assert!(!timer.has_task());
    }

    #[tokio::test(start_paused = true)]
    async fn late_first_poll_keeps_the_start_schedule() {
        let timer = RestTimer::new(Handle::current());
        timer.start(5);

        // The countdown task has not run yet when the clock jumps.
        tokio::time::advance(Duration::from_millis(2_500)).await;
        settle().await;
        assert_eq!(timer.state().remaining_secs, 3);

        tokio::time::advance(Duration::from_millis(500)).await;
        settle().await;
        assert_eq!(timer.state().remaining_secs, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_seconds_is_a_no_op() {
        let timer = RestTimer::new(Handle::current());
        timer.start(0);
        assert!(!timer.state().is_running);
        assert!(!timer.has_task());
    }
}
