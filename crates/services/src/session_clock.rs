//! Elapsed-time clock for a running workout.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Publishes whole seconds since the workout started, once per second.
///
/// Every published value is recomputed from the monotonic start instant, so
/// late or skipped ticks never accumulate error.
#[derive(Debug)]
pub struct SessionClock {
    started: Instant,
    elapsed: watch::Receiver<u64>,
    task: Option<JoinHandle<()>>,
    stopped_at: Option<u64>,
}

impl SessionClock {
    /// Record the start instant now and spawn the ticking task on `runtime`.
    #[must_use]
    pub fn start(runtime: &Handle) -> Self {
        let started = Instant::now();
        let (tx, elapsed) = watch::channel(0_u64);
        let task = runtime.spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticks = interval_at(started + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                if tx.send(started.elapsed().as_secs()).is_err() {
                    return;
                }
            }
        });
        Self {
            started,
            elapsed,
            task: Some(task),
            stopped_at: None,
        }
    }

    /// Whole seconds since start, floored; frozen once the clock is shut down.
    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.stopped_at
            .unwrap_or_else(|| self.started.elapsed().as_secs())
    }

    /// Receiver for the per-second elapsed values.
    ///
    /// The channel closes when the clock shuts down.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop ticking and wait for the task to be gone.
    pub async fn shutdown(&mut self) {
        if self.stopped_at.is_none() {
            self.stopped_at = Some(self.started.elapsed().as_secs());
        }
        if let Some(task) = self.task.take() {
            task.abort();
            // Cancellation is the expected outcome.
            let _ = task.await;
        }
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
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

    #[tokio::test(start_paused = true)]
    async fn publishes_floor_of_elapsed_time() {
        let clock = SessionClock::start(&Handle::current());
        let mut rx = clock.subscribe();
        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(1)).await;
            settle().await;
        }
        assert_eq!(*rx.borrow_and_update(), 5);

        tokio::time::advance(Duration::from_millis(700)).await;
        settle().await;
        assert_eq!(clock.elapsed_secs(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_ticks_do_not_drift() {
        let clock = SessionClock::start(&Handle::current());
        let mut rx = clock.subscribe();

        // Irregular scheduling, including one long stall.
        let steps_ms = [1_300_u64, 700, 2_900, 100, 15_000, 1_000, 1_000];
        for step in steps_ms {
            tokio::time::advance(Duration::from_millis(step)).await;
            settle().await;
        }
        let total_ms: u64 = steps_ms.iter().sum();
        assert_eq!(*rx.borrow_and_update(), total_ms / 1000);
        assert_eq!(clock.elapsed_secs(), total_ms / 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn half_hour_with_jitter_stays_in_tolerance() {
        let clock = SessionClock::start(&Handle::current());
        let mut jitter = [250_u64, 1_750, 900, 1_100].into_iter().cycle();
        let mut advanced = 0_u64;
        while advanced < 1_800_000 {
            let step = jitter.next().unwrap_or(1_000).min(1_800_000 - advanced);
            tokio::time::advance(Duration::from_millis(step)).await;
            advanced += step;
        }
        settle().await;

        let elapsed = clock.elapsed_secs();
        assert!((1795..=1805).contains(&elapsed), "elapsed = {elapsed}");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_terminates_the_task_and_closes_the_channel() {
        let mut clock = SessionClock::start(&Handle::current());
        let mut rx = clock.subscribe();
        assert!(clock.is_running());

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        clock.shutdown().await;
        assert!(!clock.is_running());
        assert_eq!(clock.elapsed_secs(), 3);

        let _ = rx.borrow_and_update();
        assert!(rx.changed().await.is_err());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(clock.elapsed_secs(), 3);
    }
}
