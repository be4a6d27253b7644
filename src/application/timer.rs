//! Owned, cancellable scheduled task.
//!
//! A `Timer` holds at most one spawned task. Arming always cancels the
//! previous task first, and dropping the timer cancels whatever it holds,
//! so a timer can never fire twice for the same slot.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Handle to one scheduled background task.
#[derive(Debug)]
pub struct Timer {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self { name, handle: None }
    }

    /// Cancels any armed task, then spawns `task` in its place.
    pub fn arm<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        tracing::trace!(timer = self.name, "armed");
        self.handle = Some(tokio::spawn(task));
    }

    /// Cancels the armed task. Returns true if one was still running.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                if was_running {
                    tracing::trace!(timer = self.name, "cancelled");
                }
                was_running
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Fixed-period ticker whose first tick fires one period from now.
pub fn ticker(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: Arc<AtomicUsize>, period: Duration) -> impl Future<Output = ()> {
        async move {
            let mut ticks = ticker(period);
            loop {
                ticks.tick().await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_leaves_a_single_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut timer = Timer::new("test");

        timer.arm(counting_task(counter.clone(), Duration::from_secs(1)));
        timer.arm(counting_task(counter.clone(), Duration::from_secs(1)));

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut timer = Timer::new("test");
        timer.arm(counting_task(counter.clone(), Duration::from_secs(1)));

        time::sleep(Duration::from_millis(1500)).await;
        assert!(timer.cancel());
        assert!(!timer.is_armed());

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let mut timer = Timer::new("test");
            timer.arm(counting_task(counter.clone(), Duration::from_secs(1)));
        }
        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancel_on_empty_timer_is_a_noop() {
        let mut timer = Timer::new("test");
        assert!(!timer.cancel());
        assert!(!timer.is_armed());
    }
}
