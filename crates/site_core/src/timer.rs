//! One-shot timers.
//!
//! Flows that need a delayed side effect take an `Arc<dyn Timer>` instead of
//! calling `tokio::time` directly, so tests can drive time with
//! [`ManualTimer`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

pub trait Timer: Send + Sync {
    /// Run `task` once after `delay`. Dropping the returned handle does not
    /// cancel the task.
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle whose cancel does nothing.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Timer backed by `tokio::time::sleep` on the current runtime.
#[derive(Debug, Clone, Default)]
pub struct TokioTimer;

impl TokioTimer {
    pub fn new() -> Self {
        Self
    }
}

impl Timer for TokioTimer {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("No tokio runtime, dropping timer task: {}", e);
                return TimerHandle::detached();
            }
        };

        let join = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });

        TimerHandle::new(move || join.abort())
    }
}

struct PendingTask {
    id: u64,
    due: Duration,
    task: TimerTask,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_id: u64,
    pending: Vec<PendingTask>,
}

/// Virtual-time timer. Tasks run only when [`ManualTimer::advance`] moves the
/// clock past their deadline.
#[derive(Clone, Default)]
pub struct ManualTimer {
    clock: Arc<Mutex<ManualClock>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualClock> {
        self.clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move the clock forward and run every task that became due, in deadline
    /// order. Tasks run outside the internal lock.
    pub fn advance(&self, by: Duration) {
        let due = {
            let mut clock = self.lock();
            clock.now += by;
            let now = clock.now;

            let (mut due, pending): (Vec<_>, Vec<_>) =
                clock.pending.drain(..).partition(|p| p.due <= now);
            clock.pending = pending;
            due.sort_by_key(|p| (p.due, p.id));
            due
        };

        for pending in due {
            (pending.task)();
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.lock().now
    }

    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let id = {
            let mut clock = self.lock();
            let id = clock.next_id;
            clock.next_id += 1;
            let due = clock.now + delay;
            clock.pending.push(PendingTask { id, due, task });
            id
        };

        let clock = Arc::clone(&self.clock);
        TimerHandle::new(move || {
            let mut clock = clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            clock.pending.retain(|p| p.id != id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_task(counter: &Arc<AtomicUsize>) -> TimerTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn manual_timer_runs_task_at_deadline() {
        let timer = ManualTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let _handle = timer.schedule(Duration::from_millis(5000), counter_task(&fired));

        timer.advance(Duration::from_millis(4999));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(timer.pending(), 1);

        timer.advance(Duration::from_millis(1));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.pending(), 0);
        assert_eq!(timer.elapsed(), Duration::from_millis(5000));
    }

    #[test]
    fn manual_timer_cancel_removes_task() {
        let timer = ManualTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = timer.schedule(Duration::from_secs(1), counter_task(&fired));

        handle.cancel();
        timer.advance(Duration::from_secs(10));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn manual_timer_runs_in_deadline_order() {
        let timer = ManualTimer::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (label, ms) in [("late", 300u64), ("early", 100), ("middle", 200)] {
            let order = Arc::clone(&order);
            let _ = timer.schedule(
                Duration::from_millis(ms),
                Box::new(move || order.lock().unwrap().push(label)),
            );
        }

        timer.advance(Duration::from_secs(1));
        assert_eq!(*order.lock().unwrap(), vec!["early", "middle", "late"]);
    }

    #[test]
    fn dropping_handle_keeps_task() {
        let timer = ManualTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        drop(timer.schedule(Duration::from_secs(1), counter_task(&fired)));

        timer.advance(Duration::from_secs(1));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let _handle = TokioTimer::new().schedule(Duration::from_secs(5), counter_task(&fired));

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_cancel_aborts_task() {
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = TokioTimer::new().schedule(Duration::from_secs(5), counter_task(&fired));

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tokio_timer_without_runtime_is_detached() {
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = TokioTimer::new().schedule(Duration::from_millis(1), counter_task(&fired));
        handle.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
