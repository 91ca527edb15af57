//! Schedulers decide where and when a piece of work runs.
//!
//! Every time-based operator (`throttle`, `timeout`, `delay`, `interval`,
//! `observe_on`) suspends only through [`Scheduler::schedule`], never through
//! a blocking sleep of its own. Swapping in the [`TestScheduler`] therefore
//! makes those operators fully deterministic in tests.

use std::{
  fmt::{self, Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

pub use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::subscription::Subscription;

mod test_scheduler;
mod thread_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use test_scheduler::TestScheduler;
pub use thread_scheduler::{ImmediateScheduler, NewThreadScheduler};
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// Accepts `(task, delay)` and guarantees the task runs no earlier than the
/// delay has elapsed. Tasks scheduled on the same scheduler with the same due
/// time run in the order they were scheduled.
pub trait Scheduler: Clone + Send + Sync + 'static {
  /// Schedule `task` to run after `delay` (`None` means as soon as possible).
  ///
  /// Unsubscribing the returned handle before the task started prevents it
  /// from running.
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static;
}

/// Handle of a scheduled task.
///
/// Closed once the task has run or was cancelled.
#[derive(Clone, Default)]
pub struct TaskHandle(Arc<TaskState>);

#[derive(Default)]
struct TaskState {
  closed: AtomicBool,
  on_cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl TaskHandle {
  pub fn new() -> Self { Self::default() }

  /// A handle for work that already happened.
  pub fn finished() -> Self {
    let handle = Self::default();
    handle.0.closed.store(true, Ordering::Release);
    handle
  }

  /// Wraps `task` so that it only runs while this handle is open, closing
  /// the handle once it ran.
  pub fn guard<F>(&self, task: F) -> impl FnOnce() + Send + 'static
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = self.clone();
    move || {
      if !handle.0.closed.swap(true, Ordering::AcqRel) {
        handle.0.on_cancel.lock().take();
        task();
      }
    }
  }

  /// Registers work that releases the scheduler's resources for this task,
  /// run on `unsubscribe`. Runs right away when the handle is already
  /// closed.
  pub fn on_cancel<F>(&self, cancel: F)
  where
    F: FnOnce() + Send + 'static,
  {
    if self.is_closed() {
      cancel();
      return;
    }
    *self.0.on_cancel.lock() = Some(Box::new(cancel));
    // `unsubscribe` may have raced the registration.
    if self.is_closed() {
      if let Some(cancel) = self.0.on_cancel.lock().take() {
        cancel();
      }
    }
  }
}

impl Debug for TaskHandle {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.debug_tuple("TaskHandle").field(&self.is_closed()).finish()
  }
}

impl Subscription for TaskHandle {
  fn unsubscribe(self) {
    self.0.closed.store(true, Ordering::Release);
    let cancel = self.0.on_cancel.lock().take();
    if let Some(cancel) = cancel {
      cancel();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.closed.load(Ordering::Acquire) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn guarded_task_runs_once() {
    let handle = TaskHandle::new();
    let (tx, rx) = std::sync::mpsc::channel();
    let task = handle.guard(move || tx.send(1).unwrap_or_default());
    task();
    assert!(handle.is_closed());
    assert_eq!(rx.try_iter().count(), 1);
  }

  #[test]
  fn cancelled_task_does_not_run() {
    let handle = TaskHandle::new();
    let (tx, rx) = std::sync::mpsc::channel();
    let task = handle.guard(move || tx.send(1).unwrap_or_default());
    handle.clone().unsubscribe();
    task();
    assert_eq!(rx.try_iter().count(), 0);
  }

  #[test]
  fn cancel_hook_runs_on_unsubscribe_only() {
    let (tx, rx) = std::sync::mpsc::channel();
    let ran = TaskHandle::new();
    let task = ran.guard(|| {});
    let t = tx.clone();
    ran.on_cancel(move || t.send("ran").unwrap_or_default());
    // Running the task discards the hook.
    task();
    ran.unsubscribe();

    let cancelled = TaskHandle::new();
    cancelled.on_cancel(move || tx.send("cancelled").unwrap_or_default());
    cancelled.unsubscribe();
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["cancelled"]);
  }
}
