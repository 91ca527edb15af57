//! Test Scheduler for deterministic testing of time-based operators.
//!
//! Provides virtual time that only advances when explicitly instructed,
//! enabling deterministic testing of `throttle`, `timeout`, `delay`,
//! `interval`, etc.
//!
//! # Usage
//!
//! ```rust
//! use rxsearch::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let seen = MutArc::own(vec![]);
//! let sink = seen.clone();
//! observable::interval::<(), _>(Duration::from_millis(10), scheduler.clone())
//!   .take(3)
//!   .subscribe(move |v| sink.rc_deref_mut().push(v));
//!
//! scheduler.advance_by(Duration::from_millis(25));
//! assert_eq!(*seen.rc_deref(), vec![0, 1]);
//!
//! // Drain everything that is still pending.
//! scheduler.flush();
//! assert_eq!(*seen.rc_deref(), vec![0, 1, 2]);
//! ```
//!
//! Clones share one clock and one queue, so the clone handed to the
//! operators and the one kept by the test observe the same virtual time.

use std::{cmp::Ordering, collections::BinaryHeap};

use super::{Duration, Scheduler, TaskHandle};
use crate::{
  rc::{MutArc, RcDeref, RcDerefMut},
  subscription::Subscription,
};

// ==================== Internal State ====================

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

struct ScheduledTask {
  scheduled_time: Duration,
  task_id: usize,
  task: Box<dyn FnOnce() + Send>,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool {
    self.scheduled_time == other.scheduled_time && self.task_id == other.task_id
  }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .scheduled_time
      .cmp(&self.scheduled_time)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

// ==================== TestScheduler ====================

/// A virtual time scheduler for deterministic testing.
#[derive(Clone, Default)]
pub struct TestScheduler(MutArc<TestSchedulerState>);

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// Current virtual time, measured from the scheduler's creation.
  pub fn now(&self) -> Duration { self.0.rc_deref().virtual_time }

  /// Number of scheduled tasks that have neither run nor been cancelled.
  pub fn pending(&self) -> usize {
    self
      .0
      .rc_deref()
      .task_queue
      .iter()
      .filter(|t| !t.handle.is_closed())
      .count()
  }

  /// Advance virtual time by the specified duration and execute due tasks.
  ///
  /// Tasks are executed in order of their scheduled time, with FIFO ordering
  /// for tasks scheduled at the same time. Tasks scheduled while advancing
  /// run too if they fall due before the target time.
  pub fn advance_by(&self, duration: Duration) {
    let target = self.now() + duration;
    self.advance_to(target);
  }

  /// Advance virtual time to `target` (no-op when already past it).
  pub fn advance_to(&self, target: Duration) {
    self.execute_tasks_until(Some(target));
    let mut state = self.0.rc_deref_mut();
    if state.virtual_time < target {
      state.virtual_time = target;
    }
  }

  /// Run every pending task, jumping the clock to each task's due time.
  ///
  /// Periodic sources such as an untaken `interval` never drain; bound those
  /// with `advance_by` instead.
  pub fn flush(&self) { self.execute_tasks_until(None); }

  fn execute_tasks_until(&self, limit: Option<Duration>) {
    loop {
      let task = {
        let mut state = self.0.rc_deref_mut();
        let due = match state.task_queue.peek() {
          Some(next) => limit.map_or(true, |limit| next.scheduled_time <= limit),
          None => false,
        };
        if !due {
          break;
        }
        match state.task_queue.pop() {
          // Cancelled tasks do not move the clock.
          Some(task) if task.handle.is_closed() => continue,
          Some(task) => {
            if task.scheduled_time > state.virtual_time {
              state.virtual_time = task.scheduled_time;
            }
            task
          }
          None => break,
        }
      };
      // Run without holding the lock: tasks schedule follow-up work.
      if !task.handle.is_closed() {
        (task.task)();
      }
    }
  }
}

impl Scheduler for TestScheduler {
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let task = handle.guard(task);
    let mut state = self.0.rc_deref_mut();
    state.task_queue.retain(|t| !t.handle.is_closed());
    let task_id = state.next_task_id;
    state.next_task_id += 1;
    let scheduled_time = state.virtual_time + delay.unwrap_or(Duration::ZERO);
    state.task_queue.push(ScheduledTask {
      scheduled_time,
      task_id,
      task: Box::new(task),
      handle: handle.clone(),
    });
    handle
  }
}
