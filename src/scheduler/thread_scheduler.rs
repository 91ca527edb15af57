use std::thread;

use super::{Duration, Scheduler, TaskHandle};

/// Runs every task on the caller's stack.
///
/// A delayed task blocks the calling thread until it is due, so this
/// scheduler only suits delay-free work or blocking demos.
#[derive(Clone, Copy, Default, Debug)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    if let Some(delay) = delay.filter(|d| !d.is_zero()) {
      thread::sleep(delay);
    }
    handle.guard(task)();
    handle
  }
}

/// Runs every task on a freshly spawned thread.
#[derive(Clone, Copy, Default, Debug)]
pub struct NewThreadScheduler;

impl Scheduler for NewThreadScheduler {
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let task = handle.guard(task);
    thread::spawn(move || {
      if let Some(delay) = delay {
        thread::sleep(delay);
      }
      task();
    });
    handle
  }
}
